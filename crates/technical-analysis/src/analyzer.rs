use analysis_core::{
    BollingerIndicator, DailyBar, IndicatorSet, MacdIndicator, MovingAverages, PivotPoints,
    RsiIndicator, SignalSummary, StochasticIndicator, Week52,
};

use crate::indicators::{bollinger_bands, macd, pivot_points, rsi, sma, stochastic};
use crate::signals::{classify_macd, classify_rsi, classify_stochastic, ma_alignment};

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BOLLINGER_PERIOD: usize = 20;
const STOCH_K_PERIOD: usize = 14;
const STOCH_D_PERIOD: usize = 3;
const PIVOT_LOOKBACK: usize = 20;

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Latest-value snapshot of every indicator, classified and rounded for
/// display. Needs at least the Bollinger window of sessions; `ma60` and the
/// alignment call stay absent below 60 sessions.
pub fn indicator_snapshot(bars: &[DailyBar]) -> Option<IndicatorSet> {
    if bars.len() < BOLLINGER_PERIOD {
        return None;
    }

    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let current = *close.last()?;

    let rsi_last = *rsi(&close, RSI_PERIOD).last()?;

    let macd_result = macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let macd_last = *macd_result.macd_line.last()?;
    let signal_last = *macd_result.signal_line.last()?;
    let hist_last = *macd_result.histogram.last()?;

    let bb = bollinger_bands(&close, BOLLINGER_PERIOD, 2.0);
    let upper = *bb.upper.last()?;
    let middle = *bb.middle.last()?;
    let lower = *bb.lower.last()?;
    let band_width = upper - lower;
    let band_position = if band_width == 0.0 {
        50.0
    } else {
        (current - lower) / band_width * 100.0
    };

    let stoch = stochastic(&high, &low, &close, STOCH_K_PERIOD, STOCH_D_PERIOD);
    let k_last = *stoch.k.last()?;
    let d_last = *stoch.d.last()?;

    let ma5 = *sma(&close, 5).last()?;
    let ma20 = *sma(&close, 20).last()?;
    let ma60 = sma(&close, 60).last().copied();
    let alignment = ma60.map(|m60| ma_alignment(current, ma5, ma20, m60));

    Some(IndicatorSet {
        rsi: RsiIndicator {
            value: round_to(rsi_last, 1),
            signal: classify_rsi(rsi_last),
        },
        macd: MacdIndicator {
            macd: round_to(macd_last, 2),
            signal_line: round_to(signal_last, 2),
            histogram: round_to(hist_last, 2),
            trend: classify_macd(macd_last, signal_last),
        },
        bollinger: BollingerIndicator {
            upper: round_to(upper, 0),
            middle: round_to(middle, 0),
            lower: round_to(lower, 0),
            position_pct: round_to(band_position, 1),
        },
        stochastic: StochasticIndicator {
            k: round_to(k_last, 1),
            d: round_to(d_last, 1),
            signal: classify_stochastic(k_last),
        },
        ma: MovingAverages {
            ma5: round_to(ma5, 0),
            ma20: round_to(ma20, 0),
            ma60: ma60.map(|m| round_to(m, 0)),
            alignment,
        },
    })
}

/// Condense an indicator snapshot into its classification summary.
pub fn signal_summary(set: &IndicatorSet) -> SignalSummary {
    SignalSummary {
        rsi: set.rsi.signal,
        macd: set.macd.trend,
        stochastic: set.stochastic.signal,
        ma_alignment: set.ma.alignment,
    }
}

/// 52-week high/low window with the current price's position inside it.
/// Ties resolve to the earliest session, matching first-occurrence lookup.
pub fn week52_window(bars: &[DailyBar], current_price: Option<f64>) -> Option<Week52> {
    let first = bars.first()?;
    let mut high = first.high;
    let mut high_date = first.date;
    let mut low = first.low;
    let mut low_date = first.date;

    for bar in &bars[1..] {
        if bar.high > high {
            high = bar.high;
            high_date = bar.date;
        }
        if bar.low < low {
            low = bar.low;
            low_date = bar.date;
        }
    }

    let position_pct = match current_price {
        Some(price) if high > low => Some(round_to((price - low) / (high - low) * 100.0, 1)),
        _ => None,
    };

    Some(Week52 {
        high,
        high_date,
        low,
        low_date,
        position_pct,
    })
}

/// Pivot-point support/resistance levels over the trailing window, rounded
/// to whole won for display.
pub fn pivot_levels(bars: &[DailyBar]) -> Option<PivotPoints> {
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

    pivot_points(&high, &low, &close, PIVOT_LOOKBACK).map(|p| PivotPoints {
        pivot: round_to(p.pivot, 0),
        r1: round_to(p.r1, 0),
        r2: round_to(p.r2, 0),
        s1: round_to(p.s1, 0),
        s2: round_to(p.s2, 0),
    })
}
