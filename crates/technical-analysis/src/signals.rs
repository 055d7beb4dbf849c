use analysis_core::{MaAlignment, MomentumSignal, TrendSignal};

/// RSI above 70 is overbought, below 30 oversold. The boundaries themselves
/// classify as neutral.
pub fn classify_rsi(value: f64) -> MomentumSignal {
    if value > 70.0 {
        MomentumSignal::Overbought
    } else if value < 30.0 {
        MomentumSignal::Oversold
    } else {
        MomentumSignal::Neutral
    }
}

/// MACD line above its signal line is bullish, otherwise bearish.
pub fn classify_macd(macd_line: f64, signal_line: f64) -> TrendSignal {
    if macd_line > signal_line {
        TrendSignal::Bullish
    } else {
        TrendSignal::Bearish
    }
}

/// Stochastic %K above 80 is overbought, below 20 oversold.
pub fn classify_stochastic(k: f64) -> MomentumSignal {
    if k > 80.0 {
        MomentumSignal::Overbought
    } else if k < 20.0 {
        MomentumSignal::Oversold
    } else {
        MomentumSignal::Neutral
    }
}

/// Moving-average stack ordering. Only strict chains count; any other
/// ordering, including equal values, is mixed.
pub fn ma_alignment(current: f64, ma5: f64, ma20: f64, ma60: f64) -> MaAlignment {
    if current > ma5 && ma5 > ma20 && ma20 > ma60 {
        MaAlignment::FullyBullish
    } else if current < ma5 && ma5 < ma20 && ma20 < ma60 {
        MaAlignment::FullyBearish
    } else {
        MaAlignment::Mixed
    }
}
