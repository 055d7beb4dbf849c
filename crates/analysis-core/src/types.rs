use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;

/// One trading session. Series are ordered ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Total value traded in the session; not every source reports it.
    #[serde(default)]
    pub value_traded: Option<f64>,
}

impl DailyBar {
    /// A session row is usable only when its range brackets open and close.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.high < self.low {
            return Err(ValidationError::InvalidBarRange);
        }
        if self.open > self.high
            || self.open < self.low
            || self.close > self.high
            || self.close < self.low
        {
            return Err(ValidationError::InvalidBarBounds);
        }
        Ok(())
    }
}

/// Per-share valuation metrics for one (ticker, date).
///
/// Each field is independently nullable: the fallback source provides only a
/// subset, and `None` always means "not provided", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub book_value_per_share: Option<f64>,
    pub price_earnings: Option<f64>,
    pub price_book: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub dividend_per_share: Option<f64>,
}

/// Market capitalization snapshot, in won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCapSnapshot {
    pub market_cap: f64,
    pub volume: f64,
    pub value_traded: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub foreign_held_shares: Option<f64>,
}

/// Best-effort extraction from the quote/summary portal page.
///
/// Extraction is per-field: a missing anchor nulls only its own field.
/// `market_cap` is in the portal's 100-million-won display unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
    pub prev_close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<i64>,
    pub per: Option<f64>,
    pub pbr: Option<f64>,
    pub foreign_ratio: Option<f64>,
}

impl QuoteSnapshot {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.change.is_none()
            && self.change_pct.is_none()
            && self.prev_close.is_none()
            && self.open.is_none()
            && self.high.is_none()
            && self.low.is_none()
            && self.volume.is_none()
            && self.market_cap.is_none()
            && self.per.is_none()
            && self.pbr.is_none()
            && self.foreign_ratio.is_none()
    }
}

/// Market segment selector for listing lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Market {
    Kospi,
    Kosdaq,
    Konex,
    All,
}

/// One listed issue from a ticker-list lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedStock {
    pub code: String,
    pub name: String,
}

/// One headline from the portal's per-ticker news listing. The date is the
/// portal's display text, not a normalized timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub date: String,
    pub url: String,
}

/// Canonical metric key -> value, in 100-million-won units.
pub type MetricValues = BTreeMap<String, f64>;

/// Period label ("2024" annual, "2024Q3" quarterly) -> metric values.
/// Labels come from table headers and are not assumed contiguous.
pub type StatementTable = BTreeMap<String, MetricValues>;

/// Period label -> accumulation marker (e.g. "3Q-accumulated").
/// Only the most recent annual period may carry a marker.
pub type PeriodLabels = BTreeMap<String, String>;

/// Year-over-year growth between the two most recent completed years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub revenue_yoy: Option<f64>,
    pub operating_profit_yoy: Option<f64>,
    /// Which periods were compared, e.g. "2024 vs 2023".
    pub comparison: Option<String>,
}

/// Balance-sheet ratios from the latest available period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioMetrics {
    pub debt_ratio: Option<f64>,
    pub current_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
}

/// Raw statement tables as extracted from the statement portal, before any
/// reconciliation or derived analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementBundle {
    pub name: Option<String>,
    pub income_annual: StatementTable,
    pub income_quarterly: StatementTable,
    pub balance_annual: StatementTable,
    pub cash_flow_annual: StatementTable,
}

/// Fully derived financial-statement report for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    /// Which provider produced the underlying tables.
    pub source: String,
    pub ticker: String,
    pub name: Option<String>,
    /// Latest annual period stamp, e.g. "2024/12".
    pub period: Option<String>,
    pub income_annual: StatementTable,
    pub balance_annual: StatementTable,
    pub cash_flow_annual: StatementTable,
    /// Latest-year income and balance metrics merged into one map.
    pub latest: MetricValues,
    pub growth: GrowthMetrics,
    pub ratios: RatioMetrics,
    pub period_labels: PeriodLabels,
}

/// Momentum classification for bounded oscillators (RSI, stochastic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl MomentumSignal {
    pub fn to_label(&self) -> &'static str {
        match self {
            MomentumSignal::Overbought => "overbought",
            MomentumSignal::Oversold => "oversold",
            MomentumSignal::Neutral => "neutral",
        }
    }
}

/// Directional classification for crossover indicators (MACD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    Bullish,
    Bearish,
}

impl TrendSignal {
    pub fn to_label(&self) -> &'static str {
        match self {
            TrendSignal::Bullish => "bullish",
            TrendSignal::Bearish => "bearish",
        }
    }
}

/// Moving-average stack ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaAlignment {
    FullyBullish,
    FullyBearish,
    Mixed,
}

impl MaAlignment {
    pub fn to_label(&self) -> &'static str {
        match self {
            MaAlignment::FullyBullish => "fully bullish",
            MaAlignment::FullyBearish => "fully bearish",
            MaAlignment::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiIndicator {
    pub value: f64,
    pub signal: MomentumSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdIndicator {
    pub macd: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub trend: TrendSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerIndicator {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Where the close sits inside the band, as a percentage of band width.
    pub position_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticIndicator {
    pub k: f64,
    pub d: f64,
    pub signal: MomentumSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub ma5: f64,
    pub ma20: f64,
    /// Absent when the series is shorter than 60 sessions.
    pub ma60: Option<f64>,
    pub alignment: Option<MaAlignment>,
}

/// Per-ticker technical-indicator snapshot, each value classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: RsiIndicator,
    pub macd: MacdIndicator,
    pub bollinger: BollingerIndicator,
    pub stochastic: StochasticIndicator,
    pub ma: MovingAverages,
}

/// Support/resistance levels from the classic pivot-point formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotPoints {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub s1: f64,
    pub s2: f64,
}

/// 52-week trading range and the current price's position inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week52 {
    pub high: f64,
    pub high_date: NaiveDate,
    pub low: f64,
    pub low_date: NaiveDate,
    pub position_pct: Option<f64>,
}

/// Condensed classification of every computed indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub rsi: MomentumSignal,
    pub macd: TrendSignal,
    pub stochastic: MomentumSignal,
    pub ma_alignment: Option<MaAlignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    pub ticker: String,
    pub name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate analysis for one ticker.
///
/// Constructed fresh per request and never mutated after return; every
/// section is independently optional so a failed lookup nulls only itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerAnalysis {
    pub meta: AnalysisMeta,
    pub price_info: Option<QuoteSnapshot>,
    pub week52: Option<Week52>,
    pub indicators: Option<IndicatorSet>,
    pub support_resistance: Option<PivotPoints>,
    pub signals: Option<SignalSummary>,
}
