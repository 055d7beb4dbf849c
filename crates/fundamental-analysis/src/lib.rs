//! Fiscal-period reconciliation and derived statement analytics.
//!
//! Everything here operates on the typed statement tables; no markup or
//! transport concern reaches this crate.

use analysis_core::{
    FinancialReport, GrowthMetrics, MetricValues, PeriodLabels, RatioMetrics, SourceError,
    StatementBundle, StatementTable,
};

/// Provider tag stamped on reports assembled from the statement portal.
pub const STATEMENT_SOURCE: &str = "FnGuide";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mark the latest annual period as accumulated when its reported quarters
/// stop short of Q4.
///
/// Only the most recent year can carry the marker; prior years are assumed
/// complete. Quarter labels sort lexicographically within a year, so the
/// maximum label is the latest reported quarter.
pub fn detect_accumulated_periods(
    annual: &StatementTable,
    quarterly: &StatementTable,
) -> PeriodLabels {
    let mut labels = PeriodLabels::new();
    let Some(latest_year) = annual.keys().max() else {
        return labels;
    };

    let latest_quarter = quarterly
        .keys()
        .filter(|label| label.starts_with(latest_year.as_str()))
        .max();

    if let Some(quarter_label) = latest_quarter {
        if let Some(quarter) = quarter_label.chars().last() {
            if quarter != '4' {
                labels.insert(latest_year.clone(), format!("{quarter}Q-accumulated"));
            }
        }
    }

    labels
}

/// Year-over-year growth between the two most recent *completed* years.
///
/// Accumulated years are excluded from the comparison entirely; each rate is
/// independently null when its inputs are missing or the previous value is
/// zero.
pub fn calculate_growth(income_annual: &StatementTable, labels: &PeriodLabels) -> GrowthMetrics {
    let mut growth = GrowthMetrics::default();
    if income_annual.len() < 2 {
        return growth;
    }

    let complete: Vec<&String> = income_annual
        .keys()
        .filter(|year| !labels.contains_key(*year))
        .collect();
    if complete.len() < 2 {
        return growth;
    }

    let latest_year = complete[complete.len() - 1];
    let previous_year = complete[complete.len() - 2];
    growth.comparison = Some(format!("{latest_year} vs {previous_year}"));

    let latest = &income_annual[latest_year];
    let previous = &income_annual[previous_year];

    growth.revenue_yoy = yoy(latest.get("revenue"), previous.get("revenue"));
    growth.operating_profit_yoy = yoy(
        latest.get("operating_profit"),
        previous.get("operating_profit"),
    );

    growth
}

fn yoy(latest: Option<&f64>, previous: Option<&f64>) -> Option<f64> {
    match (latest, previous) {
        (Some(l), Some(p)) if *p != 0.0 => Some(round2((l - p) / p.abs() * 100.0)),
        _ => None,
    }
}

/// Balance-sheet ratios from the latest available period only, each
/// independently null on missing input or a zero divisor.
pub fn calculate_ratios(
    income_annual: &StatementTable,
    balance_annual: &StatementTable,
) -> RatioMetrics {
    let mut ratios = RatioMetrics::default();
    let Some(latest_year) = balance_annual.keys().max() else {
        return ratios;
    };
    let balance = &balance_annual[latest_year];

    ratios.debt_ratio = pct_ratio(
        balance.get("total_liabilities"),
        balance.get("total_equity"),
    );
    ratios.current_ratio = pct_ratio(
        balance.get("current_assets"),
        balance.get("current_liabilities"),
    );

    if let Some(income) = income_annual.get(latest_year) {
        let net_income = income.get("net_income");
        ratios.roe = pct_ratio(net_income, balance.get("total_equity"));
        ratios.roa = pct_ratio(net_income, balance.get("total_assets"));
    }

    ratios
}

fn pct_ratio(numerator: Option<&f64>, denominator: Option<&f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if *d != 0.0 => Some(round2(n / d * 100.0)),
        _ => None,
    }
}

/// Free cash flow per period: operating plus investing flow (the investing
/// flow is typically negative). Periods missing either flow are untouched.
pub fn apply_free_cash_flow(cash_flow: &mut StatementTable) {
    for metrics in cash_flow.values_mut() {
        let operating = metrics.get("operating_cash_flow").copied();
        let investing = metrics.get("investing_cash_flow").copied();
        if let (Some(ocf), Some(icf)) = (operating, investing) {
            metrics.insert("fcf".to_string(), ocf + icf);
        }
    }
}

/// Price/earnings-to-growth ratio; null when either input is missing or the
/// growth rate is zero.
pub fn calculate_peg(per: Option<f64>, eps_growth_pct: Option<f64>) -> Option<f64> {
    match (per, eps_growth_pct) {
        (Some(p), Some(g)) if g != 0.0 => Some(round2(p / g)),
        _ => None,
    }
}

/// Assemble the derived statement report from raw extracted tables.
///
/// An empty annual income table means the page carried nothing usable and
/// the caller should treat the fetch as failed.
pub fn build_report(ticker: &str, bundle: StatementBundle) -> Result<FinancialReport, SourceError> {
    if bundle.income_annual.is_empty() {
        return Err(SourceError::EmptyResult);
    }

    let StatementBundle {
        name,
        income_annual,
        income_quarterly,
        balance_annual,
        mut cash_flow_annual,
    } = bundle;

    apply_free_cash_flow(&mut cash_flow_annual);

    let period_labels = detect_accumulated_periods(&income_annual, &income_quarterly);
    let growth = calculate_growth(&income_annual, &period_labels);
    let ratios = calculate_ratios(&income_annual, &balance_annual);

    let latest_year = income_annual.keys().max().cloned();
    let mut latest = MetricValues::new();
    if let Some(year) = &latest_year {
        if let Some(metrics) = income_annual.get(year) {
            latest.extend(metrics.clone());
        }
        if let Some(metrics) = balance_annual.get(year) {
            latest.extend(metrics.clone());
        }
    }

    Ok(FinancialReport {
        source: STATEMENT_SOURCE.to_string(),
        ticker: ticker.to_string(),
        name,
        period: latest_year.as_ref().map(|year| format!("{year}/12")),
        income_annual,
        balance_annual,
        cash_flow_annual,
        latest,
        growth,
        ratios,
        period_labels,
    })
}
