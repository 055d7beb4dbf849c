//! Financial-statement page family extractor.
//!
//! Statement tables are anchored by stable container ids. Rows are included
//! only when visually emphasized (the bold/total class) or when their label
//! maps to a known metric; unknown labels and unparseable periods are skipped
//! silently so upstream markup drift degrades coverage instead of breaking
//! the extraction.

use analysis_core::{SourceError, StatementBundle, StatementTable};
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::http;
use crate::text::parse_statement_cell;

const STATEMENT_URL: &str = "https://comp.fnguide.com/SVO2/ASP/SVD_Finance.asp";
const PORTAL_REFERER: &str = "https://comp.fnguide.com/";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

// Statement container ids; the `Y` suffix marks annual tables.
const INCOME_ANNUAL_DIV: &str = "divSonikY";
const INCOME_QUARTERLY_DIV: &str = "divSonikQ";
const BALANCE_ANNUAL_DIV: &str = "divDaechaY";
const CASH_FLOW_ANNUAL_DIV: &str = "divCashY";

const BOLD_ROW_CLASS: &str = "rowBold";

/// Localized row label -> canonical metric key.
const INCOME_METRICS: &[(&str, &str)] = &[
    ("매출액", "revenue"),
    ("영업이익", "operating_profit"),
    ("영업이익(발표기준)", "operating_profit"),
    ("당기순이익", "net_income"),
];

const BALANCE_METRICS: &[(&str, &str)] = &[
    ("자산", "total_assets"),
    ("유동자산", "current_assets"),
    ("부채", "total_liabilities"),
    ("유동부채", "current_liabilities"),
    ("자본", "total_equity"),
];

const CASH_FLOW_METRICS: &[(&str, &str)] = &[
    ("영업활동으로인한현금흐름", "operating_cash_flow"),
    ("투자활동으로인한현금흐름", "investing_cash_flow"),
    ("재무활동으로인한현금흐름", "financing_cash_flow"),
];

static PERIOD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})/(\d{2})").expect("literal regex"));

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("literal selector")
}

pub struct FnGuidePortal {
    client: Client,
}

impl FnGuidePortal {
    pub fn new() -> Self {
        Self {
            client: http::build_client(DEFAULT_TIMEOUT_SECS, Some(PORTAL_REFERER)),
        }
    }

    /// Raw statement tables for a ticker. A page without a usable annual
    /// income table counts as an empty result so the caller can retry.
    pub fn statements(&self, ticker: &str) -> Result<StatementBundle, SourceError> {
        let url = format!("{STATEMENT_URL}?pGB=1&gicode=A{ticker}");
        let html = http::fetch_html(&self.client, &url)?;

        let bundle = parse_statements(&html);
        if bundle.income_annual.is_empty() {
            return Err(SourceError::EmptyResult);
        }
        Ok(bundle)
    }
}

impl Default for FnGuidePortal {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_statements(html: &str) -> StatementBundle {
    let doc = Html::parse_document(html);

    StatementBundle {
        name: extract_company_name(&doc),
        income_annual: parse_statement_table(&doc, INCOME_ANNUAL_DIV, INCOME_METRICS),
        income_quarterly: parse_statement_table(&doc, INCOME_QUARTERLY_DIV, INCOME_METRICS),
        balance_annual: parse_statement_table(&doc, BALANCE_ANNUAL_DIV, BALANCE_METRICS),
        cash_flow_annual: parse_statement_table(&doc, CASH_FLOW_ANNUAL_DIV, CASH_FLOW_METRICS),
    }
}

fn parse_statement_table(
    doc: &Html,
    div_id: &str,
    metrics: &'static [(&'static str, &'static str)],
) -> StatementTable {
    let mut out = StatementTable::new();

    let Some(container) = doc.select(&css(&format!("div#{div_id}"))).next() else {
        tracing::debug!(div_id, "statement container missing");
        return out;
    };
    let Some(table) = container.select(&css("table")).next() else {
        tracing::debug!(div_id, "statement table missing");
        return out;
    };

    // Header cells carry the period labels; the first is the row-name column.
    let headers: Vec<String> = table
        .select(&css("thead th"))
        .map(|th| cell_text(&th))
        .filter(|text| !text.is_empty())
        .collect();
    if headers.len() < 2 {
        return out;
    }
    let annual = div_id.ends_with('Y');
    let periods: Vec<Option<String>> = headers[1..]
        .iter()
        .map(|header| parse_period_label(header, annual))
        .collect();

    let Some(body) = table.select(&css("tbody")).next() else {
        return out;
    };

    for row in body.select(&css("tr")) {
        let cells: Vec<ElementRef<'_>> = row.select(&css("th, td")).collect();
        if cells.len() < 2 {
            continue;
        }

        let row_name = cell_text(&cells[0]).replace('\u{a0}', "");
        let emphasized = row
            .value()
            .classes()
            .any(|class| class == BOLD_ROW_CLASS);

        let Some(metric_key) = lookup_metric(metrics, &row_name) else {
            if emphasized {
                tracing::debug!(row = %row_name, "emphasized row without a metric mapping");
            }
            continue;
        };

        for (index, cell) in cells[1..].iter().enumerate() {
            let Some(Some(period)) = periods.get(index) else {
                continue;
            };

            // The title attribute carries the full-precision value; the
            // visible cell text is truncated.
            let raw = cell
                .value()
                .attr("title")
                .map(str::to_string)
                .unwrap_or_else(|| cell_text(cell));

            if let Some(value) = parse_statement_cell(&raw) {
                out.entry(period.clone())
                    .or_default()
                    .insert(metric_key.to_string(), value);
            }
        }
    }

    out
}

/// `YYYY/MM` headers key annual tables by year and quarterly tables by
/// `YYYYQn`; anything else (change columns, percentages) is not a period.
fn parse_period_label(header: &str, annual: bool) -> Option<String> {
    let caps = PERIOD_HEADER.captures(header)?;
    let year = &caps[1];
    if annual {
        return Some(year.to_string());
    }

    let month: u32 = caps[2].parse().ok()?;
    let quarter = match month {
        3 => 1,
        6 => 2,
        9 => 3,
        12 => 4,
        other => other / 3,
    };
    Some(format!("{year}Q{quarter}"))
}

fn lookup_metric(
    metrics: &'static [(&'static str, &'static str)],
    label: &str,
) -> Option<&'static str> {
    metrics
        .iter()
        .find(|(localized, _)| *localized == label)
        .map(|(_, key)| *key)
}

fn extract_company_name(doc: &Html) -> Option<String> {
    if let Some(heading) = doc.select(&css("h1.giName")).next() {
        let name = cell_text(&heading);
        if !name.is_empty() {
            return Some(name);
        }
    }

    let title = doc.select(&css("title")).next().map(|t| cell_text(&t))?;
    let (name, _) = title.split_once('(')?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn cell_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT_FIXTURE: &str = r#"<html>
<head><title>삼성전자(A005930) | 재무제표</title></head>
<body>
<h1 class="giName">삼성전자</h1>
<div id="divSonikY"><table>
<thead><tr><th>IFRS(연결)</th><th>2023/12</th><th>2024/12</th><th>2025/12</th><th>전년동기대비</th></tr></thead>
<tbody>
<tr class="rowBold"><th>매출액</th><td title="2589355.1">2,589,355</td><td title="3008709.2">3,008,709</td><td>2,350,000</td><td>16.2</td></tr>
<tr><th>영업이익</th><td>65,670</td><td title="327259.3">327,259</td><td>250,000</td><td>-</td></tr>
<tr><th>당기순이익</th><td>154,871</td><td>341,451</td><td>-</td><td>N/A</td></tr>
<tr><th>임시계정과목</th><td>1</td><td>2</td><td>3</td><td>4</td></tr>
<tr class="rowBold"><th>기타포괄손익</th><td>9</td><td>9</td><td>9</td><td>9</td></tr>
</tbody></table></div>
<div id="divSonikQ"><table>
<thead><tr><th>IFRS(연결)</th><th>2025/03</th><th>2025/06</th><th>2025/09</th></tr></thead>
<tbody>
<tr class="rowBold"><th>매출액</th><td>600,000</td><td>610,000</td><td>620,000</td></tr>
</tbody></table></div>
<div id="divDaechaY"><table>
<thead><tr><th>IFRS(연결)</th><th>2024/12</th></tr></thead>
<tbody>
<tr class="rowBold"><th>자산</th><td title="4559060.2">4,559,060</td></tr>
<tr><th>유동자산</th><td>2,150,000</td></tr>
<tr class="rowBold"><th>부채</th><td>1,120,000</td></tr>
<tr><th>유동부채</th><td>880,000</td></tr>
<tr class="rowBold"><th>자본</th><td>3,439,060</td></tr>
</tbody></table></div>
<div id="divCashY"><table>
<thead><tr><th>IFRS(연결)</th><th>2024/12</th></tr></thead>
<tbody>
<tr><th>영업활동으로인한현금흐름</th><td>621,813</td></tr>
<tr><th>투자활동으로인한현금흐름</th><td>-357,310</td></tr>
<tr><th>재무활동으로인한현금흐름</th><td>-93,100</td></tr>
</tbody></table></div>
</body></html>"#;

    #[test]
    fn annual_income_prefers_title_attribute() {
        let bundle = parse_statements(STATEMENT_FIXTURE);
        let income_2024 = &bundle.income_annual["2024"];

        // Full-precision title beats the truncated cell text.
        assert_eq!(income_2024["revenue"], 3_008_709.2);
        assert_eq!(income_2024["operating_profit"], 327_259.3);
        // No title attribute: the visible text is used.
        assert_eq!(income_2024["net_income"], 341_451.0);
    }

    #[test]
    fn dash_cells_stay_absent() {
        let bundle = parse_statements(STATEMENT_FIXTURE);

        assert!(!bundle.income_annual["2025"].contains_key("net_income"));
        assert_eq!(bundle.income_annual["2025"]["revenue"], 2_350_000.0);
    }

    #[test]
    fn unknown_rows_are_skipped() {
        let bundle = parse_statements(STATEMENT_FIXTURE);

        // Neither the plain unknown row nor the emphasized-but-unmapped row
        // contributes values.
        assert_eq!(
            bundle.income_annual["2023"].keys().cloned().collect::<Vec<_>>(),
            vec!["net_income", "operating_profit", "revenue"]
        );
    }

    #[test]
    fn change_columns_are_not_periods() {
        let bundle = parse_statements(STATEMENT_FIXTURE);

        assert_eq!(
            bundle.income_annual.keys().cloned().collect::<Vec<_>>(),
            vec!["2023", "2024", "2025"]
        );
    }

    #[test]
    fn quarterly_headers_become_quarter_labels() {
        let bundle = parse_statements(STATEMENT_FIXTURE);

        assert_eq!(
            bundle.income_quarterly.keys().cloned().collect::<Vec<_>>(),
            vec!["2025Q1", "2025Q2", "2025Q3"]
        );
        assert_eq!(bundle.income_quarterly["2025Q3"]["revenue"], 620_000.0);
    }

    #[test]
    fn balance_and_cash_flow_tables_parse() {
        let bundle = parse_statements(STATEMENT_FIXTURE);

        assert_eq!(bundle.balance_annual["2024"]["total_assets"], 4_559_060.2);
        assert_eq!(bundle.balance_annual["2024"]["current_liabilities"], 880_000.0);
        assert_eq!(
            bundle.cash_flow_annual["2024"]["investing_cash_flow"],
            -357_310.0
        );
    }

    #[test]
    fn company_name_prefers_heading_over_title() {
        let bundle = parse_statements(STATEMENT_FIXTURE);
        assert_eq!(bundle.name.as_deref(), Some("삼성전자"));

        let no_heading = STATEMENT_FIXTURE.replace("giName", "renamed");
        let bundle = parse_statements(&no_heading);
        assert_eq!(bundle.name.as_deref(), Some("삼성전자"));
    }

    #[test]
    fn missing_container_yields_empty_table() {
        let without_balance = STATEMENT_FIXTURE.replace("divDaechaY", "divGone");
        let bundle = parse_statements(&without_balance);

        assert!(bundle.balance_annual.is_empty());
        assert!(!bundle.income_annual.is_empty());
    }

    #[test]
    fn period_labels_handle_both_granularities() {
        assert_eq!(parse_period_label("2024/12", true).as_deref(), Some("2024"));
        assert_eq!(
            parse_period_label("2025/09", false).as_deref(),
            Some("2025Q3")
        );
        assert_eq!(parse_period_label("전년동기", true), None);
        assert_eq!(parse_period_label("YoY %", false), None);
    }
}
