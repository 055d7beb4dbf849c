use analysis_core::{
    DailyBar, FundamentalSnapshot, ListedStock, Market, MarketCapSnapshot, SourceError,
};
use chrono::{Duration, NaiveDate, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub mod deprecated;

const BASE_URL: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";
const DATA_PORTAL: &str = "http://data.krx.co.kr/";
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

// Gateway screen ids. The gateway routes every request through one endpoint
// and dispatches on the `bld` form field.
const FINDER_SCREEN: &str = "dbms/comm/finder/finder_stkisu";
const OHLCV_SCREEN: &str = "dbms/MDC/STAT/standard/MDCSTAT01701";
const VALUATION_SCREEN: &str = "dbms/MDC/STAT/standard/MDCSTAT03502";
const CAP_SCREEN: &str = "dbms/MDC/STAT/standard/MDCSTAT01602";
const LISTING_SCREEN: &str = "dbms/MDC/STAT/standard/MDCSTAT01901";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Gateway segment code for a market selector.
fn market_code(market: Market) -> &'static str {
    match market {
        Market::Kospi => "STK",
        Market::Kosdaq => "KSQ",
        Market::Konex => "KNX",
        Market::All => "ALL",
    }
}

/// A resolved listed issue: the finder screen maps a 6-digit ticker to the
/// full ISIN code the other screens key on, plus the listed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueInfo {
    pub isin: String,
    pub code: String,
    pub name: String,
}

/// Blocking client for the exchange's market-data JSON gateway.
///
/// Every operation collapses transport, decode and empty-result conditions
/// into [`SourceError`]; nothing here panics or leaks a transport type.
pub struct KrxClient {
    client: Client,
}

impl KrxClient {
    pub fn new() -> Self {
        let timeout_secs: u64 = std::env::var("MARKET_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(DATA_PORTAL));

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    fn fetch<T: DeserializeOwned>(&self, form: &[(&str, String)]) -> Result<T, SourceError> {
        let response = self
            .client
            .post(BASE_URL)
            .form(form)
            .send()
            .map_err(|e| SourceError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Transient(format!(
                "gateway HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .map_err(|e| SourceError::Transient(format!("gateway decode: {e}")))
    }

    /// Look a ticker up on the issue finder screen.
    pub fn resolve(&self, ticker: &str) -> Result<IssueInfo, SourceError> {
        let form = [
            ("bld", FINDER_SCREEN.to_string()),
            ("mktsel", "ALL".to_string()),
            ("searchText", ticker.to_string()),
        ];
        let body: FinderResponse = self.fetch(&form)?;

        body.block1
            .into_iter()
            .find(|row| row.short_code == ticker)
            .map(|row| IssueInfo {
                isin: row.full_code,
                code: row.short_code,
                name: row.code_name,
            })
            .ok_or(SourceError::EmptyResult)
    }

    /// Listed name for a ticker.
    pub fn ticker_name(&self, ticker: &str) -> Result<String, SourceError> {
        self.resolve(ticker).map(|issue| issue.name)
    }

    /// Daily OHLCV, most recent `days` sessions up to `end_date` (today when
    /// absent). The request window doubles `days` in calendar days so
    /// weekends and holidays cannot starve the row count, then the result is
    /// truncated from the recent end.
    pub fn ohlcv(
        &self,
        ticker: &str,
        days: usize,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, SourceError> {
        if days == 0 {
            return Err(SourceError::EmptyResult);
        }

        let issue = self.resolve(ticker)?;
        let end = end_date.unwrap_or_else(today);
        let start = end - Duration::days(days as i64 * 2);

        let form = [
            ("bld", OHLCV_SCREEN.to_string()),
            ("isuCd", issue.isin),
            ("strtDd", krx_date(start)),
            ("endDd", krx_date(end)),
            ("adjStkPrc", "2".to_string()),
        ];
        let body: OhlcvResponse = self.fetch(&form)?;

        let bars = keep_latest(parse_ohlcv_rows(&body.output), days);
        if bars.is_empty() {
            tracing::warn!(ticker, "gateway returned no usable OHLCV rows");
            return Err(SourceError::EmptyResult);
        }
        Ok(bars)
    }

    /// Per-share valuation metrics (EPS/PER/BPS/PBR/DPS/dividend yield) for
    /// the most recent session at or before `date`.
    pub fn fundamental(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Result<FundamentalSnapshot, SourceError> {
        let issue = self.resolve(ticker)?;
        let end = date.unwrap_or_else(today);
        let start = end - Duration::days(7);

        let form = [
            ("bld", VALUATION_SCREEN.to_string()),
            ("isuCd", issue.isin),
            ("strtDd", krx_date(start)),
            ("endDd", krx_date(end)),
        ];
        let body: ValuationResponse = self.fetch(&form)?;

        let row = latest_row(&body.output, |r| r.trade_date.as_str()).ok_or(SourceError::EmptyResult)?;
        let snapshot = FundamentalSnapshot {
            book_value_per_share: parse_krx_number(&row.bps),
            price_earnings: parse_krx_number(&row.per),
            price_book: parse_krx_number(&row.pbr),
            earnings_per_share: parse_krx_number(&row.eps),
            dividend_yield: parse_krx_number(&row.dividend_yield),
            dividend_per_share: parse_krx_number(&row.dps),
        };

        if snapshot == FundamentalSnapshot::default() {
            return Err(SourceError::EmptyResult);
        }
        Ok(snapshot)
    }

    /// Market-cap snapshot for the most recent session at or before `date`.
    pub fn market_cap(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Result<MarketCapSnapshot, SourceError> {
        let issue = self.resolve(ticker)?;
        let end = date.unwrap_or_else(today);
        let start = end - Duration::days(7);

        let form = [
            ("bld", CAP_SCREEN.to_string()),
            ("isuCd", issue.isin),
            ("strtDd", krx_date(start)),
            ("endDd", krx_date(end)),
        ];
        let body: CapResponse = self.fetch(&form)?;

        let row = latest_row(&body.output, |r| r.trade_date.as_str()).ok_or(SourceError::EmptyResult)?;
        let market_cap = parse_krx_number(&row.market_cap).ok_or(SourceError::EmptyResult)?;

        Ok(MarketCapSnapshot {
            market_cap,
            volume: parse_krx_number(&row.volume).unwrap_or(0.0),
            value_traded: parse_krx_number(&row.value_traded),
            shares_outstanding: parse_krx_number(&row.listed_shares),
            foreign_held_shares: parse_krx_number(&row.foreign_held_shares),
        })
    }

    /// Every listed issue in a market segment on `date`.
    pub fn ticker_list(
        &self,
        date: Option<NaiveDate>,
        market: Market,
    ) -> Result<Vec<ListedStock>, SourceError> {
        let form = [
            ("bld", LISTING_SCREEN.to_string()),
            ("mktId", market_code(market).to_string()),
            ("trdDd", krx_date(date.unwrap_or_else(today))),
        ];
        let body: ListingResponse = self.fetch(&form)?;

        let stocks: Vec<ListedStock> = body
            .output
            .into_iter()
            .map(|row| ListedStock {
                code: row.short_code,
                name: row.abbreviation,
            })
            .collect();

        if stocks.is_empty() {
            return Err(SourceError::EmptyResult);
        }
        Ok(stocks)
    }
}

impl Default for KrxClient {
    fn default() -> Self {
        Self::new()
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn krx_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Gateway numbers are comma-grouped strings; "-" marks no value.
fn parse_krx_number(text: &str) -> Option<f64> {
    let clean: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | ' '))
        .collect();
    if clean.is_empty() || clean == "-" {
        return None;
    }
    clean.parse().ok()
}

fn parse_ohlcv_rows(rows: &[OhlcvRow]) -> Vec<DailyBar> {
    let mut bars: Vec<DailyBar> = rows
        .iter()
        .filter_map(|row| {
            let date = NaiveDate::parse_from_str(&row.trade_date, "%Y/%m/%d").ok()?;
            let bar = DailyBar {
                date,
                open: parse_krx_number(&row.open)?,
                high: parse_krx_number(&row.high)?,
                low: parse_krx_number(&row.low)?,
                close: parse_krx_number(&row.close)?,
                volume: parse_krx_number(&row.volume)?,
                value_traded: parse_krx_number(&row.value_traded),
            };
            bar.validate().ok()?;
            Some(bar)
        })
        .collect();

    bars.sort_by_key(|bar| bar.date);
    bars
}

/// Keep the most recent `days` rows of an ascending-sorted series.
fn keep_latest(mut bars: Vec<DailyBar>, days: usize) -> Vec<DailyBar> {
    if bars.len() > days {
        bars.drain(..bars.len() - days);
    }
    bars
}

fn latest_row<'a, T>(rows: &'a [T], date_of: impl Fn(&T) -> &str) -> Option<&'a T> {
    rows.iter().max_by_key(|row| date_of(row).to_string())
}

// Gateway response shapes. Every numeric field arrives as a display string.

#[derive(Debug, Deserialize)]
struct FinderResponse {
    #[serde(default)]
    block1: Vec<FinderRow>,
}

#[derive(Debug, Deserialize)]
struct FinderRow {
    full_code: String,
    short_code: String,
    #[serde(rename = "codeName")]
    code_name: String,
}

#[derive(Debug, Deserialize)]
struct OhlcvResponse {
    #[serde(default)]
    output: Vec<OhlcvRow>,
}

#[derive(Debug, Deserialize)]
struct OhlcvRow {
    #[serde(rename = "TRD_DD")]
    trade_date: String,
    #[serde(rename = "TDD_OPNPRC", default)]
    open: String,
    #[serde(rename = "TDD_HGPRC", default)]
    high: String,
    #[serde(rename = "TDD_LWPRC", default)]
    low: String,
    #[serde(rename = "TDD_CLSPRC", default)]
    close: String,
    #[serde(rename = "ACC_TRDVOL", default)]
    volume: String,
    #[serde(rename = "ACC_TRDVAL", default)]
    value_traded: String,
}

#[derive(Debug, Deserialize)]
struct ValuationResponse {
    #[serde(default)]
    output: Vec<ValuationRow>,
}

#[derive(Debug, Deserialize)]
struct ValuationRow {
    #[serde(rename = "TRD_DD")]
    trade_date: String,
    #[serde(rename = "EPS", default)]
    eps: String,
    #[serde(rename = "PER", default)]
    per: String,
    #[serde(rename = "BPS", default)]
    bps: String,
    #[serde(rename = "PBR", default)]
    pbr: String,
    #[serde(rename = "DPS", default)]
    dps: String,
    #[serde(rename = "DVD_YLD", default)]
    dividend_yield: String,
}

#[derive(Debug, Deserialize)]
struct CapResponse {
    #[serde(default)]
    output: Vec<CapRow>,
}

#[derive(Debug, Deserialize)]
struct CapRow {
    #[serde(rename = "TRD_DD")]
    trade_date: String,
    #[serde(rename = "MKTCAP", default)]
    market_cap: String,
    #[serde(rename = "ACC_TRDVOL", default)]
    volume: String,
    #[serde(rename = "ACC_TRDVAL", default)]
    value_traded: String,
    #[serde(rename = "LIST_SHRS", default)]
    listed_shares: String,
    #[serde(rename = "FORN_HD_QTY", default)]
    foreign_held_shares: String,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(rename = "OutBlock_1", default)]
    output: Vec<ListingRow>,
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "ISU_SRT_CD")]
    short_code: String,
    #[serde(rename = "ISU_ABBRV", default)]
    abbreviation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn krx_numbers_strip_grouping() {
        assert_eq!(parse_krx_number("71,200"), Some(71200.0));
        assert_eq!(parse_krx_number("12.34"), Some(12.34));
        assert_eq!(parse_krx_number("-1,000"), Some(-1000.0));
        assert_eq!(parse_krx_number("-"), None);
        assert_eq!(parse_krx_number(""), None);
        assert_eq!(parse_krx_number("N/A"), None);
    }

    #[test]
    fn ohlcv_rows_sort_ascending_and_drop_malformed() {
        let raw = r#"{"output": [
            {"TRD_DD":"2026/08/07","TDD_OPNPRC":"71,000","TDD_HGPRC":"72,500",
             "TDD_LWPRC":"70,800","TDD_CLSPRC":"72,000","ACC_TRDVOL":"11,234,567","ACC_TRDVAL":"804,000,000,000"},
            {"TRD_DD":"2026/08/06","TDD_OPNPRC":"70,500","TDD_HGPRC":"71,400",
             "TDD_LWPRC":"70,100","TDD_CLSPRC":"71,000","ACC_TRDVOL":"9,876,543","ACC_TRDVAL":"-"},
            {"TRD_DD":"2026/08/05","TDD_OPNPRC":"-","TDD_HGPRC":"70,900",
             "TDD_LWPRC":"69,800","TDD_CLSPRC":"70,400","ACC_TRDVOL":"8,000,000","ACC_TRDVAL":"-"}
        ]}"#;
        let body: OhlcvResponse = serde_json::from_str(raw).unwrap();
        let bars = parse_ohlcv_rows(&body.output);

        // The row with a missing open is dropped, the rest sort ascending.
        assert_eq!(bars.len(), 2);
        assert!(bars[0].date < bars[1].date);
        assert_eq!(bars[1].close, 72000.0);
        assert_eq!(bars[1].value_traded, Some(804_000_000_000.0));
        assert_eq!(bars[0].value_traded, None);
    }

    #[test]
    fn invalid_range_rows_are_dropped() {
        let raw = r#"{"output": [
            {"TRD_DD":"2026/08/07","TDD_OPNPRC":"71,000","TDD_HGPRC":"70,000",
             "TDD_LWPRC":"70,800","TDD_CLSPRC":"72,000","ACC_TRDVOL":"1"}
        ]}"#;
        let body: OhlcvResponse = serde_json::from_str(raw).unwrap();

        assert!(parse_ohlcv_rows(&body.output).is_empty());
    }

    #[test]
    fn keep_latest_truncates_from_the_old_end() {
        let raw = r#"{"output": [
            {"TRD_DD":"2026/08/05","TDD_OPNPRC":"100","TDD_HGPRC":"110","TDD_LWPRC":"90","TDD_CLSPRC":"105","ACC_TRDVOL":"1"},
            {"TRD_DD":"2026/08/06","TDD_OPNPRC":"100","TDD_HGPRC":"110","TDD_LWPRC":"90","TDD_CLSPRC":"106","ACC_TRDVOL":"1"},
            {"TRD_DD":"2026/08/07","TDD_OPNPRC":"100","TDD_HGPRC":"110","TDD_LWPRC":"90","TDD_CLSPRC":"107","ACC_TRDVOL":"1"}
        ]}"#;
        let body: OhlcvResponse = serde_json::from_str(raw).unwrap();
        let bars = keep_latest(parse_ohlcv_rows(&body.output), 2);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 106.0);
        assert_eq!(bars[1].close, 107.0);
    }

    #[test]
    fn valuation_rows_pick_latest_date() {
        let raw = r#"{"output": [
            {"TRD_DD":"2026/08/06","EPS":"5,000","PER":"14.2","BPS":"60,000","PBR":"1.18","DPS":"1,400","DVD_YLD":"1.97"},
            {"TRD_DD":"2026/08/07","EPS":"5,100","PER":"14.1","BPS":"60,100","PBR":"1.20","DPS":"1,400","DVD_YLD":"1.95"}
        ]}"#;
        let body: ValuationResponse = serde_json::from_str(raw).unwrap();
        let row = latest_row(&body.output, |r| r.trade_date.as_str()).unwrap();

        assert_eq!(parse_krx_number(&row.eps), Some(5100.0));
    }
}
