//! Quote/summary page family extractor.
//!
//! Fields are located by structural anchors (element roles and classes), and
//! extraction is best-effort per field: one missing anchor nulls only its own
//! field. A page yielding zero fields is an empty result.

use analysis_core::{
    FinancialReport, GrowthMetrics, ListedStock, Market, NewsItem, QuoteSnapshot, RatioMetrics,
    SourceError,
};
use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::http;
use crate::text::{parse_count, parse_decimal, parse_market_cap};

const PORTAL_BASE: &str = "https://finance.naver.com";
const QUOTE_URL: &str = "https://finance.naver.com/item/main.naver";
const COMPANY_URL: &str = "https://finance.naver.com/item/coinfo.naver";
const NEWS_URL: &str = "https://finance.naver.com/item/news.naver";
const LISTING_URL: &str = "https://finance.naver.com/sise/sise_market_sum.naver";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_LISTING_PAGES: u32 = 50;

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("literal selector")
}

pub struct NaverPortal {
    client: Client,
}

impl NaverPortal {
    pub fn new() -> Self {
        Self {
            client: http::build_client(DEFAULT_TIMEOUT_SECS, None),
        }
    }

    /// Current quote, session range and investor-info fields for a ticker.
    pub fn stock_info(&self, ticker: &str) -> Result<QuoteSnapshot, SourceError> {
        let url = format!("{QUOTE_URL}?code={ticker}");
        let html = http::fetch_html(&self.client, &url)?;
        parse_stock_info(&html).ok_or(SourceError::EmptyResult)
    }

    /// All listed issues of a market segment from the paginated cap ranking.
    pub fn stock_list(&self, market: Market) -> Result<Vec<ListedStock>, SourceError> {
        let segment = if market == Market::Kospi { "0" } else { "1" };

        let mut stocks = Vec::new();
        for page in 1..=MAX_LISTING_PAGES {
            let url = format!("{LISTING_URL}?sosok={segment}&page={page}");
            let html = http::fetch_html(&self.client, &url)?;
            let page_stocks = parse_stock_list_page(&html);
            if page_stocks.is_empty() {
                break;
            }
            stocks.extend(page_stocks);
        }

        if stocks.is_empty() {
            return Err(SourceError::EmptyResult);
        }
        Ok(stocks)
    }

    /// Most recent headlines from the per-ticker news listing.
    pub fn stock_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsItem>, SourceError> {
        let url = format!("{NEWS_URL}?code={ticker}");
        let html = http::fetch_html(&self.client, &url)?;

        let items = parse_news_page(&html, limit);
        if items.is_empty() {
            return Err(SourceError::EmptyResult);
        }
        Ok(items)
    }

    /// Limited statement fallback. The company-info page renders its
    /// statement tables inside an iframe, so only the listed name is
    /// recoverable; the result keeps the full report shape with empty
    /// tables and null derived metrics.
    pub fn financial_summary(&self, ticker: &str) -> Result<FinancialReport, SourceError> {
        let url = format!("{COMPANY_URL}?code={ticker}");
        let html = http::fetch_html(&self.client, &url)?;
        parse_financial_summary(ticker, &html).ok_or(SourceError::EmptyResult)
    }
}

impl Default for NaverPortal {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_stock_info(html: &str) -> Option<QuoteSnapshot> {
    let doc = Html::parse_document(html);
    let mut snap = QuoteSnapshot::default();

    if let Some(anchor) = doc.select(&css("div.wrap_company h2 a")).next() {
        let name = element_text(&anchor);
        if !name.is_empty() {
            snap.name = Some(name);
        }
    }

    if let Some(price) = doc.select(&css("p.no_today span.blind")).next() {
        snap.price = Some(parse_count(&element_text(&price)) as f64);
    }

    let change_cells: Vec<String> = doc
        .select(&css("p.no_exday span.blind"))
        .map(|el| element_text(&el))
        .collect();
    if change_cells.len() >= 2 {
        let mut change = parse_count(&change_cells[0]) as f64;
        let mut change_pct = parse_decimal(&change_cells[1].replace('%', ""));

        // Direction comes from the styling class, not the number itself.
        let falling = doc
            .select(&css("p.no_exday em"))
            .next()
            .map(|em| em.value().classes().any(|class| class.contains("down")))
            .unwrap_or(false);
        if falling {
            change = -change;
            change_pct = -change_pct;
        }

        snap.change = Some(change);
        snap.change_pct = Some(change_pct);
    }

    if let Some(table) = doc.select(&css("table.no_info")).next() {
        for row in table.select(&css("tr")) {
            for cell in row.select(&css("td")) {
                let label = cell.text().collect::<String>();
                let Some(blind) = cell.select(&css("span.blind")).next() else {
                    continue;
                };
                let value = parse_count(&element_text(&blind)) as f64;

                if label.contains("전일") {
                    snap.prev_close = Some(value);
                } else if label.contains("시가") {
                    snap.open = Some(value);
                } else if label.contains("고가") {
                    snap.high = Some(value);
                } else if label.contains("저가") {
                    snap.low = Some(value);
                } else if label.contains("거래량") {
                    snap.volume = Some(value);
                }
            }
        }
    }

    if let Some(aside) = doc.select(&css("div.aside_invest_info")).next() {
        for row in aside.select(&css("tr")) {
            let Some(header) = row.select(&css("th")).next() else {
                continue;
            };
            let Some(cell) = row.select(&css("td")).next() else {
                continue;
            };

            let label = element_text(&header);
            let value_text = cell
                .select(&css("em"))
                .next()
                .map(|em| element_text(&em))
                .unwrap_or_else(|| element_text(&cell));

            // Exact label match so the market-cap *rank* row is not misread.
            if label == "시가총액" {
                snap.market_cap = Some(parse_market_cap(&value_text));
            } else if label.contains("PER") {
                snap.per = Some(parse_decimal(&value_text));
            } else if label.contains("PBR") {
                snap.pbr = Some(parse_decimal(&value_text));
            } else if label.contains("외국인") {
                snap.foreign_ratio = Some(parse_decimal(&value_text.replace('%', "")));
            }
        }
    }

    if snap.is_empty() {
        None
    } else {
        Some(snap)
    }
}

pub(crate) fn parse_stock_list_page(html: &str) -> Vec<ListedStock> {
    let doc = Html::parse_document(html);
    let mut stocks = Vec::new();

    for row in doc.select(&css("table.type_2 tr")) {
        let Some(link) = row.select(&css("a.tltle")).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or("");
        let Some(raw_code) = href.split("code=").nth(1) else {
            continue;
        };
        let code = raw_code.split('&').next().unwrap_or(raw_code);

        if code.len() == 6 {
            stocks.push(ListedStock {
                code: code.to_string(),
                name: element_text(&link),
            });
        }
    }

    stocks
}

pub(crate) fn parse_news_page(html: &str, limit: usize) -> Vec<NewsItem> {
    let doc = Html::parse_document(html);
    let mut items = Vec::new();

    for row in doc.select(&css("table.type5 tr")) {
        let Some(link) = row.select(&css("td.title a")).next() else {
            continue;
        };
        let Some(date) = row.select(&css("td.date")).next() else {
            continue;
        };

        items.push(NewsItem {
            title: element_text(&link),
            date: element_text(&date),
            url: format!("{PORTAL_BASE}{}", link.value().attr("href").unwrap_or("")),
        });

        if items.len() >= limit {
            break;
        }
    }

    items
}

pub(crate) fn parse_financial_summary(ticker: &str, html: &str) -> Option<FinancialReport> {
    let doc = Html::parse_document(html);
    let name = doc
        .select(&css("div.wrap_company h2 a"))
        .next()
        .map(|el| element_text(&el))
        .filter(|name| !name.is_empty())?;

    Some(FinancialReport {
        source: "Naver Finance".to_string(),
        ticker: ticker.to_string(),
        name: Some(name),
        period: None,
        income_annual: Default::default(),
        balance_annual: Default::default(),
        cash_flow_annual: Default::default(),
        latest: Default::default(),
        growth: GrowthMetrics::default(),
        ratios: RatioMetrics::default(),
        period_labels: Default::default(),
    })
}

fn element_text(element: &scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
