//! Fallback orchestration across the structured provider and the portal
//! extractors, plus the top-level single-ticker analysis entry point.

use analysis_core::{
    AnalysisMeta, DailyBar, FinancialReport, FundamentalSnapshot, ListedStock, Market,
    MarketCapSnapshot, QuoteSnapshot, SourceError, TickerAnalysis,
};
use chrono::{NaiveDate, Utc};
use krx_client::deprecated::{investor_trading, short_selling, InvestorTrading, ShortSelling};
use krx_client::KrxClient;
use portal_scraper::{FnGuidePortal, NaverPortal};
use std::time::Duration;

pub mod fallback;

pub use fallback::{run_chain, ChainSource, RetryPolicy};

const STATEMENT_RETRIES: u32 = 2;
const STATEMENT_BACKOFF: Duration = Duration::from_secs(1);

/// Sessions fed into the indicator snapshot.
const INDICATOR_WINDOW: usize = 60;
/// Sessions approximating one trading year for the 52-week range.
const YEAR_WINDOW: usize = 252;

/// Hundred-million-won portal unit scaled to won.
const HUNDRED_MILLION: f64 = 100_000_000.0;

/// Sequences every data kind through the shared fallback chain: structured
/// provider first, portal extraction second, absent result when both fail.
pub struct AnalysisOrchestrator {
    krx: KrxClient,
    naver: NaverPortal,
    fnguide: FnGuidePortal,
}

impl AnalysisOrchestrator {
    pub fn new() -> Self {
        Self {
            krx: KrxClient::new(),
            naver: NaverPortal::new(),
            fnguide: FnGuidePortal::new(),
        }
    }

    /// Daily OHLCV. Neither portal renders a historical series, so this
    /// chain has a single entry; it still runs through the shared executor.
    pub fn ohlcv(
        &self,
        ticker: &str,
        days: usize,
        end_date: Option<NaiveDate>,
    ) -> Option<Vec<DailyBar>> {
        run_chain(
            "ohlcv",
            vec![ChainSource::new("krx", RetryPolicy::none(), || {
                self.krx.ohlcv(ticker, days, end_date)
            })],
        )
    }

    /// Listed name, falling back to the quote page.
    pub fn ticker_name(&self, ticker: &str) -> Option<String> {
        run_chain(
            "ticker_name",
            vec![
                ChainSource::new("krx", RetryPolicy::none(), || self.krx.ticker_name(ticker)),
                ChainSource::new("naver", RetryPolicy::none(), || {
                    self.naver
                        .stock_info(ticker)?
                        .name
                        .ok_or(SourceError::EmptyResult)
                }),
            ],
        )
    }

    /// Every listed issue of a market segment.
    pub fn ticker_list(&self, date: Option<NaiveDate>, market: Market) -> Option<Vec<ListedStock>> {
        run_chain(
            "ticker_list",
            vec![
                ChainSource::new("krx", RetryPolicy::none(), || {
                    self.krx.ticker_list(date, market)
                }),
                ChainSource::new("naver", RetryPolicy::none(), || {
                    self.naver.stock_list(market)
                }),
            ],
        )
    }

    /// Per-share valuation metrics. The portal provides only PER/PBR, so
    /// the merged shape carries `None` for everything it cannot supply.
    pub fn fundamental(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Option<FundamentalSnapshot> {
        run_chain(
            "fundamental",
            vec![
                ChainSource::new("krx", RetryPolicy::none(), || {
                    self.krx.fundamental(ticker, date)
                }),
                ChainSource::new("naver", RetryPolicy::none(), || {
                    let info = self.naver.stock_info(ticker)?;
                    if info.per.is_none() && info.pbr.is_none() {
                        return Err(SourceError::EmptyResult);
                    }
                    Ok(FundamentalSnapshot {
                        book_value_per_share: None,
                        price_earnings: info.per,
                        price_book: info.pbr,
                        earnings_per_share: None,
                        dividend_yield: None,
                        dividend_per_share: None,
                    })
                }),
            ],
        )
    }

    /// Market capitalization. The portal figure is in 100-million-won units
    /// and scales up; its unprovided fields stay `None`.
    pub fn market_cap(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Option<MarketCapSnapshot> {
        run_chain(
            "market_cap",
            vec![
                ChainSource::new("krx", RetryPolicy::none(), || {
                    self.krx.market_cap(ticker, date)
                }),
                ChainSource::new("naver", RetryPolicy::none(), || {
                    let info = self.naver.stock_info(ticker)?;
                    let cap = info
                        .market_cap
                        .filter(|cap| *cap != 0)
                        .ok_or(SourceError::EmptyResult)?;
                    Ok(MarketCapSnapshot {
                        market_cap: cap as f64 * HUNDRED_MILLION,
                        volume: info.volume.unwrap_or(0.0),
                        value_traded: None,
                        shares_outstanding: None,
                        foreign_held_shares: None,
                    })
                }),
            ],
        )
    }

    /// Financial-statement report: statement portal with a bounded retry,
    /// then the limited quote-portal summary.
    pub fn financial_report(&self, ticker: &str) -> Option<FinancialReport> {
        run_chain(
            "financial_report",
            vec![
                ChainSource::new(
                    "fnguide",
                    RetryPolicy::new(STATEMENT_RETRIES, STATEMENT_BACKOFF),
                    || {
                        let bundle = self.fnguide.statements(ticker)?;
                        fundamental_analysis::build_report(ticker, bundle)
                    },
                ),
                ChainSource::new("naver", RetryPolicy::none(), || {
                    self.naver.financial_summary(ticker)
                }),
            ],
        )
    }

    /// Deprecated dataset passthrough: permanently absent.
    pub fn investor_trading(&self, ticker: &str) -> Option<InvestorTrading> {
        investor_trading(ticker)
    }

    /// Deprecated dataset passthrough: permanently absent.
    pub fn short_selling(&self, ticker: &str) -> Option<ShortSelling> {
        short_selling(ticker)
    }

    /// Full technical analysis for one ticker: quote snapshot, 52-week
    /// range, indicator snapshot, support/resistance levels and the signal
    /// summary. Each section nulls independently when its inputs are
    /// unavailable.
    pub fn analyze(&self, ticker: &str) -> TickerAnalysis {
        tracing::info!(ticker, "starting ticker analysis");

        let name = self.ticker_name(ticker);
        let quote = self.naver.stock_info(ticker).ok();
        let year_bars = self.ohlcv(ticker, YEAR_WINDOW, None);
        let bars = self.ohlcv(ticker, INDICATOR_WINDOW, None);

        assemble_analysis(ticker, name, quote, year_bars.as_deref(), bars.as_deref())
    }
}

impl Default for AnalysisOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure assembly of the aggregate analysis; absent inputs null only their
/// own section.
pub fn assemble_analysis(
    ticker: &str,
    name: Option<String>,
    quote: Option<QuoteSnapshot>,
    year_bars: Option<&[DailyBar]>,
    bars: Option<&[DailyBar]>,
) -> TickerAnalysis {
    let current_price = quote.as_ref().and_then(|q| q.price);

    let week52 = year_bars.and_then(|bars| technical_analysis::week52_window(bars, current_price));
    let indicators = bars.and_then(technical_analysis::indicator_snapshot);
    let support_resistance = bars.and_then(technical_analysis::pivot_levels);
    let signals = indicators.as_ref().map(technical_analysis::signal_summary);

    TickerAnalysis {
        meta: AnalysisMeta {
            ticker: ticker.to_string(),
            name,
            timestamp: Utc::now(),
        },
        price_info: quote,
        week52,
        indicators,
        support_resistance,
        signals,
    }
}
