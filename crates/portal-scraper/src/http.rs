use analysis_core::SourceError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::time::Duration;

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Blocking client with the fixed identification header and a per-portal
/// timeout. `MARKET_HTTP_TIMEOUT_SECS` overrides the default.
pub(crate) fn build_client(default_timeout_secs: u64, referer: Option<&'static str>) -> Client {
    let timeout_secs: u64 = std::env::var("MARKET_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_timeout_secs);

    let mut headers = HeaderMap::new();
    if let Some(referer) = referer {
        headers.insert(REFERER, HeaderValue::from_static(referer));
    }

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET a page body, collapsing every transport condition into a transient
/// source failure.
pub(crate) fn fetch_html(client: &Client, url: &str) -> Result<String, SourceError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| SourceError::Transient(e.to_string()))?;

    if !response.status().is_success() {
        return Err(SourceError::Transient(format!(
            "portal HTTP {}",
            response.status()
        )));
    }

    response
        .text()
        .map_err(|e| SourceError::Transient(format!("portal body: {e}")))
}
