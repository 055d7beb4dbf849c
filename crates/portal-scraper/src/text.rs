//! Localized numeric-text primitives shared by both portal extractors.
//!
//! Two deliberately different absence rules coexist here: statement cells
//! treat dashes and empty text as "no value" (`None`), while market-cap text
//! defaults to zero. Both behaviors are load-bearing for callers.

use regex::Regex;
use std::sync::LazyLock;

static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d\-]").expect("literal regex"));
static NON_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d\.\-]").expect("literal regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]").expect("literal regex"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("literal regex"));
static TRILLION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*조").expect("literal regex"));
static HUNDRED_MILLION_AFTER_TRILLION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"조\s*([\d,]+)").expect("literal regex"));
static HUNDRED_MILLION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,]+)\s*억").expect("literal regex"));

/// Integer count from display text ("63,512" -> 63512); 0 when no digits.
pub fn parse_count(text: &str) -> i64 {
    NON_DIGIT.replace_all(text, "").parse().unwrap_or(0)
}

/// Decimal from display text ("1.04배" -> 1.04); 0.0 when nothing parses.
pub fn parse_decimal(text: &str) -> f64 {
    NON_DECIMAL.replace_all(text, "").parse().unwrap_or(0.0)
}

/// Statement-cell rule: thousands separators and surrounding whitespace are
/// stripped; `-`, `N/A` and empty text mean "no value", never zero.
pub fn parse_statement_cell(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || matches!(trimmed, "-" | "N/A" | "NA") {
        return None;
    }
    SEPARATORS.replace_all(trimmed, "").parse().ok()
}

/// Market-cap rule: compound 조/억 text is converted into the
/// 100-million-won base unit ("8조 9,014억" -> 89014). The unit tokens may be
/// separated by line breaks. A lone number passes through as already being
/// in the base unit; empty or unusable text is 0.
pub fn parse_market_cap(text: &str) -> i64 {
    if text.is_empty() {
        return 0;
    }

    let clean = WHITESPACE_RUNS.replace_all(text, " ");
    let clean = clean.trim();

    if clean.contains('조') {
        let trillions = TRILLION_TOKEN
            .captures(clean)
            .and_then(|caps| caps[1].parse::<i64>().ok())
            .unwrap_or(0);
        let hundred_millions = HUNDRED_MILLION_AFTER_TRILLION
            .captures(clean)
            .and_then(|caps| caps[1].replace(',', "").parse::<i64>().ok())
            .unwrap_or(0);
        trillions * 10_000 + hundred_millions
    } else if clean.contains('억') {
        HUNDRED_MILLION_TOKEN
            .captures(clean)
            .and_then(|caps| caps[1].replace(',', "").parse::<i64>().ok())
            .unwrap_or(0)
    } else {
        let digits = NON_DIGIT.replace_all(clean, "").replace('-', "");
        digits.parse().unwrap_or(0)
    }
}

static REF_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ref=e\d+\]").expect("literal regex"));
static CURSOR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[cursor=\w+\]").expect("literal regex"));
static EMPTY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\]").expect("literal regex"));
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"  +").expect("literal regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("literal regex"));

/// Strip structural noise from automation-tool snapshot text: bracketed
/// ref/cursor markers, leftover empty brackets, space runs and blank lines.
pub fn clean_snapshot_text(text: &str) -> String {
    let text = REF_MARKER.replace_all(text, "");
    let text = CURSOR_MARKER.replace_all(&text, "");
    let text = EMPTY_BRACKETS.replace_all(&text, "");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n");
    text.trim().to_string()
}
