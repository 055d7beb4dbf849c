//! Markup extraction layer for the two finance-portal page families.
//!
//! Everything page-structure-dependent (anchors, container ids, metric label
//! tables) lives behind this crate; consumers only ever see the typed results
//! from `analysis-core`.

pub mod fnguide;
mod http;
pub mod naver;
pub mod text;

pub use fnguide::FnGuidePortal;
pub use naver::NaverPortal;
pub use text::{clean_snapshot_text, parse_market_cap, parse_statement_cell};
