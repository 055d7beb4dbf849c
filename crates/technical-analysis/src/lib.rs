pub mod analyzer;
pub mod indicators;
pub mod signals;

#[cfg(test)]
mod indicators_tests;

pub use analyzer::*;
pub use indicators::*;
pub use signals::*;
