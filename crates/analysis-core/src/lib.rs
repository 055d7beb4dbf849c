pub mod error;
pub mod types;

pub use error::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000.0,
            value_traded: None,
        }
    }

    #[test]
    fn valid_bar_passes() {
        assert!(bar(100.0, 110.0, 95.0, 105.0).validate().is_ok());
    }

    #[test]
    fn inverted_range_rejected() {
        assert_eq!(
            bar(100.0, 95.0, 110.0, 105.0).validate(),
            Err(ValidationError::InvalidBarRange)
        );
    }

    #[test]
    fn close_outside_range_rejected() {
        assert_eq!(
            bar(100.0, 110.0, 95.0, 120.0).validate(),
            Err(ValidationError::InvalidBarBounds)
        );
    }

    #[test]
    fn transient_and_empty_are_retryable() {
        assert!(SourceError::Transient("timeout".into()).is_retryable());
        assert!(SourceError::EmptyResult.is_retryable());
        assert!(!SourceError::MalformedMarkup("no table".into()).is_retryable());
    }

    #[test]
    fn quote_snapshot_emptiness() {
        let mut snap = QuoteSnapshot::default();
        assert!(snap.is_empty());
        snap.per = Some(12.5);
        assert!(!snap.is_empty());
    }
}
