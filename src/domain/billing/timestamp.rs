//! Timestamp normalization for payload fields.
//!
//! Stripe delivers timestamps as integer epoch seconds and uses zero (or an
//! absent field) to mean "not set". Normalization maps both to `None` and
//! everything else to the UTC instant; there is no timezone conversion.

use chrono::{DateTime, Utc};

/// Converts an optional epoch-seconds timestamp into a UTC instant.
///
/// `None` and `Some(0)` normalize to `None` (zero means "not set", not the
/// epoch instant). Values outside chrono's representable range also yield
/// `None` rather than panicking.
pub fn epoch_to_utc(timestamp: Option<i64>) -> Option<DateTime<Utc>> {
    match timestamp {
        None | Some(0) => None,
        Some(secs) => DateTime::from_timestamp(secs, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn none_normalizes_to_none() {
        assert_eq!(epoch_to_utc(None), None);
    }

    #[test]
    fn zero_means_not_set() {
        assert_eq!(epoch_to_utc(Some(0)), None);
    }

    #[test]
    fn known_instant_normalizes_to_utc() {
        let ts = epoch_to_utc(Some(1_700_000_000)).unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn renormalizing_is_a_no_op() {
        let ts = epoch_to_utc(Some(1_700_000_000)).unwrap();
        assert_eq!(epoch_to_utc(Some(ts.timestamp())), Some(ts));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(secs in 1i64..=4_102_444_800) {
            let first = epoch_to_utc(Some(secs)).unwrap();
            let second = epoch_to_utc(Some(first.timestamp())).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn normalized_value_preserves_seconds(secs in 1i64..=4_102_444_800) {
            let ts = epoch_to_utc(Some(secs)).unwrap();
            prop_assert_eq!(ts.timestamp(), secs);
        }
    }
}
