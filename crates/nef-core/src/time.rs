use time::OffsetDateTime;

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Converts a unix-seconds timestamp as written by the core network.
///
/// Out of range values collapse to the epoch; producers write `0` when they
/// have no clock information and this keeps both cases on the same path.
pub fn from_unix(seconds: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(seconds).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Seconds elapsed between `seconds` and `now`, clamped to `0..=i32::MAX`.
pub fn age_seconds(seconds: i64, now: OffsetDateTime) -> i32 {
    let age = now.unix_timestamp().saturating_sub(seconds).max(0);
    i32::try_from(age).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn converts_unix_seconds() {
        assert_eq!(from_unix(0), OffsetDateTime::UNIX_EPOCH);
        assert_eq!(from_unix(1_700_000_000), datetime!(2023-11-14 22:13:20 UTC));
        assert_eq!(from_unix(i64::MAX), OffsetDateTime::UNIX_EPOCH);
    }

    #[test]
    fn age_is_never_negative() {
        let now = datetime!(2024-01-01 00:00:10 UTC);
        assert_eq!(age_seconds(now.unix_timestamp() - 10, now), 10);
        assert_eq!(age_seconds(now.unix_timestamp() + 60, now), 0);
        assert_eq!(age_seconds(i64::MIN, now), i32::MAX);
    }
}
