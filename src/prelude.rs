use std::time::{SystemTime, UNIX_EPOCH};

#[macro_export]
macro_rules! impl_sourceless_error {
    ($e:ident) => {
        impl std::error::Error for $e {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                None
            }
        }
    };
}

/// The current wall-clock time in seconds since the UNIX epoch.
pub fn unix_time_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs().try_into().unwrap_or(i64::MAX),
        // The clock is set before 1970, so every ban is in the future.
        Err(_) => 0,
    }
}

pub(crate) fn seconds_from_now(now: i64, seconds: u64) -> i64 {
    let offset: i64 = seconds.try_into().unwrap_or(i64::MAX);
    now.saturating_add(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_saturate() {
        assert_eq!(seconds_from_now(10, 5), 15);
        assert_eq!(seconds_from_now(10, u64::MAX), i64::MAX);
        assert_eq!(seconds_from_now(i64::MAX - 1, 10), i64::MAX);
    }

    #[test]
    fn test_clock_after_epoch() {
        assert!(unix_time_now() > 1_600_000_000);
    }
}
