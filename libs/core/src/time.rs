//! Wall-clock timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
///
/// Entity `created`/`modified`/`pushed` fields carry this form, and the
/// storage layer uses it directly as a sorted-set score.
pub fn timestamp_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        // Clock before the epoch; treat as unset rather than panic.
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotone_enough() {
        let a = timestamp_ms();
        let b = timestamp_ms();
        assert!(a > 1_500_000_000_000);
        assert!(b >= a);
    }
}
