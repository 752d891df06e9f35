//! Exponential backoff.

use std::time::Duration;

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at `max_ms`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(calculate_backoff(1, 1000, 30_000), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(2, 1000, 30_000), Duration::from_millis(2000));
        assert_eq!(calculate_backoff(3, 1000, 30_000), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_cap_and_zero() {
        assert_eq!(calculate_backoff(0, 1000, 30_000), Duration::ZERO);
        assert_eq!(calculate_backoff(10, 1000, 5_000), Duration::from_millis(5_000));
        assert_eq!(calculate_backoff(80, 1000, u64::MAX), Duration::from_millis(u64::MAX));
    }
}
