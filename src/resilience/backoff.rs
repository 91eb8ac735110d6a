//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

/// Delay to wait after failed attempt `attempt` (0-based).
///
/// `base * factor^attempt`, plus up to `jitter_ratio` of that as random extra.
/// With base 1s and factor 1.5 the schedule is 1.0s, 1.5s, 2.25s, ...
pub fn calculate_backoff(attempt: u32, base: Duration, factor: f64, jitter_ratio: f64) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let delay_secs = base.as_secs_f64() * factor.powi(exponent);

    let jitter_secs = if jitter_ratio > 0.0 && delay_secs > 0.0 {
        rand::thread_rng().gen_range(0.0..=delay_secs * jitter_ratio)
    } else {
        0.0
    };

    Duration::try_from_secs_f64(delay_secs + jitter_secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let base = Duration::from_secs(1);
        assert_eq!(calculate_backoff(0, base, 1.5, 0.0), Duration::from_secs(1));
        assert_eq!(calculate_backoff(1, base, 1.5, 0.0), Duration::from_millis(1500));
        assert_eq!(calculate_backoff(2, base, 1.5, 0.0), Duration::from_millis(2250));
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let base = Duration::from_millis(100);
        for _ in 0..100 {
            let d = calculate_backoff(1, base, 2.0, 0.1);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(220));
        }
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let d = calculate_backoff(u32::MAX, Duration::from_secs(1), 2.0, 0.0);
        assert_eq!(d, Duration::MAX);
    }
}
