//! Reconnect backoff: `min(base_ms * 2^attempts, max_ms)`.

use std::time::Duration;

use parley_core::config::ReconnectConfig;

/// Delay before the reconnect attempt that follows `attempts` consecutive
/// failures, or `None` once `max_attempts` is exhausted.
pub fn backoff_delay(attempts: u32, config: &ReconnectConfig) -> Option<Duration> {
    if config.max_attempts.is_some_and(|max| attempts >= max) {
        return None;
    }
    let factor = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);
    let millis = config.base_ms.saturating_mul(factor).min(config.max_ms);
    Some(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_caps() {
        let config = ReconnectConfig::default();
        let delays: Vec<u64> = (0..8)
            .map(|n| backoff_delay(n, &config).unwrap().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 16_000, 32_000, 60_000, 60_000]);
    }

    #[test]
    fn huge_attempt_counts_do_not_overflow() {
        let config = ReconnectConfig::default();
        assert_eq!(backoff_delay(200, &config), Some(Duration::from_millis(60_000)));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let config = ReconnectConfig {
            max_attempts: Some(3),
            ..Default::default()
        };
        assert!(backoff_delay(2, &config).is_some());
        assert_eq!(backoff_delay(3, &config), None);
    }
}
