//! Delay policies between reconnect attempts.

use std::time::Duration;

use slidesync_config::ClientConfig;

/// Decides how long to wait before the next connection attempt.
pub trait BackoffPolicy: Send + 'static {
    /// Delay before the next attempt. Called once per failed or lost
    /// connection.
    fn next_delay(&mut self) -> Duration;

    /// Called after a successful connect.
    fn reset(&mut self);
}

/// Doubles the delay after every failure, capped at `max`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let max = max.max(base);
        Self {
            base,
            max,
            current: base,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.reconnect_delay(), config.max_reconnect_delay())
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.base;
    }
}

/// Same delay every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl BackoffPolicy for FixedBackoff {
    fn next_delay(&mut self) -> Duration {
        self.0
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn doubles_until_capped() {
        let mut backoff = ExponentialBackoff::new(ms(500), ms(3000));
        let delays: Vec<_> = (0..6).map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            vec![ms(500), ms(1000), ms(2000), ms(3000), ms(3000), ms(3000)]
        );
    }

    #[test]
    fn reset_returns_to_base() {
        let mut backoff = ExponentialBackoff::new(ms(100), ms(10_000));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), ms(100));
    }

    #[test]
    fn max_below_base_is_raised() {
        let mut backoff = ExponentialBackoff::new(ms(500), ms(100));
        assert_eq!(backoff.next_delay(), ms(500));
        assert_eq!(backoff.next_delay(), ms(500));
    }

    #[test]
    fn from_config_uses_client_section() {
        let mut backoff = ExponentialBackoff::from_config(&ClientConfig::default());
        assert_eq!(backoff.next_delay(), ms(500));
        assert_eq!(backoff.next_delay(), ms(1000));
    }

    #[test]
    fn fixed_never_changes() {
        let mut backoff = FixedBackoff(ms(20));
        assert_eq!(backoff.next_delay(), ms(20));
        backoff.reset();
        assert_eq!(backoff.next_delay(), ms(20));
    }
}
