//! Emission Throttle

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Throttle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum time between two emissions (default: 5000 ms)
    pub min_interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 5000,
        }
    }
}

impl ThrottleConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Bounds how often an emission may happen.
///
/// Time is supplied by the caller so the throttle stays clock-agnostic.
/// `last_emit` only moves in [`EmitThrottle::record_emit`].
#[derive(Debug, Clone, Default)]
pub struct EmitThrottle {
    config: ThrottleConfig,
    last_emit: Option<Duration>,
    emit_count: usize,
}

impl EmitThrottle {
    /// Create a new throttle
    pub fn new(config: ThrottleConfig) -> Self {
        debug!("Creating emit throttle with config: {:?}", config);
        Self {
            config,
            last_emit: None,
            emit_count: 0,
        }
    }

    /// Check whether an emission at `now` is allowed
    pub fn should_emit(&self, now: Duration) -> bool {
        match self.last_emit {
            None => true,
            Some(last) => {
                let elapsed = now.saturating_sub(last);
                if elapsed < self.config.min_interval() {
                    debug!(
                        "Emission suppressed: {}ms since last, need {}ms",
                        elapsed.as_millis(),
                        self.config.min_interval_ms
                    );
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Record that an emission happened at `now`
    pub fn record_emit(&mut self, now: Duration) {
        self.last_emit = Some(now);
        self.emit_count += 1;
        debug!("Emission recorded at {}ms (count: {})", now.as_millis(), self.emit_count);
    }

    /// Check and record in one step. Returns whether the emission may proceed.
    pub fn try_emit(&mut self, now: Duration) -> bool {
        if self.should_emit(now) {
            self.record_emit(now);
            true
        } else {
            false
        }
    }

    /// Time of the last recorded emission
    pub fn last_emit(&self) -> Option<Duration> {
        self.last_emit
    }

    /// Emissions recorded since creation or the last reset
    pub fn emit_count(&self) -> usize {
        self.emit_count
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Forget the last emission so the next one is unthrottled
    pub fn reset(&mut self) {
        if self.last_emit.is_some() {
            info!("Emit throttle reset after {} emissions", self.emit_count);
        }
        self.last_emit = None;
        self.emit_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_first_emission_allowed() {
        let throttle = EmitThrottle::default();
        assert!(throttle.should_emit(ms(0)));
        assert!(throttle.last_emit().is_none());
    }

    #[test]
    fn test_within_interval_suppressed() {
        let mut throttle = EmitThrottle::default();
        assert!(throttle.try_emit(ms(1000)));

        assert!(!throttle.should_emit(ms(3000)));
        assert!(!throttle.should_emit(ms(5999)));
        assert!(throttle.should_emit(ms(6000)));
    }

    #[test]
    fn test_check_does_not_move_last_emit() {
        let mut throttle = EmitThrottle::default();
        throttle.record_emit(ms(0));

        // Rejected attempts must not extend the window
        assert!(!throttle.try_emit(ms(4000)));
        assert_eq!(throttle.last_emit(), Some(ms(0)));
        assert!(throttle.try_emit(ms(5000)));
        assert_eq!(throttle.emit_count(), 2);
    }

    #[test]
    fn test_custom_interval() {
        let mut throttle = EmitThrottle::new(ThrottleConfig { min_interval_ms: 100 });
        throttle.record_emit(ms(0));
        assert!(!throttle.should_emit(ms(99)));
        assert!(throttle.should_emit(ms(100)));
    }

    #[test]
    fn test_reset_clears_window() {
        let mut throttle = EmitThrottle::default();
        throttle.record_emit(ms(10_000));
        throttle.reset();

        assert!(throttle.should_emit(ms(10_001)));
        assert_eq!(throttle.emit_count(), 0);
        assert!(throttle.last_emit().is_none());
    }
}
