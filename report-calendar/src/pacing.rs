//! Pacing between UI actions
//!
//! Every dashboard interaction is followed by a jittered pause drawn from a
//! per-kind window.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kind of pause requested after an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After a page-level action (login, navigation, apply, download)
    Action,
    /// After a single month step inside a date picker
    Step,
}

/// Strategy deciding how long to wait between UI actions.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, pause: Pause);
}

/// Pacer that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacer;

#[async_trait]
impl Pacer for NoPacer {
    async fn pause(&self, _pause: Pause) {}
}

/// Half-open delay window in milliseconds, sampled at 100ms granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayWindow {
    const GRANULARITY_MS: u64 = 100;

    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Parse `"min-max"` in milliseconds, e.g. `"4000-9000"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (min, max) = s.split_once('-')?;
        let min = min.trim().parse().ok()?;
        let max = max.trim().parse().ok()?;
        (min <= max).then_some(Self::new(min, max))
    }

    /// Draw a delay from the window.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let low = self.min_ms / Self::GRANULARITY_MS;
        let high = self.max_ms / Self::GRANULARITY_MS;
        let ticks = if low < high {
            rng.random_range(low..high)
        } else {
            low
        };
        Duration::from_millis(ticks * Self::GRANULARITY_MS)
    }
}

/// Pacing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Disable all pauses
    pub enabled: bool,
    /// Window for page-level actions
    pub action: DelayWindow,
    /// Window for picker month steps
    pub step: DelayWindow,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            action: DelayWindow::new(4_000, 9_000),
            step: DelayWindow::new(300, 800),
        }
    }
}

impl PacingConfig {
    /// Build the pacer this configuration describes.
    pub fn build(&self) -> Box<dyn Pacer> {
        if self.enabled {
            Box::new(RandomPacer::new(self.action, self.step))
        } else {
            Box::new(NoPacer)
        }
    }
}

/// Pacer sleeping a random duration drawn from a per-kind window.
#[derive(Debug, Clone, Copy)]
pub struct RandomPacer {
    action: DelayWindow,
    step: DelayWindow,
}

impl RandomPacer {
    pub fn new(action: DelayWindow, step: DelayWindow) -> Self {
        Self { action, step }
    }

    fn next_delay(&self, pause: Pause) -> Duration {
        let window = match pause {
            Pause::Action => self.action,
            Pause::Step => self.step,
        };
        window.sample(&mut rand::rng())
    }
}

impl Default for RandomPacer {
    fn default() -> Self {
        let config = PacingConfig::default();
        Self::new(config.action, config.step)
    }
}

#[async_trait]
impl Pacer for RandomPacer {
    async fn pause(&self, pause: Pause) {
        let delay = self.next_delay(pause);
        tracing::trace!(?pause, ?delay, "Pacing");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_inside_window() {
        let window = DelayWindow::new(4_000, 9_000);
        let mut rng = rand::rng();
        for _ in 0..500 {
            let delay = window.sample(&mut rng);
            assert!(delay >= Duration::from_millis(4_000));
            assert!(delay < Duration::from_millis(9_000));
            assert_eq!(delay.as_millis() % 100, 0);
        }
    }

    #[test]
    fn test_degenerate_window_returns_minimum() {
        let window = DelayWindow::new(500, 500);
        assert_eq!(window.sample(&mut rand::rng()), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(DelayWindow::parse("300-800"), Some(DelayWindow::new(300, 800)));
        assert_eq!(DelayWindow::parse(" 0 - 0 "), Some(DelayWindow::new(0, 0)));
        assert_eq!(DelayWindow::parse("800-300"), None);
        assert_eq!(DelayWindow::parse("fast"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_pacer_sleeps_within_step_window() {
        let pacer = RandomPacer::default();
        let started = tokio::time::Instant::now();
        pacer.pause(Pause::Step).await;
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(900));
    }

    #[test]
    fn test_disabled_config_never_waits() {
        let config = PacingConfig {
            enabled: false,
            ..PacingConfig::default()
        };
        let pacer = config.build();
        tokio_test::block_on(pacer.pause(Pause::Action));
    }
}
