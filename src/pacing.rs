//! Human-like pacing between browser interactions.
//!
//! The navigator asks a [`DelayPolicy`] to pause at fixed points of the run.
//! Production uses [`HumanPacing`]; tests plug in [`NoPacing`] or their own
//! recording policy.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Points in the run where the navigator yields to the delay policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Category list rendered, nothing clicked yet.
    BeforeCategoryClick,
    /// Category clicked (or the click was skipped).
    AfterCategoryClick,
    /// Product list rendered, before the first detail page is opened.
    BeforeProducts,
    /// A product was handled, before navigating back to the list.
    AfterProduct,
}

#[async_trait]
pub trait DelayPolicy: Send + Sync {
    async fn pause(&self, at: Pause);
}

/// Inclusive bounds for a uniformly sampled delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingRange {
    pub min: Duration,
    pub max: Duration,
}

impl Default for PacingRange {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(2),
            max: Duration::from_secs(5),
        }
    }
}

impl PacingRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draws a delay in `[min, max]` at millisecond resolution.
    ///
    /// An inverted range collapses to `min`.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let span = (self.max - self.min).as_millis() as u64;
        self.min + Duration::from_millis(fastrand::u64(0..=span))
    }
}

/// Sleeps for a random duration drawn from its range at every pause point.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanPacing {
    range: PacingRange,
}

impl HumanPacing {
    pub fn new(range: PacingRange) -> Self {
        Self { range }
    }
}

#[async_trait]
impl DelayPolicy for HumanPacing {
    async fn pause(&self, at: Pause) {
        let delay = self.range.sample();
        debug!(?at, delay_ms = delay.as_millis() as u64, "pacing pause");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

#[async_trait]
impl DelayPolicy for NoPacing {
    async fn pause(&self, _at: Pause) {}
}
