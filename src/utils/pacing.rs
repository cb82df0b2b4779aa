//! Static-interval pacing between remote calls.

use std::time::Duration;

/// Sleeps a fixed interval after each call it is asked to pace.
///
/// The interval never shrinks, whatever the outcome of the previous call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}
