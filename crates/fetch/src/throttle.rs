use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Enforces a fixed pause between consecutive requests.
///
/// Shared by the metadata source and the poster fetcher so both count
/// against the same budget.
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}
impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: Mutex::new(None) }
    }

    /// Waits until `delay` has passed since the previous call returned.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.delay).await;
        }
        *last = Some(Instant::now());
    }
}
