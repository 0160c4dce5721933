use std::future;

use tokio::time::{Duration, Instant, sleep_until};

/// Holds at most one pending value and releases it after a quiet interval.
///
/// Every [`schedule`](Self::schedule) supersedes the pending value and restarts
/// the interval, so a burst releases only its last value once input stops.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.quiet));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    // Cancel safe: the value is only taken once its deadline has passed.
    pub async fn settled(&mut self) -> T {
        loop {
            let Some((_, deadline)) = &self.pending else {
                future::pending::<()>().await;
                continue;
            };
            sleep_until(*deadline).await;
            if let Some((value, _)) = self.pending.take() {
                return value;
            }
        }
    }
}
