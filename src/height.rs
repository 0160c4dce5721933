use serde_json::Value;
use tokio::time::Duration;
use tracing::debug;

use crate::debounce::Debouncer;

/// Pixel height requested by the embedded content, if the payload is one.
pub fn parse_height(data: &Value) -> Option<f64> {
    data.as_f64().filter(|px| px.is_finite() && *px > 0.0)
}

/// Frame-to-host resize channel. Heights are applied only once the embedded
/// content stops reporting for a quiet interval, so its own layout passes do
/// not make the frame flicker.
#[derive(Debug)]
pub struct HeightSync {
    pending: Debouncer<Value>,
}

impl HeightSync {
    pub fn new(quiet: Duration) -> Self {
        Self {
            pending: Debouncer::new(quiet),
        }
    }

    // Every message supersedes the pending one, usable or not.
    pub fn receive(&mut self, data: Value) {
        self.pending.schedule(data);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// The last message of a burst, as a height. `None` when it is not one.
    pub async fn settled(&mut self) -> Option<f64> {
        let data = self.pending.settled().await;
        let px = parse_height(&data);
        if px.is_none() {
            debug!(%data, "ignoring non-height frame message");
        }
        px
    }
}
