use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::injector::Phase;
use crate::page::FrameHandle;

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub phase: Phase,
    pub location: String,
    pub params: Option<Value>,
    pub frame: Option<FrameHandle>,
    pub frame_src: Option<String>,
    pub passes: u64,
    pub failed_passes: u64,
    pub height_pending: bool,
}

pub struct AppState {
    pub status: watch::Receiver<Status>,
}

pub type SharedState = Arc<AppState>;
