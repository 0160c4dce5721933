use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of an injected frame element. Survives source changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameHandle(pub u64);

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Host page state as last reported by the content script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub href: String,
    /// Tracked element ids that currently exist in the host document.
    #[serde(default)]
    pub present: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("host element `{0}` is missing")]
    MissingElement(String),
    #[error("{0} is not attached to the page")]
    UnknownFrame(FrameHandle),
    #[error("content script bridge is disconnected")]
    Disconnected,
}

/// The slice of the host document the injector reads and writes.
///
/// Ids passed in are the injector's own (trigger, frame) or the host's stable
/// containers (tab bar, content region). Implementations report shape drift
/// as [`PageError::MissingElement`] instead of panicking.
pub trait HostPage {
    fn refresh(&mut self, snapshot: HostSnapshot);

    fn location(&self) -> &str;

    fn contains(&self, id: &str) -> bool;

    fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), PageError>;

    fn set_selected(&mut self, id: &str, selected: bool) -> Result<(), PageError>;

    fn remove_body_class(&mut self, class: &str) -> Result<(), PageError>;

    /// Insert the trigger tab as the first child of `tab_bar`.
    fn insert_trigger(&mut self, tab_bar: &str, id: &str, label: &str) -> Result<(), PageError>;

    /// Insert a frame immediately before the element `before`.
    fn insert_frame(&mut self, before: &str, id: &str, src: &str)
    -> Result<FrameHandle, PageError>;

    fn set_frame_source(&mut self, frame: FrameHandle, src: &str) -> Result<(), PageError>;

    fn set_frame_height(&mut self, frame: FrameHandle, px: f64) -> Result<(), PageError>;

    fn remove_frame(&mut self, frame: FrameHandle) -> Result<(), PageError>;
}
