use std::collections::HashSet;
use std::io::{self, Read, Write};
use std::thread;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::page::{FrameHandle, HostPage, HostSnapshot, PageError};
use crate::protocol::{self, Command, HostEvent};
use crate::watcher::ChangeNotifier;

/// Host page as seen through the extension's content script.
///
/// Reads answer from the latest snapshot the script reported. Writes become
/// [`Command`]s and are reflected in the snapshot right away, so a pass sees
/// its own insertions before the next report arrives.
pub struct ShimPage {
    commands: mpsc::UnboundedSender<Command>,
    href: String,
    present: HashSet<String>,
    // Our insertions the script has not reported back yet.
    unconfirmed: HashSet<String>,
    frame: Option<(FrameHandle, String)>,
    next_frame: u64,
}

impl ShimPage {
    pub fn new(
        commands: mpsc::UnboundedSender<Command>,
        tracked: Vec<String>,
    ) -> Result<Self, PageError> {
        let page = Self {
            commands,
            href: String::new(),
            present: HashSet::new(),
            unconfirmed: HashSet::new(),
            frame: None,
            next_frame: 1,
        };
        page.send(Command::Track { ids: tracked })?;
        Ok(page)
    }

    fn send(&self, command: Command) -> Result<(), PageError> {
        self.commands
            .send(command)
            .map_err(|_| PageError::Disconnected)
    }

    fn require(&self, id: &str) -> Result<(), PageError> {
        if self.present.contains(id) {
            Ok(())
        } else {
            Err(PageError::MissingElement(id.to_string()))
        }
    }

    fn frame_id(&self, frame: FrameHandle) -> Result<String, PageError> {
        match &self.frame {
            Some((handle, id)) if *handle == frame => Ok(id.clone()),
            _ => Err(PageError::UnknownFrame(frame)),
        }
    }
}

impl HostPage for ShimPage {
    fn refresh(&mut self, snapshot: HostSnapshot) {
        self.href = snapshot.href;
        self.present = snapshot.present.into_iter().collect();
        // A snapshot taken before our insert landed must not hide it.
        self.unconfirmed.retain(|id| !self.present.contains(id));
        self.present.extend(self.unconfirmed.iter().cloned());
    }

    fn location(&self) -> &str {
        &self.href
    }

    fn contains(&self, id: &str) -> bool {
        self.present.contains(id)
    }

    fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), PageError> {
        self.require(id)?;
        self.send(Command::SetVisible {
            id: id.to_string(),
            visible,
        })
    }

    fn set_selected(&mut self, id: &str, selected: bool) -> Result<(), PageError> {
        self.require(id)?;
        self.send(Command::SetSelected {
            id: id.to_string(),
            selected,
        })
    }

    fn remove_body_class(&mut self, class: &str) -> Result<(), PageError> {
        self.send(Command::RemoveBodyClass {
            class: class.to_string(),
        })
    }

    fn insert_trigger(&mut self, tab_bar: &str, id: &str, label: &str) -> Result<(), PageError> {
        self.require(tab_bar)?;
        self.send(Command::InsertTrigger {
            parent: tab_bar.to_string(),
            id: id.to_string(),
            label: label.to_string(),
        })?;
        self.present.insert(id.to_string());
        self.unconfirmed.insert(id.to_string());
        Ok(())
    }

    fn insert_frame(
        &mut self,
        before: &str,
        id: &str,
        src: &str,
    ) -> Result<FrameHandle, PageError> {
        self.require(before)?;
        self.send(Command::InsertFrame {
            before: before.to_string(),
            id: id.to_string(),
            src: src.to_string(),
        })?;

        let handle = FrameHandle(self.next_frame);
        self.next_frame += 1;
        self.present.insert(id.to_string());
        self.unconfirmed.insert(id.to_string());
        self.frame = Some((handle, id.to_string()));
        Ok(handle)
    }

    fn set_frame_source(&mut self, frame: FrameHandle, src: &str) -> Result<(), PageError> {
        let id = self.frame_id(frame)?;
        self.send(Command::SetFrameSource {
            id,
            src: src.to_string(),
        })
    }

    fn set_frame_height(&mut self, frame: FrameHandle, px: f64) -> Result<(), PageError> {
        let id = self.frame_id(frame)?;
        self.send(Command::SetFrameHeight { id, px })
    }

    fn remove_frame(&mut self, frame: FrameHandle) -> Result<(), PageError> {
        let id = self.frame_id(frame)?;
        self.frame = None;
        self.present.remove(&id);
        self.unconfirmed.remove(&id);
        self.send(Command::Remove { id })
    }
}

pub struct ChannelNotifier {
    events: mpsc::UnboundedReceiver<HostEvent>,
}

impl ChannelNotifier {
    pub fn new(events: mpsc::UnboundedReceiver<HostEvent>) -> Self {
        Self { events }
    }
}

impl ChangeNotifier for ChannelNotifier {
    async fn next_event(&mut self) -> Option<HostEvent> {
        self.events.recv().await
    }

    fn unsubscribe(&mut self) {
        self.events.close();
    }
}

pub fn read_events<R: Read>(mut reader: R, tx: &mpsc::UnboundedSender<HostEvent>) {
    loop {
        match protocol::read_message::<_, HostEvent>(&mut reader) {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(err) if err.is_recoverable() => warn!(%err, "skipping undecodable message"),
            Err(err) => {
                info!(%err, "input stream closed");
                break;
            }
        }
    }
}

pub fn spawn_stdin_reader(tx: mpsc::UnboundedSender<HostEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || read_events(io::stdin().lock(), &tx))
}

pub fn write_commands<W: Write>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.blocking_recv() {
        if let Err(err) = protocol::write_message(&mut writer, &command) {
            if err.is_recoverable() {
                warn!(%err, ?command, "dropping command");
                continue;
            }
            error!(%err, "error writing to stdout");
            break;
        }
    }
}

// stdout carries protocol frames only; logs go to stderr.
pub fn spawn_stdout_writer(rx: mpsc::UnboundedReceiver<Command>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || write_commands(io::stdout().lock(), rx))
}
