use std::io::{self, Read, Write};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::page::HostSnapshot;

/// Largest frame the browser will deliver to a native host.
pub const MAX_INBOUND_BYTES: usize = 64 * 1024 * 1024;
/// Largest frame the browser accepts from a native host.
pub const MAX_OUTBOUND_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed message body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {0} bytes exceeds the native messaging limit")]
    TooLarge(usize),
}

impl ProtocolError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProtocolError::Io(_))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    Ready(HostSnapshot),
    Mutations(HostSnapshot),
    TriggerActivated(HostSnapshot),
    /// Any host tab other than the trigger was activated.
    TabActivated(HostSnapshot),
    /// A `postMessage` from the embedded analysis frame.
    FrameMessage {
        #[serde(default)]
        data: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Track { ids: Vec<String> },
    SetVisible { id: String, visible: bool },
    SetSelected { id: String, selected: bool },
    RemoveBodyClass { class: String },
    InsertTrigger { parent: String, id: String, label: String },
    InsertFrame { before: String, id: String, src: String },
    SetFrameSource { id: String, src: String },
    SetFrameHeight { id: String, px: f64 },
    Remove { id: String },
}

pub fn read_message<R: Read, T: DeserializeOwned>(mut reader: R) -> Result<T, ProtocolError> {
    let len = reader.read_u32::<NativeEndian>()? as usize;
    if len > MAX_INBOUND_BYTES {
        io::copy(&mut (&mut reader).take(len as u64), &mut io::sink())?;
        return Err(ProtocolError::TooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;

    Ok(serde_json::from_slice(&body)?)
}

pub fn write_message<W: Write, T: Serialize>(mut writer: W, msg: &T) -> Result<(), ProtocolError> {
    let body = serde_json::to_vec(msg)?;
    if body.len() > MAX_OUTBOUND_BYTES {
        return Err(ProtocolError::TooLarge(body.len()));
    }

    writer.write_u32::<NativeEndian>(body.len() as u32)?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}
