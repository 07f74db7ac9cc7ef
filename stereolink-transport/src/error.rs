//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Transport not open")]
    NotOpen,

    #[error("Transport already open")]
    AlreadyOpen,

    #[error("Device not found: VID=0x{vid:04X} PID=0x{pid:04X}")]
    DeviceNotFound {
        vid: u16,
        pid: u16,
    },

    #[error("Device went offline")]
    Offline,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
