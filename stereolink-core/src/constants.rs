//! Protocol constants

use bitflags::bitflags;

use stereolink_types::Version;

use crate::error::Error;

/// Fixed transport frame size in bytes
pub const FRAME_SIZE: usize = 64;

/// Streamed sub-record size in bytes
pub const SAMPLE_SIZE: usize = 15;

/// Offset of the first sub-record inside a streamed frame
pub const SAMPLE_OFFSET: usize = 3;

/// Maximum payload carried by one write chunk
pub const CHUNK_PAYLOAD_MAX: usize = 60;

/// Acknowledgement polls allowed before the device counts as offline
pub const HANDSHAKE_RETRY_LIMIT: usize = 5;

/// Device class reported by firmwares without file-channel support
pub const NO_FILE_CHANNEL_CLASS: u8 = 0xFF;

/// Spec versions whose record layouts this library understands
pub const SUPPORTED_SPEC_VERSIONS: [Version; 1] = [Version::new(1, 0)];

/// Wire opcodes (first byte of a file-transfer frame)
pub mod opcodes {
    /// File-read request (host to device)
    pub const FILE_READ_REQUEST: u8 = 0x0A;

    /// File-read acknowledgement (device to host)
    pub const FILE_READ_ACK: u8 = 0x0B;

    /// File-write request (host to device)
    pub const FILE_WRITE_REQUEST: u8 = 0x8A;

    /// File-write acknowledgement (device to host)
    pub const FILE_WRITE_ACK: u8 = 0x8B;

    /// Marker on every outgoing write chunk
    pub const WRITE_CHUNK: u8 = 0x5A;

    /// End-of-transfer marker, paired with [`WRITE_DONE_SENTINEL`]
    pub const WRITE_DONE: u8 = 0xAA;

    /// Sentinel byte following [`WRITE_DONE`]
    pub const WRITE_DONE_SENTINEL: u8 = 0xFF;
}

/// Type discriminant of a streamed sub-record
pub mod sample_types {
    /// Accelerometer sample
    pub const ACCEL: u8 = 0;

    /// Gyroscope sample
    pub const GYRO: u8 = 1;

    /// Per-frame image metadata
    pub const IMAGE_INFO: u8 = 2;
}

/// Transport timeouts, as used by the file channel and the ingest loop
pub mod timeouts {
    use std::time::Duration;

    /// Sending a request frame
    pub const SEND: Duration = Duration::from_millis(200);

    /// One acknowledgement poll
    pub const ACK: Duration = Duration::from_millis(2000);

    /// One chunk read during file reassembly
    pub const CHUNK: Duration = Duration::from_millis(220);

    /// One streamed-frame read in the ingest loop
    pub const STREAM: Duration = Duration::from_millis(220);

    /// Sending one write chunk
    pub const WRITE_CHUNK: Duration = Duration::from_millis(100);
}

bitflags! {
    /// Which records a file-read request asks for
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u8 {
        const DEVICE_INFO = 1 << 0;
        const RESERVE = 1 << 1;
        const IMU_PARAMS = 1 << 2;
    }
}

/// Record tags inside a reassembled file image
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FileId {
    DeviceInfo = 1,
    Reserve = 2,
    ImuParams = 4,
}

impl From<FileId> for u8 {
    fn from(id: FileId) -> u8 {
        id as u8
    }
}

impl TryFrom<u8> for FileId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            1 => Ok(Self::DeviceInfo),
            2 => Ok(Self::Reserve),
            4 => Ok(Self::ImuParams),
            _ => Err(Error::UnknownFileId(value)),
        }
    }
}
