//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] stereolink_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] stereolink_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] stereolink_types::Error),

    /// Firmware reports device class 0xFF: no file channel at all
    #[error("Firmware does not support the file channel, please update it")]
    FileChannelUnsupported,

    /// The acknowledgement retry budget ran out
    #[error("Device went offline: no acknowledgement after {attempts} attempts")]
    HandshakeTimeout {
        attempts: usize,
    },

    /// A chunk read returned nothing mid-transfer
    #[error("Transfer stalled: no chunk arrived in time")]
    TransferStalled,

    /// Chunk index gap: a chunk was lost, the exchange must be restarted
    #[error("Lost chunk: expected index {expected}, got {actual} - restart the exchange")]
    ChunkGap {
        expected: u16,
        actual: u16,
    },

    /// Per-chunk checksum verification failed
    #[error("Chunk {index} failed its checksum")]
    ChunkChecksum {
        index: u16,
    },

    /// Chunk length field out of range for a 64-byte frame
    #[error("Chunk {index} has invalid length {length}")]
    ChunkMalformed {
        index: u16,
        length: usize,
    },

    /// The transport accepted fewer bytes than one full frame
    #[error("Short send: {sent} of {expected} bytes accepted")]
    ShortSend {
        sent: usize,
        expected: usize,
    },

    /// A write request named no records
    #[error("No files provided to write")]
    NoFilesSelected,

    /// `start_streaming` while the ingest loop is already running
    #[error("Streaming loop already running")]
    AlreadyStreaming,

    /// `stop_streaming` without a running ingest loop
    #[error("Streaming loop not running")]
    NotStreaming,

    /// File-channel call while the ingest loop owns the transport
    #[error("File channel unavailable while the streaming loop runs")]
    StreamingActive,
}

impl Error {
    /// Whether retrying the whole exchange might succeed
    ///
    /// Covers transient wire conditions: lost or corrupted chunks, a
    /// silent device. Framing and layout errors are not retryable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::HandshakeTimeout { .. }
                | Self::TransferStalled
                | Self::ChunkGap { .. }
                | Self::ChunkChecksum { .. }
        )
    }
}
