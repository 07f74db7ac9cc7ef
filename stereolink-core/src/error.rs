//! Error types for stereolink-core

use crate::constants::FileId;

/// Result type alias for stereolink-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cursor read or write would run past the end of the buffer
    #[error("Buffer overrun: needed {needed} bytes, {remaining} remaining")]
    BufferOverrun {
        needed: usize,
        remaining: usize,
    },

    /// A string does not fit its fixed-width wire slot
    #[error("String too long: {len} bytes (capacity: {capacity} bytes)")]
    StringTooLong {
        len: usize,
        capacity: usize,
    },

    /// Reassembled file image is shorter than its own framing
    #[error("File image too short: expected at least {expected} bytes, got {actual} bytes")]
    FileTooShort {
        expected: usize,
        actual: usize,
    },

    /// Whole-file checksum verification failed
    #[error("File checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch {
        expected: u8,
        actual: u8,
    },

    /// A record's declared length runs past the end of the file image
    #[error("Record 0x{id:02X} overruns the file image")]
    TruncatedRecord {
        id: u8,
    },

    /// Decoded byte count disagrees with the record header, which means the
    /// firmware speaks a layout this library does not understand
    #[error("Record {id:?} length mismatch: header says {expected} bytes, decoded {actual} - likely incompatible firmware")]
    RecordLengthMismatch {
        id: FileId,
        expected: usize,
        actual: usize,
    },

    /// Unknown record tag
    #[error("Unknown file id: {0}")]
    UnknownFileId(u8),

    /// Streamed sub-record shorter than the fixed sample size
    #[error("Sample too short: expected {expected} bytes, got {actual} bytes")]
    SampleTooShort {
        expected: usize,
        actual: usize,
    },

    /// Streamed sub-record carries an unknown type discriminant
    #[error("Unknown sample type: {0}")]
    UnknownSampleType(u8),
}
