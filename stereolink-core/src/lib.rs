//! # stereolink-core
//!
//! Core protocol implementation for the stereo-camera command/telemetry
//! channel.
//!
//! This crate provides the low-level protocol primitives:
//! - XOR frame checksum
//! - Bounds-checked byte cursors (little-endian, bit-preserving doubles)
//! - Calibration record codec (identity, IMU intrinsics, extrinsics)
//! - File-image assembly and parsing
//! - Wire constants

pub mod checksum;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod files;
pub mod records;

pub use constants::{FileFlags, FileId, FRAME_SIZE, SAMPLE_SIZE};
pub use cursor::{ByteReader, ByteWriter};
pub use error::{Error, Result};
pub use files::DeviceFiles;
