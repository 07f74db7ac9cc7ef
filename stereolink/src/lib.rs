//! # stereolink
//!
//! Rust implementation of the command/telemetry channel protocol spoken
//! by stereo depth cameras over a packetized, fixed-size-report
//! transport.
//!
//! ## Features
//!
//! - Chunked file transfer for the on-device configuration blob
//!   (identity, IMU calibration) with checksums and bounded retries
//! - Continuous telemetry ingest: IMU and per-frame metadata samples,
//!   validated, deduplicated and dispatched to sinks
//! - Transport-agnostic: bring your own 64-byte-report backend
//! - Async/await API using Tokio
//!
//! ## Quick Start
//!
//! ```no_run
//! use stereolink::Channel;
//! use stereolink_transport::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> stereolink::Result<()> {
//!     // Swap the mock for your HID-backed transport
//!     let mut channel = Channel::new(Box::new(MockTransport::new()));
//!     channel.open().await?;
//!
//!     // Read the stored calibration files
//!     let files = channel.read_files().await?;
//!     if let Some(info) = &files.device_info {
//!         println!("{}", info);
//!     }
//!
//!     channel.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod file_channel;
pub mod streaming;

// Re-exports
pub use channel::Channel;
pub use error::{Error, Result};
pub use streaming::{ImageInfoSink, ImuSink};

// Re-export types
pub use stereolink_core::{DeviceFiles, FileFlags, FileId};
pub use stereolink_transport::Transport;
pub use stereolink_types::{
    DeviceInfo, ImageInfoSample, ImuParams, ImuSample, Version,
};
