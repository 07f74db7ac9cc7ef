//! Transport layer for the stereo-camera channel
//!
//! The protocol engine talks to the device through fixed-size (64-byte)
//! reports exchanged over a packetized transport, typically HID. This
//! crate only defines the contract the engine requires plus a scripted
//! mock; a concrete backend (hidapi, nusb, ...) lives with the
//! application that owns the device handle.

pub mod error;
pub mod mock;

pub use error::{Error, Result};
pub use mock::{MockHandle, MockTransport};

use std::time::Duration;

use async_trait::async_trait;

/// Transport contract consumed by the protocol engine
///
/// `send`/`receive` move whole reports; partial transfers do not occur at
/// this layer. Every call may block up to its `timeout`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the device handle
    async fn open(&mut self) -> Result<()>;

    /// Close the device handle
    async fn close(&mut self) -> Result<()>;

    /// Check if the handle is open
    fn is_open(&self) -> bool;

    /// Device class byte reported by the firmware
    ///
    /// `0xFF` marks a firmware without file-channel support; callers must
    /// detect it and skip the handshake entirely.
    fn device_class(&self) -> u8;

    /// Send one report on `channel`
    ///
    /// Returns the number of bytes accepted.
    async fn send(&mut self, channel: u8, frame: &[u8], timeout: Duration) -> Result<usize>;

    /// Receive up to `buf.len()` bytes on `channel`
    ///
    /// `Ok(0)` means nothing arrived within `timeout`. A hard failure
    /// (device unplugged, handle dead) is `Err(Error::Offline)`.
    async fn receive(&mut self, channel: u8, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Human-readable description of the endpoint
    fn description(&self) -> String;
}
