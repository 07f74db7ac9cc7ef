//! High-level channel interface

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use stereolink_transport::Transport;

use crate::error::{Error, Result};
use crate::streaming::{ImageInfoSink, ImuSink, StreamWorker};

/// Report channel used for both the file protocol and streaming
pub(crate) const REPORT_CHANNEL: u8 = 0;

/// Command/telemetry channel of a stereo-depth camera
///
/// Owns the transport handle and exposes the two sub-protocols that run
/// over it: the file channel (`read_files`/`write_files`) and the
/// streaming ingest loop (`start_streaming`/`stop_streaming`).
///
/// The two sub-protocols share one report pipe and must not run
/// concurrently; file-channel calls are rejected while the ingest loop is
/// active.
///
/// # Examples
///
/// ```no_run
/// use stereolink::Channel;
/// use stereolink_transport::MockTransport;
///
/// #[tokio::main]
/// async fn main() -> stereolink::Result<()> {
///     let mut channel = Channel::new(Box::new(MockTransport::new()));
///
///     channel.open().await?;
///     let files = channel.read_files().await?;
///     println!("{:?}", files.device_info);
///
///     channel.close().await?;
///     Ok(())
/// }
/// ```
pub struct Channel {
    pub(crate) transport: Arc<Mutex<Box<dyn Transport>>>,
    pub(crate) imu_sink: Option<Arc<dyn ImuSink>>,
    pub(crate) image_info_sink: Option<Arc<dyn ImageInfoSink>>,
    pub(crate) worker: Option<StreamWorker>,
}

impl Channel {
    /// Create a channel over the given transport
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            imu_sink: None,
            image_info_sink: None,
            worker: None,
        }
    }

    /// Open the device handle
    ///
    /// A failed open is retried once before giving up; some devices need
    /// a moment after enumeration.
    pub async fn open(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        if transport.is_open() {
            return Ok(());
        }

        if let Err(first) = transport.open().await {
            warn!("Opening device failed ({}), retrying", first);
            transport.open().await?;
        }

        info!("Opened {}", transport.description());
        Ok(())
    }

    /// Close the device handle
    ///
    /// Stops the ingest loop first if it is still running.
    pub async fn close(&mut self) -> Result<()> {
        if self.worker.is_some() {
            self.stop_streaming().await?;
        }

        let mut transport = self.transport.lock().await;
        if transport.is_open() {
            transport.close().await?;
        }
        Ok(())
    }

    /// Check if the device handle is open
    pub async fn is_open(&self) -> bool {
        self.transport.lock().await.is_open()
    }

    /// Register the IMU sample sink
    ///
    /// Must be registered before `start_streaming`; a running worker
    /// keeps the sinks it was started with. Samples are delivered
    /// synchronously on the ingest task, so the sink must not block.
    pub fn set_imu_sink(&mut self, sink: impl ImuSink + 'static) {
        self.imu_sink = Some(Arc::new(sink));
    }

    /// Register the image-info sample sink
    ///
    /// Same delivery contract as [`Channel::set_imu_sink`].
    pub fn set_image_info_sink(&mut self, sink: impl ImageInfoSink + 'static) {
        self.image_info_sink = Some(Arc::new(sink));
    }

    /// Reject file-channel calls while the ingest loop owns the pipe
    pub(crate) fn ensure_not_streaming(&self) -> Result<()> {
        if self.is_streaming() {
            return Err(Error::StreamingActive);
        }
        Ok(())
    }

    /// Whether the ingest loop is currently running
    ///
    /// Turns false on its own when the worker stops itself after a hard
    /// transport failure; the worker still has to be reaped with
    /// [`Channel::stop_streaming`] before a new one can start.
    pub fn is_streaming(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.stopped())
    }

    /// Start the streaming ingest loop
    ///
    /// Rejected while a previous worker exists, even one that already
    /// stopped itself - reap it with [`Channel::stop_streaming`] first so
    /// the offline condition stays observable.
    pub async fn start_streaming(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(Error::AlreadyStreaming);
        }
        if !self.transport.lock().await.is_open() {
            return Err(Error::Transport(stereolink_transport::Error::NotOpen));
        }

        let worker = StreamWorker::spawn(
            Arc::clone(&self.transport),
            self.imu_sink.clone(),
            self.image_info_sink.clone(),
        );
        self.worker = Some(worker);

        info!("Streaming ingest loop started");
        Ok(())
    }

    /// Stop the streaming ingest loop
    ///
    /// Cooperative: sets the stop flag and waits for the current
    /// iteration to observe it. The transport is safe to reuse or close
    /// once this returns.
    pub async fn stop_streaming(&mut self) -> Result<()> {
        let worker = self.worker.take().ok_or(Error::NotStreaming)?;

        worker.request_stop();
        worker.join().await;

        info!("Streaming ingest loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stereolink_transport::MockTransport;

    #[tokio::test]
    async fn test_open_close() {
        let mut channel = Channel::new(Box::new(MockTransport::new()));
        assert!(!channel.is_open().await);

        channel.open().await.unwrap();
        assert!(channel.is_open().await);
        // idempotent
        channel.open().await.unwrap();

        channel.close().await.unwrap();
        assert!(!channel.is_open().await);
    }

    #[tokio::test]
    async fn test_start_streaming_requires_open_transport() {
        let mut channel = Channel::new(Box::new(MockTransport::new()));
        assert!(matches!(
            channel.start_streaming().await,
            Err(Error::Transport(stereolink_transport::Error::NotOpen))
        ));
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let mut channel = Channel::new(Box::new(MockTransport::new()));
        assert!(matches!(
            channel.stop_streaming().await,
            Err(Error::NotStreaming)
        ));
    }
}
