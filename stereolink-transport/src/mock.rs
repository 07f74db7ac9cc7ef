//! Scripted mock transport
//!
//! Drives the protocol engine in tests and examples without hardware:
//! receives are played back from a queued script, sends are captured for
//! inspection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::error::{Error, Result};
use crate::Transport;

/// One scripted receive outcome
#[derive(Debug, Clone)]
enum Step {
    /// Deliver these bytes
    Frame(Vec<u8>),
    /// Let the read time out (`Ok(0)`)
    Timeout,
    /// Hard failure: the device went away
    Offline,
}

#[derive(Debug, Default)]
struct Inner {
    open: bool,
    device_class: u8,
    script: VecDeque<Step>,
    sent: Vec<Vec<u8>>,
    fail_sends: bool,
}

/// Mock transport for protocol tests
///
/// An exhausted script behaves like a silent device: every further
/// receive times out.
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

/// Cloneable scripting/inspection handle
///
/// Stays usable after the transport itself has been boxed and moved into
/// the protocol engine.
#[derive(Clone)]
pub struct MockHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Get a scripting handle
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    /// Queue a frame to be delivered on the next receive
    pub fn push_frame(&self, frame: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .script
            .push_back(Step::Frame(frame.to_vec()));
    }

    /// Queue one receive timeout
    pub fn push_timeout(&self) {
        self.inner.lock().unwrap().script.push_back(Step::Timeout);
    }

    /// Queue a hard receive failure (device went away)
    pub fn push_offline(&self) {
        self.inner.lock().unwrap().script.push_back(Step::Offline);
    }

    /// Set the device class byte (`0xFF` = no file channel)
    pub fn set_device_class(&self, class: u8) {
        self.inner.lock().unwrap().device_class = class;
    }

    /// Make every subsequent send fail
    pub fn fail_sends(&self, fail: bool) {
        self.inner.lock().unwrap().fail_sends = fail;
    }

    /// All frames sent so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Number of scripted steps not yet consumed
    pub fn script_len(&self) -> usize {
        self.inner.lock().unwrap().script.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.open {
            return Err(Error::AlreadyOpen);
        }
        inner.open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.lock().unwrap().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().unwrap().open
    }

    fn device_class(&self) -> u8 {
        self.inner.lock().unwrap().device_class
    }

    async fn send(&mut self, channel: u8, frame: &[u8], _timeout: Duration) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return Err(Error::NotOpen);
        }
        if inner.fail_sends {
            return Err(Error::SendFailed("scripted send failure".into()));
        }

        trace!("mock send on channel {}: {} bytes", channel, frame.len());
        inner.sent.push(frame.to_vec());
        Ok(frame.len())
    }

    async fn receive(&mut self, _channel: u8, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return Err(Error::NotOpen);
        }

        match inner.script.pop_front() {
            Some(Step::Frame(frame)) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                Ok(n)
            }
            Some(Step::Timeout) | None => Ok(0),
            Some(Step::Offline) => Err(Error::Offline),
        }
    }

    fn description(&self) -> String {
        "mock".to_string()
    }
}
