//! File transfer protocol
//!
//! Reads and writes the device's configuration blob (identity,
//! calibration, IMU parameters) as one reassembled file image moved in
//! 64-byte frames.
//!
//! Read path: request (`0x0A`) with a record bitmask, acknowledgement
//! (`0x0B`), then indexed chunks until the total announced by chunk 0 is
//! reached. Duplicate chunks are skipped; an index gap is fatal and the
//! whole exchange must be restarted.
//!
//! Write path: request (`0x8A`) announcing the total size,
//! acknowledgement (`0x8B`), then up to 60-byte chunks marked `0x5A`,
//! closed by an `0xAA 0xFF` terminator. A failure mid-sequence aborts the
//! write with no rollback; what the device keeps after a partial write is
//! undefined.

use std::time::Duration;

use bytes::BytesMut;
use tracing::{debug, trace};

use stereolink_core::checksum;
use stereolink_core::constants::{
    opcodes, timeouts, FileFlags, CHUNK_PAYLOAD_MAX, FRAME_SIZE, HANDSHAKE_RETRY_LIMIT,
    NO_FILE_CHANNEL_CLASS,
};
use stereolink_core::files::{build_file, check_spec_version, parse_file, DeviceFiles};
use stereolink_transport::Transport;

use stereolink_types::{DeviceInfo, ImuParams, Version};

use crate::channel::{Channel, REPORT_CHANNEL};
use crate::error::{Error, Result};

impl Channel {
    /// Read the device's stored files
    ///
    /// Requests all known records (DeviceInfo, Reserve, ImuParams) in one
    /// exchange; records the firmware does not carry simply stay absent
    /// from the result.
    ///
    /// # Errors
    ///
    /// Recoverable wire errors (lost/corrupted chunk, silent device) are
    /// worth one full retry of this call; see
    /// [`Error::is_recoverable`](crate::Error::is_recoverable).
    pub async fn read_files(&self) -> Result<DeviceFiles> {
        self.ensure_not_streaming()?;

        debug!("Reading device files...");

        let data = {
            let mut transport = self.transport.lock().await;
            fetch_file_data(&mut **transport, FileFlags::all()).await?
        };

        let files = parse_file(&data, None)?;
        debug!(
            "Read device files: info={}, imu_params={}",
            files.device_info.is_some(),
            files.imu_params.is_some()
        );
        Ok(files)
    }

    /// Write records to the device's stored files
    ///
    /// At least one record must be given. `spec_version` overrides the
    /// layout-version compatibility warning; it defaults to the one
    /// inside `info` when present.
    ///
    /// A failure after the first chunk leaves the device-side file in an
    /// undefined state; the device offers no rollback and none is
    /// attempted here.
    pub async fn write_files(
        &self,
        info: Option<&DeviceInfo>,
        imu_params: Option<&ImuParams>,
        spec_version: Option<&Version>,
    ) -> Result<()> {
        self.ensure_not_streaming()?;

        if info.is_none() && imu_params.is_none() {
            return Err(Error::NoFilesSelected);
        }

        if let Some(version) = spec_version.or_else(|| info.map(|i| &i.spec_version)) {
            check_spec_version(version);
        }

        let image = build_file(info, imu_params)?;
        debug!("Writing device files, {} bytes...", image.len());

        let mut transport = self.transport.lock().await;
        push_file_data(&mut **transport, &image).await
    }
}

async fn send_frame(
    transport: &mut dyn Transport,
    frame: &[u8; FRAME_SIZE],
    timeout: Duration,
) -> Result<()> {
    let sent = transport.send(REPORT_CHANNEL, frame, timeout).await?;
    if sent < FRAME_SIZE {
        return Err(Error::ShortSend {
            sent,
            expected: FRAME_SIZE,
        });
    }
    Ok(())
}

/// Poll for an acknowledgement frame, bounded by the retry budget
async fn await_ack(transport: &mut dyn Transport, ack: u8) -> Result<()> {
    let mut frame = [0u8; FRAME_SIZE];

    for attempt in 1..=HANDSHAKE_RETRY_LIMIT {
        let n = transport
            .receive(REPORT_CHANNEL, &mut frame, timeouts::ACK)
            .await?;
        if n > 0 && frame[0] == ack {
            trace!("ack 0x{:02X} after {} poll(s)", ack, attempt);
            return Ok(());
        }
        trace!("ack poll {}/{} empty", attempt, HANDSHAKE_RETRY_LIMIT);
    }

    Err(Error::HandshakeTimeout {
        attempts: HANDSHAKE_RETRY_LIMIT,
    })
}

/// Request a file image and reassemble it from the chunk stream
pub(crate) async fn fetch_file_data(
    transport: &mut dyn Transport,
    flags: FileFlags,
) -> Result<Vec<u8>> {
    if transport.device_class() == NO_FILE_CHANNEL_CLASS {
        return Err(Error::FileChannelUnsupported);
    }

    let mut request = [0u8; FRAME_SIZE];
    request[0] = opcodes::FILE_READ_REQUEST;
    request[1] = 1;
    request[2] = flags.bits() & FileFlags::all().bits();
    send_frame(transport, &request, timeouts::SEND).await?;

    await_ack(transport, opcodes::FILE_READ_ACK).await?;

    let mut assembled = BytesMut::new();
    let mut last_index: Option<u16> = None;
    let mut total = 0usize;
    let mut frame = [0u8; FRAME_SIZE];

    loop {
        let n = transport
            .receive(REPORT_CHANNEL, &mut frame, timeouts::CHUNK)
            .await?;
        if n == 0 {
            return Err(Error::TransferStalled);
        }

        // stray acks can trail the handshake until the first chunk lands
        if frame[0] == opcodes::FILE_READ_ACK && last_index.is_none() {
            continue;
        }

        let index = u16::from_le_bytes([frame[0], frame[1]]);
        if last_index == Some(index) {
            trace!("duplicate chunk {}, skipped", index);
            continue;
        }
        let expected = last_index.map_or(0, |i| i + 1);
        if index != expected {
            return Err(Error::ChunkGap {
                expected,
                actual: index,
            });
        }

        let length = frame[2] as usize;
        if length == 0 || 3 + length >= FRAME_SIZE {
            return Err(Error::ChunkMalformed { index, length });
        }
        let payload = &frame[3..3 + length];
        if !checksum::verify(payload, frame[3 + length]) {
            return Err(Error::ChunkChecksum { index });
        }

        if index == 0 {
            // chunk 0 starts with the image's own header: the record-region
            // size sits at payload offset 1, and the image adds a 3-byte
            // header plus 1 checksum byte around it
            total = 4 + u16::from_le_bytes([frame[4], frame[5]]) as usize;
        }

        assembled.extend_from_slice(payload);
        last_index = Some(index);

        if assembled.len() >= total {
            break;
        }
    }

    debug!("reassembled file image: {} bytes", assembled.len());
    Ok(assembled.to_vec())
}

/// Push a file image to the device in marked chunks
pub(crate) async fn push_file_data(transport: &mut dyn Transport, image: &[u8]) -> Result<()> {
    if transport.device_class() == NO_FILE_CHANNEL_CLASS {
        return Err(Error::FileChannelUnsupported);
    }

    let mut request = [0u8; FRAME_SIZE];
    request[0] = opcodes::FILE_WRITE_REQUEST;
    request[1] = 4;
    request[2..6].copy_from_slice(&(image.len() as u32).to_le_bytes());
    send_frame(transport, &request, timeouts::SEND).await?;

    await_ack(transport, opcodes::FILE_WRITE_ACK).await?;

    for (index, chunk) in image.chunks(CHUNK_PAYLOAD_MAX).enumerate() {
        let mut frame = [0u8; FRAME_SIZE];
        frame[0] = opcodes::WRITE_CHUNK;
        frame[1] = index as u8;
        frame[2] = chunk.len() as u8;
        frame[3..3 + chunk.len()].copy_from_slice(chunk);
        frame[3 + chunk.len()] = checksum::calculate(chunk);

        send_frame(transport, &frame, timeouts::WRITE_CHUNK).await?;
        trace!("sent chunk {} ({} bytes)", index, chunk.len());
    }

    let mut done = [0u8; FRAME_SIZE];
    done[0] = opcodes::WRITE_DONE;
    done[1] = opcodes::WRITE_DONE_SENTINEL;
    send_frame(transport, &done, timeouts::WRITE_CHUNK).await?;

    debug!("file image written: {} bytes", image.len());
    Ok(())
}
