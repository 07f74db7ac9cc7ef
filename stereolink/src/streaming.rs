//! Streaming ingest loop
//!
//! One background task reads double-sized report buffers, validates and
//! deduplicates every 64-byte frame inside them, splits frames into
//! 15-byte sub-records and dispatches the decoded samples to the
//! registered sinks.
//!
//! Error policy: a corrupted frame is dropped and logged, never retried;
//! a hard transport failure stops the loop and marks the device offline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use stereolink_core::constants::{sample_types, timeouts, FRAME_SIZE, SAMPLE_OFFSET, SAMPLE_SIZE};
use stereolink_core::records::{decode_image_info, decode_imu_sample};
use stereolink_core::checksum;
use stereolink_transport::Transport;
use stereolink_types::{ImageInfoSample, ImuSample};

use crate::channel::REPORT_CHANNEL;

/// IMU sample consumer
///
/// Invoked synchronously on the ingest task, in arrival order. Blocking
/// here stalls all further ingestion.
pub trait ImuSink: Send + Sync {
    fn on_imu(&self, sample: &ImuSample);
}

impl<F> ImuSink for F
where
    F: Fn(&ImuSample) + Send + Sync,
{
    fn on_imu(&self, sample: &ImuSample) {
        self(sample)
    }
}

/// Image-info sample consumer
///
/// Same delivery contract as [`ImuSink`].
pub trait ImageInfoSink: Send + Sync {
    fn on_image_info(&self, sample: &ImageInfoSample);
}

impl<F> ImageInfoSink for F
where
    F: Fn(&ImageInfoSample) + Send + Sync,
{
    fn on_image_info(&self, sample: &ImageInfoSample) {
        self(sample)
    }
}

/// Samples decoded from one report buffer
#[derive(Debug, Default)]
pub(crate) struct SampleBatch {
    pub imu: Vec<ImuSample>,
    pub image_info: Vec<ImageInfoSample>,
}

impl SampleBatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.imu.is_empty() && self.image_info.is_empty()
    }
}

/// Handle to the spawned ingest task
pub(crate) struct StreamWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl StreamWorker {
    pub(crate) fn spawn(
        transport: Arc<Mutex<Box<dyn Transport>>>,
        imu_sink: Option<Arc<dyn ImuSink>>,
        image_info_sink: Option<Arc<dyn ImageInfoSink>>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run_loop(
            transport,
            imu_sink,
            image_info_sink,
            Arc::clone(&stop),
        ));
        Self { stop, handle }
    }

    /// Whether the loop has observed or raised a stop condition
    pub(crate) fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub(crate) async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("ingest task panicked: {}", e);
        }
    }
}

async fn run_loop(
    transport: Arc<Mutex<Box<dyn Transport>>>,
    imu_sink: Option<Arc<dyn ImuSink>>,
    image_info_sink: Option<Arc<dyn ImageInfoSink>>,
    stop: Arc<AtomicBool>,
) {
    let mut buf = [0u8; FRAME_SIZE * 2];
    let mut last_seq: Option<u16> = None;

    while !stop.load(Ordering::Acquire) {
        let received = {
            let mut transport = transport.lock().await;
            transport
                .receive(REPORT_CHANNEL, &mut buf, timeouts::STREAM)
                .await
        };

        let n = match received {
            Ok(n) => n,
            Err(e) => {
                warn!("Reading failed, device went offline: {}", e);
                stop.store(true, Ordering::Release);
                break;
            }
        };
        if n == 0 {
            continue;
        }

        let batch = split_frames(&buf[..n], &mut last_seq);
        if batch.is_empty() {
            continue;
        }

        // both sinks or nothing: a half-registered channel drops the batch
        match (&imu_sink, &image_info_sink) {
            (Some(imu), Some(image_info)) => {
                for sample in &batch.imu {
                    imu.on_imu(sample);
                }
                for sample in &batch.image_info {
                    image_info.on_image_info(sample);
                }
            }
            _ => trace!(
                "sinks not registered, discarding {} IMU / {} image-info samples",
                batch.imu.len(),
                batch.image_info.len()
            ),
        }
    }
}

/// Validate, deduplicate and decode every complete frame in a buffer
///
/// `last_seq` persists across buffers so a duplicate delivered at a
/// buffer boundary is still caught.
pub(crate) fn split_frames(data: &[u8], last_seq: &mut Option<u16>) -> SampleBatch {
    let mut batch = SampleBatch::default();

    for frame in data.chunks_exact(FRAME_SIZE) {
        let length = frame[2] as usize;
        if SAMPLE_OFFSET + length >= FRAME_SIZE {
            warn!("frame payload length {} out of range, dropped", length);
            continue;
        }
        let payload = &frame[SAMPLE_OFFSET..SAMPLE_OFFSET + length];
        if !checksum::verify(payload, frame[FRAME_SIZE - 1]) {
            warn!("frame checksum mismatch, dropped");
            continue;
        }

        let seq = u16::from_le_bytes([frame[0], frame[1]]);
        if *last_seq == Some(seq) {
            trace!("duplicate frame {}, skipped", seq);
            continue;
        }
        *last_seq = Some(seq);

        let mut offset = SAMPLE_OFFSET;
        while offset + SAMPLE_SIZE <= SAMPLE_OFFSET + length {
            let record = &frame[offset..offset + SAMPLE_SIZE];
            match record[0] {
                sample_types::ACCEL | sample_types::GYRO => match decode_imu_sample(record) {
                    Ok(sample) => batch.imu.push(sample),
                    Err(e) => warn!("bad IMU sub-record, dropped: {}", e),
                },
                sample_types::IMAGE_INFO => match decode_image_info(record) {
                    Ok(sample) => batch.image_info.push(sample),
                    Err(e) => warn!("bad image-info sub-record, dropped: {}", e),
                },
                other => trace!("unknown sub-record type {}, skipped", other),
            }
            offset += SAMPLE_SIZE;
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use stereolink_core::records::{encode_image_info, encode_imu_sample};
    use stereolink_transport::MockTransport;
    use stereolink_types::ImuFlag;

    use crate::channel::Channel;

    fn imu_sample(timestamp: u32) -> ImuSample {
        ImuSample {
            flag: ImuFlag::Accel,
            temperature: 25,
            timestamp,
            x: 10,
            y: -20,
            z: 30,
        }
    }

    fn image_info_sample(frame_id: u16) -> ImageInfoSample {
        ImageInfoSample {
            frame_id,
            timestamp: 99,
            exposure_time: 33,
        }
    }

    /// Build a streamed frame carrying the given sub-records
    fn stream_frame(seq: u16, imu: &[ImuSample], image_info: &[ImageInfoSample]) -> [u8; FRAME_SIZE] {
        let mut frame = [0u8; FRAME_SIZE];
        frame[..2].copy_from_slice(&seq.to_le_bytes());

        let mut offset = SAMPLE_OFFSET;
        for sample in imu {
            encode_imu_sample(sample, &mut frame[offset..offset + SAMPLE_SIZE]).unwrap();
            offset += SAMPLE_SIZE;
        }
        for sample in image_info {
            encode_image_info(sample, &mut frame[offset..offset + SAMPLE_SIZE]).unwrap();
            offset += SAMPLE_SIZE;
        }

        let length = offset - SAMPLE_OFFSET;
        frame[2] = length as u8;
        frame[FRAME_SIZE - 1] = checksum::calculate(&frame[SAMPLE_OFFSET..offset]);
        frame
    }

    #[test]
    fn test_split_classifies_sub_records() {
        let imu = [imu_sample(1), imu_sample(2)];
        let info = [image_info_sample(7)];
        let frame = stream_frame(0, &imu, &info);

        let mut last_seq = None;
        let batch = split_frames(&frame, &mut last_seq);

        assert_eq!(batch.imu, imu);
        assert_eq!(batch.image_info, info);
        assert_eq!(last_seq, Some(0));
    }

    #[test]
    fn test_split_drops_corrupted_frame() {
        let good = stream_frame(1, &[imu_sample(1)], &[]);
        let mut bad = stream_frame(2, &[imu_sample(2)], &[]);
        bad[5] ^= 0xFF; // corrupt the payload, keep the checksum

        let mut data = Vec::new();
        data.extend_from_slice(&bad);
        data.extend_from_slice(&good);

        let mut last_seq = None;
        let batch = split_frames(&data, &mut last_seq);

        assert_eq!(batch.imu, vec![imu_sample(1)]);
    }

    #[test]
    fn test_split_deduplicates_by_sequence() {
        let frame = stream_frame(5, &[imu_sample(1)], &[]);

        let mut data = Vec::new();
        data.extend_from_slice(&frame);
        data.extend_from_slice(&frame); // duplicate delivery

        let mut last_seq = None;
        let batch = split_frames(&data, &mut last_seq);
        assert_eq!(batch.imu.len(), 1);

        // the duplicate is also caught across buffers
        let batch = split_frames(&frame, &mut last_seq);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_split_sequence_zero_first_frame_is_kept() {
        let frame = stream_frame(0, &[imu_sample(1)], &[]);

        let mut last_seq = None;
        let batch = split_frames(&frame, &mut last_seq);
        assert_eq!(batch.imu.len(), 1);
    }

    #[test]
    fn test_split_ignores_incomplete_trailing_frame() {
        let frame = stream_frame(1, &[imu_sample(1)], &[]);
        let mut data = frame.to_vec();
        data.extend_from_slice(&frame[..10]); // torn read

        let mut last_seq = None;
        let batch = split_frames(&data, &mut last_seq);
        assert_eq!(batch.imu.len(), 1);
    }

    async fn wait_until_stopped(channel: &Channel) {
        for _ in 0..100 {
            if !channel.is_streaming() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("ingest loop did not stop");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_streaming_dispatches_in_order() {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let mut channel = Channel::new(Box::new(transport));
        channel.open().await.unwrap();

        let seen: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let imu_seen = Arc::clone(&seen);
        let info_seen = Arc::clone(&seen);
        channel.set_imu_sink(move |s: &ImuSample| {
            imu_seen.lock().unwrap().push(format!("imu:{}", s.timestamp));
        });
        channel.set_image_info_sink(move |s: &ImageInfoSample| {
            info_seen.lock().unwrap().push(format!("img:{}", s.frame_id));
        });

        let frame = stream_frame(1, &[imu_sample(10), imu_sample(11)], &[image_info_sample(3)]);
        handle.push_frame(&frame);
        handle.push_offline(); // end the loop

        channel.start_streaming().await.unwrap();
        wait_until_stopped(&channel).await;
        channel.stop_streaming().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["imu:10", "imu:11", "img:3"]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_streaming_discards_without_both_sinks() {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let mut channel = Channel::new(Box::new(transport));
        channel.open().await.unwrap();

        let seen: Arc<StdMutex<Vec<u32>>> = Arc::new(StdMutex::new(Vec::new()));
        let imu_seen = Arc::clone(&seen);
        channel.set_imu_sink(move |s: &ImuSample| {
            imu_seen.lock().unwrap().push(s.timestamp);
        });
        // no image-info sink registered

        handle.push_frame(&stream_frame(1, &[imu_sample(42)], &[]));
        handle.push_offline();

        channel.start_streaming().await.unwrap();
        wait_until_stopped(&channel).await;
        channel.stop_streaming().await.unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_streaming_double_start_rejected() {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let mut channel = Channel::new(Box::new(transport));
        channel.open().await.unwrap();
        handle.push_offline();

        channel.start_streaming().await.unwrap();
        assert!(matches!(
            channel.start_streaming().await,
            Err(crate::Error::AlreadyStreaming)
        ));

        channel.stop_streaming().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_streaming_stops_on_offline_transport() {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let mut channel = Channel::new(Box::new(transport));
        channel.open().await.unwrap();

        handle.push_frame(&stream_frame(1, &[imu_sample(1)], &[]));
        handle.push_offline();

        channel.start_streaming().await.unwrap();
        wait_until_stopped(&channel).await;

        // worker stopped itself; file channel is usable again after reaping
        assert!(!channel.is_streaming());
        channel.stop_streaming().await.unwrap();
        assert!(matches!(
            channel.stop_streaming().await,
            Err(crate::Error::NotStreaming)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_channel_rejected_while_streaming() {
        let transport = MockTransport::new();
        let mut channel = Channel::new(Box::new(transport));
        channel.open().await.unwrap();

        // empty script: the worker just keeps polling
        channel.start_streaming().await.unwrap();
        assert!(matches!(
            channel.read_files().await,
            Err(crate::Error::StreamingActive)
        ));

        channel.stop_streaming().await.unwrap();
        assert!(matches!(
            channel.read_files().await,
            Err(crate::Error::HandshakeTimeout { .. })
        ));
    }
}
