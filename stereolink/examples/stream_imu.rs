//! Stream telemetry from a scripted mock transport
//!
//! Registers both sinks, ingests a few frames and stops when the mock
//! reports the device gone.

use std::time::Duration;

use stereolink::Channel;
use stereolink_core::checksum;
use stereolink_core::constants::{FRAME_SIZE, SAMPLE_OFFSET, SAMPLE_SIZE};
use stereolink_core::records::{encode_image_info, encode_imu_sample};
use stereolink_transport::MockTransport;
use stereolink_types::{ImageInfoSample, ImuFlag, ImuSample};

fn stream_frame(seq: u16, samples: &[ImuSample], info: &[ImageInfoSample]) -> [u8; FRAME_SIZE] {
    let mut frame = [0u8; FRAME_SIZE];
    frame[..2].copy_from_slice(&seq.to_le_bytes());

    let mut offset = SAMPLE_OFFSET;
    for sample in samples {
        encode_imu_sample(sample, &mut frame[offset..offset + SAMPLE_SIZE]).unwrap();
        offset += SAMPLE_SIZE;
    }
    for sample in info {
        encode_image_info(sample, &mut frame[offset..offset + SAMPLE_SIZE]).unwrap();
        offset += SAMPLE_SIZE;
    }

    frame[2] = (offset - SAMPLE_OFFSET) as u8;
    frame[FRAME_SIZE - 1] = checksum::calculate(&frame[SAMPLE_OFFSET..offset]);
    frame
}

#[tokio::main]
async fn main() -> stereolink::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let transport = MockTransport::new();
    let handle = transport.handle();

    // Fake a short telemetry burst, then the device goes away
    for seq in 0..4u16 {
        let accel = ImuSample {
            flag: ImuFlag::Accel,
            temperature: 25,
            timestamp: 1000 + seq as u32 * 5,
            x: 12,
            y: -3,
            z: 1020,
        };
        let gyro = ImuSample {
            flag: ImuFlag::Gyro,
            timestamp: accel.timestamp + 2,
            ..accel
        };
        let info = ImageInfoSample {
            frame_id: seq,
            timestamp: accel.timestamp + 3,
            exposure_time: 33,
        };
        handle.push_frame(&stream_frame(seq, &[accel, gyro], &[info]));
    }
    handle.push_offline();

    let mut channel = Channel::new(Box::new(transport));
    channel.open().await?;

    channel.set_imu_sink(|sample: &ImuSample| println!("  {}", sample));
    channel.set_image_info_sink(|sample: &ImageInfoSample| println!("  {}", sample));

    channel.start_streaming().await?;
    println!("✓ Streaming...");

    while channel.is_streaming() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    channel.stop_streaming().await?;
    channel.close().await?;
    println!("✓ Device gone, loop stopped");

    Ok(())
}
