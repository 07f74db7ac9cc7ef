//! Read the device's stored files over a scripted mock transport
//!
//! Swap the mock for a real HID-backed transport to talk to hardware.

use stereolink::Channel;
use stereolink_core::checksum;
use stereolink_core::constants::{opcodes, CHUNK_PAYLOAD_MAX, FRAME_SIZE};
use stereolink_core::files::build_file;
use stereolink_transport::{MockHandle, MockTransport};
use stereolink_types::{DeviceInfo, ImuParams, Version};

/// Script a device answering a file-read request with the given image
fn script_device(handle: &MockHandle, image: &[u8]) {
    let mut ack = [0u8; FRAME_SIZE];
    ack[0] = opcodes::FILE_READ_ACK;
    handle.push_frame(&ack);

    for (index, chunk) in image.chunks(CHUNK_PAYLOAD_MAX).enumerate() {
        let mut frame = [0u8; FRAME_SIZE];
        frame[..2].copy_from_slice(&(index as u16).to_le_bytes());
        frame[2] = chunk.len() as u8;
        frame[3..3 + chunk.len()].copy_from_slice(chunk);
        frame[3 + chunk.len()] = checksum::calculate(chunk);
        handle.push_frame(&frame);
    }
}

#[tokio::main]
async fn main() -> stereolink::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Fake a device carrying an identity record and IMU calibration
    let info = DeviceInfo {
        name: "D1000".into(),
        serial_number: "SN123456".into(),
        firmware_version: Version::new(1, 2),
        spec_version: Version::new(1, 0),
        nominal_baseline: 120,
        ..Default::default()
    };
    let mut params = ImuParams {
        present: true,
        ..Default::default()
    };
    params.accel.scale[0][0] = 1.0002;
    params.left_to_imu.translation[0] = -0.08;

    let transport = MockTransport::new();
    script_device(&transport.handle(), &build_file(Some(&info), Some(&params))?);

    let mut channel = Channel::new(Box::new(transport));
    channel.open().await?;

    let files = channel.read_files().await?;
    if let Some(info) = &files.device_info {
        println!("✓ {}", info);
        println!("  baseline: {} mm", info.nominal_baseline);
    }
    if let Some(params) = &files.imu_params {
        println!("✓ IMU calibration present: {}", params.present);
        println!("  accel scale[0][0]: {}", params.accel.scale[0][0]);
        println!("  left-to-IMU translation: {:?}", params.left_to_imu.translation);
    }

    channel.close().await?;
    Ok(())
}
