//! Calibration record codec
//!
//! Fixed-layout encode/decode of the structured records stored on the
//! device: identity, IMU intrinsics, extrinsics and the combined IMU
//! parameter set. Field order and widths are dictated by the firmware;
//! nothing here is self-describing beyond the 3-byte record header
//! (tag byte, little-endian u16 length) that every encoder writes ahead
//! of its payload.
//!
//! Decoders return the number of bytes they consumed so the file parser
//! can compare it against the record header. A disagreement means the
//! firmware speaks a layout this library does not understand.
//!
//! The 15-byte streamed sub-records (IMU and image-info samples) are
//! decoded here as well, since they share the cursor conventions.

use stereolink_types::{
    DeviceInfo, Extrinsics, HardwareFlags, HardwareVersion, ImageInfoSample, ImuFlag,
    ImuIntrinsics, ImuParams, ImuSample, SensorType, Version,
};

use crate::constants::{sample_types, FileId, SAMPLE_SIZE};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Record header: tag byte plus little-endian u16 payload length
pub const RECORD_HEADER_SIZE: usize = 3;

/// DeviceInfo payload: 4-byte vid/pid lead gap plus 61 field bytes
pub const DEVICE_INFO_SIZE: usize = 65;

/// One IMU intrinsics block, including the 100-byte reserved gap
pub const IMU_INTRINSICS_SIZE: usize = 364;

/// Rotation matrix plus translation vector
pub const EXTRINSICS_SIZE: usize = 96;

/// Accel intrinsics + gyro intrinsics + left-to-IMU extrinsics
pub const IMU_PARAMS_SIZE: usize = 2 * IMU_INTRINSICS_SIZE + EXTRINSICS_SIZE;

/// Width of the reserved gap inside an intrinsics block
const INTRINSICS_GAP: usize = 100;

fn put_version(w: &mut ByteWriter<'_>, version: &Version) -> Result<()> {
    // wire order is minor first
    w.put_u8(version.minor)?;
    w.put_u8(version.major)
}

fn read_version(r: &mut ByteReader<'_>) -> Result<Version> {
    let minor = r.read_u8()?;
    let major = r.read_u8()?;
    Ok(Version { major, minor })
}

/// Encode a [`DeviceInfo`] record, header included
///
/// Returns the total number of bytes written.
pub fn encode_device_info(info: &DeviceInfo, out: &mut [u8]) -> Result<usize> {
    let mut w = ByteWriter::new(out);

    w.put_u8(FileId::DeviceInfo.into())?;
    w.put_u16(DEVICE_INFO_SIZE as u16)?;

    // vid/pid slot, filled in by the device
    w.pad(4)?;
    w.put_string(&info.name, 20)?;
    w.put_string(&info.serial_number, 24)?;
    put_version(&mut w, &info.firmware_version)?;
    put_version(&mut w, &info.hardware_version.version)?;
    w.put_u8(info.hardware_version.flags.bits())?;
    put_version(&mut w, &info.spec_version)?;
    w.put_u16(info.lens_type.vendor)?;
    w.put_u16(info.lens_type.product)?;
    w.put_u16(info.imu_type.vendor)?;
    w.put_u16(info.imu_type.product)?;
    w.put_u16(info.nominal_baseline)?;

    Ok(w.position())
}

/// Decode a [`DeviceInfo`] record payload
///
/// Returns the decoded record and the number of bytes consumed.
pub fn decode_device_info(payload: &[u8]) -> Result<(DeviceInfo, usize)> {
    let mut r = ByteReader::new(payload);

    // vid/pid, recorded by the device itself
    r.skip(4)?;
    let name = r.read_string(20)?;
    let serial_number = r.read_string(24)?;
    let firmware_version = read_version(&mut r)?;
    let hardware_version = HardwareVersion {
        version: read_version(&mut r)?,
        flags: HardwareFlags::from_bits_truncate(r.read_u8()?),
    };
    let spec_version = read_version(&mut r)?;
    let lens_type = SensorType::new(r.read_u16()?, r.read_u16()?);
    let imu_type = SensorType::new(r.read_u16()?, r.read_u16()?);
    let nominal_baseline = r.read_u16()?;

    let info = DeviceInfo {
        name,
        serial_number,
        firmware_version,
        hardware_version,
        spec_version,
        lens_type,
        imu_type,
        nominal_baseline,
    };

    Ok((info, r.position()))
}

fn encode_intrinsics(intrinsics: &ImuIntrinsics, w: &mut ByteWriter<'_>) -> Result<()> {
    for row in &intrinsics.scale {
        for &value in row {
            w.put_f64(value)?;
        }
    }
    for row in &intrinsics.assembly {
        for &value in row {
            w.put_f64(value)?;
        }
    }
    for &value in &intrinsics.drift {
        w.put_f64(value)?;
    }
    for &value in &intrinsics.noise {
        w.put_f64(value)?;
    }
    for &value in &intrinsics.bias {
        w.put_f64(value)?;
    }
    w.pad(INTRINSICS_GAP)?;
    for &value in &intrinsics.x {
        w.put_f64(value)?;
    }
    for &value in &intrinsics.y {
        w.put_f64(value)?;
    }
    for &value in &intrinsics.z {
        w.put_f64(value)?;
    }
    Ok(())
}

fn decode_intrinsics(r: &mut ByteReader<'_>) -> Result<ImuIntrinsics> {
    let mut intrinsics = ImuIntrinsics::default();

    for j in 0..3 {
        for k in 0..3 {
            intrinsics.scale[j][k] = r.read_f64()?;
        }
    }
    for j in 0..3 {
        for k in 0..3 {
            intrinsics.assembly[j][k] = r.read_f64()?;
        }
    }
    for value in &mut intrinsics.drift {
        *value = r.read_f64()?;
    }
    for value in &mut intrinsics.noise {
        *value = r.read_f64()?;
    }
    for value in &mut intrinsics.bias {
        *value = r.read_f64()?;
    }
    r.skip(INTRINSICS_GAP)?;
    for value in &mut intrinsics.x {
        *value = r.read_f64()?;
    }
    for value in &mut intrinsics.y {
        *value = r.read_f64()?;
    }
    for value in &mut intrinsics.z {
        *value = r.read_f64()?;
    }

    Ok(intrinsics)
}

fn encode_extrinsics(extrinsics: &Extrinsics, w: &mut ByteWriter<'_>) -> Result<()> {
    for row in &extrinsics.rotation {
        for &value in row {
            w.put_f64(value)?;
        }
    }
    for &value in &extrinsics.translation {
        w.put_f64(value)?;
    }
    Ok(())
}

fn decode_extrinsics(r: &mut ByteReader<'_>) -> Result<Extrinsics> {
    let mut extrinsics = Extrinsics::default();

    for j in 0..3 {
        for k in 0..3 {
            extrinsics.rotation[j][k] = r.read_f64()?;
        }
    }
    for value in &mut extrinsics.translation {
        *value = r.read_f64()?;
    }

    Ok(extrinsics)
}

/// Encode an [`ImuParams`] record, header included
///
/// Returns the total number of bytes written.
pub fn encode_imu_params(params: &ImuParams, out: &mut [u8]) -> Result<usize> {
    let mut w = ByteWriter::new(out);

    w.put_u8(FileId::ImuParams.into())?;
    w.put_u16(IMU_PARAMS_SIZE as u16)?;

    encode_intrinsics(&params.accel, &mut w)?;
    encode_intrinsics(&params.gyro, &mut w)?;
    encode_extrinsics(&params.left_to_imu, &mut w)?;

    Ok(w.position())
}

/// Decode an [`ImuParams`] record payload
///
/// Returns the decoded record (with `present` set) and the number of
/// bytes consumed.
pub fn decode_imu_params(payload: &[u8]) -> Result<(ImuParams, usize)> {
    let mut r = ByteReader::new(payload);

    let accel = decode_intrinsics(&mut r)?;
    let gyro = decode_intrinsics(&mut r)?;
    let left_to_imu = decode_extrinsics(&mut r)?;

    let params = ImuParams {
        accel,
        gyro,
        left_to_imu,
        present: true,
    };

    Ok((params, r.position()))
}

/// Decode one streamed 15-byte IMU sub-record
pub fn decode_imu_sample(data: &[u8]) -> Result<ImuSample> {
    if data.len() < SAMPLE_SIZE {
        return Err(Error::SampleTooShort {
            expected: SAMPLE_SIZE,
            actual: data.len(),
        });
    }

    let mut r = ByteReader::new(&data[..SAMPLE_SIZE]);
    let flag = match r.read_u8()? {
        sample_types::ACCEL => ImuFlag::Accel,
        sample_types::GYRO => ImuFlag::Gyro,
        other => return Err(Error::UnknownSampleType(other)),
    };

    Ok(ImuSample {
        flag,
        temperature: r.read_i16()?,
        timestamp: r.read_u32()?,
        x: r.read_i16()?,
        y: r.read_i16()?,
        z: r.read_i16()?,
    })
}

/// Encode one streamed IMU sub-record (device-side simulation, tests)
pub fn encode_imu_sample(sample: &ImuSample, out: &mut [u8]) -> Result<usize> {
    let mut w = ByteWriter::new(out);

    w.put_u8(sample.flag as u8)?;
    w.put_i16(sample.temperature)?;
    w.put_u32(sample.timestamp)?;
    w.put_i16(sample.x)?;
    w.put_i16(sample.y)?;
    w.put_i16(sample.z)?;
    w.pad(2)?;

    Ok(w.position())
}

/// Decode one streamed 15-byte image-info sub-record
pub fn decode_image_info(data: &[u8]) -> Result<ImageInfoSample> {
    if data.len() < SAMPLE_SIZE {
        return Err(Error::SampleTooShort {
            expected: SAMPLE_SIZE,
            actual: data.len(),
        });
    }

    let mut r = ByteReader::new(&data[..SAMPLE_SIZE]);
    match r.read_u8()? {
        sample_types::IMAGE_INFO => {}
        other => return Err(Error::UnknownSampleType(other)),
    }

    Ok(ImageInfoSample {
        frame_id: r.read_u16()?,
        timestamp: r.read_u32()?,
        exposure_time: r.read_u16()?,
    })
}

/// Encode one streamed image-info sub-record (device-side simulation, tests)
pub fn encode_image_info(sample: &ImageInfoSample, out: &mut [u8]) -> Result<usize> {
    let mut w = ByteWriter::new(out);

    w.put_u8(sample_types::IMAGE_INFO)?;
    w.put_u16(sample.frame_id)?;
    w.put_u32(sample.timestamp)?;
    w.put_u16(sample.exposure_time)?;
    w.pad(6)?;

    Ok(w.position())
}
