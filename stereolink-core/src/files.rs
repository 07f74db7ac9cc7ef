//! File-image assembly and parsing
//!
//! The file channel moves one flat byte buffer (the "file image") in both
//! directions:
//!
//! ```text
//! ┌─────────┬─────────────┬───────────────────────────┬──────────┐
//! │  Flags  │    Size     │          Records          │ Checksum │
//! │ 1 byte  │  LE u16     │  size bytes, TLV-ordered  │  1 byte  │
//! └─────────┴─────────────┴───────────────────────────┴──────────┘
//! ```
//!
//! Records appear in document order (DeviceInfo, Reserve, ImuParams), each
//! as a tag byte, a little-endian u16 length, then the payload. The
//! trailing checksum is the XOR parity of the whole record region.
//!
//! Unknown record tags are logged and skipped so newer firmwares stay
//! readable. An unrecognized spec version on an understood record is a
//! warning, not a failure.

use tracing::{debug, trace, warn};

use stereolink_types::{DeviceInfo, ImuParams, Version};

use crate::checksum;
use crate::constants::{FileFlags, FileId, SUPPORTED_SPEC_VERSIONS};
use crate::error::{Error, Result};
use crate::records::{
    decode_device_info, decode_imu_params, encode_device_info, encode_imu_params,
    DEVICE_INFO_SIZE, IMU_PARAMS_SIZE, RECORD_HEADER_SIZE,
};

/// Flags byte plus little-endian u16 record-region size
pub const FILE_HEADER_SIZE: usize = 3;

/// High bit of the flags byte, set whenever the image carries records
const FILE_FLAGS_VALID: u8 = 0x80;

/// Records recovered from one reassembled file image
///
/// `imu_params` is `None` when the record was absent from the image, and
/// `Some` with `present == false` when the device sent it with zero
/// length.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviceFiles {
    pub device_info: Option<DeviceInfo>,
    pub imu_params: Option<ImuParams>,
}

/// Warn when a record layout version is not in the supported table
///
/// Best-effort degrade: parsing continues regardless.
pub fn check_spec_version(version: &Version) {
    if SUPPORTED_SPEC_VERSIONS.contains(version) {
        return;
    }

    let supported: Vec<String> = SUPPORTED_SPEC_VERSIONS
        .iter()
        .map(|v| v.to_string())
        .collect();
    warn!(
        "Spec version {} not supported, must be in [{}]",
        version,
        supported.join(",")
    );
}

/// Parse a reassembled file image into its records
///
/// `spec_version` is the caller's fallback layout version, used for the
/// ImuParams compatibility warning when the image carries no DeviceInfo
/// record of its own.
///
/// # Errors
///
/// Fails on a framing problem (short image, bad checksum, record running
/// past the image) or when an understood record decodes to a different
/// length than its header declares - the "incompatible firmware" case.
pub fn parse_file(data: &[u8], spec_version: Option<&Version>) -> Result<DeviceFiles> {
    if data.len() < FILE_HEADER_SIZE + 1 {
        return Err(Error::FileTooShort {
            expected: FILE_HEADER_SIZE + 1,
            actual: data.len(),
        });
    }

    let size = u16::from_le_bytes([data[1], data[2]]) as usize;
    if data.len() < FILE_HEADER_SIZE + size + 1 {
        return Err(Error::FileTooShort {
            expected: FILE_HEADER_SIZE + size + 1,
            actual: data.len(),
        });
    }

    let body = &data[FILE_HEADER_SIZE..FILE_HEADER_SIZE + size];
    let expected = data[FILE_HEADER_SIZE + size];
    let actual = checksum::calculate(body);
    if actual != expected {
        return Err(Error::ChecksumMismatch { expected, actual });
    }

    trace!(
        "parsing file image, {} record bytes: {}...",
        size,
        hex::encode(&body[..body.len().min(32)])
    );

    let mut files = DeviceFiles::default();
    let mut spec_version = spec_version.copied();

    let mut i = 0;
    while i < body.len() {
        if body.len() - i < RECORD_HEADER_SIZE {
            return Err(Error::TruncatedRecord { id: body[i] });
        }
        let id = body[i];
        let record_size = u16::from_le_bytes([body[i + 1], body[i + 2]]) as usize;
        i += RECORD_HEADER_SIZE;
        if i + record_size > body.len() {
            return Err(Error::TruncatedRecord { id });
        }
        let payload = &body[i..i + record_size];

        match FileId::try_from(id) {
            Ok(FileId::DeviceInfo) => {
                let (info, consumed) = decode_device_info(payload)?;
                if consumed != record_size {
                    return Err(Error::RecordLengthMismatch {
                        id: FileId::DeviceInfo,
                        expected: record_size,
                        actual: consumed,
                    });
                }
                check_spec_version(&info.spec_version);
                spec_version = Some(info.spec_version);
                files.device_info = Some(info);
            }
            Ok(FileId::Reserve) => {}
            Ok(FileId::ImuParams) => {
                if record_size == 0 {
                    // device has no calibration stored
                    files.imu_params = Some(ImuParams::default());
                } else {
                    if let Some(version) = &spec_version {
                        check_spec_version(version);
                    }
                    let (params, consumed) = decode_imu_params(payload)?;
                    if consumed != record_size {
                        return Err(Error::RecordLengthMismatch {
                            id: FileId::ImuParams,
                            expected: record_size,
                            actual: consumed,
                        });
                    }
                    files.imu_params = Some(params);
                }
            }
            Err(_) => {
                debug!("Unsupported file id: {}, skipping {} bytes", id, record_size);
            }
        }

        i += record_size;
    }

    Ok(files)
}

/// Build a file image carrying the selected records
///
/// Emits the flags/size header, the encoded records in document order and
/// the trailing checksum. Callers decide which records to include; an
/// image with none is legal on the wire (the device treats it as a no-op
/// write).
pub fn build_file(info: Option<&DeviceInfo>, imu_params: Option<&ImuParams>) -> Result<Vec<u8>> {
    let mut capacity = FILE_HEADER_SIZE + 1;
    if info.is_some() {
        capacity += RECORD_HEADER_SIZE + DEVICE_INFO_SIZE;
    }
    if imu_params.is_some() {
        capacity += RECORD_HEADER_SIZE + IMU_PARAMS_SIZE;
    }

    let mut data = vec![0u8; capacity];
    let mut flags = 0u8;
    let mut pos = FILE_HEADER_SIZE;

    if let Some(info) = info {
        flags |= FILE_FLAGS_VALID | FileFlags::DEVICE_INFO.bits();
        pos += encode_device_info(info, &mut data[pos..])?;
    }
    if let Some(params) = imu_params {
        flags |= FILE_FLAGS_VALID | FileFlags::IMU_PARAMS.bits();
        pos += encode_imu_params(params, &mut data[pos..])?;
    }

    let size = pos - FILE_HEADER_SIZE;
    data[0] = flags;
    data[1..3].copy_from_slice(&(size as u16).to_le_bytes());
    data[pos] = checksum::calculate(&data[FILE_HEADER_SIZE..pos]);

    debug!("built file image: {} record bytes, flags 0x{:02X}", size, flags);

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use stereolink_types::{HardwareFlags, HardwareVersion, SensorType};

    fn sample_device_info() -> DeviceInfo {
        DeviceInfo {
            name: "D1000".into(),
            serial_number: "SN123456".into(),
            firmware_version: Version::new(1, 2),
            hardware_version: HardwareVersion::new(Version::new(2, 1), HardwareFlags::HAS_IMU),
            spec_version: Version::new(1, 0),
            lens_type: SensorType::new(1, 2),
            imu_type: SensorType::new(3, 4),
            nominal_baseline: 120,
        }
    }

    fn sample_imu_params() -> ImuParams {
        let mut params = ImuParams {
            present: true,
            ..Default::default()
        };
        params.accel.scale[0][0] = 1.0009765625;
        params.gyro.drift[1] = -2.5e-7;
        params.left_to_imu.translation[0] = -0.08;
        params
    }

    #[test]
    fn test_build_parse_round_trip() {
        let info = sample_device_info();
        let params = sample_imu_params();

        let image = build_file(Some(&info), Some(&params)).unwrap();
        let files = parse_file(&image, None).unwrap();

        assert_eq!(files.device_info, Some(info));
        assert_eq!(files.imu_params, Some(params));
    }

    #[test]
    fn test_parse_rejects_corrupted_checksum() {
        let info = sample_device_info();
        let mut image = build_file(Some(&info), None).unwrap();

        // flip one payload byte, keep the trailer
        image[10] ^= 0xFF;

        assert!(matches!(
            parse_file(&image, None),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_short_image() {
        assert!(matches!(
            parse_file(&[0x80, 0x00], None),
            Err(Error::FileTooShort { .. })
        ));
    }

    #[test]
    fn test_unknown_record_is_skipped() {
        let info = sample_device_info();
        let encoded = build_file(Some(&info), None).unwrap();
        let record_region = &encoded[FILE_HEADER_SIZE..encoded.len() - 1];

        // splice an unknown record ahead of the device info one
        let unknown: &[u8] = &[0x09, 0x02, 0x00, 0xAB, 0xCD];
        let mut body = unknown.to_vec();
        body.extend_from_slice(record_region);

        let mut image = vec![0x80];
        image.extend_from_slice(&(body.len() as u16).to_le_bytes());
        image.extend_from_slice(&body);
        image.push(checksum::calculate(&body));

        let files = parse_file(&image, None).unwrap();
        assert_eq!(files.device_info, Some(info));
    }

    #[test]
    fn test_zero_length_imu_params_not_present() {
        let body: &[u8] = &[u8::from(FileId::ImuParams), 0x00, 0x00];
        let mut image = vec![0x84];
        image.extend_from_slice(&(body.len() as u16).to_le_bytes());
        image.extend_from_slice(body);
        image.push(checksum::calculate(body));

        let files = parse_file(&image, None).unwrap();
        let params = files.imu_params.expect("record was in the image");
        assert!(!params.present);
    }

    #[test]
    fn test_record_length_mismatch_is_rejected() {
        let info = sample_device_info();
        let mut record = vec![0u8; RECORD_HEADER_SIZE + DEVICE_INFO_SIZE + 5];
        encode_device_info(&info, &mut record).unwrap();
        // header claims five more bytes than the layout holds
        let padded = (DEVICE_INFO_SIZE + 5) as u16;
        record[1..3].copy_from_slice(&padded.to_le_bytes());

        let mut image = vec![0x81];
        image.extend_from_slice(&(record.len() as u16).to_le_bytes());
        image.extend_from_slice(&record);
        image.push(checksum::calculate(&record));

        assert!(matches!(
            parse_file(&image, None),
            Err(Error::RecordLengthMismatch { id: FileId::DeviceInfo, .. })
        ));
    }

    #[test]
    fn test_unrecognized_spec_version_parses_anyway() {
        let mut info = sample_device_info();
        info.spec_version = Version::new(9, 9);

        let image = build_file(Some(&info), None).unwrap();
        let files = parse_file(&image, None).unwrap();

        // logged as a warning only
        assert_eq!(files.device_info.unwrap().spec_version, Version::new(9, 9));
    }

    #[test]
    fn test_record_overrunning_image_is_rejected() {
        let body: &[u8] = &[u8::from(FileId::DeviceInfo), 0xFF, 0x00];
        let mut image = vec![0x81];
        image.extend_from_slice(&(body.len() as u16).to_le_bytes());
        image.extend_from_slice(body);
        image.push(checksum::calculate(body));

        assert!(matches!(
            parse_file(&image, None),
            Err(Error::TruncatedRecord { .. })
        ));
    }
}
