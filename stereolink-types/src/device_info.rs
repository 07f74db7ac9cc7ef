//! Device identity structures

use std::fmt;

use bitflags::bitflags;

use crate::version::Version;

bitflags! {
    /// Hardware capability flag byte carried next to the hardware version
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct HardwareFlags: u8 {
        const HAS_IMU = 1 << 0;
        const HAS_IR = 1 << 1;
        const HAS_COLOR = 1 << 2;
    }
}

/// Hardware version: a version tag plus an 8-bit flag field
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HardwareVersion {
    pub version: Version,
    pub flags: HardwareFlags,
}

impl HardwareVersion {
    pub const fn new(version: Version, flags: HardwareFlags) -> Self {
        Self { version, flags }
    }
}

/// Vendor/product pair identifying a fitted sensor (lens or IMU)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SensorType {
    pub vendor: u16,
    pub product: u16,
}

impl SensorType {
    pub const fn new(vendor: u16, product: u16) -> Self {
        Self { vendor, product }
    }
}

/// Device identity record
///
/// Read from (and written to) the device over the file channel. Immutable
/// once read; the device only changes it through an explicit write request.
///
/// String fields are fixed-width on the wire: `name` occupies 20 bytes,
/// `serial_number` 24 bytes, both right-padded with spaces.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device name (wire width: 20 bytes)
    pub name: String,

    /// Serial number (wire width: 24 bytes)
    pub serial_number: String,

    /// Firmware version
    pub firmware_version: Version,

    /// Hardware version plus capability flags
    pub hardware_version: HardwareVersion,

    /// Spec version: which record layouts the firmware speaks
    pub spec_version: Version,

    /// Lens vendor/product
    pub lens_type: SensorType,

    /// IMU vendor/product
    pub imu_type: SensorType,

    /// Nominal stereo baseline, millimetres
    pub nominal_baseline: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[{}, SN: {}, FW: {}, spec: {}]",
            self.name, self.serial_number, self.firmware_version, self.spec_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hardware_flags_from_bits() {
        let flags = HardwareFlags::from_bits_truncate(0b0000_0011);
        assert!(flags.contains(HardwareFlags::HAS_IMU));
        assert!(flags.contains(HardwareFlags::HAS_IR));
        assert!(!flags.contains(HardwareFlags::HAS_COLOR));
    }

    #[test]
    fn test_device_info_display() {
        let info = DeviceInfo {
            name: "D1000".into(),
            serial_number: "SN123456".into(),
            firmware_version: Version::new(1, 2),
            ..Default::default()
        };
        assert_eq!(
            info.to_string(),
            "Device[D1000, SN: SN123456, FW: 1.2, spec: 0.0]"
        );
    }
}
