//! Streamed telemetry samples
//!
//! Each streamed frame carries up to four 15-byte sub-records, tagged by a
//! leading type byte: `0`/`1` are IMU samples (accelerometer/gyroscope),
//! `2` is a per-frame image-info sample.

use std::fmt;

/// Which sensor produced an [`ImuSample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ImuFlag {
    Accel = 0,
    Gyro = 1,
}

/// One inertial sample as streamed by the device
///
/// Axis values are raw sensor counts; converting them to physical units
/// requires the calibration read over the file channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImuSample {
    /// Accelerometer or gyroscope
    pub flag: ImuFlag,

    /// Die temperature, raw counts
    pub temperature: i16,

    /// Device clock at sampling time, ticks
    pub timestamp: u32,

    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl fmt::Display for ImuSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[t={}, xyz=({}, {}, {})]",
            self.flag, self.timestamp, self.x, self.y, self.z
        )
    }
}

/// Per-image metadata streamed alongside the inertial data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfoSample {
    /// Frame counter as assigned by the device
    pub frame_id: u16,

    /// Device clock at exposure, ticks
    pub timestamp: u32,

    /// Exposure time, device units
    pub exposure_time: u16,
}

impl fmt::Display for ImageInfoSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageInfo[frame={}, t={}, exposure={}]",
            self.frame_id, self.timestamp, self.exposure_time
        )
    }
}
