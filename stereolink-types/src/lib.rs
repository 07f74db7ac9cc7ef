//! Type definitions for stereolink

pub mod device_info;
pub mod error;
pub mod imu;
pub mod sample;
pub mod version;

pub use device_info::{DeviceInfo, HardwareFlags, HardwareVersion, SensorType};
pub use error::{Error, Result};
pub use imu::{Extrinsics, ImuIntrinsics, ImuParams};
pub use sample::{ImageInfoSample, ImuFlag, ImuSample};
pub use version::Version;
