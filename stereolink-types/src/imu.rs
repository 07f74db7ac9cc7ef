//! IMU calibration structures

/// IMU intrinsic parameters for one sensor (accelerometer or gyroscope)
///
/// All matrices and vectors are stored row-major as `f64`. The wire layout
/// additionally carries a 100-byte reserved gap between `bias` and the
/// warm-drift coefficients; it has no semantic value but the record codec
/// preserves it for offset compatibility.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ImuIntrinsics {
    /// Scale matrix: diagonal is scale, off-diagonal is cross-axis misalignment
    pub scale: [[f64; 3]; 3],

    /// Assembly error matrix
    pub assembly: [[f64; 3]; 3],

    /// Zero-rate (gyro) / zero-g (accel) drift, per axis
    pub drift: [f64; 3],

    /// Noise density, per axis
    pub noise: [f64; 3],

    /// Random-walk bias, per axis
    pub bias: [f64; 3],

    /// Warm drift polynomial coefficients, x axis
    pub x: [f64; 2],

    /// Warm drift polynomial coefficients, y axis
    pub y: [f64; 2],

    /// Warm drift polynomial coefficients, z axis
    pub z: [f64; 2],
}

/// Rigid transform from one frame to another (e.g. left camera to IMU)
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Extrinsics {
    /// Rotation matrix, row-major
    pub rotation: [[f64; 3]; 3],

    /// Translation vector
    pub translation: [f64; 3],
}

/// Combined IMU parameter set stored on the device
///
/// `present == false` means the device reported zero-length data for this
/// record; every other field is meaningless in that case.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ImuParams {
    /// Accelerometer intrinsics
    pub accel: ImuIntrinsics,

    /// Gyroscope intrinsics
    pub gyro: ImuIntrinsics,

    /// Left camera to IMU transform
    pub left_to_imu: Extrinsics,

    /// Whether the device actually carried this record
    pub present: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imu_params_default_not_present() {
        let params = ImuParams::default();
        assert!(!params.present);
        assert_eq!(params.accel.scale[0][0], 0.0);
    }
}
