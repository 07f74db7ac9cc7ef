//! Frame checksum algorithm
//!
//! Every file-transfer chunk, every streamed frame and the reassembled
//! file image carry a one-byte checksum: the exclusive-or of every payload
//! byte. It is a parity check against transmission corruption, not a
//! collision-resistant digest.

/// Calculate the XOR checksum over a byte range
///
/// The checksum of an empty range is 0.
///
/// # Examples
///
/// ```
/// use stereolink_core::checksum;
///
/// assert_eq!(checksum::calculate(&[]), 0);
/// assert_eq!(checksum::calculate(&[0x01, 0x02, 0x03]), 0x00);
/// ```
pub fn calculate(data: &[u8]) -> u8 {
    data.iter().fold(0, |crc, byte| crc ^ byte)
}

/// Verify a payload against its checksum byte
pub fn verify(data: &[u8], expected: u8) -> bool {
    calculate(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(calculate(&[]), 0);
    }

    #[test]
    fn test_checksum_single_byte() {
        assert_eq!(calculate(&[0xA5]), 0xA5);
    }

    #[test]
    fn test_checksum_known_values() {
        assert_eq!(calculate(&[0x01, 0x02]), 0x03);
        assert_eq!(calculate(&[0x01, 0x02, 0x03]), 0x00);
        assert_eq!(calculate(&[0xFF, 0xFF]), 0x00);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let payload = [0x10, 0x20, 0x30, 0x40];
        let checksum = calculate(&payload);

        let mut corrupted = payload;
        corrupted[2] ^= 0x01;

        assert!(verify(&payload, checksum));
        assert!(!verify(&corrupted, checksum));
    }

    #[test]
    fn test_checksum_self_cancelling() {
        // appending the checksum byte itself zeroes the running parity
        let payload = [0x12, 0x34, 0x56];
        let checksum = calculate(&payload);

        let mut framed = payload.to_vec();
        framed.push(checksum);
        assert_eq!(calculate(&framed), 0);
    }
}
