//! Firmware / spec version tag

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Two-field version tag (`major.minor`)
///
/// Used for the firmware version, the hardware version and the spec
/// version inside [`DeviceInfo`](crate::DeviceInfo). The spec version
/// decides which record layouts the device firmware speaks.
///
/// Equality is exact field match.
///
/// # Examples
///
/// ```
/// use stereolink_types::Version;
///
/// let version: Version = "1.0".parse().unwrap();
/// assert_eq!(version, Version::new(1, 0));
/// assert_eq!(version.to_string(), "1.0");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// Create a version from its two fields
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| Error::Parse(format!("invalid version: {:?}", s)))?;

        let major = major
            .parse::<u8>()
            .map_err(|e| Error::Parse(format!("invalid major in {:?}: {}", s, e)))?;
        let minor = minor
            .parse::<u8>()
            .map_err(|e| Error::Parse(format!("invalid minor in {:?}: {}", s, e)))?;

        Ok(Self { major, minor })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_parse() {
        let version: Version = "1.2".parse().unwrap();
        assert_eq!(version, Version::new(1, 2));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(9, 9).to_string(), "9.9");
    }

    #[test]
    fn test_version_parse_rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("1".parse::<Version>().is_err());
        assert!("a.b".parse::<Version>().is_err());
        assert!("1.999".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_equality_is_exact() {
        assert_ne!(Version::new(1, 0), Version::new(0, 1));
        assert_ne!(Version::new(1, 0), Version::new(1, 1));
    }
}
