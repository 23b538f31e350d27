use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Reasons a version string could not be read as `major.minor[...]`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
	#[error("Version '{0}' has fewer than two components")]
	TooFewComponents(String),

	#[error("Version '{version}' has a non-numeric component '{component}'")]
	NonNumeric { version: String, component: String },
}

/// Major and minor parts of a broker software version
///
/// Patch and build suffixes (`3.6.0`, `3.5.1.tiered`) are ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SoftwareVersion {
	pub major: u32,
	pub minor: u32,
}

impl SoftwareVersion {
	pub fn new(major: u32, minor: u32) -> Self {
		Self { major, minor }
	}

	/// Distance from `self` up to `recommended`, in minor-version steps
	///
	/// A major step counts as ten minor steps. Negative when `self` is newer.
	pub fn gap_to(&self, recommended: &SoftwareVersion) -> i64 {
		(i64::from(recommended.major) - i64::from(self.major)) * 10
			+ (i64::from(recommended.minor) - i64::from(self.minor))
	}
}

impl FromStr for SoftwareVersion {
	type Err = VersionParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.trim().split('.');
		let (major, minor) = match (parts.next(), parts.next()) {
			(Some(major), Some(minor)) => (major, minor),
			_ => return Err(VersionParseError::TooFewComponents(s.to_string())),
		};

		let parse = |component: &str| {
			component
				.parse::<u32>()
				.map_err(|_| VersionParseError::NonNumeric {
					version: s.to_string(),
					component: component.to_string(),
				})
		};

		Ok(Self {
			major: parse(major)?,
			minor: parse(minor)?,
		})
	}
}

impl std::fmt::Display for SoftwareVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.major, self.minor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_ignores_patch_and_suffix() {
		assert_eq!("3.6.0".parse(), Ok(SoftwareVersion::new(3, 6)));
		assert_eq!("2.8.2.tiered".parse(), Ok(SoftwareVersion::new(2, 8)));
		assert_eq!("3.8".parse(), Ok(SoftwareVersion::new(3, 8)));
	}

	#[test]
	fn test_parse_failures() {
		assert!(matches!(
			"unknown".parse::<SoftwareVersion>(),
			Err(VersionParseError::TooFewComponents(_))
		));
		assert!(matches!(
			"3.x".parse::<SoftwareVersion>(),
			Err(VersionParseError::NonNumeric { .. })
		));
	}

	#[test]
	fn test_gap() {
		let recommended = SoftwareVersion::new(3, 8);
		assert_eq!(SoftwareVersion::new(2, 8).gap_to(&recommended), 10);
		assert_eq!(SoftwareVersion::new(3, 6).gap_to(&recommended), 2);
		assert_eq!(SoftwareVersion::new(3, 8).gap_to(&recommended), 0);
		assert_eq!(SoftwareVersion::new(3, 9).gap_to(&recommended), -1);
	}
}
