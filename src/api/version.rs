//! Web API version tracking
//!
//! Every client owns a [`VersionManager`] holding the major/minor version used to
//! build the `/api/data/vX.Y` prefix for relative URIs. The version starts at 9.0
//! and is normally raised once by [`RequestClient::discover_version`].
//!
//! [`RequestClient::discover_version`]: super::client::RequestClient::discover_version

use super::constants::{API_BASE_PATH, DEFAULT_MAJOR_VERSION, DEFAULT_MINOR_VERSION, MIN_MAJOR_VERSION};
use super::error::SdkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;

/// A negotiated Web API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self {
            major: DEFAULT_MAJOR_VERSION,
            minor: DEFAULT_MINOR_VERSION,
        }
    }
}

impl ApiVersion {
    pub fn new(major: u32, minor: u32) -> Result<Self, SdkError> {
        if major < MIN_MAJOR_VERSION {
            return Err(SdkError::invalid_argument(format!(
                "major version must be at least {}, got {}",
                MIN_MAJOR_VERSION, major
            )));
        }
        Ok(Self { major, minor })
    }

    /// Parse a dotted server version such as `9.2.24044.00205`
    pub fn parse_dotted(full_version: &str) -> Result<Self, SdkError> {
        let mut parts = full_version.split('.');
        let (Some(major), Some(minor)) = (parts.next(), parts.next()) else {
            return Err(SdkError::VersionParseFailure(format!(
                "Error processing version: '{}' is not a MAJOR.MINOR version",
                full_version
            )));
        };

        let component = |part: &str, name: &str| {
            parse_component(part).map_err(|e| {
                SdkError::VersionParseFailure(format!(
                    "Error processing version: {} version {} in '{}'",
                    name, e, full_version
                ))
            })
        };
        let major = component(major, "major")?;
        let minor = component(minor, "minor")?;

        Self::new(major, minor)
            .map_err(|e| SdkError::VersionParseFailure(format!("Error processing version: {}", e)))
    }

    /// Path prefix for this version, e.g. `/api/data/v9.2`
    pub fn path_prefix(&self) -> String {
        format!("{}/v{}.{}", API_BASE_PATH, self.major, self.minor)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Why a version component could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    #[error("must be a number")]
    NotNumeric,
    #[error("is out of range")]
    OutOfRange,
}

/// Base-10 prefix parse: leading whitespace, optional `+`, then digits.
/// `"2abc"` gives 2, `"abc"` and `"-1"` are not numeric.
pub fn parse_component(value: &str) -> Result<u32, ComponentError> {
    let trimmed = value.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    let digits = &unsigned[..digits_end];
    if digits.is_empty() {
        return Err(ComponentError::NotNumeric);
    }
    // Only digits are left, so the parse can only fail on overflow
    digits.parse().map_err(|_| ComponentError::OutOfRange)
}

/// Holds the version used for relative URIs of one client
#[derive(Debug, Default)]
pub struct VersionManager {
    current: RwLock<ApiVersion>,
    // Serializes discovery so two concurrent lookups cannot interleave their writes
    discovery: tokio::sync::Mutex<()>,
}

impl VersionManager {
    pub fn new(version: ApiVersion) -> Self {
        Self {
            current: RwLock::new(version),
            discovery: tokio::sync::Mutex::new(()),
        }
    }

    pub fn version(&self) -> ApiVersion {
        *self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn major(&self) -> u32 {
        self.version().major
    }

    pub fn minor(&self) -> u32 {
        self.version().minor
    }

    pub fn set_major(&self, value: &str) -> Result<(), SdkError> {
        let major = parse_component(value)
            .map_err(|e| SdkError::invalid_argument(format!("major version {}, got '{}'", e, value)))?;
        let validated = ApiVersion::new(major, DEFAULT_MINOR_VERSION)?;
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        current.major = validated.major;
        Ok(())
    }

    pub fn set_minor(&self, value: &str) -> Result<(), SdkError> {
        let minor = parse_component(value)
            .map_err(|e| SdkError::invalid_argument(format!("minor version {}, got '{}'", e, value)))?;
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        current.minor = minor;
        Ok(())
    }

    pub fn set(&self, version: ApiVersion) {
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current != version {
            log::debug!("Web API version changed from {} to {}", *current, version);
        }
        *current = version;
    }

    pub fn path_prefix(&self) -> String {
        self.version().path_prefix()
    }

    /// Parse a dotted version and store it; state is untouched on failure
    pub fn apply_version_string(&self, full_version: &str) -> Result<ApiVersion, SdkError> {
        let version = ApiVersion::parse_dotted(full_version)?;
        self.set(version);
        Ok(version)
    }

    pub(crate) async fn lock_discovery(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.discovery.lock().await
    }
}
