//! Controller version discovery and the API generation derived from it.

use crate::core::domain::error::ValidationError;
use crate::core::domain::model::guest::GuestKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw payload of the `/version` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VersionResponse {
    /// Version string, `"<version>-<build>"` on older releases, plain `X.Y.Z` on newer ones.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repoid: Option<String>,
}

/// The numeric controller version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProxmoxVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProxmoxVersion {
    /// Parses the numeric portion in front of the `-<build>` suffix.
    ///
    /// `"3.4-11"`, `"7.4-3"` and `"8.2.4"` are all accepted; patch levels are ignored.
    ///
    /// # Errors
    /// Returns `ValidationError::Format` if the major or minor component is not numeric.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let numeric = raw.trim().split('-').next().unwrap_or_default();
        let mut parts = numeric.split('.');

        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ValidationError::Format(format!("Empty version string: {raw:?}")))?
            .parse::<u32>()
            .map_err(|e| ValidationError::Format(format!("Invalid major version {raw:?}: {e}")))?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|e| {
                ValidationError::Format(format!("Invalid minor version {raw:?}: {e}"))
            })?,
            None => 0,
        };

        Ok(Self { major, minor })
    }

    /// Maps the version onto the API surface the rest of the run uses.
    #[must_use]
    pub fn generation(&self) -> ApiGeneration {
        if self.major >= 4 {
            ApiGeneration::Modern
        } else {
            ApiGeneration::Legacy
        }
    }
}

impl TryFrom<&VersionResponse> for ProxmoxVersion {
    type Error = ValidationError;

    fn try_from(value: &VersionResponse) -> Result<Self, Self::Error> {
        Self::parse(&value.version)
    }
}

impl fmt::Display for ProxmoxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// API surface generation, resolved once per discovery run.
///
/// `Legacy` controllers (before 4.0) expose containers through OpenVZ and do not
/// flag templates in guest listings; `Modern` ones use LXC and list templates
/// alongside regular guests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGeneration {
    Legacy,
    Modern,
}

impl ApiGeneration {
    /// The guest kind used to list containers.
    #[must_use]
    pub fn container_kind(self) -> GuestKind {
        match self {
            ApiGeneration::Legacy => GuestKind::Openvz,
            ApiGeneration::Modern => GuestKind::Lxc,
        }
    }

    /// Whether template-flagged guests are dropped from listings.
    #[must_use]
    pub fn excludes_templates(self) -> bool {
        matches!(self, ApiGeneration::Modern)
    }
}
