//! Inventory settings layered from CLI flags, a YAML file and the environment.

use crate::{
    DiscoveryOptions, DuplicateNamePolicy, ProxmoxClient, ProxmoxResult, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_URL: &str = "PROXMOX_URL";
pub const ENV_USER: &str = "PROXMOX_USER";
pub const ENV_PASSWORD: &str = "PROXMOX_PASSWORD";

/// Accepted config file name endings.
const CONFIG_SUFFIXES: [&str; 2] = ["proxmox.yml", "proxmox.yaml"];

/// Settings for one inventory run.
///
/// Every field is optional so that several sources can be layered with
/// [`InventoryConfig::or`]; defaults are applied when the settings are read.
///
/// ```text
/// plugin: proxmox
/// url: https://pve.example.com:8006
/// user: ansible@pve
/// password: secret
/// validate_certs: false
/// requests_per_second: 20
/// duplicate_names: fail
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InventoryConfig {
    /// Informational; lets the file double as an Ansible inventory plugin config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_certs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_names: Option<DuplicateNamePolicy>,
}

impl InventoryConfig {
    /// Returns `true` if `path` names a file this tool accepts as configuration.
    pub fn verify_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| CONFIG_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
    }

    /// Reads a YAML config file.
    ///
    /// # Errors
    /// Returns `ValidationError::Field` if the file name is not accepted or the
    /// file cannot be read, and `ValidationError::Format` if it is not valid YAML.
    pub async fn from_file(path: &Path) -> ProxmoxResult<Self> {
        if !Self::verify_file(path) {
            return Err(ValidationError::Field {
                field: "config".to_string(),
                message: format!(
                    "Config file name must end in {}: {}",
                    CONFIG_SUFFIXES.join(" or "),
                    path.display()
                ),
            }
            .into());
        }

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ValidationError::Field {
                field: "config".to_string(),
                message: format!("Cannot read {}: {}", path.display(), e),
            })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_yaml(&raw)
    }

    /// Parses YAML config text. An empty document yields an empty config.
    ///
    /// # Errors
    /// Returns `ValidationError::Format` if the text is not a valid config mapping.
    pub fn from_yaml(raw: &str) -> ProxmoxResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
            .map_err(|e| ValidationError::Format(format!("Invalid config file: {}", e)).into())
    }

    /// Reads `PROXMOX_URL`, `PROXMOX_USER` and `PROXMOX_PASSWORD` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an environment-like lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            url: get(ENV_URL),
            user: get(ENV_USER),
            password: get(ENV_PASSWORD),
            ..Self::default()
        }
    }

    /// Fills every unset field of `self` from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            plugin: self.plugin.or(fallback.plugin),
            url: self.url.or(fallback.url),
            user: self.user.or(fallback.user),
            password: self.password.or(fallback.password),
            validate_certs: self.validate_certs.or(fallback.validate_certs),
            requests_per_second: self.requests_per_second.or(fallback.requests_per_second),
            duplicate_names: self.duplicate_names.or(fallback.duplicate_names),
        }
    }

    pub fn validate_certs(&self) -> bool {
        self.validate_certs.unwrap_or(true)
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            duplicate_names: self.duplicate_names.unwrap_or_default(),
        }
    }

    /// Builds the API client from the resolved settings.
    ///
    /// # Errors
    /// Returns `ValidationError::Field` naming the first missing or invalid setting.
    pub fn build_client(&self) -> ProxmoxResult<ProxmoxClient> {
        let url = required(&self.url, "url")?;
        let user = required(&self.user, "user")?;
        let password = required(&self.password, "password")?;

        let mut builder = ProxmoxClient::builder()
            .url(url)
            .credentials(user, password)
            .validate_certs(self.validate_certs());
        if let Some(rps) = self.requests_per_second {
            builder = builder.rate_limit(rps);
        }
        builder.build()
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ValidationError> {
    value.as_deref().ok_or_else(|| ValidationError::Field {
        field: field.to_string(),
        message: format!(
            "'{}' is not set by flag, config file or environment",
            field
        ),
    })
}
