//! Dynamic inventory for Proxmox VE clusters.
//!
//! The crate logs into a Proxmox controller, walks its nodes, guests and pools
//! one request at a time, and builds an Ansible-style inventory out of them.

mod auth;
pub mod config;
mod core;
pub mod inventory;

#[cfg(test)]
mod tests;

pub use crate::config::InventoryConfig;
pub use crate::core::domain::error::{ProxmoxError, ProxmoxResult, ValidationError};
pub use crate::core::domain::model::{
    agent::{AgentNetworkInterfaces, AgentOsInfo, AgentSystemInfo},
    guest::{Guest, GuestConfig, GuestKind, GuestList},
    metadata::Metadata,
    node_list_item::NodeListItem,
    pool::{Pool, PoolListItem, PoolMember},
    proxmox_auth::ProxmoxAuth,
    proxmox_connection::ProxmoxConnection,
    version::{ApiGeneration, ProxmoxVersion},
};
pub use crate::core::domain::value_object::{
    ProxmoxCSRFToken, ProxmoxPassword, ProxmoxTicket, ProxmoxUrl, ProxmoxUsername,
};
pub use crate::core::infrastructure::api_client::RateLimitConfig;
pub use crate::inventory::application::service::discovery_service::{
    DiscoveryOptions, DiscoveryReport, DiscoveryService, DuplicateNamePolicy,
};
pub use crate::inventory::domain::{
    inventory_sink::{Inventory, InventoryHost, InventorySink},
    inventory_source::InventorySource,
};

use crate::core::infrastructure::api_client::ApiClient;

/// A client for reading cluster state from the Proxmox VE API.
///
/// The client logs in lazily on its first request and keeps the ticket for
/// its whole lifetime. It implements [`InventorySource`], which is what
/// [`DiscoveryService`] consumes.
///
/// # Examples
///
/// ```no_run
/// use proxmox_inventory::{DiscoveryService, Inventory, ProxmoxClient, ProxmoxResult};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> ProxmoxResult<()> {
///     let client = ProxmoxClient::builder()
///         .url("https://proxmox.example.com:8006")
///         .credentials("ansible@pve", "password")
///         .validate_certs(false)
///         .build()?;
///
///     let mut inventory = Inventory::new();
///     DiscoveryService::default()
///         .execute(&client, &mut inventory)
///         .await?;
///     println!("{}", inventory.to_ansible_json());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ProxmoxClient {
    pub(crate) api_client: ApiClient,
}

/// Builder for ProxmoxClient configuration
#[derive(Debug)]
pub struct ProxmoxClientBuilder {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    validate_certs: bool,
    rate_limit: Option<RateLimitConfig>,
}

impl Default for ProxmoxClientBuilder {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            validate_certs: true,
            rate_limit: None,
        }
    }
}

impl ProxmoxClientBuilder {
    /// Base URL of the controller, e.g. `https://pve.example.com:8006`.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Login name including the realm (`user@pam`) and its password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Whether the controller's TLS certificate is verified. Defaults to `true`.
    pub fn validate_certs(mut self, validate_certs: bool) -> Self {
        self.validate_certs = validate_certs;
        self
    }

    /// Caps outgoing requests; the burst equals the per-second rate.
    pub fn rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit = Some(RateLimitConfig {
            requests_per_second,
            burst_size: requests_per_second,
        });
        self
    }

    /// Validates the settings and builds the client. No request is made.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Validation` for a missing or malformed setting and
    /// `ProxmoxError::Connection` if the HTTP client cannot be created.
    pub fn build(self) -> ProxmoxResult<ProxmoxClient> {
        let url = ProxmoxUrl::new(required(self.url, "url", "URL is required")?)?;
        let username = ProxmoxUsername::new(required(
            self.username,
            "user",
            "Username is required",
        )?)?;
        let password = ProxmoxPassword::new(required(
            self.password,
            "password",
            "Password is required",
        )?)?;

        let connection = ProxmoxConnection::new(url, username, password, self.validate_certs);
        let api_client = ApiClient::new(connection, self.rate_limit)?;

        Ok(ProxmoxClient { api_client })
    }
}

fn required(value: Option<String>, field: &str, message: &str) -> Result<String, ValidationError> {
    value.ok_or_else(|| ValidationError::Field {
        field: field.to_string(),
        message: message.to_string(),
    })
}

impl ProxmoxClient {
    /// Creates a new builder for ProxmoxClient configuration
    pub fn builder() -> ProxmoxClientBuilder {
        ProxmoxClientBuilder::default()
    }

    /// Logs in now instead of on the first request.
    ///
    /// Has no effect when a ticket is already held.
    ///
    /// # Errors
    ///
    /// This method will return an error if:
    /// - The credentials are rejected
    /// - The server is unreachable
    /// - The ticket in the response is malformed
    pub async fn login(&self) -> ProxmoxResult<()> {
        self.api_client.authenticate().await.map(|_| ())
    }

    /// Returns true if the client is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.api_client.is_authenticated()
    }

    /// Returns the current authentication token if authenticated
    pub fn auth_token(&self) -> Option<&ProxmoxTicket> {
        self.api_client.auth().map(|auth| auth.ticket())
    }

    /// Returns the current CSRF token if authenticated
    pub fn csrf_token(&self) -> Option<&ProxmoxCSRFToken> {
        self.api_client.auth().and_then(|auth| auth.csrf_token())
    }

    /// Connection settings this client was built with.
    pub fn connection(&self) -> &ProxmoxConnection {
        self.api_client.connection()
    }
}
