//! Internal HTTP client that handles authentication and the `{data: ...}` envelope.

use crate::{
    ProxmoxAuth, ProxmoxConnection, ProxmoxError, ProxmoxResult, ValidationError,
    auth::application::service::login_service::LoginService,
};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Client-side request throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl RateLimitConfig {
    fn quota(&self) -> Result<Quota, ValidationError> {
        let rate = NonZeroU32::new(self.requests_per_second).ok_or_else(|| {
            ValidationError::Field {
                field: "requests_per_second".to_string(),
                message: "Rate limit must be greater than zero".to_string(),
            }
        })?;
        let burst = NonZeroU32::new(self.burst_size).ok_or_else(|| ValidationError::Field {
            field: "burst_size".to_string(),
            message: "Burst size must be greater than zero".to_string(),
        })?;
        Ok(Quota::per_second(rate).allow_burst(burst))
    }
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    data: T,
}

/// Internal HTTP client that manages authentication and performs API reads.
///
/// The ticket is obtained on the first request and held for the lifetime of
/// the client. It is never refreshed: a request that fails because the ticket
/// expired surfaces as an error like any other.
#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    connection: ProxmoxConnection,
    auth: OnceCell<ProxmoxAuth>,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl ApiClient {
    /// Creates a new `ApiClient`. The client starts unauthenticated.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Connection` if the HTTP client cannot be built, or
    /// `ProxmoxError::Validation` for a zero rate limit.
    pub fn new(
        connection: ProxmoxConnection,
        rate_limit: Option<RateLimitConfig>,
    ) -> ProxmoxResult<Self> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(connection.accepts_invalid_certs())
            .build()
            .map_err(|e| ProxmoxError::Connection(e.to_string()))?;

        let rate_limiter = rate_limit
            .map(|rl| rl.quota().map(DefaultDirectRateLimiter::direct))
            .transpose()?;

        Ok(Self {
            http_client,
            connection,
            auth: OnceCell::new(),
            rate_limiter,
        })
    }

    /// Returns a reference to the underlying connection details.
    pub fn connection(&self) -> &ProxmoxConnection {
        &self.connection
    }

    /// Sets the authentication state; has no effect once a ticket is held.
    #[cfg(test)]
    pub(crate) fn set_auth(&self, auth: ProxmoxAuth) {
        let _ = self.auth.set(auth);
    }

    /// Returns the current authentication state, if any.
    pub fn auth(&self) -> Option<&ProxmoxAuth> {
        self.auth.get()
    }

    /// Returns `true` once a ticket has been obtained.
    pub fn is_authenticated(&self) -> bool {
        self.auth.initialized()
    }

    /// Logs in unless a ticket is already held, and returns it.
    ///
    /// # Errors
    /// Returns the login failure; see [`LoginService::execute`].
    pub async fn authenticate(&self) -> ProxmoxResult<&ProxmoxAuth> {
        self.auth
            .get_or_try_init(|| async {
                let auth = LoginService::new()
                    .execute(&self.http_client, &self.connection)
                    .await?;
                info!(
                    url = self.connection.proxmox_url().as_str(),
                    "Authenticated against Proxmox"
                );
                Ok::<_, ProxmoxError>(auth)
            })
            .await
    }

    /// Performs an authenticated GET request and unwraps the `data` envelope.
    ///
    /// # Type Parameters
    /// - `T`: The expected type of `data` (must implement `DeserializeOwned`).
    ///
    /// # Errors
    /// Returns `ProxmoxError::Http` for a non-success status, `ProxmoxError::Connection`
    /// if the request fails or the body cannot be parsed, or the login failure when
    /// no ticket could be obtained.
    pub async fn get<T>(&self, path: &str) -> ProxmoxResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let auth = self.authenticate().await?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let url = self.connection.proxmox_url().api_path(path);
        debug!(%url, "GET");

        let response = self
            .http_client
            .get(&url)
            .header("Cookie", auth.ticket().as_cookie_header())
            .send()
            .await
            .map_err(|e| ProxmoxError::Connection(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            debug!(%url, status = status.as_u16(), "Request failed");
            return Err(ProxmoxError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ApiResponse<T>>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| ProxmoxError::Connection(format!("Failed to parse response: {}", e)))
    }
}
