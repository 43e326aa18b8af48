use crate::core::domain::error::ValidationError;
use std::collections::HashSet;

/// Constraints applied to the controller base URL.
///
/// Follows RFC 3986 for the syntax and RFC 7230 for the length limit.
#[derive(Debug, Clone)]
pub struct ProxmoxUrlConfig {
    allowed_schemes: HashSet<String>,
    max_length: usize,
}

impl ProxmoxUrlConfig {
    fn validate_url(&self, url: &str) -> Result<(), ValidationError> {
        if url.is_empty() {
            return Err(ValidationError::Field {
                field: "url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        }

        if url.len() > self.max_length {
            return Err(ValidationError::Format(format!(
                "URL exceeds maximum length of {} characters",
                self.max_length
            )));
        }

        let url_parts = url::Url::parse(url)
            .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;

        if !self.allowed_schemes.contains(url_parts.scheme()) {
            let mut schemes: Vec<&str> = self.allowed_schemes.iter().map(String::as_str).collect();
            schemes.sort_unstable();
            return Err(ValidationError::ConstraintViolation(format!(
                "Invalid scheme. Must be one of: {}",
                schemes.join(", ")
            )));
        }

        if url_parts.host_str().is_none() {
            return Err(ValidationError::Format("URL has no host".to_string()));
        }

        if url_parts.query().is_some() || url_parts.fragment().is_some() {
            return Err(ValidationError::ConstraintViolation(
                "URL must not carry a query or fragment".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ProxmoxUrlConfig {
    fn default() -> Self {
        let mut schemes = HashSet::new();
        schemes.insert("https".to_string());
        schemes.insert("http".to_string());

        Self {
            allowed_schemes: schemes,
            max_length: 2083,
        }
    }
}

/// The validated base URL of a Proxmox controller, e.g. `https://pve.example.com:8006/`.
///
/// The stored value always ends with exactly one `/`, added at construction when
/// missing, so API paths can be appended without further joining logic.
///
/// # Examples
///
/// ```
/// use proxmox_inventory::ProxmoxUrl;
///
/// let url = ProxmoxUrl::new("https://pve.example.com:8006").unwrap();
/// assert_eq!(url.as_str(), "https://pve.example.com:8006/");
/// assert_eq!(
///     url.api_path("nodes"),
///     "https://pve.example.com:8006/api2/json/nodes"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxUrl(String);

impl ProxmoxUrl {
    /// Validates and normalizes a base URL.
    ///
    /// # Errors
    /// Returns `ValidationError` if the URL is empty, unparsable, or uses a scheme
    /// other than `http`/`https`.
    pub fn new(url: impl Into<String>) -> Result<Self, ValidationError> {
        let mut url = url.into();
        ProxmoxUrlConfig::default().validate_url(&url)?;
        if !url.ends_with('/') {
            url.push('/');
        }
        Ok(Self(url))
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the full URL of a JSON API endpoint below `api2/json/`.
    #[must_use]
    pub fn api_path(&self, path: &str) -> String {
        format!("{}api2/json/{}", self.0, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_added_once() {
        let url = ProxmoxUrl::new("https://pve.example.com:8006").unwrap();
        assert_eq!(url.as_str(), "https://pve.example.com:8006/");

        let url = ProxmoxUrl::new("https://pve.example.com:8006/").unwrap();
        assert_eq!(url.as_str(), "https://pve.example.com:8006/");
    }

    #[test]
    fn test_url_with_prefix_path() {
        let url = ProxmoxUrl::new("https://gateway.example.com/pve").unwrap();
        assert_eq!(
            url.api_path("/access/ticket"),
            "https://gateway.example.com/pve/api2/json/access/ticket"
        );
    }

    #[test]
    fn test_invalid_urls() {
        let test_cases = vec![
            ("", "empty"),
            ("pve.example.com:8006", "missing scheme"),
            ("ftp://pve.example.com", "unsupported scheme"),
            ("https://pve.example.com/?x=1", "query"),
            ("not a url", "garbage"),
        ];

        for (url, case) in test_cases {
            assert!(
                ProxmoxUrl::new(url).is_err(),
                "Case '{}' should fail validation: {}",
                case,
                url
            );
        }
    }

    #[test]
    fn test_http_allowed() {
        assert!(ProxmoxUrl::new("http://127.0.0.1:8006").is_ok());
    }
}
