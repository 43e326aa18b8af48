use thiserror::Error;

/// The main error type for inventory discovery.
///
/// Every failure that can abort a discovery run is expressed here. Conditions
/// the run recovers from (an offline node, a missing guest agent, a free-text
/// description) are absorbed where they are detected and never reach the caller.
#[derive(Error, Debug)]
pub enum ProxmoxError {
    /// Represents errors that occur while talking to the controller
    ///
    /// # Fields
    /// * `0` - A description of the transport or decoding failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Represents authentication failures
    ///
    /// # Fields
    /// * `0` - A description of the authentication failure
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The controller answered an authenticated read with a non-success status
    ///
    /// # Fields
    /// * `status` - The HTTP status code (Proxmox uses 595/596 for offline nodes)
    /// * `message` - The response body, or a placeholder when it was unreadable
    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    /// Represents validation failures of configuration or wire values
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The inventory sink rejected an operation
    ///
    /// # Fields
    /// * `0` - A description of the violated sink contract
    #[error("Inventory error: {0}")]
    Inventory(String),
}

impl ProxmoxError {
    /// Returns `true` when the controller reported the target node as unreachable.
    #[must_use]
    pub fn is_node_unavailable(&self) -> bool {
        matches!(self, ProxmoxError::Http { status: 595 | 596, .. })
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ProxmoxError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with a ProxmoxError
pub type ProxmoxResult<T> = Result<T, ProxmoxError>;
