use crate::core::domain::error::ValidationError;

/// A validated Proxmox user id, realm included (`apiuser@pve`).
#[derive(Debug, Clone)]
pub struct ProxmoxUsername(String);

impl ProxmoxUsername {
    /// Creates a username after validating it.
    ///
    /// # Errors
    /// Returns `ValidationError` if the username is empty or malformed.
    pub fn new(username: String) -> Result<Self, ValidationError> {
        validate_username(&username)?;
        Ok(Self(username))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validates a username.
pub(crate) fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Field {
            field: "username".to_string(),
            message: "Username cannot be empty".to_string(),
        });
    }
    if let Some(c) = username
        .chars()
        .find(|c| c.is_whitespace() || *c == ':' || *c == '/')
    {
        return Err(ValidationError::Format(format!(
            "Username cannot contain {:?}",
            c
        )));
    }
    Ok(())
}
