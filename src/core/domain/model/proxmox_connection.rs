use crate::core::domain::value_object::{ProxmoxPassword, ProxmoxUrl, ProxmoxUsername};

/// Everything needed to reach and authenticate against one controller.
#[derive(Debug, Clone)]
pub struct ProxmoxConnection {
    proxmox_url: ProxmoxUrl,
    proxmox_username: ProxmoxUsername,
    proxmox_password: ProxmoxPassword,
    validate_certs: bool,
}

impl ProxmoxConnection {
    pub fn new(
        proxmox_url: ProxmoxUrl,
        proxmox_username: ProxmoxUsername,
        proxmox_password: ProxmoxPassword,
        validate_certs: bool,
    ) -> Self {
        Self {
            proxmox_url,
            proxmox_username,
            proxmox_password,
            validate_certs,
        }
    }

    pub fn proxmox_url(&self) -> &ProxmoxUrl {
        &self.proxmox_url
    }

    pub fn proxmox_username(&self) -> &ProxmoxUsername {
        &self.proxmox_username
    }

    pub fn proxmox_password(&self) -> &ProxmoxPassword {
        &self.proxmox_password
    }

    pub fn validate_certs(&self) -> bool {
        self.validate_certs
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        !self.validate_certs
    }
}
