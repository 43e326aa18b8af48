mod proxmox_csrf_token;
mod proxmox_password;
mod proxmox_ticket;
mod proxmox_url;
mod proxmox_username;

pub use proxmox_csrf_token::ProxmoxCSRFToken;
pub use proxmox_password::ProxmoxPassword;
pub use proxmox_ticket::ProxmoxTicket;
pub use proxmox_url::ProxmoxUrl;
pub use proxmox_username::ProxmoxUsername;
