pub mod agent;
pub mod guest;
pub mod metadata;
pub mod node_list_item;
pub mod pool;
pub mod proxmox_auth;
pub mod proxmox_connection;
pub mod version;
