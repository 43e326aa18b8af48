//! Domain model for node list items from the `/nodes` endpoint.

use serde::{Deserialize, Serialize};

/// A node in the Proxmox cluster.
///
/// Discovery only needs the name to walk the hierarchy; the status is kept for
/// logging.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeListItem {
    /// The node name (e.g., "pve1").
    pub node: String,
    /// Current node status (e.g., "online", "offline", "unknown").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Unique node identifier (e.g., "node/pve1").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Extracts the traversal keys of a node listing, preserving controller order.
pub fn node_names(nodes: &[NodeListItem]) -> Vec<&str> {
    nodes.iter().map(|n| n.node.as_str()).collect()
}
