//! Domain models for resource pools (`/pools`, `/pools/{poolid}`).

use crate::core::domain::model::guest::is_truthy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An entry of the pool listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolListItem {
    /// The pool identifier, also used as the inventory group name.
    pub poolid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A pool with its members.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Pool {
    #[serde(default)]
    pub members: Vec<PoolMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A pool member reference; pools also hold storage, which has no `name`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolMember {
    #[serde(rename = "type")]
    pub member_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmid: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
}

impl PoolMember {
    /// Only non-template VMs and containers become inventory group members.
    pub fn is_guest(&self) -> bool {
        let guest_type = matches!(self.member_type.as_str(), "qemu" | "lxc");
        guest_type && !self.template.as_ref().is_some_and(is_truthy)
    }
}

impl Pool {
    /// Names of the members that contribute to the pool's inventory group.
    pub fn member_names(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.is_guest())
            .filter_map(|m| m.name.as_deref())
            .collect()
    }
}
