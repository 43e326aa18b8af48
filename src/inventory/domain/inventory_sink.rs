//! The inventory discovery writes into.

use crate::{ProxmoxError, ProxmoxResult};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Key of the per-host variables section of a dynamic inventory document.
const META_KEY: &str = "_meta";

/// A host record with its variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryHost {
    name: String,
    vars: Map<String, Value>,
}

impl InventoryHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }
}

/// Host/group store written by discovery.
///
/// Every operation is idempotent: adding an existing host or group keeps it as
/// is, adding a member twice keeps one membership, and variables are only
/// replaced key by key.
pub trait InventorySink {
    fn add_host(&mut self, name: &str);

    /// # Errors
    /// Returns `ProxmoxError::Inventory` if the host was never added.
    fn set_variable(&mut self, host: &str, key: &str, value: Value) -> ProxmoxResult<()>;

    fn add_group(&mut self, name: &str);

    /// # Errors
    /// Returns `ProxmoxError::Inventory` if the group or the host was never added.
    fn add_child(&mut self, group: &str, host: &str) -> ProxmoxResult<()>;

    fn get_host(&self, name: &str) -> Option<&InventoryHost>;

    /// Drops a host with its variables and group memberships. Groups stay.
    fn remove_host(&mut self, name: &str);
}

/// In-memory inventory rendering to the Ansible dynamic inventory format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    hosts: BTreeMap<String, InventoryHost>,
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &InventoryHost> {
        self.hosts.values()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Members of a group, sorted by name.
    pub fn group(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(name)
    }

    /// Renders the `--list` document:
    ///
    /// ```text
    /// {
    ///   "_meta": {"hostvars": {"web1": {...}}},
    ///   "all": {"hosts": ["web1", ...]},
    ///   "running": {"hosts": ["web1"]}
    /// }
    /// ```
    pub fn to_ansible_json(&self) -> Value {
        let hostvars: Map<String, Value> = self
            .hosts
            .iter()
            .map(|(name, host)| (name.clone(), Value::Object(host.vars.clone())))
            .collect();

        let mut document = Map::new();
        document.insert(
            "all".to_string(),
            json!({ "hosts": self.hosts.keys().collect::<Vec<_>>() }),
        );
        for (group, members) in &self.groups {
            if group == META_KEY {
                warn!(group = %group, "Skipping group with a reserved name");
                continue;
            }
            let entry = document
                .entry(group.clone())
                .or_insert_with(|| json!({ "hosts": [] }));
            if let Some(Value::Array(hosts)) = entry.get_mut("hosts") {
                for member in members {
                    let member = Value::String(member.clone());
                    if !hosts.contains(&member) {
                        hosts.push(member);
                    }
                }
            }
        }
        document.insert(META_KEY.to_string(), json!({ "hostvars": hostvars }));

        Value::Object(document)
    }

    /// Renders the `--host <name>` document: the host's variables, or `{}`.
    pub fn host_vars(&self, name: &str) -> Value {
        self.hosts
            .get(name)
            .map(|host| Value::Object(host.vars.clone()))
            .unwrap_or_else(|| json!({}))
    }
}

impl InventorySink for Inventory {
    fn add_host(&mut self, name: &str) {
        self.hosts
            .entry(name.to_string())
            .or_insert_with(|| InventoryHost::new(name));
    }

    fn set_variable(&mut self, host: &str, key: &str, value: Value) -> ProxmoxResult<()> {
        let entry = self.hosts.get_mut(host).ok_or_else(|| {
            ProxmoxError::Inventory(format!("Cannot set '{key}' on unknown host '{host}'"))
        })?;
        entry.vars.insert(key.to_string(), value);
        Ok(())
    }

    fn add_group(&mut self, name: &str) {
        self.groups.entry(name.to_string()).or_default();
    }

    fn add_child(&mut self, group: &str, host: &str) -> ProxmoxResult<()> {
        if !self.hosts.contains_key(host) {
            return Err(ProxmoxError::Inventory(format!(
                "Cannot add unknown host '{host}' to group '{group}'"
            )));
        }
        let members = self.groups.get_mut(group).ok_or_else(|| {
            ProxmoxError::Inventory(format!("Cannot add '{host}' to unknown group '{group}'"))
        })?;
        members.insert(host.to_string());
        Ok(())
    }

    fn get_host(&self, name: &str) -> Option<&InventoryHost> {
        self.hosts.get(name)
    }

    fn remove_host(&mut self, name: &str) {
        self.hosts.remove(name);
        for members in self.groups.values_mut() {
            members.remove(name);
        }
    }
}
