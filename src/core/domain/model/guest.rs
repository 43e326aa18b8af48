//! Domain models for guests (virtual machines and containers).
//!
//! Guest listings are heterogeneous: QEMU and LXC entries carry different
//! attribute sets, and the whole set is exported to the inventory. Guests are
//! therefore kept as the raw attribute map the controller returns, with typed
//! accessors for the handful of attributes discovery relies on.

use crate::core::domain::error::ValidationError;
use crate::core::domain::model::version::ApiGeneration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::LazyLock;

/// Prefix prepended to every native guest attribute when exported as a host variable.
pub const VARIABLE_PREFIX: &str = "proxmox_";

static NET0_IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ip=(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("static regex is valid")
});

/// The guest API a resource lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    /// A QEMU/KVM virtual machine.
    Qemu,
    /// An LXC container (controller 4.0 and later).
    Lxc,
    /// An OpenVZ container (controllers before 4.0).
    Openvz,
}

impl GuestKind {
    /// The path segment used by the controller API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GuestKind::Qemu => "qemu",
            GuestKind::Lxc => "lxc",
            GuestKind::Openvz => "openvz",
        }
    }
}

impl fmt::Display for GuestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuestKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qemu" => Ok(GuestKind::Qemu),
            "lxc" => Ok(GuestKind::Lxc),
            "openvz" => Ok(GuestKind::Openvz),
            other => Err(ValidationError::Field {
                field: "type".to_string(),
                message: format!("Unknown guest type '{other}'"),
            }),
        }
    }
}

/// A guest as returned by `/nodes/{node}/{kind}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Guest {
    attributes: Map<String, Value>,
}

impl Guest {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    /// The guest id; listings return it as a number or, on some releases, a string.
    pub fn vmid(&self) -> Option<String> {
        self.attributes.get("vmid").and_then(scalar_to_string)
    }

    pub fn status(&self) -> Option<&str> {
        self.attributes.get("status").and_then(Value::as_str)
    }

    /// The `type` tag; QEMU listings omit it.
    pub fn kind(&self) -> Option<&str> {
        self.attributes.get("type").and_then(Value::as_str)
    }

    /// Templates are flagged with `template: 1` (or `true`, or `"1"`).
    pub fn is_template(&self) -> bool {
        self.attributes.get("template").is_some_and(is_truthy)
    }

    /// Flattens the native attributes into host variables under [`VARIABLE_PREFIX`].
    pub fn variables(&self) -> Map<String, Value> {
        self.attributes
            .iter()
            .map(|(key, value)| (format!("{VARIABLE_PREFIX}{key}"), value.clone()))
            .collect()
    }
}

/// A guest listing of one node, bound to the API generation it was fetched under.
#[derive(Debug, Clone)]
pub struct GuestList {
    guests: Vec<Guest>,
    generation: ApiGeneration,
}

impl GuestList {
    pub fn new(guests: Vec<Guest>, generation: ApiGeneration) -> Self {
        Self { guests, generation }
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    /// Guests that take part in the inventory: templates are dropped on modern controllers.
    pub fn visible(&self) -> impl Iterator<Item = &Guest> {
        let exclude_templates = self.generation.excludes_templates();
        self.guests
            .iter()
            .filter(move |guest| !(exclude_templates && guest.is_template()))
    }

    /// Names of the visible guests, in listing order.
    pub fn names(&self) -> Vec<&str> {
        self.visible().filter_map(Guest::name).collect()
    }
}

/// Guest configuration from `/nodes/{node}/{kind}/{vmid}/config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GuestConfig {
    attributes: Map<String, Value>,
}

impl GuestConfig {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }

    /// The free-text notes field, if one is set.
    pub fn description(&self) -> Option<&str> {
        self.attributes.get("description").and_then(Value::as_str)
    }

    /// The first network device definition (`net0`).
    pub fn net0(&self) -> Option<&str> {
        self.attributes.get("net0").and_then(Value::as_str)
    }

    /// The statically configured IPv4 address of `net0`, if any.
    pub fn net0_ipv4(&self) -> Option<Ipv4Addr> {
        self.net0().and_then(extract_net0_ipv4)
    }
}

/// Extracts the `ip=a.b.c.d` address out of a network device string.
///
/// `"name=eth0,bridge=vmbr0,ip=10.0.0.5/24"` yields `10.0.0.5`; `ip=dhcp`
/// or a missing `ip=` token yields `None`.
pub fn extract_net0_ipv4(net: &str) -> Option<Ipv4Addr> {
    NET0_IPV4
        .captures(net)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Proxmox flag values: `1`, `true`, `"1"` and `"true"` are set.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
