//! QEMU guest agent payloads and the system info derived from them.
//!
//! Agent responses are wrapped in a `result` object and their shape depends on
//! the agent version running inside the guest. Parsing is tolerant: missing
//! keys leave fields empty instead of failing the run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::Ipv4Addr;
use tracing::warn;

/// The `{"result": ...}` wrapper every agent command answers with.
#[derive(Debug, Clone, Deserialize)]
struct AgentResult<T> {
    #[serde(default = "Option::default")]
    result: Option<T>,
}

/// Output of the `get-osinfo` agent command.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AgentOsInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub machine: Option<String>,
    #[serde(default, rename = "kernel-release")]
    pub kernel_release: Option<String>,
    #[serde(default, rename = "version-id")]
    pub version_id: Option<String>,
}

impl AgentOsInfo {
    /// Decodes the `data` of a `get-osinfo` response, falling back to empty info.
    pub fn from_payload(payload: Value) -> Self {
        match serde_json::from_value::<AgentResult<AgentOsInfo>>(payload) {
            Ok(wrapper) => wrapper.result.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed agent OS info");
                Self::default()
            }
        }
    }
}

/// One address reported for an interface.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentIpAddress {
    #[serde(default, rename = "ip-address")]
    pub ip_address: Option<String>,
    #[serde(default, rename = "ip-address-type")]
    pub ip_address_type: Option<String>,
    #[serde(default)]
    pub prefix: Option<u8>,
}

/// One interface reported by `network-get-interfaces`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AgentInterface {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "hardware-address")]
    pub hardware_address: Option<String>,
    #[serde(default, rename = "ip-addresses")]
    pub ip_addresses: Vec<AgentIpAddress>,
}

/// The two wire shapes of `network-get-interfaces`.
///
/// Current agents answer with a sequence of interfaces; some older ones answer
/// with a single interface mapping. The variant is chosen once at decode time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AgentNetworkInterfaces {
    List(Vec<AgentInterface>),
    Single(AgentInterface),
}

impl AgentNetworkInterfaces {
    /// Decodes the `data` of a `network-get-interfaces` response.
    ///
    /// Returns `None` when the payload matches neither shape.
    pub fn from_payload(payload: Value) -> Option<Self> {
        match serde_json::from_value::<AgentResult<AgentNetworkInterfaces>>(payload) {
            Ok(wrapper) => wrapper.result,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed agent network interfaces");
                None
            }
        }
    }

    /// Picks the address used to reach the guest.
    ///
    /// Every non-loopback IPv4 address qualifies and the last one reported wins.
    pub fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            AgentNetworkInterfaces::List(interfaces) => select_from_list(interfaces),
            AgentNetworkInterfaces::Single(interface) => select_from_interface(interface),
        }
    }
}

fn select_from_list(interfaces: &[AgentInterface]) -> Option<Ipv4Addr> {
    interfaces.iter().filter_map(select_from_interface).last()
}

fn select_from_interface(interface: &AgentInterface) -> Option<Ipv4Addr> {
    interface
        .ip_addresses
        .iter()
        .filter_map(|addr| addr.ip_address.as_deref()?.parse::<Ipv4Addr>().ok())
        .filter(|ip| !ip.is_loopback())
        .last()
}

/// Guest identity assembled from a live agent probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentSystemInfo {
    pub id: String,
    pub name: String,
    pub machine: String,
    pub kernel: String,
    pub version_id: String,
    pub ip_address: Option<Ipv4Addr>,
}

impl AgentSystemInfo {
    pub fn from_probe(os_info: AgentOsInfo, interfaces: Option<&AgentNetworkInterfaces>) -> Self {
        Self {
            id: os_info.id.unwrap_or_default(),
            name: os_info.name.unwrap_or_default(),
            machine: os_info.machine.unwrap_or_default(),
            kernel: os_info.kernel_release.unwrap_or_default(),
            version_id: os_info.version_id.unwrap_or_default(),
            ip_address: interfaces.and_then(AgentNetworkInterfaces::primary_ipv4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_os_info_payload() {
        let info = AgentOsInfo::from_payload(json!({
            "result": {
                "id": "debian",
                "name": "Debian GNU/Linux",
                "machine": "x86_64",
                "kernel-release": "6.1.0-18-amd64",
                "version-id": "12",
                "pretty-name": "Debian GNU/Linux 12 (bookworm)"
            }
        }));

        assert_eq!(info.id.as_deref(), Some("debian"));
        assert_eq!(info.kernel_release.as_deref(), Some("6.1.0-18-amd64"));
        assert_eq!(info.version_id.as_deref(), Some("12"));
    }

    #[test]
    fn test_os_info_tolerates_missing_keys() {
        assert_eq!(AgentOsInfo::from_payload(json!({})), AgentOsInfo::default());
        assert_eq!(
            AgentOsInfo::from_payload(json!({"result": {"id": "ubuntu"}})).id.as_deref(),
            Some("ubuntu")
        );
        assert_eq!(AgentOsInfo::from_payload(json!("garbage")), AgentOsInfo::default());
    }

    #[test]
    fn test_list_shape_last_non_loopback_wins() {
        let interfaces = AgentNetworkInterfaces::from_payload(json!({
            "result": [
                {
                    "name": "lo",
                    "ip-addresses": [
                        {"ip-address": "127.0.0.1", "ip-address-type": "ipv4", "prefix": 8},
                        {"ip-address": "::1", "ip-address-type": "ipv6", "prefix": 128}
                    ]
                },
                {
                    "name": "eth0",
                    "ip-addresses": [
                        {"ip-address": "10.0.0.5", "ip-address-type": "ipv4", "prefix": 24},
                        {"ip-address": "fe80::1", "ip-address-type": "ipv6", "prefix": 64}
                    ]
                },
                {
                    "name": "eth1",
                    "ip-addresses": [
                        {"ip-address": "192.168.10.7", "ip-address-type": "ipv4", "prefix": 24}
                    ]
                },
                {"name": "eth2"}
            ]
        }))
        .unwrap();

        assert!(matches!(interfaces, AgentNetworkInterfaces::List(_)));
        assert_eq!(interfaces.primary_ipv4(), Some(Ipv4Addr::new(192, 168, 10, 7)));
    }

    #[test]
    fn test_single_shape() {
        let interfaces = AgentNetworkInterfaces::from_payload(json!({
            "result": {
                "name": "eth0",
                "ip-addresses": [{"ip-address": "172.16.0.9", "ip-address-type": "ipv4"}]
            }
        }))
        .unwrap();

        assert!(matches!(interfaces, AgentNetworkInterfaces::Single(_)));
        assert_eq!(interfaces.primary_ipv4(), Some(Ipv4Addr::new(172, 16, 0, 9)));
    }

    #[test]
    fn test_only_loopback_yields_none() {
        let interfaces = AgentNetworkInterfaces::from_payload(json!({
            "result": [{"name": "lo", "ip-addresses": [{"ip-address": "127.0.0.1"}]}]
        }))
        .unwrap();
        assert_eq!(interfaces.primary_ipv4(), None);
    }

    #[test]
    fn test_system_info_from_probe() {
        let os_info = AgentOsInfo {
            id: Some("centos".to_string()),
            name: Some("CentOS Stream".to_string()),
            ..Default::default()
        };
        let interfaces = AgentNetworkInterfaces::Single(AgentInterface {
            ip_addresses: vec![AgentIpAddress {
                ip_address: Some("10.10.0.2".to_string()),
                ip_address_type: None,
                prefix: None,
            }],
            ..Default::default()
        });

        let info = AgentSystemInfo::from_probe(os_info, Some(&interfaces));
        assert_eq!(info.id, "centos");
        assert_eq!(info.name, "CentOS Stream");
        assert_eq!(info.machine, "");
        assert_eq!(info.ip_address, Some(Ipv4Addr::new(10, 10, 0, 2)));

        let info = AgentSystemInfo::from_probe(AgentOsInfo::default(), None);
        assert_eq!(info, AgentSystemInfo::default());
    }
}
