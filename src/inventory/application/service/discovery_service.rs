//! One full crawl of the cluster into an inventory.
//!
//! The crawl walks nodes in controller order, registers every visible guest as
//! a host with its `proxmox_*` variables, enriches each host from the guest
//! agent or the container network config, merges the description metadata,
//! derives groups, and finally maps pools onto groups. Requests are issued one
//! at a time. The first fatal error aborts the run and leaves the sink as far
//! as it got.

use crate::{
    ProxmoxError, ProxmoxResult,
    core::domain::model::{
        agent::AgentSystemInfo,
        guest::{Guest, GuestKind, GuestList, VARIABLE_PREFIX, scalar_to_string},
        metadata::Metadata,
        node_list_item::node_names,
        version::ApiGeneration,
    },
    inventory::domain::{inventory_sink::InventorySink, inventory_source::InventorySource},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Group every running guest joins.
pub const RUNNING_GROUP: &str = "running";
/// Host variable holding the address automation connects to.
pub const ANSIBLE_HOST: &str = "ansible_host";

/// What to do when two guests in the cluster share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateNamePolicy {
    /// Log a warning and replace the host record, groups included, with the
    /// guest seen last.
    #[default]
    Warn,
    /// Abort the run.
    Fail,
}

/// Knobs for a discovery run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Handling of two guests sharing a name. Defaults to [`DuplicateNamePolicy::Warn`].
    pub duplicate_names: DuplicateNamePolicy,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Nodes whose guests were listed.
    pub nodes_visited: usize,
    /// Nodes that answered 595 or 596 and were left out.
    pub nodes_skipped: Vec<String>,
    /// Distinct host names registered.
    pub hosts: usize,
    /// Pools turned into groups.
    pub pools: usize,
}

/// Where a host name was first registered during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GuestOrigin {
    node: String,
    vmid: Option<String>,
}

pub struct DiscoveryService {
    options: DiscoveryOptions,
}

impl DiscoveryService {
    pub fn new(options: DiscoveryOptions) -> Self {
        Self { options }
    }

    /// Crawls the cluster behind `source` and writes the result into `sink`.
    ///
    /// # Errors
    /// Returns the first fatal error: authentication failures, HTTP errors other
    /// than an unreachable node or a missing guest agent, malformed listings,
    /// sink violations, and duplicate guest names under
    /// [`DuplicateNamePolicy::Fail`].
    pub async fn execute<S, I>(&self, source: &S, sink: &mut I) -> ProxmoxResult<DiscoveryReport>
    where
        S: InventorySource + ?Sized,
        I: InventorySink + ?Sized,
    {
        let nodes = source.list_nodes().await?;
        let version = source.version().await?;
        let generation = version.generation();
        info!(%version, ?generation, nodes = nodes.len(), "Starting discovery");

        let mut report = DiscoveryReport::default();
        let mut origins: HashMap<String, GuestOrigin> = HashMap::new();

        for node in node_names(&nodes) {
            let Some((qemu, containers)) = self.fetch_node_guests(source, node, generation).await?
            else {
                report.nodes_skipped.push(node.to_string());
                continue;
            };
            report.nodes_visited += 1;
            debug!(
                node,
                qemu = qemu.len(),
                containers = containers.len(),
                "Fetched guest listings"
            );

            let mut node_hosts: Vec<String> = Vec::new();
            for guest in qemu.visible().chain(containers.visible()) {
                if let Some(name) = self.register_guest(sink, &mut origins, node, guest)? {
                    if !node_hosts.contains(&name) {
                        node_hosts.push(name);
                    }
                }
            }

            for name in &node_hosts {
                self.reconcile_host(source, sink, node, name).await?;
            }
        }

        report.pools = self.apply_pools(source, sink).await?;
        report.hosts = origins.len();
        info!(
            hosts = report.hosts,
            pools = report.pools,
            skipped = report.nodes_skipped.len(),
            "Discovery finished"
        );
        Ok(report)
    }

    /// Lists VMs and containers of a node, or `None` when the node is unreachable.
    async fn fetch_node_guests<S>(
        &self,
        source: &S,
        node: &str,
        generation: ApiGeneration,
    ) -> ProxmoxResult<Option<(GuestList, GuestList)>>
    where
        S: InventorySource + ?Sized,
    {
        let Some(qemu) = skip_unavailable(node, source.list_guests(node, GuestKind::Qemu).await)?
        else {
            return Ok(None);
        };
        let container_kind = generation.container_kind();
        let Some(containers) =
            skip_unavailable(node, source.list_guests(node, container_kind).await)?
        else {
            return Ok(None);
        };

        Ok(Some((
            GuestList::new(qemu, generation),
            GuestList::new(containers, generation),
        )))
    }

    /// Adds the guest as a host with its base variables and returns the host name.
    fn register_guest<I>(
        &self,
        sink: &mut I,
        origins: &mut HashMap<String, GuestOrigin>,
        node: &str,
        guest: &Guest,
    ) -> ProxmoxResult<Option<String>>
    where
        I: InventorySink + ?Sized,
    {
        let Some(name) = guest.name() else {
            warn!(node, vmid = ?guest.vmid(), "Skipping guest without a name");
            return Ok(None);
        };

        let origin = GuestOrigin {
            node: node.to_string(),
            vmid: guest.vmid(),
        };
        if let Some(previous) = origins.get(name) {
            if *previous != origin {
                match self.options.duplicate_names {
                    DuplicateNamePolicy::Fail => {
                        return Err(ProxmoxError::Inventory(format!(
                            "Guest name '{}' is used by vmid {:?} on {} and vmid {:?} on {}",
                            name, previous.vmid, previous.node, origin.vmid, origin.node
                        )));
                    }
                    DuplicateNamePolicy::Warn => {
                        warn!(
                            name,
                            first_node = %previous.node,
                            first_vmid = ?previous.vmid,
                            node,
                            vmid = ?origin.vmid,
                            "Duplicate guest name, later guest replaces the host"
                        );
                        sink.remove_host(name);
                    }
                }
            }
        }
        origins.insert(name.to_string(), origin);

        sink.add_host(name);
        for (key, value) in guest.variables() {
            sink.set_variable(name, &key, value)?;
        }
        Ok(Some(name.to_string()))
    }

    /// Enriches one registered host and derives its groups.
    async fn reconcile_host<S, I>(
        &self,
        source: &S,
        sink: &mut I,
        node: &str,
        name: &str,
    ) -> ProxmoxResult<()>
    where
        S: InventorySource + ?Sized,
        I: InventorySink + ?Sized,
    {
        let host = sink
            .get_host(name)
            .ok_or_else(|| ProxmoxError::Inventory(format!("Host '{}' was not registered", name)))?;
        let vmid = host
            .var(&format!("{VARIABLE_PREFIX}vmid"))
            .and_then(scalar_to_string)
            .ok_or_else(|| ProxmoxError::Inventory(format!("Host '{}' has no vmid", name)))?;
        let declared_kind = host
            .var(&format!("{VARIABLE_PREFIX}type"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        let running = host
            .var(&format!("{VARIABLE_PREFIX}status"))
            .and_then(Value::as_str)
            == Some("running");

        let kind = match declared_kind {
            Some(kind) => kind.parse::<GuestKind>()?,
            None => {
                sink.set_variable(name, &format!("{VARIABLE_PREFIX}type"), json!("qemu"))?;
                GuestKind::Qemu
            }
        };

        let config = source.guest_config(node, &vmid, kind).await?;
        let metadata = Metadata::parse(config.description());

        match kind {
            GuestKind::Qemu => self.enrich_from_agent(source, sink, node, &vmid, name).await?,
            GuestKind::Lxc | GuestKind::Openvz => match config.net0_ipv4() {
                Some(ip) => sink.set_variable(name, ANSIBLE_HOST, json!(ip.to_string()))?,
                None => debug!(name, "No static IPv4 address in net0"),
            },
        }

        for group in metadata.groups() {
            sink.add_group(&group);
            sink.add_child(&group, name)?;
        }

        if running {
            sink.add_group(RUNNING_GROUP);
            sink.add_child(RUNNING_GROUP, name)?;
        }

        let os_id = sink
            .get_host(name)
            .and_then(|h| h.var(&format!("{VARIABLE_PREFIX}os_id")))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_owned);
        if let Some(os_id) = os_id {
            sink.add_group(&os_id);
            sink.add_child(&os_id, name)?;
        }

        for (key, value) in metadata.variables() {
            sink.set_variable(name, &key, value)?;
        }
        Ok(())
    }

    async fn enrich_from_agent<S, I>(
        &self,
        source: &S,
        sink: &mut I,
        node: &str,
        vmid: &str,
        name: &str,
    ) -> ProxmoxResult<()>
    where
        S: InventorySource + ?Sized,
        I: InventorySink + ?Sized,
    {
        if !source.agent_available(node, vmid).await? {
            debug!(name, node, vmid, "No guest agent");
            return Ok(());
        }

        let os_info = source.agent_os_info(node, vmid).await?;
        let interfaces = source.agent_network_interfaces(node, vmid).await?;
        let info = AgentSystemInfo::from_probe(os_info, interfaces.as_ref());
        debug!(name, os = %info.id, ip = ?info.ip_address, "Guest agent probed");

        if let Some(ip) = info.ip_address {
            sink.set_variable(name, ANSIBLE_HOST, json!(ip.to_string()))?;
        }
        let os_vars = [
            ("os_id", info.id),
            ("os_name", info.name),
            ("os_machine", info.machine),
            ("os_kernel", info.kernel),
            ("os_version_id", info.version_id),
        ];
        for (key, value) in os_vars {
            sink.set_variable(name, &format!("{VARIABLE_PREFIX}{key}"), json!(value))?;
        }
        Ok(())
    }

    /// Creates one group per pool holding its registered guest members.
    async fn apply_pools<S, I>(&self, source: &S, sink: &mut I) -> ProxmoxResult<usize>
    where
        S: InventorySource + ?Sized,
        I: InventorySink + ?Sized,
    {
        let pools = source.list_pools().await?;
        for item in &pools {
            let pool = source.pool(&item.poolid).await?;
            sink.add_group(&item.poolid);
            for member in pool.member_names() {
                if sink.get_host(member).is_none() {
                    debug!(pool = %item.poolid, member, "Pool member not in inventory");
                    continue;
                }
                sink.add_child(&item.poolid, member)?;
            }
        }
        Ok(pools.len())
    }
}

impl Default for DiscoveryService {
    fn default() -> Self {
        Self::new(DiscoveryOptions::default())
    }
}

/// Turns an unreachable-node error into `None`; every other error stays fatal.
fn skip_unavailable<T>(node: &str, result: ProxmoxResult<T>) -> ProxmoxResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_node_unavailable() => {
            warn!(node, error = %e, "Node unavailable, skipping");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
