//! The read-only view of the controller that discovery consumes.

use crate::{
    ProxmoxResult,
    core::domain::model::{
        agent::{AgentNetworkInterfaces, AgentOsInfo},
        guest::{Guest, GuestConfig, GuestKind},
        node_list_item::NodeListItem,
        pool::{Pool, PoolListItem},
        version::ProxmoxVersion,
    },
};
use async_trait::async_trait;

/// Typed fetchers over the controller's REST surface.
///
/// [`crate::ProxmoxClient`] implements this over HTTP. The discovery service
/// only talks to this trait, so it can be driven by any other source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// `GET nodes`
    async fn list_nodes(&self) -> ProxmoxResult<Vec<NodeListItem>>;

    /// `GET nodes/{node}/{kind}`
    async fn list_guests(&self, node: &str, kind: GuestKind) -> ProxmoxResult<Vec<Guest>>;

    /// `GET nodes/{node}/{kind}/{vmid}/config`
    async fn guest_config(
        &self,
        node: &str,
        vmid: &str,
        kind: GuestKind,
    ) -> ProxmoxResult<GuestConfig>;

    /// `GET pools`
    async fn list_pools(&self) -> ProxmoxResult<Vec<PoolListItem>>;

    /// `GET pools/{poolid}`
    async fn pool(&self, pool_id: &str) -> ProxmoxResult<Pool>;

    /// `GET nodes/{node}/qemu/{vmid}/agent/info`
    ///
    /// Any HTTP error means the agent is not running; only transport and
    /// authentication failures are returned as errors.
    async fn agent_available(&self, node: &str, vmid: &str) -> ProxmoxResult<bool>;

    /// `GET nodes/{node}/qemu/{vmid}/agent/get-osinfo`
    async fn agent_os_info(&self, node: &str, vmid: &str) -> ProxmoxResult<AgentOsInfo>;

    /// `GET nodes/{node}/qemu/{vmid}/agent/network-get-interfaces`
    async fn agent_network_interfaces(
        &self,
        node: &str,
        vmid: &str,
    ) -> ProxmoxResult<Option<AgentNetworkInterfaces>>;

    /// `GET version`
    async fn version(&self) -> ProxmoxResult<ProxmoxVersion>;
}
