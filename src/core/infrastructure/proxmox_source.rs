//! HTTP implementation of the resource fetchers.

use crate::{
    ProxmoxClient, ProxmoxResult,
    core::domain::model::{
        agent::{AgentNetworkInterfaces, AgentOsInfo},
        guest::{Guest, GuestConfig, GuestKind},
        node_list_item::NodeListItem,
        pool::{Pool, PoolListItem},
        version::{ProxmoxVersion, VersionResponse},
    },
    inventory::domain::inventory_source::InventorySource,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[async_trait]
impl InventorySource for ProxmoxClient {
    async fn list_nodes(&self) -> ProxmoxResult<Vec<NodeListItem>> {
        self.api_client.get("nodes").await
    }

    async fn list_guests(&self, node: &str, kind: GuestKind) -> ProxmoxResult<Vec<Guest>> {
        self.api_client
            .get(&format!("nodes/{}/{}", node, kind))
            .await
    }

    async fn guest_config(
        &self,
        node: &str,
        vmid: &str,
        kind: GuestKind,
    ) -> ProxmoxResult<GuestConfig> {
        self.api_client
            .get(&format!("nodes/{}/{}/{}/config", node, kind, vmid))
            .await
    }

    async fn list_pools(&self) -> ProxmoxResult<Vec<PoolListItem>> {
        self.api_client.get("pools").await
    }

    async fn pool(&self, pool_id: &str) -> ProxmoxResult<Pool> {
        self.api_client.get(&format!("pools/{}", pool_id)).await
    }

    async fn agent_available(&self, node: &str, vmid: &str) -> ProxmoxResult<bool> {
        let path = format!("nodes/{}/qemu/{}/agent/info", node, vmid);
        match self.api_client.get::<Option<Value>>(&path).await {
            Ok(info) => Ok(info.is_some()),
            Err(e) if e.status().is_some() => {
                debug!(node, vmid, error = %e, "Guest agent not available");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn agent_os_info(&self, node: &str, vmid: &str) -> ProxmoxResult<AgentOsInfo> {
        let payload: Value = self
            .api_client
            .get(&format!("nodes/{}/qemu/{}/agent/get-osinfo", node, vmid))
            .await?;
        Ok(AgentOsInfo::from_payload(payload))
    }

    async fn agent_network_interfaces(
        &self,
        node: &str,
        vmid: &str,
    ) -> ProxmoxResult<Option<AgentNetworkInterfaces>> {
        let payload: Value = self
            .api_client
            .get(&format!(
                "nodes/{}/qemu/{}/agent/network-get-interfaces",
                node, vmid
            ))
            .await?;
        Ok(AgentNetworkInterfaces::from_payload(payload))
    }

    async fn version(&self) -> ProxmoxResult<ProxmoxVersion> {
        let response: VersionResponse = self.api_client.get("version").await?;
        Ok(ProxmoxVersion::try_from(&response)?)
    }
}
