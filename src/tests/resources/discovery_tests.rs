use super::{create_test_client, mount_get, mount_login, mount_status};
use crate::{DiscoveryService, Inventory, ProxmoxError};
use serde_json::json;
use wiremock::MockServer;

/// One modern node running `web1` (no agent, no description) next to a template.
async fn mount_single_vm_cluster(mock_server: &MockServer) {
    mount_login(mock_server).await;
    mount_get(mock_server, "nodes", json!([{"node": "pve1", "status": "online"}])).await;
    mount_get(mock_server, "version", json!({"version": "8.2.4", "release": "8.2"})).await;
    mount_get(
        mock_server,
        "nodes/pve1/qemu",
        json!([
            {"vmid": 100, "name": "web1", "status": "running"},
            {"vmid": 9000, "name": "tmpl1", "status": "stopped", "template": 1}
        ]),
    )
    .await;
    mount_get(mock_server, "nodes/pve1/lxc", json!([])).await;
    mount_get(mock_server, "nodes/pve1/qemu/100/config", json!({"cores": 2})).await;
    mount_status(
        mock_server,
        "nodes/pve1/qemu/100/agent/info",
        500,
        "QEMU guest agent is not running",
    )
    .await;
}

#[tokio::test]
async fn test_single_vm_without_agent() {
    let mock_server = MockServer::start().await;
    mount_single_vm_cluster(&mock_server).await;
    mount_get(&mock_server, "pools", json!([])).await;

    let client = create_test_client(&mock_server.uri());
    let mut inventory = Inventory::new();
    let report = DiscoveryService::default()
        .execute(&client, &mut inventory)
        .await
        .unwrap();

    assert_eq!(report.hosts, 1);
    assert!(report.nodes_skipped.is_empty());

    let document = inventory.to_ansible_json();
    assert_eq!(document["all"]["hosts"], json!(["web1"]));
    assert_eq!(document["running"]["hosts"], json!(["web1"]));
    assert_eq!(
        document["_meta"]["hostvars"]["web1"],
        json!({
            "proxmox_vmid": 100,
            "proxmox_name": "web1",
            "proxmox_status": "running",
            "proxmox_type": "qemu"
        })
    );
}

#[tokio::test]
async fn test_pool_group_excludes_templates() {
    let mock_server = MockServer::start().await;
    mount_single_vm_cluster(&mock_server).await;
    mount_get(&mock_server, "pools", json!([{"poolid": "prod"}])).await;
    mount_get(
        &mock_server,
        "pools/prod",
        json!({"members": [
            {"type": "qemu", "name": "web1", "vmid": 100},
            {"type": "qemu", "name": "tmpl1", "vmid": 9000, "template": 1}
        ]}),
    )
    .await;

    let client = create_test_client(&mock_server.uri());
    let mut inventory = Inventory::new();
    DiscoveryService::default()
        .execute(&client, &mut inventory)
        .await
        .unwrap();

    let document = inventory.to_ansible_json();
    assert_eq!(document["prod"]["hosts"], json!(["web1"]));
}

#[tokio::test]
async fn test_offline_node_is_left_out() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(
        &mock_server,
        "nodes",
        json!([{"node": "pve1", "status": "online"}, {"node": "pve2", "status": "offline"}]),
    )
    .await;
    mount_get(&mock_server, "version", json!({"version": "7.4-3"})).await;
    mount_get(&mock_server, "nodes/pve1/qemu", json!([])).await;
    mount_get(
        &mock_server,
        "nodes/pve1/lxc",
        json!([{"vmid": 200, "name": "db1", "type": "lxc", "status": "running"}]),
    )
    .await;
    mount_get(
        &mock_server,
        "nodes/pve1/lxc/200/config",
        json!({
            "description": "{\"groups\": [\"databases\"], \"backup\": true}",
            "net0": "name=eth0,bridge=vmbr0,ip=10.0.0.20/24,type=veth"
        }),
    )
    .await;
    mount_status(&mock_server, "nodes/pve2/qemu", 595, "No route to host").await;
    mount_get(&mock_server, "pools", json!([])).await;

    let client = create_test_client(&mock_server.uri());
    let mut inventory = Inventory::new();
    let report = DiscoveryService::default()
        .execute(&client, &mut inventory)
        .await
        .unwrap();

    assert_eq!(report.nodes_skipped, vec!["pve2".to_string()]);
    let document = inventory.to_ansible_json();
    assert_eq!(document["all"]["hosts"], json!(["db1"]));
    assert_eq!(document["databases"]["hosts"], json!(["db1"]));
    assert_eq!(document["running"]["hosts"], json!(["db1"]));

    let db1 = inventory.host_vars("db1");
    assert_eq!(db1["ansible_host"], json!("10.0.0.20"));
    assert_eq!(db1["backup"], json!(true));
    assert_eq!(db1["groups"], json!(["databases"]));
    assert_eq!(db1["proxmox_type"], json!("lxc"));
}

#[tokio::test]
async fn test_server_error_fails_the_run() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(&mock_server, "nodes", json!([{"node": "pve1"}])).await;
    mount_get(&mock_server, "version", json!({"version": "7.4-3"})).await;
    mount_status(&mock_server, "nodes/pve1/qemu", 500, "Internal error").await;

    let client = create_test_client(&mock_server.uri());
    let mut inventory = Inventory::new();
    let err = DiscoveryService::default()
        .execute(&client, &mut inventory)
        .await
        .unwrap_err();

    assert!(matches!(err, ProxmoxError::Http { status: 500, .. }));
}
