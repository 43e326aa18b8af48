use super::{create_test_client, mount_get, mount_login, mount_status};
use crate::{
    ApiGeneration, GuestKind, InventorySource, ProxmoxError,
    core::domain::model::node_list_item::node_names,
};
use serde_json::json;
use std::net::Ipv4Addr;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_list_nodes_and_version() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(
        &mock_server,
        "nodes",
        json!([
            {"node": "pve1", "status": "online", "id": "node/pve1"},
            {"node": "pve2", "status": "offline", "id": "node/pve2"}
        ]),
    )
    .await;
    mount_get(
        &mock_server,
        "version",
        json!({"version": "7.4-3", "release": "7.4", "repoid": "9002ab8a"}),
    )
    .await;

    let client = create_test_client(&mock_server.uri());
    assert!(!client.is_authenticated());

    let nodes = client.list_nodes().await.unwrap();
    assert_eq!(node_names(&nodes), vec!["pve1", "pve2"]);
    assert_eq!(nodes[1].status.as_deref(), Some("offline"));

    let version = client.version().await.unwrap();
    assert_eq!((version.major, version.minor), (7, 4));
    assert_eq!(version.generation(), ApiGeneration::Modern);

    assert!(client.is_authenticated());
    assert_eq!(
        client.auth_token().unwrap().as_str(),
        "PVE:apiuser@pve:4EEC61E2::sig"
    );
    assert_eq!(client.csrf_token().unwrap().as_str(), "4EEC61E2:abc123");
}

#[tokio::test]
async fn test_legacy_version() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(&mock_server, "version", json!({"version": "3.4-11"})).await;

    let client = create_test_client(&mock_server.uri());
    let version = client.version().await.unwrap();

    assert_eq!(version.generation(), ApiGeneration::Legacy);
    assert_eq!(version.generation().container_kind(), GuestKind::Openvz);
}

#[tokio::test]
async fn test_list_guests_uses_kind_path() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(
        &mock_server,
        "nodes/pve1/lxc",
        json!([
            {"vmid": "200", "name": "db1", "type": "lxc", "status": "running", "maxmem": 1073741824_u64}
        ]),
    )
    .await;

    let client = create_test_client(&mock_server.uri());
    let guests = client.list_guests("pve1", GuestKind::Lxc).await.unwrap();

    assert_eq!(guests.len(), 1);
    assert_eq!(guests[0].name(), Some("db1"));
    assert_eq!(guests[0].vmid().as_deref(), Some("200"));
    assert_eq!(guests[0].attributes()["maxmem"], json!(1073741824_u64));
}

#[tokio::test]
async fn test_guest_config() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(
        &mock_server,
        "nodes/pve1/lxc/200/config",
        json!({
            "hostname": "db1",
            "description": "Primary database\n",
            "net0": "name=eth0,bridge=vmbr0,hwaddr=AA:BB:CC:DD:EE:FF,ip=10.0.0.20/24,type=veth"
        }),
    )
    .await;

    let client = create_test_client(&mock_server.uri());
    let config = client
        .guest_config("pve1", "200", GuestKind::Lxc)
        .await
        .unwrap();

    assert_eq!(config.description(), Some("Primary database\n"));
    assert_eq!(config.net0_ipv4(), Some(Ipv4Addr::new(10, 0, 0, 20)));
}

#[tokio::test]
async fn test_unreachable_node_keeps_status() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_status(&mock_server, "nodes/pve2/qemu", 595, "No route to host").await;

    let client = create_test_client(&mock_server.uri());
    let err = client
        .list_guests("pve2", GuestKind::Qemu)
        .await
        .unwrap_err();

    assert!(err.is_node_unavailable());
    assert!(matches!(err, ProxmoxError::Http { status: 595, .. }));
}

#[tokio::test]
async fn test_agent_availability() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(
        &mock_server,
        "nodes/pve1/qemu/100/agent/info",
        json!({"result": {"version": "7.2.0", "supported_commands": []}}),
    )
    .await;
    mount_status(
        &mock_server,
        "nodes/pve1/qemu/101/agent/info",
        500,
        "QEMU guest agent is not running",
    )
    .await;
    mount_get(&mock_server, "nodes/pve1/qemu/102/agent/info", json!(null)).await;

    let client = create_test_client(&mock_server.uri());

    assert!(client.agent_available("pve1", "100").await.unwrap());
    assert!(!client.agent_available("pve1", "101").await.unwrap());
    assert!(!client.agent_available("pve1", "102").await.unwrap());
}

#[tokio::test]
async fn test_agent_probes() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(
        &mock_server,
        "nodes/pve1/qemu/100/agent/get-osinfo",
        json!({"result": {"id": "ubuntu", "name": "Ubuntu", "kernel-release": "5.15.0-91-generic"}}),
    )
    .await;
    mount_get(
        &mock_server,
        "nodes/pve1/qemu/100/agent/network-get-interfaces",
        json!({"result": [
            {"name": "lo", "ip-addresses": [{"ip-address": "127.0.0.1", "ip-address-type": "ipv4"}]},
            {"name": "ens18", "ip-addresses": [
                {"ip-address": "10.0.0.5", "ip-address-type": "ipv4", "prefix": 24},
                {"ip-address": "fe80::be24:11ff:fe5c:1", "ip-address-type": "ipv6", "prefix": 64}
            ]}
        ]}),
    )
    .await;

    let client = create_test_client(&mock_server.uri());

    let os_info = client.agent_os_info("pve1", "100").await.unwrap();
    assert_eq!(os_info.id.as_deref(), Some("ubuntu"));
    assert_eq!(os_info.kernel_release.as_deref(), Some("5.15.0-91-generic"));

    let interfaces = client
        .agent_network_interfaces("pve1", "100")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(interfaces.primary_ipv4(), Some(Ipv4Addr::new(10, 0, 0, 5)));
}

#[tokio::test]
async fn test_pools() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_get(
        &mock_server,
        "pools",
        json!([{"poolid": "prod", "comment": "Production"}, {"poolid": "lab"}]),
    )
    .await;
    mount_get(
        &mock_server,
        "pools/prod",
        json!({
            "comment": "Production",
            "members": [
                {"type": "qemu", "name": "web1", "vmid": 100, "node": "pve1", "id": "qemu/100"},
                {"type": "qemu", "name": "tmpl1", "vmid": 9000, "template": 1, "id": "qemu/9000"},
                {"type": "storage", "storage": "local", "node": "pve1", "id": "storage/pve1/local"}
            ]
        }),
    )
    .await;

    let client = create_test_client(&mock_server.uri());

    let pools = client.list_pools().await.unwrap();
    assert_eq!(pools.len(), 2);
    assert_eq!(pools[0].poolid, "prod");
    assert_eq!(pools[1].comment, None);

    let pool = client.pool("prod").await.unwrap();
    assert_eq!(pool.members.len(), 3);
    assert_eq!(pool.member_names(), vec!["web1"]);
}

#[tokio::test]
async fn test_rejected_login_surfaces_on_first_read() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api2/json/access/ticket"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client.list_nodes().await.unwrap_err();

    assert!(matches!(err, ProxmoxError::Authentication(_)));
    assert!(!client.is_authenticated());
}
