use crate::ProxmoxClient;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

mod discovery_tests;
mod fetcher_tests;

const TEST_COOKIE: &str = "PVEAuthCookie=PVE:apiuser@pve:4EEC61E2::sig";

fn create_test_client(server_url: &str) -> ProxmoxClient {
    ProxmoxClient::builder()
        .url(server_url)
        .credentials("apiuser@pve", "secure")
        .validate_certs(false)
        .build()
        .unwrap()
}

async fn mount_login(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api2/json/access/ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "ticket": "PVE:apiuser@pve:4EEC61E2::sig",
                "CSRFPreventionToken": "4EEC61E2:abc123",
                "username": "apiuser@pve"
            }
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

/// Serves `data` under `/api2/json/{endpoint}` for authenticated GETs.
async fn mount_get(mock_server: &MockServer, endpoint: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api2/json/{}", endpoint)))
        .and(header("Cookie", TEST_COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(mock_server)
        .await;
}

async fn mount_status(mock_server: &MockServer, endpoint: &str, status: u16, reason: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api2/json/{}", endpoint)))
        .respond_with(ResponseTemplate::new(status).set_body_string(reason))
        .mount(mock_server)
        .await;
}
