//! End-to-end tests for appdesc
//!
//! These tests verify, against a local HTTP server:
//! - Descriptor generation from a template (Okapi and flat catalog registries)
//! - Artifact existence gating
//! - Updating a generated descriptor read back from disk

use appdesc::config::Config;
use appdesc::descriptor::{read_descriptor, read_template, write_descriptor};
use appdesc::domain::{ChangeKind, ModuleType};
use appdesc::error::ErrorKind;
use appdesc::output::{JsonFormatter, ReportFormatter, Verbosity};
use appdesc::update::{ModuleChange, UpdateFlags, UpdateRequest};
use reqwest::Url;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

type Route = dyn Fn(&Url) -> (u16, String) + Send + Sync;

/// Answers every request by calling `route` with the request URL
async fn start_server(route: Arc<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let origin = base.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let route = Arc::clone(&route);
            let origin = origin.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let target = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                let url = Url::parse(&format!("{}{}", origin, target)).unwrap();
                let (status, body) = route(&url);
                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    base
}

fn ids(ids: &[&str]) -> String {
    Value::from(ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>()).to_string()
}

/// Okapi listing and descriptors, a flat UI catalog, and artifact registries
fn platform_route(url: &Url) -> (u16, String) {
    let path = url.path();
    let filter = url
        .query_pairs()
        .find(|(key, _)| key == "filter")
        .map(|(_, value)| value.to_string());

    if path == "/_/proxy/modules" {
        return match filter.as_deref() {
            Some("mod-users") => (
                200,
                ids(&[
                    "mod-users-19.2.0-SNAPSHOT.300",
                    "mod-users-19.1.0",
                    "mod-users-19.0.0",
                    "mod-users-bl-20.0.0",
                ]),
            ),
            Some("mod-notes") => (200, ids(&["mod-notes-5.0.0"])),
            _ => (200, "[]".to_string()),
        };
    }
    if let Some(id) = path.strip_prefix("/_/proxy/modules/") {
        return (200, json!({ "id": id, "provides": [] }).to_string());
    }
    if path == "/catalog" {
        return (
            200,
            json!(["folio_users-8.1.0", { "id": "folio_users-8.2.0" }, "folio_inventory-11.0.0"])
                .to_string(),
        );
    }
    if let Some(id) = path.strip_prefix("/catalog/") {
        return (200, json!({ "id": id }).to_string());
    }
    if let Some(rest) = path.strip_prefix("/v2/namespaces/folioorg/repositories/") {
        return match rest {
            "mod-users/tags/19.1.0" => (404, "{}".to_string()),
            _ => (200, json!({ "name": "tag" }).to_string()),
        };
    }
    if path == "/@folio/users" {
        return (
            200,
            json!({ "name": "@folio/users", "versions": { "8.1.0": {}, "8.2.0": {} } }).to_string(),
        );
    }
    (404, "{}".to_string())
}

fn config(base: &str, validate_artifacts: bool) -> Config {
    let content = format!(
        r#"
[http]
timeout_secs = 5
max_retries = 1
base_delay_ms = 1

[resolution]
validate_artifacts = {validate_artifacts}

[[module_registries.be.primary]]
type = "okapi"
url = "{base}"

[[module_registries.ui.primary]]
type = "simple"
url = "{base}/catalog"

[[artifact_registries.be.release]]
type = "container"
baseUrl = "{base}"
namespace = "folioorg"

[[artifact_registries.ui.release]]
type = "package"
baseUrl = "{base}"
namespace = "folio"
"#
    );
    Config::from_toml_str(&content).unwrap()
}

const TEMPLATE: &str = r#"{
  "name": "app-platform",
  "version": "1.0.0",
  "modules": [
    { "name": "mod-users", "version": "^19.0.0", "preRelease": false },
    { "name": "mod-notes", "version": "latest" }
  ],
  "uiModules": [ { "name": "folio_users", "version": "~8.1.0" } ],
  "dependencies": [ { "name": "app-core", "version": "^1.0.0" } ]
}"#;

#[tokio::test]
async fn test_generate_then_update() {
    let base = start_server(Arc::new(platform_route)).await;
    let components = config(&base, false).build(CancellationToken::new()).unwrap();

    let temp_dir = tempfile::tempdir().unwrap();
    let template_path = temp_dir.path().join("template.json");
    fs::write(&template_path, TEMPLATE).unwrap();
    let template = read_template(&template_path).unwrap();

    let descriptor = components.generator().generate(&template).await.unwrap();
    assert_eq!(descriptor.id, "app-platform-1.0.0");
    let module_ids: Vec<_> = descriptor.modules.iter().map(|m| m.id()).collect();
    assert_eq!(module_ids, vec!["mod-users-19.1.0", "mod-notes-5.0.0"]);
    assert_eq!(descriptor.ui_modules[0].id(), "folio_users-8.1.0");
    assert_eq!(
        descriptor.ui_modules[0].url(),
        Some(format!("{}/catalog/folio_users-8.1.0", base).as_str())
    );
    assert_eq!(descriptor.module_descriptors[0]["id"], "mod-users-19.1.0");
    assert_eq!(descriptor.dependencies[0].name, "app-core");

    let descriptor_path = temp_dir.path().join("app-platform.json");
    write_descriptor(&descriptor_path, &descriptor).unwrap();
    let current = read_descriptor(&descriptor_path).unwrap();

    let request = UpdateRequest::new()
        .with_change(ModuleType::Be, ModuleChange::new("mod-notes", "5.1.0"))
        .with_change(ModuleType::Ui, ModuleChange::new("folio_users", "latest"));
    let outcome = components
        .update_engine(UpdateFlags::new())
        .update(&current, &request)
        .await
        .unwrap();

    let updated = &outcome.descriptor;
    assert_eq!(updated.id, "app-platform-1.0.1");
    assert_eq!(updated.modules[1].id(), "mod-notes-5.1.0");
    assert_eq!(updated.module_descriptors[1]["id"], "mod-notes-5.1.0");
    assert_eq!(updated.ui_modules[0].id(), "folio_users-8.2.0");
    assert_eq!(updated.ui_module_descriptors[0]["id"], "folio_users-8.2.0");
    assert_eq!(current.id, "app-platform-1.0.0");

    let report = &outcome.report;
    assert_eq!(report.modules.names(ChangeKind::Upgraded), vec!["mod-notes"]);
    assert_eq!(report.ui_modules.names(ChangeKind::Upgraded), vec!["folio_users"]);

    let mut buf = Vec::new();
    JsonFormatter::new(Verbosity::Normal)
        .format_report(report, &mut buf)
        .unwrap();
    let rendered: Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(rendered["applicationId"], "app-platform-1.0.1");
}

#[tokio::test]
async fn test_artifact_gate_skips_unpublished_versions() {
    let base = start_server(Arc::new(platform_route)).await;
    let components = config(&base, true).build(CancellationToken::new()).unwrap();
    let template = serde_json::from_str(TEMPLATE).unwrap();

    let descriptor = components.generator().generate(&template).await.unwrap();
    assert_eq!(descriptor.modules[0].id(), "mod-users-19.0.0");
    assert_eq!(descriptor.ui_modules[0].id(), "folio_users-8.1.0");
}

#[tokio::test]
async fn test_update_rejects_downgrade_over_http() {
    let base = start_server(Arc::new(platform_route)).await;
    let components = config(&base, false).build(CancellationToken::new()).unwrap();
    let template = serde_json::from_str(TEMPLATE).unwrap();
    let current = components.generator().generate(&template).await.unwrap();

    let request =
        UpdateRequest::new().with_change(ModuleType::Be, ModuleChange::new("mod-users", "19.0.0"));
    let err = components
        .update_engine(UpdateFlags::new())
        .update(&current, &request)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationFailed);
    assert_eq!(err.details[0].artifact_id.as_deref(), Some("mod-users-19.1.0"));
}

#[tokio::test]
async fn test_missing_module_reports_not_found() {
    let base = start_server(Arc::new(platform_route)).await;
    let components = config(&base, false).build(CancellationToken::new()).unwrap();
    let mut template: appdesc::domain::ApplicationTemplate =
        serde_json::from_str(TEMPLATE).unwrap();
    template.modules.push(appdesc::domain::Dependency::new("mod-absent", "^1.0.0"));
    template.ui_modules.push(appdesc::domain::Dependency::new("folio_absent", "latest"));

    let err = components.generator().generate(&template).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModuleNotFound);
    assert_eq!(err.details.len(), 2);
}

#[tokio::test]
async fn test_unreachable_registry_is_infrastructure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let components = config(&base, false).build(CancellationToken::new()).unwrap();
    let template = serde_json::from_str(TEMPLATE).unwrap();
    let err = components.generator().generate(&template).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Infrastructure);
}
