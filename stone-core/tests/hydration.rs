//! Hydration Tests
//!
//! Client-side initialization against pages whose payload and registry do
//! not line up.

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

use stone_core::component::{create, ComponentOptions, StateSource};
use stone_core::dom::Document;
use stone_core::error::Error;
use stone_core::logging::RecentLogs;
use stone_core::registry::{initialize_components, load_page, ComponentModule, ComponentRegistry, HandoffPayload};
use stone_core::RuntimeConfig;

#[derive(Serialize)]
struct Gauge {
    level: i64,
}

fn gauge_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register_definition(create(
        "gauge",
        ComponentOptions::new().state(StateSource::from_static(Gauge { level: 0 })),
    ));
    registry
}

/// A payload naming an unregistered component is skipped with a warning.
#[tokio::test]
async fn unknown_component_is_reported_not_fatal() {
    let recent = RecentLogs::new(16);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(recent.clone()));

    let document = Document::new();
    document.load("<counter></counter><s-gauge></s-gauge>").unwrap();
    document.set_global("__STONE__", serde_json::json!(["counter"]));

    let report = initialize_components(&document, &gauge_registry()).await;

    assert_eq!(report.missing, vec!["counter"]);
    assert!(report.activated.is_empty());
    assert!(!document.is_defined("counter"));
    assert!(!document.is_defined("s-gauge"));
    assert_eq!(document.instance_count(), 0);

    let warnings = recent.at_level(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("tag=counter"));
}

#[tokio::test]
async fn failing_loader_is_logged_as_error() {
    let recent = RecentLogs::new(16);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(recent.clone()));

    let document = Document::new();
    HandoffPayload::new(vec!["s-chart".into(), "s-gauge".into()]).install(&document, "__STONE__");

    let mut registry = gauge_registry();
    registry.register("s-chart", || async {
        Err::<ComponentModule, _>(Error::ModuleLoad {
            name: "s-chart".into(),
            reason: "network error".into(),
        })
    });

    let report = initialize_components(&document, &registry).await;
    assert_eq!(report.activated, vec!["s-gauge"]);
    assert_eq!(report.failed[0].0, "s-chart");
    assert_eq!(recent.at_level(Level::ERROR).len(), 1);
}

#[tokio::test]
async fn payload_is_consumed_once() {
    let document = Document::new();
    document.load("<s-gauge></s-gauge>").unwrap();
    HandoffPayload::new(vec!["s-gauge".into()]).install(&document, "__STONE__");

    let registry = gauge_registry();
    let first = initialize_components(&document, &registry).await;
    let second = initialize_components(&document, &registry).await;

    assert_eq!(first.upgraded, 1);
    assert!(second.activated.is_empty());
    assert_eq!(document.instance_count(), 1);
}

#[tokio::test]
async fn custom_payload_global() {
    let config = RuntimeConfig {
        payload_global: "__APP__".to_string(),
        ..RuntimeConfig::default()
    };
    let document = Document::with_config(config);
    let page = concat!(
        "<body><s-gauge></s-gauge>",
        r#"<script type="module">window.__APP__ = {"componentsToRegister":["s-gauge"]};</script>"#,
        "</body>"
    );

    load_page(&document, page).unwrap();
    assert!(document.global("__STONE__").is_none());

    let report = initialize_components(&document, &gauge_registry()).await;
    assert_eq!(report.activated, vec!["s-gauge"]);
    assert!(document.global("__APP__").is_none());
}

#[tokio::test]
async fn later_elements_are_upgraded_on_connect() {
    let document = Document::new();
    HandoffPayload::new(vec!["s-gauge".into()]).install(&document, "__STONE__");
    initialize_components(&document, &gauge_registry()).await;
    assert_eq!(document.instance_count(), 0);

    document.load("<s-gauge></s-gauge>").unwrap();
    assert_eq!(document.instance_count(), 1);
}
