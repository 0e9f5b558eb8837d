//! Integration Tests for the Component Runtime
//!
//! These tests drive signals, patching, components and the registration
//! bridge together through the public API.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use stone_core::component::{
    create, use_events, ComponentDefinition, ComponentInstance, ComponentOptions, EventBinding,
    Props, StateSource, TagName,
};
use stone_core::dom::{parse_element, Document, Node};
use stone_core::patch::{patch, PatchKind, PatchOptions};
use stone_core::reactive::{run_microtasks, use_rerender, Signal, State};
use stone_core::registry::{initialize_components, load_page, ComponentRegistry, RenderScope};

#[derive(Serialize)]
struct Count {
    count: i64,
}

/// Counter whose button increments `count`. Once the count reaches two an
/// extra paragraph appears, which forces a structural pass.
fn counter() -> ComponentDefinition {
    create(
        "counter",
        ComponentOptions::new()
            .state(StateSource::from_static(Count { count: 0 }))
            .render(|state, _props, _children| {
                let count = state.get_as::<i64>("count").unwrap_or_default();
                let many = if count >= 2 { "<p>many</p>" } else { "" };
                format!(r#"<span data-watch>{count}</span><input data-watch value="{count}" /><button>+</button>{many}"#)
            })
            .client(|_node, state| {
                let signals = state.watchers();
                use_rerender(&signals).ok()?;

                let state = state.clone();
                let click = EventBinding::click("button", move |_, _| {
                    state.update("count", |value| (value.as_i64().unwrap_or_default() + 1).into());
                })
                .ok()?;
                use_events(vec![click]).ok()?;
                None
            }),
    )
}

fn mounted_counter(document: &Document) -> Node {
    document
        .load(r#"<s-counter><span data-watch>0</span><input data-watch value="0" /><button>+</button></s-counter>"#)
        .unwrap();
    counter().module(document).unwrap();
    document.elements_by_tag("s-counter").remove(0)
}

fn button(root: &Node) -> Node {
    root.query_selector("button").unwrap().unwrap()
}

/// Several writes in one turn reach an effect once, with the last value.
#[test]
fn batched_writes_notify_once() {
    let signal = Signal::new(0i64);
    let runs = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(-1i64));

    let (runs_sink, seen_sink) = (runs.clone(), seen.clone());
    signal.effect(move |value| {
        runs_sink.set(runs_sink.get() + 1);
        seen_sink.set(*value);
    });

    for _ in 0..3 {
        signal.update(|n| n + 1);
    }
    assert_eq!(runs.get(), 0);

    run_microtasks();
    assert_eq!(runs.get(), 1);
    assert_eq!(seen.get(), 3);
}

#[test]
fn marked_span_patch_is_template_aware_and_idempotent() {
    let root = parse_element("<s-counter><span data-watch>0</span><button>+</button></s-counter>").unwrap();
    let next = "<s-counter><span data-watch>1</span><button>+</button></s-counter>";

    let first = patch(&root, next, &PatchOptions::default()).unwrap();
    assert_eq!(first.kind, PatchKind::TemplateAware);
    assert_eq!(first.changes, 1);

    let second = patch(&root, next, &PatchOptions::default()).unwrap();
    assert_eq!(second.kind, PatchKind::None);
    assert_eq!(second.changes, 0);
    assert_eq!(root.outer_html(), next);
}

#[test]
fn new_children_escalate_to_structure() {
    let root = parse_element("<ul><li>a</li></ul>").unwrap();
    let result = patch(&root, "<ul><li>a</li><li>b</li></ul>", &PatchOptions::default()).unwrap();

    assert_eq!(result.kind, PatchKind::Structure);
    assert_eq!(root.child_count(), 2);
}

#[test]
fn delegated_click_survives_every_tier() {
    let document = Document::new();
    let root = mounted_counter(&document);

    button(&root).dispatch_event("click");
    run_microtasks();
    assert_eq!(root.first_element_child().unwrap().text_content(), "1");

    let context = document
        .with_instance(&root, |instance: &ComponentInstance| instance.context().cloned())
        .flatten()
        .unwrap();
    assert_eq!(context.last_result().unwrap().kind, PatchKind::TemplateAware);

    // Second click adds a paragraph.
    button(&root).dispatch_event("click");
    run_microtasks();
    assert_eq!(context.last_result().unwrap().kind, PatchKind::Structure);
    assert!(root.query_selector("p").unwrap().is_some());

    button(&root).dispatch_event("click");
    run_microtasks();
    assert_eq!(root.first_element_child().unwrap().text_content(), "3");
    assert_eq!(context.pass_count(), 3);
}

#[test]
fn focus_survives_rerender() {
    let document = Document::new();
    let root = mounted_counter(&document);
    let input = root.query_selector("input").unwrap().unwrap();
    assert!(document.focus(&input));

    button(&root).dispatch_event("click");
    run_microtasks();
    assert_eq!(input.attribute("value").as_deref(), Some("1"));
    assert!(document.active_element().unwrap().ptr_eq(&input));

    button(&root).dispatch_event("click");
    run_microtasks();
    assert!(root.query_selector("p").unwrap().is_some());
    assert!(document.active_element().unwrap().ptr_eq(&input));
}

#[test]
fn removed_component_stops_patching() {
    let document = Document::new();
    let root = mounted_counter(&document);
    let state: State = document
        .with_instance(&root, |instance: &ComponentInstance| instance.state().clone())
        .unwrap();

    document.remove(&root);
    state.set("count", 7);
    run_microtasks();

    assert_eq!(root.first_element_child().unwrap().text_content(), "0");
}

#[test]
fn short_names_get_the_prefix() {
    assert_eq!(TagName::normalize("card").as_str(), "s-card");
    assert_eq!(create("card", ComponentOptions::new()).name().as_str(), "s-card");
    assert_eq!(TagName::normalize("user-card").as_str(), "user-card");
}

#[tokio::test]
async fn server_render_then_client_hydration() {
    // Server
    let definition = counter();
    let mut scope = RenderScope::new();
    let body = definition.render(&mut scope, &Props::new(), ()).unwrap();
    let page = scope.finish(&format!("<html><head></head><body><main>{body}</main></body></html>"));
    assert!(page.contains(r#"{"componentsToRegister":["s-counter"]}"#));

    // Client
    let document = Document::new();
    let payload = load_page(&document, &page).unwrap().unwrap();
    assert_eq!(payload.names(), ["s-counter".to_string()]);

    let mut registry = ComponentRegistry::new();
    registry.register_definition(definition);
    let report = initialize_components(&document, &registry).await;
    assert_eq!(report.activated, vec!["s-counter"]);
    assert_eq!(report.upgraded, 1);

    let root = document.elements_by_tag("s-counter").remove(0);
    button(&root).dispatch_event("click");
    run_microtasks();
    assert_eq!(root.first_element_child().unwrap().text_content(), "1");
}

#[test]
fn server_scopes_do_not_share_state() {
    let definition = counter();
    let mut first = RenderScope::new();
    let mut second = RenderScope::new();
    definition.render(&mut first, &Props::new(), ()).unwrap();
    definition.render(&mut second, &Props::new(), ()).unwrap();

    first.state_of("s-counter").unwrap().set("count", 4);
    let html = definition.render(&mut second, &Props::new(), ()).unwrap();
    assert!(html.contains("<span data-watch>0</span>"));

    let html = definition.render(&mut first, &Props::new(), ()).unwrap();
    assert!(html.contains("<span data-watch>4</span>"));
}

#[test]
fn events_outside_the_root_are_ignored() {
    let document = Document::new();
    document
        .load(r#"<button id="outside">x</button><s-counter><span data-watch>0</span><input data-watch value="0" /><button>+</button></s-counter>"#)
        .unwrap();
    counter().module(&document).unwrap();

    let outside = document.query_selector("#outside").unwrap().unwrap();
    outside.dispatch_event("click");
    run_microtasks();

    let root = document.elements_by_tag("s-counter").remove(0);
    assert_eq!(root.first_element_child().unwrap().text_content(), "0");
}
