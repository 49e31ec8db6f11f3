//! Integration tests for the controller macros.
//!
//! These tests expand real controllers and drive them through the route
//! compiler and the argument resolver, the same path a request takes.

use std::sync::atomic::{AtomicI64, Ordering};

use heron_core::meta::{ParamBinding, ParamKind};
use heron_core::{
    compile, Arguments, CompileOptions, Component, ConfigurationError, HandlerError,
    LinkedComponents, Registry, Reply, ResponseEntity, RouteTable,
};
use heron_core::{DiscoverySource, Verb};
use heron_macros::{component, controller};
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
struct NewItem {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    id: i64,
    name: String,
}

#[derive(Default)]
struct ItemController {
    next_id: AtomicI64,
}

#[controller(path = "/items")]
impl ItemController {
    #[get]
    fn list(&self) -> &'static str {
        "all items"
    }

    #[get("/{id}")]
    fn show(&self, #[path_variable] id: i64) -> String {
        format!("item {id}")
    }

    #[post]
    fn create(&self, #[request_body] item: NewItem) -> ResponseEntity<Item> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        ResponseEntity::created(Item { id, name: item.name }).header("X-Trace", "abc")
    }

    #[request_mapping(method = "PATCH", path = "/{id}/name/{name}")]
    fn rename(
        &self,
        #[path_variable("id")] item_id: i32,
        #[path_variable] name: String,
        note: Option<String>,
    ) -> Result<String, HandlerError> {
        if name == "forbidden" {
            return Err(HandlerError::new("name not allowed"));
        }
        Ok(format!("{item_id} -> {name} ({note:?})"))
    }

    #[delete("/{flag}")]
    fn toggle(&self, #[path_variable] flag: bool) -> bool {
        !flag
    }

    fn helper(&self) -> i64 {
        self.next_id.load(Ordering::SeqCst)
    }
}

fn compiled<T: Component + Default>() -> RouteTable {
    let mut registry = Registry::new();
    registry.register::<T>();
    compile(&registry, CompileOptions::default()).unwrap()
}

fn call(table: &RouteTable, verb: Verb, path: &str, body: &[u8]) -> Result<Reply, HandlerError> {
    let found = table.match_route(verb, path).expect("route should match");
    let args = heron_extract::resolve(found.target().method(), &found.params, body)?;
    found.target().invoke(args)
}

#[test]
fn test_descriptor_is_generated() {
    let descriptor = ItemController::descriptor();
    assert_eq!(descriptor.name(), "ItemController");
    assert!(descriptor.is_controller());
    assert_eq!(descriptor.path(), "/items");

    let names: Vec<_> = descriptor.methods().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["list", "show", "create", "rename", "toggle"]);

    let rename = &descriptor.methods()[3];
    assert_eq!(rename.mappings()[0].verb(), Verb::Patch);
    assert_eq!(rename.params()[0].variable_name(), Some("id"));
    assert_eq!(rename.params()[0].kind(), &ParamKind::Int32);
    assert_eq!(rename.params()[2].binding(), &ParamBinding::Unbound);
}

#[test]
fn test_routes_compile() {
    let table = compiled::<ItemController>();
    let routes: Vec<_> = table
        .iter()
        .map(|r| format!("{} {}", r.verb(), r.template()))
        .collect();
    assert_eq!(
        routes,
        [
            "GET /items",
            "GET /items/{id}",
            "POST /items",
            "PATCH /items/{id}/name/{name}",
            "DELETE /items/{flag}",
        ]
    );
}

#[test]
fn test_text_handlers() {
    let table = compiled::<ItemController>();
    assert_eq!(
        call(&table, Verb::Get, "/items", b"").unwrap(),
        Reply::Text("all items".to_string())
    );
    assert_eq!(
        call(&table, Verb::Get, "/items/42", b"").unwrap(),
        Reply::Text("item 42".to_string())
    );
    assert_eq!(
        call(&table, Verb::Delete, "/items/true", b"").unwrap(),
        Reply::Text("false".to_string())
    );
}

#[test]
fn test_named_path_variable_and_unbound_param() {
    let table = compiled::<ItemController>();
    assert_eq!(
        call(&table, Verb::Patch, "/items/7/name/lamp", b"").unwrap(),
        Reply::Text("7 -> lamp (None)".to_string())
    );
}

#[test]
fn test_entity_handler() {
    let table = compiled::<ItemController>();
    let reply = call(&table, Verb::Post, "/items", br#"{"name":"lamp","extra":1}"#).unwrap();

    let Reply::Entity {
        status,
        headers,
        body,
    } = reply
    else {
        panic!("expected an entity reply");
    };
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers.get("x-trace").unwrap(), "abc");
    let item: Item = serde_json::from_slice(&body.unwrap()).unwrap();
    assert_eq!(
        item,
        Item {
            id: 1,
            name: "lamp".to_string(),
        }
    );
}

#[test]
fn test_handler_error_propagates() {
    let table = compiled::<ItemController>();
    let err = call(&table, Verb::Patch, "/items/7/name/forbidden", b"").unwrap_err();
    assert_eq!(err.message(), "name not allowed");
}

#[test]
fn test_conversion_error_propagates() {
    let table = compiled::<ItemController>();
    assert!(call(&table, Verb::Get, "/items/abc", b"").is_err());
    assert!(call(&table, Verb::Delete, "/items/TRUE", b"").is_err());
}

#[test]
fn test_unmapped_methods_stay_callable() {
    let controller = ItemController::default();
    assert_eq!(controller.helper(), 0);
}

#[test]
fn test_unknown_method_name() {
    let controller = ItemController::default();
    let err = controller.invoke("missing", Arguments::default()).unwrap_err();
    assert!(err.message().contains("missing"));
}

#[derive(Default)]
struct ConflictController;

#[controller]
impl ConflictController {
    #[get("/x")]
    #[post("/x")]
    fn both(&self) -> String {
        String::new()
    }
}

#[test]
fn test_conflicting_markers_fail_compilation() {
    let mut registry = Registry::new();
    registry.register::<ConflictController>();
    let err = compile(&registry, CompileOptions::default()).unwrap_err();
    assert!(matches!(err, ConfigurationError::ConflictingMappings { ref markers, .. }
        if markers == &["get".to_string(), "post".to_string()]));
}

#[derive(Default)]
struct MismatchController;

#[controller(path = "/m")]
impl MismatchController {
    #[get("/{id}")]
    fn show(&self, #[path_variable] key: String) -> String {
        key
    }
}

#[test]
fn test_variable_mismatch_fails_compilation() {
    let mut registry = Registry::new();
    registry.register::<MismatchController>();
    let err = compile(&registry, CompileOptions::default()).unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownPathVariable { ref name, .. } if name == "key"));
}

#[derive(Default)]
struct Greeter;

#[component(scan)]
impl Greeter {}

#[derive(Default)]
struct ScannedController;

#[controller(path = "/scanned", scan)]
impl ScannedController {
    #[get]
    fn index(&self) -> String {
        "scanned".to_string()
    }
}

#[test]
fn test_scan_registers_linked_components() {
    let mut registry = Registry::new();
    LinkedComponents.populate(&mut registry);

    assert!(registry.contains::<Greeter>());
    assert!(registry.contains::<ScannedController>());
    assert!(!registry.contains::<ItemController>());

    let table = compile(&registry, CompileOptions::default()).unwrap();
    assert_eq!(
        call(&table, Verb::Get, "/scanned", b"").unwrap(),
        Reply::Text("scanned".to_string())
    );
}

#[test]
fn test_plain_component_descriptor() {
    let descriptor = Greeter::descriptor();
    assert!(!descriptor.is_controller());
    assert!(descriptor.methods().is_empty());
}
