//! End-to-end composition scenarios through the public API

use std::sync::Arc;

use classkit::class::{ClassError, ErrorKind, Instance, Member};
use classkit::namespace::Resolved;
use classkit::{Declaration, Entry, Interface, Registry};
use serde_json::{json, Value};

fn returns(value: &'static str) -> impl Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> {
    move |_: &mut Instance, _: &[Value]| Ok(json!(value))
}

fn render(class: &Arc<classkit::ClassDef>) -> Value {
    let mut instance = class.instantiate(&[]).unwrap();
    instance.call("render", &[]).unwrap()
}

#[test]
fn test_round_trip_for_many_paths() {
    let mut registry = Registry::new();
    let paths = ["Top", "a.Thing", "a.b.Thing", "a.b.c.Deep", "x.y.Other"];

    for (i, path) in paths.iter().enumerate() {
        registry.assign(path, json!(i));
    }
    for (i, path) in paths.iter().enumerate() {
        assert_eq!(registry.resolve_entry(path), Some(Entry::Value(json!(i))));
    }
}

#[test]
fn test_common_prefix_not_duplicated() {
    let mut registry = Registry::new();
    registry.define_package("app.ui.widgets");
    registry.define_package("app.ui.layout");
    registry.assign("app.model.User", json!({}));

    let Some(Resolved::Package(app)) = registry.resolve("app") else {
        panic!("app should be a package");
    };
    let app = registry.package(app).unwrap();
    let children: Vec<_> = app.children().map(|(name, _)| name).collect();
    assert_eq!(children, vec!["model", "ui"]);

    let Some(Resolved::Package(ui)) = registry.resolve("app.ui") else {
        panic!("app.ui should be a package");
    };
    assert_eq!(registry.package(ui).unwrap().children().count(), 2);
    assert_eq!(registry.define_package("app.ui"), ui);
}

#[test]
fn test_private_member_conflict() {
    let mut registry = Registry::new();
    registry
        .declare_class("mix.Cache", Declaration::new().data("__x", json!(1)))
        .unwrap();
    registry
        .declare_class("mix.Store", Declaration::new().data("__x", json!(2)))
        .unwrap();

    let err = registry
        .declare_class(
            "app.Service",
            Declaration::new().include("mix.Cache").include("mix.Store"),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    let msg = err.to_string();
    assert!(msg.contains("mix.Cache"), "{}", msg);
    assert!(msg.contains("mix.Store"), "{}", msg);
    assert!(registry.class_by_name("app.Service").is_none());
}

#[test]
fn test_public_conflict_with_local_override() {
    let mut registry = Registry::new();
    registry
        .declare_class("mix.Html", Declaration::new().method("render", returns("html")))
        .unwrap();
    registry
        .declare_class("mix.Text", Declaration::new().method("render", returns("text")))
        .unwrap();

    let class = registry
        .declare_class(
            "app.Page",
            Declaration::new()
                .include("mix.Html")
                .include("mix.Text")
                .method("render", returns("page")),
        )
        .unwrap();

    assert_eq!(render(&class), json!("page"));
    assert_eq!(class.member_origin("render").as_deref(), Some("app.Page"));
}

#[test]
fn test_public_conflict_without_override() {
    let mut registry = Registry::new();
    registry
        .declare_class("mix.Html", Declaration::new().method("render", returns("html")))
        .unwrap();
    registry
        .declare_class("mix.Text", Declaration::new().method("render", returns("text")))
        .unwrap();

    let err = registry
        .declare_class(
            "app.Page",
            Declaration::new().include("mix.Html").include("mix.Text"),
        )
        .unwrap_err();
    assert!(matches!(err, ClassError::MemberConflict { ref key, .. } if key == "render"));
}

#[test]
fn test_grandparent_members_flattened() {
    let mut registry = Registry::new();
    registry
        .declare_class(
            "base.Node",
            Declaration::new()
                .method("render", returns("node"))
                .data("kind", json!("node"))
                .event("attached"),
        )
        .unwrap();
    registry
        .declare_class(
            "base.Element",
            Declaration::new()
                .include("base.Node")
                .method("render", returns("element")),
        )
        .unwrap();
    let button = registry
        .declare_class("ui.Button", Declaration::new().include("base.Element"))
        .unwrap();

    assert_eq!(render(&button), json!("element"));
    assert_eq!(button.member("kind").unwrap().as_data(), Some(&json!("node")));
    assert!(button.events().contains_key("attached"));

    let names: Vec<_> = button.includes().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["base.Element", "base.Node"]);
}

#[test]
fn test_interface_failure_names_type_and_interface() {
    let mut registry = Registry::new();
    let err = registry
        .declare_class(
            "ui.Icon",
            Declaration::new()
                .data("src", json!(""))
                .implements(Arc::new(Interface::new("ui.Renderable").method("render"))),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Interface);
    let msg = err.to_string();
    assert!(msg.contains("ui.Icon"), "{}", msg);
    assert!(msg.contains("ui.Renderable"), "{}", msg);
}

#[test]
fn test_seal_depends_on_mode() {
    let mut registry = Registry::new();
    let sealed = registry
        .declare_class("app.Sealed", Declaration::new().data("a", json!(1)))
        .unwrap();
    let err = sealed
        .define_member("b", Member::data(json!(2)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sealed);

    registry.set_strict(false);
    let open = registry
        .declare_class("app.Open", Declaration::new().data("a", json!(1)))
        .unwrap();
    open.define_member("b", Member::data(json!(2))).unwrap();
    assert!(open.has_member("b"));
}

#[test]
fn test_add_statics_on_unknown_path() {
    let mut registry = Registry::new();
    let err = registry
        .add_statics("never.Assigned", vec![("x".to_string(), Member::data(json!(1)))])
        .unwrap_err();
    assert!(err.to_string().contains("never.Assigned"));
}

#[test]
fn test_failed_declaration_leaves_no_trace() {
    let mut registry = Registry::new();
    registry
        .declare_class("mix.A", Declaration::new().event("done"))
        .unwrap();
    registry
        .declare_class("mix.B", Declaration::new().event("done"))
        .unwrap();

    let result = registry.declare_class(
        "app.Job",
        Declaration::new()
            .include("mix.A")
            .include("mix.B")
            .with_static("create", Member::data(json!(null))),
    );
    assert!(result.is_err());
    assert!(registry.resolve("app.Job").is_none());
    assert!(registry.statics("app.Job").is_none());
}

#[test]
fn test_classes_listing() {
    let mut registry = Registry::new();
    registry.declare_class("b.Second", Declaration::new()).unwrap();
    registry.declare_class("a.First", Declaration::new()).unwrap();
    registry.assign("c.Value", json!(1));

    let names: Vec<_> = registry
        .classes()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, vec!["a.First", "b.Second"]);
}
