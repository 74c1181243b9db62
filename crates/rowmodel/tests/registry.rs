use pretty_assertions::assert_eq;
use rowmodel::schema::Property;
use rowmodel::{Domain, Registry, Type};
use std::rc::Rc;

fn domain(id: &str) -> Domain {
    let mut domain = Domain::new(id);
    domain
        .define(
            "dept",
            [
                Property::primary_key("deptno", Type::I32),
                Property::column("dname", Type::String),
            ],
        )
        .unwrap();
    domain
}

#[test]
fn register_and_get() {
    let mut registry = Registry::new();
    let scott = registry.register(domain("scott")).unwrap();

    assert!(registry.contains("scott"));
    assert!(Rc::ptr_eq(&registry.get("scott").unwrap(), &scott));

    let dept = registry.entity("scott", "dept").unwrap();
    assert_eq!(dept.entity_id(), "dept");
    assert!(Rc::ptr_eq(dept.domain(), &scott));
}

#[test]
fn domains_register_once() {
    let mut registry = Registry::new();
    registry.register(domain("scott")).unwrap();

    let err = registry.register(domain("scott")).unwrap_err();
    assert!(err.is_invalid_definition());
    assert_eq!(
        err.to_string(),
        "invalid entity definition: domain `scott` has already been registered"
    );
}

#[test]
fn unknown_ids() {
    let mut registry = Registry::new();
    registry.register(domain("scott")).unwrap();

    let err = registry.get("hr").unwrap_err();
    assert!(err.is_lookup());
    assert_eq!(err.to_string(), "unknown domain `hr`");

    let err = registry.entity("hr", "dept").unwrap_err();
    assert!(err.is_lookup());

    let err = registry.entity("scott", "emp").unwrap_err();
    assert_eq!(err.to_string(), "unknown entity `emp`");
}

#[test]
fn unregistered_domains_live_on_in_entities() {
    let mut registry = Registry::new();
    registry.register(domain("scott")).unwrap();
    let mut dept = registry.entity("scott", "dept").unwrap();

    let scott = registry.unregister("scott").unwrap();
    assert!(!registry.contains("scott"));
    assert!(registry.unregister("scott").is_none());
    assert!(Rc::ptr_eq(dept.domain(), &scott));

    dept.put("deptno", 10).unwrap();
    assert_eq!(dept.to_string(), "dept: deptno:10");
}

#[test]
fn domains_in_registration_order() {
    let mut registry = Registry::new();
    for id in ["scott", "hr", "sales"] {
        registry.register(domain(id)).unwrap();
    }
    registry.unregister("hr");

    let ids: Vec<_> = registry.domains().map(|domain| domain.id().to_string()).collect();
    assert_eq!(ids, ["scott", "sales"]);

    registry.clear();
    assert_eq!(registry.domains().len(), 0);
    assert!(!registry.contains("scott"));
}
