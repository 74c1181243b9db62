use pretty_assertions::assert_eq;
use rowmodel_core::schema::{Domain, Property, Settings};
use rowmodel_core::{Entity, Type, Value};
use std::rc::Rc;

fn scott() -> Rc<Domain> {
    let mut domain = Domain::new("scott");
    domain
        .define(
            "dept",
            [
                Property::primary_key("deptno", Type::I32),
                Property::column("dname", Type::String),
                Property::column("loc", Type::String),
            ],
        )
        .unwrap();
    domain
        .define(
            "emp",
            [
                Property::primary_key("empno", Type::I32),
                Property::column("ename", Type::String),
                Property::foreign_key("dept_fk", "dept", [Property::column("deptno", Type::I32)]),
                Property::denormalized("dept_name", "dept_fk", "dname", Type::String),
                Property::denormalized("dept_loc", "dept_fk", "loc", Type::String),
                Property::foreign_key("mgr_fk", "emp", [Property::column("mgr", Type::I32)]),
            ],
        )
        .unwrap();
    domain
        .define(
            "location",
            [
                Property::primary_key("country", Type::String),
                Property::column("city", Type::String).primary_key_index(1),
            ],
        )
        .unwrap();
    domain
        .define(
            "office",
            [
                Property::primary_key("id", Type::I32),
                Property::column("country_code", Type::String).nullable(false),
                Property::foreign_key(
                    "location_fk",
                    "location",
                    [
                        Property::mirror("country_code"),
                        Property::column("city_name", Type::String).into(),
                    ],
                ),
            ],
        )
        .unwrap();
    Rc::new(domain)
}

fn dept(domain: &Rc<Domain>, deptno: i32, dname: &str, loc: &str) -> Entity {
    let mut dept = domain.entity("dept").unwrap();
    dept.put("deptno", deptno).unwrap();
    dept.put("dname", dname).unwrap();
    dept.put("loc", loc).unwrap();
    dept
}

fn location(domain: &Rc<Domain>, country: &str, city: &str) -> Entity {
    let mut location = domain.entity("location").unwrap();
    location.put("country", country).unwrap();
    location.put("city", city).unwrap();
    location
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

#[test]
fn reference_propagates_to_columns_and_denormalized() {
    let domain = scott();
    let accounting = dept(&domain, 10, "ACCOUNTING", "NEW YORK");
    let mut emp = domain.entity("emp").unwrap();
    emp.put("dept_fk", accounting.clone()).unwrap();

    assert_eq!(emp.get_i32("deptno").unwrap(), Some(10));
    assert_eq!(emp.get_string("dept_name").unwrap().as_deref(), Some("ACCOUNTING"));
    assert_eq!(emp.get_string("dept_loc").unwrap().as_deref(), Some("NEW YORK"));
    assert!(emp.is_loaded("dept_fk").unwrap());
    assert!(!emp.is_null("dept_fk").unwrap());

    let referenced = emp.get_entity("dept_fk").unwrap().unwrap();
    assert_eq!(referenced, accounting);
    assert_eq!(referenced.get_string("dname").unwrap().as_deref(), Some("ACCOUNTING"));
    assert_eq!(emp.referenced_key("dept_fk").unwrap().as_ref(), Some(accounting.key()));
}

#[test]
fn replacing_reference_updates_columns() {
    let domain = scott();
    let mut emp = domain.entity("emp").unwrap();
    emp.put("dept_fk", dept(&domain, 10, "ACCOUNTING", "NEW YORK"))
        .unwrap();
    emp.put("dept_fk", dept(&domain, 20, "RESEARCH", "DALLAS"))
        .unwrap();

    assert_eq!(emp.get_i32("deptno").unwrap(), Some(20));
    assert_eq!(emp.get_string("dept_name").unwrap().as_deref(), Some("RESEARCH"));
    assert_eq!(
        emp.referenced_key("dept_fk").unwrap().unwrap().to_string(),
        "deptno:20"
    );
    assert_eq!(emp.original("deptno"), Value::I32(10));
}

#[test]
fn same_key_reference_is_replaced() {
    let domain = scott();
    let mut emp = domain.entity("emp").unwrap();
    emp.put("dept_fk", dept(&domain, 10, "ACCOUNTING", "NEW YORK"))
        .unwrap();
    emp.put("dept_fk", dept(&domain, 10, "RENAMED", "BOSTON"))
        .unwrap();

    assert_eq!(emp.get_string("dept_name").unwrap().as_deref(), Some("RENAMED"));
    let referenced = emp.get_entity("dept_fk").unwrap().unwrap();
    assert_eq!(referenced.get_string("dname").unwrap().as_deref(), Some("RENAMED"));
    assert_eq!(referenced.get_string("loc").unwrap().as_deref(), Some("BOSTON"));

    // Same key, so the reference itself is unmodified
    assert!(!emp.is_modified_property("dept_fk"));
    assert!(!emp.is_modified_property("deptno"));
    assert!(emp.is_modified_property("dept_name"));
}

#[test]
fn rejected_reference_writes_nothing() {
    let settings = Settings {
        strict_foreign_keys: false,
        ..Settings::default()
    };
    let mut domain = Domain::with_settings("scott", settings);
    domain
        .define(
            "emp",
            [
                Property::primary_key("empno", Type::I32),
                Property::foreign_key("dept_fk", "dept", [Property::column("deptno", Type::I32)]),
                Property::denormalized("dept_name", "dept_fk", "dname", Type::I32),
            ],
        )
        .unwrap();
    domain
        .define(
            "dept",
            [
                Property::primary_key("deptno", Type::I32),
                Property::column("dname", Type::String),
                Property::column("loc", Type::String),
            ],
        )
        .unwrap();
    let domain = Rc::new(domain);

    let mut emp = domain.entity("emp").unwrap();
    let err = emp
        .put("dept_fk", dept(&domain, 10, "ACCOUNTING", "NEW YORK"))
        .unwrap_err();
    assert!(err.is_type_error());
    assert!(emp.is_null("deptno").unwrap());
    assert!(!emp.is_loaded("dept_fk").unwrap());
    assert!(emp.values().is_empty());
}

#[test]
fn null_reference_clears_columns_and_denormalized() {
    let domain = scott();
    let mut emp = domain.entity("emp").unwrap();
    emp.put("dept_fk", dept(&domain, 10, "ACCOUNTING", "NEW YORK"))
        .unwrap();
    emp.put("dept_fk", Value::Null).unwrap();

    assert!(emp.is_null("deptno").unwrap());
    assert!(emp.is_null("dept_name").unwrap());
    assert!(emp.is_null("dept_fk").unwrap());
    assert_eq!(emp.referenced_key("dept_fk").unwrap(), None);
    assert_eq!(emp.get_entity("dept_fk").unwrap(), None);
}

#[test]
fn reference_must_match_foreign_entity() {
    let domain = scott();
    let mut emp = domain.entity("emp").unwrap();
    let err = emp
        .put("dept_fk", location(&domain, "FR", "Paris"))
        .unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(
        err.to_string(),
        "type mismatch for `dept_fk`: expected Entity(dept), got Entity(location)"
    );
    assert!(emp.is_null("deptno").unwrap());
}

#[test]
fn self_reference() {
    let domain = scott();
    let mut king = domain.entity("emp").unwrap();
    king.put("empno", 7839).unwrap();
    king.put("ename", "KING").unwrap();

    let mut jones = domain.entity("emp").unwrap();
    jones.put("empno", 7566).unwrap();
    jones.put("mgr_fk", king.clone()).unwrap();
    assert_eq!(jones.get_i32("mgr").unwrap(), Some(7839));
    assert_eq!(jones.formatted("mgr_fk").unwrap(), "emp: empno:7839");
}

// ---------------------------------------------------------------------------
// References resolved from columns
// ---------------------------------------------------------------------------

#[test]
fn reference_resolved_from_column() {
    let domain = scott();
    let mut emp = domain.entity("emp").unwrap();
    emp.put("deptno", 20).unwrap();

    assert!(!emp.is_loaded("dept_fk").unwrap());
    assert!(!emp.is_null("dept_fk").unwrap());

    let referenced = emp.get_entity("dept_fk").unwrap().unwrap();
    assert_eq!(referenced.entity_id(), "dept");
    assert_eq!(referenced.get_i32("deptno").unwrap(), Some(20));
    assert!(referenced.is_null("dname").unwrap());
    assert_eq!(emp.formatted("dept_fk").unwrap(), "dept: deptno:20");
}

#[test]
fn column_write_refreshes_referenced_key() {
    let domain = scott();
    let mut emp = domain.entity("emp").unwrap();
    emp.put("deptno", 20).unwrap();
    assert_eq!(emp.referenced_key("dept_fk").unwrap().unwrap().hash_code(), 20);

    emp.put("deptno", 30).unwrap();
    assert_eq!(emp.referenced_key("dept_fk").unwrap().unwrap().hash_code(), 30);

    emp.remove("deptno").unwrap();
    assert_eq!(emp.referenced_key("dept_fk").unwrap(), None);
}

#[test]
fn referenced_key_requires_foreign_key() {
    let domain = scott();
    let emp = domain.entity("emp").unwrap();
    let err = emp.referenced_key("ename").unwrap_err();
    assert!(err.is_lookup());
    assert_eq!(err.to_string(), "`emp.ename` is not a foreign key property");
    assert!(emp.is_loaded("ename").is_err());
}

#[test]
fn removing_foreign_key_removes_columns() {
    let domain = scott();
    let mut emp = domain.entity("emp").unwrap();
    emp.put("dept_fk", dept(&domain, 10, "ACCOUNTING", "NEW YORK"))
        .unwrap();
    emp.remove("dept_fk").unwrap();

    assert!(!emp.values().contains_key("dept_fk"));
    assert!(!emp.values().contains_key("deptno"));
    assert!(emp.is_null("dept_fk").unwrap());
}

// ---------------------------------------------------------------------------
// Composite references
// ---------------------------------------------------------------------------

#[test]
fn mirror_columns_are_not_written() {
    let domain = scott();
    let mut office = domain.entity("office").unwrap();
    office
        .put("location_fk", location(&domain, "FR", "Paris"))
        .unwrap();

    assert_eq!(office.get_string("city_name").unwrap().as_deref(), Some("Paris"));
    assert!(!office.values().contains_key("country_code"));
}

#[test]
fn composite_reference_null_rules() {
    let domain = scott();
    let mut office = domain.entity("office").unwrap();

    // Every column null
    assert!(office.is_null("location_fk").unwrap());

    // A non-nullable column null
    office.put("city_name", "Paris").unwrap();
    assert!(office.is_null("location_fk").unwrap());
    assert_eq!(office.referenced_key("location_fk").unwrap(), None);

    // Only a nullable column null
    office.put("country_code", "FR").unwrap();
    office.put("city_name", Value::Null).unwrap();
    assert!(!office.is_null("location_fk").unwrap());

    office.put("city_name", "Lyon").unwrap();
    let key = office.referenced_key("location_fk").unwrap().unwrap();
    assert_eq!(key.to_string(), "country:FR,city:Lyon");
    assert_eq!(key, *location(&domain, "FR", "Lyon").key());

    // Mirror writes are seen as well
    office.put("country_code", "BE").unwrap();
    let key = office.referenced_key("location_fk").unwrap().unwrap();
    assert_eq!(key.to_string(), "country:BE,city:Lyon");
}
