use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rowmodel_core::schema::{DefinitionBuilder, Domain, Property, StringProvider};
use rowmodel_core::{Entity, Type};
use std::cell::Cell;
use std::rc::Rc;

fn scott(configure: impl FnOnce(&mut DefinitionBuilder<'_>)) -> Rc<Domain> {
    let mut domain = Domain::new("scott");
    domain
        .define(
            "dept",
            [
                Property::primary_key("deptno", Type::I32),
                Property::column("dname", Type::String),
            ],
        )
        .unwrap()
        .string_provider(StringProvider::from_property("dname"))
        .unwrap();

    let mut emp = domain
        .define(
            "emp",
            [
                Property::primary_key("empno", Type::I32),
                Property::column("ename", Type::String),
                Property::column("sal", Type::F64),
                Property::column("hiredate", Type::Date).format("%Y/%m/%d"),
                Property::foreign_key("dept_fk", "dept", [Property::column("deptno", Type::I32)]),
            ],
        )
        .unwrap();
    configure(&mut emp);
    Rc::new(domain)
}

fn emp(domain: &Rc<Domain>, empno: i32, ename: &str, sal: f64) -> Entity {
    let mut dept = domain.entity("dept").unwrap();
    dept.put("deptno", 10).unwrap();
    dept.put("dname", "ACCOUNTING").unwrap();

    let mut emp = domain.entity("emp").unwrap();
    emp.put("empno", empno).unwrap();
    emp.put("ename", ename).unwrap();
    emp.put("sal", sal).unwrap();
    emp.put("hiredate", NaiveDate::from_ymd_opt(1981, 6, 9).unwrap())
        .unwrap();
    emp.put("dept_fk", dept).unwrap();
    emp
}

#[test]
fn default_display_is_entity_and_key() {
    let domain = scott(|_| {});
    let clark = emp(&domain, 7782, "CLARK", 2450.0);
    assert_eq!(clark.to_string(), "emp: empno:7782");
    assert_eq!(clark.formatted("dept_fk").unwrap(), "ACCOUNTING");
}

#[test]
fn string_provider_parts() {
    let domain = scott(|emp| {
        emp.string_provider(
            StringProvider::new()
                .value("ename")
                .text(", ")
                .foreign_key_value("dept_fk", "dname")
                .text(", hired ")
                .value("hiredate")
                .text(" (")
                .formatted_value("hiredate", "%B")
                .text(")"),
        )
        .unwrap();
    });

    let clark = emp(&domain, 7782, "CLARK", 2450.0);
    assert_eq!(clark.to_string(), "CLARK, ACCOUNTING, hired 1981/06/09 (June)");
}

#[test]
fn null_parts_render_empty() {
    let domain = scott(|emp| {
        emp.string_provider(
            StringProvider::from_property("ename")
                .text("/")
                .foreign_key_value("dept_fk", "dname"),
        )
        .unwrap();
    });

    let mut emp = domain.entity("emp").unwrap();
    emp.put("empno", 1).unwrap();
    assert_eq!(emp.to_string(), "/");

    // A reference resolved from its column only has key values
    emp.put("deptno", 20).unwrap();
    assert_eq!(emp.to_string(), "/");
}

#[test]
fn display_is_cached_until_changed() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let domain = scott(move |emp| {
        emp.display_provider(move |entity: &Entity| {
            counter.set(counter.get() + 1);
            entity.get_string("ename").unwrap().unwrap_or_default()
        });
    });

    let mut clark = emp(&domain, 7782, "CLARK", 2450.0);
    assert_eq!(clark.to_string(), "CLARK");
    assert_eq!(clark.to_string(), "CLARK");
    assert_eq!(calls.get(), 1);

    clark.put("ename", "CLERK").unwrap();
    assert_eq!(clark.to_string(), "CLERK");
    assert_eq!(calls.get(), 2);
}

#[test]
fn background_color() {
    let domain = scott(|emp| {
        emp.color_provider(|entity: &Entity, property: &Property| {
            let high = entity.get_f64("sal").ok().flatten().unwrap_or_default() > 3000.0;
            (property.id() == "sal" && high).then(|| "red".to_string())
        });
    });

    let king = emp(&domain, 7839, "KING", 5000.0);
    let clark = emp(&domain, 7782, "CLARK", 2450.0);
    assert_eq!(king.background_color("sal").unwrap().as_deref(), Some("red"));
    assert_eq!(king.background_color("ename").unwrap(), None);
    assert_eq!(clark.background_color("sal").unwrap(), None);
    assert!(king.background_color("bonus").is_err());

    let plain = scott(|_| {});
    let king = emp(&plain, 7839, "KING", 5000.0);
    assert_eq!(king.background_color("sal").unwrap(), None);
}

#[test]
fn comparator() {
    let domain = scott(|emp| {
        emp.comparator(|a, b| {
            let sal = |entity: &Entity| entity.get_f64("sal").ok().flatten().unwrap_or_default();
            sal(b).total_cmp(&sal(a))
        });
    });

    let mut entities = vec![
        emp(&domain, 7782, "CLARK", 2450.0),
        emp(&domain, 7839, "KING", 5000.0),
        emp(&domain, 7369, "SMITH", 800.0),
    ];
    entities.sort();
    let names: Vec<_> = entities
        .iter()
        .map(|entity| entity.get_string("ename").unwrap().unwrap())
        .collect();
    assert_eq!(names, ["KING", "CLARK", "SMITH"]);
}
