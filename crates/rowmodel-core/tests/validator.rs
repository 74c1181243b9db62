use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rowmodel_core::schema::{Domain, IncrementKeyGenerator, Property, PropertyBuilder};
use rowmodel_core::{DefaultValidator, Entity, Result, Type, Validator};
use rust_decimal::Decimal;
use std::cell::Cell;
use std::rc::Rc;

fn emp_properties() -> Vec<PropertyBuilder> {
    vec![
        Property::primary_key("empno", Type::I32),
        Property::column("ename", Type::String).max_length(10).nullable(false),
        Property::column("sal", Type::F64).range(1000.0, 10000.0),
        Property::column("comm", Type::Decimal).min(0.0),
        Property::column("hiredate", Type::Date)
            .nullable(false)
            .column_has_default(true),
        Property::foreign_key("dept_fk", "dept", [Property::column("deptno", Type::I32)])
            .nullable(false),
        Property::subquery("emp_count", Type::I32, "select count(*) from emp").nullable(false),
    ]
}

fn scott(configure: impl FnOnce(&mut Domain)) -> Rc<Domain> {
    let mut domain = Domain::new("scott");
    domain
        .define("dept", [Property::primary_key("deptno", Type::I32)])
        .unwrap();
    configure(&mut domain);
    Rc::new(domain)
}

fn manual_keys() -> Rc<Domain> {
    scott(|domain| {
        domain.define("emp", emp_properties()).unwrap();
    })
}

fn valid_emp(domain: &Rc<Domain>) -> Entity {
    let mut emp = domain.entity("emp").unwrap();
    emp.put("empno", 7369).unwrap();
    emp.put("ename", "SMITH").unwrap();
    emp.put("sal", 1500.0).unwrap();
    emp.put("hiredate", NaiveDate::from_ymd_opt(1980, 12, 17).unwrap())
        .unwrap();
    emp.put("deptno", 20).unwrap();
    emp
}

// ---------------------------------------------------------------------------
// Default checks
// ---------------------------------------------------------------------------

#[test]
fn valid_entity() {
    let domain = manual_keys();
    let emp = valid_emp(&domain);
    emp.validate().unwrap();
    assert!(emp.definition().validator().is_valid(&emp));
}

#[test]
fn null_check() {
    let domain = manual_keys();
    let mut emp = valid_emp(&domain);
    emp.put("ename", rowmodel_core::Value::Null).unwrap();

    let err = emp.validate().unwrap_err();
    assert!(err.is_validation_null());
    assert_eq!(err.validation_property(), Some("ename"));
    assert_eq!(err.to_string(), "value required: ename");
}

#[test]
fn manual_primary_key_is_required() {
    let domain = manual_keys();
    let mut emp = valid_emp(&domain);
    emp.remove("empno").unwrap();

    let err = emp.validate().unwrap_err();
    assert_eq!(err.to_string(), "value required: empno");
}

#[test]
fn generated_values_may_be_null_on_new_entities() {
    let domain = scott(|domain| {
        domain
            .define("emp", emp_properties())
            .unwrap()
            .key_generator(IncrementKeyGenerator::new("emp", "empno"));
    });
    let mut emp = valid_emp(&domain);
    emp.remove("empno").unwrap();
    emp.remove("hiredate").unwrap();
    emp.validate().unwrap();

    // Once the entity has a key, the column default no longer applies
    let mut emp = valid_emp(&domain);
    emp.remove("hiredate").unwrap();
    assert_eq!(emp.validate().unwrap_err().to_string(), "value required: hiredate");
}

#[test]
fn foreign_key_is_checked_instead_of_its_columns() {
    let domain = manual_keys();
    let mut emp = valid_emp(&domain);
    emp.remove("deptno").unwrap();

    let err = emp.validate().unwrap_err();
    assert_eq!(err.validation_property(), Some("dept_fk"));
}

#[test]
fn read_only_properties_are_skipped() {
    let domain = manual_keys();
    let emp = valid_emp(&domain);
    assert!(emp.is_null("emp_count").unwrap());
    emp.validate().unwrap();
}

#[test]
fn range_check() {
    let domain = manual_keys();
    let mut emp = valid_emp(&domain);

    emp.put("sal", 150.0).unwrap();
    let err = emp.validate().unwrap_err();
    assert!(err.is_validation_range());
    assert_eq!(err.to_string(), "sal: value 150 is too small (minimum: 1000)");

    emp.put("sal", 12000.5).unwrap();
    let err = emp.validate().unwrap_err();
    assert_eq!(err.to_string(), "sal: value 12000.5 is too large (maximum: 10000)");

    emp.put("sal", 10000.0).unwrap();
    emp.validate().unwrap();

    emp.put("comm", Decimal::new(-5, 1)).unwrap();
    let err = emp.validate().unwrap_err();
    assert_eq!(err.to_string(), "comm: value -0.5 is too small (minimum: 0)");
}

#[test]
fn length_check_counts_characters() {
    let domain = manual_keys();
    let mut emp = valid_emp(&domain);

    emp.put("ename", "ÅÆØÅÆØÅÆØÅ").unwrap();
    emp.validate().unwrap();

    emp.put("ename", "MARTINSSONS").unwrap();
    let err = emp.validate().unwrap_err();
    assert!(err.is_validation_length());
    assert_eq!(err.to_string(), "ename: value length 11 is too long (maximum: 10)");
}

#[test]
fn validate_all_stops_at_first_failure() {
    let domain = manual_keys();
    let valid = valid_emp(&domain);
    let mut invalid = valid_emp(&domain);
    invalid.put("sal", 1.0).unwrap();
    let mut also_invalid = valid_emp(&domain);
    also_invalid.put("ename", "X".repeat(20)).unwrap();

    let validator = DefaultValidator::new();
    validator.validate_all(&[valid.clone()]).unwrap();
    let err = validator
        .validate_all(&[valid, invalid, also_invalid])
        .unwrap_err();
    assert_eq!(err.validation_property(), Some("sal"));
}

// ---------------------------------------------------------------------------
// Configured validators
// ---------------------------------------------------------------------------

#[test]
fn without_null_validation() {
    let domain = scott(|domain| {
        domain
            .define("emp", emp_properties())
            .unwrap()
            .validator(DefaultValidator::without_null_validation());
    });
    let mut emp = domain.entity("emp").unwrap();
    emp.validate().unwrap();

    emp.put("sal", 1.0).unwrap();
    assert!(emp.validate().unwrap_err().is_validation_range());
}

#[derive(Debug)]
struct TrainingValidator;

impl Validator for TrainingValidator {
    /// Trainees have no salary cap.
    fn range_check(&self, entity: &Entity, property: &rowmodel_core::schema::Property) -> Result<()> {
        if property.id() == "sal" && entity.get_string("ename")?.as_deref() == Some("TRAINEE") {
            return Ok(());
        }
        DefaultValidator::new().range_check(entity, property)
    }

    fn is_nullable(&self, _entity: &Entity, property: &rowmodel_core::schema::Property) -> bool {
        property.is_nullable() || property.id() == "hiredate"
    }
}

#[test]
fn custom_validator() {
    let domain = scott(|domain| {
        domain
            .define("emp", emp_properties())
            .unwrap()
            .validator(TrainingValidator);
    });
    let mut emp = valid_emp(&domain);
    emp.remove("hiredate").unwrap();
    emp.validate().unwrap();

    emp.put("sal", 50000.0).unwrap();
    assert!(emp.validate().is_err());

    emp.put("ename", "TRAINEE").unwrap();
    emp.validate().unwrap();
}

#[test]
fn revalidate_listeners() {
    let validator = DefaultValidator::new();
    let calls = Rc::new(Cell::new(0));
    for _ in 0..2 {
        let calls = Rc::clone(&calls);
        validator.add_revalidate_listener(Box::new(move || calls.set(calls.get() + 1)));
    }

    validator.revalidate();
    assert_eq!(calls.get(), 2);

    // The trait default ignores listeners
    TrainingValidator.add_revalidate_listener(Box::new(|| panic!("not registered")));
    TrainingValidator.revalidate();
}
