use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pretty_assertions::assert_eq;
use rowmodel_core::driver::{fetch_value, ResultRow};
use rowmodel_core::schema::{BooleanConverter, Domain, Property};
use rowmodel_core::{Result, Type, Value};
use rust_decimal::Decimal;

/// A single result row. Index 0 is unused so that column indices are 1-based.
struct MockRow {
    columns: Vec<Value>,
    was_null: bool,
}

impl MockRow {
    fn new(columns: impl IntoIterator<Item = Value>) -> MockRow {
        MockRow {
            columns: std::iter::once(Value::Null).chain(columns).collect(),
            was_null: false,
        }
    }

    fn read(&mut self, index: usize) -> Value {
        let value = self.columns.get(index).cloned().unwrap_or_default();
        self.was_null = value.is_null();
        value
    }
}

impl ResultRow for MockRow {
    fn get_bool(&mut self, index: usize) -> Result<bool> {
        Ok(self.read(index).as_bool().unwrap_or_default())
    }

    fn get_i32(&mut self, index: usize) -> Result<i32> {
        Ok(self.read(index).as_i32().unwrap_or_default())
    }

    fn get_i64(&mut self, index: usize) -> Result<i64> {
        Ok(self.read(index).as_i64().unwrap_or_default())
    }

    fn get_f64(&mut self, index: usize) -> Result<f64> {
        Ok(self.read(index).as_f64().unwrap_or_default())
    }

    fn get_decimal(&mut self, index: usize) -> Result<Option<Decimal>> {
        Ok(self.read(index).as_decimal().copied())
    }

    fn get_string(&mut self, index: usize) -> Result<Option<String>> {
        Ok(self.read(index).as_str().map(str::to_string))
    }

    fn get_date(&mut self, index: usize) -> Result<Option<NaiveDate>> {
        Ok(self.read(index).as_date())
    }

    fn get_time(&mut self, index: usize) -> Result<Option<NaiveTime>> {
        Ok(self.read(index).as_time())
    }

    fn get_timestamp(&mut self, index: usize) -> Result<Option<NaiveDateTime>> {
        Ok(self.read(index).as_timestamp())
    }

    fn was_null(&self) -> bool {
        self.was_null
    }
}

fn domain() -> Domain {
    let mut domain = Domain::new("scott");
    domain
        .define(
            "emp",
            [
                Property::primary_key("empno", Type::I32),
                Property::column("ename", Type::String),
                Property::column("active", Type::Bool).converter(BooleanConverter::new("Y", "N")),
                Property::column("sal", Type::F64),
                Property::column("hiredate", Type::Date),
                Property::column("photo", Type::Blob),
                Property::column("secret", Type::String).selectable(false),
                Property::transient("note", Type::String),
            ],
        )
        .unwrap();
    domain
}

fn hiredate() -> NaiveDate {
    NaiveDate::from_ymd_opt(1981, 2, 20).unwrap()
}

fn row() -> MockRow {
    MockRow::new([
        Value::I32(7499),
        Value::from("ALLEN"),
        Value::from("Y"),
        Value::F64(1600.0),
        Value::from(hiredate()),
        Value::Blob(vec![0xff]),
    ])
}

#[test]
fn fetch_typed_columns() {
    let domain = domain();
    let emp = domain.definition("emp").unwrap();
    let mut row = row();

    let fetched: Vec<Value> = ["empno", "ename", "active", "sal", "hiredate"]
        .into_iter()
        .map(|id| emp.property(id).unwrap().fetch(&mut row).unwrap())
        .collect();
    assert_eq!(
        fetched,
        [
            Value::I32(7499),
            Value::from("ALLEN"),
            Value::Bool(true),
            Value::F64(1600.0),
            Value::from(hiredate()),
        ]
    );
}

#[test]
fn sql_null_reads_as_null() {
    let domain = domain();
    let emp = domain.definition("emp").unwrap();
    let mut row = MockRow::new(std::iter::repeat(Value::Null).take(6));

    for id in ["empno", "ename", "active", "sal", "hiredate"] {
        assert_eq!(emp.property(id).unwrap().fetch(&mut row).unwrap(), Value::Null);
    }
}

#[test]
fn zero_is_not_null() {
    let domain = domain();
    let emp = domain.definition("emp").unwrap();
    let mut row = MockRow::new([Value::I32(0)]);
    assert_eq!(emp.property("empno").unwrap().fetch(&mut row).unwrap(), Value::I32(0));
}

#[test]
fn converter_translates_column_values() {
    let domain = domain();
    let active = domain.property("emp", "active").unwrap();

    let mut row = MockRow::new([Value::Null, Value::Null, Value::from("N")]);
    assert_eq!(active.fetch(&mut row).unwrap(), Value::Bool(false));

    let mut row = MockRow::new([Value::Null, Value::Null, Value::from("maybe")]);
    let err = active.fetch(&mut row).unwrap_err();
    assert_eq!(err.to_string(), "unrecognized boolean column value `maybe`");
}

#[test]
fn blobs_are_not_fetched() {
    let domain = domain();
    let photo = domain.property("emp", "photo").unwrap();
    assert_eq!(photo.expect_column().select_index(), 6);
    assert_eq!(photo.fetch(&mut row()).unwrap(), Value::Null);
}

#[test]
fn unselected_columns_can_not_be_fetched() {
    let domain = domain();
    let err = domain
        .property("emp", "secret")
        .unwrap()
        .fetch(&mut row())
        .unwrap_err();
    assert_eq!(err.to_string(), "column `secret` is not selected");

    let err = domain
        .property("emp", "note")
        .unwrap()
        .fetch(&mut row())
        .unwrap_err();
    assert_eq!(err.to_string(), "property `note` is not a column");
}

#[test]
fn fetch_value_by_type() {
    let mut row = MockRow::new([
        Value::I64(1 << 40),
        Value::from("xyz"),
        Value::Decimal(Decimal::new(1995, 2)),
    ]);
    assert_eq!(fetch_value(&mut row, 1, &Type::I64).unwrap(), Value::I64(1 << 40));
    assert_eq!(fetch_value(&mut row, 2, &Type::Char).unwrap(), Value::Char('x'));
    assert_eq!(
        fetch_value(&mut row, 3, &Type::Decimal).unwrap(),
        Value::Decimal(Decimal::new(1995, 2))
    );

    let err = fetch_value(&mut row, 1, &Type::Entity("dept".into())).unwrap_err();
    assert_eq!(err.to_string(), "entity `dept` can not be fetched from a single column");
}
