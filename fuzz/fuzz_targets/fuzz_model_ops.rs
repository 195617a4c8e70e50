#![no_main]

use arbitrary::Arbitrary;
use bimo_model::{Model, Record, Value, Watcher};
use libfuzzer_sys::fuzz_target;

const FIELDS: [&str; 4] = ["city", "age", "member", "address.zip"];

#[derive(Arbitrary, Debug)]
enum FuzzValue {
    Null,
    Bool(bool),
    Number(i8),
    Text(u8),
}

impl From<&FuzzValue> for Value {
    fn from(v: &FuzzValue) -> Self {
        match v {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => Value::Bool(*b),
            FuzzValue::Number(n) => Value::from(i32::from(*n)),
            FuzzValue::Text(t) => Value::from(format!("t{}", t % 4)),
        }
    }
}

#[derive(Arbitrary, Debug)]
enum Op {
    Set(u8, FuzzValue),
    SetPath(String, FuzzValue),
    Suspend,
    Resume,
    Revert(u8),
    Refresh(u8),
    Clear,
    Reset,
}

fuzz_target!(|ops: Vec<Op>| {
    let model = Model::new(
        Record::new()
            .with("city", "Kamino")
            .with("age", 35)
            .with("member", false)
            .with("address", Record::new().with("zip", "12345")),
    );
    let watcher = Watcher::new(|_| {});
    model.watch_all(&watcher);

    for op in ops.iter().take(256) {
        match op {
            Op::Set(i, v) => model.set_value(FIELDS[usize::from(*i) % FIELDS.len()], Value::from(v)),
            Op::SetPath(path, v) => model.set_value(path, Value::from(v)),
            Op::Suspend => model.suspend(),
            Op::Resume => model.resume(),
            Op::Revert(i) => model.revert(&[FIELDS[usize::from(*i) % FIELDS.len()]]),
            Op::Refresh(i) => model.refresh(FIELDS[usize::from(*i) % FIELDS.len()]),
            Op::Clear => model.clear(),
            Op::Reset => model.reset(),
        }
    }

    model.resume();
    model.revert_all();
    assert!(!model.is_changed());
});
