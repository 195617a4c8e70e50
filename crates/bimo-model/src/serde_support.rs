#![forbid(unsafe_code)]

//! JSON interop, enabled by the `serde` feature.
//!
//! JSON has no date or file type: dates serialize as ISO-8601 strings and
//! file lists as arrays of `{name, size, mime}` objects. Deserialized JSON
//! never produces `Value::Date`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Number};

use crate::delta::{Changes, Delta};
use crate::value::{Record, Value, iso_string};

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Record(Record::from(map)),
        }
    }
}

impl From<Map<String, serde_json::Value>> for Record {
    fn from(map: Map<String, serde_json::Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => number(*n),
            Value::Text(s) => Self::String(s.clone()),
            Value::Date(d) => Self::String(iso_string(d)),
            Value::List(items) => Self::Array(items.iter().map(Self::from).collect()),
            Value::Record(r) => Self::from(r),
            Value::Files(files) => Self::Array(
                files
                    .iter()
                    .map(|f| {
                        serde_json::json!({ "name": f.name, "size": f.size, "mime": f.mime })
                    })
                    .collect(),
            ),
        }
    }
}

impl From<&Record> for serde_json::Value {
    fn from(record: &Record) -> Self {
        Self::Object(
            record
                .iter()
                .map(|(k, v)| (k.to_owned(), Self::from(v)))
                .collect(),
        )
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("original", &self.original)?;
        map.serialize_entry("previous", &self.previous)?;
        map.serialize_entry("actual", &self.actual)?;
        map.end()
    }
}

/// Fields and nested payloads share one JSON object, like the delta of a
/// nested model keyed by its field name.
impl Serialize for Changes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (k, d) in self.iter() {
            map.serialize_entry(k, d)?;
        }
        for (k, nested) in self.nested_iter() {
            if !nested.is_empty() {
                map.serialize_entry(k, nested)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Model;
    use serde_json::json;

    #[test]
    fn json_object_becomes_record() {
        let value = Value::from(json!({ "b": 1, "a": [true, null] }));
        let record = value.as_record().expect("record");
        assert_eq!(record.get("b"), Some(&Value::Number(1.0)));
        assert_eq!(
            record.get("a"),
            Some(&Value::List(vec![Value::Bool(true), Value::Null]))
        );
    }

    #[test]
    fn integral_numbers_serialize_as_integers() {
        let out = serde_json::Value::from(&Value::from(35));
        assert_eq!(out, json!(35));
        let out = serde_json::Value::from(&Value::from(1.5));
        assert_eq!(out, json!(1.5));
        let out = serde_json::Value::from(&Value::Number(f64::NAN));
        assert_eq!(out, json!(null));
    }

    #[test]
    fn delta_serializes_with_nested_models() {
        let data = Record::from(
            json!({ "age": 35, "address": { "city": "San Jose" } })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        let model = Model::new(data);
        model.set("age", 36);
        model.set_value("address.city", "Fresno");
        let out = serde_json::to_value(model.delta()).expect("serialize");
        assert_eq!(
            out,
            json!({
                "age": { "original": 35, "previous": 35, "actual": 36 },
                "address": {
                    "city": { "original": "San Jose", "previous": "San Jose", "actual": "Fresno" }
                }
            })
        );
    }
}
