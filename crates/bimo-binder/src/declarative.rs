#![forbid(unsafe_code)]

//! Declarative binder configuration from JSON, enabled by the `serde` feature.
//!
//! ```json
//! {
//!   "user": ".js-name",
//!   "member": { "selector": ".js-membership", "property": "checked" },
//!   "address.state": [
//!     { "selector": ".js-state", "placeHolder": "Select a state",
//!       "options": { "CA": "California", "NV": "Nevada" } },
//!     { "selector": ".js-state-name", "twoWay": false }
//!   ]
//! }
//! ```
//!
//! Field and option order follow the document. Hooks and event handlers have
//! no JSON form; unrecognized keys become [`BindConfig::extra`] values.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use bimo_model::Value;

use crate::config::{BindConfig, BinderConfig, FieldConfig, OptionSource};

/// Object entries in document order.
struct Ordered<T>(Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ordered<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<T>(std::marker::PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
            type Value = Ordered<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(std::marker::PhantomData))
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawOptions {
    List(Vec<String>),
    Pairs(Ordered<String>),
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBind {
    selector: Option<String>,
    property: Option<String>,
    event: Option<String>,
    two_way: Option<bool>,
    display: Option<String>,
    place_holder: Option<String>,
    options: Option<RawOptions>,
    empty: Option<serde_json::Value>,
    #[serde(flatten)]
    extras: serde_json::Map<String, serde_json::Value>,
}

impl From<RawBind> for BindConfig {
    fn from(raw: RawBind) -> Self {
        let mut config = BindConfig::new();
        config.selector = raw.selector;
        config.property = raw.property;
        config.event = raw.event;
        config.two_way = raw.two_way;
        config.display = raw.display;
        config.place_holder = raw.place_holder;
        config.options = raw.options.map(|options| match options {
            RawOptions::List(items) => OptionSource::List(items),
            RawOptions::Pairs(Ordered(pairs)) => OptionSource::Pairs(pairs),
        });
        config.empty = raw.empty.map(Value::from);
        config.extras = raw
            .extras
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();
        config
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Selector(String),
    Object(RawBind),
}

impl From<RawTarget> for BindConfig {
    fn from(raw: RawTarget) -> Self {
        match raw {
            RawTarget::Selector(selector) => BindConfig::from(selector),
            RawTarget::Object(raw) => raw.into(),
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawField {
    Single(RawTarget),
    Multi(Vec<RawTarget>),
}

impl<'de> Deserialize<'de> for FieldConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawField::deserialize(deserializer)? {
            RawField::Single(target) => FieldConfig::Single(target.into()),
            RawField::Multi(targets) => {
                FieldConfig::Multi(targets.into_iter().map(BindConfig::from).collect())
            }
        })
    }
}

impl<'de> Deserialize<'de> for BinderConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Ordered(entries) = Ordered::<FieldConfig>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl BinderConfig {
    /// Parse a JSON binder configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
