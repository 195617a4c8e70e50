#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! A [`BinderConfig`] maps field paths to a [`FieldConfig`]: one
//! [`BindConfig`] or several, each producing its own [`Bind`]. Settings a
//! `BindConfig` leaves unset fall back to the binder-wide [`Defaults`].
//!
//! ```
//! use bimo_binder::{BindConfig, BinderConfig};
//!
//! let config = BinderConfig::new()
//!     .field("user", ".js-name")
//!     .field("member", BindConfig::new().selector(".js-membership").property("checked"))
//!     .field("address.state", vec![
//!         BindConfig::new().selector(".js-state").place_holder("Select a state"),
//!         BindConfig::new().selector(".js-state-name").two_way(false),
//!     ]);
//! assert_eq!(config.len(), 3);
//! ```

use std::fmt;
use std::rc::Rc;

use bimo_dom::{DomEvent, NodeId};
use bimo_model::Value;

use crate::bind::{Bind, HookArgs};

/// Takes over the model-to-control direction.
pub type ReadHook = Rc<dyn Fn(&HookArgs<'_>)>;
/// Supersedes the extracted control value. `None` skips the assignment.
pub type WriteHook = Rc<dyn Fn(&HookArgs<'_>) -> Option<Value>>;
/// Transforms the model value before it is written into controls.
pub type FormatHook = Rc<dyn Fn(&HookArgs<'_>) -> Value>;
/// Handler for an additional DOM event.
pub type EventHandler = Rc<dyn Fn(&Bind, &DomEvent)>;
/// Computes `<option>` `(value, text)` pairs when a binding activates.
pub type OptionsFn = Rc<dyn Fn(&Bind) -> Vec<(String, String)>>;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Binder-wide fallbacks for unset [`BindConfig`] settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Defaults {
    pub two_way: bool,
    pub event: String,
    pub property: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            two_way: true,
            event: "change".to_owned(),
            property: "value".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Where a `<select>` gets its options.
#[derive(Clone)]
pub enum OptionSource {
    /// Each item is both value and text.
    List(Vec<String>),
    /// `(value, text)` pairs in display order.
    Pairs(Vec<(String, String)>),
    /// Computed from the binding at activation.
    Dynamic(OptionsFn),
}

impl OptionSource {
    pub(crate) fn items(&self, bind: &Bind) -> Vec<(String, String)> {
        match self {
            Self::List(items) => items.iter().map(|i| (i.clone(), i.clone())).collect(),
            Self::Pairs(pairs) => pairs.clone(),
            Self::Dynamic(f) => f(bind),
        }
    }
}

impl fmt::Debug for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Pairs(pairs) => f.debug_tuple("Pairs").field(pairs).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<Vec<String>> for OptionSource {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<(String, String)>> for OptionSource {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl<const N: usize> From<[&str; N]> for OptionSource {
    fn from(items: [&str; N]) -> Self {
        Self::List(items.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for OptionSource {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::Pairs(
            pairs
                .iter()
                .map(|(v, t)| ((*v).to_owned(), (*t).to_owned()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// BindConfig
// ---------------------------------------------------------------------------

/// Settings for one [`Bind`].
#[derive(Clone, Default)]
pub struct BindConfig {
    pub(crate) selector: Option<String>,
    pub(crate) elements: Option<Vec<NodeId>>,
    pub(crate) property: Option<String>,
    pub(crate) event: Option<String>,
    pub(crate) two_way: Option<bool>,
    pub(crate) display: Option<String>,
    pub(crate) place_holder: Option<String>,
    pub(crate) options: Option<OptionSource>,
    pub(crate) read: Option<ReadHook>,
    pub(crate) write: Option<WriteHook>,
    pub(crate) format: Option<FormatHook>,
    pub(crate) empty: Option<Value>,
    pub(crate) events: Vec<(String, EventHandler)>,
    pub(crate) extras: Vec<(String, Value)>,
}

impl BindConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector resolved inside the binder's container.
    #[must_use]
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Explicit target nodes. Takes precedence over `selector`.
    #[must_use]
    pub fn elements(mut self, elements: impl IntoIterator<Item = NodeId>) -> Self {
        self.elements = Some(elements.into_iter().collect());
        self
    }

    /// Control property carrying the value.
    #[must_use]
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// DOM event that syncs control to model.
    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[must_use]
    pub fn two_way(mut self, two_way: bool) -> Self {
        self.two_way = Some(two_way);
        self
    }

    /// `style.display` used when the binding is made visible.
    #[must_use]
    pub fn display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Disabled first `<option>`, selected while the value is empty.
    #[must_use]
    pub fn place_holder(mut self, text: impl Into<String>) -> Self {
        self.place_holder = Some(text.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: impl Into<OptionSource>) -> Self {
        self.options = Some(options.into());
        self
    }

    #[must_use]
    pub fn options_fn(mut self, f: impl Fn(&Bind) -> Vec<(String, String)> + 'static) -> Self {
        self.options = Some(OptionSource::Dynamic(Rc::new(f)));
        self
    }

    #[must_use]
    pub fn read(mut self, f: impl Fn(&HookArgs<'_>) + 'static) -> Self {
        self.read = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn write(mut self, f: impl Fn(&HookArgs<'_>) -> Option<Value> + 'static) -> Self {
        self.write = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn format(mut self, f: impl Fn(&HookArgs<'_>) -> Value + 'static) -> Self {
        self.format = Some(Rc::new(f));
        self
    }

    /// Value a number control yields when blank or unparsable, instead of 0.
    #[must_use]
    pub fn empty(mut self, value: impl Into<Value>) -> Self {
        self.empty = Some(value.into());
        self
    }

    /// Attach a handler for another DOM event while the binding is active.
    #[must_use]
    pub fn on(mut self, event: impl Into<String>, f: impl Fn(&Bind, &DomEvent) + 'static) -> Self {
        self.events.push((event.into(), Rc::new(f)));
        self
    }

    /// Carry an arbitrary named value on the binding.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.push((key.into(), value.into()));
        self
    }
}

impl From<&str> for BindConfig {
    fn from(selector: &str) -> Self {
        Self::new().selector(selector)
    }
}

impl From<String> for BindConfig {
    fn from(selector: String) -> Self {
        Self::new().selector(selector)
    }
}

impl fmt::Debug for BindConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindConfig")
            .field("selector", &self.selector)
            .field("elements", &self.elements)
            .field("property", &self.property)
            .field("event", &self.event)
            .field("two_way", &self.two_way)
            .field("options", &self.options)
            .field("read", &self.read.is_some())
            .field("write", &self.write.is_some())
            .field("format", &self.format.is_some())
            .field(
                "events",
                &self.events.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// FieldConfig / BinderConfig
// ---------------------------------------------------------------------------

/// One field's bindings.
#[derive(Debug, Clone)]
pub enum FieldConfig {
    Single(BindConfig),
    Multi(Vec<BindConfig>),
}

impl FieldConfig {
    pub(crate) fn into_configs(self) -> Vec<BindConfig> {
        match self {
            Self::Single(config) => vec![config],
            Self::Multi(configs) => configs,
        }
    }
}

impl From<BindConfig> for FieldConfig {
    fn from(config: BindConfig) -> Self {
        Self::Single(config)
    }
}

impl From<Vec<BindConfig>> for FieldConfig {
    fn from(configs: Vec<BindConfig>) -> Self {
        Self::Multi(configs)
    }
}

impl From<&str> for FieldConfig {
    fn from(selector: &str) -> Self {
        Self::Single(selector.into())
    }
}

/// Field path to [`FieldConfig`], in declaration order.
#[derive(Debug, Clone, Default)]
pub struct BinderConfig {
    entries: Vec<(String, FieldConfig)>,
}

impl BinderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the configuration of `path`.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, config: impl Into<FieldConfig>) -> Self {
        self.insert(path, config);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, config: impl Into<FieldConfig>) {
        let path = path.into();
        let config = config.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => slot.1 = config,
            None => self.entries.push((path, config)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldConfig)> {
        self.entries.iter().map(|(p, c)| (p.as_str(), c))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, C: Into<FieldConfig>> FromIterator<(P, C)> for BinderConfig {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (path, field) in iter {
            config.insert(path, field);
        }
        config
    }
}

impl IntoIterator for BinderConfig {
    type Item = (String, FieldConfig);
    type IntoIter = std::vec::IntoIter<(String, FieldConfig)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Root node scoping a binder's selector queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Container {
    #[default]
    Document,
    /// Resolved once against the document when the binder is built.
    Selector(String),
    Node(NodeId),
}

impl From<NodeId> for Container {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Container {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_browser_forms() {
        let d = Defaults::default();
        assert!(d.two_way);
        assert_eq!(d.event, "change");
        assert_eq!(d.property, "value");
    }

    #[test]
    fn selector_shorthand() {
        let FieldConfig::Single(config) = FieldConfig::from(".js-name") else {
            panic!("expected a single binding");
        };
        assert_eq!(config.selector.as_deref(), Some(".js-name"));
        assert!(config.two_way.is_none());
    }

    #[test]
    fn later_entry_replaces_earlier_in_place() {
        let config = BinderConfig::new()
            .field("user", ".a")
            .field("age", ".b")
            .field("user", vec![BindConfig::from(".c"), BindConfig::from(".d")]);
        let paths: Vec<&str> = config.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, ["user", "age"]);
        assert!(matches!(config.iter().next(), Some((_, FieldConfig::Multi(v))) if v.len() == 2));
    }

    #[test]
    fn option_sources_normalize_to_pairs() {
        let list = OptionSource::from(["red", "blue"]);
        let pairs = OptionSource::from([("CA", "California")]);
        assert!(matches!(list, OptionSource::List(ref v) if v == &["red", "blue"]));
        assert!(matches!(pairs, OptionSource::Pairs(ref v) if v[0].1 == "California"));
    }

    #[test]
    fn hooks_and_events_are_recorded() {
        let config = BindConfig::new()
            .selector("#age")
            .write(|args| Some(args.value.clone()))
            .on("focus", |_, _| {})
            .on("blur", |_, _| {})
            .extra("label", "Age");
        assert!(config.write.is_some());
        assert_eq!(config.events.len(), 2);
        assert_eq!(config.extras[0].0, "label");
        assert!(format!("{config:?}").contains("\"focus\""));
    }
}
