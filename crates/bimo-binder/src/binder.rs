#![forbid(unsafe_code)]

//! Fan a [`BinderConfig`] out into [`Bind`]s and manage them as one unit.
//!
//! # Invariants
//!
//! 1. Entries keep their configuration order; a multi-target field keeps the
//!    order of its configurations.
//! 2. One failing entry never prevents the others from activating.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Container selector matches nothing | `build` fails with `ContainerNotFound` |
//! | Entry selector matches nothing | `build` fails with `ElementNotFound` |
//! | Entry fails to activate | Logged at error level, returned from `bind` |
//! | Entry hook panics while activating | Caught, reported as `HookPanicked` |

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use bimo_dom::{Dom, NodeId};
use bimo_model::Model;

use crate::bind::Bind;
use crate::config::{BindConfig, BinderConfig, Container, Defaults, FieldConfig};
use crate::error::{BindError, BindFailure, Result};

/// The binding(s) built for one configured field.
#[derive(Debug, Clone)]
pub enum FieldBinds {
    Single(Bind),
    Multi(Vec<Bind>),
}

impl FieldBinds {
    /// Every binding of the field, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Bind> {
        let slice = match self {
            Self::Single(bind) => std::slice::from_ref(bind),
            Self::Multi(binds) => binds.as_slice(),
        };
        slice.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Bind> {
        self.iter().next()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects a binder's container, defaults and configuration.
#[must_use]
pub struct BinderBuilder {
    dom: Rc<dyn Dom>,
    model: Model,
    container: Container,
    defaults: Defaults,
    config: BinderConfig,
}

impl BinderBuilder {
    pub fn container(mut self, container: impl Into<Container>) -> Self {
        self.container = container.into();
        self
    }

    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Add or replace one field's configuration.
    pub fn field(mut self, path: impl Into<String>, config: impl Into<FieldConfig>) -> Self {
        self.config.insert(path, config);
        self
    }

    /// Resolve the container and build every binding, inactive.
    pub fn build(self) -> Result<Binder> {
        let container = match &self.container {
            Container::Document => self.dom.document(),
            Container::Node(node) => *node,
            Container::Selector(selector) => {
                let document = self.dom.document();
                self.dom
                    .query_selector(document, selector)
                    .ok_or_else(|| BindError::ContainerNotFound {
                        selector: selector.clone(),
                    })?
            }
        };

        let mut binds = Vec::with_capacity(self.config.len());
        for (path, field) in self.config {
            let make = |config: BindConfig| {
                Bind::new(
                    Rc::clone(&self.dom),
                    container,
                    &self.model,
                    &path,
                    config,
                    &self.defaults,
                )
            };
            let built = match field {
                FieldConfig::Single(config) => FieldBinds::Single(make(config)?),
                FieldConfig::Multi(configs) => FieldBinds::Multi(
                    configs.into_iter().map(make).collect::<Result<Vec<_>>>()?,
                ),
            };
            binds.push((path, built));
        }
        tracing::debug!(%container, entries = binds.len(), "binder built");

        Ok(Binder {
            dom: self.dom,
            model: self.model,
            container,
            binds,
        })
    }
}

// ---------------------------------------------------------------------------
// Binder
// ---------------------------------------------------------------------------

/// Owns every binding of one model/configuration pair.
pub struct Binder {
    dom: Rc<dyn Dom>,
    model: Model,
    container: NodeId,
    binds: Vec<(String, FieldBinds)>,
}

impl Binder {
    /// Start configuring a binder over `model`.
    pub fn builder(dom: Rc<dyn Dom>, model: &Model) -> BinderBuilder {
        BinderBuilder {
            dom,
            model: model.clone(),
            container: Container::Document,
            defaults: Defaults::default(),
            config: BinderConfig::new(),
        }
    }

    /// Build a binder scoped to the document with default settings.
    pub fn new(dom: Rc<dyn Dom>, model: &Model, config: BinderConfig) -> Result<Self> {
        Self::builder(dom, model).config(config).build()
    }

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn dom(&self) -> &dyn Dom {
        &*self.dom
    }

    /// The bindings configured for `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldBinds> {
        self.binds.iter().find(|(p, _)| p == path).map(|(_, b)| b)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldBinds)> {
        self.binds.iter().map(|(p, b)| (p.as_str(), b))
    }

    /// Number of configured fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.binds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    /// Activate every binding. Failures are logged and returned; the
    /// remaining bindings still activate.
    pub fn bind(&self) -> Vec<BindFailure> {
        let _span = tracing::debug_span!("binder.bind", fields = self.binds.len()).entered();
        let mut failures = Vec::new();
        for (path, binds) in &self.binds {
            for bind in binds.iter() {
                let outcome = catch_unwind(AssertUnwindSafe(|| bind.bind())).unwrap_or_else(|_| {
                    Err(BindError::HookPanicked { key: path.clone() })
                });
                if let Err(error) = outcome {
                    tracing::error!(key = %path, %error, "binding failed to activate");
                    failures.push(BindFailure {
                        key: path.clone(),
                        error,
                    });
                }
            }
        }
        failures
    }

    /// [`bind`](Self::bind), then call `done`.
    pub fn bind_with(&self, done: impl FnOnce(&Binder)) -> Vec<BindFailure> {
        let failures = self.bind();
        done(self);
        failures
    }

    /// Deactivate every binding.
    pub fn unbind(&self) {
        let _span = tracing::debug_span!("binder.unbind", fields = self.binds.len()).entered();
        for (_, binds) in &self.binds {
            for bind in binds.iter() {
                bind.unbind();
            }
        }
    }

    /// [`unbind`](Self::unbind), then call `done`.
    pub fn unbind_with(&self, done: impl FnOnce(&Binder)) {
        self.unbind();
        done(self);
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("container", &self.container)
            .field("binds", &self.binds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimo_dom::{DomEvent, MemoryDom};
    use bimo_model::{Record, Value};
    use std::cell::Cell;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    /// Records the `key` field of ERROR-level events.
    struct ErrorKeys(Arc<Mutex<Vec<String>>>);

    struct KeyVisitor(Option<String>);

    impl Visit for KeyVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "key" {
                self.0 = Some(format!("{value:?}"));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for ErrorKeys {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                let mut visitor = KeyVisitor(None);
                event.record(&mut visitor);
                if let (Some(key), Ok(mut keys)) = (visitor.0, self.0.lock()) {
                    keys.push(key);
                }
            }
        }
    }

    fn page() -> (Rc<MemoryDom>, NodeId, Model) {
        let dom = Rc::new(MemoryDom::new());
        let root = dom.element(dom.document(), "div", &[("id", "page-container")]);
        dom.element(root, "input", &[("class", "js-name"), ("type", "text")]);
        dom.element(root, "input", &[("class", "js-city"), ("type", "text")]);
        dom.element(root, "span", &[("class", "js-city-label")]);
        dom.element(dom.document(), "input", &[("class", "outside"), ("type", "text")]);
        let model = Model::new(
            Record::new()
                .with("user", "John Doe")
                .with("address", Record::new().with("city", "San Jose")),
        );
        (dom, root, model)
    }

    #[test]
    fn builds_one_bind_per_target() {
        let (dom, root, model) = page();
        let binder = Binder::builder(dom, &model)
            .container("#page-container")
            .field("user", ".js-name")
            .field(
                "address.city",
                vec![
                    BindConfig::from(".js-city"),
                    BindConfig::new().selector(".js-city-label").property("innerHTML").two_way(false),
                ],
            )
            .build()
            .expect("build");

        assert_eq!(binder.container(), root);
        assert_eq!(binder.len(), 2);
        assert!(matches!(binder.get("user"), Some(FieldBinds::Single(_))));
        let city = binder.get("address.city").expect("city");
        assert_eq!(city.len(), 2);
        assert!(city.iter().all(|b| b.key() == "city"));
        assert!(binder.get("age").is_none());
        let paths: Vec<&str> = binder.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, ["user", "address.city"]);
    }

    #[test]
    fn container_scopes_selectors() {
        let (dom, _, model) = page();
        let err = Binder::builder(dom.clone(), &model)
            .container("#page-container")
            .field("user", ".outside")
            .build()
            .err();
        assert_eq!(
            err,
            Some(BindError::ElementNotFound {
                selector: ".outside".into()
            })
        );

        let binder = Binder::new(dom, &model, BinderConfig::new().field("user", ".outside"))
            .expect("document scope");
        assert_eq!(binder.container(), binder.dom().document());
    }

    #[test]
    fn missing_container_is_an_error() {
        let (dom, _, model) = page();
        let err = Binder::builder(dom, &model).container("#nowhere").build().err();
        assert_eq!(
            err,
            Some(BindError::ContainerNotFound {
                selector: "#nowhere".into()
            })
        );
    }

    #[test]
    fn bind_and_unbind_every_target() {
        let (dom, root, model) = page();
        let binder = Binder::builder(dom.clone(), &model)
            .container(root)
            .field(
                "address.city",
                vec![
                    BindConfig::from(".js-city"),
                    BindConfig::new().selector(".js-city-label").property("innerHTML").two_way(false),
                ],
            )
            .build()
            .expect("build");
        let inputs = dom.query_selector_all(root, ".js-city");
        let [input] = inputs[..] else {
            panic!("one city input");
        };
        let label = dom.query_selector(root, ".js-city-label").expect("label");

        assert!(binder.bind().is_empty());
        assert_eq!(dom.prop(label, "innerHTML").as_text(), "San Jose");

        dom.change(input, "Fresno");
        assert_eq!(model.get_value("address.city"), Some(Value::from("Fresno")));
        assert_eq!(dom.prop(label, "innerHTML").as_text(), "Fresno");

        binder.unbind();
        model.set_value("address.city", "Oakland");
        assert_eq!(dom.prop(label, "innerHTML").as_text(), "Fresno");
        assert!(binder.get("address.city").expect("city").iter().all(|b| !b.is_active()));
    }

    #[test]
    fn one_failure_does_not_block_the_rest() {
        let (dom, root, model) = page();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(ErrorKeys(Arc::clone(&errors)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let binder = Binder::builder(dom.clone(), &model)
            .container(root)
            .field("nickname", ".js-name")
            .field("user", ".js-name")
            .field("address.zip", BindConfig::new().on("blur", |_, _: &DomEvent| {}))
            .build()
            .expect("build");

        let failures = binder.bind();
        let keys: Vec<&str> = failures.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["nickname", "address.zip"]);
        assert!(matches!(failures[0].error, BindError::UnknownField { .. }));
        assert!(binder.get("user").and_then(FieldBinds::first).is_some_and(Bind::is_active));
        assert_eq!(errors.lock().map(|e| e.len()).unwrap_or(0), 2);
    }

    #[test]
    fn panicking_hook_is_reported_and_later_entries_still_bind() {
        let (dom, root, model) = page();
        let binder = Binder::builder(dom.clone(), &model)
            .container(root)
            .field(
                "user",
                BindConfig::new()
                    .selector(".js-name")
                    .format(|_| panic!("format hook failed")),
            )
            .field("address.city", ".js-city")
            .build()
            .expect("build");

        let failures = binder.bind();
        assert_eq!(
            failures,
            [BindFailure {
                key: "user".into(),
                error: BindError::HookPanicked { key: "user".into() },
            }]
        );
        assert!(!binder.get("user").and_then(FieldBinds::first).is_some_and(Bind::is_active));

        let city = binder.get("address.city").and_then(FieldBinds::first).expect("city");
        assert!(city.is_active());
        assert_eq!(dom.prop(city.elements()[0], "value").as_text(), "San Jose");
    }

    #[test]
    fn completion_callbacks_run_after_the_pass() {
        let (dom, root, model) = page();
        let binder = Binder::builder(dom, &model)
            .container(root)
            .field("user", ".js-name")
            .build()
            .expect("build");
        let calls = Cell::new(0);

        let failures = binder.bind_with(|b| {
            assert!(b.get("user").and_then(FieldBinds::first).is_some_and(Bind::is_active));
            calls.set(calls.get() + 1);
        });
        assert!(failures.is_empty());
        binder.unbind_with(|b| {
            assert!(!b.get("user").and_then(FieldBinds::first).is_some_and(Bind::is_active));
            calls.set(calls.get() + 1);
        });
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn custom_defaults_apply_to_unset_settings() {
        let (dom, root, model) = page();
        let binder = Binder::builder(dom.clone(), &model)
            .container(root)
            .defaults(Defaults {
                two_way: true,
                event: "input".into(),
                property: "value".into(),
            })
            .field("user", ".js-name")
            .field("address.city", BindConfig::new().selector(".js-city").event("keyup"))
            .build()
            .expect("build");
        binder.bind();

        let user = binder.get("user").and_then(FieldBinds::first).expect("user");
        assert_eq!(user.event(), "input");
        let name = user.elements()[0];
        dom.input_text(name, "Typed");
        assert_eq!(model.get("user"), Some(Value::from("Typed")));

        let city = binder.get("address.city").and_then(FieldBinds::first).expect("city");
        assert_eq!(city.event(), "keyup");
    }
}
