#![forbid(unsafe_code)]

//! One model field bound to a set of DOM nodes.
//!
//! A [`Bind`] owns three callbacks, created once with the binding and held
//! for its whole life: the model watcher (model to control), the primary
//! control listener (control to model) and one listener per custom event.
//! Activation registers them, deactivation removes them. Each callback holds
//! a weak reference back to the binding, so the model and the document never
//! keep a dropped binding alive.
//!
//! # Invariants
//!
//! 1. An active binding has exactly one watcher subscription on its field
//!    and, when two-way, exactly one primary listener per element.
//! 2. Activating an active binding, or deactivating an inactive one, is a
//!    no-op.
//! 3. After deactivation neither direction propagates.
//! 4. Dropping the last handle deactivates the binding.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Selector matches nothing | `Bind::new` fails with `ElementNotFound` |
//! | Path names no tracked field | Activation fails with `UnknownField` |
//! | Custom events with no elements | Activation fails with `NoElements` |
//! | Write hook returns `None` | Control change is not assigned |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bimo_dom::{Dom, DomEvent, Listener, ListenerId, NodeId, OptionSpec, Prop};
use bimo_model::{Changes, Model, Value, Watcher, path};

use crate::config::{BindConfig, Defaults, EventHandler, FormatHook, OptionSource, ReadHook, WriteHook};
use crate::control;
use crate::error::{BindError, Result};

/// What a read, write or format hook sees.
pub struct HookArgs<'a> {
    pub bind: &'a Bind,
    pub value: &'a Value,
    /// The control that raised the change. Only set for write hooks.
    pub target: Option<NodeId>,
}

impl HookArgs<'_> {
    /// The binding's elements.
    #[must_use]
    pub fn elements(&self) -> &[NodeId] {
        self.bind.elements()
    }

    #[must_use]
    pub fn dom(&self) -> &dyn Dom {
        self.bind.dom()
    }
}

#[derive(Default)]
struct BindState {
    active: bool,
    attached: Vec<(NodeId, String, ListenerId)>,
}

struct BindInner {
    dom: Rc<dyn Dom>,
    model: Model,
    key: String,
    path: String,
    selector: Option<String>,
    elements: Vec<NodeId>,
    property: String,
    event: String,
    two_way: bool,
    display: Option<String>,
    place_holder: Option<String>,
    options: Option<OptionSource>,
    read: Option<ReadHook>,
    write: Option<WriteHook>,
    format: Option<FormatHook>,
    empty: Option<Value>,
    extras: Vec<(String, Value)>,
    watcher: Watcher,
    control_listener: Listener,
    custom: Vec<(String, Listener)>,
    state: RefCell<BindState>,
}

impl BindInner {
    fn detach(&self) {
        let attached = {
            let mut state = self.state.borrow_mut();
            if !state.active {
                return;
            }
            state.active = false;
            std::mem::take(&mut state.attached)
        };
        self.model.unwatch_field(&self.key, &self.watcher);
        for (node, kind, id) in attached {
            self.dom.remove_event_listener(node, &kind, id);
        }
    }
}

impl Drop for BindInner {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Shared handle to one binding.
#[derive(Clone)]
pub struct Bind {
    inner: Rc<BindInner>,
}

impl Bind {
    /// Build a binding for `path`, resolving its elements inside `container`.
    ///
    /// The path is resolved against `model`: a nested path binds the owning
    /// sub-model and its leaf field. Elements are resolved eagerly.
    pub fn new(
        dom: Rc<dyn Dom>,
        container: NodeId,
        model: &Model,
        path: &str,
        config: BindConfig,
        defaults: &Defaults,
    ) -> Result<Self> {
        let (owner, key) = match model.model_for(path) {
            Some(owner) => (owner, path::leaf(path)),
            None => {
                tracing::trace!(path, "path does not resolve; binding the top-level model");
                (model.clone(), path.to_owned())
            }
        };

        let elements = match (config.elements, &config.selector) {
            (Some(elements), _) => elements,
            (None, Some(selector)) => {
                let found = dom.query_selector_all(container, selector);
                if found.is_empty() {
                    return Err(BindError::ElementNotFound {
                        selector: selector.clone(),
                    });
                }
                found
            }
            (None, None) => Vec::new(),
        };

        let events: Vec<(String, EventHandler)> = config.events;
        let inner = Rc::new_cyclic(|weak: &Weak<BindInner>| {
            let w = weak.clone();
            let watcher = Watcher::new(move |changes| {
                if let Some(inner) = w.upgrade() {
                    Bind { inner }.model_changed(changes);
                }
            });
            let w = weak.clone();
            let control_listener: Listener = Rc::new(move |event: &DomEvent| {
                if let Some(inner) = w.upgrade() {
                    Bind { inner }.control_changed(event.target);
                }
            });
            let custom = events
                .into_iter()
                .map(|(name, handler)| {
                    let w = weak.clone();
                    let listener: Listener = Rc::new(move |event: &DomEvent| {
                        if let Some(inner) = w.upgrade() {
                            handler(&Bind { inner }, event);
                        }
                    });
                    (name, listener)
                })
                .collect();
            BindInner {
                dom,
                model: owner,
                key,
                path: path.to_owned(),
                selector: config.selector,
                elements,
                property: config.property.unwrap_or_else(|| defaults.property.clone()),
                event: config.event.unwrap_or_else(|| defaults.event.clone()),
                two_way: config.two_way.unwrap_or(defaults.two_way),
                display: config.display,
                place_holder: config.place_holder,
                options: config.options,
                read: config.read,
                write: config.write,
                format: config.format,
                empty: config.empty,
                extras: config.extras,
                watcher,
                control_listener,
                custom,
                state: RefCell::new(BindState::default()),
            }
        });
        Ok(Self { inner })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Leaf field name inside [`model`](Self::model).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// The path this binding was configured with.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// The model owning [`key`](Self::key); a sub-model for nested paths.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    #[must_use]
    pub fn dom(&self) -> &dyn Dom {
        &*self.inner.dom
    }

    #[must_use]
    pub fn elements(&self) -> &[NodeId] {
        &self.inner.elements
    }

    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        self.inner.selector.as_deref()
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.inner.property
    }

    #[must_use]
    pub fn event(&self) -> &str {
        &self.inner.event
    }

    #[must_use]
    pub fn is_two_way(&self) -> bool {
        self.inner.two_way
    }

    /// A pass-through value set with [`BindConfig::extra`].
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.inner
            .extras
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().active
    }

    /// Whether both handles refer to the same binding.
    #[must_use]
    pub fn same(&self, other: &Bind) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Value transfer
    // -----------------------------------------------------------------------

    /// The value `node` carries, after the write hook.
    ///
    /// `None` when the write hook declines the change.
    #[must_use]
    pub fn get_value(&self, node: NodeId) -> Option<Value> {
        let raw = control::extract(
            self.dom(),
            node,
            &self.inner.property,
            self.inner.empty.as_ref(),
        );
        match &self.inner.write {
            Some(write) => write(&HookArgs {
                bind: self,
                value: &raw,
                target: Some(node),
            }),
            None => Some(raw),
        }
    }

    /// Show `value` in every element. A read hook takes over entirely;
    /// `refresh` rewrites controls that already show the value.
    pub fn set_value(&self, value: &Value, refresh: bool) {
        if let Some(read) = &self.inner.read {
            read(&HookArgs {
                bind: self,
                value,
                target: None,
            });
            return;
        }
        if self.inner.elements.is_empty() {
            return;
        }
        let formatted;
        let shown = match &self.inner.format {
            Some(format) => {
                formatted = format(&HookArgs {
                    bind: self,
                    value,
                    target: None,
                });
                &formatted
            }
            None => value,
        };
        for node in &self.inner.elements {
            control::apply(self.dom(), *node, &self.inner.property, shown, refresh);
        }
    }

    fn current(&self) -> Value {
        self.inner.model.get(&self.inner.key).unwrap_or_default()
    }

    /// The watcher only listens to this binding's key, so any payload means
    /// the controls must catch up. A resume after a revert delivers a payload
    /// without that key.
    fn model_changed(&self, changes: &Changes) {
        self.set_value(&self.current(), changes.is_refresh());
    }

    fn control_changed(&self, target: NodeId) {
        if !self.inner.two_way {
            return;
        }
        match self.get_value(target) {
            Some(value) => self.inner.model.set(&self.inner.key, value),
            None => tracing::trace!(key = %self.inner.path, "write hook declined the change"),
        }
    }

    /// Rebuild the `<option>`s of `select`, selecting the one matching `selected`.
    fn populate_options(&self, select: NodeId, selected: &Value) {
        let Some(options) = &self.inner.options else {
            return;
        };
        let dom = self.dom();
        dom.clear_options(select);
        let selected = (!selected.is_null()).then(|| selected.to_display_string());
        if let Some(text) = &self.inner.place_holder {
            let nothing = selected.as_deref().is_none_or(str::is_empty);
            dom.append_option(
                select,
                OptionSpec::new("", text.clone()).disabled(true).selected(nothing),
            );
        }
        for (value, text) in options.items(self) {
            let hit = selected.as_deref() == Some(value.as_str());
            dom.append_option(select, OptionSpec::new(value, text).selected(hit));
        }
    }

    // -----------------------------------------------------------------------
    // Activation
    // -----------------------------------------------------------------------

    /// Activate (`true`) or deactivate (`false`).
    pub fn apply(&self, active: bool) -> Result<()> {
        if active {
            self.bind()
        } else {
            self.unbind();
            Ok(())
        }
    }

    /// Push the current value into the controls and start syncing.
    pub fn bind(&self) -> Result<()> {
        let _span = tracing::debug_span!("bind.activate", key = %self.inner.path).entered();
        if self.is_active() {
            return Ok(());
        }
        let inner = &self.inner;
        if !inner.model.has_field(&inner.key) {
            return Err(BindError::UnknownField {
                key: inner.path.clone(),
            });
        }
        if inner.elements.is_empty() && !inner.custom.is_empty() {
            return Err(BindError::NoElements {
                key: inner.path.clone(),
            });
        }

        if !inner.elements.is_empty() {
            let current = self.current();
            for node in &inner.elements {
                if self.dom().node_name(*node) == "SELECT" {
                    self.populate_options(*node, &current);
                }
            }
            self.set_value(&current, false);
        }

        inner.model.watch_field(&inner.key, &inner.watcher);
        let mut attached = Vec::new();
        if inner.two_way {
            for node in &inner.elements {
                let id = inner
                    .dom
                    .add_event_listener(*node, &inner.event, inner.control_listener.clone());
                attached.push((*node, inner.event.clone(), id));
            }
        }
        for (kind, listener) in &inner.custom {
            for node in &inner.elements {
                let id = inner.dom.add_event_listener(*node, kind, listener.clone());
                attached.push((*node, kind.clone(), id));
            }
        }
        let mut state = inner.state.borrow_mut();
        state.active = true;
        state.attached = attached;
        tracing::debug!(elements = inner.elements.len(), "bound");
        Ok(())
    }

    /// Stop syncing in both directions. Safe to call at any time.
    pub fn unbind(&self) {
        let _span = tracing::debug_span!("bind.deactivate", key = %self.inner.path).entered();
        self.inner.detach();
    }

    // -----------------------------------------------------------------------
    // Element flags
    // -----------------------------------------------------------------------

    fn first(&self) -> Option<NodeId> {
        self.inner.elements.first().copied()
    }

    fn set_all(&self, name: &str, value: bool) {
        for node in &self.inner.elements {
            self.dom().set_prop(*node, name, Prop::Bool(value));
        }
    }

    /// Whether the first element is displayed. True with no elements.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.first()
            .is_none_or(|node| self.dom().style_display(node) != "none")
    }

    /// Show every element using the configured display value, or hide it.
    pub fn set_visible(&self, visible: bool) {
        let display = if visible {
            self.inner.display.as_deref().unwrap_or("")
        } else {
            "none"
        };
        for node in &self.inner.elements {
            self.dom().set_style_display(*node, display);
        }
    }

    #[must_use]
    pub fn disabled(&self) -> bool {
        self.first()
            .is_some_and(|node| self.dom().prop(node, "disabled").as_bool())
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.set_all("disabled", disabled);
    }

    fn is_text_entry(&self, node: NodeId) -> bool {
        matches!(self.dom().node_name(node).as_str(), "INPUT" | "TEXTAREA")
    }

    /// `readOnly` of the first element; only inputs and textareas carry it.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.first().is_some_and(|node| {
            self.is_text_entry(node) && self.dom().prop(node, "readOnly").as_bool()
        })
    }

    /// Set `readOnly` on every input and textarea element.
    pub fn set_read_only(&self, read_only: bool) {
        for node in &self.inner.elements {
            if self.is_text_entry(*node) {
                self.dom().set_prop(*node, "readOnly", Prop::Bool(read_only));
            }
        }
    }

    #[must_use]
    pub fn required(&self) -> bool {
        self.first()
            .is_some_and(|node| self.dom().prop(node, "required").as_bool())
    }

    pub fn set_required(&self, required: bool) {
        self.set_all("required", required);
    }
}

impl fmt::Debug for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bind")
            .field("path", &self.inner.path)
            .field("key", &self.inner.key)
            .field("elements", &self.inner.elements)
            .field("property", &self.inner.property)
            .field("event", &self.inner.event)
            .field("two_way", &self.inner.two_way)
            .field("active", &self.is_active())
            .finish()
    }
}
