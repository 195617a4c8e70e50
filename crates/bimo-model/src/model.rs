#![forbid(unsafe_code)]

//! The change-tracking model.
//!
//! # Change pipeline
//!
//! Every [`Model::set`] on a tracked field runs, in order:
//!
//! 1. the field's write transform, if one is registered;
//! 2. the no-op check (equal values stop here: no delta, no notification);
//! 3. the backing-store update;
//! 4. the delta update (`original` is captured on the first change since the
//!    last reset);
//! 5. delta collapse: an entry whose `actual` equals its `original` is
//!    removed, while the notification for this transition still carries it;
//! 6. notification, or a pending count bump when suspended.
//!
//! Watchers run synchronously, after all internal borrows are released, so
//! a watcher may read or write the model re-entrantly.
//!
//! # Nesting
//!
//! Records in the construction data become child models, as do non-empty
//! lists made only of records (children keyed `"0"`, `"1"`, ...). Path
//! operations (`get_value`, `set_value`, `watch_field`, `revert`, `changed`,
//! `refresh`) walk children transparently. `suspend`, `resume`, `delta`,
//! `reset`, `revert_all`, `clear` and `clear_watchers` recurse into children
//! after handling the local level.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Unknown field in `set`/`watch`/`revert`/`changed` | Ignored |
//! | Unresolved path segment | `get_value` returns `None`; writes are ignored |
//! | Watcher panics | Logged; other watchers still run |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::rc::Rc;

use ahash::AHashMap;

use crate::delta::{Changes, Delta};
use crate::formatter::{Formatter, ModelBuilder};
use crate::path;
use crate::value::{Record, Value};
use crate::watcher::{self, Watcher};

#[derive(Default)]
struct ModelInner {
    /// Field and child names in declaration order.
    keys: Vec<String>,
    values: AHashMap<String, Value>,
    children: AHashMap<String, Model>,
    /// Built from a list of records; snapshots as a list.
    list: bool,
    watchers: AHashMap<String, Vec<Watcher>>,
    delta: BTreeMap<String, Delta>,
    suspended: bool,
    pending: usize,
    /// Fields changed while suspended, in first-change order.
    touched: Vec<String>,
    formatters: AHashMap<String, Formatter>,
}

/// Observable, change-tracking record.
///
/// `Model` is a shared handle: clones refer to the same state, the way a
/// child model handed to a binding is the same instance its parent owns.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use bimo_model::{Model, Record, Value, Watcher};
///
/// let model = Model::new(Record::new().with("city", "Kamino").with("age", 35));
/// let seen = Rc::new(RefCell::new(None));
/// let sink = Rc::clone(&seen);
/// model.watch_field("city", &Watcher::new(move |changes| {
///     *sink.borrow_mut() = changes.get("city").map(|d| d.actual.clone());
/// }));
///
/// model.set("city", "Geonosis");
/// assert_eq!(*seen.borrow(), Some(Value::from("Geonosis")));
/// ```
#[derive(Clone)]
pub struct Model {
    inner: Rc<RefCell<ModelInner>>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Record::new())
    }
}

impl From<Record> for Model {
    fn from(data: Record) -> Self {
        Self::new(data)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Model")
            .field("keys", &inner.keys)
            .field("changed", &inner.delta.len())
            .field("suspended", &inner.suspended)
            .finish()
    }
}

impl Model {
    /// Wrap a record. Every key becomes a tracked field or a child model.
    #[must_use]
    pub fn new(data: Record) -> Self {
        let model = Self {
            inner: Rc::new(RefCell::new(ModelInner::default())),
        };
        for (key, value) in data {
            model.install(key, value);
        }
        model
    }

    /// Start a builder that attaches read/write formatters.
    pub fn builder(data: Record) -> ModelBuilder {
        ModelBuilder::new(data)
    }

    fn from_list(items: Vec<Value>) -> Self {
        let model = Self::new(Record::new());
        model.inner.borrow_mut().list = true;
        for (i, item) in items.into_iter().enumerate() {
            model.install(i.to_string(), item);
        }
        model
    }

    fn install(&self, key: String, value: Value) {
        let child = match value {
            Value::Record(record) => Ok(Self::new(record)),
            Value::List(items) if !items.is_empty() && items.iter().all(Value::is_record) => {
                Ok(Self::from_list(items))
            }
            other => Err(other),
        };
        let mut inner = self.inner.borrow_mut();
        inner.keys.push(key.clone());
        match child {
            Ok(child) => {
                inner.children.insert(key, child);
            }
            Err(value) => {
                inner.values.insert(key, value);
            }
        }
    }

    pub(crate) fn install_formatter(&self, path: &str, formatter: Formatter) {
        let leaf = path::leaf(path);
        match self.model_for(path) {
            Some(owner) if owner.has_field(&leaf) => {
                owner
                    .inner
                    .borrow_mut()
                    .formatters
                    .entry(leaf)
                    .or_default()
                    .merge(formatter);
            }
            _ => tracing::trace!(path, "formatter path does not resolve; dropped"),
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Field and child names in declaration order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys.clone()
    }

    /// Whether `key` is a tracked field of this level.
    #[must_use]
    pub fn has_field(&self, key: &str) -> bool {
        self.inner.borrow().values.contains_key(key)
    }

    /// Direct child model.
    #[must_use]
    pub fn sub_model(&self, key: &str) -> Option<Model> {
        self.inner.borrow().children.get(key).cloned()
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.inner.borrow().suspended
    }

    /// Changes counted since the last `suspend`.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.inner.borrow().pending
    }

    /// Number of watchers subscribed to a field of this level.
    #[must_use]
    pub fn watcher_count(&self, key: &str) -> usize {
        self.inner.borrow().watchers.get(key).map_or(0, Vec::len)
    }

    /// Whether both handles refer to the same model.
    #[must_use]
    pub fn same(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn children(&self) -> Vec<Model> {
        let inner = self.inner.borrow();
        inner
            .keys
            .iter()
            .filter_map(|k| inner.children.get(k).cloned())
            .collect()
    }

    fn tracked_keys(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        inner
            .keys
            .iter()
            .filter(|k| inner.values.contains_key(k.as_str()))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Field access
    // -----------------------------------------------------------------------

    /// Read a field of this level, applying its read transform.
    ///
    /// A child model reads as a snapshot of its values.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.borrow();
        if let Some(value) = inner.values.get(key) {
            let value = value.clone();
            let read = inner.formatters.get(key).and_then(|f| f.read.clone());
            drop(inner);
            return Some(match read {
                Some(read) => read(&value),
                None => value,
            });
        }
        let child = inner.children.get(key).cloned();
        drop(inner);
        child.map(|c| c.snapshot())
    }

    /// Raw backing value, without the read transform.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// Assign a field of this level through the change pipeline.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let mut value = value.into();
        let write = self
            .inner
            .borrow()
            .formatters
            .get(key)
            .and_then(|f| f.write.clone());
        if let Some(write) = write {
            value = write(&value);
        }

        let dispatch = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match inner.values.get(key) {
                None => {
                    tracing::trace!(key, "set on unknown field ignored");
                    return;
                }
                Some(current) if *current == value => return,
                Some(_) => {}
            }
            let previous = inner
                .values
                .insert(key.to_owned(), value.clone())
                .unwrap_or_default();

            let transition = match inner.delta.entry(key.to_owned()) {
                Entry::Vacant(slot) => slot.insert(Delta::first(previous, value)).clone(),
                Entry::Occupied(mut slot) => {
                    slot.get_mut().advance(previous, value);
                    slot.get().clone()
                }
            };
            if transition.is_reverted() {
                inner.delta.remove(key);
            }

            if inner.suspended {
                inner.pending += 1;
                if !inner.touched.iter().any(|k| k == key) {
                    inner.touched.push(key.to_owned());
                }
                None
            } else {
                inner
                    .watchers
                    .get(key)
                    .filter(|list| !list.is_empty())
                    .map(|list| (list.clone(), Changes::single(key, transition)))
            }
        };

        if let Some((watchers, changes)) = dispatch {
            watcher::notify(&watchers, &changes);
        }
    }

    /// Add a field at runtime. An existing field is assigned instead.
    pub fn add(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let exists = {
            let inner = self.inner.borrow();
            inner.values.contains_key(key) || inner.children.contains_key(key)
        };
        if exists {
            self.set(key, value);
        } else {
            self.install(key.to_owned(), value);
        }
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// The model owning the leaf of `path`. A single-segment path resolves
    /// to `self`; a missing intermediate segment resolves to `None`.
    #[must_use]
    pub fn model_for(&self, path: &str) -> Option<Model> {
        let segments = path::segments(path);
        let parents = segments.split_last().map_or(&[][..], |(_, p)| p);
        let mut current = self.clone();
        for segment in parents {
            let next = current.sub_model(segment)?;
            current = next;
        }
        Some(current)
    }

    fn resolve(&self, path: &str) -> Option<(Model, String)> {
        let owner = self.model_for(path)?;
        Some((owner, path::leaf(path)))
    }

    /// Read through a path.
    #[must_use]
    pub fn get_value(&self, path: &str) -> Option<Value> {
        let (owner, leaf) = self.resolve(path)?;
        owner.get(&leaf)
    }

    /// Write through a path. Unresolved paths are ignored.
    pub fn set_value(&self, path: &str, value: impl Into<Value>) {
        match self.resolve(path) {
            Some((owner, leaf)) => owner.set(&leaf, value),
            None => tracing::trace!(path, "set_value on unresolved path ignored"),
        }
    }

    /// Notify the watchers of `path` with its current value and the refresh
    /// flag set, whether or not it changed.
    pub fn refresh(&self, path: &str) {
        let Some((owner, leaf)) = self.resolve(path) else {
            return;
        };
        let dispatch = {
            let inner = owner.inner.borrow();
            let Some(current) = inner.values.get(&leaf) else {
                return;
            };
            let delta = inner.delta.get(&leaf).cloned().unwrap_or_else(|| Delta {
                original: current.clone(),
                previous: current.clone(),
                actual: current.clone(),
            });
            inner
                .watchers
                .get(&leaf)
                .map(|list| (list.clone(), Changes::single(&leaf, delta).with_refresh()))
        };
        if let Some((watchers, changes)) = dispatch {
            watcher::notify(&watchers, &changes);
        }
    }

    // -----------------------------------------------------------------------
    // Watchers
    // -----------------------------------------------------------------------

    fn watch_local(&self, key: &str, watcher: &Watcher) {
        let mut inner = self.inner.borrow_mut();
        if !inner.values.contains_key(key) {
            tracing::trace!(key, "watch on unknown field ignored");
            return;
        }
        watcher::push_unique(inner.watchers.entry(key.to_owned()).or_default(), watcher);
    }

    fn unwatch_local(&self, key: &str, watcher: Option<&Watcher>) {
        let mut inner = self.inner.borrow_mut();
        match watcher {
            Some(w) => {
                if let Some(list) = inner.watchers.get_mut(key) {
                    watcher::remove(list, w);
                    if list.is_empty() {
                        inner.watchers.remove(key);
                    }
                }
            }
            None => {
                inner.watchers.remove(key);
            }
        }
    }

    fn each_path(paths: &str) -> impl Iterator<Item = &str> {
        paths.split_whitespace()
    }

    /// Subscribe to one field, or several separated by whitespace.
    /// Subscribing twice is a no-op.
    pub fn watch_field(&self, paths: &str, watcher: &Watcher) {
        for path in Self::each_path(paths) {
            if let Some((owner, leaf)) = self.resolve(path) {
                owner.watch_local(&leaf, watcher);
            }
        }
    }

    /// Subscribe to each listed field.
    pub fn watch_fields(&self, paths: &[&str], watcher: &Watcher) {
        for path in paths {
            self.watch_field(path, watcher);
        }
    }

    /// Subscribe to every tracked field of this level.
    pub fn watch_all(&self, watcher: &Watcher) {
        for key in self.tracked_keys() {
            self.watch_local(&key, watcher);
        }
    }

    /// Subscribe a different watcher per field.
    pub fn watch_map<'a>(&self, entries: impl IntoIterator<Item = (&'a str, Watcher)>) {
        for (path, watcher) in entries {
            self.watch_field(path, &watcher);
        }
    }

    /// Remove `watcher` from one field, or several separated by whitespace.
    pub fn unwatch_field(&self, paths: &str, watcher: &Watcher) {
        for path in Self::each_path(paths) {
            if let Some((owner, leaf)) = self.resolve(path) {
                owner.unwatch_local(&leaf, Some(watcher));
            }
        }
    }

    /// Remove every watcher of the named fields.
    pub fn unwatch_field_all(&self, paths: &str) {
        for path in Self::each_path(paths) {
            if let Some((owner, leaf)) = self.resolve(path) {
                owner.unwatch_local(&leaf, None);
            }
        }
    }

    /// Remove `watcher` from each listed field.
    pub fn unwatch_fields(&self, paths: &[&str], watcher: &Watcher) {
        for path in paths {
            self.unwatch_field(path, watcher);
        }
    }

    /// Remove `watcher` from every tracked field of this level.
    pub fn unwatch_all(&self, watcher: &Watcher) {
        for key in self.tracked_keys() {
            self.unwatch_local(&key, Some(watcher));
        }
    }

    /// Remove a different watcher per field.
    pub fn unwatch_map<'a>(&self, entries: impl IntoIterator<Item = (&'a str, Watcher)>) {
        for (path, watcher) in entries {
            self.unwatch_field(path, &watcher);
        }
    }

    /// Drop every watcher here and in all descendants.
    pub fn clear_watchers(&self) {
        self.inner.borrow_mut().watchers.clear();
        for child in self.children() {
            child.clear_watchers();
        }
    }

    // -----------------------------------------------------------------------
    // Batching
    // -----------------------------------------------------------------------

    /// Buffer notifications. Resets the pending counter; keeps the delta.
    pub fn suspend(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.suspended = true;
            inner.pending = 0;
            inner.touched.clear();
        }
        for child in self.children() {
            child.suspend();
        }
    }

    /// Stop buffering. If anything changed while suspended, every distinct
    /// watcher of the changed fields runs once with the whole delta.
    pub fn resume(&self) {
        let dispatch = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            inner.suspended = false;
            let touched = std::mem::take(&mut inner.touched);
            if inner.pending > 0 {
                inner.pending = 0;
                let watchers = watcher::distinct(
                    touched
                        .iter()
                        .filter_map(|k| inner.watchers.get(k).map(Vec::as_slice)),
                );
                Some((watchers, Changes::from_fields(inner.delta.clone())))
            } else {
                None
            }
        };
        if let Some((watchers, changes)) = dispatch {
            watcher::notify(&watchers, &changes);
        }
        for child in self.children() {
            child.resume();
        }
    }

    // -----------------------------------------------------------------------
    // Change tracking
    // -----------------------------------------------------------------------

    /// Copy of the delta, with non-empty child deltas keyed by child name.
    #[must_use]
    pub fn delta(&self) -> Changes {
        let (mut out, children) = {
            let inner = self.inner.borrow();
            let children: Vec<(String, Model)> = inner
                .keys
                .iter()
                .filter_map(|k| inner.children.get(k).map(|c| (k.clone(), c.clone())))
                .collect();
            (Changes::from_fields(inner.delta.clone()), children)
        };
        for (key, child) in children {
            let nested = child.delta();
            if !nested.is_empty() {
                out.insert_nested(&key, nested);
            }
        }
        out
    }

    /// Forget change history; current values become the new originals.
    pub fn reset(&self) {
        self.inner.borrow_mut().delta.clear();
        for child in self.children() {
            child.reset();
        }
    }

    fn revert_local(&self, key: &str) {
        let original = self
            .inner
            .borrow()
            .delta
            .get(key)
            .map(|d| d.original.clone());
        if let Some(original) = original {
            self.set(key, original);
        }
    }

    /// Restore the named fields (paths) to their original values.
    pub fn revert(&self, paths: &[&str]) {
        for path in paths.iter().flat_map(|p| Self::each_path(p)) {
            if let Some((owner, leaf)) = self.resolve(path) {
                owner.revert_local(&leaf);
            }
        }
    }

    /// Restore every changed field here and in all descendants.
    pub fn revert_all(&self) {
        for key in self.tracked_keys() {
            self.revert_local(&key);
        }
        for child in self.children() {
            child.revert_all();
        }
    }

    fn changed_local(&self, key: &str) -> bool {
        let inner = self.inner.borrow();
        match (inner.delta.get(key), inner.values.get(key)) {
            (Some(delta), Some(current)) => delta.original != *current,
            _ => false,
        }
    }

    /// Whether any named field (path) differs from its original value.
    #[must_use]
    pub fn changed(&self, paths: &[&str]) -> bool {
        paths
            .iter()
            .flat_map(|p| Self::each_path(p))
            .any(|path| {
                self.resolve(path)
                    .is_some_and(|(owner, leaf)| owner.changed_local(&leaf))
            })
    }

    /// Whether anything in the model changed since the last reset.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.delta().is_empty()
    }

    // -----------------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------------

    /// Set every field to the neutral value of its kind.
    pub fn clear(&self) {
        self.clear_with(&Record::new());
    }

    /// Like [`clear`](Self::clear), taking values from `overrides` where
    /// present. Child models take their overrides from nested records.
    pub fn clear_with(&self, overrides: &Record) {
        for key in self.keys() {
            if let Some(child) = self.sub_model(&key) {
                let empty = Record::new();
                let nested = overrides
                    .get(&key)
                    .and_then(Value::as_record)
                    .unwrap_or(&empty);
                child.clear_with(nested);
            } else if let Some(current) = self.raw(&key) {
                let next = overrides
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| current.zero_like());
                self.set(&key, next);
            }
        }
    }

    /// Deep snapshot of current (raw) values, children included.
    #[must_use]
    pub fn to_object(&self) -> Record {
        let inner = self.inner.borrow();
        inner
            .keys
            .iter()
            .map(|k| {
                let value = match (inner.values.get(k), inner.children.get(k)) {
                    (Some(v), _) => v.clone(),
                    (None, Some(child)) => child.snapshot(),
                    (None, None) => Value::Null,
                };
                (k.clone(), value)
            })
            .collect()
    }

    fn snapshot(&self) -> Value {
        let list = self.inner.borrow().list;
        let record = self.to_object();
        if list {
            Value::List(record.into_iter().map(|(_, v)| v).collect())
        } else {
            Value::Record(record)
        }
    }
}
