#![forbid(unsafe_code)]

//! A headless, in-memory document.
//!
//! [`MemoryDom`] keeps an arena of nodes behind a `RefCell`, so it can be
//! shared as `Rc<dyn Dom>` and still be mutated by listeners during
//! dispatch. It models just enough browser behavior for bindings:
//!
//! - `value`/`checked` attributes seed the matching properties;
//! - a `<select>`'s `value` is the value of its selected `<option>`, falling
//!   back to the first enabled option, and assigning it selects the option
//!   carrying that value;
//! - events do not bubble: only listeners on the target run.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use bimo_dom::{Dom, DomEvent, MemoryDom};
//!
//! let dom = MemoryDom::new();
//! let form = dom.element(dom.document(), "form", &[("id", "person")]);
//! let city = dom.element(form, "input", &[("name", "city"), ("value", "Kamino")]);
//!
//! let seen = Rc::new(Cell::new(0));
//! let hits = Rc::clone(&seen);
//! dom.add_event_listener(city, "change", Rc::new(move |_: &DomEvent| hits.set(hits.get() + 1)));
//!
//! assert_eq!(dom.query_selector(form, "[name=city]"), Some(city));
//! dom.change(city, "Geonosis");
//! assert_eq!(dom.prop(city, "value").as_text(), "Geonosis");
//! assert_eq!(seen.get(), 1);
//! ```

use std::cell::{Cell, RefCell};

use ahash::AHashMap;

use crate::host::{Dom, DomEvent, Listener, ListenerId, NodeId, OptionSpec, Prop, SelectedFile};
use crate::selector::{Selector, SelectorTarget};

const FLAG_PROPS: [&str; 5] = ["checked", "disabled", "readOnly", "required", "selected"];

#[derive(Debug, Default)]
struct NodeData {
    /// Lower-case tag, `#document` for the root.
    tag: String,
    attrs: Vec<(String, String)>,
    props: AHashMap<String, Prop>,
    display: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    files: Vec<SelectedFile>,
}

impl NodeData {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct Nodes {
    arena: Vec<NodeData>,
}

impl Nodes {
    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.arena.get(node.0 as usize)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.arena.get_mut(node.0 as usize)
    }

    /// Descendants of `scope` in document order, `scope` excluded.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .get(scope)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(data) = self.get(node) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.get(select)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|c| self.get(*c).is_some_and(|d| d.tag == "option"))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn flag(&self, node: NodeId, name: &str) -> bool {
        self.get(node)
            .and_then(|n| n.props.get(name))
            .is_some_and(Prop::as_bool)
    }

    fn text(&self, node: NodeId, name: &str) -> String {
        self.get(node)
            .and_then(|n| n.props.get(name))
            .map(Prop::as_text)
            .unwrap_or_default()
    }

    fn select_value(&self, select: NodeId) -> String {
        let options = self.options(select);
        options
            .iter()
            .find(|o| self.flag(**o, "selected"))
            .or_else(|| options.iter().find(|o| !self.flag(**o, "disabled")))
            .map(|o| self.text(*o, "value"))
            .unwrap_or_default()
    }

    fn select_option(&mut self, select: NodeId, value: &str) {
        for option in self.options(select) {
            let selected = self.text(option, "value") == value;
            if let Some(data) = self.get_mut(option) {
                data.props.insert("selected".to_owned(), Prop::Bool(selected));
            }
        }
    }
}

impl SelectorTarget for Nodes {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn local_name(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|n| n.tag.as_str())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node)?.attr(name)
    }
}

struct Registration {
    id: ListenerId,
    node: NodeId,
    kind: String,
    listener: Listener,
}

/// In-memory [`Dom`] implementation.
pub struct MemoryDom {
    nodes: RefCell<Nodes>,
    listeners: RefCell<Vec<Registration>>,
    next_listener: Cell<u64>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.nodes.borrow().arena.len())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl MemoryDom {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeData {
            tag: "#document".to_owned(),
            ..NodeData::default()
        };
        Self {
            nodes: RefCell::new(Nodes { arena: vec![root] }),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(1),
        }
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// A detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(u32::try_from(nodes.arena.len()).unwrap_or(u32::MAX));
        nodes.arena.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        });
        id
    }

    /// Move `child` under `parent`, as its last child.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.get(parent).is_none() || parent == child {
            return;
        }
        let old_parent = nodes.get(child).and_then(|n| n.parent);
        if let Some(old) = old_parent.and_then(|p| nodes.get_mut(p)) {
            old.children.retain(|c| *c != child);
        }
        if let Some(data) = nodes.get_mut(child) {
            data.parent = Some(parent);
        } else {
            return;
        }
        if let Some(data) = nodes.get_mut(parent) {
            data.children.push(child);
        }
    }

    /// Set an attribute. `value` and boolean attributes also seed their property.
    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(data) = nodes.get_mut(node) else {
            return;
        };
        match data.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_owned(),
            None => data.attrs.push((name.to_owned(), value.to_owned())),
        }
        match name {
            "value" => {
                data.props.insert("value".to_owned(), Prop::from(value));
            }
            "checked" | "disabled" | "required" | "selected" => {
                data.props.insert(name.to_owned(), Prop::Bool(true));
            }
            "readonly" => {
                data.props.insert("readOnly".to_owned(), Prop::Bool(true));
            }
            _ => {}
        }
    }

    /// Create `tag` with `attrs` and append it to `parent`.
    pub fn element(&self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attr(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow().attr(node, name).map(str::to_owned)
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Deliver an event of `kind` to the listeners of `target`.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, target: NodeId, kind: &str) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|r| r.node == target && r.kind == kind)
            .map(|r| (r.id, r.listener.clone()))
            .collect();
        let event = DomEvent {
            kind: kind.to_owned(),
            target,
        };
        let mut invoked = 0;
        for (id, listener) in snapshot {
            // A listener removed by an earlier one in this dispatch is skipped.
            if !self.listeners.borrow().iter().any(|r| r.id == id) {
                continue;
            }
            listener(&event);
            invoked += 1;
        }
        tracing::trace!(node = %target, kind, invoked, "dispatched");
        invoked
    }

    /// Simulate a user editing a control's value, then fire `change`.
    pub fn change(&self, node: NodeId, value: &str) -> usize {
        self.set_prop(node, "value", Prop::from(value));
        self.dispatch(node, "change")
    }

    /// Simulate typing into a control, then fire `input`.
    pub fn input_text(&self, node: NodeId, value: &str) -> usize {
        self.set_prop(node, "value", Prop::from(value));
        self.dispatch(node, "input")
    }

    /// Flip `checked`, then fire `change`.
    pub fn toggle(&self, node: NodeId) -> usize {
        let checked = self.prop(node, "checked").as_bool();
        self.set_prop(node, "checked", Prop::Bool(!checked));
        self.dispatch(node, "change")
    }

    /// Simulate picking files, then fire `change`.
    pub fn pick_files(&self, node: NodeId, files: Vec<SelectedFile>) -> usize {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node) {
            data.files = files;
        }
        self.dispatch(node, "change")
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// The `<option>`s of a `<select>`.
    #[must_use]
    pub fn options(&self, select: NodeId) -> Vec<OptionSpec> {
        let nodes = self.nodes.borrow();
        nodes
            .options(select)
            .into_iter()
            .map(|o| OptionSpec {
                value: nodes.text(o, "value"),
                text: nodes.text(o, "innerHTML"),
                selected: nodes.flag(o, "selected"),
                disabled: nodes.flag(o, "disabled"),
            })
            .collect()
    }

    /// Listeners registered on `node`, for every event type.
    #[must_use]
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.node == node)
            .count()
    }
}

impl Dom for MemoryDom {
    fn document(&self) -> NodeId {
        NodeId(0)
    }

    fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::trace!(selector, %err, "selector rejected");
                return Vec::new();
            }
        };
        let nodes = self.nodes.borrow();
        nodes
            .descendants(scope)
            .into_iter()
            .filter(|n| parsed.matches(&*nodes, *n))
            .collect()
    }

    fn node_name(&self, node: NodeId) -> String {
        self.nodes
            .borrow()
            .get(node)
            .map(|n| n.tag.to_ascii_uppercase())
            .unwrap_or_default()
    }

    fn input_type(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let Some(data) = nodes.get(node) else {
            return String::new();
        };
        match data.tag.as_str() {
            "input" => data
                .attr("type")
                .map_or_else(|| "text".to_owned(), str::to_ascii_lowercase),
            "select" => "select-one".to_owned(),
            "textarea" => "textarea".to_owned(),
            _ => String::new(),
        }
    }

    fn prop(&self, node: NodeId, name: &str) -> Prop {
        let nodes = self.nodes.borrow();
        let is_select = nodes.get(node).is_some_and(|n| n.tag == "select");
        if is_select && name == "value" {
            return Prop::Text(nodes.select_value(node));
        }
        match nodes.get(node).and_then(|n| n.props.get(name)) {
            Some(value) => value.clone(),
            None if FLAG_PROPS.contains(&name) => Prop::Bool(false),
            None => Prop::Text(String::new()),
        }
    }

    fn set_prop(&self, node: NodeId, name: &str, value: Prop) {
        let mut nodes = self.nodes.borrow_mut();
        let is_select = nodes.get(node).is_some_and(|n| n.tag == "select");
        if is_select && name == "value" {
            nodes.select_option(node, &value.as_text());
            return;
        }
        if let Some(data) = nodes.get_mut(node) {
            let value = if FLAG_PROPS.contains(&name) {
                Prop::Bool(value.as_bool())
            } else {
                value
            };
            data.props.insert(name.to_owned(), value);
        }
    }

    fn style_display(&self, node: NodeId) -> String {
        self.nodes
            .borrow()
            .get(node)
            .map(|n| n.display.clone())
            .unwrap_or_default()
    }

    fn set_style_display(&self, node: NodeId, display: &str) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node) {
            display.clone_into(&mut data.display);
        }
    }

    fn files(&self, node: NodeId) -> Vec<SelectedFile> {
        self.nodes
            .borrow()
            .get(node)
            .map(|n| n.files.clone())
            .unwrap_or_default()
    }

    fn clear_options(&self, select: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let options = nodes.options(select);
        if let Some(data) = nodes.get_mut(select) {
            data.children.retain(|c| !options.contains(c));
        }
        for option in options {
            if let Some(data) = nodes.get_mut(option) {
                data.parent = None;
            }
        }
    }

    fn append_option(&self, select: NodeId, option: OptionSpec) {
        let node = self.create_element("option");
        {
            let mut nodes = self.nodes.borrow_mut();
            if let Some(data) = nodes.get_mut(node) {
                data.attrs.push(("value".to_owned(), option.value.clone()));
                data.props.insert("value".to_owned(), Prop::Text(option.value));
                data.props.insert("innerHTML".to_owned(), Prop::Text(option.text));
                data.props.insert("selected".to_owned(), Prop::Bool(option.selected));
                data.props.insert("disabled".to_owned(), Prop::Bool(option.disabled));
            }
        }
        self.append_child(select, node);
    }

    fn add_event_listener(&self, node: NodeId, kind: &str, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push(Registration {
            id,
            node,
            kind: kind.to_owned(),
            listener,
        });
        id
    }

    fn remove_event_listener(&self, node: NodeId, kind: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners
            .iter()
            .position(|r| r.id == id && r.node == node && r.kind == kind)
        {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }
}
