#![forbid(unsafe_code)]

//! The [`Dom`] trait and the plain types crossing it.

use std::fmt;
use std::rc::Rc;

/// Handle to a node of a [`Dom`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by [`Dom::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A DOM property value. Text properties (`value`, `innerHTML`) and flag
/// properties (`checked`, `disabled`) share one accessor pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    Text(String),
    Bool(bool),
}

impl Prop {
    /// Text form. Flags read as `"true"`/`"false"`.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Flag form. Text reads as `true` when non-empty.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Bool(b) => *b,
        }
    }
}

impl From<&str> for Prop {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Prop {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Prop {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A file picked in a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
}

/// One `<option>` of a `<select>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSpec {
    pub value: String,
    pub text: String,
    pub selected: bool,
    pub disabled: bool,
}

impl OptionSpec {
    #[must_use]
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// An event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    /// Event type, e.g. `"change"`.
    pub kind: String,
    pub target: NodeId,
}

pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// The document operations a binding needs.
///
/// Node names are upper case (`"INPUT"`); input types are lower case, with
/// `"select-one"` for `<select>`, `"textarea"` for `<textarea>` and an empty
/// string for elements that are not form controls.
pub trait Dom {
    /// The document root, the default query scope.
    fn document(&self) -> NodeId;

    /// First descendant of `scope` matching `selector`.
    fn query_selector(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.query_selector_all(scope, selector).into_iter().next()
    }

    /// Every descendant of `scope` matching `selector`, in document order.
    fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId>;

    fn node_name(&self, node: NodeId) -> String;

    fn input_type(&self, node: NodeId) -> String;

    fn prop(&self, node: NodeId, name: &str) -> Prop;

    fn set_prop(&self, node: NodeId, name: &str, value: Prop);

    fn style_display(&self, node: NodeId) -> String;

    fn set_style_display(&self, node: NodeId, display: &str);

    /// Files currently picked in a file input.
    fn files(&self, node: NodeId) -> Vec<SelectedFile>;

    /// Remove every `<option>` of a `<select>`.
    fn clear_options(&self, select: NodeId);

    fn append_option(&self, select: NodeId, option: OptionSpec);

    fn add_event_listener(&self, node: NodeId, kind: &str, listener: Listener) -> ListenerId;

    /// Returns whether the listener was registered on `node` for `kind`.
    fn remove_event_listener(&self, node: NodeId, kind: &str, id: ListenerId) -> bool;

    /// Whether the node is a form control (`INPUT`, `SELECT`, `TEXTAREA`).
    fn is_form_control(&self, node: NodeId) -> bool {
        matches!(
            self.node_name(node).as_str(),
            "INPUT" | "SELECT" | "TEXTAREA"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prop_conversions() {
        assert_eq!(Prop::from("x").as_text(), "x");
        assert!(Prop::from("x").as_bool());
        assert!(!Prop::from("").as_bool());
        assert_eq!(Prop::from(true).as_text(), "true");
    }

    #[test]
    fn option_builder() {
        let opt = OptionSpec::new("", "Pick one").disabled(true).selected(true);
        assert!(opt.disabled && opt.selected);
        assert_eq!(opt.text, "Pick one");
    }
}
