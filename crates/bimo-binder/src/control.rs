#![forbid(unsafe_code)]

//! Per-control value coercion.
//!
//! | kind | control to model | model to control |
//! |------|------------------|------------------|
//! | checkbox | `checked` as a bool | `checked` = truthiness |
//! | file | picked files | never written |
//! | number | trimmed property parsed as a number; blank or unparsable yields the `empty` fallback, else 0 | property = display string |
//! | date | midnight UTC of `YYYY-MM-DD`, or null | first 10 chars of the ISO form |
//! | time | raw string | chars 11..16 of the ISO form |
//! | datetime-local | `YYYY-MM-DDTHH:MM[:SS]` read as UTC, or null | first 16 chars of the ISO form |
//! | other form control | the property as is | property = display string |
//! | anything else | `innerHTML` | `innerHTML` = display string |
//!
//! A null value resets the control: `checked` off, text properties to `""`.
//! Text and flag writes are skipped when the control already shows the
//! value, unless a refresh forces them.

use bimo_dom::{Dom, NodeId, Prop};
use bimo_model::{FileRef, Value, iso_string};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// How a node exchanges values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox,
    File,
    Number,
    Date,
    Time,
    DateTimeLocal,
    /// Any other `INPUT`, `SELECT` or `TEXTAREA`.
    Field,
    /// Not a form control: the value lives in `innerHTML`.
    Content,
}

impl ControlKind {
    #[must_use]
    pub fn detect(dom: &dyn Dom, node: NodeId) -> Self {
        if !dom.is_form_control(node) {
            return Self::Content;
        }
        match dom.input_type(node).as_str() {
            "checkbox" => Self::Checkbox,
            "file" => Self::File,
            "number" => Self::Number,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime-local" => Self::DateTimeLocal,
            _ => Self::Field,
        }
    }
}

fn prop_value(prop: Prop) -> Value {
    match prop {
        Prop::Text(s) => Value::Text(s),
        Prop::Bool(b) => Value::Bool(b),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Character-based substring, clamped to the input.
fn substr(s: &str, start: usize, len: usize) -> String {
    s.chars().skip(start).take(len).collect()
}

/// The ISO slice a date-like control shows, or `None` when `value` is
/// neither text nor a date.
fn iso_slice(value: &Value, start: usize, len: usize) -> Option<String> {
    match value {
        Value::Text(s) => Some(substr(s, start, len)),
        Value::Date(d) => Some(substr(&iso_string(d), start, len)),
        _ => None,
    }
}

/// Read the value a control currently holds.
pub(crate) fn extract(dom: &dyn Dom, node: NodeId, property: &str, empty: Option<&Value>) -> Value {
    match ControlKind::detect(dom, node) {
        ControlKind::Checkbox => Value::Bool(dom.prop(node, "checked").as_bool()),
        ControlKind::File => Value::Files(
            dom.files(node)
                .into_iter()
                .map(|f| FileRef::new(f.name, f.size, f.mime))
                .collect(),
        ),
        ControlKind::Number => match parse_number(&dom.prop(node, property).as_text()) {
            Some(n) => Value::Number(n),
            None => empty.cloned().unwrap_or(Value::Number(0.0)),
        },
        ControlKind::Date => parse_date(&dom.prop(node, "value").as_text()).map_or(Value::Null, Value::Date),
        ControlKind::DateTimeLocal => {
            parse_date_time(&dom.prop(node, "value").as_text()).map_or(Value::Null, Value::Date)
        }
        ControlKind::Time => Value::Text(dom.prop(node, "value").as_text()),
        ControlKind::Field => prop_value(dom.prop(node, property)),
        ControlKind::Content => Value::Text(dom.prop(node, "innerHTML").as_text()),
    }
}

/// Write `next` into `property` unless it is already there.
fn assign(dom: &dyn Dom, node: NodeId, property: &str, value: &Value, refresh: bool) {
    let current = dom.prop(node, property);
    let next = match current {
        Prop::Bool(_) => Prop::Bool(value.is_truthy()),
        Prop::Text(_) => Prop::Text(value.to_display_string()),
    };
    if current != next || refresh {
        dom.set_prop(node, property, next);
    }
}

/// Show `value` in a control.
pub(crate) fn apply(dom: &dyn Dom, node: NodeId, property: &str, value: &Value, refresh: bool) {
    let kind = ControlKind::detect(dom, node);
    if value.is_null() {
        match kind {
            ControlKind::Checkbox => dom.set_prop(node, "checked", Prop::Bool(false)),
            ControlKind::File => {}
            ControlKind::Content => assign(dom, node, "innerHTML", value, false),
            _ => {
                if dom.prop(node, property) != Prop::Text(String::new()) {
                    dom.set_prop(node, property, Prop::Text(String::new()));
                }
            }
        }
        return;
    }
    match kind {
        ControlKind::Checkbox => {
            let checked = value.is_truthy();
            if dom.prop(node, "checked").as_bool() != checked || refresh {
                dom.set_prop(node, "checked", Prop::Bool(checked));
            }
        }
        ControlKind::File => {}
        ControlKind::Date => set_slice(dom, node, value, 0, 10),
        ControlKind::Time => set_slice(dom, node, value, 11, 5),
        ControlKind::DateTimeLocal => set_slice(dom, node, value, 0, 16),
        ControlKind::Number | ControlKind::Field => assign(dom, node, property, value, refresh),
        ControlKind::Content => assign(dom, node, "innerHTML", value, refresh),
    }
}

fn set_slice(dom: &dyn Dom, node: NodeId, value: &Value, start: usize, len: usize) {
    if let Some(text) = iso_slice(value, start, len) {
        dom.set_prop(node, "value", Prop::Text(text));
    }
}
