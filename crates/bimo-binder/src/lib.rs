#![forbid(unsafe_code)]

//! Two-way binding between bimo models and DOM controls.
//!
//! - [`Bind`]: one model field bound to the nodes a selector matches.
//!   Model changes are pushed into the controls; control events are
//!   coerced by control type and written back to the model.
//! - [`Binder`]: builds one `Bind` per configured field (several for a
//!   multi-target field) and activates or deactivates them together.
//! - [`BinderConfig`] / [`BindConfig`]: typed configuration, also readable
//!   from JSON with the `serde` feature.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use bimo_binder::{Binder, BinderConfig};
//! use bimo_dom::{Dom, MemoryDom};
//! use bimo_model::{Model, Record, Value};
//!
//! let dom = Rc::new(MemoryDom::new());
//! let name = dom.element(dom.document(), "input", &[("class", "js-name")]);
//! let model = Model::new(Record::new().with("user", "John Doe"));
//!
//! let binder = Binder::new(dom.clone(), &model, BinderConfig::new().field("user", ".js-name"))?;
//! assert!(binder.bind().is_empty());
//! assert_eq!(dom.prop(name, "value").as_text(), "John Doe");
//!
//! dom.change(name, "Boba Fett");
//! assert_eq!(model.get("user"), Some(Value::from("Boba Fett")));
//! # Ok::<(), bimo_binder::BindError>(())
//! ```
//!
//! # Control coercion
//!
//! | Control | Read from control | Written to control |
//! |---------|-------------------|--------------------|
//! | checkbox | `checked` as a boolean | truthiness |
//! | file | selected files | never written |
//! | number | finite number, else the `empty` value or `0` | display string |
//! | date | midnight UTC of the day, or null | `YYYY-MM-DD` |
//! | time | text | `HH:MM` |
//! | datetime-local | UTC instant, or null | `YYYY-MM-DDTHH:MM` |
//! | other form control | the bound property | display string |
//! | any other element | `innerHTML` | display string |
//!
//! A control is only rewritten when its current value differs, unless the
//! change is a refresh.

pub mod bind;
pub mod binder;
pub mod config;
mod control;
#[cfg(feature = "serde")]
mod declarative;
pub mod error;

pub use bind::{Bind, HookArgs};
pub use binder::{Binder, BinderBuilder, FieldBinds};
pub use config::{
    BindConfig, BinderConfig, Container, Defaults, EventHandler, FieldConfig, FormatHook,
    OptionSource, OptionsFn, ReadHook, WriteHook,
};
pub use control::ControlKind;
pub use error::{BindError, BindFailure, Result};
