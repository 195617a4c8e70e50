#![forbid(unsafe_code)]

//! bimo public facade crate.
//!
//! Observable change-tracking models ([`Model`]) and two-way binding of
//! their fields to DOM controls ([`Binder`]). The member crates are
//! re-exported whole as [`model`], [`dom`] and [`binder`]; the types most
//! programs need are also at the root and in [`prelude`].

pub use bimo_binder as binder;
pub use bimo_dom as dom;
pub use bimo_model as model;

pub use bimo_binder::{
    Bind, BindConfig, BindError, BindFailure, Binder, BinderConfig, Container, Defaults,
    FieldBinds, HookArgs, OptionSource,
};
pub use bimo_dom::{Dom, DomEvent, MemoryDom, NodeId};
pub use bimo_model::{Changes, Delta, Model, Record, Value, Watcher};

pub mod prelude {
    pub use bimo_binder as binder;
    pub use bimo_dom as dom;
    pub use bimo_model as model;

    pub use bimo_binder::{BindConfig, Binder, BinderConfig, HookArgs};
    pub use bimo_dom::{Dom, MemoryDom};
    pub use bimo_model::{Model, Record, Value, Watcher};
}
