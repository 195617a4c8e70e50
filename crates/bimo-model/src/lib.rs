#![forbid(unsafe_code)]

//! Observable, change-tracking data model for bimo.
//!
//! - [`Model`]: a shared record whose scalar fields are tracked. Writes
//!   compute a per-field [`Delta`] and notify [`Watcher`]s.
//! - [`Value`] / [`Record`]: the dynamic values a model is built from.
//! - [`Changes`]: the payload watchers receive, and the shape of
//!   [`Model::delta`].
//! - [`ModelBuilder`] / [`Formatter`]: per-field read/write transforms.
//! - [`path`]: dotted/bracket field addressing into nested models.
//!
//! # Architecture
//!
//! `Model` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Watchers are identified by their shared allocation, so the same handle
//! subscribed twice to a field is stored once and fires once per batch.
//!
//! # Invariants
//!
//! 1. Setting a field to its current value is a no-op (no delta update, no
//!    notification).
//! 2. After one change `delta[f] = {original: v0, previous: v0, actual: v1}`;
//!    after a second, `{original: v0, previous: v1, actual: v2}`.
//! 3. A field whose value returns to its original has no delta entry.
//! 4. Watchers are notified in subscription order.
//! 5. While suspended, no watcher runs; `resume` runs each distinct watcher
//!    of the changed fields exactly once, with the whole delta.
//! 6. A panicking watcher never prevents the remaining watchers from running.

pub mod delta;
pub mod formatter;
pub mod model;
pub mod path;
#[cfg(feature = "serde")]
mod serde_support;
pub mod value;
pub mod watcher;

pub use delta::{Changes, Delta};
pub use formatter::{Formatter, ModelBuilder};
pub use model::Model;
pub use value::{FileRef, Record, Value, iso_string};
pub use watcher::Watcher;
