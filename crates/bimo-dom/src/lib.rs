#![forbid(unsafe_code)]

//! The DOM boundary consumed by bimo bindings.
//!
//! Bindings never touch a document directly. They go through the narrow,
//! object-safe [`Dom`] trait: element lookup scoped to a container, property
//! get/set, `style.display`, `<option>` population, and event listener
//! registration.
//!
//! - [`Dom`]: the consumed interface, used as `Rc<dyn Dom>`.
//! - [`MemoryDom`]: a headless document implementing [`Dom`], with building
//!   helpers and synthetic event dispatch. Tests and non-browser hosts use it.
//! - [`selector`]: the CSS selector subset understood by [`MemoryDom`].
//!
//! # Invariants
//!
//! 1. Query results are in document order and never include the scope node.
//! 2. Listeners run in registration order; a listener removed before dispatch
//!    never runs.
//! 3. Dispatch releases every internal borrow before calling a listener, so
//!    a listener may query or mutate the document, or dispatch again.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Malformed selector | Query returns no match; logged at `trace` |
//! | Unknown node id | Reads return neutral values; writes are ignored |

pub mod host;
pub mod memory;
pub mod selector;

pub use host::{Dom, DomEvent, Listener, ListenerId, NodeId, OptionSpec, Prop, SelectedFile};
pub use memory::MemoryDom;
pub use selector::{Selector, SelectorError};
