#![forbid(unsafe_code)]

//! Test harness and reference fixtures for bimo.
//!
//! - [`sample`]: the sample person form, its model record, binder
//!   configuration and a fully wired [`SampleApp`].
//! - [`edits`]: simulated user edits and proptest strategies over them.
//!
//! Fixtures run on [`MemoryDom`](bimo::dom::MemoryDom), so every scenario is
//! deterministic and headless.

pub mod edits;
pub mod sample;

pub use edits::{UserEdit, user_edit, user_session};
pub use sample::{
    CARS, MOVIES, STATES, SampleApp, SamplePage, model_json, sample_config, sample_record,
    state_name,
};
