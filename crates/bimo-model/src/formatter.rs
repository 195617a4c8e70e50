#![forbid(unsafe_code)]

//! Per-field read/write transforms registered at construction.
//!
//! A read transform runs on every [`Model::get`]; a write transform runs on
//! every [`Model::set`] before the equality check, so it can parse or
//! normalize incoming values.

use std::rc::Rc;

use crate::model::Model;
use crate::value::{Record, Value};

pub(crate) type TransformFn = Rc<dyn Fn(&Value) -> Value>;

/// The pair of optional transforms attached to one field.
#[derive(Clone, Default)]
pub struct Formatter {
    pub(crate) read: Option<TransformFn>,
    pub(crate) write: Option<TransformFn>,
}

impl Formatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn read(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.read = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn write(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.write = Some(Rc::new(f));
        self
    }

    pub(crate) fn merge(&mut self, other: Formatter) {
        if other.read.is_some() {
            self.read = other.read;
        }
        if other.write.is_some() {
            self.write = other.write;
        }
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("read", &self.read.is_some())
            .field("write", &self.write.is_some())
            .finish()
    }
}

/// Builds a [`Model`] with formatters attached by path.
///
/// ```
/// use bimo_model::{Model, Record, Value};
///
/// let model = Model::builder(Record::new().with("name", "boba"))
///     .write("name", |v| Value::from(v.to_display_string().to_uppercase()))
///     .build();
///
/// model.set("name", "fett");
/// assert_eq!(model.get("name"), Some(Value::from("FETT")));
/// ```
#[must_use]
pub struct ModelBuilder {
    data: Record,
    formatters: Vec<(String, Formatter)>,
}

impl ModelBuilder {
    pub(crate) fn new(data: Record) -> Self {
        Self {
            data,
            formatters: Vec::new(),
        }
    }

    /// Transform applied when `path` is read.
    pub fn read(mut self, path: &str, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.formatters
            .push((path.to_owned(), Formatter::new().read(f)));
        self
    }

    /// Transform applied when `path` is written.
    pub fn write(mut self, path: &str, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.formatters
            .push((path.to_owned(), Formatter::new().write(f)));
        self
    }

    /// Attach a prepared formatter pair.
    pub fn formatter(mut self, path: &str, formatter: Formatter) -> Self {
        self.formatters.push((path.to_owned(), formatter));
        self
    }

    /// Build the model. Formatters whose path does not resolve are dropped.
    #[must_use]
    pub fn build(self) -> Model {
        let model = Model::new(self.data);
        for (path, formatter) in self.formatters {
            model.install_formatter(&path, formatter);
        }
        model
    }
}
