#![forbid(unsafe_code)]

//! Field path addressing.
//!
//! Paths are dotted (`address.city`); bracket indices are accepted and
//! normalized to the dotted form (`cars[0].make` == `cars.0.make`). Quotes
//! inside brackets are stripped (`a["b"]` == `a.b`).

/// Rewrite bracket syntax into dotted form.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.trim().chars() {
        match ch {
            '[' => out.push('.'),
            ']' | '"' | '\'' => {}
            c => out.push(c),
        }
    }
    out
}

/// Non-empty segments of a path.
#[must_use]
pub fn segments(path: &str) -> Vec<String> {
    normalize(path)
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Last segment of a path: the field name inside the owning model.
#[must_use]
pub fn leaf(path: &str) -> String {
    segments(path).pop().unwrap_or_default()
}
