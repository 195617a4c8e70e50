//! Property-based invariant tests for the change-tracking model.
//!
//! 1. A field is in the delta exactly when its value differs from the
//!    construction value.
//! 2. Delta `original` is the construction value; `actual` is the current one.
//! 3. `revert_all` restores the construction snapshot.
//! 4. A watcher sees one call per effective unsuspended write.
//! 5. A suspended batch yields at most one call per watcher.
//! 6. Path normalization is idempotent and `leaf` is the last segment.

use std::cell::Cell;
use std::rc::Rc;

use bimo_model::{Model, Record, Value, Watcher, path};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const FIELDS: [&str; 4] = ["city", "age", "zip", "member"];

fn initial() -> Record {
    Record::new()
        .with("city", "Kamino")
        .with("age", 35)
        .with("zip", "12345")
        .with("member", false)
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i32..5).prop_map(Value::from),
        prop::sample::select(vec!["Kamino", "Geonosis", "Tatooine", "12345", ""])
            .prop_map(Value::from),
    ]
}

fn write_strategy() -> impl Strategy<Value = Vec<(usize, Value)>> {
    prop::collection::vec((0..FIELDS.len(), value_strategy()), 0..24)
}

fn counter(model: &Model) -> Rc<Cell<usize>> {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    model.watch_all(&Watcher::new(move |_| h.set(h.get() + 1)));
    hits
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Delta mirrors the difference from construction
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn delta_tracks_difference_from_original(writes in write_strategy()) {
        let model = Model::new(initial());
        let start = initial();
        for (i, value) in &writes {
            model.set(FIELDS[*i], value.clone());
        }
        let delta = model.delta();
        for field in FIELDS {
            let now = model.get(field);
            let was = start.get(field).cloned();
            match delta.get(field) {
                Some(d) => {
                    prop_assert_ne!(now.clone(), was.clone());
                    prop_assert_eq!(Some(d.original.clone()), was);
                    prop_assert_eq!(Some(d.actual.clone()), now);
                }
                None => prop_assert_eq!(now, was),
            }
        }
        prop_assert_eq!(model.is_changed(), !delta.is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. revert_all restores the snapshot
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn revert_all_restores_construction(writes in write_strategy()) {
        let model = Model::new(initial());
        for (i, value) in writes {
            model.set(FIELDS[i], value);
        }
        model.revert_all();
        prop_assert_eq!(model.to_object(), initial());
        prop_assert!(!model.is_changed());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. One notification per effective write
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn one_call_per_effective_write(writes in write_strategy()) {
        let model = Model::new(initial());
        let hits = counter(&model);
        let mut expected = 0;
        for (i, value) in writes {
            if model.get(FIELDS[i]).as_ref() != Some(&value) {
                expected += 1;
            }
            model.set(FIELDS[i], value);
        }
        prop_assert_eq!(hits.get(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Suspended batches collapse
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn suspended_batch_notifies_at_most_once(writes in write_strategy()) {
        let model = Model::new(initial());
        let hits = counter(&model);
        model.suspend();
        for (i, value) in &writes {
            model.set(FIELDS[*i], value.clone());
        }
        prop_assert_eq!(hits.get(), 0);
        let pending = model.pending_changes();
        model.resume();
        prop_assert_eq!(hits.get(), usize::from(pending > 0));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Paths
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in "[a-z0-9\\.\\[\\]\"]{0,16}") {
        let once = path::normalize(&raw);
        prop_assert_eq!(path::normalize(&once), once);
    }

    #[test]
    fn leaf_is_last_segment(raw in "[a-z]{1,4}(\\.[a-z]{1,4}){0,3}") {
        let segments = path::segments(&raw);
        prop_assert_eq!(Some(path::leaf(&raw)), segments.last().cloned());
    }
}
