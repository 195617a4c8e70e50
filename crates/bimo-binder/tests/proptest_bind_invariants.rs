//! Property-based invariant tests for binding lifecycles.
//!
//! 1. Any sequence of activations and deactivations leaves at most one
//!    watcher on the field and one listener per element, and the binding is
//!    active exactly when the last call activated it.
//! 2. While active, after any interleaving of model writes and control edits
//!    the control shows the model value.
//! 3. While inactive, neither direction propagates.

use std::rc::Rc;

use bimo_binder::{Bind, BindConfig, Defaults};
use bimo_dom::{Dom, MemoryDom, NodeId};
use bimo_model::{Model, Record, Value};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Step {
    ModelWrite(String),
    ControlEdit(String),
}

fn text() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Kamino", "Geonosis", "Tatooine", "", "12345"])
        .prop_map(str::to_owned)
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        text().prop_map(Step::ModelWrite),
        text().prop_map(Step::ControlEdit),
    ]
}

fn fixture() -> (Rc<MemoryDom>, NodeId, Model, Bind) {
    let dom = Rc::new(MemoryDom::new());
    let input = dom.element(dom.document(), "input", &[("class", "js-city"), ("type", "text")]);
    let model = Model::new(Record::new().with("city", "Kamino"));
    let bind = Bind::new(
        dom.clone(),
        dom.document(),
        &model,
        "city",
        BindConfig::from(".js-city"),
        &Defaults::default(),
    )
    .expect("bind");
    (dom, input, model, bind)
}

fn run(dom: &MemoryDom, input: NodeId, model: &Model, steps: &[Step]) {
    for step in steps {
        match step {
            Step::ModelWrite(v) => model.set("city", v.as_str()),
            Step::ControlEdit(v) => {
                dom.change(input, v);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Subscriptions never accumulate
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn toggling_never_double_subscribes(ops in prop::collection::vec(any::<bool>(), 0..16)) {
        let (dom, input, model, bind) = fixture();
        for active in &ops {
            bind.apply(*active).expect("apply");
        }
        let active = ops.last().copied().unwrap_or(false);
        prop_assert_eq!(bind.is_active(), active);
        prop_assert_eq!(model.watcher_count("city"), usize::from(active));
        prop_assert_eq!(dom.listener_count(input), usize::from(active));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Active bindings converge
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn control_mirrors_model_while_active(steps in prop::collection::vec(step_strategy(), 0..24)) {
        let (dom, input, model, bind) = fixture();
        bind.bind().expect("activate");
        run(&dom, input, &model, &steps);
        let shown = dom.prop(input, "value").as_text();
        let held = model.get("city").map(|v| v.to_display_string());
        prop_assert_eq!(Some(shown), held);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Inactive bindings are inert
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn inactive_binding_is_inert(steps in prop::collection::vec(step_strategy(), 0..24)) {
        let (dom, input, model, bind) = fixture();
        bind.bind().expect("activate");
        bind.unbind();
        let shown_before = dom.prop(input, "value").as_text();
        let model_before = model.to_object();

        let mut last_edit = None;
        let mut last_write = None;
        for step in &steps {
            match step {
                Step::ModelWrite(v) => last_write = Some(v.clone()),
                Step::ControlEdit(v) => last_edit = Some(v.clone()),
            }
        }
        run(&dom, input, &model, &steps);

        let expected_model = last_write
            .map_or_else(|| model_before.get("city").cloned(), |v| Some(Value::from(v)));
        prop_assert_eq!(model.get("city"), expected_model);
        prop_assert_eq!(dom.prop(input, "value").as_text(), last_edit.unwrap_or(shown_before));
    }
}
