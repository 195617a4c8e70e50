//! Property-based invariant tests over random user sessions on the sample page.
//!
//! 1. Reverting after any session restores the original form and leaves the
//!    model unchanged.
//! 2. During a session, text fields show exactly what the model holds.
//! 3. The delta names exactly the fields that differ from the sample record.

use bimo::model::Value;
use bimo_harness::{SampleApp, sample_record, user_session};
use proptest::prelude::*;

fn bound_app() -> SampleApp {
    let app = SampleApp::new().expect("sample app");
    app.page.click("bindBtn");
    app
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Revert undoes any session
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn revert_restores_original_form(session in user_session(16)) {
        let app = bound_app();
        let original = app.page.snapshot();
        for edit in &session {
            edit.apply(&app.page);
        }
        app.page.click("revertBtn");
        prop_assert!(!app.model.is_changed());
        prop_assert_eq!(app.page.snapshot(), original);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2-3. Form, model and delta agree
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn text_fields_mirror_the_model(session in user_session(16)) {
        let app = bound_app();
        for edit in &session {
            edit.apply(&app.page);
        }
        let shown = |sel: &str| app.page.value(sel);
        let held = |path: &str| app.model.get_value(path).map(|v| v.to_display_string());
        prop_assert_eq!(Some(shown(".js-name")), held("user"));
        prop_assert_eq!(Some(shown(".js-city")), held("address.city"));
        prop_assert_eq!(Some(shown(".js-state")), held("address.state"));
    }

    #[test]
    fn delta_names_exactly_the_changed_fields(session in user_session(16)) {
        let app = bound_app();
        for edit in &session {
            edit.apply(&app.page);
        }
        let start = sample_record();
        let delta = app.model.delta();
        for (key, original) in start.iter() {
            if original.is_record() {
                continue;
            }
            let now = app.model.get(key).unwrap_or(Value::Null);
            prop_assert_eq!(delta.contains(key), &now != original, "field {}", key);
        }
    }
}
