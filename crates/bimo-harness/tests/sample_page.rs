#![forbid(unsafe_code)]

//! Integration tests: the sample person form, driven through its toolbar.

use bimo::dom::{Dom, Prop};
use bimo::model::Value;
use bimo_harness::{SampleApp, UserEdit};
use serde_json::json;

fn bound_app() -> SampleApp {
    let app = SampleApp::new().expect("sample app");
    assert_eq!(app.page.click("bindBtn"), 1);
    app
}

fn initial_form() -> serde_json::Value {
    json!({
        "user": "John Doe",
        "member": false,
        "gender": "male",
        "birthday": "1987-12-23",
        "age": "34",
        "cars": [],
        "movies": [],
        "state": "CA",
        "stateName": "California",
        "city": "San Jose",
        "min": "23",
        "max": "34",
    })
}

// ============================================================================
// Activation
// ============================================================================

#[test]
fn nothing_is_shown_before_binding() {
    let app = SampleApp::new().expect("sample app");
    let form = app.page.snapshot();
    assert_eq!(form["user"], "");
    assert_eq!(form["gender"], serde_json::Value::Null);
    assert_eq!(form["stateName"], "");
    assert!(app.json_out().is_none());
}

#[test]
fn bind_button_pushes_every_field() {
    let app = bound_app();
    assert_eq!(app.page.snapshot(), initial_form());
    assert_eq!(app.binder.len(), 11);

    let out = app.json_out().expect("json-out");
    assert_eq!(out["data"]["user"], "John Doe");
    assert_eq!(out["data"]["address"]["city"], "San Jose");
    assert_eq!(out["changes"], json!({}));
}

#[test]
fn state_select_gets_place_holder_and_lookup() {
    let app = bound_app();
    let select = app.page.node(".js-state").expect("state select");
    let options = app.page.dom.options(select);
    assert_eq!(options.len(), 52);
    assert_eq!(options[0].text, "Select a state");
    assert!(options[0].disabled && !options[0].selected);
    assert_eq!((options[1].value.as_str(), options[1].text.as_str()), ("AL", "Alabama"));
    assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
}

// ============================================================================
// Control to model
// ============================================================================

#[test]
fn typed_name_reaches_model_and_json_out() {
    let app = bound_app();
    UserEdit::TypeName("Boba Fett".into()).apply(&app.page);

    assert_eq!(app.model.get("user"), Some(Value::from("Boba Fett")));
    let out = app.json_out().expect("json-out");
    assert_eq!(
        out["changes"]["user"],
        json!({ "original": "John Doe", "previous": "John Doe", "actual": "Boba Fett" })
    );
    assert_eq!(app.notifications.borrow().last().map(String::as_str), Some("user"));
}

#[test]
fn picking_a_state_updates_the_label() {
    let app = bound_app();
    UserEdit::PickState("NY").apply(&app.page);

    assert_eq!(app.model.get_value("address.state"), Some(Value::from("NY")));
    assert_eq!(app.page.snapshot()["stateName"], "New York");
    let delta = app.model.delta();
    let address = delta.nested("address").expect("nested delta");
    assert_eq!(address.get("state").map(|d| d.actual.clone()), Some(Value::from("NY")));
}

#[test]
fn radios_and_checkbox_groups_round_trip_through_hooks() {
    let app = bound_app();
    UserEdit::PickGender("female").apply(&app.page);
    UserEdit::ToggleMovie("alien").apply(&app.page);
    UserEdit::ToggleMovie("star-wars").apply(&app.page);
    UserEdit::ToggleMember.apply(&app.page);

    assert_eq!(app.model.get("gender"), Some(Value::from("female")));
    assert_eq!(
        app.model.get("movies"),
        Some(Value::List(vec![Value::from("star-wars"), Value::from("alien")]))
    );
    assert_eq!(app.model.get("member"), Some(Value::Bool(true)));

    app.model.set("movies", Value::List(vec![Value::from("blade-runner")]));
    app.model.set("gender", "male");
    let form = app.page.snapshot();
    assert_eq!(form["movies"], json!(["blade-runner"]));
    assert_eq!(form["gender"], "male");
}

#[test]
fn multi_select_collects_selected_options() {
    let app = bound_app();
    UserEdit::ToggleCar("volvo").apply(&app.page);
    UserEdit::ToggleCar("audi").apply(&app.page);
    assert_eq!(
        app.model.get("cars"),
        Some(Value::List(vec![Value::from("volvo"), Value::from("audi")]))
    );

    app.model.set("cars", Value::List(vec![Value::from("saab")]));
    assert_eq!(app.page.snapshot()["cars"], json!(["saab"]));
}

#[test]
fn numeric_hooks_parse_and_suppress_zero() {
    let app = bound_app();
    UserEdit::TypeMin("12".into()).apply(&app.page);
    assert_eq!(app.model.get_value("address.min"), Some(Value::Number(12.0)));

    UserEdit::TypeMin("lots".into()).apply(&app.page);
    assert_eq!(app.model.get_value("address.min"), Some(Value::Number(0.0)));
    assert_eq!(app.page.value("#address-min"), "");

    app.model.set_value("address.max", 99);
    assert_eq!(app.page.value("#address-max"), "99");

    UserEdit::TypeAge("forty".into()).apply(&app.page);
    assert_eq!(app.model.get("age"), Some(Value::Number(0.0)));
    assert_eq!(app.page.value(".js-age"), "0");
}

#[test]
fn city_syncs_on_keyup_only() {
    let app = bound_app();
    let city = app.page.node(".js-city").expect("city");
    app.page.dom.change(city, "Fresno");
    assert_eq!(app.model.get_value("address.city"), Some(Value::from("San Jose")));

    UserEdit::TypeCity("Oakland".into()).apply(&app.page);
    assert_eq!(app.model.get_value("address.city"), Some(Value::from("Oakland")));
}

#[test]
fn custom_events_fire_their_handlers() {
    let app = bound_app();
    let age = app.page.node(".js-age").expect("age");
    let city = app.page.node(".js-city").expect("city");
    app.page.dom.dispatch(age, "focus");
    app.page.dom.dispatch(city, "blur");
    assert_eq!(*app.events.borrow(), ["Age here", "Leaving city"]);
}

// ============================================================================
// Model to control
// ============================================================================

#[test]
fn programmatic_writes_reach_the_form() {
    let app = bound_app();
    app.model.set("user", "Jango Fett");
    app.model.set("member", true);
    app.model.set_value("address.state", "WY");
    let form = app.page.snapshot();
    assert_eq!(form["user"], "Jango Fett");
    assert_eq!(form["member"], true);
    assert_eq!(form["state"], "WY");
    assert_eq!(form["stateName"], "Wyoming");
}

#[test]
fn clear_resets_controls_to_neutral_values() {
    let app = bound_app();
    UserEdit::ToggleCar("saab").apply(&app.page);
    app.page.click("clearBtn");

    assert_eq!(
        app.page.snapshot(),
        json!({
            "user": "",
            "member": false,
            "gender": null,
            "birthday": "",
            "age": "0",
            "cars": [],
            "movies": [],
            "state": "",
            "stateName": "",
            "city": "",
            "min": "",
            "max": "",
        })
    );
    let select = app.page.node(".js-state").expect("state select");
    assert!(app.page.dom.options(select)[0].selected);
}

#[test]
fn refresh_rewrites_a_stale_control() {
    let app = bound_app();
    let age = app.page.node(".js-age").expect("age");
    app.page.dom.set_prop(age, "value", Prop::from("99"));
    app.page.click("refreshBtn");
    assert_eq!(app.page.value(".js-age"), "34");
    assert!(!app.model.is_changed());
}

#[test]
fn revert_restores_the_original_form() {
    let app = bound_app();
    for edit in [
        UserEdit::TypeName("Boba Fett".into()),
        UserEdit::PickState("NV"),
        UserEdit::ToggleMovie("alien"),
        UserEdit::TypeMin("0".into()),
    ] {
        edit.apply(&app.page);
    }
    assert!(app.model.is_changed());

    app.page.click("revertBtn");
    assert!(!app.model.is_changed());
    assert_eq!(app.page.snapshot(), initial_form());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn suspended_changes_notify_once_on_resume() {
    let app = bound_app();
    let before = app.notifications.borrow().len();

    app.page.click("suspendBtn");
    UserEdit::TypeName("Boba Fett".into()).apply(&app.page);
    app.model.set("age", 35);
    assert_eq!(app.notifications.borrow().len(), before);
    assert_eq!(app.page.value(".js-age"), "34");

    app.page.click("resumeBtn");
    assert_eq!(app.notifications.borrow().len(), before + 1);
    assert_eq!(app.notifications.borrow().last().map(String::as_str), Some("age,user"));
    assert_eq!(app.page.value(".js-age"), "35");
}

#[test]
fn revert_while_suspended_restores_controls_on_resume() {
    let app = bound_app();
    UserEdit::TypeName("Boba Fett".into()).apply(&app.page);
    UserEdit::TypeCity("Tatooine".into()).apply(&app.page);
    assert_eq!(app.page.value(".js-city"), "Tatooine");

    app.page.click("suspendBtn");
    app.page.click("revertBtn");
    assert_eq!(app.page.value(".js-name"), "Boba Fett");

    app.page.click("resumeBtn");
    assert!(!app.model.is_changed());
    assert_eq!(app.page.value(".js-name"), "John Doe");
    assert_eq!(app.page.value(".js-city"), "San Jose");
    assert_eq!(app.page.snapshot(), initial_form());
}

#[test]
fn unbind_button_stops_sync_until_rebound() {
    let app = bound_app();
    app.page.click("unbindBtn");

    UserEdit::TypeName("Boba Fett".into()).apply(&app.page);
    assert_eq!(app.model.get("user"), Some(Value::from("John Doe")));
    app.model.set("age", 50);
    assert_eq!(app.page.value(".js-age"), "34");

    let age = app.page.node(".js-age").expect("age");
    app.page.dom.dispatch(age, "focus");
    assert!(app.events.borrow().is_empty());

    app.page.click("bindBtn");
    assert_eq!(app.page.value(".js-age"), "50");
    assert_eq!(app.page.value(".js-name"), "John Doe");
}

#[test]
fn dropping_the_app_releases_every_listener() {
    let app = bound_app();
    let dom = app.page.dom.clone();
    let name = app.page.node(".js-name").expect("name");
    assert_eq!(dom.listener_count(name), 1);
    drop(app);
    assert_eq!(dom.listener_count(name), 0);
}
