#![forbid(unsafe_code)]

//! Simulated user edits on the sample page, with proptest strategies.

use bimo::dom::{Dom, Prop};
use proptest::prelude::*;

use crate::sample::{CARS, MOVIES, STATES, SamplePage};

/// One thing a user can do to the sample form.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEdit {
    TypeName(String),
    ToggleMember,
    PickGender(&'static str),
    TypeAge(String),
    ToggleCar(&'static str),
    ToggleMovie(&'static str),
    PickState(&'static str),
    TypeCity(String),
    TypeMin(String),
}

impl UserEdit {
    /// Perform the edit and fire the event its control is bound to.
    pub fn apply(&self, page: &SamplePage) {
        let dom = &page.dom;
        match self {
            Self::TypeName(text) => {
                if let Some(node) = page.node(".js-name") {
                    dom.change(node, text);
                }
            }
            Self::ToggleMember => {
                if let Some(node) = page.node(".js-membership") {
                    dom.toggle(node);
                }
            }
            Self::PickGender(value) => {
                let radios = page.nodes("input[name=gender]");
                for radio in &radios {
                    let on = dom.prop(*radio, "value").as_text() == *value;
                    dom.set_prop(*radio, "checked", Prop::Bool(on));
                }
                if let Some(radio) = radios
                    .iter()
                    .find(|r| dom.prop(**r, "value").as_text() == *value)
                {
                    dom.dispatch(*radio, "change");
                }
            }
            Self::TypeAge(text) => {
                if let Some(node) = page.node(".js-age") {
                    dom.change(node, text);
                }
            }
            Self::ToggleCar(value) => {
                let Some(select) = page.node(".js-cars") else {
                    return;
                };
                if let Some(option) = page
                    .nodes(".js-cars option")
                    .into_iter()
                    .find(|o| dom.prop(*o, "value").as_text() == *value)
                {
                    let selected = dom.prop(option, "selected").as_bool();
                    dom.set_prop(option, "selected", Prop::Bool(!selected));
                    dom.dispatch(select, "change");
                }
            }
            Self::ToggleMovie(value) => {
                if let Some(node) = page
                    .nodes("input[name=movies]")
                    .into_iter()
                    .find(|n| dom.prop(*n, "value").as_text() == *value)
                {
                    dom.toggle(node);
                }
            }
            Self::PickState(code) => {
                if let Some(node) = page.node(".js-state") {
                    dom.change(node, code);
                }
            }
            Self::TypeCity(text) => {
                if let Some(node) = page.node(".js-city") {
                    dom.set_prop(node, "value", Prop::from(text.as_str()));
                    dom.dispatch(node, "keyup");
                }
            }
            Self::TypeMin(text) => {
                if let Some(node) = page.node("#address-min") {
                    dom.change(node, text);
                }
            }
        }
    }
}

fn words() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Boba Fett", "Kamino", "Geonosis", "", "  padded  "])
        .prop_map(str::to_owned)
}

fn numbers() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..120).prop_map(|n| n.to_string()),
        Just(String::new()),
        Just("forty".to_owned()),
    ]
}

/// Any single [`UserEdit`].
pub fn user_edit() -> impl Strategy<Value = UserEdit> {
    let states: Vec<&'static str> = STATES.iter().map(|(code, _)| *code).collect();
    let cars: Vec<&'static str> = CARS.iter().map(|(value, _)| *value).collect();
    prop_oneof![
        words().prop_map(UserEdit::TypeName),
        Just(UserEdit::ToggleMember),
        prop::sample::select(vec!["male", "female"]).prop_map(UserEdit::PickGender),
        numbers().prop_map(UserEdit::TypeAge),
        prop::sample::select(cars).prop_map(UserEdit::ToggleCar),
        prop::sample::select(MOVIES.to_vec()).prop_map(UserEdit::ToggleMovie),
        prop::sample::select(states).prop_map(UserEdit::PickState),
        words().prop_map(UserEdit::TypeCity),
        numbers().prop_map(UserEdit::TypeMin),
    ]
}

/// A session of up to `max` edits.
pub fn user_session(max: usize) -> impl Strategy<Value = Vec<UserEdit>> {
    prop::collection::vec(user_edit(), 0..=max)
}
