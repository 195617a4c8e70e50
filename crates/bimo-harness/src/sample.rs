#![forbid(unsafe_code)]

//! The reference sample page: a person form bound to a nested model.
//!
//! [`SampleApp`] wires the page the way an application would: a top-level
//! watcher mirrors `{data, changes}` into `#json-out`, and the toolbar
//! buttons drive the binder and the model through `click` events.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bimo::binder::{BindConfig, BindError, Binder, BinderConfig, HookArgs};
use bimo::dom::{Dom, DomEvent, MemoryDom, NodeId, Prop};
use bimo::model::{Model, Record, Value, Watcher};
use chrono::{TimeZone, Utc};

/// US state lookup, in display order.
pub const STATES: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District Of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Full name of a state code.
#[must_use]
pub fn state_name(code: &str) -> Option<&'static str> {
    STATES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

pub const CARS: [(&str, &str); 4] = [
    ("volvo", "Volvo"),
    ("saab", "Saab"),
    ("mercedes", "Mercedes"),
    ("audi", "Audi"),
];

pub const MOVIES: [&str; 3] = ["star-wars", "alien", "blade-runner"];

/// The sample person record.
#[must_use]
pub fn sample_record() -> Record {
    let birthday = Utc
        .with_ymd_and_hms(1987, 12, 23, 0, 0, 0)
        .single()
        .map_or(Value::Null, Value::from);
    Record::new()
        .with(
            "address",
            Record::new()
                .with("state", "CA")
                .with("city", "San Jose")
                .with("min", 23)
                .with("max", 34),
        )
        .with("user", "John Doe")
        .with("member", false)
        .with("gender", "male")
        .with("age", 34)
        .with("birthday", birthday)
        .with("cars", Vec::<Value>::new())
        .with("movies", Vec::<Value>::new())
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// The sample form in a headless document.
pub struct SamplePage {
    pub dom: Rc<MemoryDom>,
    pub container: NodeId,
}

impl Default for SamplePage {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplePage {
    #[must_use]
    pub fn new() -> Self {
        let dom = Rc::new(MemoryDom::new());
        let body = dom.element(dom.document(), "body", &[]);
        let toolbar = dom.element(body, "div", &[("class", "toolbar")]);
        for id in [
            "bindBtn",
            "unbindBtn",
            "revertBtn",
            "clearBtn",
            "refreshBtn",
            "suspendBtn",
            "resumeBtn",
        ] {
            dom.element(toolbar, "button", &[("id", id), ("type", "button")]);
        }

        let container = dom.element(body, "div", &[("id", "page-container")]);
        let form = dom.element(container, "form", &[("class", "person")]);
        dom.element(form, "input", &[("class", "js-name"), ("type", "text")]);
        dom.element(form, "input", &[("class", "js-membership"), ("type", "checkbox")]);
        for gender in ["male", "female"] {
            dom.element(
                form,
                "input",
                &[("type", "radio"), ("name", "gender"), ("value", gender)],
            );
        }
        dom.element(form, "input", &[("class", "js-birthday"), ("type", "date")]);
        dom.element(form, "input", &[("class", "js-age"), ("type", "number")]);

        let cars = dom.element(form, "select", &[("class", "js-cars"), ("multiple", "")]);
        for (value, text) in CARS {
            let option = dom.element(cars, "option", &[("value", value)]);
            dom.set_prop(option, "innerHTML", Prop::from(text));
        }
        for movie in MOVIES {
            dom.element(
                form,
                "input",
                &[("type", "checkbox"), ("name", "movies"), ("value", movie)],
            );
        }

        let address = dom.element(form, "fieldset", &[("class", "address")]);
        dom.element(address, "select", &[("class", "js-state")]);
        dom.element(address, "span", &[("class", "js-state-name")]);
        dom.element(address, "input", &[("class", "js-city"), ("type", "text")]);
        dom.element(address, "input", &[("id", "address-min"), ("type", "text")]);
        dom.element(address, "input", &[("id", "address-max"), ("type", "text")]);

        dom.element(body, "textarea", &[("id", "json-out")]);
        Self { dom, container }
    }

    /// First node matching `selector` anywhere in the document.
    #[must_use]
    pub fn node(&self, selector: &str) -> Option<NodeId> {
        self.dom.query_selector(self.dom.document(), selector)
    }

    #[must_use]
    pub fn nodes(&self, selector: &str) -> Vec<NodeId> {
        self.dom.query_selector_all(self.dom.document(), selector)
    }

    /// `value` of the first node matching `selector`, or empty.
    #[must_use]
    pub fn value(&self, selector: &str) -> String {
        self.node(selector)
            .map(|n| self.dom.prop(n, "value").as_text())
            .unwrap_or_default()
    }

    /// `value`s of the matching nodes whose `flag` property is set.
    #[must_use]
    pub fn flagged(&self, selector: &str, flag: &str) -> Vec<String> {
        self.nodes(selector)
            .into_iter()
            .filter(|n| self.dom.prop(*n, flag).as_bool())
            .map(|n| self.dom.prop(n, "value").as_text())
            .collect()
    }

    /// What the form shows, as JSON.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        let checked = |sel: &str| {
            self.node(sel)
                .is_some_and(|n| self.dom.prop(n, "checked").as_bool())
        };
        let state_name = self
            .node(".js-state-name")
            .map(|n| self.dom.prop(n, "innerHTML").as_text())
            .unwrap_or_default();
        serde_json::json!({
            "user": self.value(".js-name"),
            "member": checked(".js-membership"),
            "gender": self.flagged("input[name=gender]", "checked").first(),
            "birthday": self.value(".js-birthday"),
            "age": self.value(".js-age"),
            "cars": self.flagged(".js-cars option", "selected"),
            "movies": self.flagged("input[name=movies]", "checked"),
            "state": self.value(".js-state"),
            "stateName": state_name,
            "city": self.value(".js-city"),
            "min": self.value("#address-min"),
            "max": self.value("#address-max"),
        })
    }

    /// Click a toolbar button by id.
    pub fn click(&self, id: &str) -> usize {
        self.node(&format!("#{id}"))
            .map_or(0, |n| self.dom.dispatch(n, "click"))
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn to_number(args: &HookArgs<'_>) -> Option<Value> {
    let text = args.value.to_display_string();
    let text = text.trim();
    let n = if text.is_empty() {
        0.0
    } else {
        text.parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
    };
    Some(Value::Number(n))
}

fn suppress_zero(args: &HookArgs<'_>) -> Value {
    match args.value.to_display_string() {
        zero if zero == "0" => Value::Text(String::new()),
        other => Value::Text(other),
    }
}

fn list_contains(list: &Value, item: &str) -> bool {
    list.as_list()
        .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(item)))
}

/// Values of the elements (or `<option>`s) whose `flag` is set.
fn collect_flagged(dom: &dyn Dom, nodes: &[NodeId], flag: &str) -> Value {
    Value::List(
        nodes
            .iter()
            .filter(|n| dom.prop(**n, flag).as_bool())
            .map(|n| Value::Text(dom.prop(*n, "value").as_text()))
            .collect(),
    )
}

/// Binder configuration of the sample page. `events` records the custom
/// event handlers that fire.
#[must_use]
pub fn sample_config(events: &Rc<RefCell<Vec<String>>>) -> BinderConfig {
    let age_log = Rc::clone(events);
    let city_log = Rc::clone(events);

    BinderConfig::new()
        .field("user", ".js-name")
        .field(
            "member",
            BindConfig::new().selector(".js-membership").property("checked"),
        )
        .field(
            "gender",
            BindConfig::new()
                .selector("input[name=\"gender\"]")
                .read(|args| {
                    let dom = args.dom();
                    for node in args.elements() {
                        let value = dom.prop(*node, "value").as_text();
                        let on = args.value.as_str() == Some(value.as_str());
                        dom.set_prop(*node, "checked", Prop::Bool(on));
                    }
                })
                .write(|args| {
                    let dom = args.dom();
                    args.elements()
                        .iter()
                        .find(|n| dom.prop(**n, "checked").as_bool())
                        .map(|n| Value::Text(dom.prop(*n, "value").as_text()))
                }),
        )
        .field("birthday", ".js-birthday")
        .field(
            "age",
            BindConfig::new().selector(".js-age").on("focus", move |bind, _| {
                tracing::info!(key = bind.key(), "age focused");
                age_log.borrow_mut().push("Age here".to_owned());
            }),
        )
        .field(
            "cars",
            BindConfig::new()
                .selector(".js-cars")
                .read(|args| {
                    let dom = args.dom();
                    let Some(select) = args.elements().first() else {
                        return;
                    };
                    for option in dom.query_selector_all(*select, "option") {
                        let value = dom.prop(option, "value").as_text();
                        let on = list_contains(args.value, &value);
                        dom.set_prop(option, "selected", Prop::Bool(on));
                    }
                })
                .write(|args| {
                    let dom = args.dom();
                    let select = args.target.or_else(|| args.elements().first().copied())?;
                    let options = dom.query_selector_all(select, "option");
                    Some(collect_flagged(dom, &options, "selected"))
                }),
        )
        .field(
            "movies",
            BindConfig::new()
                .selector("input[name=\"movies\"]")
                .read(|args| {
                    let dom = args.dom();
                    for node in args.elements() {
                        let value = dom.prop(*node, "value").as_text();
                        let on = list_contains(args.value, &value);
                        dom.set_prop(*node, "checked", Prop::Bool(on));
                    }
                })
                .write(|args| Some(collect_flagged(args.dom(), args.elements(), "checked"))),
        )
        .field(
            "address.state",
            vec![
                BindConfig::new()
                    .selector(".js-state")
                    .options(STATES)
                    .place_holder("Select a state")
                    .write(|args| Some(Value::Text(args.value.to_display_string().to_uppercase()))),
                BindConfig::new()
                    .selector(".js-state-name")
                    .two_way(false)
                    .read(|args| {
                        let name = args.value.as_str().and_then(state_name).unwrap_or_default();
                        if let Some(node) = args.elements().first() {
                            args.dom().set_prop(*node, "innerHTML", Prop::from(name));
                        }
                    }),
            ],
        )
        .field(
            "address.city",
            BindConfig::new()
                .selector(".js-city")
                .event("keyup")
                .on("blur", move |bind, _: &DomEvent| {
                    tracing::info!(key = bind.key(), "leaving city");
                    city_log.borrow_mut().push("Leaving city".to_owned());
                }),
        )
        .field(
            "address.min",
            BindConfig::new()
                .selector("#address-min")
                .write(to_number)
                .format(suppress_zero),
        )
        .field(
            "address.max",
            BindConfig::new()
                .selector("#address-max")
                .write(to_number)
                .format(suppress_zero),
        )
}

/// `{data, changes}` for `model`, as shown in `#json-out`.
#[must_use]
pub fn model_json(model: &Model) -> serde_json::Value {
    serde_json::json!({
        "data": model.to_object(),
        "changes": model.delta(),
    })
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// The sample page with its model, binder and toolbar wired up.
pub struct SampleApp {
    pub page: SamplePage,
    pub model: Model,
    pub binder: Rc<Binder>,
    /// Messages from custom event handlers, in firing order.
    pub events: Rc<RefCell<Vec<String>>>,
    /// Top-level watcher notifications received.
    pub notifications: Rc<RefCell<Vec<String>>>,
    watcher: Watcher,
}

impl SampleApp {
    /// Build the page and binder. Nothing is bound until `#bindBtn` is
    /// clicked or [`Binder::bind`] is called.
    pub fn new() -> Result<Self, BindError> {
        let page = SamplePage::new();
        let model = Model::new(sample_record());
        let events = Rc::new(RefCell::new(Vec::new()));
        let binder = Binder::builder(page.dom.clone(), &model)
            .container("#page-container")
            .config(sample_config(&events))
            .build()
            .map(Rc::new)?;

        let notifications = Rc::new(RefCell::new(Vec::new()));
        let watcher = {
            let dom: Weak<MemoryDom> = Rc::downgrade(&page.dom);
            let out = page.node("#json-out");
            let model = model.clone();
            let seen = Rc::clone(&notifications);
            Watcher::new(move |changes| {
                let mut fields: Vec<&str> = changes.keys().collect();
                fields.sort_unstable();
                seen.borrow_mut().push(fields.join(","));
                if let (Some(dom), Some(out)) = (dom.upgrade(), out) {
                    let text = serde_json::to_string_pretty(&model_json(&model)).unwrap_or_default();
                    dom.set_prop(out, "value", Prop::Text(text));
                }
            })
        };
        model.watch_all(&watcher);

        let app = Self {
            page,
            model,
            binder,
            events,
            notifications,
            watcher,
        };
        app.wire_toolbar();
        Ok(app)
    }

    fn on_click(&self, id: &str, action: impl Fn() + 'static) {
        if let Some(button) = self.page.node(&format!("#{id}")) {
            self.page
                .dom
                .add_event_listener(button, "click", Rc::new(move |_: &DomEvent| action()));
        }
    }

    fn wire_toolbar(&self) {
        let binder = Rc::downgrade(&self.binder);
        let dom = Rc::downgrade(&self.page.dom);
        let out = self.page.node("#json-out");
        let model = self.model.clone();
        self.on_click("bindBtn", move || {
            let Some(binder) = binder.upgrade() else {
                return;
            };
            for failure in binder.bind() {
                tracing::warn!(%failure, "sample binding failed");
            }
            if let (Some(dom), Some(out)) = (dom.upgrade(), out) {
                let text = serde_json::to_string_pretty(&model_json(&model)).unwrap_or_default();
                dom.set_prop(out, "value", Prop::Text(text));
            }
        });

        let binder = Rc::downgrade(&self.binder);
        self.on_click("unbindBtn", move || {
            if let Some(binder) = binder.upgrade() {
                binder.unbind();
            }
        });

        let model = self.model.clone();
        self.on_click("revertBtn", move || model.revert_all());
        let model = self.model.clone();
        self.on_click("clearBtn", move || model.clear());
        let model = self.model.clone();
        self.on_click("refreshBtn", move || model.refresh("age"));
        let model = self.model.clone();
        self.on_click("suspendBtn", move || model.suspend());
        let model = self.model.clone();
        self.on_click("resumeBtn", move || model.resume());
    }

    /// The JSON currently shown in `#json-out`.
    #[must_use]
    pub fn json_out(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.page.value("#json-out")).ok()
    }

    /// The top-level watcher the app registered.
    #[must_use]
    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }
}

impl Drop for SampleApp {
    fn drop(&mut self) {
        // The watcher holds a model handle; unsubscribing breaks the cycle.
        self.model.unwatch_all(&self.watcher);
        self.binder.unbind();
    }
}
