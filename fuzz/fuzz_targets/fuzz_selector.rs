#![no_main]

use bimo_dom::{Dom, MemoryDom, Selector};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let _ = Selector::parse(input);

    let dom = MemoryDom::new();
    let form = dom.element(dom.document(), "form", &[("id", "person"), ("class", "card")]);
    dom.element(form, "input", &[("name", "city"), ("class", "field"), ("required", "")]);
    let _ = dom.query_selector_all(dom.document(), input);
});
