#![no_main]

use bimo_binder::BinderConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        let _ = BinderConfig::from_json(json);
    }
});
