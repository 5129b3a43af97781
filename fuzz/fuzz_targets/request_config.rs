#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, Vec<(String, String)>)| {
    let (url, headers) = input;
    if volley::fuzzing::request_config_input(url, &headers).is_ok() {
        debug_assert!(!url.trim().is_empty());
    }
});
