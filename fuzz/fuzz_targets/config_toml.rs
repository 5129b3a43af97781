#![no_main]

use libfuzzer_sys::fuzz_target;
use volley::config::types::ConfigFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let parsed: Option<ConfigFile> = toml::from_str(input).ok();
        let applied = volley::fuzzing::apply_config_from_toml(input);
        if applied.is_ok() {
            if let Some(config) = parsed {
                debug_assert!(config.concurrency != Some(0));
                debug_assert!(!(config.data.is_some() && config.data_file.is_some()));
            }
        }
    }
});
