#![no_main]

use libfuzzer_sys::fuzz_target;
use qqbridge::config::env::{deep_merge, env_overrides, parse_env_value};

// Input is "KEY=VALUE" lines
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let vars: Vec<(&str, &str)> = text
        .lines()
        .filter_map(|line| line.split_once('='))
        .collect();
    for (_, value) in &vars {
        let _ = parse_env_value(value);
    }
    let overrides = env_overrides(vars);
    let _ = deep_merge(serde_json::json!({"gateway": {"port": 1}}), overrides);
});
