#![no_main]

use libfuzzer_sys::fuzz_target;
use qqbridge::channels::qq::dedup::DedupWindow;
use qqbridge::channels::qq::normalize::{normalize_direct, normalize_group};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let mut dedup = DedupWindow::new(8);
    if let Some(msg) = normalize_direct(&raw, &mut dedup) {
        assert!(!msg.content.trim().is_empty());
    }
    dedup.clear();
    if let Some(msg) = normalize_group(&raw, &mut dedup) {
        assert!(!msg.content.trim().is_empty());
    }
});
