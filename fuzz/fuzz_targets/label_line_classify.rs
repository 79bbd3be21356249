//! Fuzz target for label-line classification.
//!
//! This fuzzer feeds arbitrary UTF-8 lines to the line classifier under both
//! geometry policies, checking for panics, crashes, or hangs.

#![no_main]

use labelprep::label::{classify_line, ClassTable, GeometryPolicy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(table) = ClassTable::new(["carrot", "bean", "radish"]) else {
        return;
    };

    let _ = classify_line(line, &table, GeometryPolicy::Lenient);
    let _ = classify_line(line, &table, GeometryPolicy::Strict);
});
