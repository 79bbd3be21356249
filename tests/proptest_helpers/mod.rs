#![allow(dead_code)]

use labelprep::label::ClassTable;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(256);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Class tables of 1..=max_len distinct names.
pub fn arb_class_table(max_len: usize) -> impl Strategy<Value = ClassTable> {
    (1..=max_len).prop_map(|len| {
        ClassTable::new((0..len).map(|i| format!("class_{i}"))).expect("non-empty table")
    })
}

/// A token without whitespace.
pub fn arb_token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.+-]{1,8}"
}

/// A normalized coordinate rendered the way exporters write it.
pub fn arb_coord() -> impl Strategy<Value = String> {
    (0.0f64..=1.0).prop_map(|v| format!("{v:.6}"))
}

/// Four geometry fields joined by single spaces.
pub fn arb_geometry() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_coord(), 4).prop_map(|fields| fields.join(" "))
}
