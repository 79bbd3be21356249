//! YOLO label-line classification and per-file tallying.
//!
//! Both the preparer and the counter validate label lines through
//! [`classify_line`]. A line is counted only when it has at least five
//! whitespace-separated fields and its class id falls inside the class table.
//! Geometry fields are not checked unless [`GeometryPolicy::Strict`] is
//! requested.

mod classes;

pub use classes::{read_classes_txt, ClassCountEntry, ClassCounts, ClassTable};

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::fsutil::file_name_string;

/// Minimum field count for a detection line: class id plus four box values.
pub const MIN_FIELDS: usize = 5;

const GEOMETRY_FIELDS: [&str; 4] = ["x_center", "y_center", "width", "height"];

/// How strictly the four geometry fields are checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeometryPolicy {
    /// Only field count and class id are checked.
    #[default]
    Lenient,
    /// Geometry fields must also parse as finite numbers.
    Strict,
}

/// Result of classifying a single label line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineOutcome<'a> {
    /// One object instance of the given class.
    Instance { class_id: usize, class_name: &'a str },
    /// The line does not contribute to any count.
    Skip(SkipReason),
}

/// Why a label line was not counted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than five whitespace-separated fields.
    Malformed { fields: usize },
    /// The class id field is not an integer.
    InvalidClassId { raw: String },
    /// The class id is an integer outside the class table.
    OutOfRange { class_id: i64, classes: usize },
    /// A geometry field is not a finite number (strict policy only).
    InvalidGeometry { field: &'static str, raw: String },
}

impl SkipReason {
    /// Everything except an out-of-range class id counts as a malformed line.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, SkipReason::OutOfRange { .. })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Malformed { fields } => {
                write!(f, "malformed line: expected {MIN_FIELDS} fields, found {fields}")
            }
            SkipReason::InvalidClassId { raw } => {
                write!(f, "malformed line: class id '{raw}' is not an integer")
            }
            SkipReason::OutOfRange { class_id, classes } => write!(
                f,
                "class id {class_id} is out of range for {classes} defined class(es)"
            ),
            SkipReason::InvalidGeometry { field, raw } => {
                write!(f, "invalid {field} '{raw}'; expected a finite number")
            }
        }
    }
}

/// Classify one label line against the class table.
///
/// Fields past the fifth are ignored.
pub fn classify_line<'a>(
    line: &str,
    classes: &'a ClassTable,
    policy: GeometryPolicy,
) -> LineOutcome<'a> {
    // Six tokens are enough to tell "exactly five" from "more than five".
    let tokens: Vec<&str> = line.split_whitespace().take(MIN_FIELDS + 1).collect();

    if tokens.len() < MIN_FIELDS {
        return LineOutcome::Skip(SkipReason::Malformed {
            fields: tokens.len(),
        });
    }

    let Some(class_id) = parse_class_id(tokens[0]) else {
        return LineOutcome::Skip(SkipReason::InvalidClassId {
            raw: tokens[0].to_string(),
        });
    };

    let Some((index, name)) = classes.resolve(class_id) else {
        return LineOutcome::Skip(SkipReason::OutOfRange {
            class_id,
            classes: classes.len(),
        });
    };

    if policy == GeometryPolicy::Strict {
        for (field, raw) in GEOMETRY_FIELDS.into_iter().zip(&tokens[1..MIN_FIELDS]) {
            let finite = raw.parse::<f64>().map(f64::is_finite).unwrap_or(false);
            if !finite {
                return LineOutcome::Skip(SkipReason::InvalidGeometry {
                    field,
                    raw: raw.to_string(),
                });
            }
        }
    }

    LineOutcome::Instance {
        class_id: index,
        class_name: name,
    }
}

/// Parse a class id token as a signed integer.
///
/// Integers too large for `i64` saturate so they still classify as out of
/// range rather than as non-integers.
fn parse_class_id(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }

    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(if negative { i64::MIN } else { i64::MAX })
    } else {
        None
    }
}

/// A label line that was not counted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Counts gathered from one label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelTally {
    pub counts: ClassCounts,
    pub objects: usize,
    pub skipped_lines: Vec<SkippedLine>,
}

impl LabelTally {
    pub fn malformed_lines(&self) -> usize {
        self.skipped_lines
            .iter()
            .filter(|skipped| skipped.reason.is_malformed())
            .count()
    }

    pub fn out_of_range_lines(&self) -> usize {
        self.skipped_lines.len() - self.malformed_lines()
    }
}

/// Fold [`classify_line`] over every line of a label file's contents.
pub fn tally_label_text(text: &str, classes: &ClassTable, policy: GeometryPolicy) -> LabelTally {
    let mut tally = LabelTally {
        counts: classes.zeroed_counts(),
        objects: 0,
        skipped_lines: Vec::new(),
    };

    for (line_idx, line) in text.lines().enumerate() {
        match classify_line(line, classes, policy) {
            LineOutcome::Instance { class_id, .. } => {
                tally.counts.increment(class_id);
                tally.objects += 1;
            }
            LineOutcome::Skip(reason) => tally.skipped_lines.push(SkippedLine {
                line: line_idx + 1,
                text: line.trim().to_string(),
                reason,
            }),
        }
    }

    tally
}

/// Read and tally a label file, logging one warning per skipped line.
pub fn tally_label_file(
    path: &Path,
    classes: &ClassTable,
    policy: GeometryPolicy,
) -> std::io::Result<LabelTally> {
    let text = fs::read_to_string(path)?;
    let tally = tally_label_text(&text, classes, policy);

    let file = file_name_string(path);
    for skipped in &tally.skipped_lines {
        warn!(
            file = %file,
            line = skipped.line,
            "{}: '{}'; skipping line",
            skipped.reason,
            skipped.text
        );
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn veg() -> ClassTable {
        ClassTable::new(["carrot", "bean", "radish"]).expect("valid table")
    }

    #[test]
    fn classify_accepts_valid_rows() {
        let table = veg();
        assert_eq!(
            classify_line("1 0.3 0.3 0.1 0.1", &table, GeometryPolicy::Lenient),
            LineOutcome::Instance {
                class_id: 1,
                class_name: "bean"
            }
        );
    }

    #[test]
    fn classify_ignores_extra_fields() {
        let table = veg();
        let outcome = classify_line("0 0.5 0.5 0.2 0.2 0.9 0.1", &table, GeometryPolicy::Lenient);
        assert!(matches!(outcome, LineOutcome::Instance { class_id: 0, .. }));
    }

    #[test]
    fn classify_rejects_short_and_blank_rows() {
        let table = veg();
        assert_eq!(
            classify_line("0 0.1 0.2", &table, GeometryPolicy::Lenient),
            LineOutcome::Skip(SkipReason::Malformed { fields: 3 })
        );
        assert_eq!(
            classify_line("   ", &table, GeometryPolicy::Lenient),
            LineOutcome::Skip(SkipReason::Malformed { fields: 0 })
        );
    }

    #[test]
    fn classify_rejects_non_integer_class_id() {
        let table = veg();
        let outcome = classify_line("1.0 0.5 0.5 0.2 0.2", &table, GeometryPolicy::Lenient);
        assert!(matches!(
            outcome,
            LineOutcome::Skip(SkipReason::InvalidClassId { .. })
        ));
    }

    #[test]
    fn classify_rejects_out_of_range_ids() {
        let table = veg();
        assert_eq!(
            classify_line("3 0.5 0.5 0.2 0.2", &table, GeometryPolicy::Lenient),
            LineOutcome::Skip(SkipReason::OutOfRange {
                class_id: 3,
                classes: 3
            })
        );
        assert_eq!(
            classify_line("-1 0.5 0.5 0.2 0.2", &table, GeometryPolicy::Lenient),
            LineOutcome::Skip(SkipReason::OutOfRange {
                class_id: -1,
                classes: 3
            })
        );
    }

    #[test]
    fn classify_saturates_huge_ids_to_out_of_range() {
        let table = veg();
        let outcome = classify_line(
            "99999999999999999999999 0.5 0.5 0.2 0.2",
            &table,
            GeometryPolicy::Lenient,
        );
        assert!(matches!(
            outcome,
            LineOutcome::Skip(SkipReason::OutOfRange {
                class_id: i64::MAX,
                ..
            })
        ));
    }

    #[test]
    fn lenient_policy_counts_unparseable_geometry() {
        let table = veg();
        assert_eq!(
            classify_line("2 0.1 0.1 bad bad", &table, GeometryPolicy::Lenient),
            LineOutcome::Instance {
                class_id: 2,
                class_name: "radish"
            }
        );
    }

    #[test]
    fn strict_policy_rejects_unparseable_geometry() {
        let table = veg();
        assert_eq!(
            classify_line("2 0.1 0.1 bad bad", &table, GeometryPolicy::Strict),
            LineOutcome::Skip(SkipReason::InvalidGeometry {
                field: "width",
                raw: "bad".to_string()
            })
        );
        assert!(matches!(
            classify_line("2 0.1 NaN 0.1 0.1", &table, GeometryPolicy::Strict),
            LineOutcome::Skip(SkipReason::InvalidGeometry {
                field: "y_center",
                ..
            })
        ));
    }

    #[test]
    fn tally_counts_valid_lines_and_records_skips() {
        let table = veg();
        let text = "0 0.5 0.5 0.2 0.2\n1 0.3 0.3 0.1 0.1\n0 0.1\n7 0.1 0.1 0.1 0.1\n";
        let tally = tally_label_text(text, &table, GeometryPolicy::Lenient);

        assert_eq!(tally.objects, 2);
        assert_eq!(tally.counts.get(0), 1);
        assert_eq!(tally.counts.get(1), 1);
        assert_eq!(tally.counts.get(2), 0);
        assert_eq!(tally.malformed_lines(), 1);
        assert_eq!(tally.out_of_range_lines(), 1);
        assert_eq!(tally.skipped_lines[0].line, 3);
        assert_eq!(tally.skipped_lines[1].line, 4);
    }

    #[test]
    fn tally_label_file_reports_missing_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let result = tally_label_file(
            &temp.path().join("missing.txt"),
            &veg(),
            GeometryPolicy::Lenient,
        );
        assert!(result.is_err());
    }
}
