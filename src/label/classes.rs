//! Class-name table and dense per-class counters.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::LabelprepError;

/// Ordered class names; a name's position is its class id.
///
/// The table must match the ids baked into the exported label files. That
/// correspondence is the operator's responsibility and is never checked here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassTable {
    names: Vec<String>,
}

impl ClassTable {
    /// Build a table from names, trimming surrounding whitespace.
    ///
    /// Fails if the table is empty or any name is blank.
    pub fn new<I, S>(names: I) -> Result<Self, LabelprepError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trimmed = Vec::new();
        for (index, name) in names.into_iter().enumerate() {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(LabelprepError::ConfigInvalid {
                    message: format!("class name at index {index} is empty"),
                });
            }
            trimmed.push(name.to_string());
        }

        if trimmed.is_empty() {
            return Err(LabelprepError::ConfigInvalid {
                message: "class table must contain at least one class name".to_string(),
            });
        }

        Ok(Self { names: trimmed })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    /// Resolve a raw (possibly negative) class id to its index and name.
    pub fn resolve(&self, class_id: i64) -> Option<(usize, &str)> {
        let index = usize::try_from(class_id).ok()?;
        self.name(index).map(|name| (index, name))
    }

    /// Names that appear more than once, in first-repeat order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for name in &self.names {
            if !seen.insert(name.as_str()) && !duplicates.contains(&name.as_str()) {
                duplicates.push(name.as_str());
            }
        }
        duplicates
    }

    /// A zeroed counter with one slot per class.
    pub fn zeroed_counts(&self) -> ClassCounts {
        ClassCounts {
            counts: vec![0; self.names.len()],
        }
    }
}

/// Read a `classes.txt` style file: one class name per line.
pub fn read_classes_txt(path: &Path) -> Result<ClassTable, LabelprepError> {
    let data = fs::read_to_string(path).map_err(|source| LabelprepError::ClassesTxtInvalid {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;
    let mut names = Vec::new();

    for (line_idx, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(LabelprepError::ClassesTxtInvalid {
                path: path.to_path_buf(),
                message: format!("line {} is empty", line_idx + 1),
            });
        }
        names.push(trimmed.to_string());
    }

    if names.is_empty() {
        return Err(LabelprepError::ClassesTxtInvalid {
            path: path.to_path_buf(),
            message: "file lists no class names".to_string(),
        });
    }

    ClassTable::new(names)
}

/// Instance counters indexed by class id.
///
/// Every class in the table has a slot from the start, so classes with no
/// observed instances are reported as zero rather than missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassCounts {
    counts: Vec<usize>,
}

impl ClassCounts {
    pub fn increment(&mut self, class_id: usize) {
        if let Some(slot) = self.counts.get_mut(class_id) {
            *slot += 1;
        }
    }

    pub fn get(&self, class_id: usize) -> usize {
        self.counts.get(class_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Add another counter built from the same table.
    pub fn merge(&mut self, other: &ClassCounts) {
        if self.counts.len() < other.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (slot, count) in self.counts.iter_mut().zip(&other.counts) {
            *slot += count;
        }
    }

    /// Named entries in class-table order, zeros included.
    pub fn entries(&self, table: &ClassTable) -> Vec<ClassCountEntry> {
        table
            .names()
            .iter()
            .enumerate()
            .map(|(id, name)| ClassCountEntry {
                id,
                name: name.clone(),
                count: self.get(id),
            })
            .collect()
    }
}

/// One class with its instance count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassCountEntry {
    pub id: usize,
    pub name: String,
    pub count: usize,
}
