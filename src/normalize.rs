//! Row normalization: raw sheet cells into typed [`NormalizedRow`]s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::query::ColumnMap;
use crate::standards::types::{GenderCategory, StandardKind};
use crate::time::parse_time;

/// One spreadsheet row as delivered by the sheet reader.
pub type RawRow = Vec<String>;

/// Trims a cell, treating a missing cell as empty.
pub fn normalize_cell(v: Option<&str>) -> String {
    v.unwrap_or("").trim().to_string()
}

/// Reads the cell at `idx`, normalized. Out-of-range columns read as empty.
pub fn cell(row: &[String], idx: usize) -> String {
    normalize_cell(row.get(idx).map(String::as_str))
}

/// Extracts the digits of an age cell. Returns -1 when there are none.
pub fn parse_age(v: &str) -> i32 {
    let digits: String = v.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return -1;
    }
    digits.parse().unwrap_or(-1)
}

/// A sheet row with every field trimmed and every time parsed.
///
/// `time_sec` is `None` iff the time cell was blank or unparsable; such rows
/// still carry identity and age.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub name: String,
    pub gender: String,
    pub age: String,
    pub age_num: i32,
    pub site: String,
    pub group: String,
    pub event: String,
    pub time_str: String,
    pub time_sec: Option<f64>,
    pub standards: BTreeMap<StandardKind, Option<f64>>,
    /// Raw standard cells, kept for display.
    pub standard_cells: BTreeMap<StandardKind, String>,
}

impl NormalizedRow {
    /// Normalizes a raw row using the caller's column positions.
    pub fn from_raw(raw: &[String], columns: &ColumnMap) -> Self {
        let age = cell(raw, columns.age);
        let time_str = cell(raw, columns.time);

        let mut standards = BTreeMap::new();
        let mut standard_cells = BTreeMap::new();
        for (&kind, &idx) in &columns.standards {
            let text = cell(raw, idx);
            standards.insert(kind, parse_time(&text));
            standard_cells.insert(kind, text);
        }

        NormalizedRow {
            name: cell(raw, columns.name),
            gender: cell(raw, columns.gender),
            age_num: parse_age(&age),
            age,
            site: cell(raw, columns.site),
            group: cell(raw, columns.group),
            event: cell(raw, columns.event),
            time_sec: parse_time(&time_str),
            time_str,
            standards,
            standard_cells,
        }
    }

    /// Seconds for `kind`, if the column is mapped and parsable.
    pub fn standard(&self, kind: StandardKind) -> Option<f64> {
        self.standards.get(&kind).copied().flatten()
    }

    /// Raw display text of the `kind` column, empty when unmapped.
    pub fn standard_cell(&self, kind: StandardKind) -> &str {
        self.standard_cells
            .get(&kind)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Rows without a name or gender never contribute to an aggregate.
    pub fn has_identity(&self) -> bool {
        !self.name.is_empty() && !self.gender.is_empty()
    }
}

/// Normalizes every raw row.
pub fn normalize_rows(raw: &[RawRow], columns: &ColumnMap) -> Vec<NormalizedRow> {
    raw.iter()
        .map(|r| NormalizedRow::from_raw(r, columns))
        .collect()
}

/// Prefix table that folds free-form gender cells (`"M"`, `"Male"`,
/// `"Boys"`, `"Girl"`) into a binary category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenderTable {
    prefixes: Vec<(String, GenderCategory)>,
}

impl GenderTable {
    pub fn new(prefixes: Vec<(String, GenderCategory)>) -> Self {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|(p, g)| (p.to_lowercase(), g))
                .collect(),
        }
    }

    /// First matching prefix wins. Blank or unmatched cells resolve to `None`.
    pub fn resolve(&self, gender: &str) -> Option<GenderCategory> {
        let lower = gender.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| !prefix.is_empty() && lower.starts_with(prefix.as_str()))
            .map(|(_, g)| *g)
    }
}

impl Default for GenderTable {
    fn default() -> Self {
        Self::new(vec![
            ("m".into(), GenderCategory::Male),
            ("b".into(), GenderCategory::Male),
            ("f".into(), GenderCategory::Female),
            ("g".into(), GenderCategory::Female),
        ])
    }
}
