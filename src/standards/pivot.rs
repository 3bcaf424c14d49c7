//! Event pivot: best time per gender, event and swimmer, counted against a
//! standards table.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::normalize::{GenderTable, NormalizedRow, RawRow, cell};
use crate::standards::classify::{NearBand, in_band, meets};
use crate::standards::types::{ColumnCount, GenderCategory, StandardCounts};
use crate::time::parse_time;

/// Standard columns read from each standards sheet row.
pub const MAX_STANDARD_COLUMNS: usize = 4;

/// `gender -> event -> swimmer name -> best seconds`.
#[derive(Debug, Default, Serialize)]
pub struct EventPivot {
    best: BTreeMap<GenderCategory, HashMap<String, HashMap<String, f64>>>,
}

impl EventPivot {
    /// Best times for one event, keyed by swimmer name.
    pub fn event(&self, gender: GenderCategory, event: &str) -> Option<&HashMap<String, f64>> {
        self.best.get(&gender)?.get(event)
    }

    /// Best time of `name` in `event`.
    pub fn best(&self, gender: GenderCategory, event: &str, name: &str) -> Option<f64> {
        self.event(gender, event)?.get(name).copied()
    }

    fn record(&mut self, gender: GenderCategory, event: &str, name: &str, time_sec: f64) {
        let best = self
            .best
            .entry(gender)
            .or_default()
            .entry(event.to_string())
            .or_default()
            .entry(name.to_string())
            .or_insert(time_sec);
        if time_sec < *best {
            *best = time_sec;
        }
    }
}

/// Builds the pivot from rows with a name, a resolvable gender, an event and
/// a parsable time. Every other row is skipped.
pub fn build_event_pivot(rows: &[NormalizedRow], genders: &GenderTable) -> EventPivot {
    let mut pivot = EventPivot::default();
    let mut skipped = 0usize;

    for row in rows {
        let gender = genders.resolve(&row.gender);
        match (gender, row.time_sec) {
            (Some(g), Some(t)) if !row.name.is_empty() && !row.event.is_empty() => {
                pivot.record(g, &row.event, &row.name, t);
            }
            _ => skipped += 1,
        }
    }

    debug!(rows = rows.len(), skipped, "Event pivot built");
    pivot
}

/// One threshold cell of the standards sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Threshold {
    pub label: String,
    pub display: String,
    pub seconds: Option<f64>,
}

/// Thresholds for one event. The first column is the primary cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStandards {
    pub event: String,
    pub thresholds: Vec<Threshold>,
}

impl EventStandards {
    pub fn cut(&self) -> Option<f64> {
        self.thresholds.first().and_then(|t| t.seconds)
    }
}

/// Per-gender standards, restricted to and ordered by the canonical events.
#[derive(Debug, Default, Serialize)]
pub struct StandardsTable {
    by_gender: BTreeMap<GenderCategory, Vec<EventStandards>>,
}

impl StandardsTable {
    /// Parses the standards sheet.
    ///
    /// `header` supplies column labels. Rows above a `Women`/`Womens` marker
    /// row belong to the male table, rows below it to the female table. Rows
    /// for events outside `event_order` are ignored; a later row for the same
    /// event replaces an earlier one.
    pub fn from_rows(header: &[String], rows: &[RawRow], event_order: &[String]) -> Self {
        let labels: Vec<String> = (1..=MAX_STANDARD_COLUMNS)
            .map(|i| {
                let label = cell(header, i);
                if label.is_empty() { format!("Standard {i}") } else { label }
            })
            .collect();

        let mut raw: BTreeMap<GenderCategory, HashMap<String, EventStandards>> = BTreeMap::new();
        let mut gender = GenderCategory::Male;

        for row in rows {
            let event = cell(row, 0).replace('"', "");
            let event = event.trim();

            if event.eq_ignore_ascii_case("women") || event.eq_ignore_ascii_case("womens") {
                gender = GenderCategory::Female;
                continue;
            }
            if !event_order.iter().any(|e| e == event) {
                continue;
            }

            let thresholds = labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let display = cell(row, i + 1);
                    Threshold {
                        label: label.clone(),
                        seconds: parse_time(&display),
                        display,
                    }
                })
                .collect();

            raw.entry(gender).or_default().insert(
                event.to_string(),
                EventStandards {
                    event: event.to_string(),
                    thresholds,
                },
            );
        }

        let by_gender = raw
            .into_iter()
            .map(|(g, mut events)| {
                let ordered = event_order
                    .iter()
                    .filter_map(|e| events.remove(e))
                    .collect();
                (g, ordered)
            })
            .collect();

        StandardsTable { by_gender }
    }

    pub fn events(&self, gender: GenderCategory) -> &[EventStandards] {
        self.by_gender.get(&gender).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Counts, per event in canonical order, which swimmers' best times clear
/// each standard column, plus the bubble anchored to the event's cut.
/// Name lists are alphabetical.
pub fn count_standards(
    pivot: &EventPivot,
    standards: &StandardsTable,
    gender: GenderCategory,
    band: &NearBand,
) -> Vec<StandardCounts> {
    standards
        .events(gender)
        .iter()
        .map(|event| {
            let swimmers = pivot.event(gender, &event.event);
            let names_where = |pred: &dyn Fn(f64) -> bool| -> Vec<String> {
                let mut names: Vec<String> = swimmers
                    .into_iter()
                    .flatten()
                    .filter(|(_, best)| pred(**best))
                    .map(|(name, _)| name.clone())
                    .collect();
                names.sort();
                names
            };

            let columns = event
                .thresholds
                .iter()
                .map(|t| ColumnCount {
                    label: t.label.clone(),
                    threshold: t.display.clone(),
                    names: names_where(&|best: f64| meets(best, t.seconds)),
                })
                .collect();

            let cut = event.cut();
            StandardCounts {
                event: event.event.clone(),
                columns,
                bubble: names_where(&|best: f64| in_band(best, cut, band)),
            }
        })
        .collect()
}
