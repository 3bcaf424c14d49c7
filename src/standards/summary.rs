use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::normalize::NormalizedRow;
use crate::standards::classify::{NearBand, in_band, meets};
use crate::standards::types::StandardKind;

/// Club-wide qualifiers and bubble swimmers against the cut column:
/// `name -> events`, both sorted.
#[derive(Debug, Serialize)]
pub struct QualifierSummary {
    pub generated_at: DateTime<Utc>,
    pub qualifiers: BTreeMap<String, BTreeSet<String>>,
    pub bubble: BTreeMap<String, BTreeSet<String>>,
}

impl QualifierSummary {
    pub fn qualifier_count(&self) -> usize {
        self.qualifiers.len()
    }

    pub fn bubble_count(&self) -> usize {
        self.bubble.len()
    }
}

/// Builds the summary from every row carrying a name, an event, a time and
/// a positive cut. No swimmer identity merging happens here: names are taken
/// as written.
pub fn summarize_qualifiers(rows: &[NormalizedRow], band: &NearBand) -> QualifierSummary {
    let mut qualifiers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut bubble: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for row in rows {
        if row.name.is_empty() || row.event.is_empty() {
            continue;
        }
        let Some(time_sec) = row.time_sec else {
            continue;
        };
        let cut = row.standard(StandardKind::Cut);

        if meets(time_sec, cut) {
            qualifiers
                .entry(row.name.clone())
                .or_default()
                .insert(row.event.clone());
        }
        if in_band(time_sec, cut, band) {
            bubble
                .entry(row.name.clone())
                .or_default()
                .insert(row.event.clone());
        }
    }

    QualifierSummary {
        generated_at: Utc::now(),
        qualifiers,
        bubble,
    }
}
