//! Data types produced by the qualification engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

use crate::time::format_delta;

/// A qualifying standard a row can carry a threshold for.
///
/// `Cut` is the primary pass/fail line and the only banded standard (near-miss
/// and next-up are derived from it). Every other kind is graded: achieved or
/// not, nothing in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StandardKind {
    Cut,
    AgChamps,
    B,
    BB,
    A,
    Aaa,
}

impl StandardKind {
    pub fn is_banded(self) -> bool {
        matches!(self, StandardKind::Cut)
    }

    pub fn label(self) -> &'static str {
        match self {
            StandardKind::Cut => "Cut",
            StandardKind::AgChamps => "AG Champs",
            StandardKind::B => "B",
            StandardKind::BB => "BB",
            StandardKind::A => "A",
            StandardKind::Aaa => "AAA",
        }
    }
}

/// Binary gender category used by the event pivot and section ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GenderCategory {
    Male,
    Female,
}

impl GenderCategory {
    pub fn section_title(self) -> &'static str {
        match self {
            GenderCategory::Male => "MALES",
            GenderCategory::Female => "FEMALES",
        }
    }
}

/// A single swim placed in a category: event, time as written, time in seconds.
///
/// Miss categories also carry how far over the cut the swim was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeMark {
    pub event: String,
    pub time_str: String,
    pub time_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_sec: Option<f64>,
}

impl TimeMark {
    pub fn new(event: &str, time_str: &str, time_sec: f64) -> Self {
        TimeMark {
            event: event.to_string(),
            time_str: time_str.to_string(),
            time_sec,
            ratio: None,
            diff_sec: None,
            delta_sec: None,
        }
    }

    /// `"<event> (<time>)"`, the form marks are listed and searched in.
    pub fn label(&self) -> String {
        format!("{} ({})", self.event, self.time_str)
    }

    /// The add-to-cut display, e.g. `-0.02`. Empty for marks that did not miss.
    pub fn delta_label(&self) -> String {
        self.diff_sec.map(format_delta).unwrap_or_default()
    }

    fn dedupe_key(&self) -> String {
        format!("{}||{}", self.event, self.time_str).to_lowercase()
    }
}

/// Insertion-ordered set of marks, unique on case-insensitive `(event, time)`.
#[derive(Debug, Clone, Default)]
pub struct MarkSet {
    marks: Vec<TimeMark>,
    seen: HashSet<String>,
}

impl MarkSet {
    /// Adds `mark` unless an equal `(event, time)` pair is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, mark: TimeMark) -> bool {
        if !self.seen.insert(mark.dedupe_key()) {
            return false;
        }
        self.marks.push(mark);
        true
    }

    pub fn marks(&self) -> &[TimeMark] {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Fastest first, ties broken by event name.
    pub(crate) fn sort_by_time(&mut self) {
        self.marks.sort_by(|a, b| {
            a.time_sec
                .total_cmp(&b.time_sec)
                .then_with(|| a.event.cmp(&b.event))
        });
    }

    /// Smallest overage first, ties broken by event name, keeping `limit`.
    pub(crate) fn keep_closest(&mut self, limit: usize) {
        self.marks.sort_by(|a, b| {
            let da = a.diff_sec.unwrap_or(f64::INFINITY);
            let db = b.diff_sec.unwrap_or(f64::INFINITY);
            da.total_cmp(&db).then_with(|| a.event.cmp(&b.event))
        });
        self.marks.truncate(limit);
    }
}

impl Serialize for MarkSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.marks.serialize(serializer)
    }
}

/// Fastest swim seen for one of the configured best-of events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestOf {
    pub event: String,
    pub mark: Option<TimeMark>,
}

/// Everything derived for one swimmer, keyed by lowercase `name||gender`.
#[derive(Debug, Clone, Serialize)]
pub struct SwimmerAggregate {
    pub(crate) name: String,
    pub(crate) gender: String,
    pub(crate) age: String,
    pub(crate) age_num: i32,
    pub(crate) site: String,
    pub(crate) group: String,
    pub(crate) achieved: BTreeMap<StandardKind, MarkSet>,
    pub(crate) near_misses: MarkSet,
    pub(crate) next_up: MarkSet,
    pub(crate) best_of: Vec<BestOf>,
}

impl SwimmerAggregate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    /// Display age: the cell that carried the highest age seen.
    pub fn age(&self) -> &str {
        &self.age
    }

    pub fn age_num(&self) -> i32 {
        self.age_num
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Marks at or under the `kind` standard. Empty if none were achieved.
    pub fn achieved(&self, kind: StandardKind) -> &[TimeMark] {
        self.achieved.get(&kind).map(MarkSet::marks).unwrap_or(&[])
    }

    pub fn near_misses(&self) -> &[TimeMark] {
        self.near_misses.marks()
    }

    pub fn next_up(&self) -> &[TimeMark] {
        self.next_up.marks()
    }

    pub fn best_of(&self) -> &[BestOf] {
        &self.best_of
    }

    /// Case-insensitive substring match over identity and every listed mark.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        let mut hay = format!("{} {} {}", self.name, self.gender, self.age);
        let all = self
            .achieved
            .values()
            .flat_map(MarkSet::marks)
            .chain(self.near_misses.marks())
            .chain(self.best_of.iter().filter_map(|b| b.mark.as_ref()));
        for mark in all {
            hay.push(' ');
            hay.push_str(&mark.label());
        }
        for mark in self.next_up.marks() {
            hay.push(' ');
            hay.push_str(&mark.label());
            hay.push(' ');
            hay.push_str(&mark.delta_label());
        }

        hay.to_lowercase().contains(&query)
    }
}

/// Names clearing one standard column for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCount {
    pub label: String,
    pub threshold: String,
    pub names: Vec<String>,
}

/// Per-event pivot result: one name list per standard column plus the bubble.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardCounts {
    pub event: String,
    pub columns: Vec<ColumnCount>,
    pub bubble: Vec<String>,
}

/// Roster output handed to the presentation layer.
#[derive(Debug, Serialize)]
pub struct RosterReport {
    pub generated_at: DateTime<Utc>,
    pub site: Option<String>,
    pub groups: Vec<String>,
    pub swimmer_count: usize,
    pub swimmers: Vec<SwimmerAggregate>,
}

/// Pivot output for one gender.
#[derive(Debug, Serialize)]
pub struct PivotReport {
    pub generated_at: DateTime<Utc>,
    pub gender: GenderCategory,
    pub events: Vec<StandardCounts>,
}
