//! Roster query configuration.
//!
//! Everything the engine would otherwise hardcode per page (target site and
//! groups, column positions, band bounds, event lists) lives in a
//! [`RosterQuery`]. Built-in presets cover the common views; a JSON file can
//! override any field:
//! ```json
//! {
//!   "target_site": "West",
//!   "target_groups": ["Senior I"],
//!   "near_band": { "min": 1.0001, "max": 1.003, "min_inclusive": true }
//! }
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalize::{GenderTable, NormalizedRow};
use crate::standards::classify::NearBand;
use crate::standards::types::{GenderCategory, StandardKind};

/// Zero-based column positions in the swims sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub name: usize,
    pub gender: usize,
    pub age: usize,
    pub site: usize,
    pub group: usize,
    pub event: usize,
    pub time: usize,
    pub standards: BTreeMap<StandardKind, usize>,
}

impl Default for ColumnMap {
    /// Layout of the club results sheet: A..G identity and swim, J/K/L B/BB/A,
    /// N AAA, P short course YNAT cut, Q age group champs.
    fn default() -> Self {
        ColumnMap {
            name: 0,
            gender: 1,
            age: 2,
            site: 3,
            group: 4,
            event: 5,
            time: 6,
            standards: BTreeMap::from([
                (StandardKind::B, 9),
                (StandardKind::BB, 10),
                (StandardKind::A, 11),
                (StandardKind::Aaa, 13),
                (StandardKind::Cut, 15),
                (StandardKind::AgChamps, 16),
            ]),
        }
    }
}

impl ColumnMap {
    /// Keeps only the listed standard columns.
    pub fn with_standards(mut self, kinds: &[StandardKind]) -> Self {
        self.standards.retain(|k, _| kinds.contains(k));
        self
    }
}

pub const SHORT_COURSE_EVENTS: [&str; 14] = [
    "50 Free SCY",
    "100 Free SCY",
    "200 Free SCY",
    "500 Free SCY",
    "1000 Free SCY",
    "1650 Free SCY",
    "100 Back SCY",
    "200 Back SCY",
    "100 Breast SCY",
    "200 Breast SCY",
    "100 Fly SCY",
    "200 Fly SCY",
    "200 IM SCY",
    "400 IM SCY",
];

/// Parameters for one roster or pivot view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterQuery {
    /// Only rows from this site. `None` keeps every site.
    pub target_site: Option<String>,
    /// Only rows from these groups, also the order group sections render in.
    /// Empty keeps every group.
    pub target_groups: Vec<String>,
    pub columns: ColumnMap,
    /// Band for the roster near-miss list.
    pub near_band: NearBand,
    /// Band for the pivot and qualifier bubble lists.
    pub bubble_band: NearBand,
    /// Events whose fastest swim is tracked regardless of any standard.
    pub best_of_events: Vec<String>,
    pub next_up_limit: usize,
    /// Canonical event order for pivot views.
    pub event_order: Vec<String>,
    pub genders: GenderTable,
    /// Section order for gender-grouped views.
    pub gender_order: Vec<GenderCategory>,
}

impl Default for RosterQuery {
    fn default() -> Self {
        RosterQuery {
            target_site: None,
            target_groups: Vec::new(),
            columns: ColumnMap::default(),
            near_band: NearBand::TIGHT,
            bubble_band: NearBand::BUBBLE,
            best_of_events: Vec::new(),
            next_up_limit: 5,
            event_order: SHORT_COURSE_EVENTS.iter().map(|e| e.to_string()).collect(),
            genders: GenderTable::default(),
            gender_order: vec![GenderCategory::Male, GenderCategory::Female],
        }
    }
}

impl RosterQuery {
    /// Senior group page: YNAT cuts, 0.3% near misses, AAA and IM bests.
    pub fn senior(site: &str, group: &str) -> Self {
        RosterQuery {
            target_site: Some(site.to_string()),
            target_groups: vec![group.to_string()],
            columns: ColumnMap::default().with_standards(&[StandardKind::Cut, StandardKind::Aaa]),
            best_of_events: vec!["200 IM SCY".into(), "400 IM SCY".into()],
            ..Default::default()
        }
    }

    /// Age group page: AG champs, B, BB and A per group.
    pub fn age_group(site: &str, groups: &[&str]) -> Self {
        RosterQuery {
            target_site: Some(site.to_string()),
            target_groups: groups.iter().map(|g| g.to_string()).collect(),
            columns: ColumnMap::default().with_standards(&[
                StandardKind::AgChamps,
                StandardKind::B,
                StandardKind::BB,
                StandardKind::A,
            ]),
            ..Default::default()
        }
    }

    /// Whole-club YNAT view against the cut only.
    pub fn ynat() -> Self {
        RosterQuery {
            columns: ColumnMap::default().with_standards(&[StandardKind::Cut]),
            ..Default::default()
        }
    }

    /// Resolves a built-in preset by name.
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "senior" => Ok(Self::senior("East", "Senior I")),
            "age-group" => Ok(Self::age_group("Kerr", &["Silver", "Purple", "White", "Green"])),
            "ynat" => Ok(Self::ynat()),
            other => bail!("unknown preset '{other}' (expected senior, age-group or ynat)"),
        }
    }

    /// Loads a query from a JSON file. Missing fields take their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Site/group filter applied before rows reach the aggregators.
    pub fn matches(&self, row: &NormalizedRow) -> bool {
        let site_ok = self
            .target_site
            .as_deref()
            .is_none_or(|site| row.site == site);
        let group_ok =
            self.target_groups.is_empty() || self.target_groups.iter().any(|g| *g == row.group);
        site_ok && group_ok
    }
}
