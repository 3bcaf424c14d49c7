//! Athlete listing: one entry per site, group and name.

use serde::Serialize;
use std::collections::HashMap;

use crate::normalize::NormalizedRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteEntry {
    pub site: String,
    pub group: String,
    pub name: String,
    pub age: String,
    #[serde(skip)]
    pub age_num: i32,
}

impl AthleteEntry {
    fn from_row(row: &NormalizedRow) -> Self {
        AthleteEntry {
            site: row.site.clone(),
            group: row.group.clone(),
            name: row.name.clone(),
            age: row.age.clone(),
            age_num: row.age_num,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        let hay = format!("{} {} {} {}", self.site, self.group, self.name, self.age);
        hay.to_lowercase().contains(&query)
    }
}

/// Lists every athlete once, keeping the entry with the highest age.
///
/// Rows need a name, site and group. Entries are ordered by site, group,
/// name (all case-insensitive), then age descending.
pub fn list_athletes(rows: &[NormalizedRow]) -> Vec<AthleteEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<AthleteEntry> = Vec::new();

    for row in rows {
        if row.name.is_empty() || row.site.is_empty() || row.group.is_empty() {
            continue;
        }

        let key = format!("{}||{}||{}", row.site, row.group, row.name).to_lowercase();
        match index.get(&key) {
            Some(&i) => {
                if row.age_num > entries[i].age_num {
                    entries[i] = AthleteEntry::from_row(row);
                }
            }
            None => {
                index.insert(key, entries.len());
                entries.push(AthleteEntry::from_row(row));
            }
        }
    }

    entries.sort_by(|a, b| {
        a.site
            .to_lowercase()
            .cmp(&b.site.to_lowercase())
            .then_with(|| a.group.to_lowercase().cmp(&b.group.to_lowercase()))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| b.age_num.cmp(&a.age_num))
    });

    entries
}

/// Distinct non-empty swimmer names.
pub fn count_swimmers(rows: &[NormalizedRow]) -> usize {
    rows.iter()
        .filter(|r| !r.name.is_empty())
        .map(|r| r.name.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len()
}
