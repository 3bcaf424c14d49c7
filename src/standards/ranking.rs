//! Ordering rules for roster views.
//!
//! The engine never picks an order on its own: every view states its policy.

use std::cmp::Ordering;

use crate::normalize::{GenderTable, NormalizedRow};
use crate::standards::types::{GenderCategory, SwimmerAggregate};

/// How a list of swimmers is ordered.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterOrder {
    /// Gender sections in the given order (unresolved genders last), then
    /// age descending, then name ascending.
    GenderSections {
        genders: GenderTable,
        order: Vec<GenderCategory>,
    },
    /// Name (case-insensitive), then age descending.
    Alphabetical,
}

fn name_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn gender_rank(genders: &GenderTable, order: &[GenderCategory], gender: &str) -> usize {
    genders
        .resolve(gender)
        .and_then(|g| order.iter().position(|o| *o == g))
        .unwrap_or(order.len())
}

impl RosterOrder {
    pub fn compare(&self, a: &SwimmerAggregate, b: &SwimmerAggregate) -> Ordering {
        match self {
            RosterOrder::GenderSections { genders, order } => {
                gender_rank(genders, order, a.gender())
                    .cmp(&gender_rank(genders, order, b.gender()))
                    .then_with(|| b.age_num().cmp(&a.age_num()))
                    .then_with(|| name_cmp(a.name(), b.name()))
            }
            RosterOrder::Alphabetical => name_cmp(a.name(), b.name())
                .then_with(|| b.age_num().cmp(&a.age_num())),
        }
    }
}

/// Sorts swimmers in place. The sort is stable.
pub fn sort_roster(swimmers: &mut [SwimmerAggregate], order: &RosterOrder) {
    swimmers.sort_by(|a, b| order.compare(a, b));
}

/// Swimmers split into group sections.
///
/// With an explicit `group_order`, listed groups come first in that order and
/// any other groups follow alphabetically; with none, all groups are
/// alphabetical. Empty sections are omitted. Within a section swimmers are
/// ordered by `order`.
pub fn group_sections<'a>(
    swimmers: &'a [SwimmerAggregate],
    group_order: &[String],
    order: &RosterOrder,
) -> Vec<(String, Vec<&'a SwimmerAggregate>)> {
    let mut groups: Vec<String> = group_order.to_vec();
    let mut extra: Vec<String> = swimmers
        .iter()
        .map(|s| s.group().to_string())
        .filter(|g| !group_order.contains(g))
        .collect();
    extra.sort();
    extra.dedup();
    groups.extend(extra);

    groups
        .into_iter()
        .filter_map(|group| {
            let mut members: Vec<&SwimmerAggregate> =
                swimmers.iter().filter(|s| s.group() == group).collect();
            if members.is_empty() {
                return None;
            }
            members.sort_by(|a, b| order.compare(a, b));
            Some((group, members))
        })
        .collect()
}

/// Row listing order: name (case-insensitive), then age descending.
pub fn sort_rows(rows: &mut [NormalizedRow]) {
    rows.sort_by(|a, b| name_cmp(&a.name, &b.name).then_with(|| b.age_num.cmp(&a.age_num)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ColumnMap, RosterQuery};
    use crate::standards::roster::build_roster;

    fn row(name: &str, gender: &str, age: &str, group: &str) -> NormalizedRow {
        let mut cells = vec![String::new(); 7];
        cells[0] = name.into();
        cells[1] = gender.into();
        cells[2] = age.into();
        cells[4] = group.into();
        NormalizedRow::from_raw(&cells, &ColumnMap::default())
    }

    fn sections() -> RosterOrder {
        RosterOrder::GenderSections {
            genders: GenderTable::default(),
            order: vec![GenderCategory::Male, GenderCategory::Female],
        }
    }

    fn names(swimmers: &[SwimmerAggregate]) -> Vec<&str> {
        swimmers.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_gender_sections_then_age_then_name() {
        let rows = vec![
            row("Fiona", "Female", "15", "G"),
            row("Mark", "Male", "14", "G"),
            row("Adam", "Male", "16", "G"),
            row("Zack", "Male", "16", "G"),
            row("Alex", "Other", "18", "G"),
            row("Beth", "Female", "17", "G"),
        ];
        let mut roster = build_roster(&rows, &RosterQuery::default());
        sort_roster(&mut roster, &sections());
        assert_eq!(names(&roster), ["Adam", "Zack", "Mark", "Beth", "Fiona", "Alex"]);
    }

    #[test]
    fn test_gender_sections_name_tiebreak_ignores_case() {
        let rows = vec![
            row("bea", "F", "15", "G"),
            row("Cora", "F", "15", "G"),
            row("Abby", "F", "15", "G"),
        ];
        let mut roster = build_roster(&rows, &RosterQuery::default());
        sort_roster(&mut roster, &sections());
        assert_eq!(names(&roster), ["Abby", "bea", "Cora"]);
    }

    #[test]
    fn test_female_first_when_asked() {
        let rows = vec![row("Mark", "M", "14", "G"), row("Fiona", "F", "12", "G")];
        let mut roster = build_roster(&rows, &RosterQuery::default());
        let order = RosterOrder::GenderSections {
            genders: GenderTable::default(),
            order: vec![GenderCategory::Female, GenderCategory::Male],
        };
        sort_roster(&mut roster, &order);
        assert_eq!(names(&roster), ["Fiona", "Mark"]);
    }

    #[test]
    fn test_alphabetical() {
        let rows = vec![
            row("bob", "M", "14", "G"),
            row("Alice", "F", "12", "G"),
            row("Bob", "F", "16", "G"),
        ];
        let mut roster = build_roster(&rows, &RosterQuery::default());
        sort_roster(&mut roster, &RosterOrder::Alphabetical);
        assert_eq!(names(&roster), ["Alice", "Bob", "bob"]);
    }

    #[test]
    fn test_group_sections_explicit_order() {
        let rows = vec![
            row("Ann", "F", "10", "Green"),
            row("Ben", "M", "11", "Silver"),
            row("Cid", "M", "12", "Blue"),
            row("Dee", "F", "9", "Aqua"),
            row("Eli", "M", "10", "Green"),
        ];
        let roster = build_roster(&rows, &RosterQuery::default());
        let order = vec!["Silver".to_string(), "Purple".to_string(), "Green".to_string()];
        let grouped = group_sections(&roster, &order, &sections());

        let titles: Vec<_> = grouped.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(titles, ["Silver", "Green", "Aqua", "Blue"]);
        let green: Vec<_> = grouped[1].1.iter().map(|s| s.name()).collect();
        assert_eq!(green, ["Eli", "Ann"]);
    }

    #[test]
    fn test_group_sections_alphabetical_fallback() {
        let rows = vec![row("Ann", "F", "10", "White"), row("Ben", "M", "11", "Purple")];
        let roster = build_roster(&rows, &RosterQuery::default());
        let grouped = group_sections(&roster, &[], &sections());
        let titles: Vec<_> = grouped.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(titles, ["Purple", "White"]);
    }

    #[test]
    fn test_sort_rows() {
        let mut rows = vec![
            row("zoe", "F", "12", ""),
            row("Amy", "F", "11", ""),
            row("Amy", "F", "13", ""),
        ];
        sort_rows(&mut rows);
        let got: Vec<_> = rows.iter().map(|r| (r.name.as_str(), r.age_num)).collect();
        assert_eq!(got, [("Amy", 13), ("Amy", 11), ("zoe", 12)]);
    }
}
