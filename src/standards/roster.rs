use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

use crate::normalize::NormalizedRow;
use crate::query::RosterQuery;
use crate::standards::classify::{Verdict, classify, meets};
use crate::standards::types::{BestOf, MarkSet, StandardKind, SwimmerAggregate, TimeMark};

/// Case-insensitive swimmer identity.
fn identity_key(name: &str, gender: &str) -> String {
    format!("{name}||{gender}").to_lowercase()
}

impl SwimmerAggregate {
    fn from_row(row: &NormalizedRow, query: &RosterQuery) -> Self {
        SwimmerAggregate {
            name: row.name.clone(),
            gender: row.gender.clone(),
            age: row.age.clone(),
            age_num: row.age_num,
            site: row.site.clone(),
            group: row.group.clone(),
            achieved: BTreeMap::new(),
            near_misses: MarkSet::default(),
            next_up: MarkSet::default(),
            best_of: query
                .best_of_events
                .iter()
                .map(|event| BestOf {
                    event: event.clone(),
                    mark: None,
                })
                .collect(),
        }
    }

    /// Ages only ever move up. Site and group keep the first non-empty value.
    fn absorb_identity(&mut self, row: &NormalizedRow) {
        if row.age_num > self.age_num {
            self.age_num = row.age_num;
            self.age = row.age.clone();
        }
        if self.site.is_empty() {
            self.site = row.site.clone();
        }
        if self.group.is_empty() {
            self.group = row.group.clone();
        }
    }

    fn absorb_swim(&mut self, row: &NormalizedRow, time_sec: f64, query: &RosterQuery) {
        let mark = || TimeMark::new(&row.event, &row.time_str, time_sec);

        for &kind in row.standards.keys() {
            let standard = row.standard(kind);

            if !kind.is_banded() {
                if meets(time_sec, standard) {
                    self.achieved.entry(kind).or_default().insert(mark());
                }
                continue;
            }

            match classify(time_sec, standard, &query.near_band) {
                None => {}
                Some(Verdict::Achieved) => {
                    self.achieved.entry(kind).or_default().insert(mark());
                }
                Some(Verdict::Missed(miss)) => {
                    if miss.near {
                        let mut near = mark();
                        near.ratio = Some(miss.ratio);
                        self.near_misses.insert(near);
                    }

                    let mut next = mark();
                    next.diff_sec = Some(miss.diff_sec);
                    next.delta_sec = Some(miss.delta_sec);
                    self.next_up.insert(next);
                }
            }
        }

        if let Some(best) = self.best_of.iter_mut().find(|b| b.event == row.event) {
            let faster = best.mark.as_ref().is_none_or(|m| time_sec < m.time_sec);
            if faster {
                best.mark = Some(mark());
            }
        }
    }

    fn finalize(&mut self, next_up_limit: usize) {
        for set in self.achieved.values_mut() {
            set.sort_by_time();
        }
        self.near_misses.sort_by_time();
        self.next_up.keep_closest(next_up_limit);
    }
}

/// Folds normalized rows into one aggregate per `(name, gender)`.
///
/// Rows are expected to have passed the site/group filter already. Rows
/// without a name or gender are dropped; rows without an event or a
/// parsable time only update identity and age. Output is in first-seen order
/// with every mark list sorted and the next-up list cut to the closest
/// `query.next_up_limit` misses.
pub fn build_roster(rows: &[NormalizedRow], query: &RosterQuery) -> Vec<SwimmerAggregate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut swimmers: Vec<SwimmerAggregate> = Vec::new();
    let mut dropped = 0usize;
    let mut unclassified = 0usize;

    for row in rows {
        if !row.has_identity() {
            dropped += 1;
            continue;
        }

        let key = identity_key(&row.name, &row.gender);
        let slot = *index.entry(key).or_insert_with(|| {
            swimmers.push(SwimmerAggregate::from_row(row, query));
            swimmers.len() - 1
        });
        let swimmer = &mut swimmers[slot];
        swimmer.absorb_identity(row);

        let time_sec = match row.time_sec {
            Some(t) if !row.event.is_empty() => t,
            _ => {
                trace!(name = %row.name, event = %row.event, time = %row.time_str, "Row has no classifiable swim");
                unclassified += 1;
                continue;
            }
        };

        swimmer.absorb_swim(row, time_sec, query);
    }

    for swimmer in &mut swimmers {
        swimmer.finalize(query.next_up_limit);
    }

    debug!(
        rows = rows.len(),
        swimmers = swimmers.len(),
        dropped,
        unclassified,
        "Roster built"
    );

    swimmers
}

/// Count of distinct swimmers achieving `kind` at least once.
pub fn count_achieving(swimmers: &[SwimmerAggregate], kind: StandardKind) -> usize {
    swimmers
        .iter()
        .filter(|s| !s.achieved(kind).is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ColumnMap;
    use crate::standards::classify::NearBand;

    fn row(name: &str, gender: &str, age: &str, event: &str, time: &str, cut: &str) -> NormalizedRow {
        let mut cells = vec![String::new(); 17];
        cells[0] = name.into();
        cells[1] = gender.into();
        cells[2] = age.into();
        cells[3] = "East".into();
        cells[4] = "Senior I".into();
        cells[5] = event.into();
        cells[6] = time.into();
        cells[15] = cut.into();
        NormalizedRow::from_raw(&cells, &ColumnMap::default())
    }

    fn with(mut r: NormalizedRow, kind: StandardKind, value: &str) -> NormalizedRow {
        r.standards.insert(kind, crate::time::parse_time(value));
        r.standard_cells.insert(kind, value.to_string());
        r
    }

    fn senior() -> RosterQuery {
        RosterQuery::senior("East", "Senior I")
    }

    #[test]
    fn test_duplicate_rows_collapse_and_age_upgrades() {
        let rows = vec![
            row("Alice", "F", "15", "100 Free SCY", "58.50", "59.00"),
            row("Alice", "F", "16", "100 Free SCY", "58.50", "59.00"),
        ];
        let roster = build_roster(&rows, &senior());

        assert_eq!(roster.len(), 1);
        let alice = &roster[0];
        assert_eq!(alice.age_num(), 16);
        assert_eq!(alice.age(), "16");
        let cuts = alice.achieved(StandardKind::Cut);
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].label(), "100 Free SCY (58.50)");
    }

    #[test]
    fn test_age_never_decreases() {
        let rows = vec![
            row("Bob", "M", "17", "", "", ""),
            row("Bob", "M", "15", "", "", ""),
            row("bob", "m", "", "", "", ""),
        ];
        let roster = build_roster(&rows, &senior());
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].age_num(), 17);
        assert_eq!(roster[0].name(), "Bob");
    }

    #[test]
    fn test_missing_identity_is_dropped() {
        let rows = vec![
            row("", "F", "15", "100 Free SCY", "58.50", "59.00"),
            row("Carol", "", "15", "100 Free SCY", "58.50", "59.00"),
        ];
        assert!(build_roster(&rows, &senior()).is_empty());
    }

    #[test]
    fn test_unparsable_time_keeps_identity() {
        let rows = vec![row("Dana", "F", "14", "100 Free SCY", "NT", "59.00")];
        let roster = build_roster(&rows, &senior());
        assert_eq!(roster.len(), 1);
        assert!(roster[0].achieved(StandardKind::Cut).is_empty());
        assert!(roster[0].next_up().is_empty());
    }

    #[test]
    fn test_near_miss_is_also_next_up() {
        let rows = vec![row("Eve", "F", "15", "100 Free SCY", "59.02", "59.00")];
        let roster = build_roster(&rows, &senior());
        let eve = &roster[0];

        assert!(eve.achieved(StandardKind::Cut).is_empty());
        assert_eq!(eve.near_misses().len(), 1);
        assert!(eve.near_misses()[0].ratio.is_some());
        assert_eq!(eve.next_up().len(), 1);
        let diff = eve.next_up()[0].diff_sec.unwrap();
        assert!((diff - 0.02).abs() < 1e-9);
        assert_eq!(eve.next_up()[0].delta_label(), "-00.02");
    }

    #[test]
    fn test_band_is_configurable() {
        let rows = vec![row("Fay", "F", "15", "100 Free SCY", "1:00.70", "59.00")];

        let tight = build_roster(&rows, &senior());
        assert!(tight[0].near_misses().is_empty());

        let mut loose = senior();
        loose.near_band = NearBand::BUBBLE;
        let loose = build_roster(&rows, &loose);
        assert_eq!(loose[0].near_misses().len(), 1);
        assert_eq!(loose[0].next_up().len(), 1);
    }

    #[test]
    fn test_next_up_keeps_closest_five() {
        let rows: Vec<_> = [
            ("50 Free SCY", "25.90", "25.00"),
            ("100 Free SCY", "59.10", "59.00"),
            ("200 Free SCY", "2:00.00", "1:55.00"),
            ("100 Back SCY", "1:01.00", "1:00.00"),
            ("100 Fly SCY", "1:00.30", "1:00.00"),
            ("200 IM SCY", "2:10.00", "2:08.00"),
            ("100 Breast SCY", "1:10.00", "1:08.50"),
        ]
        .iter()
        .map(|(e, t, c)| row("Gus", "M", "16", e, t, c))
        .collect();

        let roster = build_roster(&rows, &senior());
        let next = roster[0].next_up();
        assert_eq!(next.len(), 5);
        let diffs: Vec<f64> = next.iter().filter_map(|m| m.diff_sec).collect();
        assert!(diffs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(next[0].event, "100 Free SCY");
        assert!(next.iter().all(|m| m.event != "200 Free SCY"));
    }

    #[test]
    fn test_achieved_sorted_by_time_then_event() {
        let rows = vec![
            row("Hal", "M", "16", "200 Free SCY", "1:40.00", "1:45.00"),
            row("Hal", "M", "16", "100 Fly SCY", "50.00", "52.00"),
            row("Hal", "M", "16", "100 Back SCY", "50.00", "52.00"),
        ];
        let roster = build_roster(&rows, &senior());
        let events: Vec<_> = roster[0]
            .achieved(StandardKind::Cut)
            .iter()
            .map(|m| m.event.as_str())
            .collect();
        assert_eq!(events, ["100 Back SCY", "100 Fly SCY", "200 Free SCY"]);
    }

    #[test]
    fn test_graded_tiers_all_recorded() {
        let mut query = RosterQuery::age_group("East", &["Senior I"]);
        query.columns = ColumnMap::default();
        let r = row("Ivy", "F", "12", "100 Free SCY", "1:05.00", "");
        let r = with(r, StandardKind::B, "1:10.00");
        let r = with(r, StandardKind::BB, "1:07.00");
        let r = with(r, StandardKind::A, "1:04.00");
        let r = with(r, StandardKind::AgChamps, "1:06.00");

        let roster = build_roster(&[r], &query);
        let ivy = &roster[0];
        assert_eq!(ivy.achieved(StandardKind::B).len(), 1);
        assert_eq!(ivy.achieved(StandardKind::BB).len(), 1);
        assert_eq!(ivy.achieved(StandardKind::AgChamps).len(), 1);
        assert!(ivy.achieved(StandardKind::A).is_empty());
        // Graded standards never produce near misses.
        assert!(ivy.near_misses().is_empty());
        assert!(ivy.next_up().is_empty());
    }

    #[test]
    fn test_best_of_tracks_fastest() {
        let rows = vec![
            row("Jon", "M", "17", "200 IM SCY", "2:05.00", ""),
            row("Jon", "M", "17", "200 IM SCY", "2:03.50", ""),
            row("Jon", "M", "17", "200 IM SCY", "2:04.00", ""),
        ];
        let roster = build_roster(&rows, &senior());
        let best = roster[0].best_of();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].event, "200 IM SCY");
        assert_eq!(best[0].mark.as_ref().unwrap().time_str, "2:03.50");
        assert!(best[1].mark.is_none());
    }

    #[test]
    fn test_first_group_sticks() {
        let mut a = row("Kim", "F", "11", "", "", "");
        a.group = String::new();
        let mut b = row("Kim", "F", "11", "", "", "");
        b.group = "Silver".into();
        let mut c = row("Kim", "F", "11", "", "", "");
        c.group = "Green".into();
        let roster = build_roster(&[a, b, c], &RosterQuery::default());
        assert_eq!(roster[0].group(), "Silver");
    }

    #[test]
    fn test_count_achieving() {
        let rows = vec![
            row("Alice", "F", "15", "100 Free SCY", "58.50", "59.00"),
            row("Eve", "F", "15", "100 Free SCY", "59.02", "59.00"),
        ];
        let roster = build_roster(&rows, &senior());
        assert_eq!(count_achieving(&roster, StandardKind::Cut), 1);
    }
}
