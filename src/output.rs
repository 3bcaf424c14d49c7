//! Output formatting and persistence for roster reports.
//!
//! Supports pretty-printing, JSON serialization, CSV export, and the text
//! lines each report cell is rendered from.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::standards::types::{BestOf, StandardKind, SwimmerAggregate, TimeMark};
use csv::WriterBuilder;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(report: &T) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes records to a CSV file with a header row, replacing any existing file.
pub fn write_csv<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    debug!(path, records = records.len(), "Writing CSV");

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// `"<event> (<time>)"` per mark, or the placeholder when there are none.
pub fn mark_lines(marks: &[TimeMark], empty: &str) -> Vec<String> {
    if marks.is_empty() {
        return vec![empty.to_string()];
    }
    marks.iter().map(TimeMark::label).collect()
}

/// Next-up lines with the time still to drop: `"<event> (<time>) | (-0.02)"`.
pub fn next_up_lines(marks: &[TimeMark], empty: &str) -> Vec<String> {
    if marks.is_empty() {
        return vec![empty.to_string()];
    }
    marks
        .iter()
        .map(|m| format!("{} | ({})", m.label(), m.delta_label()))
        .collect()
}

/// One line per best-of event, `"<event> —"` when never swum.
pub fn best_of_lines(best: &[BestOf]) -> Vec<String> {
    best.iter()
        .map(|b| match &b.mark {
            Some(mark) => mark.label(),
            None => format!("{} —", b.event),
        })
        .collect()
}

/// Flat CSV shape of a swimmer aggregate. List cells are `"; "`-joined.
#[derive(Debug, Serialize)]
pub struct RosterCsvRow {
    pub name: String,
    pub gender: String,
    pub age: String,
    pub site: String,
    pub group: String,
    pub achieved: String,
    pub near_misses: String,
    pub next_up: String,
    pub best_of: String,
}

impl RosterCsvRow {
    pub fn from_swimmer(swimmer: &SwimmerAggregate, kinds: &[StandardKind]) -> Self {
        let achieved = kinds
            .iter()
            .filter(|k| !swimmer.achieved(**k).is_empty())
            .map(|k| {
                let marks: Vec<String> = swimmer.achieved(*k).iter().map(TimeMark::label).collect();
                format!("{}: {}", k.label(), marks.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        RosterCsvRow {
            name: swimmer.name().to_string(),
            gender: swimmer.gender().to_string(),
            age: swimmer.age().to_string(),
            site: swimmer.site().to_string(),
            group: swimmer.group().to_string(),
            achieved,
            near_misses: mark_lines(swimmer.near_misses(), "").join("; "),
            next_up: next_up_lines(swimmer.next_up(), "").join("; "),
            best_of: swimmer
                .best_of()
                .iter()
                .filter_map(|b| b.mark.as_ref().map(TimeMark::label))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedRow;
    use crate::query::{ColumnMap, RosterQuery};
    use crate::standards::roster::build_roster;
    use std::env;
    use std::fs;
    use std::path::Path;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn roster() -> Vec<SwimmerAggregate> {
        let make = |event: &str, time: &str, cut: &str| {
            let mut cells = vec![String::new(); 16];
            cells[0] = "Alice".into();
            cells[1] = "F".into();
            cells[2] = "15".into();
            cells[3] = "East".into();
            cells[4] = "Senior I".into();
            cells[5] = event.into();
            cells[6] = time.into();
            cells[15] = cut.into();
            NormalizedRow::from_raw(&cells, &ColumnMap::default())
        };
        let rows = vec![
            make("100 Free SCY", "58.50", "59.00"),
            make("200 Free SCY", "2:00.10", "2:00.00"),
            make("200 IM SCY", "2:10.00", ""),
        ];
        build_roster(&rows, &RosterQuery::senior("East", "Senior I"))
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&roster());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&roster()).unwrap();
    }

    #[test]
    fn test_mark_lines_placeholder() {
        assert_eq!(mark_lines(&[], "No AAA Times"), ["No AAA Times"]);
    }

    #[test]
    fn test_next_up_lines() {
        let r = roster();
        let lines = next_up_lines(r[0].next_up(), "No Next Up Events");
        assert_eq!(lines, ["200 Free SCY (2:00.10) | (-00.10)"]);
    }

    #[test]
    fn test_best_of_lines() {
        let r = roster();
        assert_eq!(best_of_lines(r[0].best_of()), ["200 IM SCY (2:10.00)", "400 IM SCY —"]);
    }

    #[test]
    fn test_csv_row() {
        let r = roster();
        let row = RosterCsvRow::from_swimmer(&r[0], &[StandardKind::Cut, StandardKind::Aaa]);
        assert_eq!(row.achieved, "Cut: 100 Free SCY (58.50)");
        assert_eq!(row.near_misses, "200 Free SCY (2:00.10)");
        assert_eq!(row.best_of, "200 IM SCY (2:10.00)");
    }

    #[test]
    fn test_write_csv_writes_header_and_rows() {
        let path = temp_path("swim_cuts_test_roster.csv");
        let _ = fs::remove_file(&path);

        let r = roster();
        let rows: Vec<_> = r
            .iter()
            .map(|s| RosterCsvRow::from_swimmer(s, &[StandardKind::Cut]))
            .collect();
        write_csv(&path, &rows).unwrap();
        write_csv(&path, &rows).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("name,gender,age"));

        fs::remove_file(&path).unwrap();
    }
}
