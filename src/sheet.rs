//! CSV sheet reader.
//!
//! Splits a sheet export into its header row and data rows of plain string
//! cells. Column meaning is left to the caller.

use anyhow::{Result, bail};
use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::normalize::RawRow;

/// Google Sheets CSV export endpoint for one tab.
pub fn sheet_csv_url(sheet_id: &str, gid: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{sheet_id}/gviz/tq?tqx=out:csv&gid={gid}")
}

/// Picks the sheet to read: the explicit source if given, otherwise the
/// export URL for `sheet_id` and the tab in `gid`.
///
/// # Errors
///
/// Fails without an explicit source when `sheet_id` is missing, or when the
/// tab is missing and there is no `default_gid` to fall back to.
pub fn resolve_sheet_source(
    explicit: Option<&str>,
    sheet_id: Option<&str>,
    gid_var: &str,
    gid: Option<&str>,
    default_gid: Option<&str>,
) -> Result<String> {
    if let Some(source) = explicit {
        return Ok(source.to_string());
    }
    let Some(sheet_id) = sheet_id else {
        bail!("no source given and SHEET_ID is not set");
    };
    let Some(gid) = gid.or(default_gid) else {
        bail!("no source given and {gid_var} is not set");
    };
    Ok(sheet_csv_url(sheet_id, gid))
}

/// A parsed sheet: header row discarded from `rows`, kept in `header`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sheet {
    pub header: RawRow,
    pub rows: Vec<RawRow>,
}

/// Parses CSV bytes. Rows may have any number of cells; rows whose cells
/// are all blank are dropped. A row with a single non-blank cell is kept,
/// so a one-cell section marker such as `Womens` survives.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8 CSV.
pub fn parse_sheet(bytes: &[u8]) -> Result<Sheet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: RawRow = record.iter().map(str::to_string).collect();
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        records.push(row);
    }

    let mut records = records.into_iter();
    let Some(header) = records.next() else {
        warn!("Sheet is empty");
        return Ok(Sheet::default());
    };
    let rows: Vec<RawRow> = records.collect();

    debug!(columns = header.len(), rows = rows.len(), "Sheet parsed");
    Ok(Sheet { header, rows })
}
