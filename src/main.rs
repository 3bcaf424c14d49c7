//! CLI entry point for the swim cuts tool.
//!
//! Reads a results sheet (local CSV or sheet export URL), runs the
//! qualification engine, and prints or exports the resulting views.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use swim_cuts::fetch::{BasicClient, load_source};
use swim_cuts::listing::{count_swimmers, list_athletes};
use swim_cuts::normalize::{NormalizedRow, normalize_rows};
use swim_cuts::output::{
    RosterCsvRow, best_of_lines, mark_lines, next_up_lines, print_json, print_pretty, write_csv,
};
use swim_cuts::query::RosterQuery;
use swim_cuts::sheet::{Sheet, parse_sheet, resolve_sheet_source};
use swim_cuts::standards::pivot::{StandardsTable, build_event_pivot, count_standards};
use swim_cuts::standards::ranking::{RosterOrder, group_sections, sort_roster, sort_rows};
use swim_cuts::standards::roster::{build_roster, count_achieving};
use swim_cuts::standards::summary::summarize_qualifiers;
use swim_cuts::standards::types::{PivotReport, RosterReport, StandardKind, SwimmerAggregate};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "swim_cuts")]
#[command(about = "Qualification standards report for swim meet results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the swims sheet and the query come from.
#[derive(clap::Args)]
struct SourceArgs {
    /// Path to a CSV file or URL to fetch. Defaults to the sheet export
    /// built from SHEET_ID / SHEET_GID.
    #[arg(value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// Built-in query preset: senior, age-group or ynat
    #[arg(short, long, default_value = "senior")]
    preset: String,

    /// JSON query file; overrides the preset
    #[arg(short, long)]
    config: Option<String>,

    /// Override the target site
    #[arg(long)]
    site: Option<String>,

    /// Override the target groups (repeatable, sets the group order)
    #[arg(long)]
    group: Vec<String>,

    /// Only show entries containing this text
    #[arg(short, long)]
    search: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-swimmer cuts, near misses, graded standards and next-up events
    Roster {
        #[command(flatten)]
        args: SourceArgs,

        /// Print the report as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the roster to this CSV file
        #[arg(long)]
        csv: Option<String>,

        /// Render group sections instead of gender sections
        #[arg(long, default_value_t = false)]
        by_group: bool,
    },
    /// Every athlete once, by site, group, name and age
    Athletes {
        #[command(flatten)]
        args: SourceArgs,

        /// Also write the listing to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Matching sheet rows sorted by name then age
    Rows {
        #[command(flatten)]
        args: SourceArgs,
    },
    /// Per-event counts of swimmers clearing each standard, by gender
    Standards {
        #[command(flatten)]
        args: SourceArgs,

        /// Standards sheet (CSV file or URL). Defaults to the SHEET_ID tab
        /// given by STANDARDS_GID.
        #[arg(long)]
        standards: Option<String>,
    },
    /// Club-wide qualifiers and bubble swimmers against the cut
    Qualifiers {
        #[command(flatten)]
        args: SourceArgs,
    },
    /// Number of distinct swimmers in the sheet
    Count {
        #[command(flatten)]
        args: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/swim_cuts.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("swim_cuts.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Roster {
            args,
            json,
            csv,
            by_group,
        } => roster(&args, json, csv.as_deref(), by_group).await?,
        Commands::Athletes { args, csv } => athletes(&args, csv.as_deref()).await?,
        Commands::Rows { args } => rows(&args).await?,
        Commands::Standards { args, standards } => {
            standards_counts(&args, standards.as_deref()).await?
        }
        Commands::Qualifiers { args } => qualifiers(&args).await?,
        Commands::Count { args } => count(&args).await?,
    }

    Ok(())
}

/// Resolves the preset, config file and flag overrides into one query.
fn resolve_query(args: &SourceArgs) -> Result<RosterQuery> {
    let mut query = match &args.config {
        Some(path) => RosterQuery::load(path)?,
        None => RosterQuery::preset(&args.preset)?,
    };
    if let Some(site) = &args.site {
        query.target_site = Some(site.clone());
    }
    if !args.group.is_empty() {
        query.target_groups = args.group.clone();
    }
    Ok(query)
}

/// Explicit source, or the sheet export URL for `gid_var` under SHEET_ID.
fn resolve_source(
    explicit: Option<&str>,
    gid_var: &str,
    default_gid: Option<&str>,
) -> Result<String> {
    resolve_sheet_source(
        explicit,
        std::env::var("SHEET_ID").ok().as_deref(),
        gid_var,
        std::env::var(gid_var).ok().as_deref(),
        default_gid,
    )
}

async fn load_sheet(source: &str) -> Result<Sheet> {
    let bytes = load_source(&BasicClient::new(), source).await?;
    parse_sheet(&bytes)
}

/// Loads the swims sheet and normalizes every row against the query columns.
async fn load_rows(args: &SourceArgs, query: &RosterQuery) -> Result<Vec<NormalizedRow>> {
    let source = resolve_source(args.source.as_deref(), "SHEET_GID", Some("0"))?;
    let sheet = load_sheet(&source).await?;
    let rows = normalize_rows(&sheet.rows, &query.columns);
    info!(rows = rows.len(), "Swims sheet loaded");
    Ok(rows)
}

fn filtered(rows: Vec<NormalizedRow>, query: &RosterQuery) -> Vec<NormalizedRow> {
    rows.into_iter().filter(|r| query.matches(r)).collect()
}

fn print_swimmer(swimmer: &SwimmerAggregate, kinds: &[StandardKind]) {
    println!("{} ({}, {})", swimmer.name(), swimmer.gender(), swimmer.age());
    for kind in kinds {
        let empty = format!("No {} times", kind.label());
        println!("  {}:", kind.label());
        for line in mark_lines(swimmer.achieved(*kind), &empty) {
            println!("    {line}");
        }
    }
    if kinds.contains(&StandardKind::Cut) {
        println!("  Near misses:");
        for line in mark_lines(swimmer.near_misses(), "No near misses") {
            println!("    {line}");
        }
        println!("  Next up:");
        for line in next_up_lines(swimmer.next_up(), "No next up events") {
            println!("    {line}");
        }
    }
    if !swimmer.best_of().is_empty() {
        println!("  Best times:");
        for line in best_of_lines(swimmer.best_of()) {
            println!("    {line}");
        }
    }
}

#[tracing::instrument(skip(args))]
async fn roster(args: &SourceArgs, json: bool, csv: Option<&str>, by_group: bool) -> Result<()> {
    let query = resolve_query(args)?;
    let rows = filtered(load_rows(args, &query).await?, &query);

    let order = RosterOrder::GenderSections {
        genders: query.genders.clone(),
        order: query.gender_order.clone(),
    };
    let mut swimmers = build_roster(&rows, &query);
    sort_roster(&mut swimmers, &order);

    let kinds: Vec<StandardKind> = query.columns.standards.keys().copied().collect();
    for kind in &kinds {
        info!(
            standard = kind.label(),
            swimmers = count_achieving(&swimmers, *kind),
            "Swimmers achieving standard"
        );
    }

    // The full roster is kept; the search only narrows what is shown.
    let shown: Vec<SwimmerAggregate> = match &args.search {
        Some(q) => swimmers.iter().filter(|s| s.matches(q)).cloned().collect(),
        None => swimmers.clone(),
    };

    if shown.is_empty() {
        warn!(site = ?query.target_site, groups = ?query.target_groups, "No swimmers found");
    }

    if let Some(path) = csv {
        let records: Vec<RosterCsvRow> = shown
            .iter()
            .map(|s| RosterCsvRow::from_swimmer(s, &kinds))
            .collect();
        write_csv(path, &records)?;
        info!(path, records = records.len(), "Roster CSV written");
    }

    let report = RosterReport {
        generated_at: chrono::Utc::now(),
        site: query.target_site.clone(),
        groups: query.target_groups.clone(),
        swimmer_count: shown.len(),
        swimmers: shown,
    };

    if json {
        return print_json(&report);
    }
    print_pretty(&report);

    println!("{} swimmers", report.swimmer_count);
    if by_group {
        for (group, members) in group_sections(&report.swimmers, &query.target_groups, &order) {
            println!("\n== {} ==", group.to_uppercase());
            for swimmer in members {
                print_swimmer(swimmer, &kinds);
            }
        }
    } else {
        let mut section: Option<&str> = None;
        for swimmer in &report.swimmers {
            let title = query
                .genders
                .resolve(swimmer.gender())
                .map(|g| g.section_title())
                .unwrap_or("OTHER");
            if section != Some(title) {
                println!("\n== {title} ==");
                section = Some(title);
            }
            print_swimmer(swimmer, &kinds);
        }
    }

    Ok(())
}

#[tracing::instrument(skip(args))]
async fn athletes(args: &SourceArgs, csv: Option<&str>) -> Result<()> {
    let query = resolve_query(args)?;
    let rows = load_rows(args, &query).await?;

    let all = list_athletes(&rows);
    let shown: Vec<_> = match &args.search {
        Some(q) => all.iter().filter(|a| a.matches(q)).cloned().collect(),
        None => all,
    };

    if let Some(path) = csv {
        write_csv(path, &shown)?;
    }

    println!("{} athletes", shown.len());
    for a in &shown {
        println!("{}\t{}\t{}\t{}", a.site, a.group, a.name, a.age);
    }
    Ok(())
}

#[tracing::instrument(skip(args))]
async fn rows(args: &SourceArgs) -> Result<()> {
    let query = resolve_query(args)?;
    let mut rows = filtered(load_rows(args, &query).await?, &query);
    sort_rows(&mut rows);

    if let Some(q) = &args.search {
        let q = q.trim().to_lowercase();
        rows.retain(|r| {
            [
                r.name.as_str(),
                r.gender.as_str(),
                r.age.as_str(),
                r.event.as_str(),
                r.time_str.as_str(),
                r.standard_cell(StandardKind::Cut),
                r.standard_cell(StandardKind::AgChamps),
            ]
            .join(" | ")
            .to_lowercase()
            .contains(&q)
        });
    }

    println!("{} rows", rows.len());
    for r in &rows {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.name,
            r.gender,
            r.age,
            r.event,
            r.time_str,
            r.standard_cell(StandardKind::Cut),
            r.standard_cell(StandardKind::AgChamps),
        );
    }
    Ok(())
}

#[tracing::instrument(skip(args))]
async fn standards_counts(args: &SourceArgs, standards: Option<&str>) -> Result<()> {
    let query = resolve_query(args)?;
    let rows = load_rows(args, &query).await?;

    let standards_source = resolve_source(standards, "STANDARDS_GID", None)?;
    let standards_sheet = load_sheet(&standards_source).await?;
    if standards_sheet.rows.is_empty() {
        bail!("no standards data found in {standards_source}");
    }
    let table = StandardsTable::from_rows(
        &standards_sheet.header,
        &standards_sheet.rows,
        &query.event_order,
    );

    let pivot = build_event_pivot(&rows, &query.genders);

    for &gender in &query.gender_order {
        let report = PivotReport {
            generated_at: chrono::Utc::now(),
            gender,
            events: count_standards(&pivot, &table, gender, &query.bubble_band),
        };
        print_pretty(&report);

        println!("\n== {} ==", gender.section_title());
        for event in &report.events {
            println!("{}", event.event);
            for column in &event.columns {
                let threshold = if column.threshold.is_empty() { "—" } else { column.threshold.as_str() };
                println!("  {} ({}): {}", column.label, threshold, names_cell(&column.names));
            }
            println!("  Bubble: {}", names_cell(&event.bubble));
        }
    }
    Ok(())
}

fn names_cell(names: &[String]) -> String {
    if names.is_empty() {
        "—".to_string()
    } else {
        names.join(", ")
    }
}

#[tracing::instrument(skip(args))]
async fn qualifiers(args: &SourceArgs) -> Result<()> {
    let query = resolve_query(args)?;
    let rows = filtered(load_rows(args, &query).await?, &query);
    let summary = summarize_qualifiers(&rows, &query.bubble_band);
    print_pretty(&summary);

    for (title, map) in [("Qualifiers", &summary.qualifiers), ("Bubble", &summary.bubble)] {
        println!("\n== {title}: {} swimmers ==", map.len());
        for (name, events) in map {
            println!("{name}");
            for event in events {
                println!("  {event}");
            }
        }
    }
    Ok(())
}

#[tracing::instrument(skip(args))]
async fn count(args: &SourceArgs) -> Result<()> {
    let query = resolve_query(args)?;
    let rows = load_rows(args, &query).await?;
    println!("{}", count_swimmers(&rows));
    Ok(())
}
