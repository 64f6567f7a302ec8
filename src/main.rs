// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use auditor_timeline::{
    init_logging, load_addendums, load_letters, parse_date, TimelineConfig, TimelineIndex,
    ViewMode, WorkloadSummary,
};
use chrono::{Datelike, Local, NaiveDate};
use std::collections::HashMap;
use std::env;

const USAGE: &str = "\
Usage:
  auditor-timeline layout   --letters FILE [--addendums FILE] [VIEW] [--config FILE]
  auditor-timeline workload --letters FILE [--addendums FILE] [--start D --end D] [--json]
  auditor-timeline tui      --letters FILE [--addendums FILE] [VIEW] [--config FILE]

VIEW:
  --mode month|year|range  --year Y  --month M  --start YYYY-MM-DD  --end YYYY-MM-DD

Files may be .json (array of records) or .csv (header row).";

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        println!("{}", USAGE);
        return Ok(());
    };
    let flags = parse_flags(&args[2..])?;

    match command.as_str() {
        "layout" => run_layout(&flags),
        "workload" => run_workload(&flags),
        "tui" => run_tui(&flags),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

/// `--key value` pairs plus bare `--switch` flags (stored as "true")
fn parse_flags(args: &[String]) -> Result<HashMap<String, String>> {
    let mut flags = HashMap::new();
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        let Some(key) = arg.strip_prefix("--") else {
            bail!("Unexpected argument '{}'", arg);
        };

        let value = match iter.peek() {
            Some(next) if !next.starts_with("--") => iter.next().cloned().unwrap_or_default(),
            _ => "true".to_string(),
        };
        flags.insert(key.to_string(), value);
    }

    Ok(flags)
}

fn load_index(flags: &HashMap<String, String>) -> Result<TimelineIndex> {
    let letters_path = flags
        .get("letters")
        .context("--letters FILE is required")?;

    let letters = load_letters(letters_path)
        .with_context(|| format!("Failed to load letters from {}", letters_path))?;

    let addendums = match flags.get("addendums") {
        Some(path) => load_addendums(path)
            .with_context(|| format!("Failed to load addendums from {}", path))?,
        None => Vec::new(),
    };

    Ok(TimelineIndex::build(&letters, &addendums))
}

fn load_config(flags: &HashMap<String, String>) -> Result<TimelineConfig> {
    match flags.get("config") {
        Some(path) => TimelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path)),
        None => Ok(TimelineConfig::default()),
    }
}

fn view_mode(flags: &HashMap<String, String>, today: NaiveDate) -> Result<ViewMode> {
    let year = flags
        .get("year")
        .map(|y| y.parse::<i32>())
        .transpose()
        .context("--year must be a number")?;
    let month = flags
        .get("month")
        .map(|m| m.parse::<u32>())
        .transpose()
        .context("--month must be a number")?;

    let mode = ViewMode::from_params(
        flags.get("mode").map(String::as_str).unwrap_or("month"),
        year,
        month,
        flags.get("start").map(String::as_str),
        flags.get("end").map(String::as_str),
        today,
    )?;

    Ok(mode)
}

fn run_layout(flags: &HashMap<String, String>) -> Result<()> {
    let index = load_index(flags)?;
    let config = load_config(flags)?;
    let today = Local::now().date_naive();

    let layout = index.layout(view_mode(flags, today)?, &config, today);
    println!("{}", serde_json::to_string_pretty(&layout)?);

    Ok(())
}

fn run_workload(flags: &HashMap<String, String>) -> Result<()> {
    let index = load_index(flags)?;
    let today = Local::now().date_naive();

    // Default window: the current calendar month
    let month_start = today.with_day(1).unwrap_or(today);
    let start = match flags.get("start") {
        Some(s) => parse_date(s).with_context(|| format!("Invalid --start '{}'", s))?,
        None => month_start,
    };
    let end = match flags.get("end") {
        Some(s) => parse_date(s).with_context(|| format!("Invalid --end '{}'", s))?,
        None => today,
    };

    let summary = WorkloadSummary::for_window(&index, start, end);

    if flags.contains_key("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📊 Auditor workload {} → {} ({} days)", summary.window_start, summary.window_end, summary.window_days);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{:<32} {:>7} {:>9} {:>9} {:>6}", "Auditor", "Letters", "Addendums", "Busy days", "Peak");

    for entity in &summary.entities {
        println!(
            "{:<32} {:>7} {:>9} {:>9} {:>6}",
            entity.display_name,
            entity.assignment_count - entity.addendum_count,
            entity.addendum_count,
            entity.busy_days,
            entity.peak_concurrent
        );
    }

    if !index.skipped().is_empty() {
        println!("\n⚠️  {} record(s) skipped (run with AUDITOR_TIMELINE_LOG=debug for details)", index.skipped().len());
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_tui(flags: &HashMap<String, String>) -> Result<()> {
    let index = load_index(flags)?;
    let config = load_config(flags)?;
    let today = Local::now().date_naive();
    let mode = view_mode(flags, today)?;

    let mut app = ui::App::new(index, config, mode, today);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_tui(_flags: &HashMap<String, String>) -> Result<()> {
    bail!("TUI mode not available. Rebuild with: cargo build --features tui")
}
