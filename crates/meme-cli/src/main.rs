//! `meme`: command-line front end for the meme calendar.
//!
//! Reads `meme.toml` (or the path given with `--config`) layered with
//! `MEME_*` environment variables, opens the SQLite calendar, and runs one
//! subcommand.
//!
//! # Usage
//!
//! ```text
//! meme seed
//! meme list --limit 20
//! meme range 2021-02-01 2021-02-28
//! meme search ai --category 动画 --min-heat 80
//! meme add '{"title": "X", "date": "2021-02-15", "heat_score": 90}'
//! meme update event_20251025001 '{"heat_score": 60}'
//! ```

mod seed;

use std::{
  io::Read as _,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use meme_core::{
  event::{EventPatch, EventRecord, NewEvent},
  query::{EventFilter, SortKey, SortOrder},
  store::EventStore,
};
use meme_store_sqlite::{Calendar, CalendarConfig, DEFAULT_TREND_DAYS};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "meme", author, version, about = "Meme calendar")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "meme.toml")]
  config: PathBuf,

  /// Print JSON instead of one line per record.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Newest events first.
  List {
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Events dated within an inclusive range.
  Range { start: NaiveDate, end: NaiveDate },
  /// Search events; every given criterion must hold.
  Search {
    /// Substring of the title or description, any case.
    keyword:    Option<String>,
    #[arg(long)]
    category:   Option<String>,
    #[arg(long = "type")]
    event_type: Option<String>,
    #[arg(long)]
    from:       Option<NaiveDate>,
    #[arg(long)]
    to:         Option<NaiveDate>,
    #[arg(long)]
    min_heat:   Option<i32>,
    #[arg(long)]
    max_heat:   Option<i32>,
    /// Also match the keyword against each event's keyword list.
    #[arg(long)]
    tags:       bool,
    /// Order by heat score instead of date.
    #[arg(long)]
    by_heat:    bool,
    #[arg(long)]
    ascending:  bool,
    #[arg(short, long)]
    limit:      Option<usize>,
  },
  /// One event with its literature.
  Show { id: String },
  /// Add an event from a JSON object (`-` reads stdin).
  Add { input: String },
  /// Patch an event from a JSON object (`-` reads stdin). Unknown keys are
  /// ignored.
  Update { id: String, input: String },
  Delete { id: String },
  /// Attach literature read from a file (`-` reads stdin).
  Literature { id: String, file: PathBuf },
  /// Database status and event count.
  Health,
  /// Add any missing event columns and print the outcome.
  Migrate,
  /// Keyword frequency and heat over recent days.
  Trends {
    #[arg(long, default_value_t = DEFAULT_TREND_DAYS)]
    days: u32,
  },
  /// All figures, most influential first.
  Figures,
  /// A figure with its artifacts, timeline and linked events.
  Figure { id: String },
  /// Load the sample data set.
  Seed,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("MEME"))
    .build()
    .context("failed to read config file")?;
  let mut calendar_cfg: CalendarConfig = settings
    .try_deserialize()
    .context("failed to deserialise calendar config")?;
  calendar_cfg.store_path = expand_tilde(&calendar_cfg.store_path);
  calendar_cfg.literature_dir = expand_tilde(&calendar_cfg.literature_dir);

  let mut cal = Calendar::open(&calendar_cfg);
  run(&mut cal, cli.command, cli.json, calendar_cfg.default_limit)
}

fn run(cal: &mut Calendar, command: Command, json: bool, default_limit: usize) -> Result<()> {
  match command {
    Command::List { limit } => {
      print_records(&cal.get_all_events(limit.unwrap_or(default_limit)), json)
    }
    Command::Range { start, end } => {
      print_records(&cal.get_events_by_date_range(start, end), json)
    }
    Command::Search {
      keyword,
      category,
      event_type,
      from,
      to,
      min_heat,
      max_heat,
      tags,
      by_heat,
      ascending,
      limit,
    } => {
      let filter = EventFilter {
        keyword_in_tags: tags && keyword.is_some(),
        keyword: keyword.filter(|k| !k.trim().is_empty()),
        category: category.filter(|c| !c.trim().is_empty()),
        event_type: event_type.filter(|t| !t.trim().is_empty()),
        start_date: from,
        end_date: to,
        min_heat,
        max_heat,
        order: SortOrder {
          key:        if by_heat { SortKey::Heat } else { SortKey::Date },
          descending: !ascending,
        },
        limit: Some(limit.unwrap_or(default_limit)),
      };
      print_records(&cal.search(&filter), json)
    }
    Command::Show { id } => {
      let (event, literature) = cal.get_event_with_literature(&id);
      let Some(event) = event else {
        bail!("no event with id {id}");
      };
      if json {
        print_json(&serde_json::json!({ "event": event, "literature": literature }))
      } else {
        println!("{}", serde_json::to_string_pretty(&event)?);
        if let Some(text) = literature {
          println!("\n{text}");
        }
        Ok(())
      }
    }
    Command::Add { input } => {
      let new: NewEvent =
        serde_json::from_str(&read_input(&input)?).context("event input is not valid JSON")?;
      let event = cal.add_event(new).context("event not added")?;
      if json {
        print_json(&event)
      } else {
        println!("added {}", event.id);
        Ok(())
      }
    }
    Command::Update { id, input } => {
      let value = serde_json::from_str(&read_input(&input)?).context("patch is not valid JSON")?;
      let patch = EventPatch::from_json(value).context("patch has invalid field values")?;
      if patch.is_empty() {
        bail!("patch names no known field");
      }
      if !cal.update_event(&id, patch) {
        bail!("event {id} not updated");
      }
      println!("updated {id}");
      Ok(())
    }
    Command::Delete { id } => {
      if !cal.delete_event(&id) {
        bail!("event {id} not deleted");
      }
      println!("deleted {id}");
      Ok(())
    }
    Command::Literature { id, file } => {
      let text = if file.as_os_str() == "-" {
        read_input("-")?
      } else {
        std::fs::read_to_string(&file)
          .with_context(|| format!("failed to read {}", file.display()))?
      };
      if !cal.save_literature(&id, &text) {
        bail!("literature for {id} not saved");
      }
      println!("saved literature for {id}");
      Ok(())
    }
    Command::Health => {
      let health = cal.check_database_health();
      if json {
        print_json(&health)?;
      } else {
        println!("{}", health.message);
      }
      if !health.ok {
        bail!("database unhealthy");
      }
      Ok(())
    }
    Command::Migrate => {
      let report = cal.reconcile().context("schema reconciliation failed")?;
      if json {
        print_json(&report)?;
      } else {
        for column in &report.added {
          println!("added column {column}");
        }
        for (column, error) in &report.failed {
          println!("failed to add {column}: {error}");
        }
        println!("schema version {}", report.version);
      }
      if !report.is_complete() {
        bail!("{} column(s) could not be added", report.failed.len());
      }
      Ok(())
    }
    Command::Trends { days } => {
      let keywords = cal.daily_keyword_trends(days);
      let end = meme_core::validate::today();
      let start = end
        .checked_sub_days(chrono::Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);
      let heat = cal.heat_trend(start, end);
      if json {
        print_json(&serde_json::json!({ "keywords": keywords, "heat": heat }))
      } else {
        for k in &keywords {
          println!("{:>4}  {}", k.count, k.keyword);
        }
        for p in &heat {
          println!("{}  {:>3}  {}", p.date, p.heat_score, p.title);
        }
        Ok(())
      }
    }
    Command::Figures => {
      let figures = cal.list_figures();
      if json {
        print_json(&figures)
      } else {
        for f in &figures {
          println!("{}  {:>3}  {}", f.id, f.influence_score, f.name);
        }
        Ok(())
      }
    }
    Command::Figure { id } => {
      let Some(profile) = cal.get_figure_profile(&id) else {
        bail!("no figure with id {id}");
      };
      let events = cal.events_for_figure(&id);
      print_json(&serde_json::json!({ "profile": profile, "events": events }))
    }
    Command::Seed => {
      let summary = seed::seed(cal)?;
      if json {
        print_json(&summary)
      } else {
        println!(
          "seeded {} figures, {} events, {} artifacts, {} timeline entries, {} historical events",
          summary.figures, summary.events, summary.artifacts, summary.timeline, summary.historical
        );
        Ok(())
      }
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_json(value: &impl Serialize) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn print_records(records: &[EventRecord], json: bool) -> Result<()> {
  if json {
    return print_json(&records);
  }
  for r in records {
    let marker = if r.is_degraded() { "  (degraded)" } else { "" };
    println!("{}  {}  {:>3}  {}{marker}", r.date(), r.id(), r.heat_score(), r.title());
  }
  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The argument itself, or all of stdin when it is `-`.
fn read_input(arg: &str) -> Result<String> {
  if arg != "-" {
    return Ok(arg.to_owned());
  }
  let mut buf = String::new();
  std::io::stdin()
    .read_to_string(&mut buf)
    .context("failed to read stdin")?;
  Ok(buf)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_parses_search_flags() {
    let cli = Cli::try_parse_from([
      "meme", "--json", "search", "ai", "--category", "anime", "--min-heat", "80", "--by-heat",
    ])
    .unwrap();
    assert!(cli.json);
    let Command::Search { keyword, category, min_heat, by_heat, .. } = cli.command else {
      panic!("expected search");
    };
    assert_eq!(keyword.as_deref(), Some("ai"));
    assert_eq!(category.as_deref(), Some("anime"));
    assert_eq!(min_heat, Some(80));
    assert!(by_heat);
  }

  #[test]
  fn cli_parses_dates() {
    let cli = Cli::try_parse_from(["meme", "range", "2021-02-01", "2021-02-28"]).unwrap();
    let Command::Range { start, end } = cli.command else {
      panic!("expected range");
    };
    assert_eq!(start, NaiveDate::from_ymd_opt(2021, 2, 1).unwrap());
    assert_eq!(end, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
    assert!(Cli::try_parse_from(["meme", "range", "Feb", "2021-02-28"]).is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/meme.db")), PathBuf::from(home).join("meme.db"));
    assert_eq!(expand_tilde(Path::new("/abs/meme.db")), PathBuf::from("/abs/meme.db"));
  }

  #[test]
  fn commands_run_against_a_seeded_calendar() {
    let dir = tempfile::tempdir().unwrap();
    let config = CalendarConfig::at(dir.path().join("meme.db"), dir.path().join("literature"));
    let mut cal = Calendar::open(&config);

    run(&mut cal, Command::Seed, false, 100).unwrap();
    run(&mut cal, Command::List { limit: None }, true, 100).unwrap();
    run(&mut cal, Command::Health, false, 100).unwrap();
    run(&mut cal, Command::Migrate, false, 100).unwrap();
    assert!(run(&mut cal, Command::Show { id: "missing".into() }, false, 100).is_err());
    assert!(run(&mut cal, Command::Delete { id: "missing".into() }, false, 100).is_err());

    let add = Command::Add { input: r#"{"id": "e1", "title": "X", "date": "2021-02-15"}"#.into() };
    run(&mut cal, add, false, 100).unwrap();
    let update = Command::Update { id: "e1".into(), input: r#"{"bogus": 1}"#.into() };
    assert!(run(&mut cal, update, false, 100).is_err());
  }
}
