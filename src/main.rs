mod app;
mod catalog;
mod commands;
mod config;
mod event;
mod projection;
mod store;
mod sync;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, Services};
use catalog::{CatalogClient, RecordDraft};
use config::Config;
use sync::{parse_strength, LoadOutcome, RecordFactory, SyncCoordinator};

#[derive(Parser, Debug)]
#[command(name = "hopdex")]
#[command(about = "A terminal catalog browser for the Punk beer API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/hopdex/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Catalog base url, overriding the config file
  #[arg(short, long, global = true)]
  url: Option<String>,

  #[command(subcommand)]
  command: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
  /// Open the interactive browser (default)
  Browse,
  /// Fetch catalog pages into the local cache
  Fetch {
    /// First page to fetch
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Keep fetching until the catalog is exhausted
    #[arg(short, long)]
    all: bool,
  },
  /// Print cached beers
  List {
    /// Only beers whose name contains this text
    #[arg(short, long)]
    search: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
  },
  /// Add your own beer to the cache
  Add {
    #[arg(short, long)]
    name: String,
    #[arg(short, long, default_value = "")]
    description: String,
    /// Alcohol by volume, e.g. "5.5" or "5,5%"
    #[arg(short, long)]
    strength: String,
  },
  /// Empty the local cache
  Reset,
}

/// `HOPDEX_LOG` wins over `RUST_LOG`
fn log_filter(default: &str) -> EnvFilter {
  EnvFilter::try_from_env("HOPDEX_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new(default))
}

/// The browser owns the terminal, so its logs go to a daily file
fn init_file_tracing() -> Result<WorkerGuard> {
  let dir = Config::data_dir()?.join("logs");
  std::fs::create_dir_all(&dir)?;

  let appender = tracing_appender::rolling::daily(&dir, "hopdex.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .with(log_filter("info"))
    .init();

  Ok(guard)
}

fn init_stderr_tracing() {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(log_filter("warn"))
    .init();
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(url) = args.url {
    config.catalog.url = url;
  }

  let action = args.command.unwrap_or(Action::Browse);

  // Kept alive until exit so buffered log lines are flushed
  let _guard = match action {
    Action::Browse => Some(init_file_tracing()?),
    _ => {
      init_stderr_tracing();
      None
    }
  };
  info!(url = %config.catalog.url, "hopdex starting");

  let services = Services::connect(&config)?;

  match action {
    Action::Browse => {
      let mut app = App::new(config, services);
      app.run().await
    }
    Action::Fetch { page, all } => fetch(&services.sync, page, all).await,
    Action::List { search, json } => list(&services.sync, &config, search.as_deref(), json),
    Action::Add {
      name,
      description,
      strength,
    } => add(&services.factory, name, description, &strength),
    Action::Reset => {
      services.sync.reset()?;
      println!("Local cache cleared");
      Ok(())
    }
  }
}

async fn fetch(sync: &SyncCoordinator<CatalogClient>, first: u32, all: bool) -> Result<()> {
  let mut page = first;
  loop {
    match sync.load_page(page).await? {
      LoadOutcome::Loaded { records, .. } => {
        println!("Page {}: {} beers cached", page, records.len());
      }
      LoadOutcome::Exhausted { .. } => {
        println!("All beers loaded");
        break;
      }
      LoadOutcome::Superseded { .. } => break,
    }

    if !all {
      break;
    }
    page += 1;
  }
  Ok(())
}

fn list(
  sync: &SyncCoordinator<CatalogClient>,
  config: &Config,
  search: Option<&str>,
  json: bool,
) -> Result<()> {
  let records = sync.reload_all()?;
  let query = search.unwrap_or_default();
  let view = projection::project(&records, query, config.search.suggestion_limit);

  if json {
    println!("{}", serde_json::to_string_pretty(&view.visible)?);
    return Ok(());
  }

  if view.visible.is_empty() {
    if query.trim().is_empty() {
      println!("No beers cached yet. Run `hopdex fetch` first.");
    } else {
      println!("No beers match your search.");
    }
    return Ok(());
  }

  for record in &view.visible {
    let marker = if record.is_user_created { "*" } else { " " };
    println!(
      "{:>5}{} {:<36} {:>6}%  {}",
      record.id,
      marker,
      record.name,
      record.strength,
      projection::excerpt(&record.description, 60)
    );
  }
  println!(
    "{} beers, highest id {}",
    view.visible.len(),
    sync.store().get_max_id()?
  );
  Ok(())
}

fn add(factory: &RecordFactory, name: String, description: String, strength: &str) -> Result<()> {
  let strength = parse_strength(strength)?;
  let record = factory.create(RecordDraft::new(name, description, strength))?;
  println!("Added {} (#{})", record.name, record.id);
  Ok(())
}
