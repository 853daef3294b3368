//! Health Events CLI Application
//!
//! Command-line front end for the health-events library. It adds:
//! - A JSON-file-backed document store so events persist between runs
//! - Vital-readings ingestion (evaluate a readings file, create an alert
//!   when abnormal)
//! - Per-subject and per-family event listings
//! - Acknowledge/resolve/escalate transitions from the terminal

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod config;
mod store;

use health_events::{
    evaluate_readings, EventSource, EventStatus, HealthEvent, HealthEventService, VitalReadings,
};
use store::JsonFileStore;

/// Health Events - track and triage family health alerts
#[derive(Parser, Debug)]
#[command(name = "health-events-cli")]
#[command(about = "Ingest vital readings and manage the resulting health events", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the JSON event store (overrides the config file)
    #[arg(short, long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a readings file and create an event when abnormal
    Ingest {
        /// Subject the readings belong to
        #[arg(long)]
        user: String,

        /// JSON file with vital readings
        #[arg(long, value_name = "FILE")]
        readings: PathBuf,

        /// Provenance tag: wearable, manual, clinic or system
        #[arg(long, default_value = "wearable")]
        source: String,
    },

    /// List events for one subject, most recent first
    List {
        #[arg(long)]
        user: String,

        /// Only events that still need attention
        #[arg(long)]
        active: bool,

        /// Only events in this status: open, acked, escalated or resolved
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// List merged events across several subjects
    Family {
        /// Comma-separated subject ids
        #[arg(long, value_delimiter = ',', required = true)]
        users: Vec<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Acknowledge an event
    Ack {
        id: String,

        /// Who is acknowledging
        #[arg(long)]
        actor: String,
    },

    /// Resolve an event
    Resolve {
        id: String,

        /// Who is resolving
        #[arg(long)]
        actor: String,
    },

    /// Escalate an event
    Escalate {
        id: String,

        /// Who is escalating
        #[arg(long)]
        actor: String,

        /// Why the escalation happened
        #[arg(long)]
        reason: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Health Events CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using library v{}", health_events::VERSION);

    // Resolve configuration, then open the store
    let app_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::AppConfig::default(),
    };
    let store_path = args
        .store
        .clone()
        .unwrap_or_else(|| app_config.store.path.clone());
    let store = JsonFileStore::open(&store_path)
        .await
        .with_context(|| format!("Failed to open event store: {:?}", store_path))?;
    let service = HealthEventService::with_config(store, app_config.service.unwrap_or_default());

    match args.command {
        Command::Ingest {
            user,
            readings,
            source,
        } => ingest(&service, &user, &readings, &source).await,
        Command::List {
            user,
            active,
            status,
            limit,
        } => list(&service, &user, active, status.as_deref(), limit).await,
        Command::Family { users, limit } => {
            let events = service.events_for_subjects(&users, limit).await;
            print_events(&events);
            Ok(())
        }
        Command::Ack { id, actor } => {
            service.acknowledge(&id, &actor).await?;
            println!("Event {} acknowledged by {}", id, actor);
            Ok(())
        }
        Command::Resolve { id, actor } => {
            service.resolve(&id, &actor).await?;
            println!("Event {} resolved by {}", id, actor);
            Ok(())
        }
        Command::Escalate { id, actor, reason } => {
            service.escalate(&id, &actor, reason.as_deref()).await?;
            println!("Event {} escalated by {}", id, actor);
            Ok(())
        }
    }
}

/// Evaluate one readings file and persist an event when abnormal
async fn ingest(
    service: &HealthEventService<JsonFileStore>,
    user: &str,
    readings_path: &Path,
    source: &str,
) -> Result<()> {
    let source: EventSource = source.parse().map_err(|message: String| anyhow!(message))?;
    let contents = std::fs::read_to_string(readings_path)
        .with_context(|| format!("Failed to read readings file: {:?}", readings_path))?;
    let readings: VitalReadings = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse readings file: {:?}", readings_path))?;

    let evaluation = evaluate_readings(&readings);
    if evaluation.is_normal() {
        println!("All readings in range for {} - no event created", user);
        return Ok(());
    }

    for reason in &evaluation.reasons {
        println!("  ! {}", reason);
    }

    match service
        .create_from_vital_evaluation(user, &evaluation, readings, source)
        .await?
    {
        Some(id) => println!("Created vital alert {} for {}", id, user),
        None => println!("No event created"),
    }
    Ok(())
}

/// List events for one subject with the requested filter
async fn list(
    service: &HealthEventService<JsonFileStore>,
    user: &str,
    active: bool,
    status: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    if active && status.is_some() {
        bail!("--active and --status are mutually exclusive");
    }

    let events = if active {
        service.active_events_for_subject(user).await
    } else if let Some(status) = status {
        let status: EventStatus = status.parse().map_err(|message: String| anyhow!(message))?;
        service.events_by_status(user, status).await
    } else {
        service.events_for_subject(user, limit).await
    };

    print_events(&events);
    Ok(())
}

/// Print an event table, most recent first
fn print_events(events: &[HealthEvent]) {
    if events.is_empty() {
        println!("No events found");
        return;
    }

    println!(
        "{:<36}  {:<20}  {:<9}  {:<8}  {}",
        "ID", "CREATED", "STATUS", "SEVERITY", "REASONS"
    );
    for event in events {
        println!(
            "{:<36}  {:<20}  {:<9}  {:<8}  {}",
            event.id,
            event.created_at.format("%Y-%m-%d %H:%M:%S"),
            event.status,
            event.severity,
            event.reasons.join("; ")
        );
    }
    println!("\n{} event(s)", events.len());
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
