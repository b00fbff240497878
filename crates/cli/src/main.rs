//! CLI for the Quorum access approval engine.
//!
//! Pipeline: load catalog -> replay script -> views / event sink.

mod script;

use clap::{Parser, Subcommand};
use quorum_engine::config::DEFAULT_EVENT_CAPACITY;
use quorum_engine::events;
use quorum_engine::sink::json_stream::JsonStreamSink;
use quorum_engine::sink::{EventRow, GrantRow};
use quorum_engine::{EngineConfig, WorkflowFacade};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "quorum", version, about = "Multi-administrator access approval")]
struct Cli {
    /// JSON file listing the resources.
    #[arg(short, long, env = "QUORUM_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Retries of a per-key update lost to a concurrent writer.
    #[arg(
        long,
        env = "QUORUM_MAX_RETRIES",
        default_value_t = quorum_engine::config::DEFAULT_MAX_RETRIES,
        global = true
    )]
    max_retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show every resource as seen by one party.
    Resources {
        #[arg(long = "as")]
        party: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay a script, then show pending requests as seen by one party.
    Pending {
        #[arg(long = "as")]
        party: String,

        #[arg(short, long)]
        script: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay a script of request / approve / grant steps.
    Run {
        #[arg(short, long)]
        script: PathBuf,

        /// Render the final state for this party.
        #[arg(long = "as")]
        party: Option<String>,

        /// Sink output: "ndjson" writes NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long)]
        sink: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog_path = cli
        .catalog
        .ok_or("no catalog given; pass --catalog or set QUORUM_CATALOG")?;
    let catalog = Arc::new(quorum_catalog::load_catalog(&catalog_path).await?);
    let config = EngineConfig::default().with_max_retries(cli.max_retries);

    match cli.command {
        Commands::Resources { party, json } => {
            let facade = WorkflowFacade::new(catalog, config);
            if json {
                let views = facade.resources_for(&party).await?;
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                print!("{}", facade.report_for(&party).await?.render());
            }
        }
        Commands::Pending {
            party,
            script,
            json,
        } => {
            let facade = WorkflowFacade::new(catalog, config);
            let steps = script::load_script(&script).await?;
            script::replay(&facade, &steps).await?;

            if json {
                let views = facade.pending_for(&party).await?;
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                print!("{}", facade.report_for(&party).await?.render());
            }
        }
        Commands::Run {
            script,
            party,
            sink,
        } => {
            let steps = script::load_script(&script).await?;
            // Each step publishes at most one event.
            let config = config.with_event_capacity(steps.len().max(DEFAULT_EVENT_CAPACITY));
            let facade = WorkflowFacade::new(catalog, config);
            let mut rx = facade.subscribe();

            tracing::info!(steps = steps.len(), script = %script.display(), "replaying");
            let outcomes = script::replay(&facade, &steps).await?;
            let accepted = outcomes.iter().filter(|o| o.accepted).count();
            tracing::info!(accepted, rejected = outcomes.len() - accepted, "replay complete");

            let event_rows: Vec<EventRow> = events::drain(&mut rx)
                .iter()
                .map(EventRow::from)
                .collect();
            let grant_rows: Vec<GrantRow> =
                facade.grants().await?.iter().map(GrantRow::from).collect();

            if let Some(ref sink_spec) = sink {
                if sink_spec == "ndjson" {
                    let mut s = JsonStreamSink::stdout();
                    s.write_events(&event_rows)?;
                    s.write_grants(&grant_rows)?;
                    let n = s.finish()?;
                    tracing::info!(rows = n, "ndjson sink: wrote to stdout");
                } else if let Some(path) = sink_spec.strip_prefix("ndjson:") {
                    let file = std::fs::File::create(path)?;
                    let mut s = JsonStreamSink::new(file);
                    s.write_events(&event_rows)?;
                    s.write_grants(&grant_rows)?;
                    let n = s.finish()?;
                    tracing::info!(rows = n, path, "ndjson sink: wrote to file");
                } else {
                    eprintln!("Unknown sink: {}. Use 'ndjson' or 'ndjson:/path'", sink_spec);
                }
            } else {
                let mut out = std::io::stdout().lock();
                for o in &outcomes {
                    let mark = if o.accepted { "ok " } else { "rej" };
                    writeln!(out, "{:>3}  {mark}  {:<8} {}", o.index, o.op, o.detail)?;
                }
            }

            if let Some(party) = party {
                eprint!("{}", facade.report_for(&party).await?.render());
            }
        }
    }

    Ok(())
}
