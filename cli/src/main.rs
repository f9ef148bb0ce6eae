//! Nettopo CLI — operator surface for the topology snapshot engine
//!
//! Lists capturable snapshots, loads them into an in-process store, and
//! answers natural-language questions against the loaded topology.

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use nettopo::catalog::AskResponse;
use nettopo::{
    AppConfig, IntentClassifier, LlmClassifier, MemoryGraph, QueryCatalog, SnapshotRegistry,
    SnapshotSelector, StaticClassifier,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nettopo", version, about = "Network topology snapshot CLI")]
struct Cli {
    /// Configuration file (device inventory, snapshots dir, classifier)
    #[arg(long, default_value = "nettopo.yaml", global = true, env = "NETTOPO_CONFIG")]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List capturable snapshot files
    Snapshots,
    /// Load a snapshot and ask one question against it
    Ask {
        /// The natural-language question
        question: String,

        /// 1-based snapshot index to load (newest first)
        #[arg(long, default_value_t = 1)]
        snapshot: usize,
    },
    /// Start an interactive shell
    Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(&config.snapshots_dir);
    let catalog = QueryCatalog::new(build_classifier(&config)?);

    match cli.command {
        Commands::Snapshots => run_snapshots(&registry, &cli.format),
        Commands::Ask { question, snapshot } => {
            registry.load(&mut store, &SnapshotSelector::Index(snapshot), true)?;
            let response = catalog
                .ask(&store, &question, registry.get_active())
                .await;
            print_response(&response, &cli.format)?;
            Ok(())
        }
        Commands::Shell => run_shell(&mut store, &mut registry, &catalog, &cli.format).await,
    }
}

fn build_classifier(config: &AppConfig) -> anyhow::Result<Box<dyn IntentClassifier>> {
    match &config.classifier {
        Some(classifier) => {
            let mut classifier = classifier.clone();
            if classifier.device_names.is_empty() {
                classifier.device_names = config.device_names();
            }
            Ok(Box::new(LlmClassifier::new(&classifier)?))
        }
        // No LLM configured: fall back to keyword matching over the catalog.
        None => Ok(Box::new(StaticClassifier::new(config.device_names()))),
    }
}

fn run_snapshots(registry: &SnapshotRegistry, format: &OutputFormat) -> anyhow::Result<()> {
    let snapshots = registry.list_capturable()?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = snapshots
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "index": s.index,
                        "snapshot_id": s.snapshot_id,
                        "timestamp": s.timestamp,
                        "devices": s.devices,
                        "size_kb": s.size_kb,
                        "filename": s.filename,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            if snapshots.is_empty() {
                println!("No snapshots found in {}", registry.snapshots_dir().display());
                return Ok(());
            }
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(["#", "Timestamp", "Devices", "Size", "Filename"]);
            for s in &snapshots {
                table.add_row([
                    s.index.to_string(),
                    s.timestamp.clone().unwrap_or_else(|| "unknown".to_string()),
                    s.devices.to_string(),
                    format!("{:.1} KB", s.size_kb),
                    s.filename.clone(),
                ]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

fn run_loaded(
    store: &MemoryGraph,
    registry: &SnapshotRegistry,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let loaded = registry.list_loaded(store);

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = loaded
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "snapshot_id": s.snapshot_id,
                        "device_count": s.device_count,
                        "is_active": s.is_active,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            if loaded.is_empty() {
                println!("No snapshots loaded");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(["Snapshot ID", "Devices", "Active"]);
            for s in &loaded {
                table.add_row([
                    s.snapshot_id.clone(),
                    s.device_count.to_string(),
                    if s.is_active { "*".to_string() } else { String::new() },
                ]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

fn print_response(response: &AskResponse, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Table => {
            if let Some(clarification) = &response.clarification {
                println!("{}", clarification);
                return Ok(());
            }
            if let Some(error) = &response.error {
                println!("Query failed: {}", error);
                return Ok(());
            }
            if let Some(template) = &response.template {
                println!("Template: {}", template);
            }
            if response.results.is_empty() {
                println!("(no results)");
                return Ok(());
            }

            let columns: Vec<String> = match response.results.first() {
                Some(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
                _ => Vec::new(),
            };
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(&columns);
            for row in &response.results {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| format_value(row.get(c).unwrap_or(&serde_json::Value::Null)))
                    .collect();
                table.add_row(cells);
            }
            println!("{}", table);
            println!("{} row(s)", response.count);
        }
    }
    Ok(())
}

fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(items) if items.iter().all(|v| v.is_string()) => {
            // Path summaries read better as a chain.
            items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

async fn run_shell(
    store: &mut MemoryGraph,
    registry: &mut SnapshotRegistry,
    catalog: &QueryCatalog<Box<dyn IntentClassifier>>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    println!("Nettopo Interactive Shell");
    println!("Ask questions in plain language, or :help for commands. :quit to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        eprint!("nettopo> ");

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (command, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (trimmed, ""),
        };

        let outcome = match command {
            ":quit" | ":exit" | ":q" => break,
            ":help" | ":h" => {
                println!("Commands:");
                println!("  :snapshots       — List capturable snapshot files");
                println!("  :loaded          — List snapshots in the store");
                println!("  :load <index>    — Load a snapshot and make it active");
                println!("  :activate <id>   — Focus queries on a loaded snapshot");
                println!("  :delete <id>     — Remove one snapshot from the store");
                println!("  :active          — Show the active snapshot");
                println!("  :quit            — Exit shell");
                println!("  <question>       — Ask about the topology");
                Ok(())
            }
            ":snapshots" => run_snapshots(registry, format),
            ":loaded" => run_loaded(store, registry, format),
            ":load" => match arg.parse::<usize>() {
                Ok(index) => registry
                    .load(store, &SnapshotSelector::Index(index), true)
                    .map(|outcome| {
                        if outcome.already_loaded {
                            println!("{} already loaded, now active", outcome.snapshot_id);
                        } else if let Some(summary) = outcome.summary {
                            println!(
                                "{} loaded: {} devices, {} interfaces, {} cdp links, {} ospf links",
                                outcome.snapshot_id,
                                summary.devices,
                                summary.interfaces,
                                summary.cdp_links,
                                summary.ospf_links
                            );
                        }
                    })
                    .map_err(Into::into),
                Err(_) => {
                    println!("usage: :load <index>");
                    Ok(())
                }
            },
            ":activate" => registry
                .set_active(store, arg)
                .map(|_| println!("active snapshot: {}", arg))
                .map_err(Into::into),
            ":delete" => registry
                .delete(store, arg)
                .map(|deleted| {
                    if deleted {
                        println!("{} deleted", arg);
                    } else {
                        println!("{} is not loaded", arg);
                    }
                })
                .map_err(Into::into),
            ":active" => {
                match registry.get_active() {
                    Some(id) => println!("{}", id),
                    None => println!("no active snapshot"),
                }
                Ok(())
            }
            _ => {
                let response = catalog.ask(store, trimmed, registry.get_active()).await;
                print_response(&response, format)
            }
        };

        if let Err(e) = outcome {
            eprintln!("Error: {:#}", e);
        }
    }

    println!("Bye!");
    Ok(())
}
