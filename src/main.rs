use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_selector::api::{self, AppState, SecurityConfig};
use feature_selector::client::BackendClient;
use feature_selector::config::Config;
use feature_selector::core::{
    render_tree, translate_constraints, FeatureTree, IngestResponse, Selection, SelectionPolicy,
    Session, SessionEvent,
};
use feature_selector::sessions::SessionStore;

#[derive(Parser)]
#[command(name = "fsel")]
#[command(about = "Configure feature models and validate selections")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print a tree from an ingestion response file
    Render {
        /// JSON file with `treeData` and `constraints`
        tree: PathBuf,
    },
    /// Send a local feature-model document to the ingestion backend
    Ingest {
        /// Document to forward verbatim
        document: PathBuf,
    },
    /// Apply recorded events to a tree and print the resulting payload
    Replay {
        /// JSON file with `treeData` and `constraints`
        tree: PathBuf,
        /// JSON array of session events
        events: PathBuf,
        /// Enforce XOR exclusivity (overrides config)
        #[arg(long)]
        xor: bool,
        /// Send the result to the validator
        #[arg(long)]
        validate: bool,
    },
}

/// Initialize tracing with output to stderr (one-shot commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(
        |_| "feature_selector=debug,selector_core=debug,tower_http=debug".into(),
    ));

    if use_stderr {
        // One-shot commands print results on stdout
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn read_ingest_response(path: &Path) -> anyhow::Result<IngestResponse> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn serve(config: &Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting feature selector on port {}", port);

    let sessions = SessionStore::new(SelectionPolicy::with_xor(config.enforce_xor));
    let backend = BackendClient::from_config(config);
    tracing::info!("Using backend at {}", backend.base_url());

    let app = api::create_router(
        AppState::new(sessions, backend),
        SecurityConfig::from_config(config),
    );

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Feature selector listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            serve(&config, port.unwrap_or(config.port)).await?;
        }
        Some(Commands::Render { tree }) => {
            let response = read_ingest_response(&tree)?;
            let tree = FeatureTree::from_ingest(&response)?;
            print!("{}", render_tree(&tree, &Selection::new(), &Default::default(), true));
        }
        Some(Commands::Ingest { document }) => {
            let content = std::fs::read_to_string(&document)
                .with_context(|| format!("Failed to read {}", document.display()))?;
            let (tree, response) = BackendClient::from_config(&config)
                .ingest_tree(content)
                .await?;
            print!("{}", render_tree(&tree, &Selection::new(), &Default::default(), true));
            if !response.constraints.is_empty() {
                println!("\nConstraints:");
                for constraint in &response.constraints {
                    println!("  {}", constraint);
                }
            }
            let logic = translate_constraints(&response.constraints);
            if !logic.is_empty() {
                println!("\nLogic:");
                for formula in &logic {
                    println!("  {}", formula);
                }
            }
        }
        Some(Commands::Replay {
            tree,
            events,
            xor,
            validate,
        }) => {
            let response = read_ingest_response(&tree)?;
            let content = std::fs::read_to_string(&events)
                .with_context(|| format!("Failed to read {}", events.display()))?;
            let events: Vec<SessionEvent> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", events.display()))?;

            let mut session = Session::new(SelectionPolicy::with_xor(xor || config.enforce_xor));
            session.load(&response)?;
            session.replay(&events);

            let payload = session
                .payload()
                .context("No feature model loaded")?;
            let selected: Vec<&str> = session.selection().iter().collect();
            println!("Selected: {}", selected.join(", "));
            println!("{}", serde_json::to_string_pretty(&payload)?);

            if validate {
                let request = payload.request;
                let verdict = BackendClient::from_config(&config)
                    .validate(&request)
                    .await?;
                if verdict.is_valid {
                    println!("Configuration is valid!");
                } else {
                    println!(
                        "Invalid configuration: {}",
                        verdict.error.as_deref().unwrap_or("no reason given")
                    );
                }
            }
        }
        None => {
            serve(&config, config.port).await?;
        }
    }

    Ok(())
}
