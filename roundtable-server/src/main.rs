#![allow(
    dead_code,
    unused_imports,
    unused_variables,
    unused_mut,
    clippy::too_many_arguments,
    clippy::needless_borrows_for_generic_args,
    clippy::useless_format,
    clippy::len_zero,
    clippy::map_entry
)]

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use roundtable_core::{
    ensure_config_dir, ensure_data_dir, init_database_with_path, ClaudeConfig, CliErrorDisplay,
    ConversationStore, EngineTurnRunner, OrchestratorConfig, RoundtableConfig, RoundtableError,
    SqliteStore, TurnOrchestrator, UrlExtractor,
};
use roundtable_server::http::{self, AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "roundtable")]
#[command(version = VERSION)]
#[command(about = "Roundtable - group chat with AI coding agents, one per repository")]
#[command(long_about = r#"
Roundtable hosts chat rooms where several AI coding agents answer side by
side, each bound to a local repository checkout. Messages fan out to every
agent in the room (or only to @mentioned ones) and the answers stream back
over the HTTP API as server-sent events.

Use 'roundtable init' to create the database, then 'roundtable serve' to
start the API server.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP API server")]
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    #[command(about = "Initialize the database and config directories")]
    Init {
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<RoundtableError>() {
                Some(err) => eprintln!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(err)),
                None => eprintln!("{}: {}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await,
        Commands::Init { force } => cmd_init(force).await,
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = RoundtableConfig::load()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    println!("{}", "Starting Roundtable server...".cyan().bold());
    println!("  {} Database: {}", "→".blue(), config.database_path());
    println!("  {} Log level: {}", "→".blue(), config.log_level());

    let db = init_database_with_path(&config.database_path())
        .await
        .map_err(RoundtableError::from)?;
    db.health_check().await.map_err(RoundtableError::from)?;

    let store: Arc<dyn ConversationStore> = Arc::new(SqliteStore::from_database(&db));

    let claude = ClaudeConfig {
        binary: config.agents.claude.binary.clone(),
        model: config.agents.claude.model.clone(),
        max_turns: config.agents.claude.max_turns,
        ..ClaudeConfig::default()
    };
    let runner = Arc::new(EngineTurnRunner::new(claude));
    let orchestrator = Arc::new(TurnOrchestrator::with_config(
        store.clone(),
        runner,
        OrchestratorConfig {
            history_limit: config.agents.history_limit,
            turn_timeout: config.turn_timeout(),
        },
    ));

    let state = AppState {
        db: Arc::new(db),
        store,
        orchestrator,
        url_extractor: Arc::new(UrlExtractor::new()?),
    };

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "{} {}",
        "✓".green().bold(),
        format!("Listening on http://{}", addr).green()
    );
    info!(addr = %addr, "Roundtable server started");

    axum::serve(listener, http::router(state)).await?;

    Ok(())
}

async fn cmd_init(force: bool) -> anyhow::Result<()> {
    println!("{}", "Initializing Roundtable...".cyan().bold());
    println!();

    let config_dir = ensure_config_dir().map_err(RoundtableError::from)?;
    println!(
        "  {} Config directory: {}",
        "→".blue(),
        config_dir.display()
    );

    let data_dir = ensure_data_dir().map_err(RoundtableError::from)?;
    println!("  {} Data directory: {}", "→".blue(), data_dir.display());

    let config = RoundtableConfig::load()?;
    config.validate()?;
    println!("  {} Database path: {}", "→".blue(), config.database_path());

    println!("  {} Running migrations...", "→".blue());
    if force {
        println!("    {} Force mode enabled", "!".yellow());
    }

    let db = init_database_with_path(&config.database_path())
        .await
        .map_err(RoundtableError::from)?;

    println!("  {} Verifying connection...", "→".blue());
    db.health_check().await.map_err(RoundtableError::from)?;

    db.close().await;

    println!();
    println!(
        "{} {}",
        "✓".green().bold(),
        "Database initialized successfully!".green()
    );

    Ok(())
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Roundtable Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Engines:".bold());
        println!("    Claude Code  (implemented)");
        println!("    Codex        (planned)");
        println!("    Gemini       (planned)");
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("roundtable {}", VERSION);
    }

    Ok(())
}
