//! AgentSim CLI

use agentsim_core::{
    AgentKind, AgentSimConfig, ChatManager, HttpPricingService, InMemoryCatalogCache,
    MessageStatus, SimulationCore, TickReport,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Initialize logging with the specified verbosity level
fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("agentsim={}", level).parse()?)
        .add_directive(format!("agentsim_core={}", level).parse()?)
        .add_directive(format!("agentsim_web={}", level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2) // Show module path at debug+
        .with_file(verbose >= 3) // Show file:line at trace
        .with_line_number(verbose >= 3);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "agentsim")]
#[command(about = "Simulated agent activity with monitoring and chat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults apply when it does not exist)
    #[arg(
        long,
        env = "AGENTSIM_CONFIG",
        default_value = "~/.agentsim/config.toml",
        global = true
    )]
    config: String,

    /// Seed for reproducible runs
    #[arg(long, env = "AGENTSIM_SEED", global = true)]
    seed: Option<u64>,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output logs as JSON (for machine parsing)
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and WebSocket stream
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "AGENTSIM_PORT", default_value = "8080")]
        port: u16,

        /// Do not start the tick driver automatically
        #[arg(long)]
        paused: bool,
    },
    /// Run ticks back to back and print what happened
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "10")]
        ticks: u64,

        /// Print each tick report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Talk to one of the agents
    Chat {
        /// Agent name, e.g. PricingAgent
        #[arg(short, long)]
        agent: String,

        /// Messages to send in order; reads lines from stdin when empty
        messages: Vec<String>,
    },
    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the agent catalog
    Agents,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration to the config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check the configuration file for errors
    Validate,
}

fn config_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).to_string())
}

fn load_config(path: &Path, seed: Option<u64>) -> Result<AgentSimConfig> {
    let mut config = if path.exists() {
        AgentSimConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        AgentSimConfig::default()
    };

    if seed.is_some() {
        config.simulation.seed = seed;
    }
    Ok(config)
}

fn chat_manager(config: &AgentSimConfig) -> Result<ChatManager> {
    let pricing = HttpPricingService::new(&config.pricing)?;
    Ok(ChatManager::new(
        config.chat.clone(),
        Arc::new(pricing),
        Arc::new(InMemoryCatalogCache::new()),
    )
    .with_seed(config.simulation.seed))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with CLI options
    init_logging(cli.verbose, cli.quiet, cli.log_json)?;

    let path = config_path(&cli.config);

    match cli.command {
        Commands::Serve { port, paused } => {
            let config = load_config(&path, cli.seed)?;
            serve(config, port, paused).await?;
        }

        Commands::Simulate { ticks, json } => {
            let config = load_config(&path, cli.seed)?;
            simulate(config, ticks, json).await?;
        }

        Commands::Chat { agent, messages } => {
            let config = load_config(&path, cli.seed)?;
            chat(config, &agent, messages).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(&path, cli.seed)?;
                print!("{}", config.to_toml_string()?);
            }
            ConfigAction::Init { force } => {
                if path.exists() && !force {
                    bail!(
                        "Config file {} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, AgentSimConfig::default().to_toml_string()?)?;
                println!("Wrote default configuration to {}", path.display());
            }
            ConfigAction::Validate => {
                if !path.exists() {
                    bail!("Config file {} not found", path.display());
                }
                AgentSimConfig::from_file(&path)
                    .with_context(|| format!("Invalid config {}", path.display()))?;
                println!("Configuration OK: {}", path.display());
            }
        },

        Commands::Agents => {
            println!("{:<24} DESCRIPTION", "AGENT");
            println!("{}", "-".repeat(72));
            for kind in AgentKind::ALL {
                println!("{:<24} {}", kind.as_str(), kind.description());
            }
        }
    }

    Ok(())
}

async fn serve(config: AgentSimConfig, port: u16, paused: bool) -> Result<()> {
    use agentsim_web::{create_router, AppState};

    let core = Arc::new(SimulationCore::new(config.simulation.clone())?);
    let chats = Arc::new(chat_manager(&config)?);

    if !paused {
        core.start();
    }

    let state = Arc::new(AppState::new(core.clone(), chats));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    println!("Starting web server on http://localhost:{}", port);
    info!(port, driver_running = core.is_running(), "Web server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    core.stop().await;
    Ok(())
}

async fn simulate(config: AgentSimConfig, ticks: u64, json: bool) -> Result<()> {
    let core = SimulationCore::new(config.simulation)?;

    for _ in 0..ticks {
        let report = core.tick_now().await;
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_report(&report);
        }
    }

    if !json {
        let summary = core.summary().await;
        println!();
        println!("Ticks:            {}", summary.tick_count);
        println!("Executions:       {}", summary.executions_started);
        println!(
            "  running/completed/stopped: {}/{}/{}",
            summary.running, summary.completed, summary.stopped
        );
        println!("Data operations:  {}", summary.data_operations_recorded);
        println!("Alerts raised:    {}", summary.alerts_raised);

        for alert in core.alerts(Some(5)).await {
            println!(
                "  [{}] {} - {}",
                alert.severity.as_str(),
                alert.agent_name,
                alert.reason
            );
        }
    }

    Ok(())
}

fn print_report(report: &TickReport) {
    println!(
        "tick {:>4}  running {}  +{} spawned  {} completed  {} stopped  {} data ops",
        report.tick,
        report.running,
        report.spawned.len(),
        report.completed.len(),
        report.stopped.len(),
        report.data_operations
    );
}

async fn chat(config: AgentSimConfig, agent: &str, messages: Vec<String>) -> Result<()> {
    let manager = chat_manager(&config)?;
    let session = manager.open(agent).await?;

    if let Some(welcome) = session.last_message() {
        println!("{}: {}", session.agent_name, welcome.content);
    }

    let messages = if messages.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?
    } else {
        messages
    };

    for text in messages.iter().filter(|m| !m.trim().is_empty()) {
        println!("you: {}", text);
        let reply = manager.send_and_wait(session.id, text).await?;
        if reply.status == MessageStatus::Degraded {
            warn!(agent = %session.agent_name, "Reply used the fallback path");
        }
        println!("{}: {}", session.agent_name, reply.content);
    }

    manager.close(session.id).await?;
    Ok(())
}
