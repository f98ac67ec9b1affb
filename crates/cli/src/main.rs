use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use sableye_agent::{AgentEvent, Session};
use sableye_core::logging::sanitize_path;
use sableye_core::{Config, LoggingConfig, init_logging};
use sableye_skills::RegistryBuild;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

mod repl;

use repl::{HELP, Input, ReplCommand, recent_query};

/// Sableye - chat with your notes
#[derive(Parser, Debug)]
#[command(name = "sableye")]
#[command(about = "A personal knowledge assistant for a markdown vault", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to config.toml (default: ./config.local.toml, then ./config.toml)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Verbose output: debug logging and tool activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat (default)
    Chat {
        /// Index notes from the last N days (default: vault.load_days)
        #[arg(short, long, value_name = "DAYS")]
        days: Option<u32>,
    },
    /// Ask a single question and exit
    Ask {
        /// The question
        #[arg(required = true, value_name = "QUERY")]
        query: String,

        /// Index notes from the last N days (default: vault.load_days)
        #[arg(short, long, value_name = "DAYS")]
        days: Option<u32>,
    },
    /// Check the configuration and print a summary
    Validate,
    /// List loaded skills and load failures
    Skills,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat { days: None });

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "sableye", &mut io::stdout());
        return Ok(());
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let (config, config_path) = load_config(cli.config.as_deref(), &cwd)?;
    let verbose = cli.verbose || config.agent.verbose;

    let _log_guard = init_logging(Some(logging_config(&config, verbose))).context("Failed to initialize logging")?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    if verbose {
        println!("{} Using config: {}", "Info:".blue().bold(), sanitize_path(&config_path));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    match command {
        Commands::Chat { days } => runtime.block_on(cmd_chat(config, days, verbose)),
        Commands::Ask { query, days } => runtime.block_on(cmd_ask(config, &query, days, verbose)),
        Commands::Validate => cmd_validate(config),
        Commands::Skills => cmd_skills(&config),
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<(Config, PathBuf)> {
    Config::load(explicit, cwd).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

/// `[logging]` settings, raised to debug by `--verbose`.
fn logging_config(config: &Config, verbose: bool) -> LoggingConfig {
    let logging = LoggingConfig::from(&config.logging);
    if verbose { logging.with_level("debug") } else { logging }
}

async fn start_session(config: Config, days: Option<u32>) -> Result<Session> {
    println!("{} Indexing vault...", "Info:".blue().bold());
    let session = Session::start(config, days).await.context("Failed to start session")?;

    let summary = session.index_summary();
    println!(
        "{} Indexed {} notes ({} chunks), {}",
        "Success:".green().bold(),
        summary.documents.to_string().cyan(),
        summary.chunks.to_string().cyan(),
        session.report().summary()
    );
    if !session.report().is_clean() {
        println!(
            "{} Some skills failed to load; run `sableye skills` for details",
            "Warning:".yellow().bold()
        );
    }
    Ok(session)
}

/// Answer one question and exit
async fn cmd_ask(config: Config, query: &str, days: Option<u32>, verbose: bool) -> Result<()> {
    let mut session = start_session(config, days).await?;
    let mut events = verbose.then(|| session.agent_mut().subscribe());

    let answer = session.chat(query).await;
    if let Some(rx) = events.as_mut() {
        print_events(rx);
    }

    println!();
    println!("{}", answer);
    Ok(())
}

/// Interactive chat loop over stdin
async fn cmd_chat(config: Config, days: Option<u32>, verbose: bool) -> Result<()> {
    let mut session = start_session(config, days).await?;
    let mut events = verbose.then(|| session.agent_mut().subscribe());

    println!();
    println!("{}", "Sableye".green().bold().underline());
    println!("Ask anything about your notes. Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let message = match Input::parse(&line) {
            Input::Empty => continue,
            Input::Message(message) => message,
            Input::Command(command) => match command {
                ReplCommand::Exit => break,
                ReplCommand::Recent(days) => recent_query(days),
                other => {
                    run_command(&mut session, other).await;
                    continue;
                }
            },
        };

        let answer = session.chat(&message).await;
        if let Some(rx) = events.as_mut() {
            print_events(rx);
        }
        println!("\n{} {}", "Sableye:".green().bold(), answer);
    }

    println!("Goodbye!");
    Ok(())
}

/// Commands handled locally without the assistant
async fn run_command(session: &mut Session, command: ReplCommand) {
    match command {
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::InvalidRecent => println!("{} Invalid format. Use: /recent [days]", "Warning:".yellow().bold()),
        ReplCommand::Stats => match session.stats().await {
            Ok(stats) => {
                println!("{}", "Vault Statistics".green().bold());
                println!("{}", stats);
            }
            Err(e) => println!("{} Could not read vault statistics: {}", "Warning:".yellow().bold(), e),
        },
        ReplCommand::Skills => {
            for tool in session.agent().tools() {
                println!("  {} - {}", tool.name().cyan(), tool.description());
            }
            println!("{}", session.report().summary());
        }
        ReplCommand::Memory => println!("{}", session.agent().memory_summary()),
        ReplCommand::Clear => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = io::stdout().flush();
        }
        ReplCommand::Reset => {
            session.agent_mut().clear_memory();
            println!("{} Conversation memory cleared", "Success:".green().bold());
        }
        ReplCommand::Unknown(name) => println!("{} Unknown command: {}", "Warning:".yellow().bold(), name),
        ReplCommand::Recent(_) | ReplCommand::Exit => {}
    }
}

fn print_events(rx: &mut mpsc::UnboundedReceiver<AgentEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            AgentEvent::ToolCall { name, input } => {
                println!("{} {}({})", "Tool:".magenta().bold(), name.cyan(), input)
            }
            AgentEvent::ToolResult { name, is_error: true, output } => {
                println!("{} {} {}", "Tool:".magenta().bold(), name.cyan(), output.red())
            }
            AgentEvent::ToolResult { name, output, .. } => {
                println!("{} {} returned {} chars", "Tool:".magenta().bold(), name.cyan(), output.chars().count())
            }
            AgentEvent::Error(_) => {}
        }
    }
}

/// Validate the configuration and print a summary
fn cmd_validate(mut config: Config) -> Result<()> {
    config.validate().context("Configuration is invalid")?;

    println!("{}", "Configuration is valid".green().bold());
    for line in validation_summary(&config) {
        println!("  {}", line);
    }
    Ok(())
}

fn validation_summary(config: &Config) -> Vec<String> {
    let vault = config
        .vault
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let load_days = match config.vault.load_days {
        0 => "All".to_string(),
        days => days.to_string(),
    };

    vec![
        format!("Model Type: {}", config.model.kind),
        format!("Model Name: {}", config.model.name),
        format!("Vault Path: {}", vault),
        format!("Load Days: {}", load_days),
        format!("Verbose: {}", config.agent.verbose),
    ]
}

/// List skills without contacting any model
fn cmd_skills(config: &Config) -> Result<()> {
    let RegistryBuild { tools, report } = Session::inspect_skills(config);

    println!("{}", "Skills".green().bold().underline());
    for tool in &tools {
        println!("  {} - {}", tool.name().cyan(), tool.description());
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failed to load".red().bold());
        for failure in &report.failures {
            println!("  {} [{}] {}", failure.identifier.yellow(), failure.kind, failure.reason);
        }
    }

    println!();
    println!("{}", report.summary());
    Ok(())
}
