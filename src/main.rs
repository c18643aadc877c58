use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "promptline")]
#[command(about = "Drive interactive CLI tools one turn at a time")]
#[command(version)]
struct Cli {
    /// Working directory used to find .promptline/config.toml (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Path to the config file (overrides project and global config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the classified answer
    Prompt {
        /// Prompt text
        text: String,

        /// Tool profile to use (defaults to settings.default_tool)
        #[arg(short, long)]
        tool: Option<String>,

        /// Give up (and interrupt the tool) after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Prompt to send instead if the first one times out
        #[arg(long)]
        fallback: Option<String>,

        /// Print the output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Chat line by line in one session
    Chat {
        /// Tool profile to use (defaults to settings.default_tool)
        #[arg(short, long)]
        tool: Option<String>,

        /// Report classification changes in the background
        #[arg(long)]
        monitor: bool,
    },

    /// Classify captured terminal text from a file or stdin
    Classify {
        /// File to read (stdin when omitted)
        file: Option<PathBuf>,

        /// Tool profile whose ready markers apply
        #[arg(short, long)]
        tool: Option<String>,

        /// Print the output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default ~/.promptline/config.toml (or the --config path)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays machine-readable
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let work_dir = cli.path.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Init { force } => {
            cli::init::init_command(cli.config, force).await?;
        }
        command => {
            let config = promptline::config::Config::resolve(cli.config.as_deref(), &work_dir)?;
            match command {
                Commands::Prompt {
                    text,
                    tool,
                    timeout_ms,
                    fallback,
                    json,
                } => {
                    let args = cli::prompt::PromptArgs {
                        text,
                        tool,
                        timeout_ms,
                        fallback,
                        json,
                    };
                    cli::prompt::prompt_command(&config, args).await?;
                }
                Commands::Chat { tool, monitor } => {
                    cli::chat::chat_command(&config, tool.as_deref(), monitor).await?;
                }
                Commands::Classify { file, tool, json } => {
                    cli::classify::classify_command(&config, tool.as_deref(), file, json).await?;
                }
                Commands::Init { .. } => {}
            }
        }
    }

    Ok(())
}
