mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "taskroute")]
#[command(about = "Route free-text tasks to tools or a general responder", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Onboard {
        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and agent status
    Status,

    /// Process a single task and print the result
    Run {
        /// Task text
        #[arg(short, long)]
        message: String,

        /// Performance mode (fast, balanced, quality); defaults to config
        #[arg(long)]
        mode: Option<String>,
    },

    /// Manage registered tools
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// Start the HTTP gateway
    Gateway {
        /// Port to listen on (overrides config gateway.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config gateway.host)
        #[arg(long)]
        host: Option<String>,
    },
}

#[derive(Subcommand)]
enum ToolsCommands {
    /// List all registered tools
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Onboard { force } => {
            commands::onboard::run(force).await?;
        }
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Run { message, mode } => {
            commands::run_cmd::run(&message, mode.as_deref()).await?;
        }
        Commands::Tools { command } => match command {
            ToolsCommands::List => {
                commands::tools_cmd::list().await?;
            }
        },
        Commands::Gateway { port, host } => {
            commands::gateway::run(host, port).await?;
        }
    }

    Ok(())
}
