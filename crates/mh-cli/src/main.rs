//! MayHost CLI
//!
//! Interactive client for a MayHost server:
//! - Asks for the server address and token
//! - Connects over Socket.IO and keeps the connection alive
//! - Relays typed commands and prints their output

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mayhost::app;
use mayhost::console::TerminalConsole;
use mayhost::output::{print_banner, print_error, print_info};
use mayhost::router::Router;
use mh_core::config;
use mh_core::{SessionController, SocketIoTransport, Token};

#[derive(Parser)]
#[command(name = "mayhost")]
#[command(author, version, about = "Interactive terminal client for MayHost servers")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        print_error(&format!("Unexpected error: {}", info));
        std::process::exit(1);
    }));

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            print_error(&format!("{:#}", e));
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let config = config::resolve_client_config(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if config.banner {
        print_banner();
    }

    let server_url = prompt_value("🌐 Server base URL (e.g. http://localhost:3000): ")?;
    let token = prompt_value("🔑 Token: ")?;

    let (transport, events) = SocketIoTransport::new();
    let mut controller = SessionController::new(transport, config.clone());
    controller.configure(server_url, Token::new(token));

    print_info("Connecting to the server...");
    controller
        .connect()
        .await
        .context("Failed to start the connection")?;

    let interactive = std::io::stdin().is_terminal();
    let router = Router::new(controller, TerminalConsole::new(config.prompt));
    app::run(router, events, interactive).await
}

/// Ask for one line of configuration on stdin
fn prompt_value(label: &str) -> Result<String> {
    use std::io::{self, Write};

    print!("{}", label.cyan());
    io::stdout().flush()?;

    let mut value = String::new();
    let read = io::stdin()
        .read_line(&mut value)
        .context("Failed to read from stdin")?;
    if read == 0 {
        anyhow::bail!("Input closed before the configuration was entered");
    }

    Ok(value.trim().to_string())
}
