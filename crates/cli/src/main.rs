mod error;

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mcp::Server;
use papercut::{CallConfig, Config, build_registry};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use error::{Error, Result};

#[derive(Parser)]
#[command(name = "papercut-mcp")]
#[command(about = "PaperCut NG/MF web services as MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,
    /// Print the tool catalogue as JSON
    Tools,
    /// Run one tool and print its result
    Call {
        /// Tool name, e.g. papercut_get_total_users
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Arc::new(Config::load());

    match cli.command {
        Some(Commands::Serve) | None => cmd_serve(config).await,
        Some(Commands::Tools) => cmd_tools(config),
        Some(Commands::Call { tool, args }) => cmd_call(config, &tool, &args).await,
    }
}

/// Logs go to stderr; stdout carries the MCP stream.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn cmd_serve(config: Arc<Config>) -> Result<()> {
    let call = CallConfig::from_config(&config);
    info!(
        version = papercut::VERSION,
        endpoint = %call.url,
        timeout_ms = call.timeout_ms(),
        token_set = !call.token.is_empty(),
        "starting papercut-mcp"
    );

    let server = Server::new(build_registry(config), papercut::SERVER_NAME, papercut::VERSION);
    server.serve_stdio().await?;
    Ok(())
}

fn cmd_tools(config: Arc<Config>) -> Result<()> {
    let tools = build_registry(config).tools();
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &tools)?;
    writeln!(stdout)?;
    Ok(())
}

async fn cmd_call(config: Arc<Config>, tool: &str, args: &str) -> Result<()> {
    let args: Value = serde_json::from_str(args).map_err(Error::InvalidArguments)?;
    let registry = build_registry(config);
    let result = registry.call_tool(tool, Some(args)).await?;
    println!("{}", result.joined_text());
    Ok(())
}
