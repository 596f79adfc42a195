//! hnclient - HL7 bridge client for the HNClient pharmacy gateway
//!
//! Performs one request/response exchange with the gateway and prints the
//! descrambled HL7 response.

use clap::Parser;
use hnclient_client::{Config, HnClient};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hnclient")]
#[command(about = "Send an HL7 message to the HNClient gateway and print the response")]
#[command(version)]
struct Cli {
    /// Gateway port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to YAML config file
    #[arg(short, long, env = "HNCLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Read the message from a file instead of the command line
    #[arg(short, long, conflicts_with = "message")]
    file: Option<PathBuf>,

    /// Overall deadline for the exchange, in seconds (overrides config)
    #[arg(short, long)]
    deadline: Option<u64>,

    /// The HL7 message to send (reads stdin if neither this nor --file is given)
    message: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(deadline) = cli.deadline {
        config.polling.deadline_secs = Some(deadline);
    }

    let message = match (cli.message, cli.file) {
        (Some(message), _) => message,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let message = message.trim_end_matches('\n');

    tracing::info!(port = config.network.port, "sending message to gateway");

    let client = HnClient::new(config.session());
    let response = client.send_receive(message)?;

    print!("{response}");
    Ok(())
}
