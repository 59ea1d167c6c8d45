use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::core::feed::fetcher::{FeedClient, FeedClientConfig};

const TIMEOUT_ENV: &str = "KAROO_TIMEOUT_SECS";
const USER_AGENT_ENV: &str = "KAROO_USER_AGENT";
const LOG_ENV: &str = "KAROO_LOG";

/// Fetch an RSS feed and print it as JSON.
#[derive(Debug, Parser)]
#[command(name = "karoo", version)]
struct CliArgs {
    /// Absolute http(s) URL of the feed
    url: String,
    /// Request timeout in seconds [env: KAROO_TIMEOUT_SECS, default: 10]
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// User-Agent header to send [env: KAROO_USER_AGENT]
    #[arg(long)]
    user_agent: Option<String>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

pub async fn run() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let args = CliArgs::parse();
    let config = resolve_config(&args, |key| std::env::var(key).ok());
    match fetch_as_json(&args.url, &config, args.pretty).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("karoo: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Flags win over the environment.
fn resolve_config(args: &CliArgs, env: impl Fn(&str) -> Option<String>) -> FeedClientConfig {
    let timeout_secs = args.timeout_secs.or_else(|| {
        let raw = env(TIMEOUT_ENV)?;
        match raw.trim().parse::<u64>() {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%raw, %error, "ignoring invalid {TIMEOUT_ENV}");
                None
            }
        }
    });
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| env(USER_AGENT_ENV).filter(|value| !value.trim().is_empty()));

    FeedClientConfig {
        timeout_secs,
        user_agent,
    }
}

async fn fetch_as_json(url: &str, config: &FeedClientConfig, pretty: bool) -> Result<String, String> {
    let client = FeedClient::from_config(config).map_err(|error| error.to_string())?;
    let feed = client.get_feed(url).await.map_err(|error| error.to_string())?;
    let json = if pretty {
        serde_json::to_string_pretty(&feed)
    } else {
        serde_json::to_string(&feed)
    };
    json.map_err(|error| error.to_string())
}
