use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vizion::api::{ApiClient, ClientConfig, DEFAULT_API_URL};

/// Lists the models the service offers and their pricing.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "VIZION_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = ClientConfig::new(args.api_url).with_timeout(Duration::from_secs(args.timeout));
    let client = ApiClient::new(config)?;

    let res = client.models().await?;
    println!("Cost: {:.4} cents/second", res.cost_per_second_cents);
    for model in res.models {
        println!("  {:<20} {:<24} {}", model.id, model.name, model.description);
    }

    Ok(())
}
