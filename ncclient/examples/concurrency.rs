//! Fan-out example: one RPC against many devices at once.
//!
//! # Usage
//!
//! ```bash
//! USER=admin PASSWORD=secret HOSTS="10.0.0.1 10.0.0.2:830 core1" \
//!     cargo run --example concurrency
//! ```
//!
//! Set `WORKERS` to bound the pool (default 16) and `RPC` to change the
//! request (default `<get-chassis-inventory/>`).

use std::env;
use std::sync::Arc;

use ncclient::{Credentials, DispatchConfig, Dispatcher, Endpoint, SshConnector, SshOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let username = env::var("USER").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("PASSWORD").ok();
    let credentials = Arc::new(Credentials::new(username, password, None)?);

    let endpoints = env::var("HOSTS")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<Endpoint>, _>>()?;
    if endpoints.is_empty() {
        eprintln!("Error: set HOSTS to a space separated list of devices");
        std::process::exit(1);
    }

    let mut config = DispatchConfig::default();
    if let Some(workers) = env::var("WORKERS").ok().and_then(|w| w.parse().ok()) {
        config.max_workers = workers;
    }
    let rpc = env::var("RPC").unwrap_or_else(|_| "<get-chassis-inventory/>".to_string());

    let dispatcher = Dispatcher::new(SshConnector::new(SshOptions::default()), config);

    // Ctrl-C cancels whatever is still running; every device still reports
    let token = dispatcher.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut results = dispatcher.dispatch_stream(endpoints, credentials, rpc);
    while let Some(result) = results.next().await {
        match result.reply() {
            Some(xml) => {
                println!("{}", result.endpoint);
                println!("-------------------------------------------");
                println!("{}\n", xml);
            }
            None => println!("{}\n", result),
        }
    }
    Ok(())
}
