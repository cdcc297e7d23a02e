//! Basic example: hello exchange and one RPC against a single device.
//!
//! Credentials come from the environment, the host from the command line.
//!
//! # Usage
//!
//! ```bash
//! USER=admin PASSWORD=secret cargo run --example basic -- 10.200.2.1
//! USER=admin KEY=~/.ssh/id_rsa cargo run --example basic -- 10.200.2.1:830 "<get-software-information/>"
//! ```

use std::env;
use std::time::Duration;

use ncclient::{Endpoint, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let endpoint: Endpoint = args.next().unwrap_or_else(|| "localhost".into()).parse()?;
    let rpc = args
        .next()
        .unwrap_or_else(|| "<get-chassis-inventory/>".to_string());

    let mut builder = Session::builder(&endpoint.host)
        .port(endpoint.port)
        .username(env::var("USER").unwrap_or_else(|_| "admin".to_string()))
        .timeout(Duration::from_secs(30));
    if let Ok(password) = env::var("PASSWORD") {
        builder = builder.password(password);
    }
    if let Ok(key) = env::var("KEY") {
        builder = builder.private_key(key);
    }
    let mut session = builder.build()?;

    println!("Connecting to {}...", endpoint);
    session.connect().await?;

    // Peer capabilities come back as raw XML
    let hello = session.send_hello().await?;
    println!("Server hello: {} bytes\n", hello.len());

    let result = session.write_rpc(&rpc).await;
    session.close().await?;

    let reply = result?;
    println!("Reply in {:?}:", reply.elapsed);
    println!("{}", reply);
    Ok(())
}
