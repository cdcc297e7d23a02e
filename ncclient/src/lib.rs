//! # ncclient
//!
//! Async NETCONF client over SSH.
//!
//! ncclient authenticates to network devices, exchanges NETCONF hellos and
//! issues RPCs, handing back the raw XML replies for whatever XML tooling
//! the caller prefers. It can also fan a single RPC out across a fleet of
//! devices through a bounded worker pool.
//!
//! ## Features
//!
//! - Async SSH connections via russh, bound to the `netconf` subsystem
//! - NETCONF 1.0 end-of-message framing behind a pluggable [`Framing`] trait
//! - Explicit session state machine with typed errors
//! - Deadlines and cooperative cancellation on every blocking step
//! - Concurrent multi-device dispatch with per-device results
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ncclient::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ncclient::Error> {
//!     let mut session = Session::builder("10.200.2.1")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     session.connect().await?;
//!     session.send_hello().await?;
//!
//!     let reply = session.write_rpc("<get-chassis-inventory/>").await?;
//!     println!("{}", reply);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod error;
pub mod framing;
mod serde_utils;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use dispatch::{DispatchConfig, Dispatcher, ResultStream, WorkItem, WorkResult};
pub use error::Error;
pub use framing::{DELIMITER, EndOfMessageFraming, Framing};
pub use session::{RpcEnvelope, RpcReply, Session, SessionBuilder, SessionConfig, SessionState};
pub use transport::{
    Connector, Credentials, Endpoint, HostKeyVerification, PrivateKeySource, RsaHash,
    SshConnector, SshOptions, SshTransport, Transport,
};
