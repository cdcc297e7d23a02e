//! SSH transport layer wrapping russh.
//!
//! A [`Connector`] dials a device and hands back a [`Transport`]: an
//! authenticated byte stream bound to the remote `netconf` subsystem.
//! Sessions only see the two traits, which lets them run against an
//! in-memory peer as easily as against a real device.

pub mod config;
mod ssh;

pub use config::{
    Credentials, DEFAULT_PORT, Endpoint, HostKeyVerification, PrivateKeySource, RsaHash,
    SshOptions,
};
pub use ssh::{SshConnector, SshTransport};

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// SSH subsystem requested on every channel.
pub const NETCONF_SUBSYSTEM: &str = "netconf";

/// An open duplex byte stream to one device.
///
/// Exclusively owned by one session; never shared between sessions.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {
    /// Release the channel and the underlying connection.
    ///
    /// Calling this on an already closed transport is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Factory for transports.
pub trait Connector: Send + Sync + 'static {
    /// Transport produced by this connector.
    type Transport: Transport + 'static;

    /// Dial, authenticate and bind the netconf subsystem.
    ///
    /// Either every step succeeds or the partially opened connection is
    /// released before the error is returned.
    fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Transport>> + Send;
}
