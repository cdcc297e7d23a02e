//! Builder for SSH sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::config::SessionConfig;
use super::message::RpcEnvelope;
use super::Session;
use crate::error::{ConfigError, Result};
use crate::transport::{
    Credentials, DEFAULT_PORT, Endpoint, HostKeyVerification, PrivateKeySource, RsaHash,
    SshConnector, SshOptions,
};

/// Builder for constructing SSH-backed sessions.
///
/// # Example
///
/// ```rust,no_run
/// use ncclient::SessionBuilder;
///
/// # async fn example() -> Result<(), ncclient::Error> {
/// let mut session = SessionBuilder::new("10.200.2.1")
///     .port(830)
///     .username("admin")
///     .private_key("/home/admin/.ssh/id_rsa")
///     .password("fallback")
///     .build()?;
/// session.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    private_key: Option<PrivateKeySource>,
    ssh: SshOptions,
    config: SessionConfig,
    cancel: Option<CancellationToken>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            private_key: None,
            ssh: SshOptions::default(),
            config: SessionConfig::default(),
            cancel: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication. Tried after the private key if both are set.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Authenticate with a private key file.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.private_key = Some(PrivateKeySource::file(key_path));
        self
    }

    /// Authenticate with an encrypted private key file.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.private_key = Some(PrivateKeySource::file(key_path).with_passphrase(passphrase));
        self
    }

    /// Authenticate with PEM key material held in memory.
    pub fn private_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.private_key = Some(PrivateKeySource::pem(pem));
        self
    }

    /// Deadline for connecting and for each reply (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Replace the capabilities advertised in the hello.
    pub fn capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Choose the RPC envelope style.
    pub fn envelope(mut self, envelope: RpcEnvelope) -> Self {
        self.config.envelope = envelope;
        self
    }

    /// Largest reply accepted.
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.ssh.host_key_verification = mode;
        self
    }

    /// Accept any host key. For lab use only.
    pub fn danger_disable_host_key_verification(self) -> Self {
        self.host_key_verification(HostKeyVerification::Disabled)
    }

    /// Use a custom known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh.known_hosts_path = Some(path.into());
        self
    }

    /// Set the RSA signature hash for public-key authentication.
    pub fn rsa_hash(mut self, hash: RsaHash) -> Self {
        self.ssh.rsa_hash = hash;
        self
    }

    /// Send SSH keepalives at this interval.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.ssh.keepalive_interval = Some(interval);
        self
    }

    /// Replace all protocol settings at once.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace all SSH settings at once.
    pub fn ssh_options(mut self, options: SshOptions) -> Self {
        self.ssh = options;
        self
    }

    /// Abort blocking operations when `token` is cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the session.
    ///
    /// This validates the credentials but does not connect. Call
    /// `connect()` on the returned session to open the transport.
    pub fn build(self) -> Result<Session<SshConnector>> {
        let username = self.username.ok_or(ConfigError::MissingUsername)?;
        let credentials = Credentials::new(username, self.password, self.private_key)?;

        let session = Session::new(
            Arc::new(SshConnector::new(self.ssh)),
            Endpoint::new(self.host, self.port),
            Arc::new(credentials),
            self.config,
        );

        Ok(match self.cancel {
            Some(token) => session.with_cancellation(token),
            None => session,
        })
    }
}
