//! Error types for ncclient.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::transport::Endpoint;

/// Main error type for ncclient operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Dialing, authenticating or binding the netconf subsystem failed
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// NETCONF framing or session sequencing errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid credentials or endpoint configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Read/write failure on an established stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// A dispatch worker task died while running a session
    #[error("Worker failed: {message}")]
    Worker { message: String },
}

impl Error {
    /// Whether retrying on a fresh session may succeed.
    ///
    /// Connection and protocol errors need operator intervention (bad
    /// credentials, unreachable host, misbehaving peer); I/O errors and
    /// timeouts are treated as transient.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Timeout(_))
    }
}

/// Connection establishment errors (dial, host key, authentication, subsystem).
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to dial or complete the SSH handshake
    #[error("Failed to connect to {endpoint}: {source}")]
    Dial {
        endpoint: Endpoint,
        #[source]
        source: russh::Error,
    },

    /// Every configured authentication method was rejected
    #[error("Authentication failed for user '{user}' on {endpoint}")]
    Authentication { user: String, endpoint: Endpoint },

    /// The server refused the netconf subsystem request
    #[error("Subsystem request refused by {endpoint}: {reason}")]
    Subsystem { endpoint: Endpoint, reason: String },

    /// SSH protocol error after the connection was established
    #[error("SSH error on {endpoint}: {source}")]
    Ssh {
        endpoint: Endpoint,
        #[source]
        source: russh::Error,
    },

    /// Private key could not be loaded or decoded
    #[error("SSH key error for {endpoint}: {reason}")]
    Key { endpoint: Endpoint, reason: String },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host {host}:{port} not found in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error for {host}:{port}: {reason}")]
    KnownHosts {
        host: String,
        port: u16,
        reason: String,
    },
}

impl ConnectionError {
    /// Wrap an SSH protocol error with the endpoint it occurred on.
    pub(crate) fn ssh(endpoint: &Endpoint) -> impl FnOnce(russh::Error) -> Self + '_ {
        move |source| Self::Ssh {
            endpoint: endpoint.clone(),
            source,
        }
    }
}

/// NETCONF framing and session sequencing errors.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Session has no transport
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// connect() called on a session that already has a transport
    #[error("Session already connected")]
    AlreadyConnected,

    /// RPC issued before the hello exchange
    #[error("Hello not exchanged - call send_hello() before write_rpc()")]
    HelloNotSent,

    /// send_hello() called twice
    #[error("Hello already exchanged on this session")]
    HelloAlreadySent,

    /// Session was closed and cannot be reused
    #[error("Session closed")]
    SessionClosed,

    /// Stream ended before the end-of-message delimiter was seen
    #[error("Stream closed before end-of-message delimiter ({buffered} bytes buffered)")]
    UnexpectedEof { buffered: usize },

    /// Outgoing message contains the end-of-message delimiter
    #[error("Message contains the end-of-message delimiter")]
    DelimiterInPayload,

    /// Incoming frame is not valid UTF-8
    #[error("Frame is not valid UTF-8 (invalid byte at offset {offset})")]
    InvalidUtf8 { offset: usize },

    /// Incoming frame exceeded the configured limit without a delimiter
    #[error("Frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },
}

/// Credential and endpoint configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No username was given
    #[error("Username is required")]
    MissingUsername,

    /// Neither a password nor a private key was given
    #[error("At least one of password or private key is required")]
    NoAuthMethod,

    /// Endpoint string could not be parsed
    #[error("Invalid endpoint '{input}'")]
    InvalidEndpoint { input: String },
}

/// Result type alias using ncclient's Error.
pub type Result<T> = std::result::Result<T, Error>;
