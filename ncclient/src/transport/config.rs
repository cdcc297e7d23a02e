//! Endpoint, credential and SSH connection configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConnectionError};
use crate::serde_utils::opt_duration_secs;

/// Default SSH port used when an endpoint does not name one.
pub const DEFAULT_PORT: u16 = 22;

/// A device to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Endpoint {
    /// Create an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host`, `host:port` or `[v6addr]:port`, falling back to
    /// `default_port` when no port is given.
    ///
    /// A bare IPv6 literal without brackets is taken as a host.
    pub fn parse_with_default(input: &str, default_port: u16) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidEndpoint {
            input: input.to_string(),
        };
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid());
        }

        if let Some(rest) = input.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            if host.is_empty() {
                return Err(invalid());
            }
            let port = match tail {
                "" => default_port,
                _ => tail
                    .strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(invalid)?,
            };
            return Ok(Self::new(host, port));
        }

        match input.rsplit_once(':') {
            Some((host, _)) if host.contains(':') => Ok(Self::new(input, default_port)),
            Some((host, port)) => {
                let port = port.parse().map_err(|_| invalid())?;
                if host.is_empty() {
                    return Err(invalid());
                }
                Ok(Self::new(host, port))
            }
            None => Ok(Self::new(input, default_port)),
        }
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default(s, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Where a private key for public-key authentication comes from.
#[derive(Debug)]
pub enum PrivateKeySource {
    /// PEM/OpenSSH encoded key material held in memory.
    Pem {
        pem: SecretString,
        passphrase: Option<SecretString>,
    },

    /// Key file on disk.
    File {
        path: PathBuf,
        passphrase: Option<SecretString>,
    },
}

impl PrivateKeySource {
    /// In-memory key without a passphrase.
    pub fn pem(pem: impl Into<String>) -> Self {
        Self::Pem {
            pem: SecretString::from(pem.into()),
            passphrase: None,
        }
    }

    /// Key file without a passphrase.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            passphrase: None,
        }
    }

    /// Attach a passphrase for an encrypted key.
    pub fn with_passphrase(self, passphrase: impl Into<String>) -> Self {
        let passphrase = Some(SecretString::from(passphrase.into()));
        match self {
            Self::Pem { pem, .. } => Self::Pem { pem, passphrase },
            Self::File { path, .. } => Self::File { path, passphrase },
        }
    }

    /// Decode the key material.
    pub(crate) fn load(
        &self,
        endpoint: &Endpoint,
    ) -> Result<russh::keys::PrivateKey, ConnectionError> {
        let result = match self {
            Self::Pem { pem, passphrase } => russh::keys::decode_secret_key(
                pem.expose_secret(),
                passphrase.as_ref().map(|p| p.expose_secret()),
            ),
            Self::File { path, passphrase } => {
                russh::keys::load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
            }
        };
        result.map_err(|e| ConnectionError::Key {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })
    }
}

/// Login credentials for a device.
///
/// Always carries at least one usable authentication method. When both a
/// key and a password are present the key is tried first.
#[derive(Debug)]
pub struct Credentials {
    username: String,
    password: Option<SecretString>,
    private_key: Option<PrivateKeySource>,
}

impl Credentials {
    /// Build credentials, checking that a username and at least one
    /// authentication method are present.
    pub fn new(
        username: impl Into<String>,
        password: Option<String>,
        private_key: Option<PrivateKeySource>,
    ) -> Result<Self, ConfigError> {
        let username = checked_username(username)?;
        if password.is_none() && private_key.is_none() {
            return Err(ConfigError::NoAuthMethod);
        }
        Ok(Self {
            username,
            password: password.map(SecretString::from),
            private_key,
        })
    }

    /// Password-only credentials.
    pub fn with_password(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            username: checked_username(username)?,
            password: Some(SecretString::from(password.into())),
            private_key: None,
        })
    }

    /// Key-only credentials.
    pub fn with_private_key(
        username: impl Into<String>,
        key: PrivateKeySource,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            username: checked_username(username)?,
            password: None,
            private_key: Some(key),
        })
    }

    /// Add a password as a fallback after public-key authentication.
    pub fn and_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Username to authenticate as.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    pub(crate) fn private_key(&self) -> Option<&PrivateKeySource> {
        self.private_key.as_ref()
    }
}

fn checked_username(username: impl Into<String>) -> Result<String, ConfigError> {
    let username = username.into();
    if username.is_empty() {
        return Err(ConfigError::MissingUsername);
    }
    Ok(username)
}

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// Hash algorithm used for RSA public-key signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsaHash {
    /// Use the best algorithm the server advertises, SHA-1 if it advertises none.
    #[default]
    Negotiate,

    /// Legacy `ssh-rsa` (SHA-1) signatures, for old device firmware.
    Sha1,

    /// `rsa-sha2-256`
    Sha256,

    /// `rsa-sha2-512`
    Sha512,
}

/// SSH options shared by every connection a connector makes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SshOptions {
    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file (defaults to the user's).
    pub known_hosts_path: Option<PathBuf>,

    /// RSA signature hash for public-key authentication.
    pub rsa_hash: RsaHash,

    /// Send SSH keepalives at this interval.
    #[serde(with = "opt_duration_secs")]
    pub keepalive_interval: Option<Duration>,

    /// Drop the connection after this much inactivity.
    #[serde(with = "opt_duration_secs")]
    pub inactivity_timeout: Option<Duration>,
}
