//! Per-session protocol configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::message::{DEFAULT_CAPABILITIES, RpcEnvelope};
use crate::framing::DEFAULT_MAX_FRAME_SIZE;
use crate::serde_utils::duration_secs;

/// Protocol settings for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Deadline for connecting and for each reply.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Capabilities advertised in the hello.
    pub capabilities: Vec<String>,

    /// RPC envelope style.
    pub envelope: RpcEnvelope,

    /// Largest reply accepted before the session is torn down.
    pub max_frame_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            capabilities: DEFAULT_CAPABILITIES.iter().map(|c| c.to_string()).collect(),
            envelope: RpcEnvelope::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
