//! Reply type for RPC exchanges.

use std::time::Duration;

/// Reply to one RPC.
#[derive(Debug, Clone)]
pub struct RpcReply {
    /// message-id attached to the request, if the envelope carries one.
    pub message_id: Option<u64>,

    /// Raw reply document, delimiter removed.
    pub xml: String,

    /// Time from writing the request to decoding the reply.
    pub elapsed: Duration,
}

impl RpcReply {
    /// Create a new reply.
    pub fn new(message_id: Option<u64>, xml: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            message_id,
            xml: xml.into(),
            elapsed,
        }
    }

    /// Take the reply document.
    pub fn into_xml(self) -> String {
        self.xml
    }

    /// Get the reply lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.xml.lines()
    }

    /// Check if the reply contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.xml.contains(pattern)
    }
}

impl std::fmt::Display for RpcReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.xml)
    }
}
