//! NETCONF hello document and RPC envelope.

use serde::{Deserialize, Serialize};

/// NETCONF base namespace.
pub const NETCONF_BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Capabilities advertised in the client hello, in wire order.
pub const DEFAULT_CAPABILITIES: &[&str] = &[
    "urn:ietf:params:netconf:capability:writable-running:1.0",
    "urn:ietf:params:netconf:capability:rollback-on-error:1.0",
    "urn:ietf:params:netconf:capability:validate:1.0",
    "urn:ietf:params:netconf:capability:confirmed-commit:1.0",
    "urn:ietf:params:netconf:capability:url:1.0?scheme=http,ftp,file,https,sftp",
    "urn:ietf:params:netconf:base:1.0",
    "urn:liberouter:params:netconf:capability:power-control:1.0",
    "urn:ietf:params:netconf:capability:candidate:1.0",
    "urn:ietf:params:netconf:capability:xpath:1.0",
    "urn:ietf:params:netconf:capability:startup:1.0",
    "urn:ietf:params:netconf:capability:interleave:1.0",
];

/// Build the client hello advertising `capabilities`.
pub fn hello_message<S: AsRef<str>>(capabilities: &[S]) -> String {
    let mut hello = String::with_capacity(256 + capabilities.len() * 96);
    hello.push_str("\n<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    hello.push_str("<nc:hello xmlns:nc=\"");
    hello.push_str(NETCONF_BASE_NS);
    hello.push_str("\">\n\t<nc:capabilities>\n");
    for capability in capabilities {
        hello.push_str("\t\t<nc:capability>");
        hello.push_str(capability.as_ref());
        hello.push_str("</nc:capability>\n");
    }
    hello.push_str("\t</nc:capabilities>\n</nc:hello>\n");
    hello
}

/// How RPC bodies are wrapped before they go on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcEnvelope {
    /// `<rpc message-id="N" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">`
    #[default]
    Conformant,

    /// Plain `<rpc>` with no message-id or namespace. Some older tooling
    /// expects exactly this; most servers reject or mis-route it.
    Bare,
}

impl RpcEnvelope {
    /// Wrap `body`. Returns the message-id that was attached, if any.
    pub fn wrap(&self, body: &str, message_id: u64) -> (String, Option<u64>) {
        match self {
            RpcEnvelope::Conformant => (
                format!(
                    "<rpc message-id=\"{}\" xmlns=\"{}\">{}</rpc>",
                    message_id, NETCONF_BASE_NS, body
                ),
                Some(message_id),
            ),
            RpcEnvelope::Bare => (format!("<rpc>{}</rpc>", body), None),
        }
    }
}
