//! NETCONF session: hello exchange and synchronous RPCs over one transport.
//!
//! A [`Session`] walks a small state machine:
//!
//! ```text
//! Disconnected --connect()--> Connected --send_hello()--> HelloSent
//!                                                          |    ^
//!                                                          +----+ write_rpc(), write()
//! any state --close()--> Closed
//! ```
//!
//! Every request is followed by exactly one reply before the next request
//! may be written; there is no pipelining. Any I/O error, timeout or
//! framing error mid-exchange leaves the stream at an unknown position, so
//! the session closes itself and the caller starts over with a new one.

mod builder;
mod config;
pub mod message;
mod reply;

pub use builder::SessionBuilder;
pub use config::SessionConfig;
pub use message::{DEFAULT_CAPABILITIES, NETCONF_BASE_NS, RpcEnvelope, hello_message};
pub use reply::RpcReply;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use log::{debug, trace, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, ProtocolError, Result};
use crate::framing::{EndOfMessageFraming, Framing};
use crate::transport::{Connector, Credentials, Endpoint, SshConnector, Transport};

/// Read granularity for the reply loop.
const READ_CHUNK: usize = 8 * 1024;

/// Protocol state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport; `connect()` has not succeeded yet.
    Disconnected,
    /// Transport open, hello not exchanged.
    Connected,
    /// Hello exchanged; RPCs may be issued.
    HelloSent,
    /// Transport released. Terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::HelloSent => "hello-sent",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A NETCONF session to one endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use ncclient::Session;
///
/// # async fn example() -> Result<(), ncclient::Error> {
/// let mut session = Session::builder("10.200.2.1")
///     .username("admin")
///     .password("secret")
///     .build()?;
///
/// session.connect().await?;
/// session.send_hello().await?;
/// let reply = session.write_rpc("<get-chassis-inventory/>").await?;
/// println!("{}", reply);
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session<C: Connector = SshConnector> {
    connector: Arc<C>,
    endpoint: Endpoint,
    credentials: Arc<Credentials>,
    config: SessionConfig,
    framing: Box<dyn Framing>,
    cancel: CancellationToken,

    /// Open transport (None unless Connected or HelloSent).
    transport: Option<C::Transport>,
    state: SessionState,
    /// Received bytes not yet consumed by a decoded frame.
    buffer: BytesMut,
    next_message_id: u64,
    peer_hello: Option<String>,
}

impl Session<SshConnector> {
    /// Start building an SSH session to `host`.
    pub fn builder(host: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(host)
    }
}

impl<C: Connector> Session<C> {
    /// Create a disconnected session.
    pub fn new(
        connector: Arc<C>,
        endpoint: Endpoint,
        credentials: Arc<Credentials>,
        config: SessionConfig,
    ) -> Self {
        let framing = Box::new(EndOfMessageFraming::with_max_frame_size(config.max_frame_size));
        Self {
            connector,
            endpoint,
            credentials,
            config,
            framing,
            cancel: CancellationToken::new(),
            transport: None,
            state: SessionState::Disconnected,
            buffer: BytesMut::new(),
            next_message_id: 1,
            peer_hello: None,
        }
    }

    /// Replace the framing codec.
    pub fn with_framing(mut self, framing: Box<dyn Framing>) -> Self {
        self.framing = framing;
        self
    }

    /// Abort blocking operations when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Endpoint this session talks to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a transport is open.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// The peer's hello, once exchanged.
    pub fn peer_hello(&self) -> Option<&str> {
        self.peer_hello.as_deref()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the transport.
    ///
    /// On failure the session stays `Disconnected` and may be retried.
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            SessionState::Disconnected => {}
            SessionState::Closed => return Err(ProtocolError::SessionClosed.into()),
            SessionState::Connected | SessionState::HelloSent => {
                return Err(ProtocolError::AlreadyConnected.into());
            }
        }

        let cancel = self.cancel.clone();
        let timeout = self.config.timeout;
        let connector = self.connector.clone();
        let credentials = self.credentials.clone();

        debug!("connecting session to {}", self.endpoint);
        let transport = bounded(
            &cancel,
            timeout,
            connector.connect(&self.endpoint, &credentials),
        )
        .await?;

        self.transport = Some(transport);
        self.buffer.clear();
        self.framing.reset();
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Send the client hello and return the peer's hello.
    ///
    /// The peer's capabilities are returned as raw text and also kept for
    /// [`peer_hello`](Self::peer_hello).
    pub async fn send_hello(&mut self) -> Result<String> {
        match self.state {
            SessionState::Connected => {}
            SessionState::Disconnected => return Err(ProtocolError::NotConnected.into()),
            SessionState::HelloSent => return Err(ProtocolError::HelloAlreadySent.into()),
            SessionState::Closed => return Err(ProtocolError::SessionClosed.into()),
        }

        let hello = hello_message(&self.config.capabilities);
        let reply = self.exchange(&hello).await?;

        debug!("hello exchanged with {}", self.endpoint);
        self.state = SessionState::HelloSent;
        self.peer_hello = Some(reply.clone());
        Ok(reply)
    }

    /// Wrap `body` in an `<rpc>` envelope, send it and wait for the reply.
    ///
    /// Requires a completed hello exchange: issuing an RPC before the hello
    /// leaves the peer's behaviour undefined, so it is refused with
    /// [`ProtocolError::HelloNotSent`].
    pub async fn write_rpc(&mut self, body: &str) -> Result<RpcReply> {
        self.require_hello()?;

        let (rpc, message_id) = self.config.envelope.wrap(body, self.next_message_id);
        self.next_message_id += 1;

        let start = Instant::now();
        let xml = self.write(&rpc).await?;
        Ok(RpcReply::new(message_id, xml, start.elapsed()))
    }

    /// Send `message` verbatim as one frame and return the next reply.
    ///
    /// For pre-built documents such as an `<rpc>` carrying its own
    /// `message-id`, or `<close-session/>`. Same preconditions as
    /// [`write_rpc`](Self::write_rpc).
    pub async fn write(&mut self, message: &str) -> Result<String> {
        self.require_hello()?;
        self.exchange(message).await
    }

    fn require_hello(&self) -> Result<()> {
        match self.state {
            SessionState::HelloSent => Ok(()),
            SessionState::Connected => Err(ProtocolError::HelloNotSent.into()),
            SessionState::Disconnected => Err(ProtocolError::NotConnected.into()),
            SessionState::Closed => Err(ProtocolError::SessionClosed.into()),
        }
    }

    /// Release the transport. Safe to call any number of times.
    pub async fn close(&mut self) -> Result<()> {
        self.state = SessionState::Closed;
        self.buffer.clear();
        self.framing.reset();
        if let Some(mut transport) = self.transport.take() {
            debug!("closing session to {}", self.endpoint);
            transport.close().await?;
        }
        Ok(())
    }

    /// Write one message and decode one reply.
    async fn exchange(&mut self, message: &str) -> Result<String> {
        let mut frame = BytesMut::new();
        self.framing.encode(message, &mut frame)?;

        let cancel = self.cancel.clone();
        let timeout = self.config.timeout;
        let result = bounded(&cancel, timeout, self.write_then_read(frame)).await;

        if let Err(ref e) = result {
            warn!("exchange with {} failed, closing session: {}", self.endpoint, e);
            self.teardown().await;
        }
        result
    }

    async fn write_then_read(&mut self, frame: BytesMut) -> Result<String> {
        let transport = self
            .transport
            .as_mut()
            .ok_or(ProtocolError::NotConnected)?;

        transport.write_all(&frame).await?;
        transport.flush().await?;
        trace!("sent {} bytes to {}", frame.len(), self.endpoint);

        self.read_frame().await
    }

    /// Read until the framing yields one complete message.
    async fn read_frame(&mut self) -> Result<String> {
        loop {
            if let Some(message) = self.framing.decode(&mut self.buffer)? {
                trace!("received {} bytes from {}", message.len(), self.endpoint);
                return Ok(message);
            }

            let transport = self
                .transport
                .as_mut()
                .ok_or(ProtocolError::NotConnected)?;

            self.buffer.reserve(READ_CHUNK);
            let n = transport.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Err(ProtocolError::UnexpectedEof {
                    buffered: self.buffer.len(),
                }
                .into());
            }
        }
    }

    /// Close after a failed exchange; the stream position is unknown.
    async fn teardown(&mut self) {
        self.state = SessionState::Closed;
        self.buffer.clear();
        self.framing.reset();
        if let Some(mut transport) = self.transport.take() {
            match tokio::time::timeout(self.config.timeout, transport.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("close of {} after failure: {}", self.endpoint, e),
                Err(_) => debug!("close of {} after failure timed out", self.endpoint),
            }
        }
    }
}

impl<C: Connector> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("next_message_id", &self.next_message_id)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Drop for Session<C> {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!(
                "Session to {} dropped while {} - call close() to release the connection cleanly",
                self.endpoint, self.state
            );
        }
    }
}

/// Run `fut` under a deadline, giving up early if `cancel` fires.
async fn bounded<T>(
    cancel: &CancellationToken,
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = tokio::time::timeout(timeout, fut) => {
            result.map_err(|_| Error::Timeout(timeout))?
        }
    }
}
