//! In-memory transports and a scripted NETCONF peer for unit tests.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

use crate::error::{ConnectionError, Error, Result};
use crate::framing::{EndOfMessageFraming, Framing};
use crate::session::{Session, SessionConfig};
use crate::transport::{Connector, Credentials, Endpoint, Transport};

pub(crate) const SERVER_HELLO: &str = "<hello xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\">\
<capabilities><capability>urn:ietf:params:netconf:base:1.0</capability></capabilities>\
<session-id>42</session-id></hello>";

/// How the fake device behaves.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PeerBehavior {
    /// Answer the hello, echo every RPC body back as `<rpc>{body}</rpc>`.
    Echo,
    /// Like `Echo` but wait before answering each RPC.
    SlowEcho(Duration),
    /// Connection refused.
    Unreachable,
    /// Authentication rejected.
    BadCredentials,
    /// Read everything, answer nothing.
    Silent,
    /// Answer the hello, then close the stream.
    HangUpAfterHello,
}

#[derive(Debug, Default)]
struct Counters {
    connects: AtomicUsize,
    closes: AtomicUsize,
    open: AtomicUsize,
    max_open: AtomicUsize,
}

/// Connector whose transports talk to an in-process peer task.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnector {
    hosts: HashMap<String, PeerBehavior>,
    counters: Arc<Counters>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_host(mut self, host: &str, behavior: PeerBehavior) -> Self {
        self.hosts.insert(host.to_string(), behavior);
        self
    }

    pub(crate) fn session(&self, host: &str) -> Session<MockConnector> {
        self.session_with_config(host, SessionConfig::default())
    }

    pub(crate) fn session_with_config(
        &self,
        host: &str,
        config: SessionConfig,
    ) -> Session<MockConnector> {
        Session::new(
            Arc::new(self.clone()),
            Endpoint::new(host, 830),
            Arc::new(test_credentials()),
            config,
        )
    }

    pub(crate) fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    /// Most transports that were open at the same time.
    pub(crate) fn max_open(&self) -> usize {
        self.counters.max_open.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<MockTransport> {
        let behavior = self
            .hosts
            .get(&endpoint.host)
            .copied()
            .unwrap_or(PeerBehavior::Unreachable);

        match behavior {
            PeerBehavior::Unreachable => {
                return Err(ConnectionError::Dial {
                    endpoint: endpoint.clone(),
                    source: russh::Error::from(io::Error::new(
                        io::ErrorKind::ConnectionRefused,
                        "connection refused",
                    )),
                }
                .into());
            }
            PeerBehavior::BadCredentials => {
                return Err(ConnectionError::Authentication {
                    user: credentials.username().to_string(),
                    endpoint: endpoint.clone(),
                }
                .into());
            }
            _ => {}
        }

        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        let open = self.counters.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_open.fetch_max(open, Ordering::SeqCst);

        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(run_peer(server, behavior));

        Ok(MockTransport {
            io: client,
            counters: self.counters.clone(),
            closed: false,
        })
    }
}

/// Client end of an in-memory duplex pipe.
#[derive(Debug)]
pub(crate) struct MockTransport {
    io: DuplexStream,
    counters: Arc<Counters>,
    closed: bool,
}

impl Transport for MockTransport {
    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _ = self.io.shutdown().await;
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl AsyncRead for MockTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().io).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_shutdown(cx)
    }
}

/// Fake device: decodes frames and answers according to `behavior`.
async fn run_peer(mut io: DuplexStream, behavior: PeerBehavior) {
    let mut framing = EndOfMessageFraming::new();
    let mut buf = BytesMut::new();
    let mut hello_done = false;

    loop {
        let message = loop {
            match framing.decode(&mut buf) {
                Ok(Some(message)) => break message,
                Ok(None) => {}
                Err(_) => return,
            }
            match io.read_buf(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
        };

        let reply = if !hello_done {
            hello_done = true;
            SERVER_HELLO.to_string()
        } else {
            match behavior {
                PeerBehavior::HangUpAfterHello => return,
                PeerBehavior::SlowEcho(delay) => {
                    tokio::time::sleep(delay).await;
                    echo_rpc(&message)
                }
                _ => echo_rpc(&message),
            }
        };

        if let PeerBehavior::Silent = behavior {
            continue;
        }

        let mut out = BytesMut::new();
        if framing.encode(&reply, &mut out).is_err() || io.write_all(&out).await.is_err() {
            return;
        }
    }
}

/// `<rpc ...>{body}</rpc>` becomes `<rpc>{body}</rpc>`.
fn echo_rpc(message: &str) -> String {
    let body = message.split_once('>').map_or(message, |(_, rest)| rest);
    let body = body.strip_suffix("</rpc>").unwrap_or(body);
    format!("<rpc>{}</rpc>", body)
}

pub(crate) fn test_credentials() -> Credentials {
    Credentials::with_password("admin", "secret").unwrap()
}

/// Wraps a `tokio_test` mock stream as a transport.
pub(crate) struct Scripted(tokio_test::io::Mock);

impl Scripted {
    pub(crate) fn new(mock: tokio_test::io::Mock) -> Self {
        Self(mock)
    }
}

impl Transport for Scripted {
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl AsyncRead for Scripted {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_read(cx, buf)
    }
}

impl AsyncWrite for Scripted {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().0).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_shutdown(cx)
    }
}

/// Hands out one pre-built transport.
pub(crate) struct OnceConnector<T>(Mutex<Option<T>>);

impl<T: Transport + 'static> Connector for OnceConnector<T> {
    type Transport = T;

    async fn connect(&self, endpoint: &Endpoint, _credentials: &Credentials) -> Result<T> {
        let taken = self.0.lock().ok().and_then(|mut slot| slot.take());
        taken.ok_or_else(|| {
            Error::from(ConnectionError::Subsystem {
                endpoint: endpoint.clone(),
                reason: "transport already taken".to_string(),
            })
        })
    }
}

pub(crate) async fn scripted_session(transport: Scripted) -> Session<OnceConnector<Scripted>> {
    scripted_session_with_config(transport, SessionConfig::default()).await
}

pub(crate) async fn scripted_session_with_config(
    transport: Scripted,
    config: SessionConfig,
) -> Session<OnceConnector<Scripted>> {
    let connector = OnceConnector(Mutex::new(Some(transport)));
    let mut session = Session::new(
        Arc::new(connector),
        Endpoint::new("scripted", 830),
        Arc::new(test_credentials()),
        config,
    );
    session.connect().await.unwrap();
    session
}
