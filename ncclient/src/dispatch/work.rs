//! Units of dispatch work and their outcomes.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::session::Session;
use crate::transport::{Connector, Endpoint};

/// One endpoint's worth of work: a session that has not connected yet.
pub struct WorkItem<C: Connector> {
    session: Session<C>,
}

impl<C: Connector> WorkItem<C> {
    /// Wrap a disconnected session.
    pub fn new(session: Session<C>) -> Self {
        Self { session }
    }

    /// Endpoint the session will connect to.
    pub fn endpoint(&self) -> &Endpoint {
        self.session.endpoint()
    }

    /// Connect, exchange hellos, issue `rpc` and close.
    ///
    /// The transport is closed on every path before the result is built.
    pub async fn run(self, rpc: &str) -> WorkResult {
        let mut session = self.session;
        let start = Instant::now();

        let outcome = exchange(&mut session, rpc).await;
        if let Err(e) = session.close().await {
            warn!("closing session to {}: {}", session.endpoint(), e);
        }

        let elapsed = start.elapsed();
        match &outcome {
            Ok(_) => debug!("{} completed in {:?}", session.endpoint(), elapsed),
            Err(e) => debug!("{} failed after {:?}: {}", session.endpoint(), elapsed, e),
        }
        WorkResult::new(session.endpoint().clone(), outcome, elapsed)
    }
}

async fn exchange<C: Connector>(session: &mut Session<C>, rpc: &str) -> Result<String> {
    session.connect().await?;
    session.send_hello().await?;
    let reply = session.write_rpc(rpc).await?;
    Ok(reply.into_xml())
}

impl<C: Connector> fmt::Debug for WorkItem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("endpoint", self.endpoint())
            .finish()
    }
}

/// Outcome of one [`WorkItem`].
#[derive(Debug)]
pub struct WorkResult {
    /// Endpoint the work ran against.
    pub endpoint: Endpoint,

    /// Decoded RPC reply, or why there is none.
    pub outcome: Result<String>,

    /// Wall time spent on the endpoint.
    pub elapsed: Duration,
}

impl WorkResult {
    /// Create a result.
    pub fn new(endpoint: Endpoint, outcome: Result<String>, elapsed: Duration) -> Self {
        Self {
            endpoint,
            outcome,
            elapsed,
        }
    }

    /// Failed result that never ran.
    pub(crate) fn failed(endpoint: Endpoint, error: Error) -> Self {
        Self::new(endpoint, Err(error), Duration::ZERO)
    }

    /// Whether the RPC produced a reply.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Reply text on success.
    pub fn reply(&self) -> Option<&str> {
        self.outcome.as_ref().ok().map(String::as_str)
    }

    /// Error on failure.
    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }
}

impl fmt::Display for WorkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(reply) => write!(f, "{}: ok ({} bytes)", self.endpoint, reply.len()),
            Err(e) => write!(f, "{}: {}", self.endpoint, e),
        }
    }
}
