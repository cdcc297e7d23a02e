//! Concurrent fan-out of one RPC across many devices.
//!
//! The dispatcher builds one [`WorkItem`] per endpoint and feeds them through
//! a bounded queue to a fixed pool of worker tasks. Each worker owns exactly
//! one session at a time, runs connect → hello → RPC → close, and publishes
//! exactly one [`WorkResult`] whatever happens. Results arrive in completion
//! order; each one names its endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ncclient::{Credentials, Dispatcher, Endpoint};
//!
//! # async fn example() -> Result<(), ncclient::Error> {
//! let dispatcher = Dispatcher::ssh(Default::default());
//! let credentials = Arc::new(Credentials::with_password("admin", "secret")?);
//! let endpoints: Vec<Endpoint> = vec!["10.0.0.1".parse()?, "10.0.0.2".parse()?];
//!
//! for result in dispatcher
//!     .dispatch(endpoints, credentials, "<get-chassis-inventory/>")
//!     .await
//! {
//!     match result.reply() {
//!         Some(xml) => println!("{}\n{}", result.endpoint, xml),
//!         None => println!("{}", result),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod stream;
mod work;

pub use stream::ResultStream;
pub use work::{WorkItem, WorkResult};

use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::session::{Session, SessionConfig};
use crate::transport::{Connector, Credentials, Endpoint, SshConnector, SshOptions};

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound on concurrently running sessions.
    pub max_workers: usize,

    /// Work items buffered ahead of the workers.
    pub queue_depth: usize,

    /// Settings for every session the dispatcher creates.
    pub session: SessionConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 16,
            queue_depth: 64,
            session: SessionConfig::default(),
        }
    }
}

impl DispatchConfig {
    /// Pool size for `jobs` work items: never more workers than jobs, never zero.
    pub fn worker_count(&self, jobs: usize) -> usize {
        self.max_workers.max(1).min(jobs.max(1))
    }
}

/// Runs one RPC against many endpoints concurrently.
pub struct Dispatcher<C: Connector = SshConnector> {
    connector: Arc<C>,
    config: DispatchConfig,
    cancel: CancellationToken,
}

impl Dispatcher<SshConnector> {
    /// Dispatcher over SSH with default pool settings.
    pub fn ssh(options: SshOptions) -> Self {
        Self::new(SshConnector::new(options), DispatchConfig::default())
    }
}

impl<C: Connector> Dispatcher<C> {
    /// Create a dispatcher.
    pub fn new(connector: C, config: DispatchConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Pool configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Cancel every queued and in-flight session.
    ///
    /// Cancelled work still produces a result ([`Error::Cancelled`]).
    /// Cancellation is terminal: every later dispatch on this dispatcher
    /// reports [`Error::Cancelled`] for all of its endpoints. Use
    /// [`ResultStream::cancel`] to stop a single run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by every session this dispatcher creates.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `rpc` against every endpoint and collect all results.
    ///
    /// The returned vector has one entry per endpoint, in completion order.
    pub async fn dispatch(
        &self,
        endpoints: impl IntoIterator<Item = Endpoint>,
        credentials: Arc<Credentials>,
        rpc: impl Into<String>,
    ) -> Vec<WorkResult> {
        self.dispatch_stream(endpoints, credentials, rpc)
            .collect_all()
            .await
    }

    /// Run `rpc` against every endpoint, streaming results as they complete.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch_stream(
        &self,
        endpoints: impl IntoIterator<Item = Endpoint>,
        credentials: Arc<Credentials>,
        rpc: impl Into<String>,
    ) -> ResultStream {
        let endpoints: Vec<Endpoint> = endpoints.into_iter().collect();
        let total = endpoints.len();
        let workers = self.config.worker_count(total);
        let rpc: Arc<str> = Arc::from(rpc.into());

        info!("dispatching to {} endpoints with {} workers", total, workers);

        let (job_tx, job_rx) = mpsc::channel::<WorkItem<C>>(self.config.queue_depth.max(1));
        let (result_tx, result_rx) = mpsc::channel::<WorkResult>(total.max(1));
        let job_rx = Arc::new(Mutex::new(job_rx));

        for id in 0..workers {
            tokio::spawn(worker(id, job_rx.clone(), result_tx.clone(), rpc.clone()));
        }

        let run = self.cancel.child_token();
        let connector = self.connector.clone();
        let config = self.config.session.clone();
        let cancel = run.clone();
        tokio::spawn(async move {
            for endpoint in endpoints {
                let session = Session::new(
                    connector.clone(),
                    endpoint,
                    credentials.clone(),
                    config.clone(),
                )
                .with_cancellation(cancel.child_token());

                // Blocks while the queue is full
                if let Err(mpsc::error::SendError(item)) = job_tx.send(WorkItem::new(session)).await
                {
                    let endpoint = item.endpoint().clone();
                    warn!("no worker left to run {}", endpoint);
                    let failed = WorkResult::failed(
                        endpoint,
                        Error::Worker {
                            message: "worker pool shut down".to_string(),
                        },
                    );
                    if result_tx.send(failed).await.is_err() {
                        return;
                    }
                }
            }
        });

        ResultStream::new(result_rx, total, run)
    }
}

/// Pull work items until the queue closes.
async fn worker<C: Connector>(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<WorkItem<C>>>>,
    results: mpsc::Sender<WorkResult>,
    rpc: Arc<str>,
) {
    loop {
        let item = jobs.lock().await.recv().await;
        let Some(item) = item else {
            break;
        };

        let endpoint = item.endpoint().clone();
        debug!("worker {} picked up {}", id, endpoint);

        // A panic inside the session must still yield a result
        let rpc = rpc.clone();
        let result = match tokio::spawn(async move { item.run(&rpc).await }).await {
            Ok(result) => result,
            Err(e) => {
                warn!("worker {} lost {}: {}", id, endpoint, e);
                WorkResult::failed(
                    endpoint,
                    Error::Worker {
                        message: e.to_string(),
                    },
                )
            }
        };

        if results.send(result).await.is_err() {
            debug!("worker {}: result stream dropped, stopping", id);
            break;
        }
    }
    debug!("worker {} finished", id);
}
