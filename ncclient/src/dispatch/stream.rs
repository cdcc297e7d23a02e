//! Arrival-order stream of dispatch results.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::work::WorkResult;

/// Results of a dispatch, in completion order.
///
/// Yields exactly one [`WorkResult`] per submitted endpoint, then `None`.
#[derive(Debug)]
pub struct ResultStream {
    results: mpsc::Receiver<WorkResult>,
    expected: usize,
    received: usize,
    cancel: CancellationToken,
}

impl ResultStream {
    pub(crate) fn new(
        results: mpsc::Receiver<WorkResult>,
        expected: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            results,
            expected,
            received: 0,
            cancel,
        }
    }

    /// Cancel the queued and in-flight sessions of this run only.
    ///
    /// Every endpoint still yields a result.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the next result to complete.
    pub async fn next(&mut self) -> Option<WorkResult> {
        if self.received == self.expected {
            return None;
        }
        let result = self.results.recv().await?;
        self.received += 1;
        Some(result)
    }

    /// Results not yet delivered.
    pub fn remaining(&self) -> usize {
        self.expected - self.received
    }

    /// Total number of results this stream will deliver.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Drain every remaining result.
    pub async fn collect_all(mut self) -> Vec<WorkResult> {
        let mut all = Vec::with_capacity(self.remaining());
        while let Some(result) = self.next().await {
            all.push(result);
        }
        all
    }
}

impl Stream for ResultStream {
    type Item = WorkResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<WorkResult>> {
        let this = self.get_mut();
        if this.received == this.expected {
            return Poll::Ready(None);
        }
        match this.results.poll_recv(cx) {
            Poll::Ready(Some(result)) => {
                this.received += 1;
                Poll::Ready(Some(result))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (0, Some(remaining))
    }
}
