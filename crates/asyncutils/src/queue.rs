use futures::future::join_all;
use pin_project_lite::pin_project;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};

/// Concurrency-limited work queue.
///
/// Units of work are spawned immediately but each waits for one of `limit`
/// permits before running, so at most `limit` units execute at any moment
/// regardless of how many are queued. Cloning the queue shares the limit.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    permits: Arc<Semaphore>,
    limit: NonZeroUsize,
}

impl WorkQueue {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.get())),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Schedule a unit of work, returning a ticket that resolves once it has run.
    ///
    /// Units report their own outcome (through shared counters or channels);
    /// the ticket only signals completion.
    pub fn add<F>(&self, unit: F) -> Ticket
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only fails if it was.
            let Ok(_permit) = permits.acquire_owned().await else {
                tracing::error!("Work queue semaphore closed; dropping unit");
                return;
            };
            unit.await;
        });
        Ticket { handle }
    }

    /// Wait for every ticket to resolve.
    pub async fn join(tickets: impl IntoIterator<Item = Ticket>) {
        join_all(tickets).await;
    }
}

pin_project! {
    /// Completion handle for a unit added to a [`WorkQueue`].
    ///
    /// Resolves to `()` even when the unit panicked; the panic is logged
    /// rather than propagated so that one bad unit cannot abort a batch.
    #[must_use = "tickets do nothing unless awaited"]
    pub struct Ticket {
        #[pin]
        handle: JoinHandle<()>,
    }
}

impl Future for Ticket {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.handle.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(())) => Poll::Ready(()),
            Poll::Ready(Err(err)) => {
                log_join_error(&err);
                Poll::Ready(())
            },
        }
    }
}

fn log_join_error(err: &JoinError) {
    if err.is_panic() {
        tracing::error!(error = %err, "Queued unit panicked");
    } else {
        tracing::warn!(error = %err, "Queued unit was cancelled");
    }
}
