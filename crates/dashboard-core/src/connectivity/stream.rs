// ── Connectivity subscriptions ──

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::ConnectivityState;

/// A subscription to online/offline transitions.
///
/// Only flips are delivered; the monitor never republishes an unchanged
/// state. Dropping the subscription unsubscribes.
pub struct ConnectivityStream {
    receiver: watch::Receiver<Option<ConnectivityState>>,
}

impl ConnectivityStream {
    pub(crate) fn new(receiver: watch::Receiver<Option<ConnectivityState>>) -> Self {
        Self { receiver }
    }

    /// The latest published state, `None` before the first reading.
    pub fn latest(&self) -> Option<ConnectivityState> {
        *self.receiver.borrow()
    }

    /// Whether a flip was published since the last `changed()`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Mark the current value as seen without waiting.
    pub fn mark_seen(&mut self) {
        self.receiver.mark_unchanged();
    }

    /// Wait for the next flip. Returns `None` once the monitor is dropped.
    pub async fn changed(&mut self) -> Option<ConnectivityState> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(state) = *self.receiver.borrow_and_update() {
                return Some(state);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> ConnectivityWatchStream {
        ConnectivityWatchStream {
            inner: WatchStream::from_changes(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each connectivity flip.
pub struct ConnectivityWatchStream {
    inner: WatchStream<Option<ConnectivityState>>,
}

impl Stream for ConnectivityWatchStream {
    type Item = ConnectivityState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Some(state))) => return Poll::Ready(Some(state)),
                Poll::Ready(Some(None)) => {}
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
