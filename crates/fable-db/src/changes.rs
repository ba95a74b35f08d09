//! # Change Bus and Live Queries
//!
//! The mechanism that turns the SQLite cache into an observable store.
//!
//! ## How Live Queries Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Live Query Architecture                            │
//! │                                                                         │
//! │  Repository write (inside transaction)                                 │
//! │       │ commit                                                          │
//! │       ▼                                                                 │
//! │  ChangeBus::notify(Table::Stories)   ← broadcast to all subscribers    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  watch_query task (one per live query)                                 │
//! │       │                                                                 │
//! │       ├── on subscribe: run query once, emit current snapshot          │
//! │       ├── on relevant change event: re-run query, emit new snapshot    │
//! │       ├── on irrelevant change event: ignore                           │
//! │       └── on query error: emit the error and stop (terminal)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mpsc channel → ReceiverStream handed to the caller                    │
//! │                                                                         │
//! │  Dropping the stream closes the channel; the task notices the failed   │
//! │  send and exits. Cooperative cancellation, no leaked tasks.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications are table-granular, not row-granular. A watcher may re-run
//! its query for a change that did not affect its rows; it will emit an
//! identical snapshot, which downstream consumers tolerate.

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::future::Future;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace};

use crate::error::{DbError, DbResult};

/// Buffer size for the broadcast channel. Watchers that fall this far
/// behind get a Lagged error and simply re-query.
const CHANGE_BUS_CAPACITY: usize = 64;

/// Buffer size for each live query's output channel.
const WATCH_CHANNEL_CAPACITY: usize = 8;

// =============================================================================
// Change Events
// =============================================================================

/// Tables a live query can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// stories, story_tags, tags
    Stories,
    /// story_pages, page_choices
    Pages,
    /// reviews
    Reviews,
    /// user_profiles
    Profiles,
}

/// A committed write to one logical table group.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent {
    pub table: Table,
}

// =============================================================================
// Change Bus
// =============================================================================

/// Broadcast channel connecting repository writes to live queries.
///
/// Cloning is cheap; all clones share one underlying channel.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    /// Creates a new change bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_BUS_CAPACITY);
        ChangeBus { tx }
    }

    /// Announces a committed write. Called by repositories after the
    /// transaction commits, never before.
    pub fn notify(&self, table: Table) {
        trace!(?table, "cache change");
        // Send fails only when there are no subscribers; that's fine.
        let _ = self.tx.send(ChangeEvent { table });
    }

    /// Subscribes to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Live Query Runner
// =============================================================================

/// Turns a snapshot query into a live stream.
///
/// The returned stream:
/// 1. emits the current snapshot immediately on subscribe,
/// 2. re-queries and emits whenever one of `tables` changes,
/// 3. emits a single `Err` and ends if the query fails.
///
/// The subscription to the change bus is taken *before* the initial query
/// so no committed write between the two can be missed.
pub(crate) fn watch_query<T, F, Fut>(
    bus: &ChangeBus,
    tables: &'static [Table],
    query: F,
) -> BoxStream<'static, Result<Option<T>, DbError>>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = DbResult<Option<T>>> + Send + 'static,
{
    let mut changes = bus.subscribe();
    let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        // Initial snapshot: the replay that makes subscribe-then-read safe.
        match query().await {
            Ok(snapshot) => {
                if tx.send(Ok(snapshot)).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                debug!(error = %err, "live query failed on initial read");
                let _ = tx.send(Err(err)).await;
                return;
            }
        }

        loop {
            match changes.recv().await {
                Ok(event) if tables.contains(&event.table) => {
                    match query().await {
                        Ok(snapshot) => {
                            if tx.send(Ok(snapshot)).await.is_err() {
                                return;
                            }
                        }
                        Err(err) => {
                            debug!(error = %err, "live query failed on re-read");
                            let _ = tx.send(Err(err)).await;
                            return;
                        }
                    }
                }
                Ok(_) => continue,
                // Missed events; the current snapshot covers them all.
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, "live query lagged behind change bus");
                    match query().await {
                        Ok(snapshot) => {
                            if tx.send(Ok(snapshot)).await.is_err() {
                                return;
                            }
                        }
                        Err(err) => {
                            let _ = tx.send(Err(err)).await;
                            return;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    ReceiverStream::new(rx).boxed()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_watch_emits_snapshot_then_changes() {
        let bus = ChangeBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let query_calls = calls.clone();
        let mut stream = watch_query(&bus, &[Table::Stories], move || {
            let n = query_calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(Some(n)) }
        });

        // Initial snapshot arrives without any notification.
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, Some(0));

        // Irrelevant table change is ignored.
        bus.notify(Table::Reviews);
        // Relevant change triggers a re-query.
        bus.notify(Table::Stories);

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_watch_error_is_terminal() {
        let bus = ChangeBus::new();
        let mut stream = watch_query::<i64, _, _>(&bus, &[Table::Stories], || async {
            Err(DbError::QueryFailed("boom".to_string()))
        });

        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_task() {
        let bus = ChangeBus::new();
        let stream = watch_query(&bus, &[Table::Stories], || async { Ok(Some(1)) });
        drop(stream);

        // Notifying after drop must not panic or leak; give the task a tick.
        bus.notify(Table::Stories);
        let _ = timeout(Duration::from_millis(20), tokio::task::yield_now()).await;
    }
}
