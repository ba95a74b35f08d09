//! # SyncFlow Engine
//!
//! One generic engine drives every screen's data: give it a live cache
//! query, a fetch that writes through the cache, and a refresh decision,
//! and it produces the [`UnifiedResult`] stream consumers render.
//!
//! ## Type Parameters
//! - `S` - what the cache emits (the stored snapshot type)
//! - `R` - what the fetch resolves to after persisting
//! - `T` - what consumers see (defaults to `S` via the identity transform)
//!
//! ## Ordering Contract
//! The emission order is fixed and observable:
//!
//! 1. Preflight runs first. On failure the flow emits one `Failure` and
//!    ends without subscribing to the cache or calling fetch.
//! 2. The live query's replay is consumed as the snapshot. A non-empty
//!    snapshot is transformed and emitted as `Success` before anything
//!    else happens (unless `emit_cached_first` is off).
//! 3. The refresh decision runs with the snapshot.
//! 4. On refresh: `Loading` is emitted, then fetch runs. Fetch MUST persist
//!    its result through the cache before resolving - the engine never
//!    renders the fetched value directly, only the live emission the
//!    write-through fires. A fetch error is emitted as `Failure` carrying
//!    the latest data, and stays captured for the rest of the run.
//! 5. Live emissions are forwarded until the consumer drops the stream.
//!    Per tick: absence becomes the configured null-data `Failure`; the
//!    post-fetch check can reject a tick (failure with cached data, the
//!    subscription survives); otherwise the value is transformed and merged
//!    with the fetched payload if one exists. The tick is emitted as
//!    `Success`, or as `Failure` carrying the tick's data when a fetch
//!    error was captured - consumers keep seeing current cache content
//!    alongside the standing network error. A live query error is a
//!    terminal `Failure`.
//!
//! ## What the Engine Does NOT Do
//! - No retries: one fetch per flow, failures surface immediately.
//! - No deduplication: two concurrent flows over the same resource fetch
//!   twice. The transactional write-through makes that harmless, and the
//!   second response simply wins.

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace};

use crate::error::{DataError, DataResult};
use crate::result::UnifiedResult;

/// Buffer size for the emission channel. A slow consumer backpressures the
/// flow task instead of dropping results.
const EMISSION_CHANNEL_CAPACITY: usize = 16;

type PreflightFn = Box<dyn FnOnce() -> DataResult<()> + Send>;
type RefreshFn<S> = Box<dyn FnOnce(Option<S>) -> BoxFuture<'static, bool> + Send>;
type FetchFn<R> = Box<dyn FnOnce() -> BoxFuture<'static, DataResult<R>> + Send>;
type LiveFn<S> = Box<dyn FnOnce() -> BoxStream<'static, DataResult<Option<S>>> + Send>;
type TransformFn<S, T> = Box<dyn Fn(S) -> T + Send>;
type MergeFn<T, R> = Box<dyn Fn(T, &R) -> T + Send>;
type PostFetchFn<S, R> = Box<dyn Fn(&S, Option<&R>) -> DataResult<()> + Send>;

/// A single cache-then-network flow.
///
/// ## Example
/// ```rust,ignore
/// let stream = SyncFlow::new(
///     || db.stories().watch_detail(id).map(|r| r.map_err(Into::into)).boxed(),
///     || async move { fetch_and_persist(api, db, id).await }.boxed(),
/// )
/// .refresh_when(move |snapshot| decide(freshness, policy, force, snapshot).boxed())
/// .stream();
/// ```
pub struct SyncFlow<S, R, T> {
    preflight: Option<PreflightFn>,
    local_source: LiveFn<S>,
    fetch: FetchFn<R>,
    should_refresh: RefreshFn<S>,
    local_transform: TransformFn<S, T>,
    merge: MergeFn<T, R>,
    post_fetch: PostFetchFn<S, R>,
    null_data_error: DataError,
    emit_cached_first: bool,
}

impl<S, R> SyncFlow<S, R, S>
where
    S: Clone + Send + 'static,
    R: Send + 'static,
{
    /// Creates a flow from a live cache query and a write-through fetch,
    /// with the identity transform (consumers see the stored type).
    ///
    /// Defaults: always refresh, no preflight, no merge, no post-fetch
    /// check, cached value emitted eagerly, absence reported as
    /// [`DataError::MissingData`].
    pub fn new<L, F>(local_source: L, fetch: F) -> Self
    where
        L: FnOnce() -> BoxStream<'static, DataResult<Option<S>>> + Send + 'static,
        F: FnOnce() -> BoxFuture<'static, DataResult<R>> + Send + 'static,
    {
        SyncFlow {
            preflight: None,
            local_source: Box::new(local_source),
            fetch: Box::new(fetch),
            should_refresh: Box::new(|_| Box::pin(futures_util::future::ready(true))),
            local_transform: Box::new(|s| s),
            merge: Box::new(|t, _| t),
            post_fetch: Box::new(|_, _| Ok(())),
            null_data_error: DataError::MissingData,
            emit_cached_first: true,
        }
    }
}

impl<S, R, T> SyncFlow<S, R, T>
where
    S: Clone + Send + 'static,
    R: Send + 'static,
    T: Clone + Send + 'static,
{
    /// Adds a check that runs before anything else. On `Err` the flow emits
    /// one `Failure` and ends without touching the cache or the network.
    pub fn preflight<P>(mut self, check: P) -> Self
    where
        P: FnOnce() -> DataResult<()> + Send + 'static,
    {
        self.preflight = Some(Box::new(check));
        self
    }

    /// Sets the refresh decision. Receives the cache snapshot and returns
    /// whether to fetch.
    pub fn refresh_when<F>(mut self, decide: F) -> Self
    where
        F: FnOnce(Option<S>) -> BoxFuture<'static, bool> + Send + 'static,
    {
        self.should_refresh = Box::new(decide);
        self
    }

    /// Maps stored values into the type consumers see. Resets any merge or
    /// post-fetch check configured so far, so call this first.
    pub fn local_transform<U, F>(self, transform: F) -> SyncFlow<S, R, U>
    where
        U: Clone + Send + 'static,
        F: Fn(S) -> U + Send + 'static,
    {
        SyncFlow {
            preflight: self.preflight,
            local_source: self.local_source,
            fetch: self.fetch,
            should_refresh: self.should_refresh,
            local_transform: Box::new(transform),
            merge: Box::new(|t, _| t),
            post_fetch: Box::new(|_, _| Ok(())),
            null_data_error: self.null_data_error,
            emit_cached_first: self.emit_cached_first,
        }
    }

    /// Combines each post-refresh value with the fetched payload before it
    /// is emitted. Only applies once a fetch has succeeded.
    pub fn merge<F>(mut self, merge: F) -> Self
    where
        F: Fn(T, &R) -> T + Send + 'static,
    {
        self.merge = Box::new(merge);
        self
    }

    /// Adds a per-tick check over the stored value and the fetched payload
    /// (if any). A failing check turns that tick into a `Failure` carrying
    /// the latest data; the subscription stays alive.
    pub fn post_fetch<F>(mut self, check: F) -> Self
    where
        F: Fn(&S, Option<&R>) -> DataResult<()> + Send + 'static,
    {
        self.post_fetch = Box::new(check);
        self
    }

    /// Sets the error emitted when the cache reports absence (`None`).
    pub fn null_data_error(mut self, error: DataError) -> Self {
        self.null_data_error = error;
        self
    }

    /// Controls the eager emission of the cached snapshot (on by default).
    pub fn emit_cached_first(mut self, emit: bool) -> Self {
        self.emit_cached_first = emit;
        self
    }

    /// Starts the flow and returns its emission stream.
    ///
    /// The flow runs on a spawned task; dropping the stream stops it at
    /// the next suspension point.
    pub fn stream(self) -> BoxStream<'static, UnifiedResult<T>> {
        let (tx, rx) = mpsc::channel(EMISSION_CHANNEL_CAPACITY);
        tokio::spawn(run(self, tx));
        ReceiverStream::new(rx).boxed()
    }
}

async fn run<S, R, T>(flow: SyncFlow<S, R, T>, tx: mpsc::Sender<UnifiedResult<T>>)
where
    S: Clone + Send + 'static,
    R: Send + 'static,
    T: Clone + Send + 'static,
{
    // Step 1: preflight, before any cache or network work.
    if let Some(check) = flow.preflight {
        if let Err(error) = check() {
            debug!(%error, "preflight failed");
            let _ = tx
                .send(UnifiedResult::Failure {
                    error,
                    cached: None,
                })
                .await;
            return;
        }
    }

    // Step 2: subscribe, then consume the replay as the snapshot. Because
    // the subscription exists before the snapshot is read, a write landing
    // in between is observed as a later emission instead of being lost.
    let mut live = (flow.local_source)();
    let snapshot = match live.next().await {
        Some(Ok(snapshot)) => snapshot,
        Some(Err(error)) => {
            let _ = tx
                .send(UnifiedResult::Failure {
                    error,
                    cached: None,
                })
                .await;
            return;
        }
        None => return,
    };

    let mut latest: Option<T> = snapshot.clone().map(|s| (flow.local_transform)(s));
    if flow.emit_cached_first {
        if let Some(cached) = latest.clone() {
            trace!("emitting cached snapshot");
            if tx.send(UnifiedResult::Success(cached)).await.is_err() {
                return;
            }
        }
    }

    // Step 3: policy decision over the snapshot.
    let refresh = (flow.should_refresh)(snapshot).await;

    // Step 4: fetch, bracketed by Loading. The fetched payload is kept only
    // for merge/post-fetch; the data consumers see always comes back out of
    // the cache. A fetch error is kept too and rides along with every later
    // tick.
    let mut fetched: Option<R> = None;
    let mut fetch_error: Option<DataError> = None;
    if refresh {
        if tx.send(UnifiedResult::Loading).await.is_err() {
            return;
        }

        match (flow.fetch)().await {
            Ok(payload) => {
                trace!("fetch succeeded");
                fetched = Some(payload);
            }
            Err(error) => {
                debug!(%error, "fetch failed");
                if tx
                    .send(UnifiedResult::Failure {
                        error: error.clone(),
                        cached: latest.clone(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
                fetch_error = Some(error);
            }
        }
    } else {
        trace!("refresh skipped by policy");
    }

    // Step 5: forward live emissions until the consumer drops the stream.
    while let Some(item) = live.next().await {
        let emission = match item {
            Ok(Some(value)) => {
                if let Err(error) = (flow.post_fetch)(&value, fetched.as_ref()) {
                    UnifiedResult::Failure {
                        error,
                        cached: latest.clone(),
                    }
                } else {
                    let mut transformed = (flow.local_transform)(value);
                    if let Some(payload) = &fetched {
                        transformed = (flow.merge)(transformed, payload);
                    }
                    latest = Some(transformed.clone());
                    match &fetch_error {
                        Some(error) => UnifiedResult::Failure {
                            error: error.clone(),
                            cached: Some(transformed),
                        },
                        None => UnifiedResult::Success(transformed),
                    }
                }
            }
            Ok(None) => {
                latest = None;
                UnifiedResult::Failure {
                    error: flow.null_data_error.clone(),
                    cached: None,
                }
            }
            Err(error) => {
                // Cache read failure is terminal for this flow.
                let _ = tx
                    .send(UnifiedResult::Failure {
                        error,
                        cached: latest,
                    })
                    .await;
                return;
            }
        };

        if tx.send(emission).await.is_err() {
            return;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
