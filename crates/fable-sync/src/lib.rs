//! # fable-sync: Cache-Then-Network Synchronization
//!
//! The engine that turns "a cache table, a refresh policy, and a network
//! fetch" into one observable stream of [`UnifiedResult`] values.
//!
//! ## The Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncFlow Lifecycle                               │
//! │                                                                         │
//! │  1. Preflight        fail ──► Failure, END (cache & network untouched) │
//! │       │ ok                                                              │
//! │       ▼                                                                 │
//! │  2. Subscribe to the cache's live query; its replay is the snapshot    │
//! │       │                                                                 │
//! │       ├── snapshot Some(cached) ──► emit Success(cached)               │
//! │       ▼                                                                 │
//! │  3. Refresh decision (policy over the snapshot + freshness + force)    │
//! │       │                                                                 │
//! │       ├── no refresh ──► jump to 5                                     │
//! │       ▼ refresh                                                         │
//! │  4. emit Loading, run fetch (fetch writes through the cache BEFORE     │
//! │     returning Ok; the write fires the live query)                      │
//! │       │                                                                 │
//! │       ├── Err ──► emit Failure { error, cached }                       │
//! │       ▼                                                                 │
//! │  5. Forward live emissions until the consumer drops the stream:        │
//! │       Some(v) ──► check, transform, merge ──► Success, or Failure      │
//! │                   with the tick's data when the fetch failed           │
//! │       None   ──► Failure { null-data error, cached: None }             │
//! │       Err    ──► Failure { database error }, END                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stream never ends on a fetch failure; the consumer keeps observing
//! the cache and can trigger a fresh flow to retry. Two concurrent flows
//! over the same resource fetch twice by design; the transactional
//! write-through makes the duplicate harmless.
//!
//! ## Module Organization
//! - [`error`] - [`DataError`], the unified error taxonomy
//! - [`result`] - [`UnifiedResult`], the three-state consumer value
//! - [`policy`] - [`RefreshPolicy`], age-based refresh decisions
//! - [`engine`] - [`SyncFlow`], the engine itself

pub mod engine;
pub mod error;
pub mod policy;
pub mod result;

pub use engine::SyncFlow;
pub use error::{DataError, DataResult, OutcomeExt};
pub use policy::RefreshPolicy;
pub use result::UnifiedResult;
