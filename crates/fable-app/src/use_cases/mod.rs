//! # Use Cases
//!
//! One function per user-facing operation. Read paths return a
//! [`SyncFlow`](fable_sync::SyncFlow) stream; author actions are one-shot
//! async functions that validate locally, call the backend, and write the
//! canonical response through the cache before returning.
//!
//! - [`stories`] - browse, read, and author stories
//! - [`reviews`] - read and submit reviews
//! - [`profiles`] - user profiles

pub mod profiles;
pub mod reviews;
pub mod stories;

use chrono::Utc;
use futures_util::future::BoxFuture;

use fable_db::{Database, DbError};
use fable_sync::{DataError, DataResult, RefreshPolicy};

/// Maps a live-query item into the engine's error space.
fn into_data<T>(item: Result<Option<T>, DbError>) -> DataResult<Option<T>> {
    item.map_err(DataError::from)
}

/// Builds the standard refresh decision: policy over the freshness record
/// for `key`. A failed freshness read counts as "never refreshed" and so
/// refreshes.
fn refresh_decision<S: Send + 'static>(
    db: Database,
    key: String,
    policy: RefreshPolicy,
    force: bool,
) -> impl FnOnce(Option<S>) -> BoxFuture<'static, bool> + Send + 'static {
    move |snapshot| {
        let has_data = snapshot.is_some();
        Box::pin(async move {
            let last = db.freshness().last_refreshed(&key).await.ok().flatten();
            policy.should_refresh(Utc::now(), last, force, has_data)
        })
    }
}
