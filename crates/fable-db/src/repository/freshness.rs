//! # Freshness Repository
//!
//! Last-successful-refresh bookkeeping, read by the refresh policy.
//!
//! Keys are logical resource names:
//! - `stories:browse` - the public browse list
//! - `story:<id>` - one story's detail aggregate
//! - `reviews:<id>` - one story's review list
//! - `profile:<id>` - one user's profile
//! - `drafts:<id>` - one author's own story list
//!
//! This table is pure local bookkeeping, not a cache of remote state, so
//! touching it does not go through the change bus.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::trace;

use crate::error::DbResult;

/// Repository for cache freshness bookkeeping.
#[derive(Debug, Clone)]
pub struct FreshnessRepository {
    pool: SqlitePool,
}

impl FreshnessRepository {
    /// Creates a new FreshnessRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FreshnessRepository { pool }
    }

    /// When `key` was last successfully refreshed; `None` if never.
    pub async fn last_refreshed(&self, key: &str) -> DbResult<Option<DateTime<Utc>>> {
        let at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT refreshed_at FROM cache_freshness WHERE resource_key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(at)
    }

    /// Records a successful refresh of `key` at `when`.
    pub async fn touch(&self, key: &str, when: DateTime<Utc>) -> DbResult<()> {
        trace!(key, "touching cache freshness");

        sqlx::query(
            "INSERT INTO cache_freshness (resource_key, refreshed_at) VALUES (?1, ?2) \
             ON CONFLICT(resource_key) DO UPDATE SET refreshed_at = excluded.refreshed_at",
        )
        .bind(key)
        .bind(when)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Forgets a key, forcing the next policy check to refresh.
    pub async fn invalidate(&self, key: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM cache_freshness WHERE resource_key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Freshness key for the public browse list.
pub fn browse_key() -> String {
    "stories:browse".to_string()
}

/// Freshness key for one story's detail aggregate.
pub fn story_key(story_id: &str) -> String {
    format!("story:{story_id}")
}

/// Freshness key for one story's review list.
pub fn reviews_key(story_id: &str) -> String {
    format!("reviews:{story_id}")
}

/// Freshness key for one user's profile.
pub fn profile_key(user_id: &str) -> String {
    format!("profile:{user_id}")
}

/// Freshness key for one author's own story list.
pub fn drafts_key(user_id: &str) -> String {
    format!("drafts:{user_id}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    #[tokio::test]
    async fn test_touch_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let key = story_key("abc");

        assert!(db.freshness().last_refreshed(&key).await.unwrap().is_none());

        let at = Utc::now();
        db.freshness().touch(&key, at).await.unwrap();

        let read = db.freshness().last_refreshed(&key).await.unwrap().unwrap();
        // SQLite text timestamps keep sub-second precision via RFC 3339
        assert!((read - at).num_milliseconds().abs() < 1000);

        // Touch again with a later time wins.
        let later = at + Duration::minutes(10);
        db.freshness().touch(&key, later).await.unwrap();
        let read = db.freshness().last_refreshed(&key).await.unwrap().unwrap();
        assert!(read > at);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let key = browse_key();

        db.freshness().touch(&key, Utc::now()).await.unwrap();
        db.freshness().invalidate(&key).await.unwrap();
        assert!(db.freshness().last_refreshed(&key).await.unwrap().is_none());
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(browse_key(), "stories:browse");
        assert_eq!(story_key("x"), "story:x");
        assert_eq!(reviews_key("x"), "reviews:x");
        assert_eq!(profile_key("x"), "profile:x");
        assert_eq!(drafts_key("x"), "drafts:x");
    }
}
