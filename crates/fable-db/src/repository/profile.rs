//! # Profile Repository
//!
//! Cache operations for user profiles. `clear` exists for sign-out, which
//! removes the signed-in user's cached profile without touching stories.

use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{watch_query, ChangeBus, Table};
use crate::error::DbResult;
use fable_core::UserProfile;

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: String,
    username: String,
    display_name: String,
    bio: String,
    stories_published: i64,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for UserProfile {
    fn from(r: ProfileRow) -> Self {
        UserProfile {
            id: r.id,
            username: r.username,
            display_name: r.display_name,
            bio: r.bio,
            stories_published: r.stories_published,
            updated_at: r.updated_at,
        }
    }
}

/// Repository for user profile cache operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
    bus: ChangeBus,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool, bus: ChangeBus) -> Self {
        ProfileRepository { pool, bus }
    }

    /// Cached profile by user id; `None` when not cached.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<UserProfile>> {
        get_inner(&self.pool, user_id).await
    }

    /// Live profile for one user.
    pub fn watch(&self, user_id: String) -> BoxStream<'static, DbResult<Option<UserProfile>>> {
        let pool = self.pool.clone();
        watch_query(&self.bus, &[Table::Profiles], move || {
            let pool = pool.clone();
            let user_id = user_id.clone();
            async move { get_inner(&pool, &user_id).await }
        })
    }

    /// Write-through target for profile fetches.
    pub async fn upsert(&self, profile: &UserProfile) -> DbResult<()> {
        debug!(user_id = %profile.id, "Caching user profile");

        sqlx::query(
            "INSERT INTO user_profiles (id, username, display_name, bio, \
                                        stories_published, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                username = excluded.username, \
                display_name = excluded.display_name, \
                bio = excluded.bio, \
                stories_published = excluded.stories_published, \
                updated_at = excluded.updated_at",
        )
        .bind(&profile.id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.bio)
        .bind(profile.stories_published)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        self.bus.notify(Table::Profiles);
        Ok(())
    }

    /// Removes one cached profile. Used on sign-out.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, "Clearing cached profile");

        sqlx::query("DELETE FROM user_profiles WHERE id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.bus.notify(Table::Profiles);
        Ok(())
    }
}

async fn get_inner(pool: &SqlitePool, user_id: &str) -> DbResult<Option<UserProfile>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, username, display_name, bio, stories_published, updated_at \
         FROM user_profiles WHERE id = ?1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(UserProfile::from))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use futures_util::StreamExt;
    use uuid::Uuid;

    fn make_profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4().to_string(),
            username: "storysmith".to_string(),
            display_name: "Story Smith".to_string(),
            bio: "I write forks.".to_string(),
            stories_published: 3,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_get_clear() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let profile = make_profile();

        assert!(db.profiles().get(&profile.id).await.unwrap().is_none());

        db.profiles().upsert(&profile).await.unwrap();
        let loaded = db.profiles().get(&profile.id).await.unwrap().unwrap();
        assert_eq!(loaded.username, "storysmith");

        db.profiles().clear(&profile.id).await.unwrap();
        assert!(db.profiles().get(&profile.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_watch_sees_upsert_and_clear() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let profile = make_profile();
        let mut stream = db.profiles().watch(profile.id.clone());

        assert!(stream.next().await.unwrap().unwrap().is_none());

        db.profiles().upsert(&profile).await.unwrap();
        let loaded = stream.next().await.unwrap().unwrap().unwrap();
        assert_eq!(loaded.id, profile.id);

        db.profiles().clear(&profile.id).await.unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_none());
    }
}
