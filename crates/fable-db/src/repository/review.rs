//! # Review Repository
//!
//! Cache operations for story reviews.
//!
//! Reviews reference their story row (`ON DELETE CASCADE`), so the review
//! write-through for a story presumes the story itself is already cached.
//! The detail flow upserts the story before its reviews, which preserves
//! that ordering.

use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{watch_query, ChangeBus, Table};
use crate::error::DbResult;
use fable_core::Review;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: String,
    story_id: String,
    reviewer_id: String,
    reviewer_name: String,
    rating: i64,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Review {
            id: r.id,
            story_id: r.story_id,
            reviewer_id: r.reviewer_id,
            reviewer_name: r.reviewer_name,
            rating: r.rating as u8,
            body: r.body,
            created_at: r.created_at,
        }
    }
}

/// Repository for review cache operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
    bus: ChangeBus,
}

impl ReviewRepository {
    /// Creates a new ReviewRepository.
    pub fn new(pool: SqlitePool, bus: ChangeBus) -> Self {
        ReviewRepository { pool, bus }
    }

    /// Reviews for one story, newest first.
    pub async fn list_for_story(&self, story_id: &str) -> DbResult<Vec<Review>> {
        list_inner(&self.pool, story_id).await
    }

    /// One-shot snapshot; `None` when no reviews are cached.
    pub async fn snapshot_for_story(&self, story_id: &str) -> DbResult<Option<Vec<Review>>> {
        let rows = list_inner(&self.pool, story_id).await?;
        Ok(if rows.is_empty() { None } else { Some(rows) })
    }

    /// Live reviews for one story.
    pub fn watch_for_story(
        &self,
        story_id: String,
    ) -> BoxStream<'static, DbResult<Option<Vec<Review>>>> {
        let pool = self.pool.clone();
        watch_query(&self.bus, &[Table::Reviews], move || {
            let pool = pool.clone();
            let story_id = story_id.clone();
            async move {
                let rows = list_inner(&pool, &story_id).await?;
                Ok(if rows.is_empty() { None } else { Some(rows) })
            }
        })
    }

    /// Replaces the cached review set for a story with the fetched one.
    ///
    /// Write-through target for review list fetches. Unlike summaries this
    /// DOES prune: the backend's review list is authoritative per story.
    pub async fn replace_for_story(&self, story_id: &str, reviews: &[Review]) -> DbResult<()> {
        debug!(story_id = %story_id, count = reviews.len(), "Refreshing cached reviews");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reviews WHERE story_id = ?1")
            .bind(story_id)
            .execute(&mut *tx)
            .await?;

        for review in reviews {
            insert_inner(&mut tx, review).await?;
        }

        tx.commit().await?;

        self.bus.notify(Table::Reviews);
        Ok(())
    }

    /// Inserts one review, as returned by the backend after a submit.
    pub async fn insert(&self, review: &Review) -> DbResult<()> {
        debug!(story_id = %review.story_id, review_id = %review.id, "Caching submitted review");

        let mut tx = self.pool.begin().await?;
        insert_inner(&mut tx, review).await?;
        tx.commit().await?;

        self.bus.notify(Table::Reviews);
        Ok(())
    }
}

async fn list_inner(pool: &SqlitePool, story_id: &str) -> DbResult<Vec<Review>> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, story_id, reviewer_id, reviewer_name, rating, body, created_at \
         FROM reviews WHERE story_id = ?1 ORDER BY created_at DESC",
    )
    .bind(story_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Review::from).collect())
}

async fn insert_inner(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    review: &Review,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO reviews (id, story_id, reviewer_id, reviewer_name, rating, body, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT(id) DO UPDATE SET \
            rating = excluded.rating, \
            body = excluded.body",
    )
    .bind(&review.id)
    .bind(&review.story_id)
    .bind(&review.reviewer_id)
    .bind(&review.reviewer_name)
    .bind(review.rating as i64)
    .bind(&review.body)
    .bind(review.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use fable_core::StoryDetail;
    use futures_util::StreamExt;
    use uuid::Uuid;

    fn make_review(story_id: &str, rating: u8) -> Review {
        Review {
            id: Uuid::new_v4().to_string(),
            story_id: story_id.to_string(),
            reviewer_id: Uuid::new_v4().to_string(),
            reviewer_name: "reader".to_string(),
            rating,
            body: "gripping".to_string(),
            created_at: Utc::now(),
        }
    }

    async fn db_with_story() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let detail = StoryDetail::sample();
        db.stories().upsert_detail(&detail).await.unwrap();
        (db, detail.story.id)
    }

    #[tokio::test]
    async fn test_replace_and_list() {
        let (db, story_id) = db_with_story().await;

        let reviews = vec![make_review(&story_id, 5), make_review(&story_id, 3)];
        db.reviews()
            .replace_for_story(&story_id, &reviews)
            .await
            .unwrap();

        let listed = db.reviews().list_for_story(&story_id).await.unwrap();
        assert_eq!(listed.len(), 2);

        // A second replace prunes rows absent from the new set.
        db.reviews()
            .replace_for_story(&story_id, &reviews[..1])
            .await
            .unwrap();
        let listed = db.reviews().list_for_story(&story_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].rating, 5);
    }

    #[tokio::test]
    async fn test_snapshot_none_when_empty() {
        let (db, story_id) = db_with_story().await;
        assert!(db
            .reviews()
            .snapshot_for_story(&story_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_watch_sees_inserted_review() {
        let (db, story_id) = db_with_story().await;
        let mut stream = db.reviews().watch_for_story(story_id.clone());

        assert!(stream.next().await.unwrap().unwrap().is_none());

        db.reviews()
            .insert(&make_review(&story_id, 4))
            .await
            .unwrap();

        let snapshot = stream.next().await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].rating, 4);
    }
}
