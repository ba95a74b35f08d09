//! # Story Repository
//!
//! Cache operations for stories, their tags, and their page graphs.
//!
//! ## Write-Through Aggregate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 upsert_detail (one transaction)                         │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    upsert stories row                                                  │
//! │    delete story_pages for story   (cascades to page_choices)           │
//! │    insert pages + choices                                              │
//! │    replace story_tags                                                  │
//! │  COMMIT                                                                │
//! │    notify(Stories) + notify(Pages)                                     │
//! │                                                                         │
//! │  Readers never observe a half-written graph: either the old story      │
//! │  or the new one, atomically.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Convention
//! Snapshot methods return `Option<_>`: `None` means "nothing cached yet",
//! which the sync engine treats differently from an empty-but-refreshed
//! result. List snapshots are `None` when zero rows match.

use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::changes::{watch_query, ChangeBus, Table};
use crate::error::DbResult;
use fable_core::{PageChoice, Story, StoryDetail, StoryPage, StoryStatus, StorySummary};

/// Default maximum rows for list queries.
const DEFAULT_LIST_LIMIT: u32 = 50;

/// Separator for the tag `group_concat` in summary queries. ASCII unit
/// separator, which cannot appear in a tag name, unlike the default comma.
const TAG_SEPARATOR: char = '\u{1f}';

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StoryRow {
    id: String,
    title: String,
    tagline: String,
    description: String,
    author_id: String,
    author_name: String,
    status: StoryStatus,
    page_count: i64,
    average_rating: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoryRow> for Story {
    fn from(r: StoryRow) -> Self {
        Story {
            id: r.id,
            title: r.title,
            tagline: r.tagline,
            description: r.description,
            author_id: r.author_id,
            author_name: r.author_name,
            status: r.status,
            page_count: r.page_count,
            average_rating: r.average_rating,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: String,
    title: String,
    tagline: String,
    author_id: String,
    author_name: String,
    status: StoryStatus,
    page_count: i64,
    average_rating: Option<f64>,
    updated_at: DateTime<Utc>,
    /// group_concat of tag names, NULL when the story has no tags.
    tags: Option<String>,
}

impl From<SummaryRow> for StorySummary {
    fn from(r: SummaryRow) -> Self {
        StorySummary {
            id: r.id,
            title: r.title,
            tagline: r.tagline,
            author_id: r.author_id,
            author_name: r.author_name,
            status: r.status,
            tags: r
                .tags
                .map(|t| t.split(TAG_SEPARATOR).map(str::to_string).collect())
                .unwrap_or_default(),
            page_count: r.page_count,
            average_rating: r.average_rating,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PageRow {
    id: String,
    story_id: String,
    position: i64,
    title: String,
    body: String,
    is_start: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ChoiceRow {
    id: String,
    page_id: String,
    position: i64,
    label: String,
    target_page_id: Option<String>,
}

/// Columns shared by every summary query.
const SUMMARY_SELECT: &str = "\
    SELECT s.id, s.title, s.tagline, s.author_id, s.author_name, s.status, \
           s.page_count, s.average_rating, s.updated_at, \
           (SELECT group_concat(t.name, char(31)) FROM story_tags st \
              JOIN tags t ON t.id = st.tag_id WHERE st.story_id = s.id) AS tags \
    FROM stories s";

// =============================================================================
// Repository
// =============================================================================

/// Repository for story cache operations.
#[derive(Debug, Clone)]
pub struct StoryRepository {
    pool: SqlitePool,
    bus: ChangeBus,
}

impl StoryRepository {
    /// Creates a new StoryRepository.
    pub fn new(pool: SqlitePool, bus: ChangeBus) -> Self {
        StoryRepository { pool, bus }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Searches cached story summaries.
    ///
    /// Empty/None query returns the most recently updated stories. Otherwise
    /// FTS5 prefix search over title, tagline, and author name, ranked by
    /// relevance.
    pub async fn search_summaries(
        &self,
        search: Option<&str>,
        limit: u32,
    ) -> DbResult<Vec<StorySummary>> {
        search_summaries_inner(&self.pool, search, limit).await
    }

    /// One-shot snapshot of search results; `None` when nothing matches.
    pub async fn snapshot_summaries(
        &self,
        search: Option<&str>,
        limit: u32,
    ) -> DbResult<Option<Vec<StorySummary>>> {
        let rows = search_summaries_inner(&self.pool, search, limit).await?;
        Ok(if rows.is_empty() { None } else { Some(rows) })
    }

    /// Stories by one author, most recently updated first.
    pub async fn list_by_author(&self, author_id: &str) -> DbResult<Vec<StorySummary>> {
        list_by_author_inner(&self.pool, author_id).await
    }

    /// Full story record without pages; `None` when not cached.
    pub async fn get_story(&self, id: &str) -> DbResult<Option<Story>> {
        let row = sqlx::query_as::<_, StoryRow>("SELECT * FROM stories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Story::from))
    }

    /// Full story aggregate (story + tags + pages + choices).
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<StoryDetail>> {
        get_detail_inner(&self.pool, id).await
    }

    // -------------------------------------------------------------------------
    // Live queries
    // -------------------------------------------------------------------------

    /// Live search results: current snapshot first, then on every change to
    /// the stories tables.
    pub fn watch_summaries(
        &self,
        search: Option<String>,
        limit: u32,
    ) -> BoxStream<'static, DbResult<Option<Vec<StorySummary>>>> {
        let pool = self.pool.clone();
        watch_query(&self.bus, &[Table::Stories], move || {
            let pool = pool.clone();
            let search = search.clone();
            async move {
                let rows = search_summaries_inner(&pool, search.as_deref(), limit).await?;
                Ok(if rows.is_empty() { None } else { Some(rows) })
            }
        })
    }

    /// Live list of one author's stories.
    pub fn watch_by_author(
        &self,
        author_id: String,
    ) -> BoxStream<'static, DbResult<Option<Vec<StorySummary>>>> {
        let pool = self.pool.clone();
        watch_query(&self.bus, &[Table::Stories], move || {
            let pool = pool.clone();
            let author_id = author_id.clone();
            async move {
                let rows = list_by_author_inner(&pool, &author_id).await?;
                Ok(if rows.is_empty() { None } else { Some(rows) })
            }
        })
    }

    /// Live story aggregate.
    pub fn watch_detail(&self, id: String) -> BoxStream<'static, DbResult<Option<StoryDetail>>> {
        let pool = self.pool.clone();
        watch_query(&self.bus, &[Table::Stories, Table::Pages], move || {
            let pool = pool.clone();
            let id = id.clone();
            async move { get_detail_inner(&pool, &id).await }
        })
    }

    // -------------------------------------------------------------------------
    // Writes (write-through targets)
    // -------------------------------------------------------------------------

    /// Upserts a full story aggregate in one transaction.
    ///
    /// This is the write-through target for story detail fetches and for
    /// saving drafts. `page_count` is derived from the pages written, not
    /// trusted from the input.
    pub async fn upsert_detail(&self, detail: &StoryDetail) -> DbResult<()> {
        debug!(story_id = %detail.story.id, pages = detail.pages.len(), "Upserting story detail");

        let mut tx = self.pool.begin().await?;

        upsert_story_row(&mut tx, &detail.story, detail.pages.len() as i64).await?;

        // Replace the page graph wholesale; choices cascade with their pages.
        sqlx::query("DELETE FROM story_pages WHERE story_id = ?1")
            .bind(&detail.story.id)
            .execute(&mut *tx)
            .await?;

        for page in &detail.pages {
            sqlx::query(
                "INSERT INTO story_pages (id, story_id, position, title, body, is_start) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&page.id)
            .bind(&detail.story.id)
            .bind(page.position)
            .bind(&page.title)
            .bind(&page.body)
            .bind(page.is_start)
            .execute(&mut *tx)
            .await?;

            for choice in &page.choices {
                sqlx::query(
                    "INSERT INTO page_choices (id, page_id, position, label, target_page_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .bind(&choice.id)
                .bind(&page.id)
                .bind(choice.position)
                .bind(&choice.label)
                .bind(&choice.target_page_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        replace_tags(&mut tx, &detail.story.id, &detail.tags).await?;

        tx.commit().await?;

        self.bus.notify(Table::Stories);
        self.bus.notify(Table::Pages);
        Ok(())
    }

    /// Upserts a batch of summaries in one transaction.
    ///
    /// This is the write-through target for list fetches. Existing detail
    /// rows (description, pages) are preserved; only summary fields and tags
    /// are refreshed. Stories absent from the batch are NOT pruned - cached
    /// rows die only through explicit user deletes.
    pub async fn replace_summaries(&self, summaries: &[StorySummary]) -> DbResult<()> {
        debug!(count = summaries.len(), "Refreshing story summaries");

        let mut tx = self.pool.begin().await?;

        for summary in summaries {
            sqlx::query(
                "INSERT INTO stories (id, title, tagline, description, author_id, author_name, \
                                      status, page_count, average_rating, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, '', ?4, ?5, ?6, ?7, ?8, ?9, ?9) \
                 ON CONFLICT(id) DO UPDATE SET \
                    title = excluded.title, \
                    tagline = excluded.tagline, \
                    author_id = excluded.author_id, \
                    author_name = excluded.author_name, \
                    status = excluded.status, \
                    page_count = excluded.page_count, \
                    average_rating = excluded.average_rating, \
                    updated_at = excluded.updated_at",
            )
            .bind(&summary.id)
            .bind(&summary.title)
            .bind(&summary.tagline)
            .bind(&summary.author_id)
            .bind(&summary.author_name)
            .bind(summary.status)
            .bind(summary.page_count)
            .bind(summary.average_rating)
            .bind(summary.updated_at)
            .execute(&mut *tx)
            .await?;

            replace_tags(&mut tx, &summary.id, &summary.tags).await?;
        }

        tx.commit().await?;

        self.bus.notify(Table::Stories);
        Ok(())
    }

    /// Deletes a story and, via cascade, its tags links, pages, choices and
    /// reviews. Explicit user action only.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(story_id = %id, "Deleting story from cache");

        sqlx::query("DELETE FROM stories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.bus.notify(Table::Stories);
        self.bus.notify(Table::Pages);
        self.bus.notify(Table::Reviews);
        Ok(())
    }
}

// =============================================================================
// Query Internals
// =============================================================================
// Free functions so live-query closures can run them without borrowing the
// repository.

async fn search_summaries_inner(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: u32,
) -> DbResult<Vec<StorySummary>> {
    let limit = if limit == 0 { DEFAULT_LIST_LIMIT } else { limit };
    let search = search.map(str::trim).filter(|s| !s.is_empty());

    let rows = match search {
        None => {
            sqlx::query_as::<_, SummaryRow>(&format!(
                "{SUMMARY_SELECT} ORDER BY s.updated_at DESC LIMIT ?1"
            ))
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        Some(q) => {
            // Quote each token and add a prefix star: `"fork"* "road"*`.
            // Quoting keeps FTS5 operators in user input inert.
            let fts_query: String = q
                .split_whitespace()
                .map(|token| format!("\"{}\"*", token.replace('"', "")))
                .collect::<Vec<_>>()
                .join(" ");

            sqlx::query_as::<_, SummaryRow>(&format!(
                "{SUMMARY_SELECT} \
                 JOIN stories_fts f ON s.rowid = f.rowid \
                 WHERE stories_fts MATCH ?1 \
                 ORDER BY rank LIMIT ?2"
            ))
            .bind(fts_query)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(StorySummary::from).collect())
}

async fn list_by_author_inner(pool: &SqlitePool, author_id: &str) -> DbResult<Vec<StorySummary>> {
    let rows = sqlx::query_as::<_, SummaryRow>(&format!(
        "{SUMMARY_SELECT} WHERE s.author_id = ?1 ORDER BY s.updated_at DESC"
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StorySummary::from).collect())
}

async fn get_detail_inner(pool: &SqlitePool, id: &str) -> DbResult<Option<StoryDetail>> {
    let story = sqlx::query_as::<_, StoryRow>("SELECT * FROM stories WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(story) = story else {
        return Ok(None);
    };

    let tags: Vec<String> = sqlx::query_scalar(
        "SELECT t.name FROM tags t \
         JOIN story_tags st ON st.tag_id = t.id \
         WHERE st.story_id = ?1 ORDER BY t.name",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let page_rows = sqlx::query_as::<_, PageRow>(
        "SELECT id, story_id, position, title, body, is_start \
         FROM story_pages WHERE story_id = ?1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let choice_rows = sqlx::query_as::<_, ChoiceRow>(
        "SELECT c.id, c.page_id, c.position, c.label, c.target_page_id \
         FROM page_choices c \
         JOIN story_pages p ON p.id = c.page_id \
         WHERE p.story_id = ?1 ORDER BY c.position",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut pages: Vec<StoryPage> = page_rows
        .into_iter()
        .map(|r| StoryPage {
            id: r.id,
            story_id: r.story_id,
            position: r.position,
            title: r.title,
            body: r.body,
            is_start: r.is_start,
            choices: Vec::new(),
        })
        .collect();

    for choice in choice_rows {
        if let Some(page) = pages.iter_mut().find(|p| p.id == choice.page_id) {
            page.choices.push(PageChoice {
                id: choice.id,
                page_id: choice.page_id,
                position: choice.position,
                label: choice.label,
                target_page_id: choice.target_page_id,
            });
        }
    }

    Ok(Some(StoryDetail {
        story: Story::from(story),
        tags,
        pages,
    }))
}

async fn upsert_story_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    story: &Story,
    page_count: i64,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO stories (id, title, tagline, description, author_id, author_name, \
                              status, page_count, average_rating, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
         ON CONFLICT(id) DO UPDATE SET \
            title = excluded.title, \
            tagline = excluded.tagline, \
            description = excluded.description, \
            author_id = excluded.author_id, \
            author_name = excluded.author_name, \
            status = excluded.status, \
            page_count = excluded.page_count, \
            average_rating = excluded.average_rating, \
            updated_at = excluded.updated_at",
    )
    .bind(&story.id)
    .bind(&story.title)
    .bind(&story.tagline)
    .bind(&story.description)
    .bind(&story.author_id)
    .bind(&story.author_name)
    .bind(story.status)
    .bind(page_count)
    .bind(story.average_rating)
    .bind(story.created_at)
    .bind(story.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn replace_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    story_id: &str,
    tags: &[String],
) -> DbResult<()> {
    sqlx::query("DELETE FROM story_tags WHERE story_id = ?1")
        .bind(story_id)
        .execute(&mut **tx)
        .await?;

    for name in tags {
        sqlx::query("INSERT INTO tags (id, name) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "INSERT INTO story_tags (story_id, tag_id) \
             SELECT ?1, id FROM tags WHERE name = ?2",
        )
        .bind(story_id)
        .bind(name)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use futures_util::StreamExt;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_get_detail() {
        let db = test_db().await;
        let detail = StoryDetail::sample();

        db.stories().upsert_detail(&detail).await.unwrap();

        let loaded = db
            .stories()
            .get_detail(&detail.story.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.story.id, detail.story.id);
        assert_eq!(loaded.story.title, detail.story.title);
        assert_eq!(loaded.tags, vec!["sample".to_string()]);
        assert_eq!(loaded.pages.len(), 2);
        assert_eq!(loaded.pages[0].choices.len(), 1);
        assert_eq!(
            loaded.pages[0].choices[0].target_page_id,
            detail.pages[0].choices[0].target_page_id
        );
        // page_count derived from written pages
        assert_eq!(loaded.story.page_count, 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_page_graph() {
        let db = test_db().await;
        let mut detail = StoryDetail::sample();
        db.stories().upsert_detail(&detail).await.unwrap();

        // Second version drops the ending page and its inbound choice.
        detail.pages[0].choices.clear();
        detail.pages.truncate(1);
        db.stories().upsert_detail(&detail).await.unwrap();

        let loaded = db
            .stories()
            .get_detail(&detail.story.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.pages.len(), 1);
        assert!(loaded.pages[0].choices.is_empty());
    }

    #[tokio::test]
    async fn test_replace_summaries_and_search() {
        let db = test_db().await;
        let detail = StoryDetail::sample();
        let summary = detail.story.summary(detail.tags.clone());

        db.stories().replace_summaries(&[summary]).await.unwrap();

        // Recency listing
        let all = db.stories().search_summaries(None, 10).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tags, vec!["sample".to_string()]);

        // FTS prefix search on the title
        let hits = db.stories().search_summaries(Some("fork"), 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, detail.story.id);

        let misses = db
            .stories()
            .search_summaries(Some("zeppelin"), 10)
            .await
            .unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_tags_with_commas_round_trip() {
        let db = test_db().await;
        let mut detail = StoryDetail::sample();
        detail.tags = vec!["swords, sorcery".to_string(), "mystery".to_string()];
        let summary = detail.story.summary(detail.tags.clone());

        db.stories().replace_summaries(&[summary]).await.unwrap();

        let all = db.stories().search_summaries(None, 10).await.unwrap();
        assert_eq!(all.len(), 1);
        let mut tags = all[0].tags.clone();
        tags.sort();
        assert_eq!(
            tags,
            vec!["mystery".to_string(), "swords, sorcery".to_string()]
        );
    }

    #[tokio::test]
    async fn test_snapshot_none_when_empty() {
        let db = test_db().await;
        let snap = db.stories().snapshot_summaries(None, 10).await.unwrap();
        assert!(snap.is_none());
    }

    #[tokio::test]
    async fn test_watch_detail_emits_on_write() {
        let db = test_db().await;
        let detail = StoryDetail::sample();

        let mut stream = db.stories().watch_detail(detail.story.id.clone());

        // Current snapshot: not cached yet.
        let first = stream.next().await.unwrap().unwrap();
        assert!(first.is_none());

        db.stories().upsert_detail(&detail).await.unwrap();

        // Write-through produced a new emission.
        let second = stream.next().await.unwrap().unwrap().unwrap();
        assert_eq!(second.story.id, detail.story.id);
        assert_eq!(second.pages.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = test_db().await;
        let detail = StoryDetail::sample();
        db.stories().upsert_detail(&detail).await.unwrap();

        db.stories().delete(&detail.story.id).await.unwrap();

        assert!(db
            .stories()
            .get_detail(&detail.story.id)
            .await
            .unwrap()
            .is_none());

        let orphan_pages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM story_pages")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphan_pages, 0);
    }

    #[tokio::test]
    async fn test_list_by_author() {
        let db = test_db().await;
        let detail = StoryDetail::sample();
        db.stories().upsert_detail(&detail).await.unwrap();

        let mine = db
            .stories()
            .list_by_author(&detail.story.author_id)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let theirs = db.stories().list_by_author("someone-else").await.unwrap();
        assert!(theirs.is_empty());
    }
}
