//! # Story Use Cases
//!
//! Reading flows (browse, detail, own drafts) and author actions (save,
//! publish, delete). Every fetch persists the backend's response through
//! the cache before reporting success; the flow streams then observe the
//! cache, never the response directly.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::info;

use fable_core::validation::{validate_for_publish, validate_graph, validate_story_fields};
use fable_core::{StoryDetail, StorySummary};
use fable_db::{browse_key, drafts_key, story_key};
use fable_sync::{DataError, DataResult, OutcomeExt, SyncFlow, UnifiedResult};

use super::{into_data, refresh_decision};
use crate::container::AppContainer;

/// Rows fetched per browse page.
const BROWSE_LIMIT: u32 = 50;

// =============================================================================
// Reading Flows
// =============================================================================

/// Browse published stories, optionally filtered by a search term.
///
/// Search hits the local FTS index immediately; the refresh re-fetches the
/// backend list so new stories appear.
pub fn browse_stories(
    app: &AppContainer,
    search: Option<String>,
    force: bool,
) -> BoxStream<'static, UnifiedResult<Vec<StorySummary>>> {
    let live_db = app.db.clone();
    let live_search = search.clone();

    let db = app.db.clone();
    let api = app.api.clone();

    SyncFlow::new(
        move || {
            live_db
                .stories()
                .watch_summaries(live_search, BROWSE_LIMIT)
                .map(into_data)
                .boxed()
        },
        move || {
            Box::pin(async move {
                let summaries = api
                    .list_stories(search.as_deref(), BROWSE_LIMIT)
                    .await
                    .into_result()?;
                db.stories().replace_summaries(&summaries).await?;
                db.freshness().touch(&browse_key(), Utc::now()).await?;
                Ok(())
            })
        },
    )
    .refresh_when(refresh_decision(
        app.db.clone(),
        browse_key(),
        app.policy,
        force,
    ))
    .stream()
}

/// One story with its full page graph.
pub fn story_detail(
    app: &AppContainer,
    story_id: String,
    force: bool,
) -> BoxStream<'static, UnifiedResult<StoryDetail>> {
    let live_db = app.db.clone();
    let live_id = story_id.clone();

    let db = app.db.clone();
    let api = app.api.clone();
    let key = story_key(&story_id);
    let decision_key = key.clone();

    SyncFlow::new(
        move || live_db.stories().watch_detail(live_id).map(into_data).boxed(),
        move || {
            Box::pin(async move {
                let detail = api.get_story(&story_id).await.into_result()?;
                db.stories().upsert_detail(&detail).await?;
                db.freshness().touch(&key, Utc::now()).await?;
                Ok(())
            })
        },
    )
    .refresh_when(refresh_decision(
        app.db.clone(),
        decision_key,
        app.policy,
        force,
    ))
    .stream()
}

/// The signed-in author's own stories, drafts included.
///
/// Requires a session; a signed-out caller gets a single authentication
/// failure without any cache or network activity.
pub fn my_drafts(
    app: &AppContainer,
    force: bool,
) -> BoxStream<'static, UnifiedResult<Vec<StorySummary>>> {
    let account = app.session.require_account();
    let preflight_account = account.clone();

    let user_id = account
        .as_ref()
        .map(|a| a.user_id.clone())
        .unwrap_or_default();
    let token = account.as_ref().map(|a| a.token.clone()).unwrap_or_default();
    let key = drafts_key(&user_id);
    let decision_key = key.clone();

    let live_db = app.db.clone();
    let live_user = user_id;

    let db = app.db.clone();
    let api = app.api.clone();

    SyncFlow::new(
        move || {
            live_db
                .stories()
                .watch_by_author(live_user)
                .map(into_data)
                .boxed()
        },
        move || {
            Box::pin(async move {
                let summaries = api.my_stories(&token).await.into_result()?;
                db.stories().replace_summaries(&summaries).await?;
                db.freshness().touch(&key, Utc::now()).await?;
                Ok(())
            })
        },
    )
    .preflight(move || preflight_account.map(|_| ()))
    .refresh_when(refresh_decision(
        app.db.clone(),
        decision_key,
        app.policy,
        force,
    ))
    .stream()
}

// =============================================================================
// Author Actions
// =============================================================================

/// Saves a draft: validate locally, send, cache the canonical echo.
///
/// Draft validation tolerates unwired choices; only structural limits and
/// field bounds are enforced here.
pub async fn save_draft(app: &AppContainer, detail: &StoryDetail) -> DataResult<StoryDetail> {
    validate_story_fields(detail)?;
    validate_graph(detail)?;

    let account = app.session.require_account()?;
    let saved = app
        .api
        .upsert_story(&account.token, detail)
        .await
        .into_result()?;

    app.db.stories().upsert_detail(&saved).await?;
    app.db
        .freshness()
        .touch(&story_key(&saved.story.id), Utc::now())
        .await?;

    info!(story_id = %saved.story.id, "Draft saved");
    Ok(saved)
}

/// Publishes a story after full local validation.
///
/// The strict graph checks run against the cached aggregate before any
/// request is made, so a broken story never leaves the device. The backend
/// re-validates and its verdict wins.
pub async fn publish_story(app: &AppContainer, story_id: &str) -> DataResult<StoryDetail> {
    let cached = app
        .db
        .stories()
        .get_detail(story_id)
        .await?
        .ok_or(DataError::MissingData)?;
    validate_for_publish(&cached)?;

    let account = app.session.require_account()?;
    let published = app
        .api
        .publish_story(&account.token, story_id)
        .await
        .into_result()?;

    app.db.stories().upsert_detail(&published).await?;
    app.db
        .freshness()
        .touch(&story_key(story_id), Utc::now())
        .await?;

    info!(story_id = %story_id, "Story published");
    Ok(published)
}

/// Deletes a story on the backend, then locally.
///
/// Remote-first ordering: if the backend refuses, the local copy stays.
pub async fn delete_story(app: &AppContainer, story_id: &str) -> DataResult<()> {
    let account = app.session.require_account()?;
    app.api
        .delete_story(&account.token, story_id)
        .await
        .into_result()?;

    app.db.stories().delete(story_id).await?;
    app.db.freshness().invalidate(&story_key(story_id)).await?;

    info!(story_id = %story_id, "Story deleted");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fable_remote::{ApiClient, ApiConfig};

    fn unreachable_api() -> ApiClient {
        // Tests below must fail before any request is attempted.
        ApiClient::new(
            reqwest::Client::new(),
            ApiConfig::new(url::Url::parse("http://127.0.0.1:1/").unwrap()),
        )
    }

    #[tokio::test]
    async fn test_my_drafts_signed_out_fails_preflight() {
        let app = AppContainer::for_tests(unreachable_api()).await;

        let mut stream = my_drafts(&app, false);
        let first = stream.next().await.unwrap();
        assert!(matches!(
            first,
            UnifiedResult::Failure {
                error: DataError::Authentication { status: 401, .. },
                cached: None,
            }
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_save_draft_rejects_empty_title() {
        let app = AppContainer::for_tests(unreachable_api()).await;
        app.session.sign_in("user-1", "tok");

        let mut detail = StoryDetail::sample();
        detail.story.title = "   ".to_string();

        let err = save_draft(&app, &detail).await.unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[tokio::test]
    async fn test_save_draft_signed_out_is_auth_error() {
        let app = AppContainer::for_tests(unreachable_api()).await;
        let detail = StoryDetail::sample();

        let err = save_draft(&app, &detail).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_publish_requires_cached_story() {
        let app = AppContainer::for_tests(unreachable_api()).await;
        app.session.sign_in("user-1", "tok");

        let err = publish_story(&app, "no-such-story").await.unwrap_err();
        assert_eq!(err, DataError::MissingData);
    }

    #[tokio::test]
    async fn test_publish_rejects_unwired_choice() {
        let app = AppContainer::for_tests(unreachable_api()).await;
        app.session.sign_in("user-1", "tok");

        let mut detail = StoryDetail::sample();
        detail.pages[0].choices[0].target_page_id = None;
        app.db.stories().upsert_detail(&detail).await.unwrap();

        let err = publish_story(&app, &detail.story.id).await.unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_signed_out_leaves_cache() {
        let app = AppContainer::for_tests(unreachable_api()).await;
        let detail = StoryDetail::sample();
        app.db.stories().upsert_detail(&detail).await.unwrap();

        let err = delete_story(&app, &detail.story.id).await.unwrap_err();
        assert!(err.is_auth());
        assert!(app
            .db
            .stories()
            .get_detail(&detail.story.id)
            .await
            .unwrap()
            .is_some());
    }
}
