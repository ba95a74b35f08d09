//! # Review Use Cases
//!
//! Reading a story's reviews and submitting a new one. The submit path
//! caches the backend's echo (which carries the assigned id and timestamp)
//! so the reviews flow updates without a refetch.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::info;

use fable_core::validation::validate_review;
use fable_core::{NewReview, Review};
use fable_db::reviews_key;
use fable_sync::{DataResult, OutcomeExt, SyncFlow, UnifiedResult};

use super::{into_data, refresh_decision};
use crate::container::AppContainer;

/// Reviews for one story, newest first.
pub fn story_reviews(
    app: &AppContainer,
    story_id: String,
    force: bool,
) -> BoxStream<'static, UnifiedResult<Vec<Review>>> {
    let live_db = app.db.clone();
    let live_id = story_id.clone();

    let db = app.db.clone();
    let api = app.api.clone();
    let key = reviews_key(&story_id);
    let decision_key = key.clone();

    SyncFlow::new(
        move || {
            live_db
                .reviews()
                .watch_for_story(live_id)
                .map(into_data)
                .boxed()
        },
        move || {
            Box::pin(async move {
                let reviews = api.list_reviews(&story_id).await.into_result()?;
                db.reviews().replace_for_story(&story_id, &reviews).await?;
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

/// Submits a review: validate locally, send, cache the echo.
pub async fn submit_review(app: &AppContainer, review: &NewReview) -> DataResult<Review> {
    validate_review(review)?;

    let account = app.session.require_account()?;
    let saved = app
        .api
        .submit_review(&account.token, review)
        .await
        .into_result()?;

    app.db.reviews().insert(&saved).await?;

    info!(story_id = %saved.story_id, "Review submitted");
    Ok(saved)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fable_remote::{ApiClient, ApiConfig};
    use fable_sync::DataError;

    fn unreachable_api() -> ApiClient {
        ApiClient::new(
            reqwest::Client::new(),
            ApiConfig::new(url::Url::parse("http://127.0.0.1:1/").unwrap()),
        )
    }

    #[tokio::test]
    async fn test_submit_rejects_out_of_range_rating() {
        let app = AppContainer::for_tests(unreachable_api()).await;
        app.session.sign_in("user-1", "tok");

        let review = NewReview {
            story_id: "story-1".to_string(),
            rating: 6,
            body: String::new(),
        };

        let err = submit_review(&app, &review).await.unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_signed_out_is_auth_error() {
        let app = AppContainer::for_tests(unreachable_api()).await;

        let review = NewReview {
            story_id: "story-1".to_string(),
            rating: 4,
            body: "good".to_string(),
        };

        assert!(submit_review(&app, &review).await.unwrap_err().is_auth());
    }
}
