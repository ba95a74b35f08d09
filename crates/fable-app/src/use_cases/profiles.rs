//! # Profile Use Cases

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use fable_core::UserProfile;
use fable_db::profile_key;
use fable_sync::{OutcomeExt, SyncFlow, UnifiedResult};

use super::{into_data, refresh_decision};
use crate::container::AppContainer;

/// One user's public profile.
pub fn user_profile(
    app: &AppContainer,
    user_id: String,
    force: bool,
) -> BoxStream<'static, UnifiedResult<UserProfile>> {
    let live_db = app.db.clone();
    let live_id = user_id.clone();

    let db = app.db.clone();
    let api = app.api.clone();
    let key = profile_key(&user_id);
    let decision_key = key.clone();

    SyncFlow::new(
        move || live_db.profiles().watch(live_id).map(into_data).boxed(),
        move || {
            Box::pin(async move {
                let profile = api.get_profile(&user_id).await.into_result()?;
                db.profiles().upsert(&profile).await?;
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

/// The signed-in user's own profile, when a session exists.
pub fn my_profile(
    app: &AppContainer,
    force: bool,
) -> Option<BoxStream<'static, UnifiedResult<UserProfile>>> {
    let user_id = app.session.user_id()?;
    Some(user_profile(app, user_id, force))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fable_remote::{ApiClient, ApiConfig};

    #[tokio::test]
    async fn test_my_profile_requires_session() {
        let api = ApiClient::new(
            reqwest::Client::new(),
            ApiConfig::new(url::Url::parse("http://127.0.0.1:1/").unwrap()),
        );
        let app = AppContainer::for_tests(api).await;

        assert!(my_profile(&app, false).is_none());

        app.session.sign_in("user-1", "tok");
        assert!(my_profile(&app, false).is_some());
    }
}
