//! # Session
//!
//! The signed-in account, shared across use cases. Token storage is an
//! opaque string here; obtaining one (OAuth, password, ...) is the shell's
//! concern.

use std::sync::{Arc, RwLock};
use tracing::info;

use fable_db::Database;
use fable_sync::{DataError, DataResult};

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: String,
    pub token: String,
}

/// Shared session state.
///
/// Cloning is cheap; all clones observe the same account.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<Account>>>,
}

impl Session {
    /// Creates an empty (signed-out) session.
    pub fn new() -> Self {
        Session::default()
    }

    /// Signs an account in, replacing any previous one.
    pub fn sign_in(&self, user_id: impl Into<String>, token: impl Into<String>) {
        let account = Account {
            user_id: user_id.into(),
            token: token.into(),
        };
        info!(user_id = %account.user_id, "Signed in");
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(account);
        }
    }

    /// Signs out and removes the account's cached profile.
    ///
    /// Story and review caches are left alone; they are public data.
    pub async fn sign_out(&self, db: &Database) -> DataResult<()> {
        let account = match self.inner.write() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };

        if let Some(account) = account {
            info!(user_id = %account.user_id, "Signed out");
            db.profiles().clear(&account.user_id).await?;
        }
        Ok(())
    }

    /// The signed-in user's id, if any.
    pub fn user_id(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|a| a.user_id.clone()))
    }

    /// The current bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|a| a.token.clone()))
    }

    /// The current account, or an authentication error for preflights.
    pub fn require_account(&self) -> DataResult<Account> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(DataError::Authentication {
                status: 401,
                message: "sign in required".to_string(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fable_core::UserProfile;
    use fable_db::DbConfig;

    #[test]
    fn test_require_account_when_signed_out() {
        let session = Session::new();
        let err = session.require_account().unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_sign_in_exposes_token() {
        let session = Session::new();
        session.sign_in("user-1", "tok");
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.user_id().as_deref(), Some("user-1"));
        assert!(session.require_account().is_ok());
    }

    #[tokio::test]
    async fn test_sign_out_clears_cached_profile() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = Session::new();
        session.sign_in("user-1", "tok");

        db.profiles()
            .upsert(&UserProfile {
                id: "user-1".to_string(),
                username: "me".to_string(),
                display_name: "Me".to_string(),
                bio: String::new(),
                stories_published: 0,
                updated_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        session.sign_out(&db).await.unwrap();

        assert!(session.token().is_none());
        assert!(db.profiles().get("user-1").await.unwrap().is_none());
    }
}
