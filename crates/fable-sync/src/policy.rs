//! # Refresh Policy
//!
//! Pure age-based decision: should a flow hit the network this time?
//!
//! The policy never blocks reads. A stale cache is still emitted
//! immediately; the policy only decides whether a fetch follows.

use chrono::{DateTime, Duration, Utc};

/// Default maximum cache age before a resource is considered stale.
pub const DEFAULT_MAX_AGE_MINUTES: i64 = 5;

/// Age-based refresh policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Cached data older than this triggers a refresh.
    pub max_age: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        RefreshPolicy {
            max_age: Duration::minutes(DEFAULT_MAX_AGE_MINUTES),
        }
    }
}

impl RefreshPolicy {
    /// A policy with a custom maximum age.
    pub fn with_max_age(max_age: Duration) -> Self {
        RefreshPolicy { max_age }
    }

    /// Decides whether to refresh.
    ///
    /// Refreshes when any of these hold:
    /// - the caller forced it (pull-to-refresh),
    /// - there is no cached data to show,
    /// - the resource has never been successfully refreshed,
    /// - the last successful refresh is older than `max_age`.
    pub fn should_refresh(
        &self,
        now: DateTime<Utc>,
        last_refreshed: Option<DateTime<Utc>>,
        force: bool,
        has_data: bool,
    ) -> bool {
        if force || !has_data {
            return true;
        }
        match last_refreshed {
            None => true,
            Some(at) => now - at >= self.max_age,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RefreshPolicy {
        RefreshPolicy::default()
    }

    #[test]
    fn test_force_always_refreshes() {
        let now = Utc::now();
        assert!(policy().should_refresh(now, Some(now), true, true));
    }

    #[test]
    fn test_missing_data_always_refreshes() {
        let now = Utc::now();
        // Even a just-touched freshness record cannot excuse an empty cache.
        assert!(policy().should_refresh(now, Some(now), false, false));
    }

    #[test]
    fn test_never_refreshed_refreshes() {
        assert!(policy().should_refresh(Utc::now(), None, false, true));
    }

    #[test]
    fn test_fresh_data_skips_refresh() {
        let now = Utc::now();
        let recent = now - Duration::minutes(1);
        assert!(!policy().should_refresh(now, Some(recent), false, true));
    }

    #[test]
    fn test_stale_data_refreshes() {
        let now = Utc::now();
        let old = now - Duration::minutes(DEFAULT_MAX_AGE_MINUTES + 1);
        assert!(policy().should_refresh(now, Some(old), false, true));
    }

    #[test]
    fn test_exact_boundary_refreshes() {
        let now = Utc::now();
        let at_boundary = now - Duration::minutes(DEFAULT_MAX_AGE_MINUTES);
        assert!(policy().should_refresh(now, Some(at_boundary), false, true));
    }
}
