//! # Screen State Reducer
//!
//! Folds a flow's [`UnifiedResult`] emissions into what a screen actually
//! renders. The guiding rule: once content is on screen, it never goes
//! blank. Refreshes become an inline indicator, failures become a banner
//! over the content that is still valid.
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current \ emission │ Loading        │ Success(v)  │ Failure           │
//! │  ───────────────────┼────────────────┼─────────────┼────────────────── │
//! │  Initial / Loading  │ Loading        │ Content(v)  │ Error (or Content │
//! │                     │                │             │  if cached came)  │
//! │  Content            │ Content        │ Content(v)  │ Content + banner  │
//! │                     │  + refreshing  │             │ (missing data ──► │
//! │                     │                │             │  Error)           │
//! │  Error              │ Loading        │ Content(v)  │ Error             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use fable_sync::{DataError, UnifiedResult};

/// What a screen renders.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState<T> {
    /// Nothing has happened yet.
    Initial,

    /// First load in flight, nothing to show.
    Loading,

    /// Data on screen.
    Content {
        data: T,
        /// A refresh is in flight; render an inline indicator.
        refreshing: bool,
        /// The last refresh failed; render a dismissible banner.
        banner: Option<DataError>,
    },

    /// Failed with nothing to show.
    Error(DataError),
}

impl<T: Clone> ScreenState<T> {
    /// Applies one flow emission.
    pub fn apply(self, result: UnifiedResult<T>) -> Self {
        match result {
            UnifiedResult::Loading => match self {
                ScreenState::Content { data, .. } => ScreenState::Content {
                    data,
                    refreshing: true,
                    banner: None,
                },
                _ => ScreenState::Loading,
            },

            UnifiedResult::Success(data) => ScreenState::Content {
                data,
                refreshing: false,
                banner: None,
            },

            UnifiedResult::Failure { error, cached } => match (cached, self) {
                // The flow handed us data alongside the error: show both.
                (Some(data), _) => ScreenState::Content {
                    data,
                    refreshing: false,
                    banner: Some(error),
                },
                // The data itself disappeared; content is no longer valid.
                (None, _) if error == DataError::MissingData => ScreenState::Error(error),
                // Keep whatever was on screen, banner the failure.
                (None, ScreenState::Content { data, .. }) => ScreenState::Content {
                    data,
                    refreshing: false,
                    banner: Some(error),
                },
                (None, _) => ScreenState::Error(error),
            },
        }
    }

    /// The data currently on screen, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            ScreenState::Content { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ScreenState::Loading
                | ScreenState::Content {
                    refreshing: true,
                    ..
                }
        )
    }
}

impl<T> Default for ScreenState<T> {
    fn default() -> Self {
        ScreenState::Initial
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> DataError {
        DataError::Transport("offline".to_string())
    }

    #[test]
    fn test_first_load_sequence() {
        let state = ScreenState::<i64>::Initial
            .apply(UnifiedResult::Loading)
            .apply(UnifiedResult::Success(1));
        assert_eq!(
            state,
            ScreenState::Content {
                data: 1,
                refreshing: false,
                banner: None,
            }
        );
    }

    #[test]
    fn test_refresh_keeps_content_on_screen() {
        let state = ScreenState::Content {
            data: 1,
            refreshing: false,
            banner: None,
        }
        .apply(UnifiedResult::Loading);

        assert_eq!(state.data(), Some(&1));
        assert!(state.is_loading());
    }

    #[test]
    fn test_failure_with_cache_becomes_banner() {
        let state = ScreenState::<i64>::Loading.apply(UnifiedResult::Failure {
            error: transport(),
            cached: Some(1),
        });

        assert_eq!(
            state,
            ScreenState::Content {
                data: 1,
                refreshing: false,
                banner: Some(transport()),
            }
        );
    }

    #[test]
    fn test_failure_without_cache_keeps_existing_content() {
        let state = ScreenState::Content {
            data: 1,
            refreshing: true,
            banner: None,
        }
        .apply(UnifiedResult::Failure {
            error: transport(),
            cached: None,
        });

        assert_eq!(state.data(), Some(&1));
        assert!(matches!(
            state,
            ScreenState::Content {
                banner: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_missing_data_clears_content() {
        let state = ScreenState::Content {
            data: 1,
            refreshing: false,
            banner: None,
        }
        .apply(UnifiedResult::Failure {
            error: DataError::MissingData,
            cached: None,
        });

        assert_eq!(state, ScreenState::Error(DataError::MissingData));
    }

    #[test]
    fn test_failure_with_nothing_is_error() {
        let state = ScreenState::<i64>::Loading.apply(UnifiedResult::Failure {
            error: transport(),
            cached: None,
        });
        assert_eq!(state, ScreenState::Error(transport()));
    }
}
