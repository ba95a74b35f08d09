//! # Unified Result
//!
//! The three-state value every data stream emits. Consumers render these
//! directly: Loading shows a spinner (or a refresh bar over existing
//! content), Success shows data, Failure shows an error - with the cached
//! value still attached so the screen never has to go blank.

use crate::error::DataError;

/// One emission of a data stream.
#[derive(Debug, Clone, PartialEq)]
pub enum UnifiedResult<T> {
    /// A network refresh is in flight.
    Loading,

    /// Current data, from cache or fresh from a write-through.
    Success(T),

    /// Something failed; `cached` carries whatever data was already
    /// available so consumers can keep showing it.
    Failure {
        error: DataError,
        cached: Option<T>,
    },
}

impl<T> UnifiedResult<T> {
    /// The data in this emission, if any: the success value or the cached
    /// value attached to a failure.
    pub fn data(&self) -> Option<&T> {
        match self {
            UnifiedResult::Loading => None,
            UnifiedResult::Success(value) => Some(value),
            UnifiedResult::Failure { cached, .. } => cached.as_ref(),
        }
    }

    /// The error in this emission, if any.
    pub fn error(&self) -> Option<&DataError> {
        match self {
            UnifiedResult::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, UnifiedResult::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UnifiedResult::Success(_))
    }

    /// Maps the data type, carrying the cached value along on failures.
    pub fn map<U>(self, f: impl Fn(T) -> U) -> UnifiedResult<U> {
        match self {
            UnifiedResult::Loading => UnifiedResult::Loading,
            UnifiedResult::Success(value) => UnifiedResult::Success(f(value)),
            UnifiedResult::Failure { error, cached } => UnifiedResult::Failure {
                error,
                cached: cached.map(f),
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_accessor() {
        assert_eq!(UnifiedResult::<i64>::Loading.data(), None);
        assert_eq!(UnifiedResult::Success(5).data(), Some(&5));

        let failure = UnifiedResult::Failure {
            error: DataError::MissingData,
            cached: Some(3),
        };
        assert_eq!(failure.data(), Some(&3));
        assert_eq!(failure.error(), Some(&DataError::MissingData));
    }

    #[test]
    fn test_map_carries_cached_through_failure() {
        let failure = UnifiedResult::Failure {
            error: DataError::Transport("offline".to_string()),
            cached: Some(2),
        };
        assert_eq!(
            failure.map(|n| n * 10),
            UnifiedResult::Failure {
                error: DataError::Transport("offline".to_string()),
                cached: Some(20),
            }
        );
    }
}
