//! # Error Types
//!
//! Domain-specific error types for fable-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fable-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input and graph validation failures            │
//! │                                                                         │
//! │  fable-db errors (separate crate)                                      │
//! │  └── DbError          - Local cache store failures                     │
//! │                                                                         │
//! │  fable-sync errors (separate crate)                                    │
//! │  └── DataError        - Unified taxonomy the UI layer sees             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DataError::Validation → UI        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (story id, page id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// These represent business rule violations. They should be caught and
/// translated to user-friendly messages by the presentation layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Story cannot be found.
    #[error("Story not found: {0}")]
    StoryNotFound(String),

    /// Page referenced by id does not exist in the story.
    #[error("Page not found in story {story_id}: {page_id}")]
    PageNotFound { story_id: String, page_id: String },

    /// Operation not allowed for the story's current status.
    ///
    /// ## When This Occurs
    /// - Reviewing a draft
    /// - Editing an archived story
    /// - Publishing an already published story
    #[error("Story {story_id} is {current_status}, cannot perform operation")]
    InvalidStoryStatus {
        story_id: String,
        current_status: String,
    },

    /// Story exceeds the maximum page count.
    #[error("Story cannot have more than {max} pages")]
    TooManyPages { max: usize },

    /// Page exceeds the maximum choice count.
    #[error("Page {page_id} cannot have more than {max} choices")]
    TooManyChoices { page_id: String, max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input and story-graph validation errors.
///
/// These occur when user input doesn't meet requirements or when a story
/// graph fails structural checks. Used for early validation before anything
/// touches the cache or the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, bad username).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The story has no page marked as the start, or more than one.
    #[error("story must have exactly one start page, found {found}")]
    StartPageCount { found: usize },

    /// A choice points at a page that is not part of this story.
    #[error("choice '{label}' on page {page_id} targets unknown page {target}")]
    DanglingChoice {
        page_id: String,
        label: String,
        target: String,
    },

    /// A choice has no destination wired; only legal while drafting.
    #[error("choice '{label}' on page {page_id} has no destination")]
    UnwiredChoice { page_id: String, label: String },

    /// A page cannot be reached from the start page.
    #[error("page {page_id} is unreachable from the start page")]
    UnreachablePage { page_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
