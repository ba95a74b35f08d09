//! # fable-core: Pure Domain Logic for Fable
//!
//! This crate is the **heart** of the Fable client. It contains the domain
//! model of the branching-story platform as plain types and pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Fable Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  fable-app (use cases, state)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌──────────────┐  ┌───────────▼──────────┐  ┌─────────────────────┐   │
//! │  │  fable-db    │  │     fable-sync       │  │    fable-remote     │   │
//! │  │  (SQLite)    │  │  (cache-then-network)│  │   (REST client)     │   │
//! │  └──────┬───────┘  └───────────┬──────────┘  └──────────┬──────────┘   │
//! │         │                      │                        │              │
//! │  ┌──────▼──────────────────────▼────────────────────────▼──────────┐   │
//! │  │                  ★ fable-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌─────────────┐  ┌───────────┐                │   │
//! │  │   │   types   │  │ validation  │  │   error   │                │   │
//! │  │   │  Story    │  │ story graph │  │ CoreError │                │   │
//! │  │   │  Page     │  │ field rules │  │ Validation│                │   │
//! │  │   └───────────┘  └─────────────┘  └───────────┘                │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Story, StoryPage, PageChoice, Review, ...)
//! - [`error`] - Domain error types
//! - [`validation`] - Story graph and field validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use fable_core::types::StoryDetail;
//! use fable_core::validation::validate_graph;
//!
//! let detail = StoryDetail::sample();
//! assert!(validate_graph(&detail).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use fable_core::Story` instead of
// `use fable_core::types::Story`

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum pages allowed in a single story.
///
/// ## Why a limit?
/// The editor renders the full graph; unbounded stories make both the
/// editor and the transactional cache write pathological. The backend
/// enforces the same limit.
pub const MAX_PAGES_PER_STORY: usize = 500;

/// Maximum choices on a single page.
pub const MAX_CHOICES_PER_PAGE: usize = 10;

/// Inclusive rating bounds for reviews.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
