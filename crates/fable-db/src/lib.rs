//! # fable-db: Local Cache Store for Fable
//!
//! This crate provides the local cache for the Fable client.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fable Data Flow                                  │
//! │                                                                         │
//! │  Use case (browse_stories)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fable-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │  Repositories │   │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │   │  (story.rs)   │   │  (embedded)  │    │   │
//! │  │   │               │   │               │   │              │    │   │
//! │  │   │ SqlitePool    │◄──│ StoryRepo     │   │ 001_init.sql │    │   │
//! │  │   │ ChangeBus     │   │ ReviewRepo    │   │ 002_fts.sql  │    │   │
//! │  │   └───────┬───────┘   └───────────────┘   └──────────────┘    │   │
//! │  │           │                                                     │   │
//! │  │           ▼  every committed write notifies the ChangeBus      │   │
//! │  │   ┌───────────────────────────────────────────────────────┐    │   │
//! │  │   │  Live queries: emit current snapshot on subscribe,     │    │   │
//! │  │   │  re-query and re-emit on each relevant table change    │    │   │
//! │  │   └───────────────────────────────────────────────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache is the **single source of truth**: consumers never read network
//! results directly. The sync layer writes through this crate's transactional
//! methods and readers observe the store via its live-query streams.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`changes`] - Change bus and live-query streams
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (story, review, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fable_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/fable.db")).await?;
//!
//! // One-shot read
//! let detail = db.stories().get_detail("story-id").await?;
//!
//! // Live query: current snapshot first, then every change
//! let mut stream = db.stories().watch_detail("story-id".to_string());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod changes;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use changes::{ChangeBus, Table};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::freshness::{
    browse_key, drafts_key, profile_key, reviews_key, story_key, FreshnessRepository,
};
pub use repository::profile::ProfileRepository;
pub use repository::review::ReviewRepository;
pub use repository::story::StoryRepository;
