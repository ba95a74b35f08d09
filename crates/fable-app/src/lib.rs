//! # fable-app: Use Cases and State Holders
//!
//! The top layer of the Fable client. Everything a UI shell needs lives
//! here: the container that wires the stack together, session handling,
//! the use cases that start [`SyncFlow`](fable_sync::SyncFlow)s, and the
//! state holders that reduce flow emissions into renderable screen state.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          fable-app                                      │
//! │                                                                         │
//! │  AppConfig ──► AppContainer { Database, ApiClient, Session, Policy }   │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  use_cases: browse_stories, story_detail, my_drafts, save_draft, ...   │
//! │                      │ BoxStream<UnifiedResult<T>>                      │
//! │                      ▼                                                  │
//! │  state: ScreenState reducer + Observable<T> for UI shells              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`container`] - dependency wiring and tracing init
//! - [`session`] - signed-in account and token handling
//! - [`state`] - [`Observable`](state::Observable) and screen-state reducer
//! - [`use_cases`] - one function per user-facing operation
//! - [`error`] - app-level error type

pub mod config;
pub mod container;
pub mod error;
pub mod session;
pub mod state;
pub mod use_cases;

pub use config::AppConfig;
pub use container::AppContainer;
pub use error::{AppError, AppResult};
pub use session::Session;
