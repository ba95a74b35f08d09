//! # fable-remote: HTTP Client for the Fable Backend
//!
//! Typed access to the Fable REST API. Every endpoint method returns a
//! [`RemoteOutcome`], the three-way classification the sync layer consumes:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Response Normalization                             │
//! │                                                                         │
//! │  reqwest call                                                           │
//! │       │                                                                 │
//! │       ├── transport error (timeout, DNS, TLS, ...) ──► TransportFailure│
//! │       │                                                                 │
//! │       ├── HTTP non-2xx ──────────────────────────────► HttpError       │
//! │       │                        status + message extracted from body    │
//! │       │                                                                 │
//! │       └── HTTP 2xx ── JSON decode ─┬─ ok ────────────► Success(T)      │
//! │                                    └─ malformed body ► TransportFailure│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The client performs exactly one attempt per call. Retry decisions belong
//! to the caller (or the user pressing refresh), never to this layer.
//!
//! ## Module Organization
//! - [`outcome`] - [`RemoteOutcome`] and response normalization
//! - [`client`] - [`ApiClient`] and its endpoint methods

pub mod client;
pub mod outcome;

pub use client::{ApiClient, ApiConfig};
pub use outcome::{RemoteOutcome, TransportError, TransportKind};
