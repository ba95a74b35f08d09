//! # Repository Implementations
//!
//! One repository per aggregate. All writes go through these methods so the
//! [`ChangeBus`](crate::changes::ChangeBus) sees every committed change and
//! live queries stay truthful.
//!
//! - [`story`] - stories, tags, pages, choices (transactional aggregate)
//! - [`review`] - reviews per story
//! - [`profile`] - user profiles
//! - [`freshness`] - per-resource refresh bookkeeping

pub mod freshness;
pub mod profile;
pub mod review;
pub mod story;
