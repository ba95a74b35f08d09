//! # Domain Types
//!
//! Core domain types for the branching-story platform.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StorySummary   │   │     Story       │   │   StoryDetail   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  list item      │   │  full record    │   │  Story          │       │
//! │  │  title, tags    │   │  + description  │   │  + Vec<Page>    │       │
//! │  │  avg rating     │   │  + status       │   │  (cache unit)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StoryPage     │   │   PageChoice    │   │     Review      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  graph node     │   │  graph edge     │   │  rating 1..=5   │       │
//! │  │  body, is_start │   │  label, target  │   │  body           │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Story Graph
//! A story is a directed graph: pages are nodes, choices are edges. A choice
//! whose `target_page_id` is `None` is a dangling edge the author has not
//! wired yet - legal in drafts, rejected at publish time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Story Status
// =============================================================================

/// Lifecycle status of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Only visible to the author; graph may be incomplete.
    #[default]
    Draft,
    /// Publicly listed and readable.
    Published,
    /// Hidden from browse, still readable via direct link.
    Archived,
}

impl StoryStatus {
    /// Returns true if the story shows up in public browse results.
    pub fn is_public(&self) -> bool {
        matches!(self, StoryStatus::Published)
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoryStatus::Draft => write!(f, "draft"),
            StoryStatus::Published => write!(f, "published"),
            StoryStatus::Archived => write!(f, "archived"),
        }
    }
}

// =============================================================================
// Story Summary
// =============================================================================

/// A story as shown in browse/search lists.
///
/// Summaries are what list endpoints return and what the summaries cache
/// table stores; the full page graph is only fetched per story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Story title shown in lists.
    pub title: String,

    /// One-line teaser under the title.
    pub tagline: String,

    /// Author's user id.
    pub author_id: String,

    /// Author's display name (denormalized for list rendering).
    pub author_name: String,

    /// Lifecycle status.
    pub status: StoryStatus,

    /// Tag names attached to the story.
    pub tags: Vec<String>,

    /// Number of pages in the story graph.
    pub page_count: i64,

    /// Average review rating, if any reviews exist.
    pub average_rating: Option<f64>,

    /// When the story was last updated on the backend.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Story
// =============================================================================

/// A full story record (without its page graph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Story title.
    pub title: String,

    /// One-line teaser.
    pub tagline: String,

    /// Long-form description shown on the story page.
    pub description: String,

    /// Author's user id.
    pub author_id: String,

    /// Author's display name.
    pub author_name: String,

    /// Lifecycle status.
    pub status: StoryStatus,

    /// Number of pages in the story graph.
    pub page_count: i64,

    /// Average review rating, if any reviews exist.
    pub average_rating: Option<f64>,

    /// When the story was created.
    pub created_at: DateTime<Utc>,

    /// When the story was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Collapses the story into its list representation.
    pub fn summary(&self, tags: Vec<String>) -> StorySummary {
        StorySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            tagline: self.tagline.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            status: self.status,
            tags,
            page_count: self.page_count,
            average_rating: self.average_rating,
            updated_at: self.updated_at,
        }
    }
}

// =============================================================================
// Story Detail (cache unit)
// =============================================================================

/// A story together with its ordered page graph and tags.
///
/// This is the unit of transactional cache writes: a successful fetch of a
/// story persists the story row, its tags, its pages, and their choices as
/// one transaction so readers never observe a half-written graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDetail {
    pub story: Story,
    pub tags: Vec<String>,
    pub pages: Vec<StoryPage>,
}

impl StoryDetail {
    /// Returns the start page, if exactly one is marked.
    pub fn start_page(&self) -> Option<&StoryPage> {
        let mut starts = self.pages.iter().filter(|p| p.is_start);
        let first = starts.next()?;
        if starts.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Looks up a page by id.
    pub fn page(&self, id: &str) -> Option<&StoryPage> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// A minimal valid two-page story, used in doc examples and tests.
    pub fn sample() -> Self {
        let story_id = Uuid::new_v4().to_string();
        let start_id = Uuid::new_v4().to_string();
        let end_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        StoryDetail {
            story: Story {
                id: story_id.clone(),
                title: "The Fork in the Road".to_string(),
                tagline: "Every path has a price".to_string(),
                description: "A short branching tale.".to_string(),
                author_id: Uuid::new_v4().to_string(),
                author_name: "sample-author".to_string(),
                status: StoryStatus::Draft,
                page_count: 2,
                average_rating: None,
                created_at: now,
                updated_at: now,
            },
            tags: vec!["sample".to_string()],
            pages: vec![
                StoryPage {
                    id: start_id.clone(),
                    story_id: story_id.clone(),
                    position: 0,
                    title: "The Road".to_string(),
                    body: "You stand at a fork in the road.".to_string(),
                    is_start: true,
                    choices: vec![PageChoice {
                        id: Uuid::new_v4().to_string(),
                        page_id: start_id,
                        position: 0,
                        label: "Take the left path".to_string(),
                        target_page_id: Some(end_id.clone()),
                    }],
                },
                StoryPage {
                    id: end_id.clone(),
                    story_id,
                    position: 1,
                    title: "The End".to_string(),
                    body: "The path ends at the sea.".to_string(),
                    is_start: false,
                    choices: vec![],
                },
            ],
        }
    }
}

// =============================================================================
// Story Page (graph node)
// =============================================================================

/// A single page of a story: one node of the story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPage {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Story this page belongs to.
    pub story_id: String,

    /// Stable ordering for the editor's page list.
    pub position: i64,

    /// Optional page heading.
    pub title: String,

    /// Narrative text of the page.
    pub body: String,

    /// Whether this is the entry point of the story.
    pub is_start: bool,

    /// Choices leading away from this page, in display order.
    pub choices: Vec<PageChoice>,
}

impl StoryPage {
    /// A page with no outgoing choices is an ending.
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }
}

// =============================================================================
// Page Choice (graph edge)
// =============================================================================

/// A choice on a page: one directed edge of the story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageChoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Page this choice is shown on.
    pub page_id: String,

    /// Display order within the page.
    pub position: i64,

    /// Text shown on the choice button.
    pub label: String,

    /// Destination page. `None` while the author has not wired the choice
    /// yet; must be `Some` and resolve within the story to publish.
    pub target_page_id: Option<String>,
}

// =============================================================================
// Review
// =============================================================================

/// A reader's review of a published story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Story being reviewed.
    pub story_id: String,

    /// Reviewer's user id.
    pub reviewer_id: String,

    /// Reviewer's display name (denormalized for rendering).
    pub reviewer_name: String,

    /// Star rating, 1 to 5 inclusive.
    pub rating: u8,

    /// Free-form review text, possibly empty.
    pub body: String,

    /// When the review was posted.
    pub created_at: DateTime<Utc>,
}

/// Payload for posting a new review; the backend assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub story_id: String,
    pub rating: u8,
    pub body: String,
}

// =============================================================================
// User Profile
// =============================================================================

/// A platform user's public profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Login/handle, unique on the platform.
    pub username: String,

    /// Name shown in the UI.
    pub display_name: String,

    /// Short biography, possibly empty.
    pub bio: String,

    /// Number of published stories.
    pub stories_published: i64,

    /// When the profile was last updated on the backend.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Tag
// =============================================================================

/// A browsable story tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_story_has_single_start() {
        let detail = StoryDetail::sample();
        let start = detail.start_page().unwrap();
        assert!(start.is_start);
        assert_eq!(detail.pages.len(), 2);
    }

    #[test]
    fn test_ending_page_detection() {
        let detail = StoryDetail::sample();
        assert!(!detail.pages[0].is_ending());
        assert!(detail.pages[1].is_ending());
    }

    #[test]
    fn test_story_summary_projection() {
        let detail = StoryDetail::sample();
        let summary = detail.story.summary(detail.tags.clone());
        assert_eq!(summary.id, detail.story.id);
        assert_eq!(summary.tags, vec!["sample".to_string()]);
        assert_eq!(summary.page_count, 2);
    }

    #[test]
    fn test_status_serde_round_trip() {
        let json = serde_json::to_string(&StoryStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
    }
}
