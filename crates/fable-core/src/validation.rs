//! # Validation Rules
//!
//! Pure validation for user input and the story graph.
//!
//! ## Two Levels of Strictness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Levels                                  │
//! │                                                                         │
//! │  validate_graph (draft save)                                           │
//! │  ──────────────────────────                                            │
//! │  • page/choice count limits                                            │
//! │  • choice targets, when wired, must resolve within the story           │
//! │  • unwired choices ALLOWED (author still editing)                      │
//! │                                                                         │
//! │  validate_for_publish (publish)                                        │
//! │  ──────────────────────────────                                        │
//! │  • everything validate_graph checks, plus:                             │
//! │  • exactly one start page                                              │
//! │  • no unwired choices                                                  │
//! │  • every page reachable from the start page                            │
//! │  • non-empty title and page bodies                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashSet, VecDeque};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{NewReview, StoryDetail};
use crate::{MAX_CHOICES_PER_PAGE, MAX_PAGES_PER_STORY, MAX_RATING, MIN_RATING};

/// Maximum story title length.
pub const MAX_TITLE_LEN: usize = 120;

/// Maximum tagline length.
pub const MAX_TAGLINE_LEN: usize = 200;

/// Username length bounds.
pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;

// =============================================================================
// Field Validation
// =============================================================================

/// Validates story title and tagline bounds.
pub fn validate_story_fields(detail: &StoryDetail) -> CoreResult<()> {
    let title = detail.story.title.trim();
    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        }
        .into());
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        }
        .into());
    }
    if detail.story.tagline.len() > MAX_TAGLINE_LEN {
        return Err(ValidationError::TooLong {
            field: "tagline".to_string(),
            max: MAX_TAGLINE_LEN,
        }
        .into());
    }
    Ok(())
}

/// Validates a review payload before it is sent to the backend.
pub fn validate_review(review: &NewReview) -> CoreResult<()> {
    if review.story_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "story_id".to_string(),
        }
        .into());
    }
    if review.rating < MIN_RATING || review.rating > MAX_RATING {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: MIN_RATING as i64,
            max: MAX_RATING as i64,
        }
        .into());
    }
    Ok(())
}

/// Validates a username: length bounds, ASCII letters/digits plus `-`/`_`.
pub fn validate_username(username: &str) -> CoreResult<()> {
    let name = username.trim();
    if name.len() < MIN_USERNAME_LEN {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: MIN_USERNAME_LEN,
        }
        .into());
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        }
        .into());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "only letters, digits, '-' and '_' are allowed".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Graph Validation
// =============================================================================

/// Structural checks that must hold even for drafts.
///
/// ## Checks
/// 1. Page count within [`MAX_PAGES_PER_STORY`]
/// 2. Choice count per page within [`MAX_CHOICES_PER_PAGE`]
/// 3. Every *wired* choice targets a page of this story
///
/// Unwired choices (`target_page_id == None`) are allowed here; the author
/// may still be editing.
pub fn validate_graph(detail: &StoryDetail) -> CoreResult<()> {
    if detail.pages.len() > MAX_PAGES_PER_STORY {
        return Err(CoreError::TooManyPages {
            max: MAX_PAGES_PER_STORY,
        });
    }

    let page_ids: HashSet<&str> = detail.pages.iter().map(|p| p.id.as_str()).collect();

    for page in &detail.pages {
        if page.choices.len() > MAX_CHOICES_PER_PAGE {
            return Err(CoreError::TooManyChoices {
                page_id: page.id.clone(),
                max: MAX_CHOICES_PER_PAGE,
            });
        }
        for choice in &page.choices {
            if let Some(target) = &choice.target_page_id {
                if !page_ids.contains(target.as_str()) {
                    return Err(ValidationError::DanglingChoice {
                        page_id: page.id.clone(),
                        label: choice.label.clone(),
                        target: target.clone(),
                    }
                    .into());
                }
            }
        }
    }

    Ok(())
}

/// Full publish-time validation.
///
/// ## Checks (in order)
/// 1. Field bounds ([`validate_story_fields`])
/// 2. Draft-level graph structure ([`validate_graph`])
/// 3. Exactly one start page
/// 4. No unwired choices
/// 5. Non-empty page bodies
/// 6. Every page reachable from the start page (BFS over choice edges)
pub fn validate_for_publish(detail: &StoryDetail) -> CoreResult<()> {
    validate_story_fields(detail)?;
    validate_graph(detail)?;

    let starts: Vec<&str> = detail
        .pages
        .iter()
        .filter(|p| p.is_start)
        .map(|p| p.id.as_str())
        .collect();
    if starts.len() != 1 {
        return Err(ValidationError::StartPageCount {
            found: starts.len(),
        }
        .into());
    }

    for page in &detail.pages {
        if page.body.trim().is_empty() {
            return Err(ValidationError::Required {
                field: format!("page {} body", page.id),
            }
            .into());
        }
        for choice in &page.choices {
            if choice.target_page_id.is_none() {
                return Err(ValidationError::UnwiredChoice {
                    page_id: page.id.clone(),
                    label: choice.label.clone(),
                }
                .into());
            }
        }
    }

    // BFS from the start page; anything not visited is unreachable.
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(starts[0]);
    queue.push_back(starts[0]);

    while let Some(page_id) = queue.pop_front() {
        if let Some(page) = detail.page(page_id) {
            for choice in &page.choices {
                if let Some(target) = &choice.target_page_id {
                    if visited.insert(target.as_str()) {
                        queue.push_back(target.as_str());
                    }
                }
            }
        }
    }

    for page in &detail.pages {
        if !visited.contains(page.id.as_str()) {
            return Err(ValidationError::UnreachablePage {
                page_id: page.id.clone(),
            }
            .into());
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageChoice, StoryPage};

    #[test]
    fn test_sample_story_publishes() {
        let detail = StoryDetail::sample();
        assert!(validate_for_publish(&detail).is_ok());
    }

    #[test]
    fn test_dangling_choice_rejected_even_in_draft() {
        let mut detail = StoryDetail::sample();
        detail.pages[0].choices[0].target_page_id = Some("no-such-page".to_string());

        let err = validate_graph(&detail).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DanglingChoice { .. })
        ));
    }

    #[test]
    fn test_unwired_choice_ok_in_draft_rejected_for_publish() {
        let mut detail = StoryDetail::sample();
        detail.pages[0].choices[0].target_page_id = None;

        assert!(validate_graph(&detail).is_ok());
        let err = validate_for_publish(&detail).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnwiredChoice { .. })
        ));
    }

    #[test]
    fn test_missing_start_page() {
        let mut detail = StoryDetail::sample();
        detail.pages[0].is_start = false;

        let err = validate_for_publish(&detail).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::StartPageCount { found: 0 })
        ));
    }

    #[test]
    fn test_unreachable_page() {
        let mut detail = StoryDetail::sample();
        let orphan_id = "orphan-page".to_string();
        detail.pages.push(StoryPage {
            id: orphan_id.clone(),
            story_id: detail.story.id.clone(),
            position: 2,
            title: String::new(),
            body: "Nobody ever reads this.".to_string(),
            is_start: false,
            choices: vec![],
        });

        let err = validate_for_publish(&detail).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnreachablePage { page_id }) if page_id == orphan_id
        ));
    }

    #[test]
    fn test_too_many_choices() {
        let mut detail = StoryDetail::sample();
        let page_id = detail.pages[0].id.clone();
        let target = detail.pages[1].id.clone();
        for i in 0..=MAX_CHOICES_PER_PAGE {
            detail.pages[0].choices.push(PageChoice {
                id: format!("c{i}"),
                page_id: page_id.clone(),
                position: i as i64 + 1,
                label: format!("choice {i}"),
                target_page_id: Some(target.clone()),
            });
        }

        let err = validate_graph(&detail).unwrap_err();
        assert!(matches!(err, CoreError::TooManyChoices { .. }));
    }

    #[test]
    fn test_review_rating_bounds() {
        let mut review = NewReview {
            story_id: "s1".to_string(),
            rating: 5,
            body: String::new(),
        };
        assert!(validate_review(&review).is_ok());

        review.rating = 0;
        assert!(validate_review(&review).is_err());

        review.rating = 6;
        assert!(validate_review(&review).is_err());
    }

    #[test]
    fn test_username_format() {
        assert!(validate_username("story_fan-42").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has spaces").is_err());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut detail = StoryDetail::sample();
        detail.story.title = "   ".to_string();
        assert!(validate_story_fields(&detail).is_err());
    }
}
