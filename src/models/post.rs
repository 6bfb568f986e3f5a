use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tag;

/// A journal post as returned by the remote API.
///
/// `created_at` is the logical day the post belongs to on the calendar.
/// It is editable independently of when the record was actually created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    /// Rich text (HTML), possibly with embedded data-URI images.
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// One page of a paginated post listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_pages: i64,
}

/// Payload for creating or updating a post. Tags are referenced by name;
/// the API resolves them to existing tag records.
#[derive(Debug, Clone, Serialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
