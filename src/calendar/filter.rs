use std::collections::HashSet;

use crate::models::Post;

/// The set of tag ids the calendar is currently narrowed to.
///
/// Matching is by id, never by name: identically named tags under
/// different tag types must not collide. An empty filter matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    selected: HashSet<i64>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            selected: ids.into_iter().collect(),
        }
    }

    /// Flip membership of a tag id.
    pub fn toggle(&mut self, tag_id: i64) {
        if !self.selected.insert(tag_id) {
            self.selected.remove(&tag_id);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_active(&self, tag_id: i64) -> bool {
        self.selected.contains(&tag_id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether a post passes the filter: its tag set intersects the
    /// selection, or no selection is active.
    pub fn matches(&self, post: &Post) -> bool {
        self.is_empty() || post.tags.iter().any(|tag| self.selected.contains(&tag.id))
    }
}
