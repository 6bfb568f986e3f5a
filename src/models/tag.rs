use serde::{Deserialize, Serialize};

/// A named label attached to posts. Belongs to exactly one tag type,
/// which supplies its display color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub tag_type: TagTypeRef,
}

/// The tag type as embedded inside a `Tag` on the wire: name and color
/// only, no id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagTypeRef {
    pub name: String,
    pub color: String,
}

/// A full tag type record, as returned by the tag-type listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagType {
    pub id: i64,
    pub name: String,
    pub color: String,
}
