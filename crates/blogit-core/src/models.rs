//! # Domain Models
//!
//! These structs represent the entities Blogit stores or references.
//! Identifiers are assigned by the storage adapter on insert.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tags::TagList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl PostId {
    /// Recovers the id from a URL parameter such as `"42-hello-world"`.
    pub fn from_param(param: &str) -> Option<Self> {
        let digits: String = param
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok().map(PostId)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Polymorphic reference to whoever wrote a post (User, Admin, ...).
///
/// The blogger record itself lives outside Blogit; `blogger_type` selects how
/// a `BloggerDirectory` resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BloggerRef {
    pub blogger_id: String,
    pub blogger_type: String,
}

impl BloggerRef {
    pub fn new(blogger_type: impl Into<String>, blogger_id: impl ToString) -> Self {
        Self {
            blogger_id: blogger_id.to_string(),
            blogger_type: blogger_type.into(),
        }
    }
}

/// A persisted blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub description: Option<String>,
    /// Lifecycle status; only active states are listed publicly.
    pub state: String,
    pub blogger: Option<BloggerRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a post. `tag_list` is handed to the `TagStore`
/// once the post has an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: String,
    #[serde(default)]
    pub blogger: Option<BloggerRef>,
    #[serde(default)]
    pub tag_list: TagList,
}

/// Partial update of a post. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub description: Option<Option<String>>,
    pub state: Option<String>,
    pub blogger: Option<Option<BloggerRef>>,
    pub tag_list: Option<TagList>,
}

impl PostChanges {
    /// Writes every set field onto `post`. Tags are not part of the record.
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title.clone_from(title);
        }
        if let Some(body) = &self.body {
            post.body.clone_from(body);
        }
        if let Some(description) = &self.description {
            post.description.clone_from(description);
        }
        if let Some(state) = &self.state {
            post.state.clone_from(state);
        }
        if let Some(blogger) = &self.blogger {
            post.blogger.clone_from(blogger);
        }
    }
}

/// A reader comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub name: String,
    pub email: String,
    pub website: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub website: Option<String>,
    pub body: String,
}
