//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be mounted by a host.

use std::sync::Arc;

use async_trait::async_trait;

use crate::blogger::Blogger;
use crate::models::{BloggerRef, Comment, NewComment, NewPost, Post, PostId};
use crate::query::PostQuery;
use crate::tags::TagList;

/// Data persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Stores a validated post, assigning `id`, `created_at` and `updated_at`.
    async fn insert(&self, post: NewPost) -> anyhow::Result<Post>;
    /// Overwrites the mutable fields of an existing post and bumps `updated_at`.
    async fn update(&self, post: Post) -> anyhow::Result<Post>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: PostId) -> anyhow::Result<bool>;
    async fn find(&self, id: PostId) -> anyhow::Result<Option<Post>>;

    async fn fetch(&self, query: &PostQuery) -> anyhow::Result<Vec<Post>>;
    /// Number of posts matching the query's filters; paging is ignored.
    async fn count(&self, query: &PostQuery) -> anyhow::Result<u64>;
}

/// Tagging contract. Tag vocabulary belongs to the plugin.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn tags_for(&self, post_id: PostId) -> anyhow::Result<TagList>;
    async fn replace_tags(&self, post_id: PostId, tags: &TagList) -> anyhow::Result<()>;
    async fn attach(&self, post_id: PostId, tag: &str) -> anyhow::Result<()>;
    async fn detach(&self, post_id: PostId, tag: &str) -> anyhow::Result<()>;
}

/// Persisted comments contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Oldest first.
    async fn comments_for(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>>;
    async fn add_comment(&self, comment: NewComment) -> anyhow::Result<Comment>;
    /// Drops the post's current comments and stores `comments` instead.
    async fn replace_comments(
        &self,
        post_id: PostId,
        comments: Vec<NewComment>,
    ) -> anyhow::Result<Vec<Comment>>;
}

/// Resolves polymorphic blogger references against the host's records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BloggerDirectory: Send + Sync {
    /// `Ok(None)` when the referenced record no longer exists.
    async fn resolve(&self, blogger: &BloggerRef) -> anyhow::Result<Option<Arc<dyn Blogger>>>;
}
