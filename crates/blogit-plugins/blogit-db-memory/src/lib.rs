//! # blogit-db-memory
//!
//! In-process implementation of the Blogit storage ports.
//! Useful for embedding, demos and tests; nothing survives a restart.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use blogit_core::{
    Blogger, BloggerDirectory, BloggerRecord, BloggerRef, Comment, CommentId, CommentStore,
    NewComment, NewPost, Post, PostId, PostQuery, PostRepo, TagList, TagStore,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Posts, taggings and comments kept in concurrent hash maps.
pub struct MemoryBlogStore {
    posts: DashMap<PostId, Post>,
    taggings: DashMap<PostId, TagList>,
    comments: DashMap<PostId, Vec<Comment>>,
    next_post_id: AtomicI64,
    next_comment_id: AtomicI64,
    /// Source of `created_at` / `updated_at` values
    clock: Clock,
}

impl Default for MemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Uses `clock` instead of the system time for timestamps.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            posts: DashMap::new(),
            taggings: DashMap::new(),
            comments: DashMap::new(),
            next_post_id: AtomicI64::new(0),
            next_comment_id: AtomicI64::new(0),
            clock: Box::new(clock),
        }
    }

    fn ensure_post(&self, id: PostId) -> anyhow::Result<()> {
        if self.posts.contains_key(&id) {
            Ok(())
        } else {
            Err(anyhow!("post {id} does not exist"))
        }
    }

    fn build_comment(&self, comment: NewComment) -> Comment {
        Comment {
            id: CommentId(self.next_comment_id.fetch_add(1, Ordering::SeqCst) + 1),
            post_id: comment.post_id,
            name: comment.name,
            email: comment.email,
            website: comment.website,
            body: comment.body,
            created_at: (self.clock)(),
        }
    }
}

#[async_trait]
impl PostRepo for MemoryBlogStore {
    async fn insert(&self, post: NewPost) -> anyhow::Result<Post> {
        let id = PostId(self.next_post_id.fetch_add(1, Ordering::SeqCst) + 1);
        let now = (self.clock)();
        let post = Post {
            id,
            title: post.title,
            body: post.body,
            description: post.description,
            state: post.state,
            blogger: post.blogger,
            created_at: now,
            updated_at: now,
        };
        self.posts.insert(id, post.clone());
        tracing::debug!(post_id = %id, "inserted post");
        Ok(post)
    }

    async fn update(&self, post: Post) -> anyhow::Result<Post> {
        let mut stored = self
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| anyhow!("post {} does not exist", post.id))?;
        let updated = Post {
            created_at: stored.created_at,
            updated_at: (self.clock)(),
            ..post
        };
        *stored = updated.clone();
        Ok(updated)
    }

    /// Taggings and comments go with the post.
    async fn delete(&self, id: PostId) -> anyhow::Result<bool> {
        let removed = self.posts.remove(&id).is_some();
        self.taggings.remove(&id);
        self.comments.remove(&id);
        Ok(removed)
    }

    async fn find(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|post| post.clone()))
    }

    async fn fetch(&self, query: &PostQuery) -> anyhow::Result<Vec<Post>> {
        let snapshot: Vec<Post> = self.posts.iter().map(|entry| entry.value().clone()).collect();
        Ok(query.apply(snapshot))
    }

    async fn count(&self, query: &PostQuery) -> anyhow::Result<u64> {
        let matching = self
            .posts
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .count();
        Ok(u64::try_from(matching)?)
    }
}

#[async_trait]
impl TagStore for MemoryBlogStore {
    async fn tags_for(&self, post_id: PostId) -> anyhow::Result<TagList> {
        Ok(self
            .taggings
            .get(&post_id)
            .map(|tags| tags.clone())
            .unwrap_or_default())
    }

    async fn replace_tags(&self, post_id: PostId, tags: &TagList) -> anyhow::Result<()> {
        if tags.is_empty() {
            self.taggings.remove(&post_id);
            return Ok(());
        }
        self.ensure_post(post_id)?;
        self.taggings.insert(post_id, tags.clone());
        Ok(())
    }

    async fn attach(&self, post_id: PostId, tag: &str) -> anyhow::Result<()> {
        self.ensure_post(post_id)?;
        self.taggings.entry(post_id).or_default().add(tag);
        Ok(())
    }

    async fn detach(&self, post_id: PostId, tag: &str) -> anyhow::Result<()> {
        if let Some(mut tags) = self.taggings.get_mut(&post_id) {
            tags.remove(tag);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentStore for MemoryBlogStore {
    async fn comments_for(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        Ok(self
            .comments
            .get(&post_id)
            .map(|comments| comments.clone())
            .unwrap_or_default())
    }

    async fn add_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
        self.ensure_post(comment.post_id)?;
        let comment = self.build_comment(comment);
        self.comments
            .entry(comment.post_id)
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    async fn replace_comments(
        &self,
        post_id: PostId,
        comments: Vec<NewComment>,
    ) -> anyhow::Result<Vec<Comment>> {
        self.ensure_post(post_id)?;
        let comments: Vec<Comment> = comments
            .into_iter()
            .map(|comment| self.build_comment(NewComment { post_id, ..comment }))
            .collect();
        self.comments.insert(post_id, comments.clone());
        Ok(comments)
    }
}

/// Bloggers registered up front by the host, keyed by type and id.
#[derive(Default)]
pub struct MemoryBloggerDirectory {
    bloggers: DashMap<BloggerRef, Arc<BloggerRecord>>,
}

impl MemoryBloggerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reference posts should carry to point at `record`.
    pub fn register(&self, record: BloggerRecord) -> BloggerRef {
        let reference = BloggerRef::new(record.blogger_type.clone(), &record.blogger_id);
        self.bloggers.insert(reference.clone(), Arc::new(record));
        reference
    }

    pub fn unregister(&self, reference: &BloggerRef) -> bool {
        self.bloggers.remove(reference).is_some()
    }
}

#[async_trait]
impl BloggerDirectory for MemoryBloggerDirectory {
    async fn resolve(&self, blogger: &BloggerRef) -> anyhow::Result<Option<Arc<dyn Blogger>>> {
        Ok(self.bloggers.get(blogger).map(|record| {
            let blogger: Arc<dyn Blogger> = record.value().clone();
            blogger
        }))
    }
}
