//! # PostService
//!
//! Coordinates the validation gate, query scopes and guarded associations
//! with whichever plugins the host mounted.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::blogger::Blogger;
use crate::config::BlogitConfig;
use crate::error::{BlogitError, Result};
use crate::models::{Comment, NewComment, NewPost, Post, PostChanges, PostId};
use crate::query::{Page, Paginated, PostQuery};
use crate::tags::TagList;
use crate::traits::{BloggerDirectory, CommentStore, PostRepo, TagStore};

/// The plugins a `PostService` delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub posts: Arc<dyn PostRepo>,
    pub tags: Arc<dyn TagStore>,
    pub comments: Arc<dyn CommentStore>,
    pub bloggers: Arc<dyn BloggerDirectory>,
}

/// Shared across request handlers, usually behind an `Arc`.
pub struct PostService {
    config: BlogitConfig,
    posts: Arc<dyn PostRepo>,
    tags: Arc<dyn TagStore>,
    comments: Arc<dyn CommentStore>,
    bloggers: Arc<dyn BloggerDirectory>,
}

impl PostService {
    /// Fails when `config` does not pass [`BlogitConfig::check`].
    pub fn new(config: BlogitConfig, collaborators: Collaborators) -> Result<Self> {
        config.check()?;
        let Collaborators {
            posts,
            tags,
            comments,
            bloggers,
        } = collaborators;
        Ok(Self {
            config,
            posts,
            tags,
            comments,
            bloggers,
        })
    }

    pub fn config(&self) -> &BlogitConfig {
        &self.config
    }

    // ── Writes ──────────────────────────────────────────────────────────────

    /// Stores the post and its tags. If tagging fails the post is removed again.
    #[instrument(skip_all, fields(title = %new_post.title))]
    pub async fn create(&self, new_post: NewPost) -> Result<Post> {
        new_post.validate(&self.config)?;

        let tag_list = new_post.tag_list.clone();
        let post = self.posts.insert(new_post).await?;
        if !tag_list.is_empty() {
            if let Err(err) = self.tags.replace_tags(post.id, &tag_list).await {
                if let Err(rollback) = self.posts.delete(post.id).await {
                    warn!(post_id = %post.id, error = %rollback, "could not remove untagged post");
                }
                return Err(err.into());
            }
        }

        debug!(post_id = %post.id, "post created");
        Ok(post)
    }

    /// Applies `changes`. If the new tag list cannot be stored the previous
    /// record is written back.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: PostId, changes: PostChanges) -> Result<Post> {
        let previous = self.find(id).await?;
        let mut post = previous.clone();
        changes.apply_to(&mut post);
        post.validate(&self.config)?;

        let post = self.posts.update(post).await?;
        if let Some(tag_list) = &changes.tag_list {
            if let Err(err) = self.tags.replace_tags(post.id, tag_list).await {
                if let Err(rollback) = self.posts.update(previous).await {
                    warn!(post_id = %post.id, error = %rollback, "could not restore post");
                }
                return Err(err.into());
            }
        }

        debug!("post updated");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: PostId) -> Result<()> {
        if !self.posts.delete(id).await? {
            return Err(BlogitError::not_found("Post", id));
        }
        self.tags.replace_tags(id, &TagList::default()).await?;
        debug!("post deleted");
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    /// Any post, whatever its state. For authoring screens.
    pub async fn find(&self, id: PostId) -> Result<Post> {
        self.posts
            .find(id)
            .await?
            .ok_or_else(|| BlogitError::not_found("Post", id))
    }

    #[instrument(skip(self))]
    pub async fn active(&self) -> Result<Vec<Post>> {
        Ok(self.posts.fetch(&PostQuery::active(&self.config)).await?)
    }

    /// One page of the public index, newest first. `page` defaults to 1.
    #[instrument(skip(self))]
    pub async fn for_index(&self, page: Option<u32>) -> Result<Paginated<Post>> {
        let query = PostQuery::for_index(&self.config, page);
        let items = self.posts.fetch(&query).await?;
        let total = self.posts.count(&query.unpaginated()).await?;
        let page = query
            .page
            .unwrap_or_else(|| Page::new(1, self.config.posts_per_page));
        Ok(Paginated::new(items, page, total))
    }

    #[instrument(skip(self))]
    pub async fn for_feed(&self) -> Result<Vec<Post>> {
        Ok(self.posts.fetch(&PostQuery::for_feed(&self.config)).await?)
    }

    /// The post with `id`, provided it is in an active state.
    #[instrument(skip(self))]
    pub async fn active_with_id(&self, id: PostId) -> Result<Post> {
        let query = PostQuery::active_with_id(&self.config, id);
        self.posts
            .fetch(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BlogitError::not_found("Post", id))
    }

    // ── Tags ────────────────────────────────────────────────────────────────

    pub async fn tags(&self, post: &Post) -> Result<TagList> {
        Ok(self.tags.tags_for(post.id).await?)
    }

    #[instrument(skip(self, post), fields(post_id = %post.id, tags = %tags))]
    pub async fn set_tags(&self, post: &Post, tags: TagList) -> Result<()> {
        self.tags.replace_tags(post.id, &tags).await?;
        Ok(())
    }

    /// Blank tags are ignored, as in [`TagList::add`].
    pub async fn add_tag(&self, post: &Post, tag: &str) -> Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(());
        }
        self.tags.attach(post.id, tag).await?;
        Ok(())
    }

    pub async fn remove_tag(&self, post: &Post, tag: &str) -> Result<()> {
        self.tags.detach(post.id, tag.trim()).await?;
        Ok(())
    }

    // ── Comments (guarded) ──────────────────────────────────────────────────

    pub async fn comments(&self, post: &Post) -> Result<Vec<Comment>> {
        self.config.include_comments.ensure_persisted()?;
        Ok(self.comments.comments_for(post.id).await?)
    }

    /// Replaces every comment on `post`. Nothing is written if any comment is invalid.
    #[instrument(skip(self, post, comments), fields(post_id = %post.id, count = comments.len()))]
    pub async fn set_comments(&self, post: &Post, comments: Vec<NewComment>) -> Result<Vec<Comment>> {
        self.config.include_comments.ensure_persisted()?;
        let comments = comments
            .into_iter()
            .map(|comment| NewComment {
                post_id: post.id,
                ..comment
            })
            .collect::<Vec<_>>();
        for comment in &comments {
            comment.validate()?;
        }
        Ok(self.comments.replace_comments(post.id, comments).await?)
    }

    #[instrument(skip(self, post, comment), fields(post_id = %post.id))]
    pub async fn add_comment(&self, post: &Post, comment: NewComment) -> Result<Comment> {
        self.config.include_comments.ensure_persisted()?;
        let comment = NewComment {
            post_id: post.id,
            ..comment
        };
        comment.validate()?;
        Ok(self.comments.add_comment(comment).await?)
    }

    // ── Blogger ─────────────────────────────────────────────────────────────

    /// `None` when the post has no blogger or the record is gone.
    pub async fn blogger(&self, post: &Post) -> Result<Option<Arc<dyn Blogger>>> {
        match &post.blogger {
            Some(reference) => Ok(self.bloggers.resolve(reference).await?),
            None => Ok(None),
        }
    }

    pub async fn blogger_display_name(&self, post: &Post) -> Result<String> {
        let blogger = self.blogger(post).await?;
        post.blogger_display_name(blogger.as_deref(), &self.config)
    }

    pub async fn blogger_twitter_username(&self, post: &Post) -> Result<Option<String>> {
        let blogger = self.blogger(post).await?;
        Ok(post.blogger_twitter_username(blogger.as_deref()))
    }
}
