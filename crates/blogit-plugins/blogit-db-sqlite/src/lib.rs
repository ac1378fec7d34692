//! # blogit-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `blogit-core` domain models.
//!
//! Timestamps are stored as INTEGER microseconds since the epoch so that
//! `ORDER BY created_at` is a plain numeric sort.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use blogit_core::{
    BloggerRef, Comment, CommentId, CommentStore, NewComment, NewPost, Post, PostId, PostOrder,
    PostQuery, PostRepo, TagList, TagStore,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, QueryBuilder, Row, Sqlite};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blogit_posts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT    NOT NULL,
    body         TEXT    NOT NULL,
    description  TEXT,
    state        TEXT    NOT NULL,
    blogger_id   TEXT,
    blogger_type TEXT,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS index_blogit_posts_on_state_and_created_at
    ON blogit_posts (state, created_at);

CREATE TABLE IF NOT EXISTS blogit_taggings (
    post_id  INTEGER NOT NULL REFERENCES blogit_posts (id) ON DELETE CASCADE,
    tag      TEXT    NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (post_id, tag)
);

CREATE TABLE IF NOT EXISTS blogit_comments (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id    INTEGER NOT NULL REFERENCES blogit_posts (id) ON DELETE CASCADE,
    name       TEXT    NOT NULL,
    email      TEXT    NOT NULL,
    website    TEXT,
    body       TEXT    NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS index_blogit_comments_on_post_id ON blogit_comments (post_id);
"#;

const POST_COLUMNS: &str =
    "id, title, body, description, state, blogger_id, blogger_type, created_at, updated_at";

pub struct SqliteBlogRepo {
    pool: SqlitePool,
}

impl SqliteBlogRepo {
    /// Opens (or creates) the database at `url` and makes sure the schema exists.
    ///
    /// In-memory databases are limited to a single connection that is never
    /// recycled, otherwise every connection would see its own empty database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        let repo = Self::from_pool(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Wraps an existing pool. Call [`SqliteBlogRepo::migrate`] if the schema may be missing.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

// Helpers for timestamp conversion
fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(micros: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| anyhow!("timestamp {micros} is out of range"))
}

/// The current time at the precision the database keeps.
fn now() -> anyhow::Result<DateTime<Utc>> {
    from_micros(to_micros(Utc::now()))
}

fn row_to_post(row: &SqliteRow) -> anyhow::Result<Post> {
    let blogger_id: Option<String> = row.try_get("blogger_id")?;
    let blogger_type: Option<String> = row.try_get("blogger_type")?;
    let blogger = match (blogger_id, blogger_type) {
        (Some(blogger_id), Some(blogger_type)) => Some(BloggerRef {
            blogger_id,
            blogger_type,
        }),
        _ => None,
    };

    Ok(Post {
        id: PostId(row.try_get("id")?),
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        description: row.try_get("description")?,
        state: row.try_get("state")?,
        blogger,
        created_at: from_micros(row.try_get("created_at")?)?,
        updated_at: from_micros(row.try_get("updated_at")?)?,
    })
}

fn row_to_comment(row: &SqliteRow) -> anyhow::Result<Comment> {
    Ok(Comment {
        id: CommentId(row.try_get("id")?),
        post_id: PostId(row.try_get("post_id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        website: row.try_get("website")?,
        body: row.try_get("body")?,
        created_at: from_micros(row.try_get("created_at")?)?,
    })
}

fn push_filters<'args>(builder: &mut QueryBuilder<'args, Sqlite>, query: &PostQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(states) = &query.states {
        if states.is_empty() {
            builder.push(" AND 1 = 0");
        } else {
            builder.push(" AND state IN (");
            let mut separated = builder.separated(", ");
            for state in states {
                separated.push_bind(state.clone());
            }
            separated.push_unseparated(")");
        }
    }
    if let Some(id) = query.id {
        builder.push(" AND id = ").push_bind(id.0);
    }
}

fn select_posts(query: &PostQuery) -> anyhow::Result<QueryBuilder<'static, Sqlite>> {
    let mut builder = QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM blogit_posts"));
    push_filters(&mut builder, query);

    match query.order {
        Some(PostOrder::NewestFirst) => builder.push(" ORDER BY created_at DESC, id DESC"),
        None => builder.push(" ORDER BY id ASC"),
    };

    if let Some(page) = query.page {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(page.limit())?)
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset())?);
    }
    Ok(builder)
}

async fn insert_comment<'c, E>(
    executor: E,
    comment: NewComment,
    created_at: DateTime<Utc>,
) -> anyhow::Result<Comment>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO blogit_comments (post_id, name, email, website, body, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(comment.post_id.0)
    .bind(&comment.name)
    .bind(&comment.email)
    .bind(comment.website.as_deref())
    .bind(&comment.body)
    .bind(to_micros(created_at))
    .execute(executor)
    .await?;

    Ok(Comment {
        id: CommentId(result.last_insert_rowid()),
        post_id: comment.post_id,
        name: comment.name,
        email: comment.email,
        website: comment.website,
        body: comment.body,
        created_at,
    })
}

#[async_trait]
impl PostRepo for SqliteBlogRepo {
    async fn insert(&self, post: NewPost) -> anyhow::Result<Post> {
        let now = now()?;
        let result = sqlx::query(
            "INSERT INTO blogit_posts (title, body, description, state, blogger_id, blogger_type, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.description.as_deref())
        .bind(&post.state)
        .bind(post.blogger.as_ref().map(|b| b.blogger_id.as_str()))
        .bind(post.blogger.as_ref().map(|b| b.blogger_type.as_str()))
        .bind(to_micros(now))
        .bind(to_micros(now))
        .execute(&self.pool)
        .await?;

        let id = PostId(result.last_insert_rowid());
        tracing::debug!(post_id = %id, "inserted post");

        Ok(Post {
            id,
            title: post.title,
            body: post.body,
            description: post.description,
            state: post.state,
            blogger: post.blogger,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, post: Post) -> anyhow::Result<Post> {
        let result = sqlx::query(
            "UPDATE blogit_posts SET title = ?, body = ?, description = ?, state = ?, blogger_id = ?, blogger_type = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.description.as_deref())
        .bind(&post.state)
        .bind(post.blogger.as_ref().map(|b| b.blogger_id.as_str()))
        .bind(post.blogger.as_ref().map(|b| b.blogger_type.as_str()))
        .bind(to_micros(now()?))
        .bind(post.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("post {} does not exist", post.id);
        }
        self.find(post.id)
            .await?
            .ok_or_else(|| anyhow!("post {} vanished during update", post.id))
    }

    async fn delete(&self, id: PostId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM blogit_posts WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM blogit_posts WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_post).transpose()
    }

    async fn fetch(&self, query: &PostQuery) -> anyhow::Result<Vec<Post>> {
        let mut builder = select_posts(query)?;
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_post).collect()
    }

    async fn count(&self, query: &PostQuery) -> anyhow::Result<u64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM blogit_posts");
        push_filters(&mut builder, query);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count)?)
    }
}

#[async_trait]
impl TagStore for SqliteBlogRepo {
    async fn tags_for(&self, post_id: PostId) -> anyhow::Result<TagList> {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT tag FROM blogit_taggings WHERE post_id = ? ORDER BY position ASC")
                .bind(post_id.0)
                .fetch_all(&self.pool)
                .await?;
        Ok(tags.into_iter().collect())
    }

    /// Swaps the whole tag set in one transaction.
    async fn replace_tags(&self, post_id: PostId, tags: &TagList) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM blogit_taggings WHERE post_id = ?")
            .bind(post_id.0)
            .execute(&mut *tx)
            .await?;

        for (position, tag) in tags.iter().enumerate() {
            sqlx::query("INSERT INTO blogit_taggings (post_id, tag, position) VALUES (?, ?, ?)")
                .bind(post_id.0)
                .bind(tag)
                .bind(i64::try_from(position)?)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn attach(&self, post_id: PostId, tag: &str) -> anyhow::Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT OR IGNORE INTO blogit_taggings (post_id, tag, position) SELECT ?, ?, COALESCE(MAX(position) + 1, 0) FROM blogit_taggings WHERE post_id = ?",
        )
        .bind(post_id.0)
        .bind(tag)
        .bind(post_id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn detach(&self, post_id: PostId, tag: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM blogit_taggings WHERE post_id = ? AND tag = ?")
            .bind(post_id.0)
            .bind(tag)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CommentStore for SqliteBlogRepo {
    async fn comments_for(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, post_id, name, email, website, body, created_at FROM blogit_comments WHERE post_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_comment).collect()
    }

    async fn add_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
        insert_comment(&self.pool, comment, now()?).await
    }

    async fn replace_comments(
        &self,
        post_id: PostId,
        comments: Vec<NewComment>,
    ) -> anyhow::Result<Vec<Comment>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM blogit_comments WHERE post_id = ?")
            .bind(post_id.0)
            .execute(&mut *tx)
            .await?;

        let created_at = now()?;
        let mut stored = Vec::with_capacity(comments.len());
        for comment in comments {
            let comment = NewComment { post_id, ..comment };
            stored.push(insert_comment(&mut *tx, comment, created_at).await?);
        }

        tx.commit().await?;
        tracing::debug!(post_id = %post_id, count = stored.len(), "replaced comments");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogit_core::BlogitConfig;

    async fn repo() -> SqliteBlogRepo {
        SqliteBlogRepo::new("sqlite::memory:").await.unwrap()
    }

    fn new_post(title: &str, state: &str) -> NewPost {
        NewPost {
            title: title.into(),
            body: "Body text long enough".into(),
            description: Some("A description".into()),
            state: state.into(),
            blogger: Some(BloggerRef::new("User", 1)),
            ..NewPost::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_post() {
        let repo = repo().await;
        let post = repo.insert(new_post("Hello from SQLite", "published")).await.unwrap();

        let found = repo.find(post.id).await.unwrap().expect("post was stored");
        assert_eq!(found, post);
        assert!(repo.find(PostId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_without_blogger_round_trips() {
        let repo = repo().await;
        let mut draft = new_post("No author on this one", "draft");
        draft.blogger = None;
        draft.description = None;
        let post = repo.insert(draft).await.unwrap();

        let found = repo.find(post.id).await.unwrap().unwrap();
        assert_eq!(found.blogger, None);
        assert_eq!(found.description, None);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo().await;
        let post = repo.insert(new_post("Before the edit", "draft")).await.unwrap();

        let updated = repo
            .update(Post {
                title: "After the edit".into(),
                state: "published".into(),
                ..post.clone()
            })
            .await
            .unwrap();
        assert_eq!(updated.title, "After the edit");
        assert_eq!(updated.created_at, post.created_at);

        assert!(repo.delete(post.id).await.unwrap());
        assert!(!repo.delete(post.id).await.unwrap());
        assert!(repo.update(updated).await.is_err());
    }

    #[tokio::test]
    async fn test_scoped_fetch_and_count() {
        let repo = repo().await;
        for (title, state) in [
            ("Published one", "published"),
            ("Draft number one", "draft"),
            ("Published two", "published"),
            ("Published three", "published"),
        ] {
            repo.insert(new_post(title, state)).await.unwrap();
        }
        let config = BlogitConfig {
            posts_per_page: 2,
            ..BlogitConfig::default()
        };

        let first = repo.fetch(&PostQuery::for_index(&config, Some(1))).await.unwrap();
        let second = repo.fetch(&PostQuery::for_index(&config, Some(2))).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(first.iter().chain(second.iter()).all(|p| p.state == "published"));
        assert!(first[0].created_at >= first[1].created_at);

        assert_eq!(repo.count(&PostQuery::active(&config)).await.unwrap(), 3);
        assert_eq!(repo.count(&PostQuery::all()).await.unwrap(), 4);
        assert_eq!(
            repo.count(&PostQuery::all().in_states(Vec::<String>::new())).await.unwrap(),
            0
        );

        let draft_id = PostId(2);
        assert!(repo
            .fetch(&PostQuery::active_with_id(&config, draft_id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_tags() {
        let repo = repo().await;
        let post = repo.insert(new_post("Tagged post title", "published")).await.unwrap();

        repo.replace_tags(post.id, &TagList::parse("rust, web")).await.unwrap();
        repo.attach(post.id, "async").await.unwrap();
        repo.attach(post.id, "rust").await.unwrap();
        repo.detach(post.id, "web").await.unwrap();
        assert_eq!(repo.tags_for(post.id).await.unwrap().to_string(), "rust, async");

        assert!(repo.attach(PostId(404), "orphan").await.is_err());
    }

    #[tokio::test]
    async fn test_blank_tag_is_not_stored() {
        let repo = repo().await;
        let post = repo.insert(new_post("Tagged post title", "published")).await.unwrap();

        repo.attach(post.id, "   ").await.unwrap();
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogit_taggings WHERE post_id = ?")
            .bind(post.id.0)
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_comments_follow_post_lifecycle() {
        let repo = repo().await;
        let post = repo.insert(new_post("Commented post", "published")).await.unwrap();
        let comment = NewComment {
            post_id: post.id,
            name: "Reader".into(),
            email: "reader@example.com".into(),
            website: Some("https://example.com".into()),
            body: "Great write-up".into(),
        };

        let stored = repo.add_comment(comment.clone()).await.unwrap();
        assert_eq!(repo.comments_for(post.id).await.unwrap(), vec![stored]);

        let replaced = repo
            .replace_comments(post.id, vec![comment.clone(), comment])
            .await
            .unwrap();
        assert_eq!(repo.comments_for(post.id).await.unwrap(), replaced);

        repo.delete(post.id).await.unwrap();
        assert!(repo.comments_for(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database_persists_between_pools() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("blogit.db").display());

        let id = {
            let repo = SqliteBlogRepo::new(&url).await.unwrap();
            let id = repo.insert(new_post("Persisted post title", "published")).await.unwrap().id;
            repo.pool().close().await;
            id
        };

        let repo = SqliteBlogRepo::new(&url).await.unwrap();
        assert!(repo.find(id).await.unwrap().is_some());
    }
}
