//! Shared fixtures for the integration suites under `tests/`.
//!
//! Every suite can run against both storage plugins through [`harness`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use blogit_core::{BlogitConfig, BloggerRef, Collaborators, NewPost, PostService, TagList};
use blogit_db_memory::{MemoryBlogStore, MemoryBloggerDirectory};
use blogit_db_sqlite::SqliteBlogRepo;
use chrono::{DateTime, Duration, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Memory, Backend::Sqlite];
}

pub struct Harness {
    pub service: PostService,
    pub bloggers: Arc<MemoryBloggerDirectory>,
}

/// A clock that moves one minute forward on every reading.
pub fn ticking_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid start date");
    let ticks = AtomicI64::new(0);
    move || start + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst))
}

pub async fn harness(backend: Backend, config: BlogitConfig) -> Harness {
    let bloggers = Arc::new(MemoryBloggerDirectory::new());
    let collaborators = match backend {
        Backend::Memory => {
            let store = Arc::new(MemoryBlogStore::with_clock(ticking_clock()));
            Collaborators {
                posts: store.clone(),
                tags: store.clone(),
                comments: store,
                bloggers: bloggers.clone(),
            }
        }
        Backend::Sqlite => {
            let repo = Arc::new(
                SqliteBlogRepo::new("sqlite::memory:")
                    .await
                    .expect("in-memory sqlite opens"),
            );
            Collaborators {
                posts: repo.clone(),
                tags: repo.clone(),
                comments: repo,
                bloggers: bloggers.clone(),
            }
        }
    };

    let service = PostService::new(config, collaborators).expect("test config is valid");
    Harness { service, bloggers }
}

/// A post that passes validation under the default configuration.
pub fn valid_post(title: &str, state: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        body: "This body is comfortably longer than ten characters.".to_string(),
        description: Some("A short description".to_string()),
        state: state.to_string(),
        blogger: Some(BloggerRef::new("User", 1)),
        tag_list: TagList::default(),
    }
}

pub fn config_with_page_size(posts_per_page: u32) -> BlogitConfig {
    BlogitConfig {
        posts_per_page,
        ..BlogitConfig::default()
    }
}
