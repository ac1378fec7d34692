//! # Query Scoping
//!
//! A `PostQuery` describes which posts to read and in what order; it is
//! materialized only when a `PostRepo` runs it. Scopes compose by chaining.

use serde::Serialize;

use crate::config::BlogitConfig;
use crate::models::{Post, PostId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    /// `created_at` descending, then id descending.
    NewestFirst,
}

/// One page of a listing. Page numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub per_page: u32,
}

impl Page {
    /// Clamps `number` and `per_page` to at least 1.
    pub fn new(number: u32, per_page: u32) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    /// `None` means any state.
    pub states: Option<Vec<String>>,
    pub id: Option<PostId>,
    pub order: Option<PostOrder>,
    pub page: Option<Page>,
}

impl PostQuery {
    /// Every post regardless of state.
    pub fn all() -> Self {
        Self::default()
    }

    /// Posts whose state is one of the configured active states.
    pub fn active(config: &BlogitConfig) -> Self {
        Self::all().in_states(config.active_states.iter().cloned())
    }

    /// Newest active posts, one page at a time.
    pub fn for_index(config: &BlogitConfig, page: Option<u32>) -> Self {
        Self::active(config)
            .order_by(PostOrder::NewestFirst)
            .paginate(Page::new(page.unwrap_or(1), config.posts_per_page))
    }

    /// Newest active posts, unpaginated, for RSS feeds and sitemaps.
    pub fn for_feed(config: &BlogitConfig) -> Self {
        Self::active(config).order_by(PostOrder::NewestFirst)
    }

    pub fn active_with_id(config: &BlogitConfig, id: PostId) -> Self {
        Self::active(config).with_id(id)
    }

    pub fn in_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_id(mut self, id: PostId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn order_by(mut self, order: PostOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn paginate(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Same filters without ordering or paging, for counting.
    pub fn unpaginated(&self) -> Self {
        Self {
            states: self.states.clone(),
            id: self.id,
            order: None,
            page: None,
        }
    }

    /// Filter check only; ordering and paging are ignored.
    pub fn matches(&self, post: &Post) -> bool {
        let state_ok = self
            .states
            .as_ref()
            .is_none_or(|states| states.iter().any(|s| *s == post.state));
        let id_ok = self.id.is_none_or(|id| id == post.id);
        state_ok && id_ok
    }

    /// Evaluates the query over an in-process collection.
    pub fn apply<I>(&self, posts: I) -> Vec<Post>
    where
        I: IntoIterator<Item = Post>,
    {
        let mut matched: Vec<Post> = posts.into_iter().filter(|p| self.matches(p)).collect();

        match self.order {
            Some(PostOrder::NewestFirst) => {
                matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            }
            // Unordered queries still come back in id order.
            None => matched.sort_by_key(|p| p.id),
        }

        match self.page {
            Some(page) => {
                let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
                let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
                matched.into_iter().skip(offset).take(limit).collect()
            }
            None => matched,
        }
    }
}

/// A page of results plus what listing templates need to render pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            items,
            page: page.number,
            per_page: page.per_page,
            total,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page.max(1)))
    }

    pub fn is_first_page(&self) -> bool {
        self.page <= 1
    }

    pub fn is_last_page(&self) -> bool {
        u64::from(self.page) >= self.total_pages()
    }

    pub fn next_page(&self) -> Option<u32> {
        (!self.is_last_page()).then(|| self.page + 1)
    }

    pub fn prev_page(&self) -> Option<u32> {
        (!self.is_first_page()).then(|| self.page - 1)
    }
}
