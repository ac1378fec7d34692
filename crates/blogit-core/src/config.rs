//! # Engine Configuration
//!
//! The options a host application sets when mounting Blogit. The struct is
//! passed into [`crate::PostService`] at construction; nothing reads it from
//! global state.

use serde::{Deserialize, Serialize};

use crate::error::{BlogitError, Result};

/// Where post comments live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentBackend {
    /// Comments are stored alongside posts through a `CommentStore`.
    #[default]
    #[serde(alias = "active_record")]
    Persisted,
    /// Comments are rendered by an externally hosted Disqus widget.
    Disqus,
    /// No comments at all.
    #[serde(alias = "no")]
    Disabled,
}

impl CommentBackend {
    /// Guards every access to the persisted comments association.
    pub fn ensure_persisted(self) -> Result<()> {
        match self {
            CommentBackend::Persisted => Ok(()),
            other => Err(BlogitError::configuration(format!(
                "posts only allow persisted comments (include_comments is {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogitConfig {
    /// Page size used by the index listing.
    pub posts_per_page: u32,
    /// States excluded from public listings (e.g., "draft").
    pub hidden_states: Vec<String>,
    /// States visible to readers.
    pub active_states: Vec<String>,
    /// When true, every post must carry a description.
    pub show_post_description: bool,
    /// Name of the attribute read from a blogger to display them.
    pub blogger_display_name_method: String,
    pub include_comments: CommentBackend,
}

impl Default for BlogitConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 5,
            hidden_states: vec!["draft".to_string(), "archive".to_string()],
            active_states: vec!["published".to_string()],
            show_post_description: true,
            blogger_display_name_method: "username".to_string(),
            include_comments: CommentBackend::Persisted,
        }
    }
}

impl BlogitConfig {
    pub fn is_active_state(&self, state: &str) -> bool {
        self.active_states.iter().any(|s| s == state)
    }

    /// Hidden states followed by active states.
    pub fn available_states(&self) -> impl Iterator<Item = &str> {
        self.hidden_states
            .iter()
            .chain(self.active_states.iter())
            .map(String::as_str)
    }

    pub fn is_available_state(&self, state: &str) -> bool {
        self.available_states().any(|s| s == state)
    }

    /// Rejects configurations that cannot be paged or displayed. A state may be
    /// both hidden and active; active wins for listings.
    pub fn check(&self) -> Result<()> {
        if self.posts_per_page == 0 {
            return Err(BlogitError::configuration(
                "posts_per_page must be at least 1",
            ));
        }
        if self.blogger_display_name_method.trim().is_empty() {
            return Err(BlogitError::configuration(
                "blogger_display_name_method must name an attribute",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_check() {
        let config = BlogitConfig::default();
        config.check().unwrap();
        assert_eq!(
            config.available_states().collect::<Vec<_>>(),
            vec!["draft", "archive", "published"]
        );
    }

    #[test]
    fn overlapping_and_empty_state_lists_are_accepted() {
        let overlapping = BlogitConfig {
            hidden_states: vec!["draft".into(), "featured".into()],
            active_states: vec!["published".into(), "featured".into()],
            ..BlogitConfig::default()
        };
        overlapping.check().unwrap();
        assert!(overlapping.is_active_state("featured"));

        let nothing_active = BlogitConfig {
            active_states: vec![],
            ..BlogitConfig::default()
        };
        nothing_active.check().unwrap();
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let config = BlogitConfig {
            posts_per_page: 0,
            ..BlogitConfig::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn legacy_comment_backend_names_deserialize() {
        let backend: CommentBackend = serde_json::from_str("\"active_record\"").unwrap();
        assert_eq!(backend, CommentBackend::Persisted);
        let backend: CommentBackend = serde_json::from_str("\"no\"").unwrap();
        assert_eq!(backend, CommentBackend::Disabled);
    }

    #[test]
    fn only_persisted_backend_allows_comments() {
        assert!(CommentBackend::Persisted.ensure_persisted().is_ok());
        assert!(CommentBackend::Disqus.ensure_persisted().is_err());
        assert!(CommentBackend::Disabled.ensure_persisted().is_err());
    }
}
