//! # Derived Accessors
//!
//! Read-only values computed from a post for templates and routers.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::blogger::Blogger;
use crate::config::BlogitConfig;
use crate::error::{BlogitError, Result};
use crate::models::Post;

/// Maximum length of [`Post::short_body`] before the marker.
pub const SHORT_BODY_LENGTH: usize = 400;
pub const TRUNCATION_MARKER: &str = "...";

/// Cuts `text` to at most `length` characters, preferring to end just before
/// the last `separator` inside that window. Appends `marker` when cut.
pub fn truncate<'a>(text: &'a str, length: usize, separator: char, marker: &str) -> Cow<'a, str> {
    let Some((cut, _)) = text.char_indices().nth(length) else {
        return Cow::Borrowed(text);
    };
    let window = &text[..cut];
    let head = match window.rfind(separator) {
        Some(pos) => &window[..pos],
        None => window,
    };
    Cow::Owned(format!("{head}{marker}"))
}

impl Post {
    // TODO: return a dedicated publish timestamp once scheduled publishing exists.
    pub fn published_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `"{id}-{parameterized title}"`, e.g. `"42-hello-world-test"`.
    pub fn to_param(&self) -> String {
        let title = slug::slugify(&self.title);
        if title.is_empty() {
            self.id.to_string()
        } else {
            format!("{}-{}", self.id, title)
        }
    }

    pub fn to_slug(&self) -> String {
        self.to_param()
    }

    /// The body cut down for index listings.
    pub fn short_body(&self) -> Cow<'_, str> {
        truncate(&self.body, SHORT_BODY_LENGTH, '\n', TRUNCATION_MARKER)
    }

    /// Name shown next to the post. `blogger` is this post's resolved blogger.
    pub fn blogger_display_name(
        &self,
        blogger: Option<&dyn Blogger>,
        config: &BlogitConfig,
    ) -> Result<String> {
        let Some(blogger) = blogger else {
            return Ok(String::new());
        };
        let method = &config.blogger_display_name_method;
        blogger.attribute(method).ok_or_else(|| {
            BlogitError::configuration(format!(
                "{}#{} is not defined",
                blogger.blogger_type(),
                method
            ))
        })
    }

    pub fn blogger_twitter_username(&self, blogger: Option<&dyn Blogger>) -> Option<String> {
        blogger.and_then(|b| b.twitter_username())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blogger::BloggerRecord;
    use crate::models::{BloggerRef, PostId};

    fn post(id: i64, title: &str, body: &str) -> Post {
        let now = Utc::now();
        Post {
            id: PostId(id),
            title: title.into(),
            body: body.into(),
            description: None,
            state: "published".into(),
            blogger: Some(BloggerRef::new("User", 1)),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn slug_combines_id_and_title() {
        assert_eq!(post(42, "Hello, World! Test", "").to_slug(), "42-hello-world-test");
        assert_eq!(post(7, "  Rust & WebAssembly -- 2024  ", "").to_param(), "7-rust-webassembly-2024");
        assert_eq!(post(3, "Crème brûlée recipes", "").to_param(), "3-creme-brulee-recipes");
        assert_eq!(post(9, "!!!", "").to_param(), "9");
    }

    #[test]
    fn published_at_is_created_at() {
        let p = post(1, "Some title here", "body");
        assert_eq!(p.published_at(), p.created_at);
    }

    #[test]
    fn short_body_leaves_short_text_alone() {
        let body = "x".repeat(400);
        let p = post(1, "Some title here", &body);
        assert!(matches!(p.short_body(), Cow::Borrowed(_)));
        assert_eq!(p.short_body(), body);
    }

    #[test]
    fn short_body_cuts_at_limit_without_newline() {
        let p = post(1, "Some title here", &"x".repeat(500));
        let short = p.short_body();
        assert_eq!(short.chars().count(), 403);
        assert!(short.starts_with(&"x".repeat(400)));
        assert!(short.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn short_body_prefers_newline() {
        let mut body = "a".repeat(150);
        body.push('\n');
        body.push_str(&"b".repeat(349));
        assert_eq!(body.chars().count(), 500);

        let short = post(1, "Some title here", &body).short_body().into_owned();
        assert_eq!(short, format!("{}{}", "a".repeat(150), TRUNCATION_MARKER));
    }

    #[test]
    fn short_body_ignores_newline_past_limit() {
        let mut body = "a".repeat(450);
        body.push('\n');
        body.push_str(&"b".repeat(49));
        let short = post(1, "Some title here", &body).short_body().into_owned();
        assert_eq!(short, format!("{}{}", "a".repeat(400), TRUNCATION_MARKER));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("ééééé", 3, '\n', "…"), "ééé…");
    }

    #[test]
    fn display_name_without_blogger_is_empty() {
        let p = post(1, "Some title here", "body");
        let name = p.blogger_display_name(None, &BlogitConfig::default()).unwrap();
        assert_eq!(name, "");
    }

    #[test]
    fn display_name_reads_configured_attribute() {
        let p = post(1, "Some title here", "body");
        let blogger = BloggerRecord::new("User", 1)
            .with_attribute("username", "ferris")
            .with_attribute("full_name", "Ferris Crab");
        let config = BlogitConfig {
            blogger_display_name_method: "full_name".into(),
            ..BlogitConfig::default()
        };
        assert_eq!(p.blogger_display_name(Some(&blogger), &config).unwrap(), "Ferris Crab");
    }

    #[test]
    fn display_name_missing_attribute_is_configuration_error() {
        let p = post(1, "Some title here", "body");
        let blogger = BloggerRecord::new("Admin", 1);
        let err = p
            .blogger_display_name(Some(&blogger), &BlogitConfig::default())
            .unwrap_err();
        match err {
            BlogitError::Configuration(message) => {
                assert_eq!(message, "Admin#username is not defined");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn twitter_username_is_optional() {
        let p = post(1, "Some title here", "body");
        let blogger = BloggerRecord::new("User", 1).with_attribute("twitter_username", "ferris");
        assert_eq!(p.blogger_twitter_username(Some(&blogger)).as_deref(), Some("ferris"));
        assert_eq!(p.blogger_twitter_username(Some(&BloggerRecord::new("User", 2))), None);
        assert_eq!(p.blogger_twitter_username(None), None);
    }
}
