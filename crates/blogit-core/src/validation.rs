//! # Validation Gate
//!
//! Every create and update runs through here before reaching a `PostRepo`.
//! Issues are collected for all fields so a form can show them together.

use crate::config::BlogitConfig;
use crate::error::{Constraint, ValidationError};
use crate::models::{BloggerRef, NewComment, NewPost, Post};

pub const TITLE_MIN_LENGTH: usize = 10;
pub const TITLE_MAX_LENGTH: usize = 66;
pub const BODY_MIN_LENGTH: usize = 10;
pub const COMMENT_BODY_MIN_LENGTH: usize = 4;

/// Borrowed view over the validated fields, shared by `NewPost` and `Post`.
struct PostFields<'a> {
    title: &'a str,
    body: &'a str,
    description: Option<&'a str>,
    state: &'a str,
    blogger: Option<&'a BloggerRef>,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_length(
    errors: &mut ValidationError,
    field: &'static str,
    value: &str,
    minimum: usize,
    maximum: Option<usize>,
) {
    if is_blank(value) {
        errors.push(field, Constraint::Presence);
    }
    let len = char_len(value);
    if len < minimum {
        errors.push(field, Constraint::MinLength { minimum });
    }
    if let Some(maximum) = maximum {
        if len > maximum {
            errors.push(field, Constraint::MaxLength { maximum });
        }
    }
}

fn validate_fields(fields: PostFields<'_>, config: &BlogitConfig) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();

    check_length(&mut errors, "title", fields.title, TITLE_MIN_LENGTH, Some(TITLE_MAX_LENGTH));
    check_length(&mut errors, "body", fields.body, BODY_MIN_LENGTH, None);

    // Read at call time so hosts can flip the flag without rebuilding anything.
    if config.show_post_description && fields.description.is_none_or(is_blank) {
        errors.push("description", Constraint::Presence);
    }

    if fields.blogger.is_none_or(|b| is_blank(&b.blogger_id)) {
        errors.push("blogger_id", Constraint::Presence);
    }

    if is_blank(fields.state) {
        errors.push("state", Constraint::Presence);
    } else if !config.is_available_state(fields.state) {
        errors.push("state", Constraint::Inclusion);
    }

    errors.into_result()
}

impl NewPost {
    pub fn validate(&self, config: &BlogitConfig) -> Result<(), ValidationError> {
        validate_fields(
            PostFields {
                title: &self.title,
                body: &self.body,
                description: self.description.as_deref(),
                state: &self.state,
                blogger: self.blogger.as_ref(),
            },
            config,
        )
    }
}

impl Post {
    pub fn validate(&self, config: &BlogitConfig) -> Result<(), ValidationError> {
        validate_fields(
            PostFields {
                title: &self.title,
                body: &self.body,
                description: self.description.as_deref(),
                state: &self.state,
                blogger: self.blogger.as_ref(),
            },
            config,
        )
    }
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        if is_blank(&self.name) {
            errors.push("name", Constraint::Presence);
        }
        if is_blank(&self.email) {
            errors.push("email", Constraint::Presence);
        }
        check_length(&mut errors, "body", &self.body, COMMENT_BODY_MIN_LENGTH, None);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostId;

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            body: "A body that is long enough".to_string(),
            description: Some("Short description".to_string()),
            state: "published".to_string(),
            blogger: Some(BloggerRef::new("User", 1)),
            ..NewPost::default()
        }
    }

    #[test]
    fn title_length_boundaries() {
        let config = BlogitConfig::default();

        let err = new_post(&"a".repeat(9)).validate(&config).unwrap_err();
        assert_eq!(err.on("title"), vec![Constraint::MinLength { minimum: 10 }]);

        new_post(&"a".repeat(10)).validate(&config).unwrap();
        new_post(&"a".repeat(66)).validate(&config).unwrap();

        let err = new_post(&"a".repeat(67)).validate(&config).unwrap_err();
        assert_eq!(err.on("title"), vec![Constraint::MaxLength { maximum: 66 }]);
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let config = BlogitConfig::default();
        new_post(&"é".repeat(10)).validate(&config).unwrap();
    }

    #[test]
    fn blank_fields_are_reported_together() {
        let config = BlogitConfig::default();
        let post = NewPost::default();
        let err = post.validate(&config).unwrap_err();

        assert!(err.on("title").contains(&Constraint::Presence));
        assert!(err.on("body").contains(&Constraint::MinLength { minimum: 10 }));
        assert_eq!(err.on("description"), vec![Constraint::Presence]);
        assert_eq!(err.on("blogger_id"), vec![Constraint::Presence]);
        assert_eq!(err.on("state"), vec![Constraint::Presence]);
    }

    #[test]
    fn description_rule_follows_config() {
        let mut post = new_post("A valid title");
        post.description = None;

        let hidden = BlogitConfig {
            show_post_description: false,
            ..BlogitConfig::default()
        };
        post.validate(&hidden).unwrap();

        let shown = BlogitConfig::default();
        let err = post.validate(&shown).unwrap_err();
        assert_eq!(err.on("description"), vec![Constraint::Presence]);
    }

    #[test]
    fn unknown_state_is_rejected() {
        let mut post = new_post("A valid title");
        post.state = "scheduled".into();
        let err = post.validate(&BlogitConfig::default()).unwrap_err();
        assert_eq!(err.on("state"), vec![Constraint::Inclusion]);
    }

    #[test]
    fn blank_blogger_id_is_missing() {
        let mut post = new_post("A valid title");
        post.blogger = Some(BloggerRef::new("User", "  "));
        let err = post.validate(&BlogitConfig::default()).unwrap_err();
        assert_eq!(err.on("blogger_id"), vec![Constraint::Presence]);
    }

    #[test]
    fn persisted_post_uses_same_rules() {
        let now = chrono::Utc::now();
        let post = Post {
            id: PostId(1),
            title: "short".into(),
            body: "A body that is long enough".into(),
            description: Some("desc".into()),
            state: "draft".into(),
            blogger: Some(BloggerRef::new("User", 1)),
            created_at: now,
            updated_at: now,
        };
        let err = post.validate(&BlogitConfig::default()).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].field, "title");
    }

    #[test]
    fn comment_rules() {
        let comment = NewComment {
            post_id: PostId(1),
            name: "".into(),
            email: "reader@example.com".into(),
            website: None,
            body: "hi".into(),
        };
        let err = comment.validate().unwrap_err();
        assert_eq!(err.on("name"), vec![Constraint::Presence]);
        assert_eq!(err.on("body"), vec![Constraint::MinLength { minimum: 4 }]);
        assert!(err.on("email").is_empty());
    }
}
