//! # BlogitError
//!
//! Centralized error handling for the Blogit engine.
//! Maps validation, lookup and configuration failures to actionable error types.

use std::fmt;

use thiserror::Error;

/// The primary error type for all blogit-core operations.
#[derive(Error, Debug)]
pub enum BlogitError {
    /// One or more fields violated their constraints on write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No (active) record matched the requested identifier.
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// The host application is misconfigured (e.g., comments disabled but accessed).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A collaborator adapter (storage, tags, comments, bloggers) failed.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl BlogitError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// A specialized Result type for Blogit logic.
pub type Result<T> = std::result::Result<T, BlogitError>;

/// The rule a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Missing, empty or whitespace only.
    Presence,
    /// Shorter than `minimum` characters.
    MinLength { minimum: usize },
    /// Longer than `maximum` characters.
    MaxLength { maximum: usize },
    /// Not one of the allowed values.
    Inclusion,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Presence => f.write_str("can't be blank"),
            Constraint::MinLength { minimum } => {
                write!(f, "is too short (minimum is {minimum} characters)")
            }
            Constraint::MaxLength { maximum } => {
                write!(f, "is too long (maximum is {maximum} characters)")
            }
            Constraint::Inclusion => f.write_str("is not included in the list"),
        }
    }
}

/// A single field failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub constraint: Constraint,
}

impl ValidationIssue {
    pub fn new(field: &'static str, constraint: Constraint) -> Self {
        Self { field, constraint }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.constraint)
    }
}

/// Collection of validation issues encountered while preparing a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues reported against `field`, in the order they were found.
    pub fn on(&self, field: &str) -> Vec<Constraint> {
        self.issues
            .iter()
            .filter(|issue| issue.field == field)
            .map(|issue| issue.constraint)
            .collect()
    }

    pub(crate) fn push(&mut self, field: &'static str, constraint: Constraint) {
        self.issues.push(ValidationIssue::new(field, constraint));
    }

    /// `Ok(())` when nothing was collected.
    pub(crate) fn into_result(self) -> std::result::Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed: ")?;
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
