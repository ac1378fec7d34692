//! Tag lists as entered by bloggers ("rust, web, announcements").

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered, duplicate-free list of tag names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TagListRepr", into = "Vec<String>")]
pub struct TagList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum TagListRepr {
    Text(String),
    Items(Vec<String>),
}

impl From<TagListRepr> for TagList {
    fn from(repr: TagListRepr) -> Self {
        match repr {
            TagListRepr::Text(text) => TagList::parse(&text),
            TagListRepr::Items(items) => items.into_iter().collect(),
        }
    }
}

impl From<TagList> for Vec<String> {
    fn from(list: TagList) -> Self {
        list.0
    }
}

impl TagList {
    /// Splits on commas, trims, drops blanks and repeats.
    pub fn parse(text: &str) -> Self {
        text.split(',').collect()
    }

    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag.trim());
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = TagList::default();
        for tag in iter {
            list.add(tag.as_ref());
        }
        list
    }
}

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}
