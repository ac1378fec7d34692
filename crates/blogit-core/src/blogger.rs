//! Bloggers are owned by the host application. Blogit only needs to read a
//! few named attributes from them, so they are modelled as a capability.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whoever wrote a post, as seen through its `BloggerRef`.
pub trait Blogger: Send + Sync + std::fmt::Debug {
    /// The type tag from the reference, e.g. "User" or "Admin".
    fn blogger_type(&self) -> &str;

    /// Reads the attribute called `name`. `None` means the blogger does not
    /// expose such an attribute at all.
    fn attribute(&self, name: &str) -> Option<String>;

    fn twitter_username(&self) -> Option<String> {
        self.attribute("twitter_username").filter(|handle| !handle.is_empty())
    }
}

/// A blogger described by a loose bag of attributes.
///
/// Keys present in `attributes` are the attributes it exposes; a JSON `null`
/// is exposed but empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloggerRecord {
    pub blogger_type: String,
    pub blogger_id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl BloggerRecord {
    pub fn new(blogger_type: impl Into<String>, blogger_id: impl ToString) -> Self {
        Self {
            blogger_type: blogger_type.into(),
            blogger_id: blogger_id.to_string(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl Blogger for BloggerRecord {
    fn blogger_type(&self) -> &str {
        &self.blogger_type
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}
