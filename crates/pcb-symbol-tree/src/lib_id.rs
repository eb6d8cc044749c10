use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Library-qualified symbol identifier, written `Library:Name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LibId {
    nickname: String,
    item_name: String,
}

impl LibId {
    pub fn new(nickname: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            item_name: item_name.into(),
        }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// An id is usable for lookups once it names an item.
    pub fn is_valid(&self) -> bool {
        !self.item_name.is_empty()
    }
}

impl fmt::Display for LibId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nickname.is_empty() {
            write!(f, "{}", self.item_name)
        } else {
            write!(f, "{}:{}", self.nickname, self.item_name)
        }
    }
}

impl FromStr for LibId {
    type Err = std::convert::Infallible;

    /// Split on the first `:`; text without one is an item name alone.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once(':') {
            Some((nickname, item_name)) => Self::new(nickname.trim(), item_name.trim()),
            None => Self::new("", s.trim()),
        })
    }
}

impl From<LibId> for String {
    fn from(id: LibId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for LibId {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
