//! Entity kind tags.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Discriminant for every catalog entity type.
///
/// Variant order is the insert order used at commit: every kind only
/// references kinds declared before it (follow edges are written last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Author,
    Series,
    Publisher,
    Genre,
    Editor,
    User,
    Contract,
    Book,
    Review,
    Comment,
}

impl EntityKind {
    /// All kinds in insert order.
    pub const ALL: [EntityKind; 10] = [
        Self::Author,
        Self::Series,
        Self::Publisher,
        Self::Genre,
        Self::Editor,
        Self::User,
        Self::Contract,
        Self::Book,
        Self::Review,
        Self::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Series => "series",
            Self::Publisher => "publisher",
            Self::Genre => "genre",
            Self::Editor => "editor",
            Self::User => "user",
            Self::Contract => "contract",
            Self::Book => "book",
            Self::Review => "review",
            Self::Comment => "comment",
        }
    }

    /// Parses a kind name, accepting singular or plural collection names.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let singular = match normalized.as_str() {
            "series" => "series",
            other => other.strip_suffix('s').unwrap_or(other),
        };
        Self::ALL.into_iter().find(|kind| kind.as_str() == singular)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::EntityKind;

    #[test]
    fn parse_accepts_collection_names() {
        assert_eq!(EntityKind::parse("books"), Some(EntityKind::Book));
        assert_eq!(EntityKind::parse(" Genre "), Some(EntityKind::Genre));
        assert_eq!(EntityKind::parse("series"), Some(EntityKind::Series));
        assert_eq!(EntityKind::parse("unknown"), None);
    }
}
