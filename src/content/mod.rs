// FormRelay - Parsed content model
//
// Generated text comes back from the workflow engine as loosely structured
// markdown-ish prose. The parser turns it into a title plus ordered sections;
// the renderer turns those into display blocks.

pub mod parser;
pub mod workout;

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use parser::{parse, parse_recipe, Recipe};

// ---------------------------------------------------------------------------
// Content kind
// ---------------------------------------------------------------------------

/// Display-oriented category governing how result text is segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Story,
    Food,
    Business,
    Workout,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Story,
        ContentKind::Food,
        ContentKind::Business,
        ContentKind::Workout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Story => "story",
            ContentKind::Food => "food",
            ContentKind::Business => "business",
            ContentKind::Workout => "workout",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| RelayError::InvalidWorkflow(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Parsed structure
// ---------------------------------------------------------------------------

/// One structurally distinct unit of parsed display content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Section {
    Paragraph(String),
    Heading(String),
    BulletList(Vec<String>),
    NumberedList(Vec<String>),
}

/// Side-channel facts shown next to the title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_time_minutes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_count: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedContent {
    pub title: String,
    pub sections: Vec<Section>,
    pub metadata: Metadata,
}

#[cfg(test)]
impl ParsedContent {
    /// All list sections in order, bullet and numbered alike.
    pub(crate) fn lists(&self) -> Vec<&[String]> {
        self.sections
            .iter()
            .filter_map(|s| match s {
                Section::BulletList(items) | Section::NumberedList(items) => {
                    Some(items.as_slice())
                }
                _ => None,
            })
            .collect()
    }

    /// The first paragraph, if any.
    pub(crate) fn paragraph(&self) -> Option<&str> {
        self.sections.iter().find_map(|s| match s {
            Section::Paragraph(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ContentKind::ALL {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_invalid_workflow() {
        let err = "poem".parse::<ContentKind>().unwrap_err();
        assert!(matches!(err, RelayError::InvalidWorkflow(ref id) if id == "poem"));
    }

    #[test]
    fn test_kind_is_case_sensitive() {
        assert!("Food".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_section_serializes_tagged() {
        let json = serde_json::to_value(Section::BulletList(vec!["Egg".into()])).unwrap();
        assert_eq!(json["type"], "bullet_list");
        assert_eq!(json["content"][0], "Egg");
    }
}
