//! Articles read and archived in the read-it-later service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A highlighted passage with an optional note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Annotation {
    /// The highlighted text
    pub quote: String,

    /// The note attached to the highlight
    #[serde(default)]
    pub text: String,
}

/// An archived article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Article {
    pub title: String,

    /// URL of the article on its original site
    pub original_url: String,

    /// When the article was marked as read
    pub archived_at: DateTime<Utc>,

    /// When the article was first saved
    pub created_at: DateTime<Utc>,

    /// Public share link on the archive service
    pub share_url: String,

    /// Tag labels, without duplicates
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Article {
    /// Add a tag unless it is already present
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Tags in Logseq page-reference form: `#[[a]], #[[b]]`
    pub fn tag_references(&self) -> String {
        self.tags
            .iter()
            .map(|tag| format!("#[[{}]]", tag))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
