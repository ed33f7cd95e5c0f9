//! Structured documents decoded from agent responses.
//!
//! The agent replies with a single text blob that may embed zero or more
//! "cards" (profile summaries, timeline posts) behind textual markers.
//! This module defines the decoded shape; `parser` produces it.

use serde::{Deserialize, Serialize};

/// A fully decoded agent response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentDocument {
    /// Free-form text with no embedded cards.
    PlainText { text: String },
    /// One or more cards, optionally preceded by a free-text summary.
    Cards {
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        cards: Vec<Card>,
    },
}

impl AgentDocument {
    /// Creates a plain-text document.
    pub fn plain(text: impl Into<String>) -> Self {
        AgentDocument::PlainText { text: text.into() }
    }

    /// Returns the embedded cards, if any.
    pub fn cards(&self) -> &[Card] {
        match self {
            AgentDocument::PlainText { .. } => &[],
            AgentDocument::Cards { cards, .. } => cards,
        }
    }
}

/// A structured fragment extracted from agent text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Card {
    Profile(ProfileCard),
    Post(PostCard),
}

/// A user profile summary.
///
/// Only materialized when all required fields (`username`, `bio`,
/// `image_url`) were extracted; partial profiles are never surfaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCard {
    /// Handle including the leading `@`.
    pub username: String,
    /// May span multiple lines.
    pub bio: String,
    /// Bare avatar URL, stripped of any surrounding markup.
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    /// Currently unused downstream but preserved when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

/// A single timeline post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCard {
    /// Handle including the leading `@`.
    pub author: String,
    /// Timestamp string, stored verbatim from the source text.
    pub date: String,
    /// Post body; may span multiple lines.
    pub text: String,
    /// Bare media URL, stripped of any surrounding markup.
    pub image_url: String,
    /// Agent commentary rendered beside the card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_text: Option<String>,
    /// Bare permalink URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serde_tagging() {
        let doc = AgentDocument::Cards {
            summary: Some("Search strategy: from:alice".to_string()),
            cards: vec![Card::Profile(ProfileCard {
                username: "@alice".to_string(),
                bio: "systems".to_string(),
                image_url: "https://pbs.twimg.com/a.png".to_string(),
                ..ProfileCard::default()
            })],
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "cards");
        assert_eq!(json["cards"][0]["kind"], "profile");
        // Optional fields are omitted, not null.
        assert!(json["cards"][0].get("verified").is_none());

        let back: AgentDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn plain_text_has_no_cards() {
        let doc = AgentDocument::plain("hello");
        assert!(doc.cards().is_empty());
    }
}
