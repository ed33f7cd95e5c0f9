//! Terminal rendering for parsed agent documents.

use chrono::NaiveDateTime;
use comfy_table::{ContentArrangement, Table};
use roost_core::document::{AgentDocument, Card, PostCard, ProfileCard};

/// Renders a document to printable text: plain responses verbatim, card
/// responses as a summary line followed by one table per card.
pub fn render_document(doc: &AgentDocument) -> String {
    match doc {
        AgentDocument::PlainText { text } => format!("{text}\n"),
        AgentDocument::Cards { summary, cards } => {
            let mut out = String::new();
            if let Some(summary) = summary {
                out.push_str(summary);
                out.push_str("\n\n");
            }
            for card in cards {
                let table = match card {
                    Card::Profile(profile) => profile_table(profile),
                    Card::Post(post) => post_table(post),
                };
                out.push_str(&table.to_string());
                out.push('\n');
            }
            out
        }
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn profile_table(profile: &ProfileCard) -> Table {
    let mut table = base_table();

    let mut username = profile.username.clone();
    if profile.verified == Some(true) {
        username.push_str(" \u{2713}");
    }
    match &profile.display_name {
        Some(display_name) => table.set_header(vec![display_name.as_str(), username.as_str()]),
        None => table.set_header(vec!["Profile", username.as_str()]),
    };

    table.add_row(vec!["Bio", profile.bio.as_str()]);
    table.add_row(vec!["Image", profile.image_url.as_str()]);
    if let Some(profile_url) = &profile.profile_url {
        table.add_row(vec!["Link", profile_url.as_str()]);
    }
    table
}

fn post_table(post: &PostCard) -> Table {
    let mut table = base_table();
    let date = format_date(&post.date);
    table.set_header(vec![post.author.as_str(), date.as_str()]);

    table.add_row(vec!["Tweet", post.text.as_str()]);
    if let Some(additional) = &post.additional_text {
        table.add_row(vec!["Note", additional.as_str()]);
    }
    table.add_row(vec!["Image", post.image_url.as_str()]);
    if let Some(permalink) = &post.permalink {
        table.add_row(vec!["Link", permalink.as_str()]);
    }
    table
}

/// Reformats `YYYY-MM-DD HH:MM:SS` dates for display; anything else is
/// shown verbatim.
fn format_date(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%b %-d, %Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_renders_verbatim_with_newline() {
        let doc = AgentDocument::plain("hello");
        assert_eq!(render_document(&doc), "hello\n");
    }

    #[test]
    fn summary_precedes_card_tables() {
        let doc = AgentDocument::Cards {
            summary: Some("Search strategy: looked around.".to_string()),
            cards: vec![Card::Profile(ProfileCard {
                username: "@alice".to_string(),
                bio: "hi".to_string(),
                image_url: "https://x.com/a.png".to_string(),
                ..ProfileCard::default()
            })],
        };
        let out = render_document(&doc);
        assert!(out.starts_with("Search strategy: looked around.\n\n"));
        assert!(out.contains("@alice"));
        assert!(out.contains("https://x.com/a.png"));
    }

    #[test]
    fn verified_profile_gets_a_check_mark() {
        let mut profile = ProfileCard {
            username: "@alice".to_string(),
            bio: "hi".to_string(),
            image_url: "https://x.com/a.png".to_string(),
            ..ProfileCard::default()
        };
        profile.verified = Some(true);
        let out = profile_table(&profile).to_string();
        assert!(out.contains("@alice \u{2713}"));
    }

    #[test]
    fn post_date_is_reformatted_when_parseable() {
        assert_eq!(format_date("2025-05-01 10:30:00"), "May 1, 2025 10:30");
        assert_eq!(format_date("sometime yesterday"), "sometime yesterday");
    }
}
