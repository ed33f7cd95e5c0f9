//! Best-effort decoder for loosely formatted agent responses.
//!
//! The agent is instructed to embed structured cards behind `PROFILE_CARD::`
//! and `TWEET_CARD::` markers, but the formatting is not contractually
//! guaranteed: field order varies, lines wrap, fields go missing, and URLs
//! arrive wrapped in markdown brackets. The decoder therefore never fails —
//! a segment that cannot produce a complete card is dropped, and input with
//! no usable cards falls back to plain text.
//!
//! Example input:
//! ```text
//! Search strategy: searched (from:alice) over the last 7 days.
//! PROFILE_CARD::
//! Username: @alice
//! Bio: Loves systems design.
//! ImageURL: https://pbs.twimg.com/a.png
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::document::{AgentDocument, Card, PostCard, ProfileCard};

/// Marker opening a profile segment.
pub const PROFILE_MARKER: &str = "PROFILE_CARD::";
/// Marker opening a post segment.
pub const POST_MARKER: &str = "TWEET_CARD::";

/// Introductory phrases the agent opens its responses with. Everything from
/// a matched phrase up to the first card marker is treated as the summary.
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*(search strategy:|here are the latest tweets from @\w+:|i searched for [^\n:]*:)\s*(.*?)(PROFILE_CARD::|TWEET_CARD::|\z)",
    )
    .expect("summary regex is valid")
});

/// First bare URL in a field value. Trailing `)`/`]` are excluded so URLs
/// wrapped in markdown survive; URLs with literal parentheses in query
/// strings truncate (known limitation).
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s\)\]]+").expect("url regex is valid"));

/// Decodes raw agent text into a structured document.
///
/// Never fails; the worst case is `PlainText` carrying the input verbatim.
pub fn parse(raw: &str) -> AgentDocument {
    if raw.is_empty() {
        return AgentDocument::plain("");
    }

    let (summary, remaining) = extract_summary(raw);

    let mut cards = Vec::new();
    for (kind, body) in split_segments(&remaining) {
        let decoded = match kind {
            SegmentKind::Profile => decode_profile(body).map(Card::Profile),
            SegmentKind::Post => decode_post(body).map(Card::Post),
        };
        match decoded {
            Some(card) => cards.push(card),
            // Missing required fields: drop silently, never surface a
            // broken card.
            None => debug!(segment = %kind.marker(), "dropped incomplete card segment"),
        }
    }

    if !cards.is_empty() {
        return AgentDocument::Cards { summary, cards };
    }

    match summary {
        Some(summary) => AgentDocument::PlainText {
            text: format!("{summary}\n\n{remaining}").trim().to_string(),
        },
        None => AgentDocument::plain(raw),
    }
}

/// Splits off the introductory summary, if the text opens with a known
/// phrase. Returns the summary and the text that remains after it.
fn extract_summary(raw: &str) -> (Option<String>, String) {
    let Some(caps) = SUMMARY_RE.captures(raw) else {
        return (None, raw.to_string());
    };
    // The terminator group pins where the summary ends without consuming
    // the marker itself.
    let end = caps.get(3).map_or(raw.len(), |m| m.start());
    let summary = raw[..end].trim();
    if summary.is_empty() {
        return (None, raw.to_string());
    }

    // Locate the prefix by case-insensitive search rather than trusting the
    // match offsets: the model sometimes re-cases the phrase mid-response.
    let cut = find_ignore_ascii_case(raw, summary).map_or(end, |pos| pos + summary.len());
    (
        Some(summary.to_string()),
        raw[cut..].trim().to_string(),
    )
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
        .filter(|&pos| haystack.is_char_boundary(pos))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Profile,
    Post,
}

impl SegmentKind {
    fn marker(self) -> &'static str {
        match self {
            SegmentKind::Profile => PROFILE_MARKER,
            SegmentKind::Post => POST_MARKER,
        }
    }
}

/// Splits text into card segments. A marker always starts a new segment;
/// text before the first marker is unstructured preamble and is skipped.
/// Returned bodies have the marker token already stripped.
fn split_segments(text: &str) -> Vec<(SegmentKind, &str)> {
    let mut starts = Vec::new();
    for kind in [SegmentKind::Profile, SegmentKind::Post] {
        let token = kind.marker();
        let mut from = 0;
        while let Some(off) = text[from..].find(token) {
            starts.push((from + off, kind));
            from += off + token.len();
        }
    }
    starts.sort_unstable_by_key(|&(pos, _)| pos);

    let mut segments = Vec::with_capacity(starts.len());
    for (i, &(pos, kind)) in starts.iter().enumerate() {
        let body_start = pos + kind.marker().len();
        let body_end = starts.get(i + 1).map_or(text.len(), |&(next, _)| next);
        segments.push((kind, text[body_start..body_end].trim_start()));
    }
    segments
}

/// Returns the value of a `Name: value` header, or `None` if the line does
/// not start that field. Field names match case-sensitively.
fn field_header<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(name)?.strip_prefix(':').map(str::trim)
}

/// Fields that accumulate continuation lines until the next header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveField {
    Bio,
    Text,
    AdditionalText,
}

/// Line scanner state: either no field is open, or one multi-line field is
/// accumulating continuation lines.
struct Accumulator {
    active: Option<ActiveField>,
    lines: Vec<String>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            active: None,
            lines: Vec::new(),
        }
    }

    /// Opens `field`, seeded with `value` when non-empty.
    fn open(&mut self, field: ActiveField, value: &str) -> Option<(ActiveField, String)> {
        let closed = self.close();
        self.active = Some(field);
        if !value.is_empty() {
            self.lines.push(value.to_string());
        }
        closed
    }

    /// Appends a non-header line to the open field; ignored when none is open.
    fn push_line(&mut self, line: &str) {
        if self.active.is_some() {
            self.lines.push(line.to_string());
        }
    }

    /// Closes the open field, trimming trailing whitespace only — internal
    /// line breaks are preserved.
    fn close(&mut self) -> Option<(ActiveField, String)> {
        let field = self.active.take()?;
        let value = self.lines.join("\n").trim_end().to_string();
        self.lines.clear();
        Some((field, value))
    }
}

/// Extracts the first bare URL from a raw field value, or empty when none.
fn extract_url(value: &str) -> String {
    URL_RE
        .find(value)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Reads a single-line URL field: a bare `Name:` header takes the following
/// line verbatim as the value and advances the cursor past it.
fn url_field_value(value: &str, lines: &[&str], i: &mut usize) -> String {
    if value.is_empty() {
        if let Some(next) = lines.get(*i + 1) {
            *i += 1;
            return extract_url(next.trim());
        }
        return String::new();
    }
    extract_url(value)
}

fn decode_profile(body: &str) -> Option<ProfileCard> {
    let mut card = ProfileCard::default();
    let mut acc = Accumulator::new();
    let lines: Vec<&str> = body.lines().collect();

    let mut store = |closed: Option<(ActiveField, String)>, card: &mut ProfileCard| {
        if let Some((ActiveField::Bio, value)) = closed {
            card.bio = value;
        }
    };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some(v) = field_header(line, "Username") {
            store(acc.close(), &mut card);
            card.username = v.to_string();
        } else if let Some(v) = field_header(line, "Bio") {
            let closed = acc.open(ActiveField::Bio, v);
            store(closed, &mut card);
        } else if let Some(v) = field_header(line, "ImageURL") {
            store(acc.close(), &mut card);
            card.image_url = url_field_value(v, &lines, &mut i);
        } else if let Some(v) = field_header(line, "ProfileURL") {
            store(acc.close(), &mut card);
            let url = url_field_value(v, &lines, &mut i);
            card.profile_url = (!url.is_empty()).then_some(url);
        } else if let Some(v) = field_header(line, "DisplayName") {
            store(acc.close(), &mut card);
            card.display_name = (!v.is_empty()).then(|| v.to_string());
        } else if let Some(v) = field_header(line, "Verified") {
            store(acc.close(), &mut card);
            card.verified = Some(v.eq_ignore_ascii_case("true"));
        } else {
            acc.push_line(line);
        }
        i += 1;
    }
    store(acc.close(), &mut card);

    (!card.username.is_empty() && !card.bio.is_empty() && !card.image_url.is_empty())
        .then_some(card)
}

fn decode_post(body: &str) -> Option<PostCard> {
    let mut card = PostCard::default();
    let mut additional = String::new();
    let mut acc = Accumulator::new();
    let lines: Vec<&str> = body.lines().collect();

    let mut store =
        |closed: Option<(ActiveField, String)>, card: &mut PostCard, additional: &mut String| {
            match closed {
                Some((ActiveField::Text, value)) => card.text = value,
                Some((ActiveField::AdditionalText, value)) => *additional = value,
                _ => {}
            }
        };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some(v) = field_header(line, "Author") {
            store(acc.close(), &mut card, &mut additional);
            card.author = v.to_string();
        } else if let Some(v) = field_header(line, "Date") {
            store(acc.close(), &mut card, &mut additional);
            card.date = v.to_string();
        } else if let Some(v) = field_header(line, "Tweet") {
            let closed = acc.open(ActiveField::Text, v);
            store(closed, &mut card, &mut additional);
        } else if let Some(v) = field_header(line, "Additional_Text") {
            let closed = acc.open(ActiveField::AdditionalText, v);
            store(closed, &mut card, &mut additional);
        } else if let Some(v) = field_header(line, "ImageURL") {
            store(acc.close(), &mut card, &mut additional);
            card.image_url = url_field_value(v, &lines, &mut i);
        } else if let Some(v) = field_header(line, "TweetURL") {
            store(acc.close(), &mut card, &mut additional);
            let url = url_field_value(v, &lines, &mut i);
            card.permalink = (!url.is_empty()).then_some(url);
        } else {
            acc.push_line(line);
        }
        i += 1;
    }
    store(acc.close(), &mut card, &mut additional);

    // The model sometimes puts its only content line under Additional_Text;
    // promote it so the card is not dropped for a labeling slip.
    if card.text.is_empty() && !additional.is_empty() {
        card.text = additional;
    } else if !additional.is_empty() {
        card.additional_text = Some(additional);
    }

    (!card.author.is_empty()
        && !card.date.is_empty()
        && !card.text.is_empty()
        && !card.image_url.is_empty())
    .then_some(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize_profile(card: &ProfileCard) -> String {
        format!(
            "PROFILE_CARD::\nUsername: {}\nBio: {}\nImageURL: {}\n",
            card.username, card.bio, card.image_url
        )
    }

    #[test]
    fn empty_input_is_empty_plain_text() {
        assert_eq!(parse(""), AgentDocument::plain(""));
    }

    #[test]
    fn markerless_input_stays_plain_text() {
        let raw = "Nothing structured here.\nJust prose across lines.";
        assert_eq!(parse(raw), AgentDocument::plain(raw));
    }

    #[test]
    fn markerless_input_with_summary_is_stripped_plain_text() {
        let raw = "Search strategy: looked for (from:alice) over the last week.";
        let AgentDocument::PlainText { text } = parse(raw) else {
            panic!("expected plain text");
        };
        assert_eq!(
            text,
            "Search strategy: looked for (from:alice) over the last week."
        );
    }

    #[test]
    fn well_formed_profile_segment() {
        let raw = "PROFILE_CARD::\nUsername: @alice\nBio: Loves systems design.\nImageURL: https://pbs.twimg.com/a.png\n";
        let doc = parse(raw);
        assert_eq!(
            doc,
            AgentDocument::Cards {
                summary: None,
                cards: vec![Card::Profile(ProfileCard {
                    username: "@alice".to_string(),
                    bio: "Loves systems design.".to_string(),
                    image_url: "https://pbs.twimg.com/a.png".to_string(),
                    ..ProfileCard::default()
                })],
            }
        );
    }

    #[test]
    fn profile_round_trips_required_fields() {
        let card = ProfileCard {
            username: "@eng_lead".to_string(),
            bio: "Compilers and coffee.".to_string(),
            image_url: "https://pbs.twimg.com/profiles/x.jpg".to_string(),
            ..ProfileCard::default()
        };
        let parsed = parse(&serialize_profile(&card));
        assert_eq!(parsed.cards(), &[Card::Profile(card)]);
    }

    #[test]
    fn profile_missing_bio_is_dropped_silently() {
        let raw = "PROFILE_CARD::\nUsername: @alice\nImageURL: https://pbs.twimg.com/a.png\n";
        // No cards survive and no summary exists, so the raw text comes back.
        assert_eq!(parse(raw), AgentDocument::plain(raw));
    }

    #[test]
    fn card_order_follows_marker_order() {
        let raw = "TWEET_CARD::\nAuthor: @a\nDate: 2025-05-01 10:00:00\nTweet: first\nImageURL: https://x.com/1.png\n\
                   PROFILE_CARD::\nUsername: @a\nBio: b\nImageURL: https://x.com/p.png\n\
                   TWEET_CARD::\nAuthor: @b\nDate: 2025-05-02 10:00:00\nTweet: second\nImageURL: https://x.com/2.png\n";
        let doc = parse(raw);
        let kinds: Vec<&str> = doc
            .cards()
            .iter()
            .map(|c| match c {
                Card::Profile(_) => "profile",
                Card::Post(_) => "post",
            })
            .collect();
        assert_eq!(kinds, ["post", "profile", "post"]);
    }

    #[test]
    fn markdown_wrapped_url_decodes_to_bare_url() {
        let raw = "PROFILE_CARD::\nUsername: @alice\nBio: hi\nImageURL: [https://pbs.twimg.com/a.png](https://pbs.twimg.com/a.png)\n";
        let doc = parse(raw);
        let Card::Profile(card) = &doc.cards()[0] else {
            panic!("expected profile card");
        };
        assert_eq!(card.image_url, "https://pbs.twimg.com/a.png");
    }

    #[test]
    fn summary_precedes_cards_and_is_not_duplicated() {
        let raw = "Search strategy: queried (from:alice) for the last 7 days.\n\n\
                   TWEET_CARD::\nAuthor: @alice\nDate: 2025-05-01 10:00:00\nTweet: shipping it\nImageURL: https://x.com/1.png\n";
        let AgentDocument::Cards { summary, cards } = parse(raw) else {
            panic!("expected cards");
        };
        assert_eq!(
            summary.as_deref(),
            Some("Search strategy: queried (from:alice) for the last 7 days.")
        );
        let Card::Post(post) = &cards[0] else {
            panic!("expected post card");
        };
        assert_eq!(post.text, "shipping it");
    }

    #[test]
    fn summary_phrase_matches_case_insensitively() {
        let raw = "SEARCH STRATEGY: shouted query.\nTWEET_CARD::\nAuthor: @a\nDate: d\nTweet: t\nImageURL: https://x.com/1.png\n";
        let AgentDocument::Cards { summary, .. } = parse(raw) else {
            panic!("expected cards");
        };
        assert_eq!(summary.as_deref(), Some("SEARCH STRATEGY: shouted query."));
    }

    #[test]
    fn multi_line_bio_keeps_internal_breaks() {
        let raw = "PROFILE_CARD::\nUsername: @alice\nBio: First line.\nSecond line.\n\nImageURL: https://x.com/p.png\n";
        let doc = parse(raw);
        let Card::Profile(card) = &doc.cards()[0] else {
            panic!("expected profile card");
        };
        assert_eq!(card.bio, "First line.\nSecond line.");
    }

    #[test]
    fn bare_url_header_takes_next_line() {
        let raw = "PROFILE_CARD::\nUsername: @alice\nBio: hi\nImageURL:\nhttps://pbs.twimg.com/a.png\n";
        let doc = parse(raw);
        let Card::Profile(card) = &doc.cards()[0] else {
            panic!("expected profile card");
        };
        assert_eq!(card.image_url, "https://pbs.twimg.com/a.png");
    }

    #[test]
    fn additional_text_promotes_into_empty_tweet() {
        let raw = "TWEET_CARD::\nAuthor: @a\nDate: 2025-05-01\nTweet:\nAdditional_Text: hello\nImageURL: https://x.com/1.png\n";
        let doc = parse(raw);
        let Card::Post(post) = &doc.cards()[0] else {
            panic!("expected post card");
        };
        assert_eq!(post.text, "hello");
        assert_eq!(post.additional_text, None);
    }

    #[test]
    fn additional_text_kept_beside_non_empty_tweet() {
        let raw = "TWEET_CARD::\nAuthor: @a\nDate: 2025-05-01\nTweet: body\nAdditional_Text: commentary\nImageURL: https://x.com/1.png\nTweetURL: https://x.com/a/status/1\n";
        let doc = parse(raw);
        let Card::Post(post) = &doc.cards()[0] else {
            panic!("expected post card");
        };
        assert_eq!(post.text, "body");
        assert_eq!(post.additional_text.as_deref(), Some("commentary"));
        assert_eq!(post.permalink.as_deref(), Some("https://x.com/a/status/1"));
    }

    #[test]
    fn verified_value_matches_case_insensitively() {
        let raw = "PROFILE_CARD::\nUsername: @a\nBio: b\nVerified: TRUE\nImageURL: https://x.com/p.png\n";
        let doc = parse(raw);
        let Card::Profile(card) = &doc.cards()[0] else {
            panic!("expected profile card");
        };
        assert_eq!(card.verified, Some(true));
    }

    #[test]
    fn unlabeled_preamble_is_discarded_when_cards_exist() {
        let raw = "some stray model chatter\nPROFILE_CARD::\nUsername: @a\nBio: b\nImageURL: https://x.com/p.png\n";
        let AgentDocument::Cards { summary, cards } = parse(raw) else {
            panic!("expected cards");
        };
        assert_eq!(summary, None);
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn url_without_scheme_leaves_field_empty_and_drops_card() {
        let raw = "PROFILE_CARD::\nUsername: @a\nBio: b\nImageURL: not-a-url\n";
        assert!(parse(raw).cards().is_empty());
    }

    #[test]
    fn find_ignore_ascii_case_basic() {
        assert_eq!(find_ignore_ascii_case("Hello World", "world"), Some(6));
        assert_eq!(find_ignore_ascii_case("Hello", "xyz"), None);
        assert_eq!(find_ignore_ascii_case("abc", ""), None);
    }
}
