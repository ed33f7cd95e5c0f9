//! Twitter tools, executed as Composio-hosted actions.

pub mod create_post;
pub mod follow_user;
pub mod recent_search;
pub mod unfollow_user;
pub mod user_lookup;

/// Strips a leading `@` so users can be referenced either way.
fn normalize_username(raw: &str) -> &str {
    raw.trim().trim_start_matches('@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_username_strips_at_sign() {
        assert_eq!(normalize_username("@alice"), "alice");
        assert_eq!(normalize_username("  alice  "), "alice");
        assert_eq!(normalize_username("alice"), "alice");
    }
}
