//! Human-readable notification text.
//!
//! The content is rendered once, at creation time, and stored verbatim. The
//! `<strong>` markup is what the web client expects to render inline.

use crate::constants::TITLE_PREVIEW_CHARS;

/// Cut `text` to at most `max_chars` characters, appending `...` when
/// anything was removed. Counts `char`s, not bytes.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub fn like_content(sender_username: &str, post_title: &str) -> String {
    format!(
        "<strong>{}</strong> liked your post: <strong>{}</strong>",
        sender_username,
        truncate(post_title, TITLE_PREVIEW_CHARS)
    )
}

pub fn comment_content(sender_username: &str, post_title: &str) -> String {
    format!(
        "<strong>{}</strong> commented on your post: <strong>{}</strong>",
        sender_username,
        truncate(post_title, TITLE_PREVIEW_CHARS)
    )
}

/// Client-side route for a post.
pub fn post_link(post_id: &str) -> String {
    format!("/posts/{post_id}")
}
