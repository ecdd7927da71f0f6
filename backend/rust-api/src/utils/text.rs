//! Plain-text normalization for free-text descriptions coming from the feed.

/// Upper bound on a stored description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Column widths for feed-supplied fields stored on an event.
pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_LOCATION_CHARS: usize = 255;
pub const MAX_CITY_CHARS: usize = 100;

/// Substituted when a description is empty after cleaning.
pub const EMPTY_DESCRIPTION: &str = "No description available";

/// Strip markup from `raw`, keeping line structure, and cap the result at
/// [`MAX_DESCRIPTION_CHARS`]. Never returns an empty string.
pub fn sanitize(raw: &str) -> String {
    let text = raw
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p>", "\n\n");

    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    let mut cleaned = stripped.trim().to_string();
    while cleaned.contains("\n\n\n") {
        cleaned = cleaned.replace("\n\n\n", "\n\n");
    }

    truncate_chars(&mut cleaned, MAX_DESCRIPTION_CHARS);

    if cleaned.is_empty() {
        EMPTY_DESCRIPTION.to_string()
    } else {
        cleaned
    }
}

/// Cut `text` to at most `max` characters, never splitting a character.
pub fn truncate_chars(text: &mut String, max: usize) {
    if let Some((byte_idx, _)) = text.char_indices().nth(max) {
        text.truncate(byte_idx);
    }
}
