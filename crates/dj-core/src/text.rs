//! Plain-text views of stored markup, and tag normalization.
//!
//! The markup itself is opaque; these helpers only need to get rid of tags.

pub const PREVIEW_CHARS: usize = 180;
pub const WORDS_PER_MINUTE: usize = 200;

/// Removes everything between `<` and `>`.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Tag-stripped text cut to [`PREVIEW_CHARS`] characters.
pub fn preview(html: &str) -> String {
    let text = strip_tags(html);
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text
    }
}

pub fn word_count(html: &str) -> usize {
    strip_tags(html).split_whitespace().count()
}

/// Estimated minutes to read, never below one.
pub fn reading_minutes(html: &str) -> usize {
    word_count(html).div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Trims tags, drops empty ones and keeps the first occurrence of duplicates.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Parses `"a, b,,c"` into normalized tags.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}
