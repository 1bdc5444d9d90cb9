//! Text utilities

use std::borrow::Cow;

/// Normalize line breaks so that `\r\n` and lone `\r` become `\n`
pub fn normalize_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }

    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Split text into the lines that are drawn one per baseline
///
/// Line breaks are normalized first. Trailing empty lines are dropped, while
/// empty lines in the middle are kept so that blank lines still advance the
/// baseline. An empty text yields a single empty line.
///
/// # Arguments
/// * `text` - Text to split
pub fn split_lines(text: &str) -> Vec<String> {
    let normalized = normalize_line_breaks(text);
    if normalized.is_empty() {
        return vec![String::new()];
    }

    let mut lines: Vec<String> = normalized.split('\n').map(str::to_string).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines
}
