/// Lines shown when no query word occurs in the text.
pub const DEFAULT_SNIPPET_LINES: usize = 4;

/// Maximum snippet length in characters before truncation.
pub const DEFAULT_SNIPPET_MAX_CHARS: usize = 400;

/// A few lines of `text` around the first line containing any query word of
/// three or more characters (case-insensitive). Falls back to the opening
/// lines. Returns `None` for blank text.
pub fn extract_snippet(text: &str, query: &str) -> Option<String> {
    let lines: Vec<&str> =
        text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let words: Vec<String> = query
        .split_whitespace()
        .filter(|w| w.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect();

    let hit = lines.iter().position(|line| {
        let line = line.to_lowercase();
        words.iter().any(|w| line.contains(w.as_str()))
    });

    let (start, end) = match hit {
        Some(idx) => (idx.saturating_sub(1), (idx + 2).min(lines.len())),
        None => (0, DEFAULT_SNIPPET_LINES.min(lines.len())),
    };

    let snippet = lines[start..end]
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    Some(truncate_chars(&snippet, DEFAULT_SNIPPET_MAX_CHARS))
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}
