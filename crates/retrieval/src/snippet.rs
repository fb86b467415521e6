use serde::{Deserialize, Serialize};

pub const DEFAULT_SNIPPET_MAX_CHARS: usize = 160;
pub const DEFAULT_WORD_BOUNDARY_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Upper bound on snippet length, in chars
    pub max_chars: usize,

    /// A cut at the last space is used only if that space sits at or past
    /// `max_chars * word_boundary_threshold`
    pub word_boundary_threshold: f32,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_SNIPPET_MAX_CHARS,
            word_boundary_threshold: DEFAULT_WORD_BOUNDARY_THRESHOLD,
        }
    }
}

/// Single-line preview of `content`, at most `config.max_chars` chars.
///
/// Whitespace runs (newlines included) collapse to one space. Long text is
/// cut at the last word boundary when that keeps enough of the prefix,
/// otherwise at exactly `max_chars`.
#[must_use]
pub fn format_snippet(content: &str, config: &SnippetConfig) -> String {
    let text = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let max = config.max_chars;

    let Some((cut, _)) = text.char_indices().nth(max) else {
        return text;
    };
    let truncated = &text[..cut];

    let min_boundary = max as f64 * f64::from(config.word_boundary_threshold);
    let snippet = match truncated.rfind(' ') {
        Some(space) if truncated[..space].chars().count() as f64 >= min_boundary => {
            &truncated[..space]
        }
        _ => truncated,
    };
    snippet.trim_end().to_string()
}
