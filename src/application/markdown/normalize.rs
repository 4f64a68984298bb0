//! Emphasis and heading-marker normalization for author-written markdown.
//!
//! Authors typing on Japanese IMEs often end up with full-width or look-alike
//! star characters (`＊＊強調＊＊`, `∗∗note∗∗`) and full-width heading marks
//! (`＃＃ 見出し`) that no markdown renderer recognises. The rewrite below turns
//! those into canonical `**text**` and `##` while leaving code untouched.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Fenced blocks first so a fence is never split into inline spans.
static CODE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```|`[^`\n]*`").expect("code span pattern"));

static STAR_LIKE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([*＊﹡∗✱]{2})([^\S\r\n]*)([^\r\n]+?)([^\S\r\n]*)([*＊﹡∗✱]{2})")
        .expect("star-like pair pattern")
});

static CANONICAL_STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*[^*\r\n]+?\*\*$").expect("canonical strong pattern"));

static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\r\n]+?)\*\*").expect("strong pattern"));

static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([^\S\r\n]*)([＃#]{2,4})([^\S\r\n]+)(.+)$").expect("heading marker pattern")
});

/// Normalize emphasis and heading markers outside of code spans.
///
/// The rewrite is idempotent and never fails; text that matches none of the
/// patterns is returned unchanged.
pub fn normalize_markdown(markdown: &str) -> String {
    let mut output = String::with_capacity(markdown.len());
    let mut cursor = 0;

    for code in CODE_SPAN.find_iter(markdown) {
        let segment = &markdown[cursor..code.start()];
        output.push_str(&normalize_text_segment(segment, at_line_start(markdown, cursor)));
        output.push_str(code.as_str());
        cursor = code.end();
    }

    let tail = &markdown[cursor..];
    output.push_str(&normalize_text_segment(tail, at_line_start(markdown, cursor)));
    output
}

fn at_line_start(source: &str, offset: usize) -> bool {
    offset == 0 || source[..offset].ends_with('\n')
}

/// Rewrite until a fixed point. A single pass can leave a fresh star pair at
/// the edge of one it just rewrote (`**＊＊**` becomes `**＊***`).
fn normalize_text_segment(segment: &str, starts_line: bool) -> String {
    let mut current = rewrite_text_segment(segment, starts_line);
    // Every pass returns its input unchanged or a strictly shorter string.
    loop {
        let next = rewrite_text_segment(&current, starts_line);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn rewrite_text_segment(segment: &str, starts_line: bool) -> String {
    if segment.is_empty() {
        return String::new();
    }

    let headings = normalize_heading_lines(segment, starts_line);
    let pairs = STAR_LIKE_PAIR.replace_all(&headings, |caps: &Captures<'_>| {
        rewrite_star_pair(caps)
    });
    let strong = STRONG.replace_all(&pairs, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let text = trim_horizontal(&caps[1]);
        if text.is_empty() {
            whole.to_string()
        } else {
            format!("**{text}**")
        }
    });

    strong.into_owned()
}

/// Rewrite heading marks on every line that actually starts in this segment.
///
/// When the segment begins mid-line (right after an inline code span), its
/// first line is copied as-is.
fn normalize_heading_lines(segment: &str, starts_line: bool) -> Cow<'_, str> {
    let (head, body) = if starts_line {
        ("", segment)
    } else {
        match segment.find('\n') {
            Some(newline) => segment.split_at(newline + 1),
            None => return Cow::Borrowed(segment),
        }
    };

    let rewritten = HEADING_MARKER.replace_all(body, |caps: &Captures<'_>| {
        let marks = caps[2].replace('＃', "#");
        format!("{}{}{}{}", &caps[1], marks, &caps[3], &caps[4])
    });

    match rewritten {
        Cow::Borrowed(_) => Cow::Borrowed(segment),
        Cow::Owned(body) => Cow::Owned(format!("{head}{body}")),
    }
}

fn rewrite_star_pair(caps: &Captures<'_>) -> String {
    let whole = &caps[0];
    let left = &caps[2];
    let right = &caps[4];
    let text = trim_horizontal(&caps[3]);

    if text.is_empty() {
        return whole.to_string();
    }
    if left.is_empty() && right.is_empty() && CANONICAL_STRONG.is_match(whole) {
        return whole.to_string();
    }
    format!("**{text}**")
}

/// Trim spaces and tabs (any whitespace except line breaks) from both ends.
fn trim_horizontal(value: &str) -> &str {
    value.trim_matches(|ch: char| ch.is_whitespace() && ch != '\n' && ch != '\r')
}
