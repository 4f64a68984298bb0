//! Anchor slugs for in-page headings.
//!
//! Slugs keep ASCII letters and digits plus the Japanese scripts that blog
//! headings are usually written in (CJK ideographs, hiragana, katakana and the
//! prolonged sound mark), so “はじめに” stays readable in the URL fragment
//! instead of being transliterated or dropped.

use std::collections::{HashMap, HashSet};

/// Base used when a heading produces no slug characters at all.
pub const FALLBACK_ANCHOR: &str = "section";

/// Derive a fragment slug from heading text.
///
/// Lowercases the input, collapses every run of unsupported characters into a
/// single `-` and trims hyphens from both ends. May return an empty string.
pub fn slugify_heading(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if is_slug_char(ch) {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }

    slug
}

fn is_slug_char(ch: char) -> bool {
    matches!(
        ch,
        'a'..='z'
            | '0'..='9'
            | '\u{4E00}'..='\u{9FAF}'
            | '\u{3041}'..='\u{3093}'
            | '\u{30A1}'..='\u{30F3}'
            | '\u{30FC}'
    )
}

/// Deterministically generate unique anchor slugs within a single document.
///
/// Headings processed in order will receive monotonic suffixes when duplicates
/// occur (e.g. `section`, `section-2`, `section-3`). A suffixed slug that
/// collides with a heading's own slug is bumped again, so `Intro`, `Intro`,
/// `Intro 2` yields `intro`, `intro-2`, `intro-2-2`.
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl AnchorSlugger {
    /// Create a new slugger instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a slug for the provided heading text, unique within this
    /// slugger. Text without any slug characters falls back to
    /// [`FALLBACK_ANCHOR`].
    pub fn anchor_for(&mut self, heading: &str) -> String {
        let mut base = slugify_heading(heading);
        if base.is_empty() {
            base = FALLBACK_ANCHOR.to_string();
        }

        let count = self.occurrences.entry(base.clone()).or_insert(0);
        loop {
            *count += 1;
            let candidate = if *count == 1 {
                base.clone()
            } else {
                format!("{base}-{count}")
            };
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
