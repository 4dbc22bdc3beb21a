//! Literal marker search with whitespace tolerance.
//!
//! A marker matches its text literally, except that every whitespace run in the
//! marker matches any non-empty whitespace run in the document. A run that holds a
//! line break only matches a run that holds one too. `"\n}"` therefore finds
//! `"\n  }"` but not `" }"`, and `"\section{General Skills}"` survives a line wrap.

use std::ops::Range;

use regex::Regex;

#[derive(Debug, Clone)]
pub struct MarkerPattern {
    regex: Regex,
}

impl MarkerPattern {
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&marker_to_pattern(marker))?,
        })
    }

    /// First occurrence at or after `from`, as a byte range into `haystack`.
    pub fn find_from(&self, haystack: &str, from: usize) -> Option<Range<usize>> {
        if from > haystack.len() {
            return None;
        }
        self.regex.find_at(haystack, from).map(|m| m.range())
    }
}

fn marker_to_pattern(marker: &str) -> String {
    let mut pattern = String::with_capacity(marker.len() * 2);
    let mut literal = String::new();
    let mut whitespace = String::new();

    for ch in marker.chars() {
        if ch.is_whitespace() {
            if whitespace.is_empty() {
                pattern.push_str(&regex::escape(&literal));
                literal.clear();
            }
            whitespace.push(ch);
        } else {
            if !whitespace.is_empty() {
                pattern.push_str(whitespace_pattern(&whitespace));
                whitespace.clear();
            }
            literal.push(ch);
        }
    }
    if !whitespace.is_empty() {
        pattern.push_str(whitespace_pattern(&whitespace));
    }
    pattern.push_str(&regex::escape(&literal));
    pattern
}

/// A run holding a line break still needs one in the document; indentation and
/// `\r` around it are free.
fn whitespace_pattern(run: &str) -> &'static str {
    if run.contains('\n') {
        r"[^\S\n]*\n\s*"
    } else {
        r"\s+"
    }
}
