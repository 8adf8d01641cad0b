//! Keyword scoring of document paragraphs.
//!
//! Three passes, each looser than the previous, only run when the one before came up
//! empty. Survivors are ranked by how many query keywords they contain.

use std::cmp::Reverse;

/// Shortest query word kept as a keyword
pub const MIN_KEYWORD_CHARS: usize = 3;
/// Shortest query word kept by the partial-match pass
pub const MIN_PARTIAL_CHARS: usize = 4;
/// Length of the word prefix tried by the partial-match pass
pub const PARTIAL_PREFIX_CHARS: usize = 4;
/// Partial matches must be longer than this once trimmed
pub const PARTIAL_MIN_PARAGRAPH_CHARS: usize = 10;
/// Leading paragraphs must be longer than this once trimmed
pub const LEADING_MIN_PARAGRAPH_CHARS: usize = 20;
/// Paragraphs returned in an excerpt, and taken by the leading pass
pub const MAX_EXCERPT_PARAGRAPHS: usize = 3;

pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Which pass produced the candidate paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPass {
    /// At least one keyword appears verbatim
    Exact,
    /// A longer keyword or its prefix appears
    Partial,
    /// Nothing matched, the opening paragraphs of the document are used
    Leading,
}

/// Ranked candidate paragraphs for one query
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub pass: MatchPass,
    pub paragraphs: Vec<&'a str>,
}

impl Selection<'_> {
    /// The top paragraphs joined by blank lines, or None when nothing survived
    pub fn excerpt(&self) -> Option<String> {
        if self.paragraphs.is_empty() {
            return None;
        }
        Some(
            self.paragraphs
                .iter()
                .take(MAX_EXCERPT_PARAGRAPHS)
                .copied()
                .collect::<Vec<_>>()
                .join(PARAGRAPH_SEPARATOR),
        )
    }
}

/// Lowercased query words with at least `min_chars` characters
pub fn keywords(query: &str, min_chars: usize) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() >= min_chars)
        .map(String::from)
        .collect()
}

/// Split a document on blank lines
pub fn paragraphs(document: &str) -> Vec<&str> {
    document.split(PARAGRAPH_SEPARATOR).collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn prefix(word: &str, chars: usize) -> &str {
    match word.char_indices().nth(chars) {
        Some((index, _)) => &word[..index],
        None => word,
    }
}

/// Find and rank the paragraphs of `document` most relevant to `query`
pub fn select_paragraphs<'a>(document: &'a str, query: &str) -> Selection<'a> {
    let strict = keywords(query, MIN_KEYWORD_CHARS);
    let candidates: Vec<(&'a str, String)> = paragraphs(document)
        .into_iter()
        .map(|paragraph| (paragraph, paragraph.to_lowercase()))
        .collect();

    let mut pass = MatchPass::Exact;
    let mut found: Vec<&'a str> = candidates
        .iter()
        .filter(|(_, lower)| strict.iter().any(|word| lower.contains(word.as_str())))
        .map(|(paragraph, _)| paragraph.trim())
        .collect();

    if found.is_empty() {
        pass = MatchPass::Partial;
        let partial = keywords(query, MIN_PARTIAL_CHARS);
        found = candidates
            .iter()
            .filter(|(paragraph, lower)| {
                char_len(paragraph.trim()) > PARTIAL_MIN_PARAGRAPH_CHARS
                    && partial.iter().any(|word| {
                        lower.contains(prefix(word, PARTIAL_PREFIX_CHARS))
                            || lower.contains(word.as_str())
                    })
            })
            .map(|(paragraph, _)| paragraph.trim())
            .collect();
    }

    if found.is_empty() {
        pass = MatchPass::Leading;
        found = candidates
            .iter()
            .map(|(paragraph, _)| paragraph.trim())
            .filter(|paragraph| char_len(paragraph) > LEADING_MIN_PARAGRAPH_CHARS)
            .take(MAX_EXCERPT_PARAGRAPHS)
            .collect();
    }

    // sort_by_key is stable, equal scores keep document order
    let mut scored: Vec<(usize, &'a str)> = found
        .into_iter()
        .map(|paragraph| {
            let lower = paragraph.to_lowercase();
            let score = strict
                .iter()
                .filter(|word| lower.contains(word.as_str()))
                .count();
            (score, paragraph)
        })
        .collect();
    scored.sort_by_key(|(score, _)| Reverse(*score));

    Selection {
        pass,
        paragraphs: scored.into_iter().map(|(_, paragraph)| paragraph).collect(),
    }
}
