//! Text analysis: markup stripping, term-frequency scoring, and
//! named-entity extraction
//!
//! The same analyzer runs over crawled page bodies and over live
//! search-result snippets, so both kinds of document carry comparable
//! scores.

mod entities;
mod stopwords;

pub use entities::EntityRecognizer;
pub use stopwords::StopWords;

use scraper::{node::Node, Html, Selector};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during text analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot score empty text: token count is zero")]
    EmptyText,
}

/// The output of one analysis pass
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Entities in scan order, duplicates preserved
    pub named_entities: Vec<String>,

    /// Term -> normalized frequency
    pub term_frequencies: HashMap<String, f64>,
}

/// Text analyzer holding the process-wide stop-word table and entity
/// recognizer. Construct once and share by reference.
#[derive(Debug, Clone, Default)]
pub struct TextAnalyzer {
    stop_words: StopWords,
    recognizer: EntityRecognizer,
}

impl TextAnalyzer {
    pub fn new() -> Self {
        Self {
            stop_words: StopWords::english(),
            recognizer: EntityRecognizer::new(),
        }
    }

    /// Analyzes cleaned plain text (see [`strip_markup`] for HTML input).
    pub fn analyze(&self, text: &str) -> Result<Analysis, AnalysisError> {
        let term_frequencies = self.term_frequencies(text)?;
        let named_entities = self.recognizer.extract(text, &self.stop_words);

        Ok(Analysis {
            named_entities,
            term_frequencies,
        })
    }

    /// Computes normalized term frequencies for plain text.
    ///
    /// Tokens are the whitespace split of the input; each token has its
    /// literal `.` characters stripped, and stop-words are discarded.
    /// Every score divides by the length of the ORIGINAL whitespace split,
    /// so discarded tokens still count in the denominator and the scores
    /// of one document generally sum to less than 1. This denominator is
    /// a long-standing quirk of the scoring scheme; keep it.
    pub fn term_frequencies(&self, text: &str) -> Result<HashMap<String, f64>, AnalysisError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(AnalysisError::EmptyText);
        }
        let total = tokens.len() as f64;

        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            let term = token.replace('.', "");
            if term.is_empty() || self.stop_words.contains(&term) {
                continue;
            }
            *counts.entry(term).or_insert(0) += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(term, count)| (term, f64::from(count) / total))
            .collect())
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }
}

/// Extracts the visible text of a page's `<body>`.
///
/// `<style>`, `<script>` and `<noscript>` subtrees are removed entirely;
/// the remaining text nodes are trimmed and joined with single spaces in
/// document order. Returns `None` when the document has no body element.
pub fn strip_markup(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").ok()?;
    let body = document.select(&body_selector).next()?;

    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        if let Node::Text(text) = node.value() {
            let excluded = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(element) => {
                    matches!(element.name(), "style" | "script" | "noscript")
                }
                _ => false,
            });
            if excluded {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }

    Some(parts.join(" "))
}
