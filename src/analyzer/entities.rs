//! Named-entity extraction
//!
//! A lightweight recognizer that groups runs of capitalized tokens into
//! candidate entities ("New York", "Ada Lovelace"). Output preserves scan
//! order and duplicates, so downstream consumers see entities as often as
//! the text mentions them.

use crate::analyzer::stopwords::StopWords;

/// Capitalized-phrase entity recognizer.
///
/// Built once at startup and shared by reference, together with the
/// stop-word table it uses to discard sentence-initial noise words.
#[derive(Debug, Clone, Default)]
pub struct EntityRecognizer;

impl EntityRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Extracts entities from plain text, in scan order, duplicates kept.
    ///
    /// A run of capitalized tokens forms one entity. Runs end at the first
    /// non-capitalized token or at terminal punctuation, so "visited Paris.
    /// Later" yields "Paris" and "Later" rather than "Paris Later". A
    /// single capitalized stop-word ("The", "A") is not an entity.
    pub fn extract(&self, text: &str, stop_words: &StopWords) -> Vec<String> {
        let mut entities = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for raw in text.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric());

            if is_capitalized(token) {
                current.push(token);
                if ends_sentence(raw) {
                    flush(&mut current, stop_words, &mut entities);
                }
            } else {
                flush(&mut current, stop_words, &mut entities);
            }
        }
        flush(&mut current, stop_words, &mut entities);

        entities
    }
}

/// Completes the pending phrase, discarding lone capitalized stop-words.
fn flush(current: &mut Vec<&str>, stop_words: &StopWords, entities: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    if current.len() == 1 && stop_words.contains(&current[0].to_lowercase()) {
        current.clear();
        return;
    }
    entities.push(current.join(" "));
    current.clear();
}

fn is_capitalized(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            chars.all(|c| c.is_alphanumeric() || c == '\'' || c == '-')
        }
        _ => false,
    }
}

fn ends_sentence(raw: &str) -> bool {
    raw.ends_with(['.', '!', '?', ',', ';', ':'])
}
