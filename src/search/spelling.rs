//! Best-effort query spelling correction
//!
//! Each query word is checked against an embedded common-word list plus
//! the index's own term vocabulary. Unknown words are replaced by the
//! nearest dictionary word within Levenshtein distance 2 that shares the
//! word's first letter; anything without such a neighbor passes through
//! unchanged, so rare legitimate terms are never mangled.

use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder};
use std::collections::BTreeSet;

/// Common English words used as the base dictionary. The index's term
/// vocabulary is layered on top at query time, so the list only needs to
/// cover everyday words a searcher is likely to mistype.
const COMMON_WORDS: &[&str] = &[
    "about", "above", "account", "across", "action", "address", "after", "again", "against",
    "almost", "alone", "along", "already", "also", "although", "always", "american", "among",
    "amount", "animal", "another", "answer", "anything", "appear", "apple", "area", "around",
    "article", "ask", "away", "back", "bad", "ball", "bank", "base", "beautiful", "became",
    "become", "been", "before", "began", "begin", "behind", "believe", "best", "better",
    "between", "big", "black", "blue", "board", "body", "book", "both", "box", "boy", "bring",
    "brought", "build", "business", "call", "came", "can", "car", "care", "carry", "case",
    "center", "certain", "change", "check", "child", "children", "city", "class", "clear",
    "close", "cold", "college", "color", "come", "common", "community", "company", "complete",
    "computer", "consider", "contain", "continue", "control", "cost", "could", "country",
    "course", "cover", "create", "cut", "dark", "data", "day", "decide", "deep", "design",
    "develop", "did", "difference", "different", "document", "does", "dog", "done", "door",
    "down", "draw", "drive", "during", "each", "early", "earth", "east", "easy", "eat",
    "education", "effect", "end", "engine", "english", "enough", "even", "evening", "ever",
    "every", "example", "experience", "explain", "eye", "face", "fact", "family", "far", "fast",
    "father", "feel", "feet", "few", "field", "figure", "final", "find", "fire", "first",
    "follow", "food", "form", "found", "four", "free", "friend", "from", "front", "full", "game",
    "gave", "general", "get", "girl", "give", "glass", "good", "got", "government", "great",
    "green", "ground", "group", "grow", "half", "hand", "happen", "hard", "have", "head", "hear",
    "heard", "heart", "heat", "hello", "help", "here", "high", "history", "hold", "home", "hope",
    "horse", "hot", "hour", "house", "however", "human", "hundred", "idea", "image",
    "important", "include", "increase", "indeed", "information", "inside", "instead",
    "interest", "internet", "island", "issue", "just", "keep", "kind", "king", "knew", "know",
    "known", "land", "language", "large", "last", "late", "later", "learn", "leave", "left",
    "less", "letter", "level", "life", "light", "like", "line", "list", "little", "live",
    "local", "long", "look", "love", "low", "machine", "made", "main", "make", "many", "map",
    "mark", "market", "matter", "may", "mean", "measure", "member", "men", "might", "mile",
    "mind", "minute", "miss", "moment", "money", "month", "moon", "more", "morning", "most",
    "mother", "mountain", "move", "much", "music", "must", "name", "nation", "near", "need",
    "never", "new", "news", "next", "night", "north", "note", "nothing", "notice", "number",
    "object", "office", "often", "old", "once", "one", "online", "only", "open", "order",
    "other", "our", "out", "over", "own", "page", "paper", "part", "party", "pass", "past",
    "pattern", "people", "perhaps", "person", "picture", "piece", "place", "plan", "plant",
    "play", "point", "power", "present", "press", "pretty", "problem", "process", "produce",
    "product", "program", "provide", "public", "pull", "put", "question", "quick", "quite",
    "rain", "ran", "reach", "read", "ready", "real", "really", "reason", "record", "red",
    "remember", "report", "research", "rest", "result", "return", "right", "river", "road",
    "rock", "room", "round", "rule", "run", "said", "same", "saw", "say", "school", "science",
    "sea", "search", "second", "section", "see", "seem", "sentence", "serve", "service", "set",
    "several", "shape", "she", "ship", "short", "should", "show", "side", "simple", "since",
    "sing", "sit", "site", "six", "size", "sleep", "small", "snow", "social", "some",
    "something", "song", "soon", "sound", "south", "space", "speak", "special", "stand",
    "start", "state", "stay", "step", "still", "stop", "story", "street", "strong", "student",
    "study", "such", "summer", "sun", "sure", "system", "table", "take", "talk", "teach",
    "team", "tell", "ten", "test", "than", "thank", "that", "them", "then", "there", "these",
    "they", "thing", "think", "this", "those", "though", "thought", "thousand", "three",
    "through", "time", "today", "together", "told", "took", "top", "toward", "town", "travel",
    "tree", "true", "try", "turn", "two", "under", "understand", "unit", "until", "upon",
    "use", "usual", "very", "voice", "wait", "walk", "want", "war", "warm", "watch", "water",
    "way", "weather", "week", "well", "went", "were", "west", "what", "wheel", "when", "where",
    "which", "while", "white", "who", "whole", "why", "wide", "wild", "will", "wind", "window",
    "winter", "with", "within", "without", "wonder", "word", "work", "world", "would", "write",
    "year", "yes", "yet", "young",
];

/// Maximum edit distance accepted for a substitution.
const MAX_DISTANCE: u8 = 2;

/// Query spelling corrector.
///
/// Construct once; the Levenshtein automaton tables are expensive to
/// build and are reused across queries.
pub struct SpellingCorrector {
    builder: LevenshteinAutomatonBuilder,
    base_words: BTreeSet<String>,
}

impl SpellingCorrector {
    pub fn new() -> Self {
        Self {
            builder: LevenshteinAutomatonBuilder::new(MAX_DISTANCE, true),
            base_words: COMMON_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Corrects a whole query, word by word.
    ///
    /// `vocabulary` is the index's current term vocabulary; words found in
    /// either dictionary are kept as typed.
    pub fn correct(&self, query: &str, vocabulary: &BTreeSet<String>) -> String {
        query
            .split_whitespace()
            .map(|word| self.correct_word(word, vocabulary))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn correct_word(&self, word: &str, vocabulary: &BTreeSet<String>) -> String {
        let lower = word.to_lowercase();

        if self.base_words.contains(&lower) || vocabulary.contains(&lower) {
            return word.to_string();
        }

        // Only alphabetic words are candidates for correction; numbers,
        // URLs, and mixed tokens pass through.
        if lower.is_empty() || !lower.chars().all(|c| c.is_alphabetic()) {
            return word.to_string();
        }

        let Some(first) = lower.chars().next() else {
            return word.to_string();
        };

        let dfa = self.builder.build_dfa(&lower);
        let mut best: Option<(u8, &str)> = None;

        for candidate in self
            .base_words
            .iter()
            .chain(vocabulary.iter())
            .map(String::as_str)
        {
            if candidate.chars().next() != Some(first) {
                continue;
            }
            if let Distance::Exact(distance) = dfa.eval(candidate) {
                let closer = match best {
                    None => true,
                    Some((best_distance, best_word)) => {
                        distance < best_distance
                            || (distance == best_distance && candidate < best_word)
                    }
                };
                if closer {
                    best = Some((distance, candidate));
                }
            }
        }

        match best {
            Some((_, replacement)) => replacement.to_string(),
            None => word.to_string(),
        }
    }
}

impl Default for SpellingCorrector {
    fn default() -> Self {
        Self::new()
    }
}
