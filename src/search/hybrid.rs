//! Hybrid query path: stored index first, live web search as fallback
//!
//! Every query is spelling-corrected and looked up twice (corrected and
//! raw). A non-empty union answers immediately while a detached task
//! refreshes the index in the background; an empty union falls through to
//! a synchronous live search whose hits are stored for future queries.

use crate::analyzer::TextAnalyzer;
use crate::config::LiveSearchConfig;
use crate::search::live::LiveSearch;
use crate::search::pagination::paginate;
use crate::search::spelling::SpellingCorrector;
use crate::storage::{Document, SqliteStorage, Storage};
use crate::KumoError;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Per-session, append-only record of what was searched.
///
/// Raw queries are always recorded; corrected forms are recorded when
/// they differ, so the suggestion list surfaces both spellings.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    suggestions: Vec<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, raw: &str, corrected: &str) {
        self.suggestions.push(raw.to_string());
        if corrected != raw {
            self.suggestions.push(corrected.to_string());
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }
}

/// One answered query.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// The requested page of results
    pub results: Vec<Document>,

    /// Total matches before pagination
    pub total_count: usize,

    /// The page actually served (after clamping)
    pub page: usize,

    pub total_pages: usize,

    /// The spelling-corrected query
    pub corrected_query: String,

    /// Whether correction changed the query
    pub spelling_corrected: bool,

    /// Wall-clock time spent answering
    pub elapsed: Duration,

    /// The session suggestion list after this query
    pub suggestions: Vec<String>,
}

/// The hybrid search engine.
///
/// Cloning is cheap and shares the underlying storage, analyzer, and
/// corrector; background enrichment tasks hold their own clone.
#[derive(Clone)]
pub struct HybridSearch {
    storage: Arc<Mutex<SqliteStorage>>,
    analyzer: Arc<TextAnalyzer>,
    live: Arc<LiveSearch>,
    corrector: Arc<SpellingCorrector>,
}

impl HybridSearch {
    pub fn new(
        storage: Arc<Mutex<SqliteStorage>>,
        analyzer: Arc<TextAnalyzer>,
        config: &LiveSearchConfig,
    ) -> Result<Self, KumoError> {
        Ok(Self {
            storage,
            analyzer,
            live: Arc::new(LiveSearch::new(config)?),
            corrector: Arc::new(SpellingCorrector::new()),
        })
    }

    /// Answers one query.
    ///
    /// Storage failures during the index lookup surface as errors; any
    /// failure on the live path degrades to zero live results instead.
    pub async fn search(
        &self,
        query: &str,
        page: Option<usize>,
        session: &mut SearchSession,
    ) -> Result<SearchResponse, KumoError> {
        let start = Instant::now();
        let raw = query.trim();

        // Correction is best-effort: an unreadable vocabulary just means
        // correcting against the base dictionary alone.
        let vocabulary: BTreeSet<String> = {
            let storage = self.storage.lock().unwrap();
            storage
                .term_vocabulary()
                .map(|terms| terms.into_iter().collect())
                .unwrap_or_default()
        };
        let corrected = self.corrector.correct(raw, &vocabulary);

        // Query the index with both spellings, deduplicated by URL.
        let needles: Vec<&str> = if corrected == raw {
            vec![raw]
        } else {
            vec![corrected.as_str(), raw]
        };
        let mut results: Vec<Document> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for needle in needles {
            if needle.is_empty() {
                continue;
            }
            let matches = {
                let storage = self.storage.lock().unwrap();
                storage.search_documents(needle)?
            };
            for document in matches {
                if seen.insert(document.url.clone()) {
                    results.push(document);
                }
            }
        }

        if results.is_empty() {
            results = self.live_search_and_store(raw).await;
        } else {
            // Freshness enrichment happens regardless of cached matches,
            // but never blocks a response that already has them.
            self.spawn_enrichment(raw.to_string());
        }

        session.record(raw, &corrected);

        let page = paginate(&results, page);
        Ok(SearchResponse {
            results: page.items,
            total_count: page.total_count,
            page: page.page,
            total_pages: page.total_pages,
            spelling_corrected: corrected != raw,
            corrected_query: corrected,
            elapsed: start.elapsed(),
            suggestions: session.suggestions().to_vec(),
        })
    }

    /// Performs a live search and stores every hit; failures degrade to
    /// an empty result set.
    async fn live_search_and_store(&self, query: &str) -> Vec<Document> {
        match self.fetch_and_store(query).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!("Live search failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn fetch_and_store(&self, query: &str) -> Result<Vec<Document>, KumoError> {
        let hits = self.live.search(query).await?;

        let mut documents = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for hit in hits {
            if !seen.insert(hit.url.clone()) {
                continue;
            }

            let mut document = Document {
                url: hit.url,
                title: hit.title,
                uses: 1,
                ..Default::default()
            };

            if let Some(snippet) = hit.snippet {
                match self.analyzer.analyze(&snippet) {
                    Ok(analysis) => {
                        document.named_entities = analysis.named_entities;
                        document.term_frequencies = analysis.term_frequencies;
                    }
                    Err(e) => tracing::debug!("Snippet analysis failed: {}", e),
                }
                document.body_excerpt = snippet;
            }

            let stored = {
                let mut storage = self.storage.lock().unwrap();
                storage.record_live_document(&document)
            };
            match stored {
                Ok(uses) => document.uses = uses,
                Err(e) => {
                    tracing::warn!("Failed to store live result {}: {}", document.url, e);
                }
            }

            documents.push(document);
        }

        tracing::debug!("Live search stored {} result(s) for '{}'", documents.len(), query);
        Ok(documents)
    }

    /// Fires the background enrichment task. The task outlives the
    /// request and completes or fails with no observer.
    fn spawn_enrichment(&self, query: String) {
        let engine = self.clone();
        tokio::spawn(async move {
            let stored = engine.live_search_and_store(&query).await;
            tracing::debug!(
                "Background enrichment finished for '{}' ({} result(s))",
                query,
                stored.len()
            );
        });
    }
}
