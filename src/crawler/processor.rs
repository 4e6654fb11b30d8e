//! Page processor: one URL in, one enriched document out
//!
//! Fetches a single page, optionally feeds its outbound links to the
//! frontier, and builds a [`Document`] from the page's metadata and body
//! text. Every enrichment step is independently best-effort: a missing
//! meta tag, an unparsable body, or a failed analysis degrades that field
//! only and never aborts the record.

use crate::analyzer::{strip_markup, TextAnalyzer};
use crate::crawler::fetcher::{fetch_page, FetchedPage};
use crate::frontier::Frontier;
use crate::storage::{Document, SqliteStorage, Storage};
use crate::KumoError;
use chrono::Utc;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use url::Url;

/// Maximum body-excerpt length when falling back to body text.
const EXCERPT_LEN: usize = 250;

/// File extensions excluded from outbound-link expansion: content that is
/// never an HTML page worth queueing.
const IGNORED_EXTENSIONS: &[&str] = &[
    // images
    "mng", "pct", "bmp", "gif", "jpg", "jpeg", "png", "pst", "psp", "tif", "tiff", "ai", "drw",
    "dxf", "eps", "ps", "svg", "cdr", "ico", "webp",
    // archives
    "zip", "rar", "gz", "tar", "7z", "bz2",
    // audio
    "mp3", "wma", "ogg", "wav", "ra", "aac", "mid", "au", "aiff",
    // video
    "3gp", "asf", "asx", "avi", "mov", "mp4", "mpg", "qt", "rm", "swf", "wmv", "m4a", "m4v",
    "flv", "webm",
    // office
    "xls", "xlsx", "ppt", "pptx", "pps", "doc", "docx", "odt", "ods", "odg", "odp",
    // other
    "css", "pdf", "exe", "bin", "rss", "dmg", "iso", "apk", "js",
];

/// Processes single URLs into stored documents.
pub struct PageProcessor {
    client: Client,
    storage: Arc<Mutex<SqliteStorage>>,
    frontier: Frontier,
    analyzer: Arc<TextAnalyzer>,
}

impl PageProcessor {
    pub fn new(
        client: Client,
        storage: Arc<Mutex<SqliteStorage>>,
        analyzer: Arc<TextAnalyzer>,
    ) -> Self {
        let frontier = Frontier::new(storage.clone());
        Self {
            client,
            storage,
            frontier,
            analyzer,
        }
    }

    /// Fetches and processes one URL.
    ///
    /// With `scan_internal` set, outbound links are enqueued (with the
    /// flag cleared, so expansion is exactly one level deep). Returns
    /// `Ok(None)` for non-200 responses, which are skipped silently.
    pub async fn process(
        &self,
        url: &str,
        scan_internal: bool,
    ) -> Result<Option<Document>, KumoError> {
        self.process_inner(url, scan_internal, scan_internal).await
    }

    /// Re-processes an already-indexed URL without expanding links.
    ///
    /// The stored `scan_internal_links` flag is carried through to the
    /// refreshed document unchanged.
    pub async fn refresh(
        &self,
        url: &str,
        scan_internal_flag: bool,
    ) -> Result<Option<Document>, KumoError> {
        self.process_inner(url, scan_internal_flag, false).await
    }

    async fn process_inner(
        &self,
        url: &str,
        scan_internal_flag: bool,
        expand_links: bool,
    ) -> Result<Option<Document>, KumoError> {
        let page = fetch_page(&self.client, url).await?;

        if page.status != 200 {
            tracing::debug!("Skipping {} (HTTP {})", url, page.status);
            return Ok(None);
        }

        if expand_links {
            self.expand_links(url, &page);
        }

        let document = self.enrich(url, scan_internal_flag, &page);

        {
            let mut storage = self.storage.lock().unwrap();
            storage.upsert_document(&document)?;
        }

        Ok(Some(document))
    }

    /// Builds a document from a fetched page. Infallible by design: each
    /// extraction that fails leaves its field at the fallback value.
    pub fn enrich(&self, url: &str, scan_internal_flag: bool, page: &FetchedPage) -> Document {
        let html = Html::parse_document(&page.body);

        let title = extract_title(&html);
        let meta_keywords = extract_meta_keywords(&html);
        let description = extract_meta_content(&html, "description");
        let body_text = strip_markup(&page.body).filter(|text| !text.is_empty());

        let mut named_entities = Vec::new();
        let mut term_frequencies = std::collections::HashMap::new();
        if let Some(text) = &body_text {
            match self.analyzer.analyze(text) {
                Ok(analysis) => {
                    named_entities = analysis.named_entities;
                    term_frequencies = analysis.term_frequencies;
                }
                Err(e) => {
                    tracing::warn!("Analysis failed for {}: {}", url, e);
                }
            }
        }

        let body_excerpt = match (description, body_text) {
            (Some(description), _) => description,
            (None, Some(text)) => truncate_excerpt(&text),
            (None, None) => String::new(),
        };

        Document {
            url: url.to_string(),
            http_status: Some(page.status),
            source_ip: page.source_ip.clone(),
            scan_internal_links: scan_internal_flag,
            title,
            meta_keywords,
            body_excerpt,
            named_entities,
            term_frequencies,
            uses: 0,
            crawled_at: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Enqueues the page's outbound links with scan_internal=false.
    ///
    /// Enqueue failures are logged and skipped; link expansion never
    /// fails the page that produced the links.
    fn expand_links(&self, url: &str, page: &FetchedPage) {
        let base = match Url::parse(&page.final_url).or_else(|_| Url::parse(url)) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Cannot resolve links for {}: {}", url, e);
                return;
            }
        };

        let mut queued = 0usize;
        for link in extract_links(&page.body, &base) {
            match self.frontier.enqueue(&link, false) {
                Ok(true) => queued += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to enqueue {}: {}", link, e),
            }
        }
        tracing::debug!("Queued {} new link(s) from {}", queued, url);
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Extracts a named meta tag's content attribute
fn extract_meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name='{}']", name)).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(str::to_string)
        .filter(|content| !content.is_empty())
}

/// Extracts the keywords meta tag as a set, tokenized both by whitespace
/// and by comma.
fn extract_meta_keywords(document: &Html) -> BTreeSet<String> {
    let Some(content) = extract_meta_content(document, "keywords") else {
        return BTreeSet::new();
    };

    content
        .split_whitespace()
        .chain(content.split(','))
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

/// Extracts crawlable outbound links from a page body.
fn extract_links(body: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(body);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base_url) {
                    links.push(absolute);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes and data: URIs
/// - fragment-only links
/// - non-HTTP(S) URLs after resolution
/// - paths with a denylisted file extension
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    if let Some(extension) = path_extension(&absolute) {
        if IGNORED_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }
    }

    Some(absolute.to_string())
}

fn path_extension(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.next_back()?;
    let (_, extension) = last_segment.rsplit_once('.')?;
    if extension.is_empty() {
        None
    } else {
        Some(extension.to_ascii_lowercase())
    }
}

/// Truncates body text to the excerpt length on a character boundary.
fn truncate_excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_LEN).collect()
}
