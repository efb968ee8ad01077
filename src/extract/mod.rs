//! Turns a request source into plain readable text.

pub mod fetch;
pub mod readability;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::core::config::ExtractorSettings;
use crate::core::models::{ExtractedDocument, Source};
use crate::errors::{ExtractionError, PipelineError};

pub use fetch::{FetchedPage, fetch_page, validate_source_url};
pub use readability::{extract_main_text, normalize_plain_text, render_fragment};

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns an `Extraction` error when the page cannot be fetched or
    /// yields no text, and `Timeout` when the fetch exceeds its deadline.
    async fn extract(&self, source: &Source) -> Result<ExtractedDocument, PipelineError>;
}

/// Fetches pages over HTTP and applies the readability heuristic.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    settings: ExtractorSettings,
}

impl HttpExtractor {
    #[must_use]
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    async fn extract_url(&self, url: &Url) -> Result<ExtractedDocument, PipelineError> {
        let page = fetch_page(url, &self.settings).await?;

        let raw_text = if page.is_plain_text() {
            normalize_plain_text(&page.body)
        } else if page.is_html() {
            let body = page.body;
            // HTML parsing is CPU-bound and the parsed tree is not Send.
            tokio::task::spawn_blocking(move || extract_main_text(&body)).await?
        } else {
            warn!(url = %url, media_type = %page.media_type, "Refusing non-HTML page");
            return Err(ExtractionError::NotHtml(page.media_type).into());
        };

        document(raw_text, page.final_url)
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, source: &Source) -> Result<ExtractedDocument, PipelineError> {
        if let Source::FeedItem { item, .. } = source
            && let Some(content) = item.embedded_content()
        {
            info!(source = %source.describe(), "Using embedded feed item content");
            let content = content.to_string();
            let raw_text = tokio::task::spawn_blocking(move || render_fragment(&content)).await?;
            return document(raw_text, source.describe());
        }

        match source.fetch_url() {
            Some(url) => self.extract_url(url).await,
            None => Err(PipelineError::InvalidInput(
                "Feed item needs either 'content' or a 'link'".to_string(),
            )),
        }
    }
}

fn document(raw_text: String, source_url: String) -> Result<ExtractedDocument, PipelineError> {
    if raw_text.trim().is_empty() {
        warn!(source = %source_url, "No readable text extracted");
        return Err(ExtractionError::Empty.into());
    }
    info!(
        source = %source_url,
        chars = raw_text.chars().count(),
        "Extracted readable text"
    );
    Ok(ExtractedDocument {
        raw_text,
        source_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::FeedItem;

    #[tokio::test]
    async fn embedded_feed_content_is_used_without_fetching() {
        let extractor = HttpExtractor::new(ExtractorSettings::default());
        let source = Source::FeedItem {
            item: FeedItem {
                link: None,
                title: Some("Weekly notes".into()),
                content: Some("<p>First point.</p><p>Second point.</p>".into()),
            },
            link: None,
        };
        let doc = extractor.extract(&source).await.unwrap();
        assert_eq!(doc.raw_text, "First point.\n\nSecond point.");
        assert_eq!(doc.source_url, "Weekly notes");
    }

    #[tokio::test]
    async fn markup_only_feed_content_is_empty() {
        let extractor = HttpExtractor::new(ExtractorSettings::default());
        let source = Source::FeedItem {
            item: FeedItem {
                content: Some("<script>x()</script>".into()),
                ..FeedItem::default()
            },
            link: None,
        };
        let err = extractor.extract(&source).await.unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(ExtractionError::Empty)));
    }
}
