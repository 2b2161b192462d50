//! Detail page resolution: one download button, one direct link.

use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use super::CrawlError;
use super::listing::{join_link, parse_selector};
use crate::fetch::HttpClient;

/// Turns a human-facing detail page into the direct URL behind its download button.
#[derive(Debug, Clone)]
pub struct DetailResolver {
    button: Selector,
    attr: String,
}

impl DetailResolver {
    /// Creates a resolver that reads `attr` from the single element matching `button`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidSelector`] when `button` does not parse.
    pub fn new(button: &str, attr: &str) -> Result<Self, CrawlError> {
        Ok(Self {
            button: parse_selector(button)?,
            attr: attr.to_string(),
        })
    }

    /// Fetches `detail_url` and returns its direct download link.
    ///
    /// # Errors
    ///
    /// Fetch errors, plus the structural errors of [`extract`](Self::extract).
    #[instrument(level = "debug", skip(self, client), fields(detail = %detail_url))]
    pub async fn resolve(&self, client: &HttpClient, detail_url: &Url) -> Result<Url, CrawlError> {
        let body = client.get_text(detail_url).await?;
        let link = self.extract(&body, detail_url)?;
        debug!(link = %link, "resolved download button");
        Ok(link)
    }

    /// Reads the download link from an already fetched detail page.
    ///
    /// # Errors
    ///
    /// [`CrawlError::ButtonCount`] unless exactly one button matches, and
    /// [`CrawlError::MissingAttribute`] when that button has no link.
    pub fn extract(&self, html: &str, page_url: &Url) -> Result<Url, CrawlError> {
        let document = Html::parse_document(html);
        let matches: Vec<_> = document.select(&self.button).collect();
        let [button] = matches.as_slice() else {
            return Err(CrawlError::button_count(page_url.as_str(), matches.len()));
        };

        let raw = button
            .value()
            .attr(&self.attr)
            .ok_or_else(|| CrawlError::missing_attribute(page_url.as_str(), &self.attr))?;
        join_link(page_url, raw)
    }
}
