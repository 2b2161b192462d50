//! Error types for listing crawls and detail page resolution.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors raised while crawling listing pages or reading detail pages.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The page could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A CSS selector failed to parse.
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The selector source text.
        selector: String,
        /// Parser message.
        reason: String,
    },

    /// A link attribute could not be resolved against its page URL.
    #[error("invalid link '{link}' on page {page}")]
    InvalidLink {
        /// The page carrying the link.
        page: String,
        /// The raw attribute value.
        link: String,
    },

    /// A detail page did not carry exactly one download button.
    #[error("expected exactly one download button on {page}, found {found}")]
    ButtonCount {
        /// The detail page URL.
        page: String,
        /// Number of matching elements.
        found: usize,
    },

    /// The download button carried no link attribute.
    #[error("download button on {page} has no '{attribute}' attribute")]
    MissingAttribute {
        /// The detail page URL.
        page: String,
        /// The attribute that was expected.
        attribute: String,
    },

    /// A next-page link pointed back at a page already crawled.
    #[error("pagination loops back to already visited page {page}")]
    PaginationCycle {
        /// The repeated page URL.
        page: String,
    },

    /// The album advertised more pages than the crawl is allowed to follow.
    #[error("album exceeds {limit} listing pages")]
    TooManyPages {
        /// The configured page cap.
        limit: usize,
    },
}

impl CrawlError {
    /// Creates an invalid selector error.
    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid link error.
    pub fn invalid_link(page: impl Into<String>, link: impl Into<String>) -> Self {
        Self::InvalidLink {
            page: page.into(),
            link: link.into(),
        }
    }

    /// Creates a download button count mismatch error.
    pub fn button_count(page: impl Into<String>, found: usize) -> Self {
        Self::ButtonCount {
            page: page.into(),
            found,
        }
    }

    /// Creates a missing attribute error.
    pub fn missing_attribute(page: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            page: page.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a pagination cycle error.
    pub fn pagination_cycle(page: impl Into<String>) -> Self {
        Self::PaginationCycle { page: page.into() }
    }

    /// Returns true when the page layout did not match what the site integration
    /// expects. Such errors abort the whole run instead of skipping one image.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::ButtonCount { .. } | Self::MissingAttribute { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_count_is_structural() {
        let error = CrawlError::button_count("https://imgcredit.xyz/image/a", 2);
        assert!(error.is_structural());
        let msg = error.to_string();
        assert!(msg.contains("found 2"), "Expected count in: {msg}");
        assert!(msg.contains("https://imgcredit.xyz/image/a"));
    }

    #[test]
    fn test_missing_attribute_is_structural() {
        assert!(CrawlError::missing_attribute("https://x.test/p", "href").is_structural());
    }

    #[test]
    fn test_transport_errors_are_not_structural() {
        let error = CrawlError::from(FetchError::http_status("https://x.test/p", 404));
        assert!(!error.is_structural());
        assert!(error.to_string().contains("404"));
    }

    #[test]
    fn test_pagination_errors_display() {
        assert!(
            CrawlError::pagination_cycle("https://x.test/?page=1")
                .to_string()
                .contains("?page=1")
        );
        assert!(
            CrawlError::TooManyPages { limit: 3 }
                .to_string()
                .contains("3 listing pages")
        );
    }
}
