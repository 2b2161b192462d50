//! Shared request identity for every outgoing HTTP request.
//!
//! The supported hosts reject default client identifiers, so listing, detail,
//! API and image requests all present the same desktop browser headers.

/// Browser User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:79.0) Gecko/20100101 Firefox/79.0";

/// Accept header matching [`BROWSER_USER_AGENT`].
pub const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
