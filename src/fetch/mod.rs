//! Outbound HTTP with a spoofed browser identity.
//!
//! # Example
//!
//! ```no_run
//! use albumdl_core::fetch::HttpClient;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let page = client.get_text(&Url::parse("https://imgcredit.xyz/album/abc")?).await?;
//! println!("{} bytes of HTML", page.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::HttpClient;
pub use error::FetchError;
