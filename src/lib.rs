//! Fetches an RSS 2.0 feed over HTTP and decodes it into [`Feed`].
//!
//! ```no_run
//! # async fn example() -> Result<(), karoo::FetchError> {
//! use std::time::Duration;
//!
//! let client = karoo::FeedClient::builder()
//!     .timeout(Duration::from_secs(5))
//!     .build();
//! let feed = client.get_feed("https://example.com/feed.xml").await?;
//! for item in &feed.channel.items {
//!     println!("{} <{}>", item.title, item.link);
//! }
//! # Ok(())
//! # }
//! ```

mod cli;
mod core;

pub use crate::cli::run;
pub use crate::core::feed::fetcher::{
    ClientOption, FeedClient, FeedClientBuilder, FeedClientConfig, FetchError, DEFAULT_TIMEOUT,
};
pub use crate::core::feed::parser::{parse_feed_bytes, FeedParseError};
pub use crate::core::feed::types::{Channel, Feed, Item};
