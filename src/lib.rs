//! Async client for the MediaWiki action API (`api.php`).
//!
//! [`MediaWikiApi`] keeps one logged-in session per wiki: it owns the cookie
//! jar, serializes request/response exchanges, follows `<continue>` markers
//! and caches user rights. Responses are requested as XML and mapped into the
//! records in [`definitions`].
//!
//! ```no_run
//! use mediawiki_api::{MediaWikiApi, MediaWikiConfiguration, ReqwestTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MediaWikiConfiguration::from_env()?;
//! let api = MediaWikiApi::new(ReqwestTransport::new()?, config);
//! api.login().await?;
//! let groups = api.get_user_groups("Example").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod definitions;
pub mod errors;
pub mod mediawiki_api;
pub mod query;
pub mod reqwest_client;
pub mod response;
pub mod rights_cache;
pub mod transport;

pub use config::{ConfigError, MediaWikiConfiguration};
pub use definitions::{
    BlockFlags, BlockInformation, Contribution, InterwikiPrefix, PageCategoryProperties,
    PageContent, PageEdit, PageEditBuilder, PageInformation, PageProtection, TokenKind,
};
pub use errors::{ApiError, TransportError};
pub use mediawiki_api::{BlockTarget, Fetch, MediaWikiApi};
pub use query::Query;
pub use reqwest_client::ReqwestTransport;
pub use transport::Transport;
