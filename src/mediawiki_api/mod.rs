//! The API client.
//!
//! [`MediaWikiApi`] owns the session (cookie jar), the rights cache and the
//! transport, and exposes one async method per API operation. Operations are
//! grouped by subject in the submodules; each builds a [`Query`], sends it
//! once or through the continuation loop, and maps the [`Document`] into a
//! typed value with a plain function that the tests can drive directly.

mod blocks;
mod pages;
mod session;
mod site;
mod users;

#[cfg(test)]
pub(crate) mod test_support;

use reqwest::cookie::Jar;
use tokio::sync::Mutex;

use crate::{
    config::MediaWikiConfiguration,
    errors::{ApiError, Result},
    query::Query,
    response::{Document, Element},
    rights_cache::RightsCache,
    transport::Transport,
};

pub use blocks::BlockTarget;

/// How much of a continued result set to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// One request, even if the server says there is more.
    FirstPage,
    /// Follow `<continue>` until the server stops sending it.
    All,
}

/// Stateful client for one wiki's `api.php`.
pub struct MediaWikiApi<T: Transport> {
    transport: T,
    config: MediaWikiConfiguration,
    cookie_jar: Jar,
    /// Held for a whole request/response exchange so jar updates never interleave.
    exchange: Mutex<()>,
    rights_cache: RightsCache,
}

impl<T: Transport> MediaWikiApi<T> {
    pub fn new(transport: T, config: MediaWikiConfiguration) -> Self {
        Self {
            transport,
            config,
            cookie_jar: Jar::default(),
            exchange: Mutex::new(()),
            rights_cache: RightsCache::new(),
        }
    }

    pub fn config(&self) -> &MediaWikiConfiguration {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn rights_cache(&self) -> &RightsCache {
        &self.rights_cache
    }

    /// Send one query and parse the response.
    ///
    /// # Arguments
    /// - query -> Parameters, in the order they should be sent.
    /// - post -> Send as a form body instead of a query string.
    ///
    /// # Returns
    /// - Ok(Document) -> The parsed response.
    /// - Err(ApiError) -> Transport failure or unparseable body.
    pub(crate) async fn call(&self, query: &Query, post: bool) -> Result<Document> {
        log::debug!(
            "Requesting {} {} ({})",
            if post { "POST" } else { "GET" },
            self.config.api_endpoint,
            query.describe()
        );

        let body = {
            let _exchange = self.exchange.lock().await;
            self.transport
                .send(
                    query,
                    &self.config.api_endpoint,
                    &self.config.user_agent,
                    Some(&self.cookie_jar),
                    post,
                )
                .await?
        };
        Document::parse(&body)
    }

    /// Run `query` through the continuation loop.
    ///
    /// Every response is handed to `extract`; its items are appended in page
    /// order. After each page the attributes of the top-level `<continue>`
    /// element are copied into the query and the loop goes again. A page with
    /// no items but a `<continue>` still continues.
    ///
    /// # Returns
    /// - Ok(Vec) -> All items, in page order.
    /// - Err(ApiError::PageLimitExceeded) -> more than `max_continuations`
    ///   requests would have been needed.
    pub(crate) async fn continued<I, F>(
        &self,
        mut query: Query,
        fetch: Fetch,
        extract: F,
    ) -> Result<Vec<I>>
    where
        F: Fn(&Document) -> Result<Vec<I>>,
    {
        let limit = self.config.max_continuations;
        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            if pages >= limit {
                return Err(ApiError::PageLimitExceeded { limit });
            }

            let document = self.call(&query, false).await?;
            pages += 1;
            items.extend(extract(&document)?);

            if fetch == Fetch::FirstPage {
                break;
            }
            match document.root().child("continue") {
                Some(marker) => {
                    merge_continuation(&mut query, marker);
                    log::debug!("Continuing to page {} ({})", pages + 1, query.describe());
                }
                None => break,
            }
        }

        Ok(items)
    }
}

/// Copy every attribute of a `<continue>` element into `query`.
fn merge_continuation(query: &mut Query, marker: &Element) {
    for (name, value) in marker.attributes() {
        query.set(name, value);
    }
}
