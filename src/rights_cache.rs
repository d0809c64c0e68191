use std::{future::Future, sync::Arc};

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::errors::Result;

/// User name -> group list, kept for the lifetime of the owning client.
///
/// Each user gets its own once-cell, so concurrent first lookups for the same
/// name share a single fetch while lookups for other names proceed in
/// parallel. Failed fetches leave the cell empty.
#[derive(Debug, Default)]
pub struct RightsCache {
    entries: DashMap<String, Arc<OnceCell<Vec<String>>>>,
}

impl RightsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached groups for `user`, if a lookup already succeeded.
    pub fn get(&self, user: &str) -> Option<Vec<String>> {
        self.entries.get(user)?.value().get().cloned()
    }

    /// Return the cached groups for `user`, running `fetch` only when nothing
    /// is cached yet.
    ///
    /// # Arguments
    /// - user -> The name exactly as the caller requested it (the cache key).
    /// - fetch -> Produces the group list from the remote wiki.
    pub async fn get_or_fetch<F, Fut>(&self, user: &str, fetch: F) -> Result<Vec<String>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        let cell = self.entries.entry(user.to_owned()).or_default().clone();
        if let Some(groups) = cell.get() {
            log::debug!("Getting groups for {} from cache", user);
            return Ok(groups.clone());
        }

        let groups = cell
            .get_or_try_init(|| {
                log::info!("Getting groups for {} from webservice", user);
                fetch()
            })
            .await?;
        Ok(groups.clone())
    }

    /// Number of users with a resolved group list.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
