//! Scripted transport for driving `MediaWikiApi` without a network.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use reqwest::cookie::Jar;
use url::Url;

use super::MediaWikiApi;
use crate::{
    config::MediaWikiConfiguration, errors::TransportError, query::Query, transport::Transport,
};

pub const TEST_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub query: Query,
    pub post: bool,
    pub with_cookies: bool,
}

/// Replays canned bodies in order and records what was sent.
/// Running out of bodies answers with an empty-body transport error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Vec<u8>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(bodies.into_iter().map(|b| b.into().into_bytes()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        query: &Query,
        endpoint: &Url,
        _user_agent: &str,
        cookies: Option<&Jar>,
        post: bool,
    ) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            query: query.clone(),
            post,
            with_cookies: cookies.is_some(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::EmptyBody {
                url: endpoint.to_string(),
            })
    }
}

pub fn config(max_continuations: usize) -> MediaWikiConfiguration {
    MediaWikiConfiguration::builder()
        .api_endpoint(Url::parse(TEST_ENDPOINT).unwrap())
        .user_agent("mediawiki_api tests")
        .username("ExampleBot")
        .password("example-password")
        .max_continuations(max_continuations)
        .build()
        .unwrap()
}

pub fn api<I, S>(bodies: I) -> MediaWikiApi<ScriptedTransport>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    api_with_limit(bodies, crate::config::DEFAULT_MAX_CONTINUATIONS)
}

pub fn api_with_limit<I, S>(bodies: I, max_continuations: usize) -> MediaWikiApi<ScriptedTransport>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    MediaWikiApi::new(ScriptedTransport::new(bodies), config(max_continuations))
}
