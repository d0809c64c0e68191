use async_trait::async_trait;
use reqwest::cookie::Jar;
use url::Url;

use crate::{errors::TransportError, query::Query};

/// One HTTP exchange with the API endpoint.
///
/// Implementations send `query` either as a URL query string (GET) or as a
/// form-encoded body (POST) and hand back the raw body. When `cookies` is
/// given its cookies are sent and any `Set-Cookie` headers of the response
/// are stored back into it. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        query: &Query,
        endpoint: &Url,
        user_agent: &str,
        cookies: Option<&Jar>,
        post: bool,
    ) -> Result<Vec<u8>, TransportError>;
}
