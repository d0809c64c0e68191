use async_trait::async_trait;
use reqwest::{
    cookie::{CookieStore, Jar},
    header::{CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT},
};
use reqwest_middleware::ClientWithMiddleware;
use url::{Url, form_urlencoded};

use crate::{errors::TransportError, query::Query, transport::Transport};

/// [`Transport`] over a reqwest client with middleware support.
#[derive(Debug, Clone)]
pub struct ReqwestTransport(pub ClientWithMiddleware);

impl ReqwestTransport {
    /// Create a transport with a plain client and no middleware.
    ///
    /// Cookies are not kept by the client itself; the caller passes its jar
    /// with every request.
    ///
    /// # Returns
    /// - Ok(ReqwestTransport) -> ready to use.
    /// - Err(TransportError::Client) -> the TLS backend could not be set up.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::ClientBuilder::new()
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self(reqwest_middleware::ClientBuilder::new(client).build()))
    }
}

/// Encode the query as an `application/x-www-form-urlencoded` body.
fn form_body(query: &Query) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter())
        .finish()
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        query: &Query,
        endpoint: &Url,
        user_agent: &str,
        cookies: Option<&Jar>,
        post: bool,
    ) -> Result<Vec<u8>, TransportError> {
        let mut url = endpoint.clone();
        let request = if post {
            self.0
                .post(url.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(form_body(query))
        } else {
            url.query_pairs_mut().extend_pairs(query.iter());
            self.0.get(url.clone())
        };

        let mut request = request.header(USER_AGENT, user_agent);
        if let Some(jar) = cookies
            && let Some(header) = jar.cookies(&url)
        {
            request = request.header(COOKIE, header);
        }

        let response = request.send().await?;
        if let Some(jar) = cookies {
            let mut set_cookies = response.headers().get_all(SET_COOKIE).iter();
            jar.set_cookies(&mut set_cookies, &url);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: endpoint.to_string(),
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(TransportError::EmptyBody {
                url: endpoint.to_string(),
            });
        }
        Ok(body.to_vec())
    }
}
