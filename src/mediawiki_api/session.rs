use super::MediaWikiApi;
use crate::{
    definitions::TokenKind,
    errors::{ApiError, Result},
    query::Query,
    response::Document,
    transport::Transport,
};

const LOGIN_SUCCESS: &str = "Success";

/// Read `tokens/@<kind>token`.
pub(crate) fn parse_token(document: &Document, kind: TokenKind) -> Result<String> {
    document
        .attr("tokens", &format!("{}token", kind))
        .map(str::to_owned)
        .ok_or_else(|| ApiError::general("Error getting token!"))
}

/// A positive `userinfo/@id` means the session is logged in. Anything else,
/// including an absent or non-numeric id, means it is not.
pub(crate) fn parse_authenticated(document: &Document) -> bool {
    document
        .attr("userinfo", "id")
        .and_then(|id| id.trim().parse::<i64>().ok())
        .is_some_and(|id| id > 0)
}

pub(crate) fn parse_login_result(document: &Document) -> Result<()> {
    match document.attr("login", "result") {
        None => Err(ApiError::general("Error logging in!")),
        Some(LOGIN_SUCCESS) => Ok(()),
        Some(result) => Err(ApiError::general(format!(
            "Error logging in, service returned {}",
            result
        ))),
    }
}

impl<T: Transport> MediaWikiApi<T> {
    /// Fetch a token of the given kind. [`TokenKind::default`] is the CSRF
    /// token that edits and deletions need.
    pub async fn fetch_token(&self, kind: TokenKind) -> Result<String> {
        let query = Query::action("query")
            .with("meta", "tokens")
            .with("type", kind.as_str());
        let document = self.call(&query, false).await?;
        parse_token(&document, kind)
    }

    /// Ask the wiki who we are.
    pub async fn is_authenticated(&self) -> Result<bool> {
        let query = Query::action("query").with("meta", "userinfo");
        let document = self.call(&query, false).await?;
        Ok(parse_authenticated(&document))
    }

    /// Log in with the configured credentials.
    ///
    /// Does nothing beyond the identity probe when the session is already
    /// logged in. The cookies set by the login response stay in the session
    /// jar for every later call.
    ///
    /// # Returns
    /// - Ok(()) -> The session is logged in.
    /// - Err(ApiError::General) -> No credentials configured, no login result,
    ///   or the wiki reported something other than `Success`.
    pub async fn login(&self) -> Result<()> {
        if self.is_authenticated().await? {
            log::debug!("Already logged in, skipping login");
            return Ok(());
        }

        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            return Err(ApiError::general(
                "Cannot log in without a configured username and password",
            ));
        };

        let token = self.fetch_token(TokenKind::Login).await?;

        let query = Query::action("login")
            .with("lgname", username.as_str())
            .with("lgpassword", password.as_str())
            .with("lgtoken", token);
        let document = self.call(&query, true).await?;
        if let Err(e) = parse_login_result(&document) {
            log::info!("Login as {} failed: {}", username, e);
            return Err(e);
        }

        log::info!("Logged in as {}", username);
        Ok(())
    }
}
