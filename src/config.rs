//! Connection settings for one wiki.

use std::{env, fmt};

use derive_builder::Builder;
use url::Url;

/// How many continuation pages a single operation may request before giving up.
pub const DEFAULT_MAX_CONTINUATIONS: usize = 500;

const ENV_ENDPOINT: &str = "MEDIAWIKI_API_ENDPOINT";
const ENV_USER_AGENT: &str = "MEDIAWIKI_USER_AGENT";
const ENV_USERNAME: &str = "MEDIAWIKI_USERNAME";
const ENV_PASSWORD: &str = "MEDIAWIKI_PASSWORD";
const ENV_MAX_CONTINUATIONS: &str = "MEDIAWIKI_MAX_CONTINUATIONS";

/// Endpoint, identity and limits used by [`crate::MediaWikiApi`].
#[derive(Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct MediaWikiConfiguration {
    /// Full URL of `api.php`.
    pub api_endpoint: Url,
    pub user_agent: String,
    #[builder(default, setter(into, strip_option))]
    pub username: Option<String>,
    #[builder(default, setter(into, strip_option))]
    pub password: Option<String>,
    #[builder(default = "DEFAULT_MAX_CONTINUATIONS")]
    pub max_continuations: usize,
}

impl fmt::Debug for MediaWikiConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaWikiConfiguration")
            .field("api_endpoint", &self.api_endpoint.as_str())
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("max_continuations", &self.max_continuations)
            .finish()
    }
}

/// Why a configuration could not be loaded from the environment.
#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(&'static str),
    InvalidEndpoint(url::ParseError),
    InvalidNumber { variable: &'static str, value: String },
    Builder(MediaWikiConfigurationBuilderError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVariable(name) => write!(f, "{} is not set", name),
            ConfigError::InvalidEndpoint(e) => write!(f, "{} is not a URL: {}", ENV_ENDPOINT, e),
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{} must be a number, got {:?}", variable, value)
            }
            ConfigError::Builder(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<url::ParseError> for ConfigError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidEndpoint(value)
    }
}
impl From<MediaWikiConfigurationBuilderError> for ConfigError {
    fn from(value: MediaWikiConfigurationBuilderError) -> Self {
        Self::Builder(value)
    }
}

impl MediaWikiConfigurationBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_continuations == Some(0) {
            return Err("max_continuations must be at least 1".to_owned());
        }
        Ok(())
    }
}

impl MediaWikiConfiguration {
    pub fn builder() -> MediaWikiConfigurationBuilder {
        MediaWikiConfigurationBuilder::default()
    }

    /// Load settings from the process environment, reading `.env` first if present.
    ///
    /// Variables:
    /// - MEDIAWIKI_API_ENDPOINT -> required, full `api.php` URL
    /// - MEDIAWIKI_USER_AGENT -> required
    /// - MEDIAWIKI_USERNAME / MEDIAWIKI_PASSWORD -> optional, needed for `login`
    /// - MEDIAWIKI_MAX_CONTINUATIONS -> optional, defaults to [`DEFAULT_MAX_CONTINUATIONS`]
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any name -> value lookup. `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let endpoint = lookup(ENV_ENDPOINT).ok_or(ConfigError::MissingVariable(ENV_ENDPOINT))?;
        let user_agent =
            lookup(ENV_USER_AGENT).ok_or(ConfigError::MissingVariable(ENV_USER_AGENT))?;

        let mut builder = Self::builder();
        builder
            .api_endpoint(Url::parse(&endpoint)?)
            .user_agent(user_agent);

        if let Some(username) = lookup(ENV_USERNAME) {
            builder.username(username);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            builder.password(password);
        }
        if let Some(value) = lookup(ENV_MAX_CONTINUATIONS) {
            let pages = value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber {
                    variable: ENV_MAX_CONTINUATIONS,
                    value: value.clone(),
                })?;
            builder.max_continuations(pages);
        }

        Ok(builder.build()?)
    }
}
