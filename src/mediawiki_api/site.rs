use super::MediaWikiApi;
use crate::{
    definitions::InterwikiPrefix,
    errors::{ApiError, Result},
    query::Query,
    response::Document,
    transport::Transport,
};

pub(crate) fn parse_interwiki_prefixes(document: &Document) -> Result<Vec<InterwikiPrefix>> {
    document
        .select("interwikimap/iw")
        .into_iter()
        .map(|iw| -> Result<InterwikiPrefix> {
            let required = |name: &str| {
                iw.attr(name).map(str::to_owned).ok_or_else(|| {
                    ApiError::general_with_raw(
                        format!("Interwiki entry is missing its {}", name),
                        document.raw(),
                    )
                })
            };
            Ok(InterwikiPrefix {
                prefix: required("prefix")?,
                local: iw.has_attr("local"),
                url: required("url")?,
                language: iw.attr("language").map(str::to_owned),
            })
        })
        .collect()
}

pub(crate) fn parse_article_path(document: &Document) -> Result<String> {
    let server = document.require_attr("general", "server")?;
    let article_path = document.require_attr("general", "articlepath")?;
    Ok(format!("{}{}", server, article_path))
}

/// `db/@lag` in seconds; without `sishowalldb` the wiki reports its most
/// lagged replica only.
pub(crate) fn parse_replication_lag(document: &Document) -> Result<f64> {
    let lag = document.require_attr("dbrepllag/db", "lag")?;
    lag.trim().parse::<f64>().map_err(|e| {
        ApiError::general_with_raw(
            format!("Replication lag {:?} is not a number ({})", lag, e),
            document.raw(),
        )
    })
}

impl<T: Transport> MediaWikiApi<T> {
    /// Shorten `url` with the wiki's URL shortener.
    pub async fn shorten_url(&self, url: &str) -> Result<String> {
        let query = Query::action("shortenurl").with("url", url);
        let document = self.call(&query, true).await?;
        let short = document.require_attr("shortenurl", "shorturl")?;
        log::debug!("Shortened {} to {}", url, short);
        Ok(short.to_owned())
    }

    pub async fn get_interwiki_prefixes(&self) -> Result<Vec<InterwikiPrefix>> {
        let query = Query::action("query")
            .with("meta", "siteinfo")
            .with("siprop", "interwikimap");
        let document = self.call(&query, false).await?;
        parse_interwiki_prefixes(&document)
    }

    /// Article URL template, e.g. `https://en.wikipedia.org/wiki/$1`.
    pub async fn get_article_path(&self) -> Result<String> {
        let query = Query::action("query")
            .with("meta", "siteinfo")
            .with("siprop", "general");
        let document = self.call(&query, false).await?;
        parse_article_path(&document)
    }

    pub async fn get_max_replication_lag(&self) -> Result<f64> {
        let query = Query::action("query")
            .with("meta", "siteinfo")
            .with("siprop", "dbrepllag");
        let document = self.call(&query, false).await?;
        parse_replication_lag(&document)
    }
}
