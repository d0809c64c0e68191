use chrono::{DateTime, Utc};

use super::{Fetch, MediaWikiApi};
use crate::{
    definitions::Contribution,
    errors::{ApiError, Result},
    query::Query,
    response::{Document, Element, parse_timestamp},
    transport::Transport,
};

/// Group given to identities that cannot be registered users (IP addresses).
pub const ANONYMOUS_GROUP: &str = "*";

/// The single `users/user` record of a per-user lookup, or `MissingUser` if
/// the wiki flagged it as missing.
fn user_record<'a>(document: &'a Document, user: &str) -> Result<&'a Element> {
    let record = document.select_first("users/user").ok_or_else(|| {
        ApiError::general_with_raw("Response has no user record", document.raw())
    })?;
    if record.has_attr("missing") {
        return Err(ApiError::missing_user(user));
    }
    Ok(record)
}

/// Groups of the user in `document`.
///
/// - `invalid` marker -> `["*"]`
/// - `missing` marker -> `MissingUser`
/// - otherwise the `<g>` entries in document order, duplicates kept
pub(crate) fn parse_user_groups(document: &Document, user: &str) -> Result<Vec<String>> {
    let record = document.select_first("users/user").ok_or_else(|| {
        ApiError::general_with_raw("Response has no user record", document.raw())
    })?;
    if record.has_attr("invalid") {
        return Ok(vec![ANONYMOUS_GROUP.to_owned()]);
    }
    if record.has_attr("missing") {
        return Err(ApiError::missing_user(user));
    }

    Ok(record
        .select_children("groups/g")
        .iter()
        .map(|group| group.text().to_owned())
        .collect())
}

/// `registration` of the user; `None` for accounts older than the wiki's
/// registration log.
pub(crate) fn parse_registration_date(
    document: &Document,
    user: &str,
) -> Result<Option<DateTime<Utc>>> {
    let record = user_record(document, user)?;
    match record.attr("registration") {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value).map(Some),
    }
}

pub(crate) fn parse_edit_count(document: &Document, user: &str) -> Result<u64> {
    let record = user_record(document, user)?;
    let count = record.attr("editcount").ok_or_else(|| {
        ApiError::general_with_raw("Response has no edit count", document.raw())
    })?;
    count.trim().parse::<u64>().map_err(|e| {
        ApiError::general_with_raw(
            format!("Edit count {:?} is not a number ({})", count, e),
            document.raw(),
        )
    })
}

/// Contributions listed in `usercontribs/item`. An item lacking its title,
/// timestamp, comment or revision id fails the whole lookup.
pub(crate) fn parse_contributions(document: &Document, user: &str) -> Result<Vec<Contribution>> {
    document
        .select("usercontribs/item")
        .into_iter()
        .map(|item| -> Result<Contribution> {
            let field = |name: &str| {
                item.attr(name).map(str::to_owned).ok_or_else(|| {
                    ApiError::general_with_raw(
                        format!("Contribution is missing its {}", name),
                        document.raw(),
                    )
                })
            };
            let revision_id = field("revid")?.parse::<u64>().map_err(|e| {
                ApiError::general_with_raw(
                    format!("Contribution has a non-numeric revid ({})", e),
                    document.raw(),
                )
            })?;
            Ok(Contribution {
                user: item.attr("user").unwrap_or(user).to_owned(),
                title: field("title")?,
                comment: field("comment")?,
                timestamp: field("timestamp")?,
                revision_id,
            })
        })
        .collect()
}

impl<T: Transport> MediaWikiApi<T> {
    /// Groups `user` belongs to.
    ///
    /// Successful lookups are cached for the lifetime of this client, keyed
    /// by `user` as given; later calls with the same name do not touch the
    /// network.
    pub async fn get_user_groups(&self, user: &str) -> Result<Vec<String>> {
        self.rights_cache
            .get_or_fetch(user, move || async move {
                let query = Query::action("query")
                    .with("list", "users")
                    .with("usprop", "groups")
                    .with("ususers", user);
                let document = self.call(&query, false).await?;
                parse_user_groups(&document, user)
            })
            .await
    }

    pub async fn get_registration_date(&self, user: &str) -> Result<Option<DateTime<Utc>>> {
        let query = Query::action("query")
            .with("list", "users")
            .with("usprop", "registration")
            .with("ususers", user);
        let document = self.call(&query, false).await?;
        parse_registration_date(&document, user)
    }

    pub async fn get_user_edit_count(&self, user: &str) -> Result<u64> {
        let query = Query::action("query")
            .with("list", "users")
            .with("usprop", "editcount")
            .with("ususers", user);
        let document = self.call(&query, false).await?;
        parse_edit_count(&document, user)
    }

    /// The newest `limit` contributions of `user`.
    pub async fn get_contributions(&self, user: &str, limit: u32) -> Result<Vec<Contribution>> {
        let query = Query::action("query")
            .with("list", "usercontribs")
            .with("ucuser", user)
            .with("uclimit", limit.to_string())
            .with("ucprop", "title|timestamp|comment|ids");
        self.continued(query, Fetch::FirstPage, |document| {
            parse_contributions(document, user)
        })
        .await
    }
}
