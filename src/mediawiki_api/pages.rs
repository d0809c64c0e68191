use std::collections::HashMap;

use super::{Fetch, MediaWikiApi};
use crate::{
    definitions::{
        INFINITE_EXPIRY, PageCategoryProperties, PageContent, PageEdit, PageInformation,
        PageProtection, TokenKind,
    },
    errors::{ApiError, Result},
    query::Query,
    response::{Document, Element, parse_timestamp},
    transport::Transport,
};

const CATEGORY_NAMESPACE: &str = "Category:";

fn parse_protection(pr: &Element, document: &Document) -> Result<PageProtection> {
    let required = |name: &str| {
        pr.attr(name).map(str::to_owned).ok_or_else(|| {
            ApiError::general_with_raw(format!("Protection entry has no {}", name), document.raw())
        })
    };
    let expiry = match pr.attr("expiry") {
        None | Some(INFINITE_EXPIRY) => None,
        Some(value) => Some(parse_timestamp(value)?),
    };
    Ok(PageProtection {
        protection_type: required("type")?,
        level: required("level")?,
        expiry,
    })
}

/// Map a `prop=info|revisions&inprop=protection&redirects` response.
///
/// The redirect chain comes from the top-level `<redirects>` block whether or
/// not a page came back at all.
pub(crate) fn parse_page_information(document: &Document) -> Result<PageInformation> {
    let redirected_from: Vec<String> = document
        .select("redirects/r")
        .iter()
        .filter_map(|r| r.attr("from"))
        .map(str::to_owned)
        .collect();

    let Some(page) = document.select_first("pages/page") else {
        return Ok(PageInformation::redirects_only(redirected_from));
    };

    let title = page
        .attr("title")
        .ok_or_else(|| ApiError::general_with_raw("Page has no title", document.raw()))?
        .to_owned();
    let protection = page
        .select_children("protection/pr")
        .into_iter()
        .map(|pr| parse_protection(pr, document))
        .collect::<Result<Vec<_>>>()?;

    if page.has_attr("missing") {
        return Ok(PageInformation::missing_page(redirected_from, protection, title));
    }

    let size = page
        .attr("length")
        .and_then(|length| length.parse::<u64>().ok())
        .ok_or_else(|| ApiError::general_with_raw("Page has no valid length", document.raw()))?;
    let revision = page.select_children("revisions/rev").into_iter().next();
    let last_rev_user = revision.and_then(|rev| rev.attr("user")).map(str::to_owned);
    let last_rev_comment = revision.and_then(|rev| rev.attr("comment")).map(str::to_owned);
    let touched = page.attr("touched").map(parse_timestamp).transpose()?;

    Ok(PageInformation::existing_page(
        redirected_from,
        protection,
        title,
        size,
        last_rev_comment,
        last_rev_user,
        touched,
    ))
}

/// `(title, properties)` for each `categories/cl` of one response.
pub(crate) fn parse_page_categories(
    document: &Document,
) -> Result<Vec<(String, PageCategoryProperties)>> {
    document
        .select("categories/cl")
        .into_iter()
        .map(|cl| -> Result<(String, PageCategoryProperties)> {
            let title = cl.attr("title").ok_or_else(|| {
                ApiError::general_with_raw("Category entry has no title", document.raw())
            })?;
            Ok((
                title.to_owned(),
                PageCategoryProperties {
                    sort_key: cl.attr("sortkeyprefix").unwrap_or_default().to_owned(),
                    hidden: cl.has_attr("hidden"),
                },
            ))
        })
        .collect()
}

/// `None` when the page does not exist.
pub(crate) fn parse_page_content(document: &Document) -> Result<Option<PageContent>> {
    if document.attr("pages/page", "missing").is_some() {
        return Ok(None);
    }
    let revision = document
        .select_first("rev")
        .ok_or_else(|| ApiError::general_with_raw("No content found!", document.raw()))?;
    Ok(Some(PageContent {
        content: revision.text().to_owned(),
        timestamp: revision.attr("timestamp").unwrap_or_default().to_owned(),
    }))
}

pub(crate) fn parse_category_size(document: &Document, category: &str) -> Result<u64> {
    match document.attr("page/categoryinfo", "size") {
        Some(size) => size.trim().parse::<u64>().map_err(|e| {
            ApiError::general_with_raw(
                format!("Category size {:?} is not a number ({})", size, e),
                document.raw(),
            )
        }),
        None if document.attr("pages/page", "missing").is_some() => {
            Err(ApiError::missing_object(category))
        }
        None => Err(ApiError::general_with_raw(
            format!("No category information for {}", category),
            document.raw(),
        )),
    }
}

fn category_title(category: &str) -> String {
    if category.starts_with(CATEGORY_NAMESPACE) {
        category.to_owned()
    } else {
        format!("{}{}", CATEGORY_NAMESPACE, category)
    }
}

impl<T: Transport> MediaWikiApi<T> {
    /// Whether `page` is in `category` (given with its namespace prefix).
    /// A missing page is in no category.
    pub async fn page_is_in_category(&self, page: &str, category: &str) -> Result<bool> {
        log::info!("Getting category {} for {} from webservice", category, page);
        let query = Query::action("query")
            .with("prop", "categories")
            .with("titles", page)
            .with("clcategories", category);
        let document = self.call(&query, false).await?;
        Ok(!document.select("categories/cl").is_empty())
    }

    /// Every category of `page`, keyed by category title.
    ///
    /// Reads all continuation pages. If a title repeats across pages the later
    /// entry replaces the earlier one.
    pub async fn get_categories_of_page(
        &self,
        page: &str,
    ) -> Result<HashMap<String, PageCategoryProperties>> {
        let query = Query::action("query")
            .with("prop", "categories")
            .with("titles", page)
            .with("clprop", "sortkey|hidden")
            .with("cllimit", "max");
        let entries = self
            .continued(query, Fetch::All, parse_page_categories)
            .await?;
        Ok(entries.into_iter().collect())
    }

    /// Follow redirects from `page` and describe where they end up.
    pub async fn get_page_information(&self, page: &str) -> Result<PageInformation> {
        let query = Query::action("query")
            .with("prop", "info|revisions")
            .with("inprop", "protection")
            .with("rvprop", "user|comment")
            .with("redirects", "true")
            .with("titles", page);
        let document = self.call(&query, false).await?;
        parse_page_information(&document)
    }

    /// Current wikitext of `page` and the timestamp of that revision.
    pub async fn get_page_content(&self, page: &str) -> Result<Option<PageContent>> {
        let query = Query::action("query")
            .with("prop", "info|revisions")
            .with("titles", page)
            .with("rvprop", "timestamp|content");
        let document = self.call(&query, false).await?;
        parse_page_content(&document)
    }

    /// Save an edit.
    ///
    /// # Returns
    /// - Ok(true) -> The wiki accepted the edit.
    /// - Ok(false) -> The wiki answered with a result other than `Success`.
    /// - Err(ApiError::General) -> No result in the response.
    pub async fn write_page(&self, edit: &PageEdit) -> Result<bool> {
        let token = self.fetch_token(TokenKind::Csrf).await?;

        let mut query = Query::action("edit");
        query
            .set("title", edit.title.as_str())
            .set("text", edit.content.as_str())
            .set("summary", edit.summary.as_str());
        if let Some(timestamp) = &edit.base_timestamp {
            query
                .set("basetimestamp", timestamp.as_str())
                .set("starttimestamp", timestamp.as_str());
        }
        if edit.bot {
            query.flag("bot");
        }
        query.flag(if edit.minor { "minor" } else { "notminor" });
        query.set("token", token);

        let document = self.call(&query, true).await?;
        let result = document.attr("edit", "result").ok_or_else(|| {
            ApiError::general_with_raw(
                "No result available - something went wrong.",
                document.raw(),
            )
        })?;
        log::info!("Edit of {} returned {}", edit.title, result);
        Ok(result == "Success")
    }

    pub async fn delete_page(&self, page: &str, reason: &str) -> Result<()> {
        let token = self.fetch_token(TokenKind::Csrf).await?;
        let query = Query::action("delete")
            .with("title", page)
            .with("reason", reason)
            .with("token", token);
        self.call(&query, true).await?;
        Ok(())
    }

    /// Titles of all pages starting with `prefix`, across every continuation page.
    pub async fn prefix_search(&self, prefix: &str) -> Result<Vec<String>> {
        let query = Query::action("query")
            .with("list", "allpages")
            .with("apprefix", prefix)
            .with("aplimit", "max");
        self.continued(query, Fetch::All, |document| {
            Ok(document
                .select("allpages/p")
                .iter()
                .filter_map(|p| p.attr("title"))
                .map(str::to_owned)
                .collect())
        })
        .await
    }

    /// Number of members of `category`; the `Category:` prefix is optional.
    pub async fn get_category_size(&self, category: &str) -> Result<u64> {
        let title = category_title(category);
        let query = Query::action("query")
            .with("prop", "categoryinfo")
            .with("titles", title.as_str());
        let document = self.call(&query, false).await?;
        parse_category_size(&document, &title)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::api;
    use super::*;
    use chrono::{TimeZone, Utc};

    fn doc(body: &str) -> Document {
        Document::parse(body.as_bytes()).unwrap()
    }

    const FOO_TO_FOOBAR: &str = "<api batchcomplete=\"\"><query><redirects><r from=\"Foo\" to=\"Foobar\" /></redirects><pages><page _idx=\"11178\" pageid=\"11178\" ns=\"0\" title=\"Foobar\" contentmodel=\"wikitext\" pagelanguage=\"en\" touched=\"2018-10-23T14:49:15Z\" lastrevid=\"864172043\" length=\"7598\"><revisions><rev user=\"Sam Sailor\" comment=\"Adding local [[Wikipedia:Short description|short description]]: &quot;Use of metasyntactic variables in computer programming&quot;\" /></revisions><protection /><restrictiontypes><rt>edit</rt><rt>move</rt></restrictiontypes></page></pages></query></api>";
    const POTATO: &str = "<api batchcomplete=\"\"><query><pages><page _idx=\"23501\" pageid=\"23501\" ns=\"0\" title=\"Potato\" touched=\"2018-10-23T21:24:52Z\" lastrevid=\"865424894\" length=\"93906\"><revisions><rev user=\"Northamerica1000\" comment=\"/* External links */ nav bar layout\" /></revisions><protection><pr type=\"edit\" level=\"autoconfirmed\" expiry=\"infinity\" /></protection></page></pages></query></api>";
    const CHAIN: &str = "<api batchcomplete=\"\"><query><redirects><r from=\"User:Example/r1\" to=\"User:Example/r2\" /><r from=\"User:Example/r2\" to=\"User:Example\" /></redirects><pages><page pageid=\"31745629\" ns=\"2\" title=\"User:Example\" touched=\"2018-10-09T08:15:11Z\" length=\"1280\"><revisions><rev user=\"Example\" comment=\"tweak wording\" /></revisions><protection /></page></pages></query></api>";
    const SELF_REDIRECT: &str = "<api batchcomplete=\"\"><query><redirects><r from=\"User:Example/r1\" to=\"User:Example/r1\" /></redirects></query></api>";
    const CYCLE: &str = "<api batchcomplete=\"\"><query><redirects><r from=\"User:Example/r1\" to=\"User:Example/r2\" /><r from=\"User:Example/r2\" to=\"User:Example/r1\" /></redirects></query></api>";
    const MISSING_TARGET: &str = "<?xml version=\"1.0\"?><api batchcomplete=\"\"><query><redirects><r from=\"User:Example/sandbox/r1\" to=\"User:Example/sandbox/r2\" /></redirects><pages><page _idx=\"-1\" ns=\"2\" title=\"User:Example/sandbox/r2\" missing=\"\"><protection><pr type=\"create\" level=\"autoconfirmed\" expiry=\"2018-10-25T02:00:38Z\" /></protection><restrictiontypes><rt>create</rt></restrictiontypes></page></pages></query></api>";

    #[test]
    fn redirect_to_existing_page() {
        let info = parse_page_information(&doc(FOO_TO_FOOBAR)).unwrap();
        assert_eq!(
            info,
            PageInformation::existing_page(
                vec!["Foo".into()],
                vec![],
                "Foobar".into(),
                7598,
                Some("Adding local [[Wikipedia:Short description|short description]]: \"Use of metasyntactic variables in computer programming\"".into()),
                Some("Sam Sailor".into()),
                Some(Utc.with_ymd_and_hms(2018, 10, 23, 14, 49, 15).unwrap()),
            )
        );
    }

    #[test]
    fn infinite_protection_has_no_expiry() {
        let info = parse_page_information(&doc(POTATO)).unwrap();
        assert!(info.redirected_from().is_empty());
        assert_eq!(
            info.protection(),
            [PageProtection {
                protection_type: "edit".into(),
                level: "autoconfirmed".into(),
                expiry: None,
            }]
        );
        assert_eq!(info.size(), Some(93906));
        assert_eq!(info.last_rev_user(), Some("Northamerica1000"));
    }

    #[test]
    fn redirect_chains_keep_hop_order() {
        let chain = parse_page_information(&doc(CHAIN)).unwrap();
        assert_eq!(chain.redirected_from(), ["User:Example/r1", "User:Example/r2"]);
        assert_eq!(chain.title(), Some("User:Example"));

        let self_redirect = parse_page_information(&doc(SELF_REDIRECT)).unwrap();
        assert_eq!(self_redirect, PageInformation::redirects_only(vec!["User:Example/r1".into()]));

        let cycle = parse_page_information(&doc(CYCLE)).unwrap();
        assert_eq!(
            cycle,
            PageInformation::redirects_only(vec!["User:Example/r1".into(), "User:Example/r2".into()])
        );
    }

    #[test]
    fn missing_target_keeps_create_protection() {
        let info = parse_page_information(&doc(MISSING_TARGET)).unwrap();
        assert_eq!(
            info,
            PageInformation::missing_page(
                vec!["User:Example/sandbox/r1".into()],
                vec![PageProtection {
                    protection_type: "create".into(),
                    level: "autoconfirmed".into(),
                    expiry: Some(Utc.with_ymd_and_hms(2018, 10, 25, 2, 0, 38).unwrap()),
                }],
                "User:Example/sandbox/r2".into(),
            )
        );
    }

    #[tokio::test]
    async fn page_information_requests_redirects_and_protection() {
        let api = api([POTATO]);
        let info = api.get_page_information("Potato").await.unwrap();
        assert_eq!(info.title(), Some("Potato"));

        let query = &api.transport().calls()[0].query;
        assert_eq!(query.get("inprop"), Some("protection"));
        assert!(query.get("redirects").is_some());
        assert_eq!(query.get("titles"), Some("Potato"));
    }

    #[tokio::test]
    async fn page_in_category() {
        let in_category = "<?xml version=\"1.0\"?><api batchcomplete=\"\"><query><pages><page _idx=\"534366\" pageid=\"534366\" ns=\"0\" title=\"Barack Obama\"><categories><cl ns=\"14\" title=\"Category:Living people\" /></categories></page></pages></query></api>";
        let not_in_category = "<?xml version=\"1.0\"?><api batchcomplete=\"\"><query><pages><page _idx=\"534366\" pageid=\"534366\" ns=\"0\" title=\"Barack Obama\" /></pages></query></api>";
        let missing = "<?xml version=\"1.0\"?><api batchcomplete=\"\"><query><pages><page _idx=\"-1\" ns=\"0\" title=\"Nonexisdyrnfdnkdkdkkfd\" missing=\"\" /></pages></query></api>";
        let api = api([in_category, not_in_category, missing]);

        assert!(api.page_is_in_category("Barack Obama", "Category:Living people").await.unwrap());
        assert!(!api.page_is_in_category("Barack Obama", "Category:Living people").await.unwrap());
        assert!(!api.page_is_in_category("Nonexisdyrnfdnkdkdkkfd", "Category:Living people").await.unwrap());

        let query = &api.transport().calls()[0].query;
        assert_eq!(query.get("clcategories"), Some("Category:Living people"));
    }

    #[tokio::test]
    async fn categories_across_continuation_pages() {
        let first = "<api><continue clcontinue=\"58543806|AfC_submissions_declined_as_an_advertisement\" continue=\"||\" /><query><pages><page _idx=\"58543806\" pageid=\"58543806\" ns=\"118\" title=\"Draft:Al Silva\"><categories><cl ns=\"14\" title=\"Category:AfC submissions by date/21 September 2018\" sortkey=\"293f044d\" sortkeyprefix=\"Al Silva\" /><cl ns=\"14\" title=\"Category:AfC submissions declined as a non-notable biography\" sortkey=\"293f\" sortkeyprefix=\"\" /></categories></page></pages></query></api>";
        let second = "<api><query><pages><page _idx=\"58543806\" pageid=\"58543806\" ns=\"118\" title=\"Draft:Al Silva\"><categories><cl ns=\"14\" title=\"Category:AfC submissions declined as an advertisement\" sortkey=\"293f\" sortkeyprefix=\"\" hidden=\"\" /><cl ns=\"14\" title=\"Category:Declined AfC submissions\" sortkey=\"293f\" sortkeyprefix=\"\" /></categories></page></pages></query></api>";
        let api = api([first, second]);

        let categories = api.get_categories_of_page("Draft:Al Silva").await.unwrap();

        assert_eq!(categories.len(), 4);
        assert_eq!(api.transport().call_count(), 2);
        let dated = &categories["Category:AfC submissions by date/21 September 2018"];
        assert_eq!(dated.sort_key, "Al Silva");
        assert!(!dated.hidden);
        assert!(categories["Category:AfC submissions declined as an advertisement"].hidden);
        assert!(categories.contains_key("Category:Declined AfC submissions"));
        assert_eq!(
            api.transport().calls()[1].query.get("clcontinue"),
            Some("58543806|AfC_submissions_declined_as_an_advertisement")
        );
    }

    #[test]
    fn later_category_entry_wins() {
        let body = "<api><query><pages><page title=\"P\"><categories><cl title=\"Category:A\" sortkeyprefix=\"first\" /><cl title=\"Category:A\" sortkeyprefix=\"second\" hidden=\"\" /></categories></page></pages></query></api>";
        let map: HashMap<_, _> = parse_page_categories(&doc(body)).unwrap().into_iter().collect();
        assert_eq!(map.len(), 1);
        assert_eq!(map["Category:A"].sort_key, "second");
    }

    #[tokio::test]
    async fn page_content() {
        let body = "<api batchcomplete=\"\"><query><pages><page pageid=\"1\" ns=\"0\" title=\"Sandbox\"><revisions><rev timestamp=\"2018-10-23T14:49:15Z\" contentformat=\"text/x-wiki\">Hello &amp; welcome</rev></revisions></page></pages></query></api>";
        let missing = "<api><query><pages><page ns=\"0\" title=\"Nope\" missing=\"\" /></pages></query></api>";
        let no_revision = "<api><query><pages><page ns=\"0\" title=\"Odd\" /></pages></query></api>";
        let api = api([body, missing, no_revision]);

        let content = api.get_page_content("Sandbox").await.unwrap().unwrap();
        assert_eq!(content.content, "Hello & welcome");
        assert_eq!(content.timestamp, "2018-10-23T14:49:15Z");

        assert!(api.get_page_content("Nope").await.unwrap().is_none());
        assert_eq!(api.get_page_content("Odd").await.unwrap_err().kind(), "General");
    }

    #[test]
    fn whitespace_only_content_is_kept() {
        let body = "<api><query><pages><page pageid=\"1\" ns=\"0\" title=\"Blank\"><revisions><rev timestamp=\"2018-10-23T14:49:15Z\">\n\n   </rev></revisions></page></pages></query></api>";
        let content = parse_page_content(&doc(body)).unwrap().unwrap();
        assert_eq!(content.content, "\n\n   ");
    }

    #[tokio::test]
    async fn write_page_sends_token_last() {
        let token = "<api><query><tokens csrftoken=\"deadbeef+\\\" /></query></api>";
        let saved = "<api><edit result=\"Success\" pageid=\"1\" title=\"Sandbox\" /></api>";
        let api = api([token, saved]);
        let edit = crate::definitions::PageEditBuilder::default()
            .title("Sandbox")
            .content("text")
            .summary("testing")
            .base_timestamp("2018-10-23T14:49:15Z")
            .bot(true)
            .build()
            .unwrap();

        assert!(api.write_page(&edit).await.unwrap());

        let calls = api.transport().calls();
        let write = &calls[1];
        assert!(write.post);
        assert_eq!(write.query.get("action"), Some("edit"));
        assert_eq!(write.query.get("basetimestamp"), Some("2018-10-23T14:49:15Z"));
        assert_eq!(write.query.get("bot"), Some(""));
        assert_eq!(write.query.get("notminor"), Some(""));
        assert!(write.query.get("minor").is_none());
        assert_eq!(write.query.iter().last(), Some(("token", "deadbeef+\\")));
    }

    #[tokio::test]
    async fn write_page_without_result_fails() {
        let token = "<api><query><tokens csrftoken=\"abc\" /></query></api>";
        let api = api([token, "<api><error code=\"badtoken\" /></api>"]);
        let edit = crate::definitions::PageEditBuilder::default()
            .title("Sandbox")
            .content("text")
            .summary("testing")
            .build()
            .unwrap();
        assert_eq!(api.write_page(&edit).await.unwrap_err().kind(), "General");
    }

    #[tokio::test]
    async fn delete_page_posts_with_token() {
        let token = "<api><query><tokens csrftoken=\"abc\" /></query></api>";
        let api = api([token, "<api><delete title=\"Sandbox\" reason=\"test\" logid=\"1\" /></api>"]);
        api.delete_page("Sandbox", "test").await.unwrap();
        let calls = api.transport().calls();
        assert!(calls[1].post);
        assert_eq!(calls[1].query.iter().last(), Some(("token", "abc")));
    }

    #[tokio::test]
    async fn prefix_search_reads_every_page() {
        let first = "<api><continue apcontinue=\"Sandbox_3\" continue=\"-||\" /><query><allpages><p pageid=\"1\" ns=\"0\" title=\"Sandbox\" /><p pageid=\"2\" ns=\"0\" title=\"Sandbox 2\" /></allpages></query></api>";
        let second = "<api batchcomplete=\"\"><query><allpages><p pageid=\"3\" ns=\"0\" title=\"Sandbox 3\" /></allpages></query></api>";
        let api = api([first, second]);
        let titles = api.prefix_search("Sandbox").await.unwrap();
        assert_eq!(titles, vec!["Sandbox", "Sandbox 2", "Sandbox 3"]);
    }

    #[tokio::test]
    async fn category_size() {
        let body = "<api batchcomplete=\"\"><query><pages><page pageid=\"1\" ns=\"14\" title=\"Category:Living people\"><categoryinfo size=\"1032123\" pages=\"1032000\" files=\"0\" subcats=\"123\" /></page></pages></query></api>";
        let missing = "<api><query><pages><page ns=\"14\" title=\"Category:Nope\" missing=\"\" /></pages></query></api>";
        let empty = "<api><query><pages><page pageid=\"2\" ns=\"14\" title=\"Category:Odd\" /></pages></query></api>";
        let api = api([body, missing, empty]);

        assert_eq!(api.get_category_size("Living people").await.unwrap(), 1032123);
        assert_eq!(
            api.transport().calls()[0].query.get("titles"),
            Some("Category:Living people")
        );
        assert_eq!(api.get_category_size("Category:Nope").await.unwrap_err().kind(), "MissingObject");
        assert_eq!(api.get_category_size("Odd").await.unwrap_err().kind(), "General");
    }
}
