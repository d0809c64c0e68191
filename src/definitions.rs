use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::Serialize;
use std::fmt::Display;

/// Literal the API uses for "never expires".
pub const INFINITE_EXPIRY: &str = "infinity";

/// A per-action restriction on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageProtection {
    /// `edit`, `move`, `create`, ...
    pub protection_type: String,
    pub level: String,
    /// `None` means the protection does not expire.
    pub expiry: Option<DateTime<Utc>>,
}

/// What the wiki knows about a page, after following redirects.
///
/// Built through one of three constructors so the missing/present fields
/// stay consistent: [`PageInformation::redirects_only`],
/// [`PageInformation::missing_page`] and [`PageInformation::existing_page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInformation {
    redirected_from: Vec<String>,
    protection: Vec<PageProtection>,
    title: Option<String>,
    size: Option<u64>,
    last_rev_user: Option<String>,
    last_rev_comment: Option<String>,
    touched: Option<DateTime<Utc>>,
    missing: bool,
}

impl PageInformation {
    /// No page node came back; only the redirect chain is known.
    pub fn redirects_only(redirected_from: Vec<String>) -> Self {
        Self {
            redirected_from,
            protection: Vec::new(),
            title: None,
            size: None,
            last_rev_user: None,
            last_rev_comment: None,
            touched: None,
            missing: false,
        }
    }

    /// The target page does not exist (it may still be create-protected).
    pub fn missing_page(
        redirected_from: Vec<String>,
        protection: Vec<PageProtection>,
        title: String,
    ) -> Self {
        Self {
            redirected_from,
            protection,
            title: Some(title),
            size: None,
            last_rev_user: None,
            last_rev_comment: None,
            touched: None,
            missing: true,
        }
    }

    pub fn existing_page(
        redirected_from: Vec<String>,
        protection: Vec<PageProtection>,
        title: String,
        size: u64,
        last_rev_comment: Option<String>,
        last_rev_user: Option<String>,
        touched: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            redirected_from,
            protection,
            title: Some(title),
            size: Some(size),
            last_rev_user,
            last_rev_comment,
            touched,
            missing: false,
        }
    }

    /// Titles passed through on the way to the target, oldest first.
    pub fn redirected_from(&self) -> &[String] {
        &self.redirected_from
    }

    pub fn protection(&self) -> &[PageProtection] {
        &self.protection
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Page length in bytes.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn last_rev_user(&self) -> Option<&str> {
        self.last_rev_user.as_deref()
    }

    pub fn last_rev_comment(&self) -> Option<&str> {
        self.last_rev_comment.as_deref()
    }

    pub fn touched(&self) -> Option<DateTime<Utc>> {
        self.touched
    }

    pub fn is_missing(&self) -> bool {
        self.missing
    }
}

/// Block options, each set when the block record carries the marker attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockFlags {
    pub auto_block: bool,
    pub no_create: bool,
    pub no_email: bool,
    pub allow_user_talk: bool,
    pub anon_only: bool,
}

impl Display for BlockFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = [
            (self.no_create, "NOCREATE"),
            (self.auto_block, "AUTOBLOCK"),
            (self.no_email, "NOEMAIL"),
            (self.allow_user_talk, "ALLOWUSERTALK"),
            (self.anon_only, "ANONONLY"),
        ];
        for (set, name) in names {
            if set {
                write!(f, "{} ", name)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInformation {
    pub id: String,
    pub target: String,
    pub blocked_by: String,
    pub start: String,
    /// Kept verbatim; may be [`INFINITE_EXPIRY`].
    pub expiry: String,
    pub reason: String,
    pub flags: BlockFlags,
}

impl Display for BlockInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Block {} targeting {} blocked by {} for {} starting at {} because {} Flags: {}",
            self.id, self.target, self.blocked_by, self.expiry, self.start, self.reason, self.flags
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub user: String,
    pub title: String,
    pub comment: String,
    pub timestamp: String,
    pub revision_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCategoryProperties {
    pub sort_key: String,
    pub hidden: bool,
}

/// One entry of the site's interwiki map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterwikiPrefix {
    pub prefix: String,
    pub local: bool,
    /// Target URL with `$1` standing in for the page name.
    pub url: String,
    pub language: Option<String>,
}

/// Current text of a page together with the revision timestamp it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub content: String,
    pub timestamp: String,
}

/// An edit to submit with [`crate::MediaWikiApi::write_page`].
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct PageEdit {
    pub title: String,
    pub content: String,
    pub summary: String,
    /// Timestamp the edit is based on, for edit-conflict detection.
    #[builder(default, setter(into, strip_option))]
    pub base_timestamp: Option<String>,
    #[builder(default)]
    pub bot: bool,
    #[builder(default)]
    pub minor: bool,
}

/// Kinds of token `action=query&meta=tokens` hands out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenKind {
    #[default]
    Csrf,
    Login,
    Watch,
    Patrol,
    Rollback,
    UserRights,
    CreateAccount,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Csrf => "csrf",
            TokenKind::Login => "login",
            TokenKind::Watch => "watch",
            TokenKind::Patrol => "patrol",
            TokenKind::Rollback => "rollback",
            TokenKind::UserRights => "userrights",
            TokenKind::CreateAccount => "createaccount",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
