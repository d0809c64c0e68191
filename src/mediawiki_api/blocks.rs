use std::net::IpAddr;

use itertools::Itertools;
use lazy_regex::regex_captures;

use super::{Fetch, MediaWikiApi};
use crate::{
    definitions::{BlockFlags, BlockInformation},
    errors::{ApiError, Result},
    query::Query,
    response::{Document, Element},
    transport::Transport,
};

const BLOCK_PROPERTIES: [&str; 7] = ["id", "user", "by", "timestamp", "expiry", "reason", "flags"];

/// How a block lookup addresses its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockTarget {
    /// An IP address or range, looked up with `bkip`.
    Address(String),
    /// An account name, looked up with `bkusers`.
    User(String),
}

impl BlockTarget {
    /// `Address` for `1.2.3.4`, `2001:db8::1` and ranges like `10.0.0.0/16`;
    /// `User` for anything else.
    pub fn classify(identifier: &str) -> Self {
        let trimmed = identifier.trim();
        let is_address = match regex_captures!(r"^(.+)/(\d{1,3})$", trimmed) {
            Some((_, address, prefix)) => match (address.parse::<IpAddr>(), prefix.parse::<u8>()) {
                (Ok(IpAddr::V4(_)), Ok(bits)) => bits <= 32,
                (Ok(IpAddr::V6(_)), Ok(bits)) => bits <= 128,
                _ => false,
            },
            None => trimmed.parse::<IpAddr>().is_ok(),
        };

        if is_address {
            BlockTarget::Address(trimmed.to_owned())
        } else {
            BlockTarget::User(trimmed.to_owned())
        }
    }

    fn parameter(&self) -> (&'static str, &str) {
        match self {
            BlockTarget::Address(address) => ("bkip", address),
            BlockTarget::User(user) => ("bkusers", user),
        }
    }
}

fn parse_flags(block: &Element) -> BlockFlags {
    BlockFlags {
        auto_block: block.has_attr("autoblock"),
        no_create: block.has_attr("nocreate"),
        no_email: block.has_attr("noemail"),
        allow_user_talk: block.has_attr("allowusertalk"),
        anon_only: block.has_attr("anononly"),
    }
}

/// Blocks listed in `blocks/block`. Expiry is kept as sent, `infinity` included.
pub(crate) fn parse_blocks(document: &Document) -> Result<Vec<BlockInformation>> {
    document
        .select("blocks/block")
        .into_iter()
        .map(|block| -> Result<BlockInformation> {
            let required = |name: &str| {
                block.attr(name).map(str::to_owned).ok_or_else(|| {
                    ApiError::general_with_raw(format!("Block is missing its {}", name), document.raw())
                })
            };
            Ok(BlockInformation {
                id: required("id")?,
                target: required("user")?,
                blocked_by: required("by")?,
                start: required("timestamp")?,
                expiry: required("expiry")?,
                reason: block.attr("reason").unwrap_or_default().to_owned(),
                flags: parse_flags(block),
            })
        })
        .collect()
}

impl<T: Transport> MediaWikiApi<T> {
    /// Every active block on `target`, an account name or an IP address/range.
    pub async fn get_block_information(&self, target: &str) -> Result<Vec<BlockInformation>> {
        let target = BlockTarget::classify(target);
        log::debug!("Looking up blocks for {:?}", target);

        let (parameter, value) = target.parameter();
        let query = Query::action("query")
            .with("list", "blocks")
            .with("bkprop", BLOCK_PROPERTIES.iter().join("|"))
            .with("bklimit", "max")
            .with(parameter, value);
        self.continued(query, Fetch::All, parse_blocks).await
    }
}
