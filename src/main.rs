use std::{env, error::Error};

use futures::future::join_all;
use serde_json::{Value, json};

use mediawiki_api::{ApiError, MediaWikiApi, MediaWikiConfiguration, ReqwestTransport, Transport};

const USAGE: &str = "usage: mediawiki_probe [user:<name>] [blocks:<target>] [category:<name>] [<page title>]...";

/// One lookup requested on the command line.
async fn probe<T: Transport>(api: &MediaWikiApi<T>, argument: &str) -> Result<Value, ApiError> {
    if let Some(user) = argument.strip_prefix("user:") {
        let groups = api.get_user_groups(user).await?;
        let edits = api.get_user_edit_count(user).await?;
        return Ok(json!({ "user": user, "groups": groups, "edit_count": edits }));
    }
    if let Some(target) = argument.strip_prefix("blocks:") {
        let blocks = api.get_block_information(target).await?;
        return Ok(json!({ "target": target, "blocks": blocks }));
    }
    if let Some(category) = argument.strip_prefix("category:") {
        let size = api.get_category_size(category).await?;
        return Ok(json!({ "category": category, "size": size }));
    }

    let information = api.get_page_information(argument).await?;
    Ok(json!({ "page": argument, "information": information }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let arguments: Vec<String> = env::args().skip(1).collect();
    if arguments.is_empty() {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    let config = MediaWikiConfiguration::from_env()?;
    log::debug!("Using {:?}", config);
    let logs_in = config.username.is_some() && config.password.is_some();
    let api = MediaWikiApi::new(ReqwestTransport::new()?, config);

    if logs_in {
        api.login().await?;
    }
    log::info!(
        "Max replication lag is {}s",
        api.get_max_replication_lag().await?
    );

    let results = join_all(arguments.iter().map(|argument| probe(&api, argument))).await;

    let mut failed = 0;
    for (argument, result) in arguments.iter().zip(results) {
        match result {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(e) => {
                failed += 1;
                log::error!("Failed to look up {}: {}", argument, e);
                if let Some(raw) = e.raw_response() {
                    log::debug!("Response was: {}", raw);
                }
            }
        }
    }

    log::info!(
        "[probe] Total: {}. Passed: {}.",
        arguments.len(),
        arguments.len() - failed
    );
    Ok(())
}
