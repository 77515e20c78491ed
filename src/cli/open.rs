//! `open` command: one navigation, then print the mounted document.

use anyhow::{Result, bail};

use super::common::{Client, page_url};
use crate::config::PageConfig;
use crate::log;
use crate::nav::NavOutcome;

pub async fn run(config: &PageConfig, url: &str) -> Result<()> {
    let client = Client::new(config, page_url(config, url)?)?;

    match client.open().await? {
        NavOutcome::Completed => {}
        outcome => bail!("navigation did not complete ({outcome:?})"),
    }

    let page = client.page.lock();
    if let Some(banner) = &page.banner {
        log!("warning"; "{}", banner.message);
    }
    crate::debug!("nav"; "opened {}", page.location);
    println!("{}", page.document.to_html());
    Ok(())
}
