//! `watch` command: open a page and follow its live session.
//!
//! Runs until Ctrl+C. The terminal shows one status block that is
//! rewritten on every mounted update and every banner change.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;

use super::common::{Client, page_url, plural_count};
use crate::config::PageConfig;
use crate::core::shutdown_token;
use crate::live::{LiveMode, LiveSessions};
use crate::logger::StatusLine;
use crate::log;
use crate::page::{Banner, BannerKind, Host, SharedPage};
use crate::scheduler::BackgroundJob;

/// How often the banner is sampled for display.
const BANNER_POLL: Duration = Duration::from_millis(250);

pub async fn run(config: &PageConfig, url: &str, reload: bool) -> Result<()> {
    let client = Client::new(config, page_url(config, url)?)?;
    let mode = if reload {
        LiveMode::ReloadWatch
    } else {
        config.session.mode
    };
    let options = config
        .live_options(&client.location(), mode)
        .context("invalid [session] path")?;

    let status = Arc::new(Mutex::new(StatusLine::new()));
    let updates = Arc::new(AtomicUsize::new(0));
    {
        let status = Arc::clone(&status);
        let updates = Arc::clone(&updates);
        client.page.lock().listen(move |event| {
            let count = updates.fetch_add(1, Ordering::Relaxed) + 1;
            let what = if event.is_push() { "pushed" } else { "mounted" };
            status.lock().success(&format!(
                "{what} {} ({})",
                event.url,
                plural_count(count, "update")
            ));
        });
    }
    let banners = watch_banner(Arc::clone(&client.page), Arc::clone(&status));

    if let Err(err) = client.open().await {
        // The live session keeps retrying; the page fills in once the server answers.
        log!("error"; "{err:#}");
    }

    let sessions = LiveSessions::new();
    let session = sessions.start(
        client.mounter.clone(),
        Arc::clone(&client.transport),
        Arc::clone(&client.host) as Arc<dyn Host>,
        options,
    );
    log!("live"; "watching {} ({mode:?}), press Ctrl+C to stop", client.location());
    crate::debug!("live"; "session id {}", session.id());

    let shutdown = shutdown_token();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = client.host.reload_requested() => {
                status.lock().detach();
                log!("live"; "reloading {}", client.location());
                if let Err(err) = client.open().await {
                    log!("error"; "{err:#}");
                }
            }
        }
    }

    sessions.stop();
    banners.stop();
    client.navigator.cancel();
    log!("live"; "stopped after {}", plural_count(session.updates(), "pushed update"));
    Ok(())
}

/// Mirror banner changes into the status block.
fn watch_banner(page: SharedPage, status: Arc<Mutex<StatusLine>>) -> BackgroundJob {
    let mut shown: Option<Banner> = None;
    BackgroundJob::start(BANNER_POLL, 0.0, move || {
        let banner = page.lock().banner.clone();
        if banner != shown {
            let mut status = status.lock();
            match &banner {
                Some(b) if b.kind == BannerKind::Error => status.error(&b.message, ""),
                Some(b) => status.warning(&b.message),
                None => status.success("banner cleared"),
            }
            shown = banner;
        }
        async {}
    })
}
