//! Common pieces shared across CLI commands.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Notify;
use url::Url;

use crate::config::PageConfig;
use crate::dom::{Document, LiveUpdate};
use crate::log;
use crate::mount::{BehaviorRegistry, Mounter};
use crate::nav::{NavOutcome, NavRequest, Navigator};
use crate::page::{Host, Page, SharedPage};
use crate::transport::{HttpTransport, Transport};

/// Host backed by the terminal: prompts on stdin, reloads on request.
#[derive(Debug, Default)]
pub struct TerminalHost {
    reload: Notify,
}

impl TerminalHost {
    /// Resolves once something asked for a full reload.
    pub async fn reload_requested(&self) {
        self.reload.notified().await;
    }
}

impl Host for TerminalHost {
    fn confirm(&self, message: &str) -> bool {
        print!("{message} [y/N] ");
        io::stdout().flush().ok();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }

    fn reload(&self) {
        self.reload.notify_one();
    }
}

/// Behaviors available to pages opened from the command line.
///
/// - `["log", message]` prints the message when the element mounts
/// - `["pin"]` keeps the element out of server pushes
/// - `["allow", name, ...]` lets pushes update the named protected state
pub fn builtin_behaviors() -> BehaviorRegistry {
    let registry = BehaviorRegistry::new();
    registry.register("log", |call| {
        let message = call.str_arg(0).unwrap_or_default();
        log!("page"; "{message}");
        Ok(())
    });
    registry.register("pin", |call| {
        call.document.set_live_update(call.element, LiveUpdate::Preserve);
        Ok(())
    });
    registry.register("allow", |call| {
        let names: Vec<&str> = call.args.iter().filter_map(|v| v.as_str()).collect();
        anyhow::ensure!(!names.is_empty(), "`allow` needs at least one name");
        call.document.set_live_update(call.element, LiveUpdate::allow(names));
        Ok(())
    });
    registry
}

/// Everything one opened page needs.
pub struct Client {
    pub page: SharedPage,
    pub mounter: Mounter,
    pub transport: Arc<dyn Transport>,
    pub host: Arc<TerminalHost>,
    pub navigator: Navigator,
}

impl Client {
    /// Set up an empty page at `url`, nothing fetched yet.
    pub fn new(config: &PageConfig, url: Url) -> Result<Self> {
        let page = Page::new(url, Document::new()).shared();
        let mounter = Mounter::new(
            &page,
            Arc::new(builtin_behaviors()),
            config.document.options(),
        );
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new().context("failed to build HTTP client")?);
        let host = Arc::new(TerminalHost::default());
        let navigator = Navigator::new(
            mounter.clone(),
            Arc::clone(&transport),
            Arc::clone(&host) as Arc<dyn Host>,
            config.navigation.options(),
        );
        Ok(Self {
            page,
            mounter,
            transport,
            host,
            navigator,
        })
    }

    pub fn location(&self) -> Url {
        self.page.lock().location.clone()
    }

    /// Fetch and mount the document at the current location.
    pub async fn open(&self) -> Result<NavOutcome> {
        let url = self.location();
        self.navigator
            .navigate(NavRequest::link(url.clone()))
            .await
            .with_context(|| format!("failed to open {url}"))
    }
}

/// Format count with singular/plural noun.
///
/// ```ignore
/// plural_count(1, "update") // "1 update"
/// plural_count(3, "update") // "3 updates"
/// ```
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

/// Resolve the URL argument of a command.
pub fn page_url(config: &PageConfig, input: &str) -> Result<Url> {
    config
        .resolve_url(input)
        .with_context(|| format!("invalid page URL `{input}` (set [site] origin for relative URLs)"))
}
