//! Mount and execute.
//!
//! Applies markup to the live page through the reconciler, then re-runs the
//! behaviors attached to the updated elements.
//!
//! - [`Mounter::mount`] fills a container with new content
//! - [`Mounter::document_mount`] replaces the whole document after checking
//!   that both sides come from the same server version

mod registry;

pub use registry::{Behavior, BehaviorCall, BehaviorRegistry, Descriptor};

use std::sync::Arc;

use thiserror::Error;

use crate::dom::{Document, LiveUpdate, NodeId};
use crate::morph::{UpdateMode, morph, morph_children};
use crate::page::{AttachedJobs, Banner, Page, PageEvent, SharedPage};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum MountError {
    #[error("version mismatch: page is {live:?}, update is {incoming:?}")]
    VersionSkew {
        live: Option<String>,
        incoming: Option<String>,
    },

    #[error("malformed behavior descriptor `{raw}`: {reason}")]
    Descriptor { raw: String, reason: String },

    #[error("behavior `{name}` failed")]
    Behavior {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("mount container is not an element of the live document")]
    Container,
}

// ============================================================================
// Mounter
// ============================================================================

/// Markup conventions the mounter reads from documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountOptions {
    /// `name` of the `<meta>` carrying the version marker
    pub version_meta: String,
    /// Attribute holding the behavior descriptor
    pub behavior_attr: String,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            version_meta: "version".into(),
            behavior_attr: "data-behavior".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mounter {
    registry: Arc<BehaviorRegistry>,
    jobs: AttachedJobs,
    options: MountOptions,
}

impl Mounter {
    pub fn new(page: &SharedPage, registry: Arc<BehaviorRegistry>, options: MountOptions) -> Self {
        Self {
            registry,
            jobs: AttachedJobs::new(Arc::clone(page)),
            options,
        }
    }

    pub fn page(&self) -> &SharedPage {
        self.jobs.page()
    }

    pub fn jobs(&self) -> &AttachedJobs {
        &self.jobs
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Reconcile the children of `container` against `content`, then run the
    /// behaviors inside it.
    ///
    /// The container is pinned afterwards so a later push update does not
    /// overwrite the content it now holds.
    pub fn mount(
        &self,
        page: &mut Page,
        container: NodeId,
        mut content: Document,
        event: &PageEvent,
    ) -> Result<(), MountError> {
        if page.document.element(container).is_none() {
            return Err(MountError::Container);
        }

        page.document.set_live_update(container, LiveUpdate::Unset);
        let content_root = content.root();
        morph_children(
            &mut page.document,
            container,
            &mut content,
            content_root,
            UpdateMode::Navigation,
        );
        let executed = self.execute(&mut page.document, container, event);
        page.document.set_live_update(container, LiveUpdate::Preserve);
        executed
    }

    /// Replace the whole document with `content`.
    ///
    /// A version mismatch aborts the update, marks the page clean and shows
    /// the version banner. Otherwise the document is morphed, behaviors run
    /// and `event` reaches the page listeners.
    pub fn document_mount(
        &self,
        page: &mut Page,
        mut content: Document,
        event: &PageEvent,
    ) -> Result<(), MountError> {
        let live = self.version(&page.document);
        let incoming = self.version(&content);
        if matches!((&live, &incoming), (Some(a), Some(b)) if a != b) {
            crate::log!(
                "mount";
                "version changed from {} to {}, update dropped",
                live.as_deref().unwrap_or_default(),
                incoming.as_deref().unwrap_or_default()
            );
            page.document.clear_modified();
            page.show_banner(Banner::version_skew());
            return Err(MountError::VersionSkew { live, incoming });
        }

        let (live_root, content_root) = (page.document.root(), content.root());
        morph(
            &mut page.document,
            live_root,
            &mut content,
            content_root,
            event.kind.mode(),
        );
        self.execute(&mut page.document, live_root, event)?;
        page.dispatch(event);
        Ok(())
    }

    /// Version marker of a document, if it carries one.
    pub fn version(&self, doc: &Document) -> Option<String> {
        let meta = doc.find(|el| {
            el.tag == "meta" && el.attrs.get("name") == Some(self.options.version_meta.as_str())
        })?;
        doc.element(meta)?.attrs.get("content").map(str::to_string)
    }

    /// Invoke the behaviors of every element under `scope` (inclusive).
    fn execute(
        &self,
        doc: &mut Document,
        scope: NodeId,
        event: &PageEvent,
    ) -> Result<(), MountError> {
        for id in doc.descendants(scope) {
            // An earlier behavior may have removed this element
            if !doc.is_connected(id) {
                continue;
            }
            let Some(raw) = doc
                .element(id)
                .and_then(|el| el.attrs.get(&self.options.behavior_attr))
                .map(str::to_string)
            else {
                continue;
            };
            if event.is_push() && is_pinned(doc, id) {
                continue;
            }

            let descriptor = Descriptor::parse(&raw)?;
            let Some(behavior) = self.registry.get(&descriptor.name) else {
                crate::log!("mount"; "unknown behavior `{}`, skipped", descriptor.name);
                continue;
            };

            let mut call = BehaviorCall {
                document: &mut *doc,
                element: id,
                event,
                args: &descriptor.args,
                jobs: &self.jobs,
            };
            behavior(&mut call).map_err(|source| MountError::Behavior {
                name: descriptor.name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Whether the element or one of its ancestors opted out of push updates.
fn is_pinned(doc: &Document, id: NodeId) -> bool {
    std::iter::once(id)
        .chain(doc.ancestors(id))
        .any(|node| doc.element(node).is_some_and(|el| el.flags.live_update.is_preserve()))
}

#[cfg(test)]
mod tests;
