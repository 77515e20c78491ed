//! Background jobs owned by elements of the live page.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::dom::NodeId;
use crate::scheduler::{BackgroundJob, JobSlots};

use super::SharedPage;

/// Per-element job slots bound to the page.
///
/// A job started here stops on its own once its owner is no longer
/// connected to the live document, checked before every run.
#[derive(Debug, Clone)]
pub struct AttachedJobs {
    page: SharedPage,
    slots: Arc<JobSlots<NodeId>>,
}

impl AttachedJobs {
    pub fn new(page: SharedPage) -> Self {
        Self {
            page,
            slots: Arc::new(JobSlots::new()),
        }
    }

    /// Start a recurring job for `owner`, replacing its previous one.
    pub fn every<F, Fut>(
        &self,
        owner: NodeId,
        interval: Duration,
        jitter: f64,
        work: F,
    ) -> BackgroundJob
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let page = Arc::downgrade(&self.page);
        let alive = move || {
            page.upgrade()
                .is_some_and(|page| page.lock().document.is_connected(owner))
        };
        self.slots.start(owner, interval, jitter, alive, work)
    }

    pub fn stop(&self, owner: NodeId) -> bool {
        self.slots.stop(&owner)
    }

    pub fn stop_all(&self) {
        self.slots.stop_all();
    }

    /// Number of owners with a live job.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn page(&self) -> &SharedPage {
        &self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::page::Page;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    #[tokio::test(start_paused = true)]
    async fn test_job_stops_when_owner_detached() {
        let page = Page::new(
            Url::parse("http://site.test/").unwrap(),
            Document::parse(r#"<div id="clock"></div>"#),
        )
        .shared();
        let owner = page.lock().document.find_by_id("clock").unwrap();
        let jobs = AttachedJobs::new(Arc::clone(&page));

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let job = jobs.every(owner, Duration::from_millis(100), 0.0, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        });

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        page.lock().document.detach(owner);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(job.is_stopped());
        assert!(jobs.is_empty());
    }
}
