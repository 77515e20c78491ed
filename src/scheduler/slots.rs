//! Single job slot per owner.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::BackgroundJob;

/// Registry holding at most one job per owner key.
///
/// Starting a job for an owner stops the owner's previous job first.
#[derive(Debug)]
pub struct JobSlots<K> {
    slots: Mutex<FxHashMap<K, BackgroundJob>>,
}

impl<K> Default for JobSlots<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<K: Eq + Hash> JobSlots<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the owner's current job, then start a guarded one in its place.
    pub fn start<G, F, Fut>(
        &self,
        owner: K,
        interval: Duration,
        jitter: f64,
        alive: G,
        work: F,
    ) -> BackgroundJob
    where
        G: Fn() -> bool + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slots = self.slots.lock();
        if let Some(previous) = slots.remove(&owner) {
            previous.stop();
        }
        let job = BackgroundJob::start_guarded(interval, jitter, alive, work);
        slots.insert(owner, job.clone());
        job
    }

    /// Stop and forget the owner's job. Returns whether one existed.
    pub fn stop(&self, owner: &K) -> bool {
        match self.slots.lock().remove(owner) {
            Some(job) => {
                job.stop();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        for (_, job) in self.slots.lock().drain() {
            job.stop();
        }
    }

    /// Number of owners with a job that has not stopped.
    pub fn len(&self) -> usize {
        let mut slots = self.slots.lock();
        slots.retain(|_, job| !job.is_stopped());
        slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
