//! Background jobs.
//!
//! A job runs a unit of work, sleeps `interval * (1 + jitter * rand)` after
//! each completion, and runs again. Intervals measure idle time between
//! completions, so a slow unit of work never overlaps itself and never
//! builds a backlog.
//!
//! ```text
//! Initial -> Running -> Sleeping -----------------> Running -> ...
//!               |                                      ^
//!               +-> RunningAndMarkedForRerun ----------+
//!
//! stop() from any state -> Stopped (terminal)
//! ```
//!
//! - `run()` while sleeping fires immediately
//! - `run()` while running schedules exactly one rerun, however often called
//! - an in-flight run finishes after `stop()` but never reschedules

mod slots;

pub use slots::JobSlots;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Lifecycle of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Spawned, first run not started yet
    Initial,
    Running,
    /// Waiting for the next interval
    Sleeping,
    /// A rerun was requested while running
    RunningAndMarkedForRerun,
    /// Terminal
    Stopped,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<JobState>,
    wake: Notify,
    interval: Duration,
    jitter: f64,
}

/// Handle to a running background job. Clones control the same job.
#[derive(Debug, Clone)]
pub struct BackgroundJob {
    shared: Arc<Shared>,
}

impl BackgroundJob {
    /// Spawn a job on the current tokio runtime; the first run starts
    /// right away.
    pub fn start<F, Fut>(interval: Duration, jitter: f64, work: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::start_guarded(interval, jitter, || true, work)
    }

    /// Like [`BackgroundJob::start`], but `alive` is checked before every
    /// run; once it returns `false` the job stops instead of running.
    pub fn start_guarded<G, F, Fut>(interval: Duration, jitter: f64, alive: G, work: F) -> Self
    where
        G: Fn() -> bool + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let jitter = if jitter.is_finite() { jitter.max(0.0) } else { 0.0 };
        let shared = Arc::new(Shared {
            state: Mutex::new(JobState::Initial),
            wake: Notify::new(),
            interval,
            jitter,
        });
        tokio::spawn(drive(Arc::clone(&shared), alive, work));
        Self { shared }
    }

    /// Request a run as soon as possible.
    pub fn run(&self) {
        let mut state = self.shared.state.lock();
        match *state {
            JobState::Sleeping => {
                *state = JobState::Running;
                drop(state);
                self.shared.wake.notify_one();
            }
            JobState::Running => *state = JobState::RunningAndMarkedForRerun,
            // Initial: first run is already pending
            JobState::Initial | JobState::RunningAndMarkedForRerun | JobState::Stopped => {}
        }
    }

    /// Stop the job for good.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn state(&self) -> JobState {
        *self.shared.state.lock()
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == JobState::Stopped
    }

    /// Whether both handles control the same job.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Shared {
    fn stop(&self) {
        *self.state.lock() = JobState::Stopped;
        self.wake.notify_one();
    }

    fn next_delay(&self) -> Duration {
        next_delay(self.interval, self.jitter, unit_random())
    }

    /// Sleep until the deadline or an explicit `run()`.
    ///
    /// Returns `false` if the job was stopped meanwhile.
    async fn sleep(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                _ = self.wake.notified() => {
                    // Stale permits from earlier wakeups leave the state untouched
                    if *self.state.lock() != JobState::Sleeping {
                        break;
                    }
                }
            }
        }

        let mut state = self.state.lock();
        if *state == JobState::Stopped {
            return false;
        }
        *state = JobState::Running;
        true
    }
}

async fn drive<G, F, Fut>(shared: Arc<Shared>, alive: G, mut work: F)
where
    G: Fn() -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    {
        let mut state = shared.state.lock();
        if *state == JobState::Stopped {
            return;
        }
        *state = JobState::Running;
    }

    loop {
        if !alive() {
            crate::debug!("job"; "owner gone, stopping");
            shared.stop();
            return;
        }

        work().await;

        let delay = {
            let mut state = shared.state.lock();
            match *state {
                JobState::RunningAndMarkedForRerun => {
                    *state = JobState::Running;
                    continue;
                }
                JobState::Stopped => return,
                _ => {
                    *state = JobState::Sleeping;
                    shared.next_delay()
                }
            }
        };

        if !shared.sleep(delay).await {
            return;
        }
    }
}

/// `interval * (1 + jitter * sample)`, or plain `interval` when that
/// does not fit in a `Duration`.
fn next_delay(interval: Duration, jitter: f64, sample: f64) -> Duration {
    Duration::try_from_secs_f64(interval.as_secs_f64() * (1.0 + jitter * sample))
        .unwrap_or(interval)
}

/// Uniform sample in `[0, 1)` from OS randomness; `0` if unavailable.
fn unit_random() -> f64 {
    getrandom::u64()
        .map(|bits| (bits >> 11) as f64 / (1u64 << 53) as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_next_delay() {
        let interval = Duration::from_secs(4);
        assert_eq!(next_delay(interval, 0.25, 0.0), interval);
        assert_eq!(next_delay(interval, 0.25, 0.5), Duration::from_millis(4500));
        assert_eq!(next_delay(interval, 1e300, 0.9), interval);
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    /// Job whose unit of work counts itself and takes `busy` to finish.
    fn counting_job(count: &Arc<AtomicUsize>, interval: Duration, busy: Duration) -> BackgroundJob {
        let count = Arc::clone(count);
        BackgroundJob::start(interval, 0.0, move || {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(busy).await;
            }
        })
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let count = counter();
        let job = counting_job(&count, Duration::from_secs(1), Duration::ZERO);

        advance(10).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(job.state(), JobState::Sleeping);

        advance(1_000).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        advance(1_000).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        job.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_requests_coalesce() {
        let count = counter();
        let job = counting_job(&count, Duration::from_secs(10), Duration::from_millis(100));

        advance(10).await;
        assert_eq!(job.state(), JobState::Running);
        job.run();
        job.run();
        job.run();
        assert_eq!(job.state(), JobState::RunningAndMarkedForRerun);

        advance(150).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        advance(5_000).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(job.state(), JobState::Sleeping);
        job.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_while_sleeping_fires_now() {
        let count = counter();
        let job = counting_job(&count, Duration::from_secs(60), Duration::ZERO);

        advance(10).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        job.run();
        advance(10).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // Back to the regular cadence afterwards
        advance(30_000).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        job.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_terminal() {
        let count = counter();
        let job = counting_job(&count, Duration::from_millis(100), Duration::ZERO);

        advance(10).await;
        job.stop();
        job.run();
        advance(1_000).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(job.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_run_prevents_reschedule() {
        let count = counter();
        let job = counting_job(&count, Duration::from_millis(100), Duration::from_millis(50));

        advance(10).await;
        job.run();
        job.stop();
        advance(1_000).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(job.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_stops_job() {
        let count = counter();
        let alive = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let job = {
            let count = Arc::clone(&count);
            let alive = Arc::clone(&alive);
            BackgroundJob::start_guarded(
                Duration::from_millis(100),
                0.0,
                move || alive.load(Ordering::SeqCst),
                move || {
                    let count = Arc::clone(&count);
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                    }
                },
            )
        };

        advance(10).await;
        alive.store(false, Ordering::SeqCst);
        advance(500).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(job.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_bounds() {
        let job = BackgroundJob::start(Duration::from_secs(2), 0.5, || async {});
        for _ in 0..32 {
            let delay = job.shared.next_delay();
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(3));
        }
        job.stop();
    }

    #[test]
    fn test_unit_random_range() {
        for _ in 0..64 {
            let sample = unit_random();
            assert!((0.0..1.0).contains(&sample));
        }
    }
}
