//! Expiry Scheduler
//!
//! Long-lived background thread that polls the expiry index and fires an
//! alert for every task that has entered the alert window.
//!
//! Delivery is at-most-once and best-effort: a task is removed from the index
//! once its notifier call returns, whether that call succeeded, failed or
//! panicked.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::alerts::{
    Clock, ExpiryIndex, ScheduledTask, SystemClock, DEFAULT_ALERT_THRESHOLD_SECS,
    DEFAULT_POLL_INTERVAL_MS,
};
use crate::config::Config;
use crate::scheduling::{Notifier, SchedulerStats};

const THREAD_NAME: &str = "expiry-scheduler";

// == Expiry Scheduler ==
/// Polling loop over an [`ExpiryIndex`].
///
/// Built with its collaborators, then either driven by hand through
/// [`ExpiryScheduler::run_pending`] or moved onto its own thread with
/// [`ExpiryScheduler::start`].
pub struct ExpiryScheduler {
    index: Arc<ExpiryIndex>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    /// Window before expiry in which a task fires
    alert_threshold: chrono::Duration,
    /// Sleep between polls when nothing is due
    poll_interval: Duration,
    stopped: Arc<AtomicBool>,
    stats: Arc<SchedulerStats>,
}

impl ExpiryScheduler {
    // == Constructor ==
    /// Creates a scheduler on the system clock with the default 15 minute
    /// alert window and 100 ms poll interval.
    pub fn new(index: Arc<ExpiryIndex>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            index,
            notifier,
            clock: Arc::new(SystemClock),
            alert_threshold: chrono::Duration::seconds(DEFAULT_ALERT_THRESHOLD_SECS as i64),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stopped: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(SchedulerStats::new()),
        }
    }

    /// Creates a scheduler using the timing parameters from `config`.
    pub fn from_config(
        index: Arc<ExpiryIndex>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self::new(index, notifier)
            .with_alert_threshold(config.alert_threshold())
            .with_poll_interval(config.poll_interval())
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the alert window.
    pub fn with_alert_threshold(mut self, threshold: chrono::Duration) -> Self {
        self.alert_threshold = threshold;
        self
    }

    /// Replaces the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Shares an existing stats instance instead of a private one.
    pub fn with_stats(mut self, stats: Arc<SchedulerStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Returns the delivery counters updated by this scheduler.
    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    // == Run Pending ==
    /// Fires every task that is currently due, earliest first.
    ///
    /// Returns the number of tasks fired.
    pub fn run_pending(&self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        fired
    }

    /// Fires the earliest task if it is due. Returns false when nothing was
    /// due, which is the loop's cue to sleep.
    fn fire_next(&self) -> bool {
        let Some(task) = self.index.peek_earliest() else {
            return false;
        };

        let now = self.clock.now();
        if !task.is_due(now, self.alert_threshold) {
            return false;
        }

        self.deliver(&task, now);
        self.index.mark_done(task.id);
        self.stats.record_fired();
        true
    }

    fn deliver(&self, task: &ScheduledTask, now: DateTime<Utc>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.notifier.notify(task, now)));

        match outcome {
            Ok(Ok(())) => {
                debug!(task_id = task.id, "Expiry alert delivered");
            }
            Ok(Err(err)) => {
                self.stats.record_failure();
                error!(task_id = task.id, "Expiry alert failed: {:#}", err);
            }
            Err(payload) => {
                self.stats.record_failure();
                error!(
                    task_id = task.id,
                    "Expiry alert panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    fn run(&self) {
        info!(
            "Starting expiry scheduler with alert window of {}s and poll interval of {:?}",
            self.alert_threshold.num_seconds(),
            self.poll_interval
        );

        while !self.stopped.load(Ordering::Acquire) {
            if !self.fire_next() {
                thread::sleep(self.poll_interval);
            }
        }

        info!("Expiry scheduler stopped");
    }

    // == Start ==
    /// Moves the scheduler onto a dedicated thread.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be spawned.
    pub fn start(self) -> std::io::Result<SchedulerHandle> {
        let stopped = Arc::clone(&self.stopped);
        let stats = Arc::clone(&self.stats);

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())?;

        Ok(SchedulerHandle {
            stopped,
            stats,
            thread,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

// == Scheduler Handle ==
/// Handle to a running scheduler thread.
///
/// Dropping the handle does not stop the thread; call [`SchedulerHandle::stop`].
#[derive(Debug)]
pub struct SchedulerHandle {
    stopped: Arc<AtomicBool>,
    stats: Arc<SchedulerStats>,
    thread: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Asks the loop to exit and returns immediately.
    ///
    /// The thread notices within one poll interval, or after the notifier
    /// call in progress returns.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Returns true once the scheduler thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Waits for the scheduler thread to exit.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::ManualClock;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<ScheduledTask>>,
    }

    impl RecordingNotifier {
        fn ids(&self) -> Vec<i64> {
            self.seen.lock().unwrap().iter().map(|task| task.id).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, task: &ScheduledTask, _now: DateTime<Utc>) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(task.clone());
            Ok(())
        }
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn scheduler_at(
        index: &Arc<ExpiryIndex>,
        notifier: Arc<dyn Notifier>,
        clock: &Arc<ManualClock>,
    ) -> ExpiryScheduler {
        ExpiryScheduler::new(Arc::clone(index), notifier)
            .with_clock(clock.clone())
            .with_poll_interval(Duration::from_millis(10))
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_run_pending_fires_only_due_tasks() {
        let index = Arc::new(ExpiryIndex::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(start_time()));
        let scheduler = scheduler_at(&index, notifier.clone(), &clock);

        index.add_or_replace(1, "t1", Some(start_time() + ChronoDuration::minutes(10)));
        index.add_or_replace(2, "t2", Some(start_time() + ChronoDuration::minutes(20)));

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(notifier.ids(), vec![1]);
        assert!(!index.contains(1));
        assert!(index.contains(2));

        clock.advance(ChronoDuration::minutes(6));
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(notifier.ids(), vec![1, 2]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_run_pending_drains_in_order() {
        let index = Arc::new(ExpiryIndex::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(start_time()));
        let scheduler = scheduler_at(&index, notifier.clone(), &clock);

        index.add_or_replace(5, "b", Some(start_time()));
        index.add_or_replace(3, "a", Some(start_time()));
        index.add_or_replace(9, "old", Some(start_time() - ChronoDuration::hours(2)));

        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(notifier.ids(), vec![9, 3, 5]);
        assert_eq!(scheduler.stats().fired(), 3);
    }

    #[test]
    fn test_failed_notification_still_removes_task() {
        let index = Arc::new(ExpiryIndex::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&delivered);
        let notifier = move |task: &ScheduledTask, _now: DateTime<Utc>| -> anyhow::Result<()> {
            anyhow::ensure!(task.id != 1, "mail server unavailable");
            sink.lock().unwrap().push(task.id);
            Ok(())
        };
        let scheduler = scheduler_at(&index, Arc::new(notifier), &clock);

        index.add_or_replace(1, "fails", Some(start_time()));
        index.add_or_replace(2, "works", Some(start_time() + ChronoDuration::minutes(1)));

        assert_eq!(scheduler.run_pending(), 2);
        assert!(index.is_empty());
        assert_eq!(*delivered.lock().unwrap(), vec![2]);
        assert_eq!(scheduler.stats().notify_failures(), 1);
    }

    #[test]
    fn test_panicking_notification_is_contained() {
        let index = Arc::new(ExpiryIndex::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let notifier = |task: &ScheduledTask, _now: DateTime<Utc>| -> anyhow::Result<()> {
            if task.id == 1 {
                panic!("notifier bug");
            }
            Ok(())
        };
        let scheduler = scheduler_at(&index, Arc::new(notifier), &clock);

        index.add_or_replace(1, "panics", Some(start_time()));
        index.add_or_replace(2, "fine", Some(start_time()));

        assert_eq!(scheduler.run_pending(), 2);
        assert!(index.is_empty());
        assert_eq!(scheduler.stats().fired(), 2);
        assert_eq!(scheduler.stats().notify_failures(), 1);
    }

    #[test]
    fn test_background_thread_fires_and_stops() {
        let index = Arc::new(ExpiryIndex::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(start_time()));
        let handle = scheduler_at(&index, notifier.clone(), &clock)
            .start()
            .unwrap();

        index.add_or_replace(1, "t1", Some(start_time() + ChronoDuration::minutes(10)));
        index.add_or_replace(2, "t2", Some(start_time() + ChronoDuration::minutes(20)));

        assert!(wait_until(|| !index.contains(1)));
        assert_eq!(notifier.ids(), vec![1]);
        assert!(index.contains(2));

        clock.advance(ChronoDuration::minutes(6));
        assert!(wait_until(|| index.is_empty()));
        assert_eq!(notifier.ids(), vec![1, 2]);

        handle.stop();
        assert!(wait_until(|| handle.is_finished()));
        handle.join().unwrap();
    }

    #[test]
    fn test_stop_before_any_work() {
        let index = Arc::new(ExpiryIndex::new());
        let handle = ExpiryScheduler::new(index, Arc::new(RecordingNotifier::default()))
            .with_poll_interval(Duration::from_millis(10))
            .start()
            .unwrap();

        handle.stop();
        assert!(handle.join().is_ok());
    }
}
