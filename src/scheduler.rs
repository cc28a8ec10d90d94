use crate::logger::Logger;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

/// Polling granularity of the scheduler loop.
pub const TICK: Duration = Duration::from_millis(300);

/// What a job does when due. A tagged value rather than a closure, so the
/// scheduler's state is inspectable and can be rebuilt after a restart.
/// Window-mutating actions are marshaled to the foreground command queue by the
/// [`ActionRunner`]; the tick task never touches the window system itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobAction {
    /// Bring the window at this display position to the foreground.
    FocusWindow { window_index: usize },
    /// Focus the window, then stage the message on the clipboard for manual
    /// paste. No automated sending.
    StageMessage { window_index: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub interval_secs: u64,
    pub action: JobAction,
    pub enabled: bool,
}

/// Executes a due job's action. The production runner forwards an
/// [`crate::AppCommand`] to the foreground loop.
pub trait ActionRunner: Send + Sync + 'static {
    fn run(&self, job: &Job) -> Result<()>;
}

/// In-process job scheduler: one background task polls every [`TICK`] while
/// running. Cheap-clone handle; `add_or_update`/`remove`/`list_jobs` may be
/// called from any thread.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    jobs: Mutex<HashMap<String, Job>>,
    runner: Arc<dyn ActionRunner>,
    logger: Logger,
    /// Stop signal for the active loop; `None` while stopped.
    stop: Mutex<Option<watch::Sender<bool>>>,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn ActionRunner>, logger: Logger) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(HashMap::new()),
                runner,
                logger,
                stop: Mutex::new(None),
            }),
        }
    }

    /// Spawn the polling loop. No-op when already running.
    pub fn start(&self) {
        let mut stop = self.inner.stop.lock().unwrap();
        if stop.is_some() {
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *stop = Some(stop_tx);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut ticker = interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_run: HashMap<String, Instant> = HashMap::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        inner.run_due(&mut last_run);
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        self.inner.logger.info("Scheduler started.");
    }

    /// Signal the loop to exit. Does not interrupt an in-flight action. No-op
    /// when already stopped.
    pub fn stop(&self) {
        let mut stop = self.inner.stop.lock().unwrap();
        if let Some(tx) = stop.take() {
            let _ = tx.send(true);
            self.inner.logger.info("Scheduler stopped.");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.stop.lock().unwrap().is_some()
    }

    /// Upsert by id. Takes effect on the next tick at the latest.
    pub fn add_or_update(&self, job: Job) {
        self.inner.jobs.lock().unwrap().insert(job.id.clone(), job);
    }

    /// No-op if absent.
    pub fn remove(&self, id: &str) {
        self.inner.jobs.lock().unwrap().remove(id);
    }

    /// Point-in-time copy; mutating it has no effect on the scheduler.
    pub fn list_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.inner.jobs.lock().unwrap().values().cloned().collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        jobs
    }
}

impl Inner {
    /// One tick: snapshot the job set, run what is due. The snapshot (not a
    /// live reference) keeps concurrent add/remove race-free while actions run.
    fn run_due(&self, last_run: &mut HashMap<String, Instant>) {
        let now = Instant::now();
        let jobs: Vec<Job> = self.jobs.lock().unwrap().values().cloned().collect();

        for job in jobs {
            if !job.enabled {
                continue;
            }
            let due = match last_run.get(&job.id) {
                Some(prev) => now.duration_since(*prev) >= Duration::from_secs(job.interval_secs),
                None => true,
            };
            if !due {
                continue;
            }

            if let Err(e) = self.runner.run(&job) {
                self.logger.error(&format!("[Scheduler] job {} error: {}", job.id, e));
            }
            // Updated whether the action succeeded or failed: a failing job
            // waits a full interval instead of retry-storming every tick.
            last_run.insert(job.id.clone(), now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct CountingRunner {
        runs: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl CountingRunner {
        fn count(&self, id: &str) -> usize {
            self.runs.lock().unwrap().iter().filter(|r| *r == id).count()
        }
    }

    impl ActionRunner for CountingRunner {
        fn run(&self, job: &Job) -> Result<()> {
            self.runs.lock().unwrap().push(job.id.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("action failed"));
            }
            Ok(())
        }
    }

    fn job(id: &str, interval_secs: u64) -> Job {
        Job {
            id: id.to_string(),
            interval_secs,
            action: JobAction::FocusWindow { window_index: 1 },
            enabled: true,
        }
    }

    fn scheduler() -> (Scheduler, Arc<CountingRunner>) {
        let runner = Arc::new(CountingRunner::default());
        (
            Scheduler::new(runner.clone(), Logger::facade()),
            runner,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_interval_boundary() {
        let (sched, runner) = scheduler();
        sched.add_or_update(job("j1", 5));
        sched.start();

        // Ticks land at 0ms, 300ms, 600ms, ... The job fires on the first
        // tick, then again on the first tick past each 5s boundary: 5.1s,
        // 10.2s, 15.3s.
        tokio::time::sleep(Duration::from_secs(16)).await;

        assert_eq!(runner.count("j1"), 4);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn never_fires_twice_within_a_boundary() {
        let (sched, runner) = scheduler();
        sched.add_or_update(job("j1", 5));
        sched.start();

        tokio::time::sleep(Duration::from_millis(4900)).await;
        // Many ticks have passed, but only the first was due.
        assert_eq!(runner.count("j1"), 1);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_action_is_reattempted_next_boundary() {
        let (sched, runner) = scheduler();
        runner.fail.store(true, Ordering::SeqCst);
        sched.add_or_update(job("bad", 5));
        sched.start();

        // Attempts at 0s, 5.1s, 10.2s; the failure neither disables the job
        // nor stops the loop.
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(runner.count("bad"), 3);

        // Other jobs are unaffected.
        runner.fail.store(false, Ordering::SeqCst);
        sched.add_or_update(job("good", 1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(runner.count("good") >= 1);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_jobs_are_skipped() {
        let (sched, runner) = scheduler();
        let mut j = job("j1", 1);
        j.enabled = false;
        sched.add_or_update(j.clone());
        sched.start();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(runner.count("j1"), 0);

        // Enabling via upsert takes effect on the next tick.
        j.enabled = true;
        sched.add_or_update(j);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(runner.count("j1") >= 1);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn add_or_update_replaces_by_id() {
        let (sched, _runner) = scheduler();
        sched.add_or_update(job("j1", 5));
        let mut replacement = job("j1", 60);
        replacement.action = JobAction::StageMessage {
            window_index: 2,
            message: "hi".to_string(),
        };
        sched.add_or_update(replacement.clone());

        assert_eq!(sched.list_jobs(), vec![replacement]);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_is_noop_when_absent() {
        let (sched, runner) = scheduler();
        sched.remove("ghost");
        sched.add_or_update(job("j1", 1));
        sched.start();
        tokio::time::sleep(Duration::from_millis(400)).await;
        sched.remove("j1");
        let after_remove = runner.count("j1");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(runner.count("j1"), after_remove);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn list_jobs_is_a_copy() {
        let (sched, _runner) = scheduler();
        sched.add_or_update(job("j1", 5));

        let mut copy = sched.list_jobs();
        copy.clear();
        assert_eq!(sched.list_jobs().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let (sched, runner) = scheduler();
        sched.add_or_update(job("j1", 5));
        sched.start();
        sched.start();
        assert!(sched.is_running());

        // A second loop would double-fire on the first tick.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(runner.count("j1"), 1);

        sched.stop();
        sched.stop();
        assert!(!sched.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_ticks() {
        let (sched, runner) = scheduler();
        sched.add_or_update(job("j1", 1));
        sched.start();
        tokio::time::sleep(Duration::from_millis(400)).await;
        sched.stop();

        let at_stop = runner.count("j1");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runner.count("j1"), at_stop);
    }

    #[test]
    fn job_actions_serialize_as_tagged_commands() {
        let action = JobAction::StageMessage {
            window_index: 2,
            message: "standup in 5".to_string(),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"kind\":\"stage_message\""));
        assert_eq!(serde_json::from_str::<JobAction>(&json).unwrap(), action);
    }
}
