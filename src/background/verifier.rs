use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    play::{
        config::PlayConfig,
        error::LoadError,
        replay::ReplayInput,
        timeline::Timeline,
        verify::{compare, RecordedStats, Verification},
    },
    Beatmap, Difficulty, GameMods, Performance,
};

use super::live_pp::score_state;

/// Map time simulated between two checks of the pause and dead flags.
const CHUNK_MS: f64 = 10_000.0;

const PAUSE_POLL: Duration = Duration::from_millis(5);
const QUEUE_POLL: Duration = Duration::from_millis(20);

/// A recorded score waiting for verification.
#[derive(Clone, Debug)]
pub struct ScoreJob {
    pub id: u64,
    pub map: Arc<Beatmap>,
    pub mods: GameMods,
    pub config: PlayConfig,
    pub replay: ReplayInput,
    pub recorded: RecordedStats,
}

/// Result of a [`ScoreJob`].
#[derive(Debug)]
pub struct ScoreReport {
    pub id: u64,
    pub verification: Result<Verification, LoadError>,
    /// Performance of the simulated play.
    pub pp: Option<f64>,
}

#[derive(Debug, Default)]
struct Flags {
    paused: AtomicBool,
    dead: AtomicBool,
}

impl Flags {
    fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    /// Block while paused. Returns `false` if the worker should stop.
    fn wait_while_paused(&self) -> bool {
        while self.paused.load(Ordering::Acquire) {
            if self.is_dead() {
                return false;
            }

            thread::sleep(PAUSE_POLL);
        }

        !self.is_dead()
    }
}

/// Re-simulates recorded scores one after another on a dedicated thread.
///
/// The worker checks its pause and dead flags between scores and between
/// chunks of a simulation. Cancelling joins the thread.
#[derive(Debug)]
pub struct ScoreVerifier {
    jobs: Option<Sender<ScoreJob>>,
    reports: Receiver<ScoreReport>,
    flags: Arc<Flags>,
    handle: Option<JoinHandle<()>>,
}

impl Default for ScoreVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreVerifier {
    pub fn new() -> Self {
        let (job_tx, job_rx) = mpsc::channel();
        let (report_tx, report_rx) = mpsc::channel();
        let flags = Arc::new(Flags::default());

        let worker_flags = Arc::clone(&flags);
        let handle = thread::spawn(move || work(&job_rx, &report_tx, &worker_flags));

        Self {
            jobs: Some(job_tx),
            reports: report_rx,
            flags,
            handle: Some(handle),
        }
    }

    /// Queue a score. Returns `false` once the verifier has been cancelled.
    pub fn push(&self, job: ScoreJob) -> bool {
        self.jobs.as_ref().is_some_and(|jobs| jobs.send(job).is_ok())
    }

    pub fn pause(&self) {
        self.flags.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.flags.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::Acquire)
    }

    /// Next finished report without blocking.
    pub fn try_next(&self) -> Option<ScoreReport> {
        self.reports.try_recv().ok()
    }

    /// Next finished report, waiting at most `timeout`.
    pub fn wait(&self, timeout: Duration) -> Option<ScoreReport> {
        self.reports.recv_timeout(timeout).ok()
    }

    /// Stop the worker and wait for it. Queued scores are dropped.
    pub fn cancel(&mut self) {
        self.flags.dead.store(true, Ordering::Release);
        self.jobs.take();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("score verifier panicked");
            }
        }
    }
}

impl Drop for ScoreVerifier {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn work(jobs: &Receiver<ScoreJob>, reports: &Sender<ScoreReport>, flags: &Flags) {
    loop {
        if !flags.wait_while_paused() {
            break;
        }

        let job = match jobs.recv_timeout(QUEUE_POLL) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let id = job.id;

        let Some(report) = verify(job, flags) else {
            tracing::debug!(id, "score verification aborted");

            break;
        };

        if reports.send(report).is_err() {
            break;
        }
    }
}

/// `None` if the worker was cancelled midway.
fn verify(job: ScoreJob, flags: &Flags) -> Option<ScoreReport> {
    let ScoreJob {
        id,
        map,
        mods,
        config,
        replay,
        recorded,
    } = job;

    let mut timeline = match Timeline::new(&map, mods, config) {
        Ok(timeline) => timeline.with_input(replay),
        Err(err) => {
            tracing::warn!(id, error = %err, "score cannot be verified");

            return Some(ScoreReport {
                id,
                verification: Err(err),
                pp: None,
            });
        }
    };

    let end = timeline.end_time() + timeline.config().get_end_delay();

    while !timeline.is_finished() && timeline.time() < end {
        if !flags.wait_while_paused() {
            return None;
        }

        let next = timeline.time() + CHUNK_MS;
        timeline.simulate_to(next.min(end + 1.0));
    }

    timeline.simulate_to_end();

    let tally = timeline.tally().clone();
    let discrepancies = compare(&recorded, &tally);

    let pp = Difficulty::new()
        .mods(mods)
        .calculate(&map)
        .ok()
        .map(|attrs| {
            Performance::new(attrs)
                .mods(mods)
                .state(score_state(&tally))
                .calculate()
                .pp
        });

    tracing::debug!(id, mismatches = discrepancies.len(), ?pp, "score verified");

    Some(ScoreReport {
        id,
        verification: Ok(Verification {
            failed: timeline.is_failed(),
            tally,
            discrepancies,
        }),
        pp,
    })
}
