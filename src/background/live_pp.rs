use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use crate::{
    osu::{
        attributes::{OsuDifficultyAttributes, OsuPerformanceAttributes},
        performance::OsuScoreState,
    },
    play::tally::Tally,
    GameMods, Performance,
};

use super::star_cache::StarCache;

/// Everything needed to compute the performance of a play in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct PpSnapshot {
    /// Index of the object that was active when the snapshot was taken.
    pub object: usize,
    pub attrs: OsuDifficultyAttributes,
    pub mods: GameMods,
    pub state: OsuScoreState,
}

impl PpSnapshot {
    /// Capture the tally of a play against the star cache of its map.
    pub fn new(object: usize, cache: &StarCache, mods: GameMods, tally: &Tally) -> Option<Self> {
        let attrs = cache.at(tally.n_objects() as usize)?.clone();

        Some(Self {
            object,
            attrs,
            mods,
            state: score_state(tally),
        })
    }
}

/// Performance of a play up to some object.
#[derive(Clone, Debug, PartialEq)]
pub struct LivePp {
    pub object: usize,
    pub attrs: OsuPerformanceAttributes,
}

impl LivePp {
    pub const fn pp(&self) -> f64 {
        self.attrs.pp
    }
}

/// Recomputes performance on a worker thread whenever the active object
/// advances.
///
/// Snapshots that queue up while the worker is busy are coalesced so only
/// the newest one is computed.
#[derive(Debug)]
pub struct LivePpWorker {
    tasks: Option<Sender<PpSnapshot>>,
    results: Receiver<LivePp>,
    last_object: Option<usize>,
    latest: Option<LivePp>,
    handle: Option<JoinHandle<()>>,
}

impl Default for LivePpWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl LivePpWorker {
    pub fn new() -> Self {
        let (task_tx, task_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();

        let handle = thread::spawn(move || work(&task_rx, &result_tx));

        Self {
            tasks: Some(task_tx),
            results: result_rx,
            last_object: None,
            latest: None,
            handle: Some(handle),
        }
    }

    /// Queue a snapshot. Ignored unless its object differs from the last
    /// submitted one.
    pub fn submit(&mut self, snapshot: PpSnapshot) -> bool {
        if self.last_object == Some(snapshot.object) {
            return false;
        }

        let Some(tasks) = self.tasks.as_ref() else {
            return false;
        };

        self.last_object = Some(snapshot.object);

        tasks.send(snapshot).is_ok()
    }

    /// Newest result so far. Never blocks.
    pub fn poll(&mut self) -> Option<&LivePp> {
        while let Ok(result) = self.results.try_recv() {
            self.latest = Some(result);
        }

        self.latest.as_ref()
    }

    /// Forget the previous play, e.g. after a restart or seek.
    pub fn reset(&mut self) {
        self.last_object = None;
        self.latest = None;

        while self.results.try_recv().is_ok() {}
    }
}

impl Drop for LivePpWorker {
    fn drop(&mut self) {
        // closing the queue ends the worker loop
        self.tasks.take();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("live pp worker panicked");
            }
        }
    }
}

fn work(tasks: &Receiver<PpSnapshot>, results: &Sender<LivePp>) {
    while let Ok(mut snapshot) = tasks.recv() {
        while let Ok(newer) = tasks.try_recv() {
            snapshot = newer;
        }

        let PpSnapshot {
            object,
            attrs,
            mods,
            state,
        } = snapshot;

        let attrs = Performance::new(attrs).mods(mods).state(state).calculate();

        tracing::trace!(object, pp = attrs.pp, "live pp");

        if results.send(LivePp { object, attrs }).is_err() {
            break;
        }
    }
}

pub(crate) const fn score_state(tally: &Tally) -> OsuScoreState {
    OsuScoreState {
        max_combo: tally.max_combo,
        n300: tally.n300,
        n100: tally.n100,
        n50: tally.n50,
        misses: tally.misses,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::{
        model::{
            beatmap::Beatmap,
            control_point::TimingPoint,
            hit_object::{HitObject, HitObjectKind, Pos},
        },
        osu::difficulty::gradual,
        Difficulty,
    };

    use super::*;

    fn cache() -> StarCache {
        let map = Beatmap {
            timing_points: vec![TimingPoint::new(0.0, 400.0)],
            hit_objects: (0..20)
                .map(|i| HitObject {
                    pos: Pos::new(100.0 + 15.0 * i as f32, if i % 2 == 0 { 80.0 } else { 300.0 }),
                    start_time: 1000.0 + 200.0 * f64::from(i),
                    new_combo: false,
                    kind: HitObjectKind::Circle,
                })
                .collect(),
            ..Default::default()
        };

        let mut cache = StarCache::default();

        gradual(&Difficulty::new(), &map, |_, attrs| {
            cache.aim.push(attrs.aim);
            cache.speed.push(attrs.speed);
            cache.stars.push(attrs.stars);
            cache.attributes.push(attrs.clone());
        })
        .unwrap();

        cache
    }

    fn wait(worker: &mut LivePpWorker, object: usize) -> LivePp {
        let start = Instant::now();

        loop {
            if let Some(result) = worker.poll().filter(|result| result.object == object) {
                return result.clone();
            }

            assert!(start.elapsed() < Duration::from_secs(10), "live pp timed out");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn computes_on_advance() {
        let cache = cache();
        let mut worker = LivePpWorker::new();

        let tally = Tally {
            n300: 10,
            combo: 10,
            max_combo: 10,
            ..Default::default()
        };

        let snapshot = PpSnapshot::new(9, &cache, GameMods::default(), &tally).unwrap();
        let expected = Performance::new(snapshot.attrs.clone()).state(snapshot.state).calculate();

        assert!(worker.submit(snapshot.clone()));
        assert!(!worker.submit(snapshot));

        let result = wait(&mut worker, 9);
        assert!(result.pp() > 0.0);
        assert!((result.pp() - expected.pp).abs() < 1e-9);

        worker.reset();
        assert!(worker.poll().is_none());
    }

    #[test]
    fn empty_tally_has_no_snapshot() {
        assert!(PpSnapshot::new(0, &cache(), GameMods::default(), &Tally::default()).is_none());
    }
}
