use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use crate::{
    any::CancelFlag, osu::attributes::OsuDifficultyAttributes, osu::difficulty::gradual, Beatmap,
    Difficulty,
};

/// Star ratings for every prefix of a map.
///
/// Entry `i` holds the values after `i + 1` processed objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StarCache {
    pub aim: Vec<f64>,
    pub speed: Vec<f64>,
    pub stars: Vec<f64>,
    pub attributes: Vec<OsuDifficultyAttributes>,
}

impl StarCache {
    /// Attributes after `n` processed objects, clamped to the cached range.
    pub fn at(&self, n: usize) -> Option<&OsuDifficultyAttributes> {
        let idx = n.min(self.attributes.len()).checked_sub(1)?;

        self.attributes.get(idx)
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    fn push(&mut self, attrs: &OsuDifficultyAttributes) {
        self.aim.push(attrs.aim);
        self.speed.push(attrs.speed);
        self.stars.push(attrs.stars);
        self.attributes.push(attrs.clone());
    }
}

/// Stage of a [`StarCacheLoader`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadStage {
    Idle,
    Loading,
    Ready,
    Killed,
}

#[derive(Debug)]
struct LoaderState {
    stage: LoadStage,
    done: usize,
    total: usize,
    result: Option<StarCache>,
}

impl LoaderState {
    const fn new(stage: LoadStage, total: usize) -> Self {
        Self {
            stage,
            done: 0,
            total,
            result: None,
        }
    }
}

/// Computes a [`StarCache`] on a worker thread.
///
/// A killed or revived load never hands out the arrays of the previous run.
#[derive(Debug)]
pub struct StarCacheLoader {
    state: Arc<Mutex<LoaderState>>,
    cancel: CancelFlag,
    handle: Option<JoinHandle<()>>,
}

impl Default for StarCacheLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl StarCacheLoader {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LoaderState::new(LoadStage::Idle, 0))),
            cancel: CancelFlag::new(),
            handle: None,
        }
    }

    /// Start loading `map`, cancelling any load that is still running.
    pub fn revive(&mut self, map: Arc<Beatmap>, difficulty: Difficulty) {
        self.kill();

        let total = map.hit_objects.len().min(difficulty.get_passed_objects());

        let cancel = CancelFlag::new();
        let state = Arc::new(Mutex::new(LoaderState::new(LoadStage::Loading, total)));

        let worker_state = Arc::clone(&state);
        let difficulty = difficulty.cancel_flag(cancel.clone());

        let handle = thread::spawn(move || load(&map, &difficulty, &worker_state));

        tracing::debug!(total, "star cache load started");

        self.state = state;
        self.cancel = cancel;
        self.handle = Some(handle);
    }

    /// Cancel the current load and wait for the worker to stop.
    pub fn kill(&mut self) {
        self.cancel.cancel();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("star cache worker panicked");
            }
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.stage == LoadStage::Loading || state.stage == LoadStage::Ready {
            tracing::debug!(done = state.done, "star cache killed");
            state.stage = LoadStage::Killed;
        }

        state.result = None;
    }

    pub fn stage(&self) -> LoadStage {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).stage
    }

    /// Progress of the current load in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match state.stage {
            LoadStage::Ready => 1.0,
            _ if state.total == 0 => 0.0,
            _ => state.done as f64 / state.total as f64,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.stage() == LoadStage::Ready
    }

    /// Take the finished cache, if any.
    pub fn try_take(&self) -> Option<StarCache> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .result
            .take()
    }
}

impl Drop for StarCacheLoader {
    fn drop(&mut self) {
        self.kill();
    }
}

fn load(map: &Beatmap, difficulty: &Difficulty, state: &Mutex<LoaderState>) {
    let mut cache = StarCache::default();

    let res = gradual(difficulty, map, |n, attrs| {
        cache.push(attrs);
        state.lock().unwrap_or_else(PoisonError::into_inner).done = n;
    });

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);

    match res {
        Ok(()) => {
            tracing::debug!(len = cache.len(), "star cache ready");
            state.stage = LoadStage::Ready;
            state.result = Some(cache);
        }
        Err(_) => {
            tracing::debug!(done = state.done, "star cache load cancelled");
            state.stage = LoadStage::Killed;
        }
    }
}
