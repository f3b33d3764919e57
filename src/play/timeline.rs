use std::mem;

use crate::{
    model::{
        beatmap::{Beatmap, BreakPeriod},
        control_point::{timing_point_at, TimingPoint},
        hit_object::Pos,
    },
    osu::{
        convert::{check_scoring_times, convert_objects, indices_by_end_time},
        object::OsuObject,
    },
    GameMods,
};

use super::{
    config::PlayConfig,
    context::{Clock, FrameContext},
    drain::DrainRate,
    error::{LoadError, SessionError},
    events::{PlayEvent, SoundCue},
    health::Health,
    input::{Click, InputSource, Keys, NoInput, ReplayFrame},
    notelock::{Lanes, PassSummary},
    object::PlayObject,
    result::{HitResult, Judgement},
    rules::GameRules,
    scoring::Scoring,
    tally::Tally,
};

/// Step size of [`Timeline::simulate_to`] in milliseconds.
const SIMULATION_STEP: f64 = 1000.0 / 60.0;

/// Skipping lands this many milliseconds before the next object.
const SKIP_LEAD: f64 = 2500.0;

/// Once play has begun, a gap only counts from this long after the
/// previous object.
const LEGACY_GAP_OFFSET: f64 = 1000.0;

const WARNING_LAST_VISIBLE: f64 = 400.0;
const WARNING_BLINK: f64 = 100.0;
const WARNING_BLINKS: f64 = 13.0;

const SECTION_FADE_START: f64 = 1280.0;
const SECTION_FADE_END: f64 = 1480.0;
const SECTION_PASS_FLASHES: [(f64, f64); 3] = [(280.0, 1480.0), (160.0, 230.0), (20.0, 100.0)];
const SECTION_FAIL_FLASHES: [(f64, f64); 2] = [(280.0, 1480.0), (130.0, 230.0)];
const SECTION_PASS_SOUND: f64 = 20.0;
const SECTION_FAIL_SOUND: f64 = 130.0;

/// Health from which a section counts as passed.
const SECTION_PASS_HEALTH: f64 = 0.5;

/// Drain is reduced to this factor while a spinner is active.
const SPINNER_DRAIN_NERF: f64 = 0.25;

/// Snapshot of the timeline after its latest frame, e.g. for a HUD.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FrameState {
    /// Map time including every offset.
    pub time: f64,
    /// Index of the last object that ended or finished.
    pub current_index: usize,
    /// End time of the last object that has started.
    pub previous_end: f64,
    /// Start time of the first object that has not started yet.
    pub next_start: Option<f64>,
    pub in_break: bool,
    pub skippable: bool,
    pub warning_arrows: bool,
    /// Opacity of the section pass flash.
    pub section_pass: f64,
    /// Opacity of the section fail flash.
    pub section_fail: f64,
    pub spinner_active: bool,
    /// Objects starting within half a second around the current time.
    pub nps: u32,
    /// Objects currently visible.
    pub nd: u32,
}

/// Where a skip leads to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Skip {
    /// Seek the clock to this map time.
    To(f64),
    /// The map is over.
    End,
}

/// Drives the judgement of a play frame by frame.
///
/// The timeline owns the runtime state of every object, the click queue,
/// the tally, and the health bar. Input comes from an [`InputSource`] which
/// is the only difference between live play and recorded replays.
///
/// Live sessions call [`Timeline::start`] and then [`Timeline::update`] once
/// per frame with the audio clock. Replays are driven through
/// [`Timeline::simulate_to`] and [`Timeline::simulate_to_end`] instead.
#[derive(Clone, Debug)]
pub struct Timeline<I = NoInput> {
    map: PlayMap,
    session: Session,
    input: I,
}

/// Everything about the map that stays fixed for a session.
#[derive(Clone, Debug)]
struct PlayMap {
    objects: Vec<OsuObject>,
    end_of_combo: Vec<bool>,
    breaks: Vec<BreakPeriod>,
    timing_points: Vec<TimingPoint>,
    version: i32,
    mods: GameMods,
    rules: GameRules,
    config: PlayConfig,
    drain: DrainRate,
    first_start: f64,
    last_end: f64,
    total_offset: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Phase {
    Idle,
    /// Artificial lead-in before the clock starts playing.
    Waiting { until: f64 },
    Playing,
}

/// Tracks a clock that is not ready and the virtual time after its end.
#[derive(Clone, Debug, Default)]
struct ClockWatch {
    not_ready_updates: u32,
    not_ready_since: Option<f64>,
    /// Whether a reload has been attempted and whether it worked.
    reload: Option<bool>,
    finished_at: Option<f64>,
    finished: bool,
}

/// Runtime state that is recreated on restart.
#[derive(Clone, Debug)]
struct Session {
    states: Vec<PlayObject>,
    scoring: Scoring,
    clicks: Vec<Click>,
    cursor: Pos,
    keys: Keys,
    prev_key_was_key1: bool,
    frame: FrameState,
    phase: Phase,
    clock: ClockWatch,
    paused: bool,
    finished: bool,
    seek_frame: bool,
    last_section: Option<f64>,
}

impl Timeline<NoInput> {
    /// Prepare a session for `map`.
    ///
    /// Converts the objects for the given mods and calibrates the map's
    /// drain rate.
    pub fn new(map: &Beatmap, mods: impl Into<GameMods>, config: PlayConfig) -> Result<Self, LoadError> {
        map.check()?;

        let mods = mods.into();
        let attrs = map.attributes().mods(mods).build();
        let objects = convert_objects(map, &attrs, mods.reflection());
        check_scoring_times(&objects)?;

        let rules = GameRules::new(&attrs);

        let drain = DrainRate::calibrate(
            &objects,
            &map.breaks,
            map.version,
            &rules,
            config.calibration_iterations,
        )?;

        let end_of_combo = (0..objects.len())
            .map(|i| objects.get(i + 1).map_or(true, |next| next.new_combo))
            .collect();

        let first_start = objects.first().map_or(0.0, |h| h.start_time);

        let last_end = indices_by_end_time(&objects)
            .last()
            .map_or(first_start, |&i| objects[i].end_time);

        let total_offset = config.total_offset(rules.clock_rate, map.version);

        let map = PlayMap {
            objects,
            end_of_combo,
            breaks: map.breaks.clone(),
            timing_points: map.timing_points.clone(),
            version: map.version,
            mods,
            rules,
            config,
            drain,
            first_start,
            last_end,
            total_offset,
        };

        let session = Session::new(&map);

        Ok(Self {
            map,
            session,
            input: NoInput,
        })
    }
}

impl<I: InputSource> Timeline<I> {
    /// Replace the input source.
    pub fn with_input<J: InputSource>(self, input: J) -> Timeline<J> {
        Timeline {
            map: self.map,
            session: self.session,
            input,
        }
    }

    pub const fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Begin a live session.
    ///
    /// If the first object comes too early, the clock only starts playing
    /// after an artificial lead-in.
    pub fn start<C: Clock + ?Sized>(&mut self, clock: &mut C) {
        if self.session.phase != Phase::Idle {
            return;
        }

        let lead_in = self.map.first_start < self.map.config.early_note_time;

        if lead_in {
            self.session.phase = Phase::Waiting {
                until: clock.real_time() + self.map.config.early_note_time,
            };
        } else {
            clock.play();
            self.session.phase = Phase::Playing;
        }

        tracing::debug!(lead_in, objects = self.map.objects.len(), "session started");
    }

    /// Throw away all progress. The session has to be started again.
    pub fn restart(&mut self) {
        tracing::debug!(time = self.session.frame.time, "restart");

        self.session = Session::new(&self.map);
        self.input.seek(f64::NEG_INFINITY);
    }

    /// Jump to `time`.
    ///
    /// Objects before `time` count as finished without any judgement and the
    /// tally and health start over. Seeking a failed play does nothing.
    pub fn seek(&mut self, time: f64) {
        if self.session.scoring.health.is_failed() {
            return;
        }

        tracing::debug!(time, "seek");

        let input_state = self.input.seek(time);
        self.session.reset_to(&self.map, time, input_state);
    }

    /// Freeze spinners and drain. Pending clicks are dropped.
    pub fn pause(&mut self) {
        self.session.paused = true;
        self.session.clicks.clear();
    }

    pub fn resume(&mut self) {
        self.session.paused = false;
        self.session.clicks.clear();
    }

    /// Advance the live session to the clock's current position.
    pub fn update<C: Clock + ?Sized>(&mut self, clock: &mut C) -> Result<(), SessionError> {
        let Some(raw) = self.session.music_time(&self.map, clock)? else {
            return Ok(());
        };

        self.advance(raw + self.map.total_offset);

        Ok(())
    }

    /// Advance to map time `time` without a clock, stepping at every input
    /// frame and at least sixty times per second.
    pub fn simulate_to(&mut self, time: f64) {
        while self.session.frame.time < time && !self.session.finished {
            let step = (self.session.frame.time + SIMULATION_STEP).min(time);
            self.advance(step);
        }
    }

    /// Simulate until the session is over.
    pub fn simulate_to_end(&mut self) {
        let end = self.map.last_end + self.map.config.end_delay + 1.0;
        self.simulate_to(end);

        let now = self.session.frame.time;
        self.session.finish(now);
    }

    /// Skip the current empty section if possible.
    pub fn skip(&mut self) -> Option<Skip> {
        let session = &mut self.session;

        if !session.frame.skippable {
            return None;
        }

        session.frame.skippable = false;
        session.seek_frame = true;

        let Some(next) = session.frame.next_start else {
            let now = session.frame.time;
            session.finish(now);

            return Some(Skip::End);
        };

        let speed = self.map.rules.clock_rate;

        // speed-ups are never compensated, slow-downs only when extreme
        let multiplier = if speed >= 0.74 { 1.0 } else { speed.max(0.2) };
        let target = (next - SKIP_LEAD * multiplier).max(0.0);

        session.frame.time = session.frame.time.max(target);

        tracing::debug!(target, "skipped");

        Some(Skip::To(target))
    }

    pub const fn tally(&self) -> &Tally {
        &self.session.scoring.tally
    }

    pub const fn health(&self) -> &Health {
        &self.session.scoring.health
    }

    pub const fn is_failed(&self) -> bool {
        self.session.scoring.health.is_failed()
    }

    pub const fn is_finished(&self) -> bool {
        self.session.finished
    }

    pub const fn is_paused(&self) -> bool {
        self.session.paused
    }

    /// Whether perfect or sudden death stopped the play.
    pub const fn restart_requested(&self) -> bool {
        self.session.scoring.restart_requested
    }

    /// Events since the last call to [`Timeline::take_events`].
    pub fn events(&self) -> &[PlayEvent] {
        &self.session.scoring.events
    }

    pub fn take_events(&mut self) -> Vec<PlayEvent> {
        mem::take(&mut self.session.scoring.events)
    }

    pub const fn state(&self) -> &FrameState {
        &self.session.frame
    }

    /// Current map time including every offset.
    pub const fn time(&self) -> f64 {
        self.session.frame.time
    }

    /// Progress of the artificial lead-in in `0.0..=1.0`, if it is running.
    pub fn lead_in_progress(&self, real_time: f64) -> Option<f64> {
        let Phase::Waiting { until } = self.session.phase else {
            return None;
        };

        let early = self.map.config.early_note_time;

        if early <= 0.0 {
            return Some(1.0);
        }

        Some((1.0 - (until - real_time) / early).clamp(0.0, 1.0))
    }

    pub const fn drain_rate(&self) -> &DrainRate {
        &self.map.drain
    }

    pub const fn rules(&self) -> &GameRules {
        &self.map.rules
    }

    pub const fn config(&self) -> &PlayConfig {
        &self.map.config
    }

    pub const fn mods(&self) -> GameMods {
        self.map.mods
    }

    /// The converted objects in map order.
    pub fn objects(&self) -> &[OsuObject] {
        &self.map.objects
    }

    /// Whether the object at `idx` has its final judgement.
    pub fn is_object_finished(&self, idx: usize) -> Option<bool> {
        self.session.states.get(idx).map(PlayObject::is_finished)
    }

    /// Spinner completion of the object at `idx`, if it is a spinner.
    pub fn spinner_ratio(&self, idx: usize) -> Option<f64> {
        self.session.states.get(idx).and_then(PlayObject::spinner_ratio)
    }

    /// The timing point that is active at the current time.
    pub fn active_timing_point(&self) -> Option<&TimingPoint> {
        let time = self.session.frame.time + self.map.config.timing_point_offset;

        timing_point_at(&self.map.timing_points, time)
    }

    /// Map time of the last object's end.
    pub const fn end_time(&self) -> f64 {
        self.map.last_end
    }

    fn advance(&mut self, to: f64) {
        while let Some(frame) = self.input.next_frame(to) {
            let time = frame.time.max(self.session.frame.time);
            self.session.apply_frame(frame);
            self.session.step(&self.map, time);
        }

        let to = to.max(self.session.frame.time);
        self.session.step(&self.map, to);
    }
}

impl Session {
    fn new(map: &PlayMap) -> Self {
        let config = &map.config;

        let scoring = Scoring::new(
            &map.mods,
            map.drain.multipliers,
            config.drain_kill,
            config.sd_restart,
            config.ez_retries,
            (map.first_start, map.last_end),
        );

        Self {
            states: map.objects.iter().map(PlayObject::new).collect(),
            scoring,
            clicks: Vec::new(),
            cursor: Pos::default(),
            keys: Keys::NONE,
            prev_key_was_key1: false,
            frame: FrameState {
                time: (map.first_start - map.rules.pvs()).min(0.0),
                ..FrameState::default()
            },
            phase: Phase::Idle,
            clock: ClockWatch::default(),
            paused: false,
            finished: false,
            seek_frame: false,
            last_section: None,
        }
    }

    fn reset_to(&mut self, map: &PlayMap, time: f64, input_state: Option<ReplayFrame>) {
        for (state, h) in self.states.iter_mut().zip(map.objects.iter()) {
            state.reset_to(h, time);
        }

        let config = &map.config;

        self.scoring = Scoring::new(
            &map.mods,
            map.drain.multipliers,
            config.drain_kill,
            config.sd_restart,
            config.ez_retries,
            (map.first_start, map.last_end),
        );

        self.clicks.clear();
        self.frame = FrameState {
            time,
            ..FrameState::default()
        };
        self.finished = false;
        self.seek_frame = true;
        self.last_section = None;

        if let Some(frame) = input_state {
            self.keys = frame.keys.normalized();
            self.cursor = frame.pos;
        }
    }

    /// Raw music time, or `None` if the session does not move this frame.
    fn music_time<C: Clock + ?Sized>(
        &mut self,
        map: &PlayMap,
        clock: &mut C,
    ) -> Result<Option<f64>, SessionError> {
        let real = clock.real_time();

        match self.phase {
            Phase::Idle => return Ok(None),
            Phase::Waiting { until } if real <= until => {
                return Ok(Some((real - until) * map.rules.clock_rate));
            }
            Phase::Waiting { .. } => {
                clock.play();
                self.phase = Phase::Playing;
            }
            Phase::Playing => {}
        }

        if !clock.is_ready() {
            self.clock.not_ready(clock, real, map.config.clock_grace)?;

            return Ok(None);
        }

        Ok(Some(self.clock.position(clock, real)))
    }

    /// Turn a device state into held keys and clicks.
    fn apply_frame(&mut self, frame: ReplayFrame) {
        let keys = frame.keys.normalized();
        let pressed = keys.pressed_since(self.keys);

        if !self.paused {
            for key in [Keys::K1, Keys::M1, Keys::K2, Keys::M2] {
                if pressed.contains(key) {
                    self.clicks.push(Click {
                        time: frame.time,
                        pos: frame.pos,
                    });

                    self.prev_key_was_key1 = key == Keys::K1 || key == Keys::M1;
                }
            }
        }

        self.keys = keys;
        self.cursor = frame.pos;
    }

    /// One frame at map time `now`.
    fn step(&mut self, map: &PlayMap, now: f64) {
        let dt = (now - self.frame.time).max(0.0);
        self.frame.time = now;

        if self.finished || self.scoring.restart_requested {
            self.clicks.clear();

            return;
        }

        let real_frame_ms = if self.paused {
            0.0
        } else {
            dt / map.rules.clock_rate
        };

        let ctx = FrameContext {
            now,
            real_frame_ms,
            cursor: self.cursor,
            keys: self.keys,
            prev_key_was_key1: self.prev_key_was_key1,
            paused: self.paused,
            rules: &map.rules,
            config: &map.config,
            mods: &map.mods,
        };

        let mut lanes = Lanes {
            objects: &map.objects,
            end_of_combo: &map.end_of_combo,
            states: &mut self.states,
        };

        let summary = lanes.judge(&ctx, &mut self.scoring, &mut self.clicks);

        self.discard_clicks(&ctx, map.config.nightmare, summary.current_index);
        let active_break = self.update_sections(map, &summary);

        if !self.paused {
            self.drain(map, dt, active_break);
        }

        self.scoring
            .health
            .animate(real_frame_ms / 1000.0, map.config.fail_duration);

        self.seek_frame = false;

        let end = if map.config.end_skip {
            now > map.last_end + map.config.end_delay
        } else {
            self.clock.finished
        };

        if end {
            self.finish(now);
        }
    }

    fn discard_clicks(&mut self, ctx: &FrameContext<'_>, nightmare: bool, current_index: usize) {
        if self.clicks.is_empty() {
            return;
        }

        if nightmare && !self.frame.skippable && !self.frame.in_break && current_index > 0 {
            self.scoring.slider_break(None, ctx.now);

            let judgement = Judgement::health_only(current_index, HitResult::SliderBreak);
            self.scoring.judge(judgement, ctx);
        }

        self.clicks.clear();
    }

    /// Recompute breaks, skippable sections, warning arrows, and section
    /// pass/fail. Returns the break between the surrounding objects.
    fn update_sections(&mut self, map: &PlayMap, summary: &PassSummary) -> Option<(f64, f64)> {
        let now = self.frame.time;
        let config = &map.config;
        let prev = summary.previous_end;
        let next = summary.next_start;

        let legacy_offset = if prev < map.first_start {
            0.0
        } else {
            LEGACY_GAP_OFFSET
        };

        let skippable = match next {
            Some(next) => next - now > config.skip_time && now > prev + legacy_offset,
            None => !config.end_skip,
        };

        let warning_arrows = next.is_some_and(|next| {
            let gap = next - (prev + legacy_offset);

            gap > config.warning_min_gap && warning_blink(next - now)
        });

        let active_break = next.and_then(|next| {
            map.breaks
                .iter()
                .filter(|b| b.start_time >= prev && b.end_time <= next)
                .fold(None, |curr: Option<&BreakPeriod>, b| {
                    if curr.map_or(true, |curr| now >= curr.start_time) {
                        Some(b)
                    } else {
                        curr
                    }
                })
                .map(|b| (b.start_time, b.end_time))
        });

        let in_break = active_break.is_some_and(|(start, end)| start <= now && now <= end);

        let spinner_active = summary.current_object.is_some_and(|i| {
            let h = &map.objects[i];

            h.is_spinner() && now > h.start_time && now < h.end_time
        });

        self.frame.current_index = summary.current_index;
        self.frame.previous_end = prev;
        self.frame.next_start = next;
        self.frame.in_break = in_break;
        self.frame.skippable = skippable;
        self.frame.warning_arrows = warning_arrows;
        self.frame.spinner_active = spinner_active;
        self.frame.nps = summary.nps;
        self.frame.nd = summary.nd;

        self.update_section_pass(map, prev, next, active_break);

        active_break
    }

    fn update_section_pass(
        &mut self,
        map: &PlayMap,
        prev: f64,
        next: Option<f64>,
        active_break: Option<(f64, f64)>,
    ) {
        self.frame.section_pass = 0.0;
        self.frame.section_fail = 0.0;

        let Some(next) = next else {
            return;
        };

        let now = self.frame.time;
        let min_gap = map.config.section_min_gap;
        let gap = next - prev;

        let start = if gap / 2.0 > min_gap {
            prev + gap / 2.0
        } else {
            next - min_gap
        };

        let delta = now - start;
        let break_len = active_break.map_or(0.0, |(start, end)| end - start);

        let eligible = gap > min_gap
            && delta > 0.0
            && now > map.first_start
            && now < map.last_end
            && !self.scoring.health.is_failed()
            && self.frame.in_break
            && break_len > min_gap;

        if !eligible {
            return;
        }

        let passing = self.scoring.health.value() >= SECTION_PASS_HEALTH;

        let alpha = if delta > SECTION_FADE_START {
            1.0 - (delta - SECTION_FADE_START) / (SECTION_FADE_END - SECTION_FADE_START)
        } else {
            1.0
        };

        let in_flash = |flashes: &[(f64, f64)]| {
            flashes
                .iter()
                .any(|&(from, to)| (from..=to).contains(&delta))
        };

        if passing && in_flash(&SECTION_PASS_FLASHES) {
            self.frame.section_pass = alpha;
        } else if !passing && in_flash(&SECTION_FAIL_FLASHES) {
            self.frame.section_fail = alpha;
        }

        let sound_due = if passing {
            delta >= SECTION_PASS_SOUND
        } else {
            delta >= SECTION_FAIL_SOUND
        };

        let new_section = self
            .last_section
            .map_or(true, |last| (last - start).abs() > f64::EPSILON);

        if sound_due && new_section {
            self.last_section = Some(start);

            if !self.seek_frame {
                let cue = if passing {
                    SoundCue::SectionPass
                } else {
                    SoundCue::SectionFail
                };

                self.scoring.events.push(PlayEvent::Sound(cue));
            }
        }
    }

    fn drain(&mut self, map: &PlayMap, dt: f64, active_break: Option<(f64, f64)>) {
        if map.drain.rate <= 0.0 || self.frame.in_break || self.frame.skippable {
            return;
        }

        let now = self.frame.time;

        // between the previous object and an upcoming break
        let before_break = active_break.filter(|_| now > self.frame.previous_end);

        let drains = match before_break {
            None => true,
            Some((break_start, _)) => map.version < 8 && now <= break_start,
        };

        if !drains {
            return;
        }

        let nerf = if self.frame.spinner_active {
            SPINNER_DRAIN_NERF
        } else {
            1.0
        };

        self.scoring.drain(map.drain.drain(dt) * nerf, now);
    }

    fn finish(&mut self, now: f64) {
        if self.finished {
            return;
        }

        self.finished = true;

        tracing::debug!(
            time = now,
            misses = self.scoring.tally.misses,
            max_combo = self.scoring.tally.max_combo,
            "session finished"
        );

        self.scoring.events.push(PlayEvent::Finished { time: now });
    }
}

impl ClockWatch {
    fn not_ready<C: Clock + ?Sized>(&mut self, clock: &mut C, real: f64, grace: f64) -> Result<(), SessionError> {
        self.not_ready_updates += 1;
        let waited_ms = real - *self.not_ready_since.get_or_insert(real);

        if self.not_ready_updates > 1 && self.reload.is_none() {
            let reloaded = clock.reload();
            tracing::debug!(reloaded, "clock not ready, reloading");
            self.reload = Some(reloaded);

            return Ok(());
        }

        if self.not_ready_updates > 3 && waited_ms > grace {
            let err = if self.reload == Some(true) {
                SessionError::ClockReloadFailed
            } else {
                SessionError::ClockNotReady { waited_ms }
            };

            return Err(err);
        }

        Ok(())
    }

    fn position<C: Clock + ?Sized>(&mut self, clock: &C, real: f64) -> f64 {
        self.not_ready_updates = 0;
        self.not_ready_since = None;
        self.finished = clock.is_finished();

        if self.finished {
            // virtual time keeps running past the end of the track
            let finished_at = *self.finished_at.get_or_insert(real);

            clock.length() + (real - finished_at)
        } else {
            self.finished_at = None;

            clock.position()
        }
    }
}

/// Whether warning arrows are lit `delta` milliseconds before the next
/// object.
fn warning_blink(delta: f64) -> bool {
    let beyond = delta - WARNING_LAST_VISIBLE;

    if beyond <= 0.0 || beyond > WARNING_BLINKS * WARNING_BLINK {
        return false;
    }

    let band = (beyond / WARNING_BLINK).ceil() as u32 - 1;

    band % 2 == 0
}
