use std::cmp::Ordering;

use rosu_map::section::hit_objects::CurveBuffers;

use crate::model::{
    beatmap::Beatmap,
    control_point::{difficulty_point_at, timing_point_at, DifficultyPoint, TimingPoint},
    hit_object::{HitObject, HitObjectKind, Pos, Slider},
    mods::Reflection,
};

use super::PLAYFIELD_BASE_SIZE;

/// A hit object prepared for judging and difficulty calculation.
///
/// Positions are already reflected for HR/mirror but not yet stacked.
#[derive(Clone, Debug, PartialEq)]
pub struct OsuObject {
    pub pos: Pos,
    pub start_time: f64,
    pub end_time: f64,
    pub new_combo: bool,
    pub stack_height: i32,
    pub stack_offset: Pos,
    pub kind: OsuObjectKind,
}

impl OsuObject {
    pub const OBJECT_RADIUS: f32 = 64.0;

    const BASE_SCORING_DIST: f64 = 100.0;

    pub(crate) fn new(
        h: &HitObject,
        map: &Beatmap,
        reflection: Reflection,
        curve_bufs: &mut CurveBuffers,
    ) -> Self {
        let pos = reflect_pos(h.pos, reflection);

        let (kind, end_time) = match h.kind {
            HitObjectKind::Circle => (OsuObjectKind::Circle, h.start_time),
            HitObjectKind::Slider(ref slider) => {
                let slider = OsuSlider::new(h, slider, map, reflection, curve_bufs);
                let end_time = h.start_time + slider.duration();

                (OsuObjectKind::Slider(slider), end_time)
            }
            HitObjectKind::Spinner(ref spinner) => {
                (OsuObjectKind::Spinner, h.start_time + spinner.duration.max(0.0))
            }
        };

        Self {
            pos,
            start_time: h.start_time,
            end_time,
            new_combo: h.new_combo,
            stack_height: 0,
            stack_offset: Pos::default(),
            kind,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn stacked_pos(&self) -> Pos {
        self.pos + self.stack_offset
    }

    /// Unstacked position at the end of the object.
    pub fn end_pos(&self) -> Pos {
        match self.kind {
            OsuObjectKind::Circle | OsuObjectKind::Spinner => self.pos,
            OsuObjectKind::Slider(ref slider) => self.pos + slider.path.end_pos(slider.span_count),
        }
    }

    pub fn stacked_end_pos(&self) -> Pos {
        self.end_pos() + self.stack_offset
    }

    /// Stacked position of the object at `time`, following the slider ball
    /// for sliders.
    pub fn stacked_pos_at(&self, time: f64) -> Pos {
        match self.kind {
            OsuObjectKind::Slider(ref slider) => {
                let progress = slider.progress_at(time - self.start_time);

                self.stacked_pos() + slider.path.position_at(progress)
            }
            OsuObjectKind::Circle | OsuObjectKind::Spinner => self.stacked_pos(),
        }
    }

    /// Amount of combo this object can award.
    pub fn max_combo(&self) -> u32 {
        match self.kind {
            OsuObjectKind::Circle | OsuObjectKind::Spinner => 1,
            OsuObjectKind::Slider(ref slider) => 1 + slider.events.len() as u32,
        }
    }

    pub const fn is_circle(&self) -> bool {
        matches!(self.kind, OsuObjectKind::Circle)
    }

    pub const fn is_slider(&self) -> bool {
        matches!(self.kind, OsuObjectKind::Slider(_))
    }

    pub const fn is_spinner(&self) -> bool {
        matches!(self.kind, OsuObjectKind::Spinner)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OsuObjectKind {
    Circle,
    Slider(OsuSlider),
    Spinner,
}

/// Timing and geometry of a slider.
#[derive(Clone, Debug, PartialEq)]
pub struct OsuSlider {
    pub span_count: usize,
    pub span_duration: f64,
    /// Path relative to the slider head.
    pub path: SliderPath,
    /// Repeats, ticks, and the tail at the time they are judged.
    pub events: Box<[SliderEvent]>,
    /// Same as `events` but the tail is moved slightly earlier, i.e. the
    /// times at which difficulty calculation expects the cursor to follow.
    pub scoring_times: Box<[SliderEvent]>,
}

impl OsuSlider {
    const MAX_TICKS: usize = 2048;
    const END_INSIDE_CHECK_OFFSET: f64 = 36.0;

    fn new(
        h: &HitObject,
        slider: &Slider,
        map: &Beatmap,
        reflection: Reflection,
        curve_bufs: &mut CurveBuffers,
    ) -> Self {
        let start_time = h.start_time;
        let span_count = slider.span_count().max(1);

        let base_beat_len = timing_point_at(&map.timing_points, start_time)
            .map_or(TimingPoint::DEFAULT_BEAT_LEN, |point| point.beat_len);

        let slider_velocity = difficulty_point_at(&map.difficulty_points, start_time)
            .map_or(DifficultyPoint::DEFAULT_SLIDER_VELOCITY, |point| {
                point.slider_velocity
            });

        let beat_len = base_beat_len / slider_velocity;

        let curve = slider.curve(curve_bufs);
        let pixel_len = slider.expected_dist.unwrap_or_else(|| curve.dist());

        let path = if slider.control_points.len() < 2 || !curve.dist().is_finite() {
            tracing::warn!(
                start_time,
                n_points = slider.control_points.len(),
                "slider path could not be built, using its head only"
            );

            SliderPath::single()
        } else {
            SliderPath::sample(|progress| curve.position_at(progress), curve.dist())
        };

        let path = path.reflect(reflection);

        let span_duration =
            (beat_len * (pixel_len / map.slider_multiplier) / OsuObject::BASE_SCORING_DIST).max(1.0);

        let tick_dist = OsuObject::BASE_SCORING_DIST * map.slider_multiplier / map.slider_tick_rate;
        let velocity = tick_dist * map.slider_tick_rate * 1000.0 / beat_len;
        let min_tick_dist_from_end = 0.01 * velocity;

        let tick_px = if map.version < 8 {
            tick_dist
        } else {
            tick_dist * slider_velocity
        };

        let ticks = tick_percents(pixel_len, tick_px, min_tick_dist_from_end);

        let mut events = Vec::with_capacity(span_count * (ticks.len() + 1));

        for span in 0..span_count - 1 {
            events.push(SliderEvent {
                time: start_time + span_duration * (span + 1) as f64,
                kind: SliderEventKind::Repeat,
                span,
                progress: if span % 2 == 0 { 1.0 } else { 0.0 },
            });
        }

        for span in 0..span_count {
            let span_start = start_time + span_duration * span as f64;

            for &tick in ticks.iter() {
                let progress = if span % 2 == 0 { tick } else { 1.0 - tick };

                events.push(SliderEvent {
                    time: span_start + tick * span_duration,
                    kind: SliderEventKind::Tick,
                    span,
                    progress,
                });
            }
        }

        let duration = span_duration * span_count as f64;
        let end_progress = if span_count % 2 == 0 { 0.0 } else { 1.0 };

        let mut scoring_times = events.clone();

        scoring_times.push(SliderEvent {
            time: f64::max(
                start_time + duration / 2.0,
                start_time + duration - Self::END_INSIDE_CHECK_OFFSET,
            ),
            kind: SliderEventKind::End,
            span: span_count - 1,
            progress: end_progress,
        });

        events.push(SliderEvent {
            time: start_time + duration,
            kind: SliderEventKind::End,
            span: span_count - 1,
            progress: end_progress,
        });

        events.sort_by(SliderEvent::cmp_time_kind);
        scoring_times.sort_by(SliderEvent::cmp_time_kind);

        Self {
            span_count,
            span_duration,
            path,
            events: events.into_boxed_slice(),
            scoring_times: scoring_times.into_boxed_slice(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.span_duration * self.span_count as f64
    }

    pub fn repeat_count(&self) -> usize {
        self.span_count - 1
    }

    pub fn tick_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.kind == SliderEventKind::Tick)
            .count()
    }

    /// Path progress after `elapsed` milliseconds since the slider start,
    /// bouncing back and forth between the ends on repeats.
    pub fn progress_at(&self, elapsed: f64) -> f64 {
        let elapsed = elapsed.clamp(0.0, self.duration());

        ping_pong(elapsed / self.span_duration)
    }
}

/// Maps a raw span progress, e.g. `1.25` for a quarter into the second span,
/// onto the path progress.
pub(crate) fn ping_pong(raw: f64) -> f64 {
    if raw % 2.0 >= 1.0 {
        1.0 - raw % 1.0
    } else {
        raw % 1.0
    }
}

fn tick_percents(pixel_len: f64, tick_px: f64, min_dist_from_end: f64) -> Vec<f64> {
    if !pixel_len.is_finite() || !tick_px.is_finite() || tick_px <= 0.0 {
        return Vec::new();
    }

    let tick_count = ((pixel_len / tick_px).ceil() as i64 - 1).min(OsuSlider::MAX_TICKS as i64);

    if tick_count <= 0 {
        return Vec::new();
    }

    let step = tick_px / if pixel_len == 0.0 { 1.0 } else { pixel_len };
    let mut dist_to_end = pixel_len;
    let mut ticks = Vec::with_capacity(tick_count as usize);

    for i in 1..=tick_count {
        dist_to_end -= tick_px;

        if dist_to_end <= min_dist_from_end {
            break;
        }

        ticks.push(step * i as f64);
    }

    ticks
}

/// A point in time during a slider at which something is judged.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliderEvent {
    pub time: f64,
    pub kind: SliderEventKind,
    /// Index of the span that contains the event.
    pub span: usize,
    /// Path progress at the event.
    pub progress: f64,
}

impl SliderEvent {
    fn cmp_time_kind(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.kind.cmp(&other.kind))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SliderEventKind {
    Tick,
    Repeat,
    End,
}

/// Slider path sampled at regular distances.
#[derive(Clone, Debug, PartialEq)]
pub struct SliderPath {
    points: Box<[Pos]>,
}

impl SliderPath {
    const POINT_SEPARATION: f64 = 2.5;
    const MAX_POINTS: usize = 4096;

    fn single() -> Self {
        Self {
            points: Box::new([Pos::default()]),
        }
    }

    fn sample(position_at: impl Fn(f64) -> Pos, dist: f64) -> Self {
        let segments = ((dist / Self::POINT_SEPARATION).ceil() as usize).clamp(1, Self::MAX_POINTS);

        let points = (0..=segments)
            .map(|i| position_at(i as f64 / segments as f64))
            .collect();

        Self { points }
    }

    fn reflect(mut self, reflection: Reflection) -> Self {
        match reflection {
            Reflection::None => {}
            Reflection::Vertical => self.points.iter_mut().for_each(|pos| pos.y = -pos.y),
            Reflection::Horizontal => self.points.iter_mut().for_each(|pos| pos.x = -pos.x),
        }

        self
    }

    /// Position at `progress` in `0.0..=1.0` relative to the slider head.
    pub fn position_at(&self, progress: f64) -> Pos {
        let last = self.points.len() - 1;

        if last == 0 {
            return self.points[0];
        }

        let scaled = progress.clamp(0.0, 1.0) * last as f64;
        let idx = (scaled.floor() as usize).min(last - 1);
        let t = (scaled - idx as f64) as f32;

        let a = self.points[idx];
        let b = self.points[idx + 1];

        a + (b - a) * t
    }

    /// Where the slider ends after all spans.
    pub fn end_pos(&self, span_count: usize) -> Pos {
        self.position_at(if span_count % 2 == 0 { 0.0 } else { 1.0 })
    }
}

pub(crate) fn reflect_pos(pos: Pos, reflection: Reflection) -> Pos {
    match reflection {
        Reflection::None => pos,
        Reflection::Vertical => Pos {
            x: pos.x,
            y: PLAYFIELD_BASE_SIZE.y - pos.y,
        },
        Reflection::Horizontal => Pos {
            x: PLAYFIELD_BASE_SIZE.x - pos.x,
            y: pos.y,
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        control_point::TimingPoint,
        hit_object::{PathControlPoint, PathType},
    };

    use super::*;

    fn linear_slider(len: f32, repeats: usize) -> HitObject {
        let mut head = PathControlPoint::new(Pos::default());
        head.path_type = Some(PathType::LINEAR);

        HitObject {
            pos: Pos::new(100.0, 100.0),
            start_time: 1000.0,
            new_combo: true,
            kind: HitObjectKind::Slider(Slider {
                expected_dist: Some(f64::from(len)),
                repeats,
                control_points: vec![head, PathControlPoint::new(Pos::new(len, 0.0))]
                    .into_boxed_slice(),
            }),
        }
    }

    fn map() -> Beatmap {
        Beatmap {
            slider_multiplier: 1.0,
            slider_tick_rate: 1.0,
            timing_points: vec![TimingPoint::new(0.0, 500.0)],
            ..Default::default()
        }
    }

    #[test]
    fn slider_timing() {
        let h = linear_slider(200.0, 1);
        let obj = OsuObject::new(&h, &map(), Reflection::None, &mut CurveBuffers::default());

        let OsuObjectKind::Slider(ref slider) = obj.kind else {
            panic!("expected slider");
        };

        // 200px at 100px per beat of 500ms
        assert!((slider.span_duration - 1000.0).abs() < 1e-9);
        assert!((obj.end_time - 3000.0).abs() < 1e-9);

        // one tick per span, one repeat, one tail
        assert_eq!(slider.tick_count(), 2);
        assert_eq!(slider.repeat_count(), 1);
        assert_eq!(obj.max_combo(), 5);

        let kinds: Vec<_> = slider.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                SliderEventKind::Tick,
                SliderEventKind::Repeat,
                SliderEventKind::Tick,
                SliderEventKind::End
            ]
        );

        let tail = slider.scoring_times.last().unwrap();
        assert!((tail.time - (3000.0 - 36.0)).abs() < 1e-9);
    }

    #[test]
    fn slider_positions() {
        let h = linear_slider(200.0, 1);
        let obj = OsuObject::new(&h, &map(), Reflection::None, &mut CurveBuffers::default());

        let mid = obj.stacked_pos_at(1500.0);
        assert!((mid.x - 200.0).abs() < 0.5, "{mid:?}");

        let back = obj.stacked_pos_at(3000.0);
        assert!((back.x - 100.0).abs() < 0.5, "{back:?}");
        assert!((obj.end_pos().x - 100.0).abs() < 0.5);
    }

    #[test]
    fn reflection() {
        let h = linear_slider(100.0, 0);
        let obj = OsuObject::new(&h, &map(), Reflection::Horizontal, &mut CurveBuffers::default());

        assert!((obj.pos.x - 412.0).abs() < f32::EPSILON);
        assert!((obj.end_pos().x - 312.0).abs() < 0.5);

        let obj = OsuObject::new(&h, &map(), Reflection::Vertical, &mut CurveBuffers::default());
        assert!((obj.pos.y - 284.0).abs() < f32::EPSILON);
    }

    #[test]
    fn ping_pong_bounces() {
        assert!((ping_pong(0.25) - 0.25).abs() < 1e-12);
        assert!((ping_pong(1.25) - 0.75).abs() < 1e-12);
        assert!((ping_pong(2.5) - 0.5).abs() < 1e-12);
    }
}
