use rosu_map::util::Pos;

use crate::{
    any::difficulty::object::{HasStartTime, IDifficultyObject},
    osu::object::{ping_pong, OsuObject, OsuObjectKind, OsuSlider, SliderEventKind},
};

use super::scaling_factor::ScalingFactor;

/// Where the cursor is assumed to be when following a slider lazily.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LazySlider {
    pub end_pos: Pos,
    /// Travelled distance, normalized to a radius of 50.
    pub travel_dist: f64,
    /// Time until the last scoring time in map time.
    pub travel_time: f64,
}

impl LazySlider {
    const FOLLOW_DIST: f64 = 90.0;
    const REPEAT_FOLLOW_DIST: f64 = 50.0;

    /// Moves a cursor along the slider, only as far as it has to.
    pub fn new(h: &OsuObject, slider: &OsuSlider, radius: f64) -> Self {
        let head = h.stacked_pos();
        let point_at = |progress: f64| head + slider.path.position_at(progress);

        let Some(last) = slider.scoring_times.last() else {
            return Self {
                end_pos: head,
                travel_dist: 0.0,
                travel_time: 0.0,
            };
        };

        let travel_time = last.time - h.start_time;
        let mut end_pos = point_at(ping_pong(travel_time / slider.span_duration));

        let scaling_factor = 50.0 / radius;
        let mut cursor = head;
        let mut travel_dist = 0.0;
        let visual_end = point_at(if slider.span_count % 2 == 1 { 1.0 } else { 0.0 });

        for (i, event) in slider.scoring_times.iter().enumerate() {
            let is_last = i == slider.scoring_times.len() - 1;

            let mut diff = if event.kind == SliderEventKind::End {
                visual_end - cursor
            } else {
                let elapsed = (event.time - h.start_time).clamp(0.0, slider.duration());

                point_at(ping_pong(elapsed / slider.span_duration)) - cursor
            };

            let mut diff_len = scaling_factor * f64::from(diff.length());
            let mut required = Self::FOLLOW_DIST;

            if is_last {
                let lazy_diff = end_pos - cursor;

                if lazy_diff.length() < diff.length() {
                    diff = lazy_diff;
                }

                diff_len = scaling_factor * f64::from(diff.length());
            } else if event.kind == SliderEventKind::Repeat {
                required = Self::REPEAT_FOLLOW_DIST;
            }

            if diff_len > required {
                let ratio = (diff_len - required) / diff_len;
                cursor += diff * ratio as f32;
                diff_len *= ratio;
                travel_dist += diff_len;
            }

            if is_last {
                end_pos = cursor;
            }
        }

        Self {
            end_pos,
            travel_dist,
            travel_time,
        }
    }
}

/// A hit object with all values that the skills need, timings already
/// divided by the clock rate.
pub struct OsuDifficultyObject<'a> {
    pub idx: usize,
    pub base: &'a OsuObject,
    pub start_time: f64,
    pub delta_time: f64,
    pub strain_time: f64,

    pub jump_dist: f64,
    pub min_jump_dist: f64,
    pub min_jump_time: f64,
    pub travel_dist: f64,
    pub travel_time: f64,
    pub angle: Option<f64>,
}

impl<'a> OsuDifficultyObject<'a> {
    pub const NORMALIZED_RADIUS: f64 = 50.0;
    pub const MIN_DELTA_TIME: f64 = 25.0;

    const MAX_SLIDER_RADIUS: f64 = Self::NORMALIZED_RADIUS * 2.4;
    const ASSUMED_SLIDER_RADIUS: f64 = Self::NORMALIZED_RADIUS * 1.8;

    /// Creates difficulty objects for all `objects`, including the first one.
    pub fn create_all(
        objects: &'a [OsuObject],
        scaling_factor: &ScalingFactor,
        clock_rate: f64,
    ) -> Vec<Self> {
        let lazy: Vec<_> = objects
            .iter()
            .map(|h| match h.kind {
                OsuObjectKind::Slider(ref slider) => {
                    Some(LazySlider::new(h, slider, scaling_factor.radius))
                }
                OsuObjectKind::Circle | OsuObjectKind::Spinner => None,
            })
            .collect();

        let end_cursor = |idx: usize| {
            lazy[idx].map_or_else(|| objects[idx].stacked_pos(), |lazy| lazy.end_pos)
        };

        let factor = scaling_factor.factor;

        objects
            .iter()
            .enumerate()
            .map(|(idx, h)| {
                let start_time = h.start_time / clock_rate;

                let mut this = Self {
                    idx,
                    base: h,
                    start_time,
                    delta_time: 0.0,
                    strain_time: 0.0,
                    jump_dist: 0.0,
                    min_jump_dist: 0.0,
                    min_jump_time: 0.0,
                    travel_dist: 0.0,
                    travel_time: 0.0,
                    angle: None,
                };

                let Some(prev_idx) = idx.checked_sub(1) else {
                    return this;
                };

                let prev = &objects[prev_idx];

                this.delta_time = start_time - prev.start_time / clock_rate;
                this.strain_time = this.delta_time.max(Self::MIN_DELTA_TIME);

                if let (OsuObjectKind::Slider(slider), Some(curr_lazy)) = (&h.kind, lazy[idx]) {
                    let repeats = slider.repeat_count() as f64;
                    this.travel_dist = curr_lazy.travel_dist * (1.0 + repeats / 2.5).powf(1.0 / 2.5);
                    this.travel_time =
                        (curr_lazy.travel_time / clock_rate).max(Self::MIN_DELTA_TIME);
                }

                // Don't need to jump to reach spinners
                if h.is_spinner() || prev.is_spinner() {
                    return this;
                }

                let last_cursor = end_cursor(prev_idx);

                this.jump_dist =
                    f64::from((h.stacked_pos() * factor - last_cursor * factor).length());
                this.min_jump_dist = this.jump_dist;
                this.min_jump_time = this.strain_time;

                if let Some(prev_lazy) = lazy[prev_idx] {
                    let last_travel = (prev_lazy.travel_time / clock_rate).max(Self::MIN_DELTA_TIME);
                    this.min_jump_time = (this.strain_time - last_travel).max(Self::MIN_DELTA_TIME);

                    let tail_jump_dist =
                        f64::from(prev.stacked_end_pos().distance(h.stacked_pos()) * factor);

                    this.min_jump_dist = f64::max(
                        0.0,
                        f64::min(
                            this.min_jump_dist
                                - (Self::MAX_SLIDER_RADIUS - Self::ASSUMED_SLIDER_RADIUS),
                            tail_jump_dist - Self::MAX_SLIDER_RADIUS,
                        ),
                    );
                }

                if let Some(prev_prev_idx) = idx.checked_sub(2) {
                    if !objects[prev_prev_idx].is_spinner() {
                        let last_last_cursor = end_cursor(prev_prev_idx);

                        let v1 = last_last_cursor - prev.stacked_pos();
                        let v2 = h.stacked_pos() - last_cursor;

                        let dot = f64::from(v1.dot(v2));
                        let det = f64::from(v1.x * v2.y - v1.y * v2.x);

                        this.angle = Some(det.atan2(dot).abs());
                    }
                }

                this
            })
            .collect()
    }

    /// The object `backwards_idx + 1` positions before this one, clamped to
    /// the first object.
    pub fn previous_or_first<'b>(
        &self,
        backwards_idx: usize,
        objects: &'b [OsuDifficultyObject<'a>],
    ) -> &'b OsuDifficultyObject<'a> {
        &objects[self.idx.saturating_sub(backwards_idx + 1)]
    }
}

impl IDifficultyObject for OsuDifficultyObject<'_> {
    type DifficultyObjects = [Self];

    fn idx(&self) -> usize {
        self.idx
    }
}

impl HasStartTime for OsuDifficultyObject<'_> {
    fn start_time(&self) -> f64 {
        self.start_time
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            beatmap::Beatmap,
            control_point::TimingPoint,
            hit_object::{HitObject, HitObjectKind, PathControlPoint, PathType, Slider},
            mods::Reflection,
        },
        osu::convert::convert_objects,
    };

    use super::*;

    fn circle(x: f32, y: f32, start_time: f64) -> HitObject {
        HitObject {
            pos: Pos::new(x, y),
            start_time,
            new_combo: false,
            kind: HitObjectKind::Circle,
        }
    }

    fn map(hit_objects: Vec<HitObject>) -> Beatmap {
        Beatmap {
            timing_points: vec![TimingPoint::new(0.0, 500.0)],
            hit_objects,
            ..Default::default()
        }
    }

    #[test]
    fn jumps_and_angles() {
        let map = map(vec![
            circle(100.0, 100.0, 1000.0),
            circle(200.0, 100.0, 1200.0),
            circle(200.0, 200.0, 1210.0),
        ]);

        let attrs = map.attributes().build();
        let objects = convert_objects(&map, &attrs, Reflection::None);
        let scaling = ScalingFactor::new(attrs.cs);
        let diff_objects = OsuDifficultyObject::create_all(&objects, &scaling, 1.0);

        assert_eq!(diff_objects.len(), 3);
        assert!(diff_objects[0].angle.is_none());
        assert!(diff_objects[0].jump_dist.abs() < f64::EPSILON);

        let expected = 100.0 * f64::from(scaling.factor);
        assert!((diff_objects[1].jump_dist - expected).abs() < 1e-3);

        // Clamped to the minimum delta time
        assert!((diff_objects[2].strain_time - 25.0).abs() < f64::EPSILON);
        assert!((diff_objects[2].delta_time - 10.0).abs() < 1e-9);

        let angle = diff_objects[2].angle.unwrap();
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn clock_rate_scales_times() {
        let map = map(vec![circle(0.0, 0.0, 1500.0), circle(0.0, 0.0, 3000.0)]);

        let attrs = map.attributes().build();
        let objects = convert_objects(&map, &attrs, Reflection::None);
        let diff_objects =
            OsuDifficultyObject::create_all(&objects, &ScalingFactor::new(attrs.cs), 1.5);

        assert!((diff_objects[1].start_time - 2000.0).abs() < 1e-9);
        assert!((diff_objects[1].delta_time - 1000.0).abs() < 1e-9);
        assert!(std::ptr::eq(diff_objects[1].previous_or_first(5, &diff_objects), &diff_objects[0]));
    }

    #[test]
    fn long_slider_travels() {
        let mut head = PathControlPoint::new(Pos::default());
        head.path_type = Some(PathType::LINEAR);

        let slider = HitObject {
            pos: Pos::new(100.0, 100.0),
            start_time: 1000.0,
            new_combo: true,
            kind: HitObjectKind::Slider(Slider {
                expected_dist: Some(300.0),
                repeats: 0,
                control_points: vec![head, PathControlPoint::new(Pos::new(300.0, 0.0))]
                    .into_boxed_slice(),
            }),
        };

        let map = map(vec![slider, circle(400.0, 300.0, 3000.0)]);
        let attrs = map.attributes().build();
        let objects = convert_objects(&map, &attrs, Reflection::None);
        let scaling = ScalingFactor::new(attrs.cs);

        let OsuObjectKind::Slider(ref slider) = objects[0].kind else {
            unreachable!()
        };

        let lazy = LazySlider::new(&objects[0], slider, scaling.radius);
        assert!(lazy.travel_dist > 0.0);
        assert!(lazy.end_pos.x > 100.0);

        let diff_objects = OsuDifficultyObject::create_all(&objects, &scaling, 1.0);
        assert!(diff_objects[1].min_jump_dist <= diff_objects[1].jump_dist);
        assert!(diff_objects[1].min_jump_time >= OsuDifficultyObject::MIN_DELTA_TIME);
    }
}
