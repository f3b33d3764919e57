use std::f64::consts::{PI, TAU};

use crate::{
    osu::object::OsuObject,
    play::{
        context::FrameContext,
        result::{HitResult, Judgement},
        rules::GameRules,
        scoring::Scoring,
    },
};

use super::Target;

const AUTO_SPIN_PER_MS: f64 = 1.0 / 20.0;
const MAX_RPM: f64 = 477.0;

#[derive(Clone, Debug)]
pub(crate) struct SpinnerState {
    pub(crate) finished: bool,
    pub(crate) ratio: f64,
    clicked_once: bool,
    /// Accumulated rotation in degrees.
    rotations: f64,
    last_angle: f64,
    time_overflow: f64,
    angle_overflow: f64,
    /// Recent per-frame angles. Rotation follows their average.
    recent_angles: Box<[f64]>,
    recent_idx: usize,
    recent_sum: f64,
    rpm: f64,
}

impl SpinnerState {
    pub(crate) fn new(h: &OsuObject) -> Self {
        let len = ((h.duration() - 2000.0) * (48.0 - 12.0) / (5000.0 - 2000.0) + 12.0)
            .trunc()
            .clamp(12.0, 48.0) as usize;

        Self {
            finished: false,
            ratio: 0.0,
            clicked_once: false,
            rotations: 0.0,
            last_angle: 0.0,
            time_overflow: 0.0,
            angle_overflow: 0.0,
            recent_angles: vec![0.0; len].into_boxed_slice(),
            recent_idx: 0,
            recent_sum: 0.0,
            rpm: 0.0,
        }
    }

    /// Smoothed spinning speed in rotations per minute.
    pub(crate) const fn rpm(&self) -> f64 {
        self.rpm
    }

    pub(crate) fn update(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        if self.finished || ctx.paused {
            return;
        }

        let h = target.h;

        if ctx.now >= h.end_time {
            self.finish(target, ctx, scoring);

            return;
        }

        let frame_ms = ctx.real_frame_ms;

        if frame_ms <= 0.0 {
            return;
        }

        let rotations_needed = ctx.rules.rotations_required(h.duration());

        let mut angle_diff = if ctx.auto_spin() {
            frame_ms * AUTO_SPIN_PER_MS * ctx.rules.clock_rate
        } else {
            let center = h.stacked_pos();
            let angle = f64::from(ctx.cursor.y - center.y).atan2(f64::from(ctx.cursor.x - center.x));
            let diff = angle - self.last_angle;

            if diff.abs() > 0.001 {
                self.last_angle = angle;

                diff
            } else {
                0.0
            }
        };

        if ctx.now < h.start_time {
            return;
        }

        let spinning = ctx.keys.any_held() || ctx.autoplay() || ctx.relax() || ctx.mods.so();

        self.time_overflow += frame_ms;

        if angle_diff < -PI {
            angle_diff += TAU;
        } else if angle_diff > PI {
            angle_diff -= TAU;
        }

        if spinning {
            self.angle_overflow += angle_diff;
        }

        while self.time_overflow >= frame_ms {
            let mut delta_angle = 0.0;

            if spinning {
                delta_angle = self.angle_overflow * frame_ms / self.time_overflow;
                self.angle_overflow -= delta_angle;
            }

            self.time_overflow -= frame_ms;

            let slot = &mut self.recent_angles[self.recent_idx];
            self.recent_sum += delta_angle - *slot;
            *slot = delta_angle;
            self.recent_idx = (self.recent_idx + 1) % self.recent_angles.len();

            let rotation_angle = self.recent_sum / self.recent_angles.len() as f64;
            let rotations_per_sec = rotation_angle * (1000.0 / frame_ms) / TAU;

            let decay = 0.01_f64.powf(frame_ms / 1000.0);
            self.rpm = (self.rpm * decay + (1.0 - decay) * rotations_per_sec.abs() * 60.0).min(MAX_RPM);

            if rotation_angle.abs() > 0.0001 {
                self.rotate(target, rotation_angle, rotations_needed, ctx, scoring);
            }
        }

        self.ratio = if rotations_needed > 0.0 {
            self.rotations / (rotations_needed * 360.0)
        } else if self.rotations > 0.0 {
            1.0
        } else {
            0.0
        };
    }

    fn rotate(
        &mut self,
        target: Target<'_>,
        rad: f64,
        rotations_needed: f64,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) {
        let new_rotations = self.rotations + rad.abs().to_degrees();

        if (new_rotations / 360.0).floor() > self.rotations / 360.0 {
            let (result, points) = if (new_rotations / 360.0).trunc() > rotations_needed.trunc() + 1.0 {
                (HitResult::SpinnerBonus, 1100)
            } else {
                (HitResult::SpinnerSpin, 100)
            };

            // every full rotation is credited twice
            for _ in 0..2 {
                scoring.judge(Judgement::health_only(target.idx, result), ctx);
            }

            scoring.tally.spinner_score += points;
        }

        self.rotations = new_rotations;
    }

    pub(crate) fn on_click(&mut self, target: Target<'_>, ctx: &FrameContext<'_>) -> bool {
        let h = target.h;
        let visible = ctx.now >= h.start_time - GameRules::FADE_IN && ctx.now < h.end_time;

        if self.finished || !visible || self.clicked_once {
            return false;
        }

        self.clicked_once = true;

        true
    }

    pub(crate) fn finish(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        if self.finished {
            return;
        }

        let result = if self.ratio >= 1.0 || ctx.autoplay() {
            HitResult::N300
        } else if self.ratio >= 0.9 {
            HitResult::N100
        } else if self.ratio >= 0.75 {
            HitResult::N50
        } else {
            HitResult::Miss
        };

        self.finished = true;

        let judgement = Judgement::full(target.idx, result, 0.0, target.end_of_combo);
        scoring.judge(judgement, ctx);
    }

    pub(crate) fn reset_to(&mut self, h: &OsuObject, time: f64) {
        *self = Self::new(h);
        self.finished = time >= h.end_time;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::hit_object::{HitObject, HitObjectKind, Pos, Spinner},
        play::{input::Keys, object::test_util::Fixture},
        GameMods,
    };

    use super::*;

    fn spinner(duration: f64) -> HitObject {
        HitObject {
            pos: Pos::new(256.0, 192.0),
            start_time: 1000.0,
            new_combo: true,
            kind: HitObjectKind::Spinner(Spinner { duration }),
        }
    }

    /// Circle the center `rps` times per second while holding a key.
    fn spin(fx: &Fixture, rps: f64) -> (SpinnerState, Scoring) {
        let h = &fx.objects[0];
        let mut scoring = fx.scoring();
        let mut state = SpinnerState::new(h);
        let mut now = h.start_time - 100.0;

        while !state.finished {
            let angle = (now - h.start_time) / 1000.0 * rps * TAU;
            let cursor = Pos::new(256.0 + 50.0 * angle.cos() as f32, 192.0 + 50.0 * angle.sin() as f32);

            let ctx = fx.ctx(now, cursor, Keys::K1);
            state.update(fx.target(0), &ctx, &mut scoring);
            now += 16.0;
        }

        (state, scoring)
    }

    #[test]
    fn ring_length() {
        let fx = Fixture::new(vec![spinner(1000.0)], GameMods::default());
        assert_eq!(SpinnerState::new(&fx.objects[0]).recent_angles.len(), 12);

        let fx = Fixture::new(vec![spinner(3500.0)], GameMods::default());
        assert_eq!(SpinnerState::new(&fx.objects[0]).recent_angles.len(), 30);

        let fx = Fixture::new(vec![spinner(9000.0)], GameMods::default());
        assert_eq!(SpinnerState::new(&fx.objects[0]).recent_angles.len(), 48);
    }

    #[test]
    fn fast_spin_clears() {
        let fx = Fixture::new(vec![spinner(3000.0)], GameMods::default());
        let (state, scoring) = spin(&fx, 5.0);

        assert!(state.ratio >= 1.0);
        assert_eq!(scoring.tally.n300, 1);
        assert!(scoring.tally.spinner_score > 0);
        assert!(state.rpm() > 0.0);
    }

    #[test]
    fn no_spin_misses() {
        let fx = Fixture::new(vec![spinner(3000.0)], GameMods::default());
        let (state, scoring) = spin(&fx, 0.0);

        assert!(state.ratio.abs() < f64::EPSILON);
        assert_eq!(scoring.tally.misses, 1);
        assert_eq!(scoring.tally.spinner_score, 0);
    }

    #[test]
    fn autoplay_spins() {
        let fx = Fixture::new(vec![spinner(3000.0)], GameMods::from(2048_u32));
        let (_, scoring) = spin(&fx, 0.0);

        assert_eq!(scoring.tally.n300, 1);
        assert!(scoring.tally.spinner_score >= 700);
    }
}
