use crate::{
    osu::object::{OsuObject, OsuSlider, SliderEventKind},
    play::{
        context::FrameContext,
        input::Click,
        result::{HitResult, Judgement, JudgementKind},
        scoring::Scoring,
    },
};

use super::Target;

/// Which key keeps the slider held after both were down on its head.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum TrackingKey {
    #[default]
    Any,
    Key2,
    Key1,
}

#[derive(Clone, Debug)]
struct NestedState {
    time: f64,
    repeat: bool,
    finished: bool,
    successful: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct SliderState {
    pub(crate) finished: bool,
    pub(crate) start_finished: bool,
    start_result: Option<HitResult>,
    end_finished: bool,
    end_checked: bool,
    held_till_end: bool,
    held_till_lenience: bool,
    cursor_left: bool,
    cursor_inside: bool,
    tracking_key: TrackingKey,
    nested: Vec<NestedState>,
}

impl SliderState {
    pub(crate) fn new(slider: &OsuSlider) -> Self {
        let nested = slider
            .events
            .iter()
            .filter(|event| event.kind != SliderEventKind::End)
            .map(|event| NestedState {
                time: event.time,
                repeat: event.kind == SliderEventKind::Repeat,
                finished: false,
                successful: false,
            })
            .collect();

        Self {
            finished: false,
            start_finished: false,
            start_result: None,
            end_finished: false,
            end_checked: false,
            held_till_end: false,
            held_till_lenience: false,
            cursor_left: true,
            cursor_inside: false,
            tracking_key: TrackingKey::Any,
            nested,
        }
    }

    fn is_held(&self, ctx: &FrameContext<'_>) -> bool {
        match self.tracking_key {
            TrackingKey::Any => ctx.keys.any_held(),
            TrackingKey::Key2 => ctx.keys.key2(),
            TrackingKey::Key1 => ctx.keys.key1(),
        }
    }

    pub(crate) fn update(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        if self.finished {
            return;
        }

        let h = target.h;
        let now = ctx.now;

        // releasing the other key hands tracking back to both keys
        match self.tracking_key {
            TrackingKey::Key2 if !ctx.keys.key1() => self.tracking_key = TrackingKey::Any,
            TrackingKey::Key1 if !ctx.keys.key2() => self.tracking_key = TrackingKey::Any,
            _ => {}
        }

        let ball = h.stacked_pos_at(now);

        let radius = if self.cursor_left {
            ctx.rules.circle_radius()
        } else {
            ctx.rules.follow_radius()
        };

        self.cursor_inside = ctx.autoplay() || ctx.distance_to(ball) < radius;
        self.cursor_left = !self.cursor_inside;

        if !self.start_finished {
            let delta = now - h.start_time;

            if ctx.autoplay() {
                if now >= h.start_time {
                    self.on_head(target, HitResult::N300, 0.0, ctx, scoring);
                }
            } else if ctx.relax()
                && !ctx.paused
                && now >= h.start_time + ctx.config.relax_offset
                && ctx.distance_to(h.stacked_pos()) < ctx.rules.circle_radius()
            {
                if let Some(result) = ctx.rules.judge(delta) {
                    self.on_head(target, result, delta, ctx, scoring);
                }
            }

            if !self.start_finished && ctx.rules.timed_out(delta) {
                self.on_head(target, HitResult::Miss, delta, ctx, scoring);
            }
        }

        if self.end_finished {
            return;
        }

        let held = self.is_held(ctx);
        let duration = h.duration();
        let lenience_end = f64::max(
            h.start_time + duration / 2.0,
            h.end_time - ctx.config.slider_end_inside_check_offset,
        );

        let tracking = (held || ctx.relax()) && self.cursor_inside;

        if tracking {
            if now >= lenience_end && !self.end_checked {
                self.end_checked = true;
                self.held_till_lenience = true;
            }
        } else {
            self.cursor_left = true;
        }

        if now >= lenience_end {
            self.end_checked = true;
        }

        for i in 0..self.nested.len() {
            let nested = &self.nested[i];

            if nested.finished || now < nested.time {
                continue;
            }

            let successful = (held && self.cursor_inside)
                || ctx.autoplay()
                || (ctx.relax() && self.cursor_inside);

            let repeat = nested.repeat;
            self.nested[i].finished = true;
            self.nested[i].successful = successful;

            self.on_nested(target, successful, repeat, ctx, scoring);
        }

        if now < h.end_time {
            return;
        }

        if ctx.autoplay() {
            self.held_till_lenience = true;
            self.held_till_end = true;
            self.on_end(target, HitResult::N300, ctx, scoring);

            return;
        }

        if self.start_result.is_none() {
            // too short for the head to time out
            scoring.slider_break(Some(target.idx), now);
            scoring.judge(Judgement::health_only(target.idx, HitResult::SliderBreak), ctx);
            self.start_finished = true;
            self.start_result = Some(HitResult::Miss);
        }

        self.held_till_end = self.held_till_lenience;

        let result = self.end_result(ctx.mods.v2());
        self.on_end(target, result, ctx, scoring);
    }

    fn end_result(&self, v2: bool) -> HitResult {
        let start = self.start_result.unwrap_or(HitResult::Miss);

        let successful = usize::from(start != HitResult::Miss)
            + usize::from(self.held_till_end)
            + self.nested.iter().filter(|nested| nested.successful).count();

        let percent = successful as f64 / (2 + self.nested.len()) as f64;

        if percent >= 0.999 && (!v2 || start == HitResult::N300) {
            HitResult::N300
        } else if percent >= 0.5 && (!v2 || matches!(start, HitResult::N300 | HitResult::N100)) {
            HitResult::N100
        } else if percent > 0.0 {
            HitResult::N50
        } else {
            HitResult::Miss
        }
    }

    pub(crate) fn on_click(
        &mut self,
        target: Target<'_>,
        click: Click,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) -> bool {
        if self.finished || self.start_finished {
            return false;
        }

        let h = target.h;

        if f64::from(click.pos.distance(h.stacked_pos())) > ctx.rules.circle_radius() {
            return false;
        }

        let delta = click.time - h.start_time;

        let Some(result) = ctx.rules.judge(delta) else {
            return false;
        };

        self.on_head(target, result, delta, ctx, scoring);

        true
    }

    pub(crate) fn miss(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        if self.finished {
            return;
        }

        if !self.start_finished {
            let delta = ctx.now - target.h.start_time;
            self.on_head(target, HitResult::Miss, delta, ctx, scoring);
        }

        for i in 0..self.nested.len() {
            if !self.nested[i].finished {
                let repeat = self.nested[i].repeat;
                self.nested[i].finished = true;
                self.on_nested(target, false, repeat, ctx, scoring);
            }
        }

        self.held_till_end = self.held_till_lenience;
        self.on_end(target, HitResult::Miss, ctx, scoring);
    }

    pub(crate) fn reset_to(&mut self, h: &OsuObject, time: f64) {
        let started = time > h.start_time;
        let ended = time >= h.end_time;

        self.finished = ended;
        self.start_finished = started;
        self.start_result = started.then_some(HitResult::N300);
        self.end_finished = ended;
        self.end_checked = ended;
        self.held_till_end = false;
        self.held_till_lenience = false;
        self.cursor_left = true;
        self.cursor_inside = false;
        self.tracking_key = TrackingKey::Any;

        for nested in self.nested.iter_mut() {
            nested.finished = nested.time < time;
            nested.successful = nested.finished;
        }
    }

    fn on_head(
        &mut self,
        target: Target<'_>,
        result: HitResult,
        delta: f64,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) {
        if result == HitResult::Miss {
            scoring.slider_break(Some(target.idx), ctx.now);
        }

        self.start_finished = true;
        self.start_result = Some(result);

        if ctx.keys.key1() && ctx.keys.key2() {
            self.tracking_key = if ctx.prev_key_was_key1 {
                TrackingKey::Key1
            } else {
                TrackingKey::Key2
            };
        }

        scoring.judge(
            Judgement {
                object: target.idx,
                result,
                delta,
                end_of_combo: false,
                kind: JudgementKind::Head,
            },
            ctx,
        );

        let edge = if result == HitResult::Miss {
            HitResult::SliderBreak
        } else {
            HitResult::SliderEdge
        };

        scoring.judge(Judgement::health_only(target.idx, edge), ctx);
    }

    fn on_nested(
        &mut self,
        target: Target<'_>,
        successful: bool,
        repeat: bool,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) {
        if !successful {
            scoring.slider_break(Some(target.idx), ctx.now);
            scoring.judge(Judgement::health_only(target.idx, HitResult::SliderBreak), ctx);

            return;
        }

        let result = if repeat {
            HitResult::SliderEdge
        } else {
            HitResult::SliderTick
        };

        scoring.judge(
            Judgement {
                object: target.idx,
                result,
                delta: 0.0,
                end_of_combo: false,
                kind: JudgementKind::Nested,
            },
            ctx,
        );
    }

    fn on_end(
        &mut self,
        target: Target<'_>,
        result: HitResult,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) {
        if result == HitResult::Miss {
            scoring.slider_break(Some(target.idx), ctx.now);
        }

        self.end_finished = true;
        self.finished = true;

        let held = self.held_till_end;

        scoring.judge(
            Judgement {
                object: target.idx,
                result,
                delta: 0.0,
                end_of_combo: target.end_of_combo,
                kind: JudgementKind::Tail { held },
            },
            ctx,
        );

        let edge = if held {
            HitResult::SliderEdge
        } else {
            HitResult::SliderBreak
        };

        scoring.judge(Judgement::health_only(target.idx, edge), ctx);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::hit_object::{HitObject, HitObjectKind, PathControlPoint, PathType, Pos, Slider},
        osu::object::OsuObjectKind,
        play::{input::Keys, object::test_util::Fixture},
        GameMods,
    };

    use super::*;

    fn slider() -> HitObject {
        let mut head = PathControlPoint::new(Pos::default());
        head.path_type = Some(PathType::LINEAR);

        HitObject {
            pos: Pos::new(100.0, 100.0),
            start_time: 1000.0,
            new_combo: true,
            kind: HitObjectKind::Slider(Slider {
                expected_dist: Some(200.0),
                repeats: 0,
                control_points: vec![head, PathControlPoint::new(Pos::new(200.0, 0.0))]
                    .into_boxed_slice(),
            }),
        }
    }

    /// Step through the slider every 10ms, following the ball while
    /// `hold` says so.
    fn play(fx: &Fixture, hold: impl Fn(f64) -> bool) -> (SliderState, Scoring) {
        let mut scoring = fx.scoring();
        let h = &fx.objects[0];
        let OsuObjectKind::Slider(ref slider) = h.kind else {
            unreachable!()
        };
        let mut state = SliderState::new(slider);

        let click = Click {
            time: h.start_time,
            pos: h.stacked_pos(),
        };

        let ctx = fx.ctx(h.start_time, h.stacked_pos(), Keys::K1);
        assert!(state.on_click(fx.target(0), click, &ctx, &mut scoring));

        let mut now = h.start_time;

        while !state.finished {
            let keys = if hold(now) { Keys::K1 } else { Keys::NONE };
            let ctx = fx.ctx(now, h.stacked_pos_at(now), keys);
            state.update(fx.target(0), &ctx, &mut scoring);
            now += 10.0;
        }

        (state, scoring)
    }

    #[test]
    fn held_through() {
        let fx = Fixture::new(vec![slider()], GameMods::default());
        let (state, scoring) = play(&fx, |_| true);

        assert!(state.held_till_end);
        assert_eq!(scoring.tally.n300, 1);
        assert_eq!(scoring.tally.slider_breaks, 0);
        assert_eq!(scoring.tally.combo, fx.objects[0].max_combo());
    }

    #[test]
    fn released_early() {
        let fx = Fixture::new(vec![slider()], GameMods::default());
        let start = fx.objects[0].start_time;
        let (state, scoring) = play(&fx, |now| now < start + 50.0);

        assert!(!state.held_till_end);
        assert!(scoring.tally.n300 == 0);
        assert!(scoring.tally.n50 + scoring.tally.n100 == 1);
        assert!(scoring.tally.slider_breaks > 0);
    }

    #[test]
    fn missed_head_breaks() {
        let fx = Fixture::new(vec![slider()], GameMods::default());
        let mut scoring = fx.scoring();
        let h = &fx.objects[0];
        let OsuObjectKind::Slider(ref slider) = h.kind else {
            unreachable!()
        };
        let mut state = SliderState::new(slider);

        state.miss(fx.target(0), &fx.ctx(h.start_time + 300.0, Pos::default(), Keys::NONE), &mut scoring);

        assert!(state.finished);
        assert_eq!(scoring.tally.misses, 1);
        assert!(scoring.tally.slider_breaks >= 2);
    }
}
