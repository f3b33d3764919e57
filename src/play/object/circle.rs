use crate::{
    osu::object::OsuObject,
    play::{
        context::FrameContext,
        input::Click,
        result::{HitResult, Judgement},
        scoring::Scoring,
    },
};

use super::Target;

#[derive(Clone, Debug, Default)]
pub(crate) struct CircleState {
    pub(crate) finished: bool,
}

impl CircleState {
    pub(crate) fn update(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        if self.finished {
            return;
        }

        let h = target.h;
        let delta = ctx.now - h.start_time;

        if ctx.autoplay() {
            if delta >= 0.0 {
                self.hit(target, HitResult::N300, 0.0, ctx, scoring);
            }
        } else if ctx.relax()
            && !ctx.paused
            && ctx.now >= h.start_time + ctx.config.relax_offset
            && ctx.distance_to(h.stacked_pos()) < ctx.rules.circle_radius()
        {
            if let Some(result) = ctx.rules.judge(delta) {
                self.hit(target, result, delta, ctx, scoring);
            }
        }

        if !self.finished && ctx.rules.timed_out(delta) {
            self.hit(target, HitResult::Miss, delta, ctx, scoring);
        }
    }

    pub(crate) fn on_click(
        &mut self,
        target: Target<'_>,
        click: Click,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) -> bool {
        if self.finished {
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

        self.hit(target, result, delta, ctx, scoring);

        true
    }

    pub(crate) fn miss(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        if !self.finished {
            let delta = ctx.now - target.h.start_time;
            self.hit(target, HitResult::Miss, delta, ctx, scoring);
        }
    }

    pub(crate) fn reset_to(&mut self, h: &OsuObject, time: f64) {
        self.finished = time > h.start_time;
    }

    fn hit(
        &mut self,
        target: Target<'_>,
        result: HitResult,
        delta: f64,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) {
        self.finished = true;

        let judgement = Judgement::full(target.idx, result, delta, target.end_of_combo);
        scoring.judge(judgement, ctx);
    }
}
