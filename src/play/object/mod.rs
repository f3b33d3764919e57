use crate::osu::object::{OsuObject, OsuObjectKind};

use self::{circle::CircleState, slider::SliderState, spinner::SpinnerState};

use super::{context::FrameContext, input::Click, rules::GameRules, scoring::Scoring};

mod circle;
mod slider;
mod spinner;

/// The object being judged together with its place in the map.
#[derive(Copy, Clone)]
pub(crate) struct Target<'a> {
    pub(crate) h: &'a OsuObject,
    pub(crate) idx: usize,
    pub(crate) end_of_combo: bool,
}

/// Runtime judgement state of a single object.
#[derive(Clone, Debug)]
pub(crate) struct PlayObject {
    pub(crate) blocked: bool,
    state: ObjectState,
}

#[derive(Clone, Debug)]
enum ObjectState {
    Circle(CircleState),
    Slider(SliderState),
    Spinner(SpinnerState),
}

impl PlayObject {
    pub(crate) fn new(h: &OsuObject) -> Self {
        let state = match h.kind {
            OsuObjectKind::Circle => ObjectState::Circle(CircleState::default()),
            OsuObjectKind::Slider(ref slider) => ObjectState::Slider(SliderState::new(slider)),
            OsuObjectKind::Spinner => ObjectState::Spinner(SpinnerState::new(h)),
        };

        Self {
            blocked: false,
            state,
        }
    }

    pub(crate) fn update(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        match self.state {
            ObjectState::Circle(ref mut circle) => circle.update(target, ctx, scoring),
            ObjectState::Slider(ref mut slider) => slider.update(target, ctx, scoring),
            ObjectState::Spinner(ref mut spinner) => spinner.update(target, ctx, scoring),
        }
    }

    /// Offer the oldest pending click. Returns whether it was consumed.
    pub(crate) fn on_click(
        &mut self,
        target: Target<'_>,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
        clicks: &mut Vec<Click>,
    ) -> bool {
        let Some(&click) = clicks.first() else {
            return false;
        };

        let consumed = match self.state {
            ObjectState::Circle(ref mut circle) => {
                !self.blocked && circle.on_click(target, click, ctx, scoring)
            }
            ObjectState::Slider(ref mut slider) => {
                !self.blocked && slider.on_click(target, click, ctx, scoring)
            }
            ObjectState::Spinner(ref mut spinner) => spinner.on_click(target, ctx),
        };

        if consumed {
            clicks.remove(0);
        }

        consumed
    }

    /// Force a miss, e.g. because a later object was clicked.
    pub(crate) fn miss(&mut self, target: Target<'_>, ctx: &FrameContext<'_>, scoring: &mut Scoring) {
        match self.state {
            ObjectState::Circle(ref mut circle) => circle.miss(target, ctx, scoring),
            ObjectState::Slider(ref mut slider) => slider.miss(target, ctx, scoring),
            ObjectState::Spinner(ref mut spinner) => spinner.finish(target, ctx, scoring),
        }
    }

    /// Recreate the state as if the play had reached `time` without any
    /// judgements.
    pub(crate) fn reset_to(&mut self, h: &OsuObject, time: f64) {
        self.blocked = false;

        match self.state {
            ObjectState::Circle(ref mut circle) => circle.reset_to(h, time),
            ObjectState::Slider(ref mut slider) => slider.reset_to(h, time),
            ObjectState::Spinner(ref mut spinner) => spinner.reset_to(h, time),
        }
    }

    pub(crate) const fn is_finished(&self) -> bool {
        match self.state {
            ObjectState::Circle(ref circle) => circle.finished,
            ObjectState::Slider(ref slider) => slider.finished,
            ObjectState::Spinner(ref spinner) => spinner.finished,
        }
    }

    /// Whether a slider's head has been judged.
    pub(crate) const fn head_finished(&self) -> bool {
        match self.state {
            ObjectState::Slider(ref slider) => slider.start_finished,
            ObjectState::Circle(_) | ObjectState::Spinner(_) => false,
        }
    }

    pub(crate) fn is_visible(&self, h: &OsuObject, now: f64, rules: &GameRules) -> bool {
        now >= h.start_time - rules.approach_time() && (now < h.end_time || !self.is_finished())
    }

    /// Completion of a spinner in `0.0..`.
    pub(crate) const fn spinner_ratio(&self) -> Option<f64> {
        match self.state {
            ObjectState::Spinner(ref spinner) => Some(spinner.ratio),
            ObjectState::Circle(_) | ObjectState::Slider(_) => None,
        }
    }
}
