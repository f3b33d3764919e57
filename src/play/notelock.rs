use crate::osu::object::OsuObject;

use super::{
    config::NoteLock,
    context::FrameContext,
    input::Click,
    object::{PlayObject, Target},
    scoring::Scoring,
};

/// What a judging pass learned about the map around the current time.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct PassSummary {
    /// Last object that ended or finished.
    pub(crate) current_index: usize,
    /// Last object that has started.
    pub(crate) current_object: Option<usize>,
    pub(crate) previous_end: f64,
    pub(crate) next_start: Option<f64>,
    pub(crate) nps: u32,
    pub(crate) nd: u32,
}

/// Objects of the map together with their runtime state.
pub(crate) struct Lanes<'a> {
    pub(crate) objects: &'a [OsuObject],
    pub(crate) end_of_combo: &'a [bool],
    pub(crate) states: &'a mut [PlayObject],
}

impl<'a> Lanes<'a> {
    fn target(&self, idx: usize) -> Target<'a> {
        let objects: &'a [OsuObject] = self.objects;

        Target {
            h: &objects[idx],
            idx,
            end_of_combo: self.end_of_combo[idx],
        }
    }

    /// Update every object near the current time, hand out clicks and
    /// apply note-lock.
    ///
    /// Objects are visited in map order. An object is blocked if any earlier
    /// object decided so while it was visited, so blocking always has to be
    /// settled before clicks are offered.
    pub(crate) fn judge(
        &mut self,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
        clicks: &mut Vec<Click>,
    ) -> PassSummary {
        let now = ctx.now;
        let pvs = ctx.rules.pvs();
        let note_lock = ctx.config.note_lock;
        let tolerance = ctx.config.tolerance_2b;
        let nps_gate = 500.0 * ctx.rules.clock_rate;

        let mut summary = PassSummary::default();
        let mut block = false;

        let objects: &'a [OsuObject] = self.objects;

        for (i, h) in objects.iter().enumerate() {
            if summary.next_start.is_none() {
                if h.start_time > now {
                    summary.next_start = Some(h.start_time);
                } else {
                    summary.current_object = Some(i);
                    summary.previous_end = h.end_time;
                }
            }

            if self.states[i].is_finished() && now - pvs > h.end_time {
                summary.current_index = i;

                continue;
            }

            if h.start_time > now + pvs {
                break;
            }

            if now >= h.end_time {
                summary.current_index = i;
            }

            let target = self.target(i);
            self.states[i].update(target, ctx, scoring);

            let next_overlaps = objects
                .get(i + 1)
                .is_some_and(|next| next.start_time <= h.end_time + tolerance);

            let state = &mut self.states[i];
            state.blocked = block;

            match note_lock {
                NoteLock::Own => {}
                NoteLock::Stable => {
                    if !state.is_finished() {
                        block = true;

                        // simultaneous objects must not lock each other out
                        if (h.is_spinner() || state.head_finished()) && next_overlaps {
                            block = false;
                        }
                    }
                }
                NoteLock::Lazer => {
                    // spinners never block
                    if !state.is_finished() && !h.is_spinner() {
                        block = now <= h.start_time && !state.head_finished();
                    }
                }
            }

            let head_before = state.head_finished();
            let finished_before = state.is_finished();

            if let Some(click) = clicks.first().copied() {
                if state.on_click(target, ctx, scoring, clicks) {
                    tracing::trace!(
                        object = i,
                        time = click.time,
                        delta = click.time - h.start_time,
                        "click consumed"
                    );
                }
            }

            let head_now = state.head_finished();
            let finished_now = state.is_finished();

            if !head_before && head_now && note_lock == NoteLock::Stable && next_overlaps {
                block = false;
            }

            if !finished_before && finished_now {
                block = false;

                match note_lock {
                    NoteLock::Own => self.force_miss_before(i, false, ctx, scoring),
                    NoteLock::Lazer => self.force_miss_before(i, true, ctx, scoring),
                    NoteLock::Stable => {}
                }
            }

            if finished_now {
                summary.current_index = i;
            }

            if h.start_time > now - nps_gate && h.start_time < now + nps_gate {
                summary.nps += 1;
            }

            if self.states[i].is_visible(h, now, ctx.rules) {
                summary.nd += 1;
            }
        }

        summary
    }

    /// Miss every unfinished object before `idx` that does not overlap it,
    /// stopping at the first finished one. Spinners are skipped.
    ///
    /// If `started_only` is set, objects whose start time has not passed yet
    /// are left alone.
    fn force_miss_before(
        &mut self,
        idx: usize,
        started_only: bool,
        ctx: &FrameContext<'_>,
        scoring: &mut Scoring,
    ) {
        let objects: &'a [OsuObject] = self.objects;
        let start_time = objects[idx].start_time;

        for m in (0..idx).rev() {
            if self.states[m].is_finished() {
                break;
            }

            let prev = &objects[m];

            if prev.is_spinner() || (started_only && ctx.now <= prev.start_time) {
                continue;
            }

            if start_time > prev.end_time {
                let target = self.target(m);
                self.states[m].miss(target, ctx, scoring);
            }
        }
    }
}
