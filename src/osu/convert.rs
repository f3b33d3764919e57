use rosu_map::section::hit_objects::CurveBuffers;

use crate::{
    model::{
        beatmap::{Beatmap, BeatmapAttributes},
        hit_object::Pos,
        mods::Reflection,
    },
    play::error::LoadError,
};

use super::{
    circle_diameter,
    object::{OsuObject, OsuObjectKind},
};

/// Object counts and maximum combo of the first `take` objects.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    pub n_circles: u32,
    pub n_sliders: u32,
    pub n_spinners: u32,
    pub max_combo: u32,
}

impl ObjectCounts {
    pub fn new(objects: &[OsuObject], take: usize) -> Self {
        objects
            .iter()
            .take(take)
            .fold(Self::default(), |mut counts, h| {
                counts.add(h);

                counts
            })
    }

    pub fn add(&mut self, h: &OsuObject) {
        match h.kind {
            OsuObjectKind::Circle => self.n_circles += 1,
            OsuObjectKind::Slider(_) => self.n_sliders += 1,
            OsuObjectKind::Spinner => self.n_spinners += 1,
        }

        self.max_combo += h.max_combo();
    }

    pub const fn n_objects(&self) -> u32 {
        self.n_circles + self.n_sliders + self.n_spinners
    }
}

/// Convert a map's hit objects, apply the reflection of the mods, and stack
/// them.
pub fn convert_objects(
    map: &Beatmap,
    map_attrs: &BeatmapAttributes,
    reflection: Reflection,
) -> Vec<OsuObject> {
    let mut curve_bufs = CurveBuffers::default();

    let mut objects: Vec<_> = map
        .hit_objects
        .iter()
        .map(|h| OsuObject::new(h, map, reflection, &mut curve_bufs))
        .collect();

    let stack_threshold = map_attrs.hit_windows.preempt * f64::from(map.stack_leniency);

    if map.version >= 6 {
        stacking(&mut objects, stack_threshold);
    } else {
        old_stacking(&mut objects, stack_threshold);
    }

    let stack_unit = (circle_diameter(map_attrs.cs) / 20.0) as f32;

    for h in objects.iter_mut() {
        let offset = -(h.stack_height as f32) * stack_unit;
        h.stack_offset = Pos::new(offset, offset);
    }

    objects
}

/// Refuse sliders whose repeated ticks would get out of hand.
pub fn check_scoring_times(objects: &[OsuObject]) -> Result<(), LoadError> {
    for (idx, h) in objects.iter().enumerate() {
        let OsuObjectKind::Slider(ref slider) = h.kind else {
            continue;
        };

        let count = slider.tick_count();

        if count > Beatmap::MAX_SLIDER_SCORING_TIMES {
            return Err(LoadError::TooManyScoringTimes {
                idx,
                count,
                max: Beatmap::MAX_SLIDER_SCORING_TIMES,
            });
        }
    }

    Ok(())
}

/// Indices of `objects` ordered by their end time.
///
/// Objects that end at the same time keep their map order.
pub fn indices_by_end_time(objects: &[OsuObject]) -> Vec<usize> {
    let mut indices: Vec<_> = (0..objects.len()).collect();
    indices.sort_by(|&a, &b| objects[a].end_time.total_cmp(&objects[b].end_time));

    indices
}

const STACK_DISTANCE: f32 = 3.0;

fn stacking(hit_objects: &mut [OsuObject], stack_threshold: f64) {
    let Some(last_idx) = hit_objects.len().checked_sub(1) else {
        return;
    };

    for i in (1..=last_idx).rev() {
        let mut n = i;
        let mut obj_i_idx = i;

        // Objects that already got a stack were handled as part of a later one
        if hit_objects[obj_i_idx].stack_height != 0 || hit_objects[obj_i_idx].is_spinner() {
            continue;
        }

        if hit_objects[obj_i_idx].is_circle() {
            while let Some(prev) = n.checked_sub(1) {
                n = prev;

                if hit_objects[n].is_spinner() {
                    continue;
                }

                if hit_objects[obj_i_idx].start_time - hit_objects[n].end_time > stack_threshold {
                    break;
                }

                // Circles below the end of a slider stack downwards
                if hit_objects[n].is_slider()
                    && hit_objects[n].end_pos().distance(hit_objects[obj_i_idx].pos) < STACK_DISTANCE
                {
                    let offset = hit_objects[obj_i_idx].stack_height - hit_objects[n].stack_height + 1;
                    let slider_end = hit_objects[n].end_pos();

                    for h in hit_objects[n + 1..=i].iter_mut() {
                        if slider_end.distance(h.pos) < STACK_DISTANCE {
                            h.stack_height -= offset;
                        }
                    }

                    break;
                }

                if hit_objects[n].pos.distance(hit_objects[obj_i_idx].pos) < STACK_DISTANCE {
                    hit_objects[n].stack_height = hit_objects[obj_i_idx].stack_height + 1;
                    obj_i_idx = n;
                }
            }
        } else if hit_objects[obj_i_idx].is_slider() {
            while let Some(prev) = n.checked_sub(1) {
                n = prev;

                if hit_objects[n].is_spinner() {
                    continue;
                }

                if hit_objects[obj_i_idx].start_time - hit_objects[n].start_time > stack_threshold {
                    break;
                }

                if hit_objects[n].end_pos().distance(hit_objects[obj_i_idx].pos) < STACK_DISTANCE {
                    hit_objects[n].stack_height = hit_objects[obj_i_idx].stack_height + 1;
                    obj_i_idx = n;
                }
            }
        }
    }
}

fn old_stacking(hit_objects: &mut [OsuObject], stack_threshold: f64) {
    for i in 0..hit_objects.len() {
        if hit_objects[i].stack_height != 0 && !hit_objects[i].is_slider() {
            continue;
        }

        let mut start_time = hit_objects[i].end_time;
        let pos = hit_objects[i].pos;
        let end_pos = hit_objects[i].end_pos();
        let mut slider_stack = 0;

        for j in i + 1..hit_objects.len() {
            if hit_objects[j].start_time - stack_threshold > start_time {
                break;
            }

            if hit_objects[j].pos.distance(pos) < STACK_DISTANCE {
                hit_objects[i].stack_height += 1;
                start_time = hit_objects[j].end_time;
            } else if hit_objects[j].pos.distance(end_pos) < STACK_DISTANCE {
                slider_stack += 1;
                hit_objects[j].stack_height -= slider_stack;
                start_time = hit_objects[j].end_time;
            }
        }
    }
}
