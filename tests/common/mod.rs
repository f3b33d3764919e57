#![allow(dead_code)]

use rosu_play::{
    model::{
        beatmap::Beatmap,
        control_point::TimingPoint,
        hit_object::{HitObject, HitObjectKind, PathControlPoint, PathType, Pos, Slider, Spinner},
    },
    play::input::ReplayFrame,
};

pub fn circle(x: f32, y: f32, start_time: f64) -> HitObject {
    HitObject {
        pos: Pos::new(x, y),
        start_time,
        new_combo: false,
        kind: HitObjectKind::Circle,
    }
}

/// Straight slider to the right of its head.
pub fn slider(x: f32, y: f32, start_time: f64, len: f32, repeats: usize) -> HitObject {
    let mut head = PathControlPoint::new(Pos::default());
    head.path_type = Some(PathType::LINEAR);

    HitObject {
        pos: Pos::new(x, y),
        start_time,
        new_combo: true,
        kind: HitObjectKind::Slider(Slider {
            expected_dist: Some(f64::from(len)),
            repeats,
            control_points: vec![head, PathControlPoint::new(Pos::new(len, 0.0))]
                .into_boxed_slice(),
        }),
    }
}

pub fn spinner(start_time: f64, duration: f64) -> HitObject {
    HitObject {
        pos: Pos::new(256.0, 192.0),
        start_time,
        new_combo: true,
        kind: HitObjectKind::Spinner(Spinner { duration }),
    }
}

pub fn map(hit_objects: Vec<HitObject>) -> Beatmap {
    Beatmap {
        slider_multiplier: 1.0,
        slider_tick_rate: 1.0,
        timing_points: vec![TimingPoint::new(0.0, 500.0)],
        hit_objects,
        ..Default::default()
    }
}

/// Ten circles in a zigzag, AR 9, CS 4, OD 8.
pub fn ten_circles() -> Beatmap {
    let mut map = map(
        (0..10)
            .map(|i| {
                let y = if i % 2 == 0 { 120.0 } else { 260.0 };

                circle(60.0 + 40.0 * i as f32, y, 1000.0 + 300.0 * f64::from(i))
            })
            .collect(),
    );

    map.ar = 9.0;
    map.cs = 4.0;
    map.od = 8.0;

    map
}

/// Press on every object's head at its start time, alternating keys.
pub fn click_all(map: &Beatmap) -> Vec<ReplayFrame> {
    map.hit_objects
        .iter()
        .zip(0..)
        .flat_map(|(h, i)| {
            let key = if i % 2 == 0 { 4 } else { 8 };

            [
                ReplayFrame::new(h.start_time, h.pos.x, h.pos.y, key),
                ReplayFrame::new(h.start_time + 40.0, h.pos.x, h.pos.y, 0),
            ]
        })
        .collect()
}
