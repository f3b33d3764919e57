use proptest::prelude::*;
use rosu_play::{
    play::{
        input::ReplayFrame, replay::ReplayInput, HitResult, NoteLock, PlayConfig, PlayEvent,
        Timeline,
    },
    Difficulty, GameMods,
};

mod common;

#[test]
fn perfect_clicks() {
    let map = common::ten_circles();

    let mut timeline = Timeline::new(&map, GameMods::default(), PlayConfig::default())
        .unwrap()
        .with_input(ReplayInput::new(common::click_all(&map)));

    timeline.simulate_to_end();

    let tally = timeline.tally();
    assert_eq!(tally.n300, 10);
    assert_eq!(tally.misses, 0);
    assert_eq!(tally.max_combo, 10);
    assert_eq!(tally.combo, 10);
    assert!((tally.accuracy() - 1.0).abs() < f64::EPSILON);

    let judged = timeline
        .events()
        .iter()
        .filter(|event| matches!(event, PlayEvent::Judgement(event) if event.result == HitResult::N300))
        .count();

    assert_eq!(judged, 10);

    // Drain runs between the circles, so a perfect play ends near the health
    // of the calibration's perfect test play instead of a full bar.
    let health = timeline.health().value();
    let expected = timeline.drain_rate().final_health;

    assert!(health <= 1.0, "{health}");
    assert!(health >= expected - 0.01, "{health} vs {expected}");
    assert!(!timeline.is_failed());

    let full = Difficulty::new().calculate(&map).unwrap();
    let mut last = 0.0;

    rosu_play::osu::difficulty::gradual(&Difficulty::new(), &map, |_, attrs| last = attrs.stars).unwrap();

    assert!((last - full.stars).abs() < 1e-9);
}

#[test]
fn no_clicks() {
    let map = common::ten_circles();
    let mut timeline = Timeline::new(&map, GameMods::default(), PlayConfig::default()).unwrap();

    let last_start = map.hit_objects[9].start_time;
    let mut prev_health = timeline.health().value();
    let mut time = 0.0;

    while time < last_start + 500.0 {
        time += 10.0;
        timeline.simulate_to(time);

        let health = timeline.health().value();
        assert!(health <= prev_health + 1e-12, "health rose at {time}");
        prev_health = health;
    }

    timeline.simulate_to_end();

    assert_eq!(timeline.tally().misses, 10);
    assert_eq!(timeline.tally().max_combo, 0);
    assert!(timeline.is_failed());

    let fails = timeline
        .events()
        .iter()
        .filter(|event| matches!(event, PlayEvent::Failed { .. }))
        .count();

    assert_eq!(fails, 1);
}

#[test]
fn no_fail_survives() {
    let map = common::ten_circles();

    let mut timeline = Timeline::new(&map, GameMods::from(1_u32), PlayConfig::default()).unwrap();
    timeline.simulate_to_end();

    assert_eq!(timeline.tally().misses, 10);
    assert!(!timeline.is_failed());
}

#[test]
fn replay_is_deterministic() {
    let map = common::map(vec![
        common::circle(100.0, 100.0, 1000.0),
        common::slider(150.0, 200.0, 1500.0, 200.0, 1),
        common::circle(300.0, 300.0, 4000.0),
        common::spinner(5000.0, 3000.0),
        common::circle(400.0, 100.0, 8500.0),
    ]);

    let mut frames: Vec<_> = (0..600)
        .map(|i| {
            let time = 500.0 + 14.0 * f64::from(i);
            let angle = time / 70.0;
            let x = 256.0 + 80.0 * angle.cos() as f32;
            let y = 192.0 + 80.0 * angle.sin() as f32;
            let keys = if (i / 9) % 3 == 0 { 0 } else { 4 };

            ReplayFrame::new(time, x, y, keys)
        })
        .collect();

    frames.extend(common::click_all(&map));

    let run = || {
        let mut timeline = Timeline::new(&map, GameMods::default(), PlayConfig::default())
            .unwrap()
            .with_input(ReplayInput::new(frames.clone()));

        timeline.simulate_to_end();

        (
            timeline.take_events(),
            timeline.tally().clone(),
            timeline.health().value(),
        )
    };

    let (events_a, tally_a, health_a) = run();
    let (events_b, tally_b, health_b) = run();

    assert!(!events_a.is_empty());
    assert_eq!(events_a, events_b);
    assert_eq!(tally_a, tally_b);
    assert_eq!(health_a.to_bits(), health_b.to_bits());
}

#[test]
fn live_and_replay_agree() {
    use rosu_play::play::{LiveInput, ManualClock};

    let map = common::ten_circles();
    let frames = common::click_all(&map);

    let mut live = Timeline::new(&map, GameMods::default(), PlayConfig::default())
        .unwrap()
        .with_input(LiveInput::recording());

    let mut clock = ManualClock::new(10_000.0, 1.0);
    live.start(&mut clock);

    let mut pending = frames.iter().copied().peekable();

    while !live.is_finished() {
        clock.advance(8.0);

        let horizon = live.time() + 8.0;

        while let Some(frame) = pending.next_if(|frame| frame.time <= horizon) {
            live.input_mut().set(frame.time, frame.pos, frame.keys);
        }

        live.update(&mut clock).unwrap();
        assert!(clock.real_time < 60_000.0, "live session never finished");
    }

    let recorded = live.input_mut().take_recorded();

    let mut replay = Timeline::new(&map, GameMods::default(), PlayConfig::default())
        .unwrap()
        .with_input(ReplayInput::new(recorded));

    replay.simulate_to_end();

    assert_eq!(live.tally().n300, replay.tally().n300);
    assert_eq!(live.tally(), replay.tally());
}

fn circle_map(gaps: &[f64], positions: &[(f32, f32)]) -> rosu_play::Beatmap {
    let mut time = 1000.0;

    let objects = gaps
        .iter()
        .zip(positions)
        .map(|(gap, &(x, y))| {
            time += gap;

            common::circle(x, y, time)
        })
        .collect();

    common::map(objects)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn own_note_lock_keeps_finished_prefix(
        objects in prop::collection::vec((100.0..400.0_f64, 40.0..470.0_f32, 40.0..340.0_f32, -30.0..30.0_f64, any::<bool>()), 3..12),
    ) {
        let gaps: Vec<_> = objects.iter().map(|o| o.0).collect();
        let positions: Vec<_> = objects.iter().map(|o| (o.1, o.2)).collect();
        let map = circle_map(&gaps, &positions);

        let frames = map
            .hit_objects
            .iter()
            .zip(objects.iter())
            .zip(0..)
            .filter(|((_, o), _)| o.4)
            .flat_map(|((h, o), i)| {
                let key = if i % 2 == 0 { 4 } else { 8 };
                let time = h.start_time + o.3;

                [
                    ReplayFrame::new(time, h.pos.x, h.pos.y, key),
                    ReplayFrame::new(time + 20.0, h.pos.x, h.pos.y, 0),
                ]
            })
            .collect();

        let config = PlayConfig::new().note_lock(NoteLock::Own);

        let mut timeline = Timeline::new(&map, GameMods::default(), config)
            .unwrap()
            .with_input(ReplayInput::new(frames));

        let end = timeline.end_time() + 500.0;
        let mut time = 0.0;

        while time < end {
            time += 16.0;
            timeline.simulate_to(time);

            let finished: Vec<_> = (0..map.hit_objects.len())
                .map(|i| timeline.is_object_finished(i).unwrap_or(false))
                .collect();

            if let Some(last) = finished.iter().rposition(|&done| done) {
                prop_assert!(finished[..last].iter().all(|&done| done), "{finished:?} at {time}");
            }
        }

        prop_assert_eq!(timeline.tally().n_objects() as usize, map.hit_objects.len());
    }
}
