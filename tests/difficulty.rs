use proptest::prelude::*;
use rosu_play::{osu::difficulty::gradual, Beatmap, Difficulty, GameMods, Performance};

mod common;

fn mixed_map() -> Beatmap {
    let mut objects = Vec::new();
    let mut time = 800.0;

    for i in 0..30 {
        let x = 60.0 + 13.0 * i as f32;
        let y = if i % 3 == 0 { 90.0 } else { 280.0 };

        if i % 7 == 3 {
            objects.push(common::slider(x.min(250.0), y, time, 120.0, 0));
            time += 900.0;
        } else {
            objects.push(common::circle(x, y, time));
            time += 180.0;
        }
    }

    common::map(objects)
}

#[test]
fn gradual_matches_truncated_calculations() {
    let map = mixed_map();
    let difficulty = Difficulty::new().mods(GameMods::from(16_u32));

    let mut gradual_stars = Vec::new();
    gradual(&difficulty, &map, |_, attrs| gradual_stars.push(attrs.stars)).unwrap();

    for n in [1, 5, 12, 29] {
        let attrs = difficulty.clone().passed_objects(n).calculate(&map).unwrap();

        assert!(
            (gradual_stars[n as usize - 1] - attrs.stars).abs() < 1e-9,
            "mismatch after {n} objects"
        );
    }
}

#[test]
fn performance_follows_misses() {
    let map = common::ten_circles();
    let attrs = Difficulty::new().calculate(&map).unwrap();

    let fc = Performance::new(attrs.clone()).combo(10).calculate().pp;
    let one_miss = Performance::new(attrs).combo(5).misses(1).calculate().pp;

    assert!(fc > 0.0);
    assert!(one_miss < fc);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn strains_of_prefix_are_a_prefix(n in 1_u32..29, extra in 0_u32..10, dt in any::<bool>()) {
        let map = mixed_map();
        let mods = if dt { 64_u32 } else { 0 };
        let m = (n + extra).min(29);

        let short = Difficulty::new().mods(mods).passed_objects(n).strains(&map).unwrap();
        let long = Difficulty::new().mods(mods).passed_objects(m).strains(&map).unwrap();

        let n = n as usize;
        prop_assert_eq!(&short.object_aim[..], &long.object_aim[..n]);
        prop_assert_eq!(&short.object_aim_no_sliders[..], &long.object_aim_no_sliders[..n]);
        prop_assert_eq!(&short.object_speed[..], &long.object_speed[..n]);
    }
}
