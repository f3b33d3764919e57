use rosu_play::{
    play::{
        verify::{verify_replay, RecordedStats},
        Keys, PlayConfig, ReplayInput, ReplayParseError, Timeline,
    },
    GameMods,
};

mod common;

/// Encode frames the way replay files store them.
fn encode(map: &rosu_play::Beatmap) -> String {
    let mut text = String::from("0|256|-500|0,-1|256|-500|0,");
    let mut prev = -1.0;

    for frame in common::click_all(map) {
        let delta = frame.time - prev;
        prev = frame.time;

        text.push_str(&format!("{delta}|{}|{}|{},", frame.pos.x, frame.pos.y, frame.keys.bits()));
    }

    text.push_str("-12345|0|0|1337,");

    text
}

#[test]
fn parsed_replay_plays_back() {
    let map = common::ten_circles();
    let replay = ReplayInput::parse(&encode(&map)).unwrap();

    assert_eq!(replay.frames().len(), 20);
    assert_eq!(replay.frames()[0].keys, Keys::K1);
    assert!((replay.frames()[0].time - 1000.0).abs() < 1e-9);

    let mut timeline = Timeline::new(&map, GameMods::default(), PlayConfig::default())
        .unwrap()
        .with_input(replay);

    timeline.simulate_to_end();
    assert_eq!(timeline.tally().n300, 10);
}

#[test]
fn verification_flags_tampered_scores() {
    let map = common::ten_circles();
    let replay = ReplayInput::parse(&encode(&map)).unwrap();

    let tampered = RecordedStats {
        n300: 10,
        max_combo: 12,
        n_geki: 1,
        ..Default::default()
    };

    let verification = verify_replay(
        &map,
        GameMods::default(),
        PlayConfig::default(),
        replay,
        &tampered,
    )
    .unwrap();

    assert_eq!(verification.discrepancies.len(), 1);
    assert_eq!(verification.discrepancies[0].field, "max_combo");
    assert_eq!(verification.discrepancies[0].recorded, 12);
    assert_eq!(verification.discrepancies[0].simulated, 10);
}

#[test]
fn malformed_text() {
    let err = ReplayInput::parse("16|100|100|1,16|abc|100|0,").unwrap_err();

    assert!(matches!(err, ReplayParseError::Number { idx: 1, .. }));
    assert_eq!(err.code(), 21);
}
