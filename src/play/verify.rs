use crate::{model::beatmap::Beatmap, GameMods};

use super::{
    config::PlayConfig, error::LoadError, replay::ReplayInput, tally::Tally, timeline::Timeline,
};

/// Statistics stored alongside a recorded score.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordedStats {
    pub n300: u32,
    pub n100: u32,
    pub n50: u32,
    pub misses: u32,
    pub n_geki: u32,
    pub n_katu: u32,
    pub max_combo: u32,
}

impl From<&Tally> for RecordedStats {
    fn from(tally: &Tally) -> Self {
        Self {
            n300: tally.n300,
            n100: tally.n100,
            n50: tally.n50,
            misses: tally.misses,
            n_geki: tally.n_geki,
            n_katu: tally.n_katu,
            max_combo: tally.max_combo,
        }
    }
}

/// A statistic on which the recorded score and its simulation disagree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Discrepancy {
    pub field: &'static str,
    pub recorded: u32,
    pub simulated: u32,
}

/// Outcome of re-simulating a recorded score.
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    pub tally: Tally,
    pub failed: bool,
    pub discrepancies: Vec<Discrepancy>,
}

impl Verification {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Compare recorded statistics with a simulated tally.
///
/// Every mismatch is logged. Neither side is modified.
pub fn compare(recorded: &RecordedStats, simulated: &Tally) -> Vec<Discrepancy> {
    let simulated = RecordedStats::from(simulated);

    let fields = [
        ("n300", recorded.n300, simulated.n300),
        ("n100", recorded.n100, simulated.n100),
        ("n50", recorded.n50, simulated.n50),
        ("misses", recorded.misses, simulated.misses),
        ("n_geki", recorded.n_geki, simulated.n_geki),
        ("n_katu", recorded.n_katu, simulated.n_katu),
        ("max_combo", recorded.max_combo, simulated.max_combo),
    ];

    fields
        .into_iter()
        .filter(|(_, recorded, simulated)| recorded != simulated)
        .map(|(field, recorded, simulated)| {
            tracing::warn!(field, recorded, simulated, "replay disagrees with its score");

            Discrepancy {
                field,
                recorded,
                simulated,
            }
        })
        .collect()
}

/// Play `replay` on `map` until the end and compare the outcome with
/// `recorded`.
pub fn verify_replay(
    map: &Beatmap,
    mods: impl Into<GameMods>,
    config: PlayConfig,
    replay: ReplayInput,
    recorded: &RecordedStats,
) -> Result<Verification, LoadError> {
    let mut timeline = Timeline::new(map, mods, config)?.with_input(replay);
    timeline.simulate_to_end();

    let tally = timeline.tally().clone();
    let discrepancies = compare(recorded, &tally);

    Ok(Verification {
        failed: timeline.is_failed(),
        tally,
        discrepancies,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            control_point::TimingPoint,
            hit_object::{HitObject, HitObjectKind, Pos},
        },
        play::input::ReplayFrame,
    };

    use super::*;

    #[test]
    fn reports_every_mismatch() {
        let recorded = RecordedStats {
            n300: 10,
            max_combo: 10,
            ..Default::default()
        };

        let simulated = Tally {
            n300: 9,
            misses: 1,
            max_combo: 10,
            ..Default::default()
        };

        let discrepancies = compare(&recorded, &simulated);

        assert_eq!(
            discrepancies,
            [
                Discrepancy {
                    field: "n300",
                    recorded: 10,
                    simulated: 9,
                },
                Discrepancy {
                    field: "misses",
                    recorded: 0,
                    simulated: 1,
                },
            ]
        );
    }

    #[test]
    fn honest_replay_verifies() {
        let map = Beatmap {
            timing_points: vec![TimingPoint::new(0.0, 500.0)],
            hit_objects: (0..3)
                .map(|i| HitObject {
                    pos: Pos::new(100.0 + 100.0 * i as f32, 192.0),
                    start_time: 1000.0 + 500.0 * f64::from(i),
                    new_combo: i == 0,
                    kind: HitObjectKind::Circle,
                })
                .collect(),
            ..Default::default()
        };

        let frames = map
            .hit_objects
            .iter()
            .flat_map(|h| {
                [
                    ReplayFrame::new(h.start_time, h.pos.x, h.pos.y, 4),
                    ReplayFrame::new(h.start_time + 40.0, h.pos.x, h.pos.y, 0),
                ]
            })
            .collect();

        let recorded = RecordedStats {
            n300: 3,
            max_combo: 3,
            n_geki: 1,
            ..Default::default()
        };

        let verification = verify_replay(
            &map,
            GameMods::default(),
            PlayConfig::default(),
            ReplayInput::new(frames),
            &recorded,
        )
        .unwrap();

        assert!(verification.is_consistent(), "{:?}", verification.discrepancies);
        assert!(!verification.failed);
    }
}
