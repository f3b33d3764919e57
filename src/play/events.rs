use super::result::HitResultEvent;

/// Something the host should react to.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayEvent {
    Judgement(HitResultEvent),
    /// The combo broke without a terminal judgement, e.g. by letting go of
    /// a slider.
    SliderBreak { object: Option<usize>, time: f64 },
    Sound(SoundCue),
    /// The play is over.
    Failed { time: f64 },
    /// Health ran out without drain kill. Play continues.
    Died { time: f64 },
    /// Health climbed back up after dying.
    Revived { time: f64 },
    /// Easy saved the player from failing.
    Rescued { time: f64 },
    /// Perfect or sudden death ended the play. Judging stops until the
    /// timeline is restarted.
    RestartRequested { time: f64 },
    Finished { time: f64 },
}

/// Fire-and-forget sound requests.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    SectionPass,
    SectionFail,
    SpinnerBonus,
    Fail,
}
