use std::{num::ParseFloatError, str::FromStr};

use super::input::{InputSource, Keys, ReplayFrame};

/// Frame text could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ReplayParseError {
    #[error("frame {idx} has {count} fields, expected 4")]
    FieldCount { idx: usize, count: usize },
    #[error("frame {idx} has an invalid number")]
    Number {
        idx: usize,
        #[source]
        source: ParseFloatError,
    },
    #[error("frame {idx} has invalid keys `{keys}`")]
    Keys { idx: usize, keys: String },
}

impl ReplayParseError {
    /// Stable numeric code for callers that only carry integers.
    pub const fn code(&self) -> i32 {
        match self {
            Self::FieldCount { .. } => 20,
            Self::Number { .. } => 21,
            Self::Keys { .. } => 22,
        }
    }
}

/// Recorded frames, consumed in time order.
#[derive(Clone, Debug, Default)]
pub struct ReplayInput {
    frames: Vec<ReplayFrame>,
    next: usize,
}

impl ReplayInput {
    /// Time delta marking the frame that carries the RNG seed.
    pub const SEED_DELTA: f64 = -12345.0;

    const LEADING_SENTINELS: usize = 2;

    /// Frames are sorted by time. Frames with equal times keep their order.
    pub fn new(mut frames: Vec<ReplayFrame>) -> Self {
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));

        Self { frames, next: 0 }
    }

    /// Parse `delta|x|y|keys,` records where `delta` is relative to the
    /// previous frame.
    pub fn parse(text: &str) -> Result<Self, ReplayParseError> {
        let mut frames = Vec::new();
        let mut time = 0.0;

        let records = text
            .split(',')
            .map(str::trim)
            .filter(|record| !record.is_empty());

        for (idx, record) in records.enumerate() {
            let fields: Vec<_> = record.split('|').collect();

            let [delta, x, y, keys] = fields[..] else {
                return Err(ReplayParseError::FieldCount {
                    idx,
                    count: fields.len(),
                });
            };

            let number = |s: &str| {
                f64::from_str(s.trim()).map_err(|source| ReplayParseError::Number { idx, source })
            };

            let delta = number(delta)?;

            if (delta - Self::SEED_DELTA).abs() < f64::EPSILON {
                continue;
            }

            let x = number(x)?;
            let y = number(y)?;

            let keys = keys
                .trim()
                .parse::<u32>()
                .map(Keys::from_bits)
                .map_err(|_| ReplayParseError::Keys {
                    idx,
                    keys: keys.to_owned(),
                })?;

            time += delta;

            if idx < Self::LEADING_SENTINELS && !keys.any_held() {
                continue;
            }

            frames.push(ReplayFrame::new(time, x as f32, y as f32, keys.bits()));
        }

        Ok(Self::new(frames))
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<ReplayFrame> {
        self.frames
    }

    /// Time of the last frame.
    pub fn end_time(&self) -> Option<f64> {
        self.frames.last().map(|frame| frame.time)
    }
}

impl InputSource for ReplayInput {
    fn next_frame(&mut self, until: f64) -> Option<ReplayFrame> {
        let frame = *self.frames.get(self.next)?;

        if frame.time > until {
            return None;
        }

        self.next += 1;

        Some(frame)
    }

    fn seek(&mut self, time: f64) -> Option<ReplayFrame> {
        self.next = self.frames.partition_point(|frame| frame.time <= time);

        self.next.checked_sub(1).map(|idx| self.frames[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_sentinels() {
        let text = "0|256|-500|0,-1|256|-500|0,-12345|0|0|7433,20|100|150|1,16.5|101|150|0,";
        let replay = ReplayInput::parse(text).unwrap();
        let frames = replay.frames();

        assert_eq!(frames.len(), 2);
        assert!((frames[0].time - 19.0).abs() < f64::EPSILON);
        assert!((frames[1].time - 35.5).abs() < f64::EPSILON);
        assert_eq!(frames[0].keys, Keys::M1);
    }

    #[test]
    fn parse_errors() {
        let err = ReplayInput::parse("1|2|3").unwrap_err();
        assert!(matches!(err, ReplayParseError::FieldCount { idx: 0, count: 3 }));
        assert_eq!(err.code(), 20);

        let err = ReplayInput::parse("1|2|3|4,x|2|3|4").unwrap_err();
        assert!(matches!(err, ReplayParseError::Number { idx: 1, .. }));

        let err = ReplayInput::parse("1|2|3|-4").unwrap_err();
        assert!(matches!(err, ReplayParseError::Keys { idx: 0, .. }));
    }

    #[test]
    fn seek_resumes_after_time() {
        let mut replay = ReplayInput::new(vec![
            ReplayFrame::new(30.0, 0.0, 0.0, 0),
            ReplayFrame::new(10.0, 0.0, 0.0, 1),
            ReplayFrame::new(20.0, 0.0, 0.0, 0),
        ]);

        let state = replay.seek(15.0).unwrap();
        assert_eq!(state.keys, Keys::M1);

        let next = replay.next_frame(100.0).unwrap();
        assert!((next.time - 20.0).abs() < f64::EPSILON);
    }
}
