use super::object::OsuDifficultyObject;

/// Fields around the scaling of hit objects.
///
/// All objects of a map share the same scaling so it's only stored once.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScalingFactor {
    /// `NORMALIZED_RADIUS / radius` and then adjusted if `radius < 30`
    pub factor: f32,
    pub radius: f64,
}

impl ScalingFactor {
    // The diameter turns negative beyond this
    const MAX_CS: f64 = 12.142;

    pub fn new(cs: f64) -> Self {
        let radius = crate::osu::circle_diameter(cs.clamp(0.0, Self::MAX_CS)) / 2.0;
        let factor = OsuDifficultyObject::NORMALIZED_RADIUS as f32 / radius as f32;

        let factor_with_small_circle_bonus = if radius < 30.0 {
            factor * (1.0 + (30.0 - radius as f32).min(5.0) / 50.0)
        } else {
            factor
        };

        Self {
            factor: factor_with_small_circle_bonus,
            radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cs_four() {
        let scaling = ScalingFactor::new(4.0);

        // (1 + 0.14) / 2 * 64
        assert!((scaling.radius - 36.48).abs() < 1e-9);
        assert!((f64::from(scaling.factor) - 50.0 / 36.48).abs() < 1e-5);
    }

    #[test]
    fn small_circles_get_a_bonus() {
        let scaling = ScalingFactor::new(10.0);
        let plain = 50.0 / scaling.radius as f32;

        assert!(scaling.radius < 30.0);
        assert!(scaling.factor > plain);
    }
}
