use glam::Vec2;

// --- Helper Functions ---

/// Scales `v` down to `max` if it is longer; shorter vectors pass through.
pub fn limit(v: Vec2, max: f32) -> Vec2 {
    let mag_sq = v.length_squared();
    if mag_sq > max * max {
        v * (max / mag_sq.sqrt())
    } else {
        v
    }
}

/// Clamps into `[lo, hi]` without panicking when the range is inverted
/// (a canvas narrower than an agent); `lo` wins in that case.
pub fn clamp_to_range(value: f32, lo: f32, hi: f32) -> f32 {
    value.min(hi).max(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_only_shrinks() {
        assert_eq!(limit(Vec2::new(3.0, 4.0), 10.0), Vec2::new(3.0, 4.0));
        let limited = limit(Vec2::new(3.0, 4.0), 1.0);
        assert!((limited.length() - 1.0).abs() < 1e-6);
        assert!((limited.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn clamp_handles_inverted_range() {
        assert_eq!(clamp_to_range(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_to_range(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_to_range(5.0, 8.0, 2.0), 8.0);
    }
}
