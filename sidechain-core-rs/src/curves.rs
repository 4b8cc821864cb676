//! Compiled-in envelope shapes.
//!
//! Every curve is 16 points in the MIDI value range `0..=127` and is expected
//! to end at (or near) the ceiling, so playback finishes at full volume.

/// Number of points in every curve.
pub const CURVE_LEN: usize = 16;

/// Number of compiled-in curves. Valid curve ids are `0..N_CURVES`.
pub const N_CURVES: usize = 4;

/// Output value that means "no attenuation".
pub const NEUTRAL: u8 = 127;

/// Display names for the curves, indexed by curve id.
pub const CURVE_NAMES: [&str; N_CURVES] = ["Linear", "C2", "C3", "C4"];

/// Raw curve points, indexed by `[curve_id][step]`.
pub const CURVES: [[u8; CURVE_LEN]; N_CURVES] = [
    // Linear
    [
        0, 8, 16, 24, 32, 40, 48, 56, 64, 72, 80, 88, 96, 104, 112, 120,
    ],
    // C2: fast release
    [
        0, 12, 30, 60, 90, 105, 115, 120, 123, 125, 126, 127, 127, 127, 127, 127,
    ],
    // C3: slow start
    [
        0, 1, 3, 10, 18, 30, 50, 70, 90, 105, 118, 123, 125, 127, 127, 127,
    ],
    // C4: fastest release
    [
        0, 24, 60, 85, 105, 115, 122, 125, 127, 127, 127, 127, 127, 127, 127, 127,
    ],
];

/// Returns the raw points of curve `id`.
///
/// # Panics
///
/// Panics if `id >= N_CURVES`. Curve ids come from validated presets, so an
/// out-of-range id is a programming error.
pub fn curve(id: usize) -> &'static [u8; CURVE_LEN] {
    &CURVES[id]
}

/// Returns the display name of curve `id`, or `"?"` for an unknown id.
pub fn curve_name(id: usize) -> &'static str {
    CURVE_NAMES.get(id).copied().unwrap_or("?")
}

/// Apply `depth` to curve `id`, producing the table actually played.
///
/// Depth `0` overrides the whole curve with the ceiling. Any other depth adds
/// `(max_depth + 1 - depth) * 8` to every point, saturating at [`NEUTRAL`].
pub fn modulate(id: usize, depth: i32, max_depth: i32) -> [u8; CURVE_LEN] {
    let offset = if depth > 0 {
        (max_depth + 1 - depth) * 8
    } else {
        NEUTRAL as i32
    };

    let raw = curve(id);
    core::array::from_fn(|i| (raw[i] as i32 + offset).min(NEUTRAL as i32) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_DEPTH: i32 = 15;

    #[test]
    fn every_curve_stays_in_midi_range() {
        for c in &CURVES {
            assert!(c.iter().all(|&p| p <= NEUTRAL));
        }
    }

    #[test]
    fn depth_zero_is_flat_ceiling() {
        for id in 0..N_CURVES {
            assert_eq!(modulate(id, 0, MAX_DEPTH), [NEUTRAL; CURVE_LEN]);
        }
    }

    #[test]
    fn max_depth_on_linear_shifts_by_eight() {
        let m = modulate(0, 15, MAX_DEPTH);
        assert_eq!(m[0], 8);
        assert_eq!(m[1], 16);
        assert_eq!(m[14], 120);
        assert_eq!(m[15], 127); // 120 + 8 saturates
    }

    #[test]
    fn depth_twelve_on_linear() {
        // (15 + 1 - 12) * 8 = 32
        let m = modulate(0, 12, MAX_DEPTH);
        assert_eq!(&m[..4], &[32, 40, 48, 56]);
        assert!(m[12..].iter().all(|&p| p == 127));
    }

    #[test]
    fn depth_one_saturates_most_points() {
        // offset = 120
        let m = modulate(2, 1, MAX_DEPTH);
        assert_eq!(m[0], 120);
        assert_eq!(m[1], 121);
        assert_eq!(m[3], 127);
    }

    #[test]
    fn curve_names_lookup() {
        assert_eq!(curve_name(0), "Linear");
        assert_eq!(curve_name(3), "C4");
        assert_eq!(curve_name(9), "?");
    }
}
