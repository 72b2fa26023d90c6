/// Number of faces around the vertical axis of the cube
pub const FACE_COUNT: i64 = 4;

/// Rotation between two neighbouring faces, in degrees
pub const QUARTER_TURN: f64 = 90.0;

/// Modulo that is never negative, so `-1` lands on the last face
pub fn normalized_mod(value: i64, modulus: i64) -> i64 {
    value.rem_euclid(modulus)
}

/// Face slot (0..4) that displays a logical index
pub fn face_for_index(index: i64) -> usize {
    normalized_mod(index, FACE_COUNT) as usize
}

/// Resting rotation for a logical index
pub fn rotation_for_index(index: i64) -> f64 {
    index as f64 * -QUARTER_TURN
}

/// Maps `value` from `domain` onto `range` without clamping
pub fn interpolate(value: f64, domain: (f64, f64), range: (f64, f64)) -> f64 {
    let span = domain.1 - domain.0;
    if span == 0.0 {
        return range.0;
    }
    let t = (value - domain.0) / span;
    range.0 + (range.1 - range.0) * t
}

/// Distance from the nearest multiple of 90 degrees, normalized to `[0, 1]`
/// where 45 degrees is 1.0.
pub fn half_triangle_wave(diff: f64) -> f64 {
    let half = QUARTER_TURN / 2.0;
    if diff <= half {
        diff / half
    } else {
        (QUARTER_TURN - diff) / half
    }
}

/// Ease-out circular curve, `1 - sin(acos(t))`
pub fn ease_out_circ(t: f64) -> f64 {
    1.0 - t.clamp(0.0, 1.0).acos().sin()
}

/// Depth scale for the whole cube at rotation `x` (degrees).
///
/// Square-on faces render at exactly 1.0; the scale reaches `scale_range.1`
/// half way between two faces.
pub fn scale_for_rotation(x: f64, scale_range: (f64, f64)) -> f64 {
    let diff = x.abs() % QUARTER_TURN;
    if diff == 0.0 {
        return 1.0;
    }
    let eased = ease_out_circ(half_triangle_wave(diff));
    interpolate(eased, (0.0, 1.0), scale_range)
}

/// Rotation matrix around the vertical axis
pub fn rotation_y(degrees: f64) -> [[f64; 3]; 3] {
    let (sin_a, cos_a) = degrees.to_radians().sin_cos();
    [[cos_a, 0.0, sin_a], [0.0, 1.0, 0.0], [-sin_a, 0.0, cos_a]]
}

/// Multiplies a 3x3 matrix by a 3-dimensional vector
pub fn multiply_matrix_vector(matrix: &[[f64; 3]; 3], vector: &[f64; 3]) -> [f64; 3] {
    let mut result = [0.0; 3];
    for i in 0..3 {
        for j in 0..3 {
            result[i] += matrix[i][j] * vector[j];
        }
    }
    result
}

/// Easing curves available to rotation transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    EaseOutCubic,
    EaseInOutCubic,
}

impl Easing {
    /// Apply the curve to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}
