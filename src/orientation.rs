//! Rotation-vector → rotation angle, for a device lying flat with the camera
//! facing the sky.
//!
//! The pipeline is: rotation vector → 4×4 rotation matrix → axis remap
//! (X stays X, Z becomes Y) → azimuth/pitch/roll → degrees. Only the third
//! angle is reported.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion};

/// Row-major 4×4 rotation matrix. The last row and column are `[0, 0, 0, 1]`.
pub type Matrix4 = [f32; 16];

pub const IDENTITY: Matrix4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// A signed device axis, used to describe a coordinate remap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
    MinusX,
    MinusY,
    MinusZ,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X | Axis::MinusX => 0,
            Axis::Y | Axis::MinusY => 1,
            Axis::Z | Axis::MinusZ => 2,
        }
    }

    fn negative(self) -> bool {
        matches!(self, Axis::MinusX | Axis::MinusY | Axis::MinusZ)
    }
}

/// Azimuth, pitch and roll in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientationAngles {
    pub azimuth: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl OrientationAngles {
    /// `[azimuth, pitch, roll]` in degrees.
    pub fn to_degrees(self) -> [f32; 3] {
        [self.azimuth, self.pitch, self.roll].map(|r| (r as f64).to_degrees() as f32)
    }
}

/// Expands `[x, y, z, w, (accuracy)]` into a rotation matrix. The accuracy
/// component, if present, is ignored.
pub fn rotation_matrix_from_vector(rv: &[f32]) -> Matrix4 {
    assert!(
        (4..=5).contains(&rv.len()),
        "rotation vector must have 4 or 5 components, got {}",
        rv.len()
    );
    // The platform already delivers a unit quaternion.
    let q = UnitQuaternion::new_unchecked(Quaternion::new(rv[3], rv[0], rv[1], rv[2]));
    to_row_major(q.to_rotation_matrix().matrix())
}

/// Re-expresses `r` in a frame whose X axis is the device's `x_axis` and
/// whose Y axis is the device's `y_axis`. The third axis follows from the
/// right-hand rule. Returns `None` if both arguments name the same axis.
pub fn remap_coordinate_system(r: &Matrix4, x_axis: Axis, y_axis: Axis) -> Option<Matrix4> {
    if x_axis.index() == y_axis.index() {
        return None;
    }
    Some(remap(r, x_axis, y_axis))
}

fn remap(r: &Matrix4, x_axis: Axis, y_axis: Axis) -> Matrix4 {
    let (x, y) = (x_axis.index(), y_axis.index());
    let z = 3 - x - y;
    // Z keeps the handedness: flip it when (x, y, z) is not a cyclic order.
    let cyclic = x == (z + 1) % 3 && y == (z + 2) % 3;
    let sx = x_axis.negative();
    let sy = y_axis.negative();
    let sz = sx ^ sy ^ !cyclic;

    // Column k of `r` lands in column x/y/z of the result, with its sign.
    let sign = |neg: bool| -> f32 { if neg { -1.0 } else { 1.0 } };
    let mut p = Matrix3::<f32>::zeros();
    p[(0, x)] = sign(sx);
    p[(1, y)] = sign(sy);
    p[(2, z)] = sign(sz);
    to_row_major(&(from_row_major(r) * p))
}

/// Decomposes a rotation matrix into azimuth, pitch and roll.
pub fn orientation_angles(r: &Matrix4) -> OrientationAngles {
    let m = from_row_major(r).cast::<f64>();
    OrientationAngles {
        azimuth: m[(0, 1)].atan2(m[(1, 1)]) as f32,
        pitch: (-m[(2, 1)]).asin() as f32,
        roll: (-m[(2, 0)]).atan2(m[(2, 2)]) as f32,
    }
}

fn from_row_major(r: &Matrix4) -> Matrix3<f32> {
    Matrix3::new(r[0], r[1], r[2], r[4], r[5], r[6], r[8], r[9], r[10])
}

fn to_row_major(m: &Matrix3<f32>) -> Matrix4 {
    let mut out = IDENTITY;
    for row in 0..3 {
        for col in 0..3 {
            out[row * 4 + col] = m[(row, col)];
        }
    }
    out
}

/// The reported rotation value, in degrees within (-180, 180].
///
/// Panics unless `rv` has 4 or 5 components.
pub fn rotation_degrees(rv: &[f32]) -> f32 {
    let matrix = rotation_matrix_from_vector(rv);
    let flat = remap(&matrix, Axis::X, Axis::Z);
    let [_azimuth, _pitch, roll] = orientation_angles(&flat).to_degrees();
    normalize_degrees(roll)
}

// atan2 may land on -180 (or a rounding hair past ±180); fold that onto 180
// and turn -0.0 into 0.0 so identical poses print identically.
fn normalize_degrees(deg: f32) -> f32 {
    if deg <= -180.0 || deg > 180.0 {
        180.0
    } else {
        deg + 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = std::f32::consts::FRAC_1_SQRT_2;

    // Device pitched up 90° about X, then rolled by `deg` in the flat frame.
    fn flat_roll(deg: f32) -> [f32; 4] {
        let half = deg.to_radians() / 2.0;
        let (s, c) = half.sin_cos();
        [c * H, s * H, -s * H, c * H]
    }

    fn close(a: &Matrix4, b: &Matrix4) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn identity_vector_gives_identity_matrix() {
        assert_eq!(rotation_matrix_from_vector(&[0.0, 0.0, 0.0, 1.0]), IDENTITY);
    }

    #[test]
    fn accuracy_component_is_ignored() {
        let a = rotation_matrix_from_vector(&[0.1, 0.2, 0.3, 0.927]);
        let b = rotation_matrix_from_vector(&[0.1, 0.2, 0.3, 0.927, 0.05]);
        assert_eq!(a, b);
    }

    #[test]
    fn quarter_turn_about_x() {
        let r = rotation_matrix_from_vector(&[H, 0.0, 0.0, H]);
        #[rustfmt::skip]
        let want = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, -1.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        assert!(close(&r, &want), "{r:?}");
    }

    #[test]
    fn matches_the_closed_form_expansion() {
        let n = (0.1f32 * 0.1 + 0.2 * 0.2 + 0.3 * 0.3 + 0.9 * 0.9).sqrt();
        let [x, y, z, w] = [0.1 / n, 0.2 / n, 0.3 / n, 0.9 / n];
        #[rustfmt::skip]
        let want = [
            1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - z * w), 2.0 * (x * z + y * w), 0.0,
            2.0 * (x * y + z * w), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - x * w), 0.0,
            2.0 * (x * z - y * w), 2.0 * (y * z + x * w), 1.0 - 2.0 * (x * x + y * y), 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        let got = rotation_matrix_from_vector(&[x, y, z, w]);
        assert!(close(&got, &want), "{got:?}");
    }

    #[test]
    fn remap_x_z_of_identity() {
        let out = remap_coordinate_system(&IDENTITY, Axis::X, Axis::Z).unwrap();
        #[rustfmt::skip]
        let want = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, -1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        assert_eq!(out, want);
    }

    #[test]
    fn remap_x_y_is_a_no_op() {
        let r = rotation_matrix_from_vector(&[0.1, 0.2, 0.3, 0.927]);
        assert_eq!(remap_coordinate_system(&r, Axis::X, Axis::Y).unwrap(), r);
    }

    #[test]
    fn remap_keeps_right_handed_frame() {
        // Swapping X and Y must negate Z to stay a rotation.
        let out = remap_coordinate_system(&IDENTITY, Axis::Y, Axis::X).unwrap();
        assert_eq!(out[10], -1.0);
        let out = remap_coordinate_system(&IDENTITY, Axis::MinusX, Axis::MinusY).unwrap();
        assert_eq!(out[10], 1.0);
    }

    #[test]
    fn remap_rejects_repeated_axis() {
        assert!(remap_coordinate_system(&IDENTITY, Axis::Z, Axis::MinusZ).is_none());
    }

    #[test]
    fn pitched_up_device_is_flat_after_remap() {
        let r = rotation_matrix_from_vector(&[H, 0.0, 0.0, H]);
        let flat = remap_coordinate_system(&r, Axis::X, Axis::Z).unwrap();
        assert!(close(&flat, &IDENTITY), "{flat:?}");
    }

    #[test]
    fn identity_angles_are_zero() {
        let a = orientation_angles(&IDENTITY);
        assert_eq!(a.to_degrees(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn identity_rotation_reports_zero() {
        let d = rotation_degrees(&[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(d, 0.0);
        assert!(d.is_sign_positive());
    }

    #[test]
    fn reports_roll_in_flat_frame() {
        for want in [30.0f32, -45.0, 90.0, -120.0, 170.0] {
            let got = rotation_degrees(&flat_roll(want));
            assert!((got - want).abs() < 1e-3, "want {want}, got {got}");
        }
    }

    #[test]
    fn half_turn_folds_to_positive_180() {
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(-0.0).to_bits(), 0.0f32.to_bits());
        // Rounding may leave this a hair short of the fold on either side.
        let got = rotation_degrees(&flat_roll(180.0));
        assert!(180.0 - got.abs() < 1e-3, "got {got}");
    }

    #[test]
    fn output_stays_in_half_open_range() {
        let steps = [-1.0f32, -0.7, -0.3, 0.0, 0.3, 0.7, 1.0];
        for &x in &steps {
            for &y in &steps {
                for &z in &steps {
                    for &w in &steps {
                        let n = (x * x + y * y + z * z + w * w).sqrt();
                        if n == 0.0 {
                            continue;
                        }
                        let d = rotation_degrees(&[x / n, y / n, z / n, w / n]);
                        assert!(d > -180.0 && d <= 180.0, "{d} for {:?}", [x, y, z, w]);
                    }
                }
            }
        }
    }

    #[test]
    fn is_deterministic() {
        let rv = [0.12, -0.56, 0.33, 0.75, 0.01];
        assert_eq!(rotation_degrees(&rv).to_bits(), rotation_degrees(&rv).to_bits());
    }

    #[test]
    #[should_panic(expected = "4 or 5 components")]
    fn short_vector_panics() {
        rotation_degrees(&[0.0, 0.0, 1.0]);
    }
}
