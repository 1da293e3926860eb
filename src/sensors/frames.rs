//! Reference-frame conventions.
//!
//! - `g`: simulation world, ENU (east, north, up)
//! - `r`: simulation body, FLU (forward, left, up)
//! - `b`: autopilot body, FRD (forward, right, down)
//! - `n`: autopilot world, NED (north, east, down)

use std::f64::consts::FRAC_1_SQRT_2;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Rotation between FLU and FRD: 180° about the forward axis.
#[must_use]
pub fn q_br() -> UnitQuaternion<f64> {
    UnitQuaternion::new_unchecked(Quaternion::new(0.0, 1.0, 0.0, 0.0))
}

/// Rotation taking ENU vectors into NED: swap X/Y, negate Z.
#[must_use]
pub fn q_ng() -> UnitQuaternion<f64> {
    UnitQuaternion::new_unchecked(Quaternion::new(0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0))
}

/// Vehicle attitude as NED→FRD given the simulation's ENU→FLU attitude.
#[must_use]
pub fn attitude_ned_frd(q_gr: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    q_ng() * q_gr * q_br().inverse()
}

/// FLU vector to FRD.
#[must_use]
pub fn flu_to_frd(v: &Vector3<f64>) -> Vector3<f64> {
    q_br() * v
}

/// ENU vector to NED.
#[must_use]
pub fn enu_to_ned(v: &Vector3<f64>) -> Vector3<f64> {
    q_ng() * v
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn flu_to_frd_flips_lateral_axes() {
        let v = flu_to_frd(&Vector3::new(1.0, 2.0, 3.0));
        assert!((v - Vector3::new(1.0, -2.0, -3.0)).norm() < EPS);
    }

    #[test]
    fn enu_to_ned_swaps_horizontal() {
        let v = enu_to_ned(&Vector3::new(1.0, 2.0, 3.0));
        assert!((v - Vector3::new(2.0, 1.0, -3.0)).norm() < EPS);
    }

    #[test]
    fn identity_attitude_is_ninety_degree_yaw() {
        let q = attitude_ned_frd(&UnitQuaternion::identity());
        let expected = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        assert!((q.into_inner() - expected).norm() < EPS);

        // Body forward points east in NED.
        let forward = q * Vector3::x();
        assert!((forward - Vector3::y()).norm() < EPS);
    }
}
