//! Earth magnetic field model.

use nalgebra::{UnitQuaternion, Vector3};

/// Field in the magnetic-north frame (G). The east component is zero so the
/// declination alone sets the horizontal direction.
pub const FIELD_MAGNETIC_NORTH: Vector3<f64> = Vector3::new(0.21523, 0.0, -0.42741);

/// Geomagnetic north pole latitude of the centred dipole (deg)
pub const DIPOLE_POLE_LAT_DEG: f64 = 80.65;
/// Geomagnetic north pole longitude of the centred dipole (deg)
pub const DIPOLE_POLE_LON_DEG: f64 = -72.68;

/// Source of magnetic declination.
pub trait DeclinationModel {
    /// Declination (rad, positive east) at a geodetic position given in radians.
    fn declination(&self, lat_rad: f64, lon_rad: f64) -> f64;
}

/// Centred-dipole approximation: declination is the great-circle bearing
/// from the position to the geomagnetic pole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleDeclination {
    pole_lat: f64,
    pole_lon: f64,
}

impl Default for DipoleDeclination {
    fn default() -> Self {
        Self::new(DIPOLE_POLE_LAT_DEG, DIPOLE_POLE_LON_DEG)
    }
}

impl DipoleDeclination {
    /// Dipole with its north pole at the given position (deg).
    #[must_use]
    pub fn new(pole_lat_deg: f64, pole_lon_deg: f64) -> Self {
        Self {
            pole_lat: pole_lat_deg.to_radians(),
            pole_lon: pole_lon_deg.to_radians(),
        }
    }
}

impl DeclinationModel for DipoleDeclination {
    fn declination(&self, lat_rad: f64, lon_rad: f64) -> f64 {
        let d_lon = self.pole_lon - lon_rad;
        let y = d_lon.sin() * self.pole_lat.cos();
        let x = lat_rad.cos() * self.pole_lat.sin()
            - lat_rad.sin() * self.pole_lat.cos() * d_lon.cos();
        y.atan2(x)
    }
}

/// Constant declination, independent of position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedDeclination(pub f64);

impl DeclinationModel for FixedDeclination {
    fn declination(&self, _lat_rad: f64, _lon_rad: f64) -> f64 {
        self.0
    }
}

/// Field in NED for a given declination.
#[must_use]
pub fn field_ned(declination: f64) -> Vector3<f64> {
    UnitQuaternion::from_euler_angles(0.0, 0.0, declination) * FIELD_MAGNETIC_NORTH
}
