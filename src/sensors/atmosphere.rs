//! ISA troposphere model (valid up to 11 km above MSL).

/// Sea-level temperature (K)
pub const TEMPERATURE_MSL: f64 = 288.0;
/// Temperature lapse rate (K/m)
pub const LAPSE_RATE: f64 = 0.0065;
/// Sea-level pressure (Pa)
pub const PRESSURE_MSL: f64 = 101_325.0;
/// Sea-level density (kg/m³)
pub const DENSITY_MSL: f64 = 1.225;

const PRESSURE_EXPONENT: f64 = 5.256;
const DENSITY_EXPONENT: f64 = 4.256;
const KELVIN_OFFSET: f64 = 273.0;

/// Atmospheric state at one altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    /// Static temperature (K)
    pub temperature: f64,
    /// Static pressure (Pa)
    pub pressure: f64,
    /// Air density (kg/m³)
    pub density: f64,
}

impl Atmosphere {
    /// Evaluate the model at `alt_msl` meters.
    #[must_use]
    pub fn at_altitude(alt_msl: f64) -> Self {
        let temperature = TEMPERATURE_MSL - LAPSE_RATE * alt_msl;
        let ratio = TEMPERATURE_MSL / temperature;
        Self {
            temperature,
            pressure: PRESSURE_MSL / ratio.powf(PRESSURE_EXPONENT),
            density: DENSITY_MSL / ratio.powf(DENSITY_EXPONENT),
        }
    }

    /// Temperature in °C
    #[must_use]
    pub fn temperature_celsius(&self) -> f64 {
        self.temperature - KELVIN_OFFSET
    }

    /// Dynamic pressure in hPa for an airspeed in m/s.
    #[must_use]
    pub fn differential_pressure_hpa(&self, airspeed: f64) -> f64 {
        0.005 * self.density * airspeed * airspeed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_matches_standard() {
        let atmo = Atmosphere::at_altitude(0.0);
        assert!((atmo.pressure - PRESSURE_MSL).abs() < 1e-9);
        assert!((atmo.density - DENSITY_MSL).abs() < 1e-12);
        assert!((atmo.temperature_celsius() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn pressure_falls_with_altitude() {
        let low = Atmosphere::at_altitude(488.0);
        let high = Atmosphere::at_altitude(1500.0);
        assert!(high.pressure < low.pressure);
        assert!(high.density < low.density);
        // Roughly 95.6 kPa at Zurich's elevation.
        assert!((low.pressure - 95_595.0).abs() < 20.0);
    }

    #[test]
    fn dynamic_pressure_grows_quadratically() {
        let atmo = Atmosphere::at_altitude(0.0);
        let q1 = atmo.differential_pressure_hpa(10.0);
        let q2 = atmo.differential_pressure_hpa(20.0);
        assert!((q2 / q1 - 4.0).abs() < 1e-12);
    }
}
