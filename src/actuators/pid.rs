//! Joint PID controller.

use super::PidGains;

/// PID acting on `error = measured - target`.
///
/// The integral term is clamped to `[i_min, i_max]` and the stored error
/// integral is back-computed from the clamped term, so the integrator never
/// winds past its limit. Command limits of zero leave that side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pid {
    gains: PidGains,
    integral: f64,
    last_error: f64,
    command: f64,
}

impl Pid {
    /// Controller with zeroed state.
    #[must_use]
    pub const fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            last_error: 0.0,
            command: 0.0,
        }
    }

    /// Gains in use
    #[must_use]
    pub const fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Last command produced
    #[must_use]
    pub const fn command(&self) -> f64 {
        self.command
    }

    /// Clear the integrator and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.command = 0.0;
    }

    /// Advance by `dt` seconds and return the new command.
    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        if dt == 0.0 || !dt.is_finite() || !error.is_finite() {
            return 0.0;
        }
        let g = &self.gains;

        let p_term = g.p * error;

        self.integral += dt * error;
        let i_term = (g.i * self.integral).clamp(g.i_min.min(g.i_max), g.i_max.max(g.i_min));
        if g.i.abs() > f64::EPSILON {
            self.integral = i_term / g.i;
        }

        let d_term = g.d * (error - self.last_error) / dt;
        self.last_error = error;

        let mut command = -p_term - i_term - d_term;
        if g.cmd_max.abs() > f64::EPSILON {
            command = command.min(g.cmd_max);
        }
        if g.cmd_min.abs() > f64::EPSILON {
            command = command.max(g.cmd_min);
        }

        self.command = command;
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(p: f64, i: f64, d: f64) -> PidGains {
        PidGains {
            p,
            i,
            d,
            ..PidGains::default()
        }
    }

    #[test]
    fn proportional_opposes_error() {
        let mut pid = Pid::new(gains(2.0, 0.0, 0.0));
        assert!((pid.update(0.5, 0.01) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_dt_or_nan_yields_zero() {
        let mut pid = Pid::new(gains(1.0, 1.0, 1.0));
        assert_eq!(pid.update(1.0, 0.0), 0.0);
        assert_eq!(pid.update(f64::NAN, 0.01), 0.0);
        assert_eq!(pid.update(f64::INFINITY, 0.01), 0.0);
    }

    #[test]
    fn integral_is_clamped() {
        let mut pid = Pid::new(PidGains {
            i: 1.0,
            i_max: 0.5,
            i_min: -0.5,
            ..PidGains::default()
        });
        for _ in 0..100 {
            pid.update(1.0, 0.1);
        }
        assert!((pid.command() + 0.5).abs() < 1e-12);

        // Clamped integrator recovers immediately once the error flips.
        let cmd = pid.update(-1.0, 0.1);
        assert!((cmd + 0.4).abs() < 1e-12);
    }

    #[test]
    fn derivative_uses_error_change() {
        let mut pid = Pid::new(gains(0.0, 0.0, 1.0));
        pid.update(0.0, 0.1);
        assert!((pid.update(1.0, 0.1) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn command_limits_zero_means_unbounded() {
        let mut bounded = Pid::new(PidGains {
            p: 10.0,
            cmd_max: 3.0,
            cmd_min: -3.0,
            ..PidGains::default()
        });
        assert!((bounded.update(1.0, 0.01) + 3.0).abs() < 1e-12);
        assert!((bounded.update(-1.0, 0.01) - 3.0).abs() < 1e-12);

        let mut free = Pid::new(gains(10.0, 0.0, 0.0));
        assert!((free.update(1.0, 0.01) + 10.0).abs() < 1e-12);
    }
}
