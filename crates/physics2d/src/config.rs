//! # World Configuration
//!
//! Tunables for a [`World`](crate::World): timestep, iteration counts, sleep
//! thresholds and solver tolerances. Every struct has a `Default` and the
//! whole configuration is checked by [`WorldConfig::validate`] before a world
//! accepts it.

use crate::error::{PhysicsError, Result};
use crate::integrator::Integrator;
use crate::math::Vec2;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    pub gravity: Vec2,
    /// Fixed step length in seconds.
    pub timestep: f64,
    /// Velocity iterations per step, `>= 1`.
    pub solver_iterations: usize,
    /// Position-correction iterations per step, `>= 0`.
    pub position_iterations: usize,
    pub sleep: SleepConfig,
    pub solver: SolverConfig,
    /// Amount every broad-phase AABB is grown by, so pairs that are about to
    /// touch still reach the narrow-phase.
    pub aabb_margin: f64,
    /// Linear velocity damping rate (1/s). Zero disables it.
    pub linear_damping: f64,
    /// Angular velocity damping rate (1/s). Zero disables it.
    pub angular_damping: f64,
    pub integrator: Integrator,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SleepConfig {
    pub enabled: bool,
    /// Linear speed (m/s) under which a body counts as resting.
    pub linear_threshold: f64,
    /// Angular speed (rad/s) under which a body counts as resting.
    pub angular_threshold: f64,
    /// Seconds a body must rest before it sleeps.
    pub time_threshold: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Fraction of the penetration error removed per position iteration.
    pub baumgarte: f64,
    /// Penetration allowed without correction.
    pub linear_slop: f64,
    /// Cap on a single position correction.
    pub max_linear_correction: f64,
    /// Approach speed below which contacts do not bounce. Perfectly elastic
    /// contacts (restitution 1) bounce at any speed.
    pub restitution_threshold: f64,
    pub warm_starting: bool,
    /// Multiplier on cached impulses when warm starting.
    pub warm_start_scale: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            timestep: 1.0 / 60.0,
            solver_iterations: 8,
            position_iterations: 3,
            sleep: SleepConfig::default(),
            solver: SolverConfig::default(),
            aabb_margin: 0.05,
            linear_damping: 0.0,
            angular_damping: 0.0,
            integrator: Integrator::default(),
        }
    }
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            linear_threshold: 0.05,
            angular_threshold: 0.05,
            time_threshold: 0.5,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            baumgarte: 0.2,
            linear_slop: 0.0005,
            max_linear_correction: 0.2,
            restitution_threshold: 1.0,
            warm_starting: true,
            warm_start_scale: 1.0,
        }
    }
}

impl WorldConfig {
    #[must_use]
    pub fn new(gravity: Vec2, timestep: f64) -> Self {
        Self { gravity, timestep, ..Self::default() }
    }

    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, solver_iterations: usize, position_iterations: usize) -> Self {
        self.solver_iterations = solver_iterations;
        self.position_iterations = position_iterations;
        self
    }

    #[must_use]
    pub fn with_sleep(mut self, sleep: SleepConfig) -> Self {
        self.sleep = sleep;
        self
    }

    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    #[must_use]
    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    #[must_use]
    pub fn without_sleeping(mut self) -> Self {
        self.sleep.enabled = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity must be finite"));
        }
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(PhysicsError::InvalidConfig("timestep must be finite and > 0"));
        }
        if self.solver_iterations == 0 {
            return Err(PhysicsError::InvalidConfig("solver_iterations must be >= 1"));
        }
        if !non_negative(self.aabb_margin) {
            return Err(PhysicsError::InvalidConfig("aabb_margin must be finite and >= 0"));
        }
        if !(non_negative(self.linear_damping) && non_negative(self.angular_damping)) {
            return Err(PhysicsError::InvalidConfig("damping must be finite and >= 0"));
        }
        let sleep = &self.sleep;
        if !(non_negative(sleep.linear_threshold)
            && non_negative(sleep.angular_threshold)
            && non_negative(sleep.time_threshold))
        {
            return Err(PhysicsError::InvalidConfig("sleep thresholds must be finite and >= 0"));
        }
        let solver = &self.solver;
        if !(0.0..=1.0).contains(&solver.baumgarte) {
            return Err(PhysicsError::InvalidConfig("baumgarte must be within [0, 1]"));
        }
        if !(non_negative(solver.linear_slop)
            && non_negative(solver.max_linear_correction)
            && non_negative(solver.restitution_threshold))
        {
            return Err(PhysicsError::InvalidConfig("solver tolerances must be finite and >= 0"));
        }
        if !(0.0..=1.0).contains(&solver.warm_start_scale) {
            return Err(PhysicsError::InvalidConfig("warm_start_scale must be within [0, 1]"));
        }
        Ok(())
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_timestep_and_iterations() {
        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(WorldConfig::default().with_timestep(dt).validate().is_err());
        }
        let cfg = WorldConfig::default().with_iterations(0, 0);
        assert_eq!(
            cfg.validate(),
            Err(PhysicsError::InvalidConfig("solver_iterations must be >= 1"))
        );
        // Zero position iterations is allowed.
        assert!(WorldConfig::default().with_iterations(1, 0).validate().is_ok());
    }

    #[test]
    fn rejects_negative_sleep_threshold() {
        let sleep = SleepConfig { linear_threshold: -1.0, ..SleepConfig::default() };
        assert!(WorldConfig::default().with_sleep(sleep).validate().is_err());
    }
}
