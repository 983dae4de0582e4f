//! Velocity ramp for motion start
//!
//! Commanding full torque against a stationary robot slips the wheels and
//! sags the battery. The ramp starts both wheel speeds from a small seed
//! and raises them by a fixed increment per control tick until they reach
//! their targets.

/// Ramp parameters (all in percent)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampConfig {
    /// Starting velocity for the normal-speed wheel
    pub seed_pct: f32,
    /// Starting velocity for the slowed wheel
    pub slow_seed_pct: f32,
    /// Velocity added per control tick
    pub increment_pct: f32,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            seed_pct: 8.0,
            slow_seed_pct: 0.0,
            increment_pct: 1.0, // per 10ms tick
        }
    }
}

/// Normal and slow velocity magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VelocityPair {
    /// Velocity for the wheel that is behind or level
    pub normal: f32,
    /// Velocity for the wheel that is ahead
    pub slow: f32,
}

impl VelocityPair {
    /// Create a velocity pair
    pub const fn new(normal: f32, slow: f32) -> Self {
        Self { normal, slow }
    }
}

/// Ramped value after `tick` increments, clamped at `target`
///
/// A non-positive or non-finite increment means "no ramp".
pub fn ramp_value(seed: f32, increment: f32, target: f32, tick: u32) -> f32 {
    if !(increment.is_finite() && increment > 0.0) {
        return target;
    }

    let value = seed + increment * tick as f32;
    if value > target {
        target
    } else {
        value
    }
}

/// Tick-counted velocity ramp
#[derive(Debug, Clone)]
pub struct VelocityRamp {
    config: Option<RampConfig>,
    target: VelocityPair,
    tick: u32,
}

impl VelocityRamp {
    /// Create a ramp toward `target`
    pub fn new(target: VelocityPair, config: RampConfig) -> Self {
        Self {
            config: Some(config),
            target,
            tick: 0,
        }
    }

    /// Create a ramp that is already at its target
    pub fn disabled(target: VelocityPair) -> Self {
        Self {
            config: None,
            target,
            tick: 0,
        }
    }

    /// Ramped velocities at an arbitrary tick
    pub fn at_tick(&self, tick: u32) -> VelocityPair {
        match &self.config {
            Some(cfg) => VelocityPair {
                normal: ramp_value(cfg.seed_pct, cfg.increment_pct, self.target.normal, tick),
                slow: ramp_value(cfg.slow_seed_pct, cfg.increment_pct, self.target.slow, tick),
            },
            None => self.target,
        }
    }

    /// Ramped velocities for the current tick
    pub fn current(&self) -> VelocityPair {
        self.at_tick(self.tick)
    }

    /// Return the current velocities and move to the next tick
    pub fn advance(&mut self) -> VelocityPair {
        let velocities = self.current();
        self.tick = self.tick.saturating_add(1);
        velocities
    }

    /// Restart from the seed
    pub fn reset(&mut self) {
        self.tick = 0;
    }

    /// Check if both velocities have reached their targets
    pub fn is_complete(&self) -> bool {
        self.current() == self.target
    }

    /// Target velocities
    pub fn target(&self) -> VelocityPair {
        self.target
    }
}
