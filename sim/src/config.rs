use crate::error::SimResult;
use hyperbol_shared::config::{ArenaConfig, BallConfig, ConfigError, VehicleConfig};
use std::path::Path;

/// Match configuration: tuning for every entity plus loop timing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub ball: BallConfig,
    pub vehicle: VehicleConfig,
    pub arena: ArenaConfig,
    /// Variable-rate frames per second (input, ball, timers)
    pub frame_rate_hz: u32,
    /// Fixed physics steps per second (vehicle integration)
    pub fixed_rate_hz: u32,
    /// Snapshots per second sent to subscribers
    pub broadcast_rate_hz: u32,
    pub rng_seed: u64,
    pub match_duration_secs: f64,
    /// Overlay delay after a goal before play resumes
    pub post_goal_delay_secs: f64,
    /// Pause before a resting ball is launched
    pub kickoff_delay_secs: f64,
    /// Time a quick stop takes from full speed
    pub quick_stop_time_secs: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ball: BallConfig::default(),
            vehicle: VehicleConfig::default(),
            arena: ArenaConfig::default(),
            frame_rate_hz: 60,
            fixed_rate_hz: 50,
            broadcast_rate_hz: 15,
            rng_seed: 42,
            match_duration_secs: 300.0,
            post_goal_delay_secs: 3.0,
            kickoff_delay_secs: 1.0,
            quick_stop_time_secs: 0.5,
        }
    }
}

impl MatchConfig {
    /// Read a JSON config file. Missing fields take their defaults; the
    /// result is validated.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: MatchConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ball.validate()?;
        self.vehicle.validate()?;
        self.arena.validate()?;

        let invalid = |field, reason| ConfigError::InvalidConfiguration { field, reason };
        if self.frame_rate_hz == 0 {
            return Err(invalid("frameRateHz", "must be > 0"));
        }
        if self.fixed_rate_hz == 0 {
            return Err(invalid("fixedRateHz", "must be > 0"));
        }
        if self.broadcast_rate_hz == 0 {
            return Err(invalid("broadcastRateHz", "must be > 0"));
        }
        if self.broadcast_rate_hz > self.frame_rate_hz {
            return Err(invalid("broadcastRateHz", "must be <= frameRateHz"));
        }
        if !self.match_duration_secs.is_finite() || self.match_duration_secs <= 0.0 {
            return Err(invalid("matchDurationSecs", "must be finite and > 0"));
        }
        for (field, value) in [
            ("postGoalDelaySecs", self.post_goal_delay_secs),
            ("kickoffDelaySecs", self.kickoff_delay_secs),
            ("quickStopTimeSecs", self.quick_stop_time_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be finite and >= 0"));
            }
        }
        Ok(())
    }

    pub fn frame_dt(&self) -> f64 {
        1.0 / self.frame_rate_hz as f64
    }

    pub fn fixed_dt(&self) -> f64 {
        1.0 / self.fixed_rate_hz as f64
    }

    /// Frames between snapshots.
    pub fn broadcast_every_n(&self) -> u64 {
        (self.frame_rate_hz / self.broadcast_rate_hz).max(1) as u64
    }
}
