use crate::curve::{Curve, Gradient};
use crate::vec3::{ground, Vec3};

/// Configuration that fails validation. Rejected at load time so the
/// simulation never sees a zero divisor or a non-finite tuning value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfiguration {
        field: &'static str,
        reason: &'static str,
    },
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidConfiguration { field, reason }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, "must be finite and > 0"));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, "must be finite and >= 0"));
    }
    Ok(())
}

fn require_unit_range(field: &'static str, range: [f64; 2]) -> Result<(), ConfigError> {
    let [lo, hi] = range;
    if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) {
        return Err(invalid(field, "must lie within [0, 1]"));
    }
    if lo > hi {
        return Err(invalid(field, "must be ordered low to high"));
    }
    Ok(())
}

/// Ball flight and capture tuning
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BallConfig {
    /// Speed the ball settles back to after any boost (units/s)
    pub base_move_speed: f64,
    /// Hard ceiling on fly speed (units/s)
    pub move_speed_cap: f64,
    /// Seconds for a boost to wear off in free flight
    pub time_to_reset_speed: f64,
    /// Seconds for a boost to wear off while held
    pub time_to_reset_speed_when_held: f64,
    /// Boost remaining over normalized timer progress (1 = full boost, 0 = none)
    pub drag_curve: Curve,
    /// Orbit radius around the holder
    pub spin_distance: f64,
    /// Divides fly speed to get orbital surface speed
    pub spin_speed_multiplier: f64,
    pub shoot_speed_increase_percentage: u32,
    pub radius: f64,
    /// Extra clearance kept between an orbiting ball and walls
    pub wall_offset: f64,
    /// Bounce budget for a single tick
    pub max_bounces_per_tick: u32,
    pub default_color: u32,
    pub color_over_speed: Gradient,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            base_move_speed: 10.0,
            move_speed_cap: 100.0,
            time_to_reset_speed: 5.0,
            time_to_reset_speed_when_held: 5.0,
            drag_curve: Curve::default(),
            spin_distance: 1.0,
            spin_speed_multiplier: 5.0,
            shoot_speed_increase_percentage: 50,
            radius: 0.5,
            wall_offset: 0.1,
            max_bounces_per_tick: 8,
            default_color: 0xd8f0ff,
            color_over_speed: Gradient::default(),
        }
    }
}

impl BallConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("baseMoveSpeed", self.base_move_speed)?;
        require_positive("moveSpeedCap", self.move_speed_cap)?;
        if self.move_speed_cap < self.base_move_speed {
            return Err(invalid("moveSpeedCap", "must be >= baseMoveSpeed"));
        }
        require_positive("timeToResetSpeed", self.time_to_reset_speed)?;
        require_positive("timeToResetSpeedWhenHeld", self.time_to_reset_speed_when_held)?;
        require_positive("spinDistance", self.spin_distance)?;
        require_positive("spinSpeedMultiplier", self.spin_speed_multiplier)?;
        require_positive("radius", self.radius)?;
        require_non_negative("wallOffset", self.wall_offset)?;
        if self.max_bounces_per_tick == 0 {
            return Err(invalid("maxBouncesPerTick", "must be > 0"));
        }
        if self.default_color > 0xFFFFFF {
            return Err(invalid("defaultColor", "must be a 24-bit colour"));
        }
        self.drag_curve
            .validate()
            .map_err(|reason| invalid("dragCurve", reason))?;
        self.color_over_speed
            .validate()
            .map_err(|reason| invalid("colorOverSpeed", reason))?;
        Ok(())
    }

    /// Circumference of the orbit around the holder.
    pub fn circle_distance(&self) -> f64 {
        std::f64::consts::TAU * self.spin_distance
    }
}

/// Hovercraft handling tuning. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleConfig {
    pub max_driving_velocity: f64,
    pub max_reverse_velocity: f64,
    pub driving_acceleration: f64,
    pub braking_acceleration: f64,
    /// Driving friction per second, used while a quick stop is in progress
    pub driving_friction: f64,
    pub max_rotational_velocity: f64,
    pub rotational_acceleration: f64,
    pub turning_friction: f64,
    /// Largest roll the model keels over by at full speed and full turn
    pub max_roll: f64,
    pub driving_sway_range: [f64; 2],
    pub turn_sway_range: [f64; 2],
    /// Degrees per second the roll may move towards its target
    pub sway_speed: f64,
    /// Rigidbody drag applied each fixed step (fraction per second)
    pub linear_drag: f64,
    /// Radius of the hull used for ball capture and wall contact
    pub hit_radius: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_driving_velocity: 40.0,
            max_reverse_velocity: 40.0,
            driving_acceleration: 15.0,
            braking_acceleration: 15.0,
            driving_friction: 1.3333333,
            max_rotational_velocity: 50.0,
            rotational_acceleration: 140.0,
            turning_friction: 25.0,
            max_roll: 10.0,
            driving_sway_range: [0.0, 1.0],
            turn_sway_range: [0.0, 1.0],
            sway_speed: 60.0,
            linear_drag: 0.5,
            hit_radius: 1.0,
        }
    }
}

impl VehicleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("maxDrivingVelocity", self.max_driving_velocity)?;
        require_non_negative("maxReverseVelocity", self.max_reverse_velocity)?;
        require_non_negative("drivingAcceleration", self.driving_acceleration)?;
        require_non_negative("brakingAcceleration", self.braking_acceleration)?;
        require_positive("drivingFriction", self.driving_friction)?;
        require_positive("maxRotationalVelocity", self.max_rotational_velocity)?;
        require_non_negative("rotationalAcceleration", self.rotational_acceleration)?;
        require_positive("turningFriction", self.turning_friction)?;
        require_non_negative("maxRoll", self.max_roll)?;
        require_unit_range("drivingSwayRange", self.driving_sway_range)?;
        require_unit_range("turnSwayRange", self.turn_sway_range)?;
        require_positive("swaySpeed", self.sway_speed)?;
        require_non_negative("linearDrag", self.linear_drag)?;
        require_positive("hitRadius", self.hit_radius)?;
        Ok(())
    }
}

/// Where a vehicle appears and which way it faces (yaw in degrees).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub yaw: f64,
}

impl SpawnPoint {
    pub fn new(x: f64, z: f64, yaw: f64) -> Self {
        Self {
            position: ground(x, z),
            yaw,
        }
    }
}

/// Spawn points for one team: a centre spot for a lone player and two flank
/// spots for a pair.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TeamSpawns {
    pub single: SpawnPoint,
    pub duo: [SpawnPoint; 2],
}

/// Pitch layout. Red defends the goal at -X, Blue the goal at +X.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArenaConfig {
    /// Distance from centre to each end wall along X
    pub half_length: f64,
    /// Distance from centre to each side wall along Z
    pub half_width: f64,
    pub goal_half_width: f64,
    /// Anything beyond this on either horizontal axis is out of play
    pub out_of_bounds_extent: f64,
    pub ball_start: Vec3,
    pub red_spawns: TeamSpawns,
    pub blue_spawns: TeamSpawns,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            half_length: 30.0,
            half_width: 18.0,
            goal_half_width: 4.0,
            out_of_bounds_extent: 40.0,
            ball_start: Vec3::ZERO,
            red_spawns: TeamSpawns {
                single: SpawnPoint::new(-20.0, 0.0, 90.0),
                duo: [
                    SpawnPoint::new(-20.0, -8.0, 90.0),
                    SpawnPoint::new(-20.0, 8.0, 90.0),
                ],
            },
            blue_spawns: TeamSpawns {
                single: SpawnPoint::new(20.0, 0.0, -90.0),
                duo: [
                    SpawnPoint::new(20.0, -8.0, -90.0),
                    SpawnPoint::new(20.0, 8.0, -90.0),
                ],
            },
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("halfLength", self.half_length)?;
        require_positive("halfWidth", self.half_width)?;
        require_positive("goalHalfWidth", self.goal_half_width)?;
        if self.goal_half_width >= self.half_width {
            return Err(invalid("goalHalfWidth", "must be < halfWidth"));
        }
        require_positive("outOfBoundsExtent", self.out_of_bounds_extent)?;
        if self.out_of_bounds_extent < self.half_length.max(self.half_width) {
            return Err(invalid("outOfBoundsExtent", "must enclose the pitch"));
        }
        if !self.ball_start.is_finite() || !self.contains(self.ball_start) {
            return Err(invalid("ballStart", "must lie inside the pitch"));
        }
        let spawns = [&self.red_spawns, &self.blue_spawns];
        for spawn in spawns
            .iter()
            .flat_map(|s| std::iter::once(&s.single).chain(s.duo.iter()))
        {
            if !spawn.position.is_finite() || !spawn.yaw.is_finite() || !self.contains(spawn.position)
            {
                return Err(invalid("spawns", "must be finite and inside the pitch"));
            }
        }
        Ok(())
    }

    /// Whether a ground point lies strictly inside the walls.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x.abs() < self.half_length && p.z.abs() < self.half_width
    }

    pub fn is_out_of_bounds(&self, p: Vec3) -> bool {
        p.x.abs() > self.out_of_bounds_extent || p.z.abs() > self.out_of_bounds_extent
    }
}
