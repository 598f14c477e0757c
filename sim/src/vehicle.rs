//! Hovercraft physics.
//!
//! Input commands accumulate driving, braking and rotational velocity during
//! the variable-rate frame; `fixed_update` turns them into motion on the
//! vehicle body; `late_update` closes the frame.

use crate::arena::{Arena, VehicleCollider};
use hyperbol_shared::config::{SpawnPoint, VehicleConfig};
use hyperbol_shared::kinematics::{
    apply_friction, clamp_positive, distance_across_range, move_towards_angle, round_to_decimal,
};
use hyperbol_shared::team::Team;
use hyperbol_shared::vec3::{
    add, clamp_magnitude, forward_from_yaw, length, normalize_or_zero, scale, sub, Vec3,
};

pub type VehicleId = u32;

/// "Happened this frame" flag.
///
/// `mark` raises it; `end_frame` lowers it unless it was marked since the
/// previous `end_frame`. A command issued during frame N is therefore still
/// visible to the fixed steps that run at the start of frame N+1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameLatch {
    active: bool,
    marked: bool,
}

impl FrameLatch {
    pub fn mark(&mut self) {
        self.active = true;
        self.marked = true;
    }

    pub fn is_set(&self) -> bool {
        self.active
    }

    pub fn end_frame(&mut self) {
        if !self.marked {
            self.active = false;
        }
        self.marked = false;
    }
}

/// Transform and rigidbody state of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Degrees, clockwise from +Z seen from above
    pub yaw: f64,
    /// Degrees, cosmetic only
    pub roll: f64,
}

impl VehicleBody {
    pub fn at(spawn: SpawnPoint) -> Self {
        Self {
            position: spawn.position,
            velocity: Vec3::ZERO,
            yaw: spawn.yaw.rem_euclid(360.0),
            roll: 0.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    pub fn speed(&self) -> f64 {
        length(self.velocity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct QuickStop {
    previous_friction: f64,
}

#[derive(Debug, Clone)]
pub struct VehiclePhysics {
    config: VehicleConfig,
    pub body: VehicleBody,
    /// Whether steering and throttle commands are honoured
    pub can_receive_input: bool,
    driving_velocity: f64,
    braking_velocity: f64,
    /// Degrees per second, negative when turning counter-clockwise
    rotational_velocity: f64,
    driving_friction: f64,
    driving_slowdown_time: f64,
    turning_slowdown_time: f64,
    neutral_roll: f64,
    sped_up: FrameLatch,
    steered_clockwise: FrameLatch,
    steered_counter_clockwise: FrameLatch,
    quick_stop: Option<QuickStop>,
}

impl VehiclePhysics {
    /// `config` must already be validated.
    pub fn new(config: VehicleConfig, spawn: SpawnPoint) -> Self {
        let body = VehicleBody::at(spawn);
        let mut physics = Self {
            driving_friction: config.driving_friction,
            config,
            body,
            can_receive_input: true,
            driving_velocity: 0.0,
            braking_velocity: 0.0,
            rotational_velocity: 0.0,
            driving_slowdown_time: 0.0,
            turning_slowdown_time: 0.0,
            neutral_roll: body.roll,
            sped_up: FrameLatch::default(),
            steered_clockwise: FrameLatch::default(),
            steered_counter_clockwise: FrameLatch::default(),
            quick_stop: None,
        };
        physics.update_driving_slowdown_time();
        physics.update_turning_slowdown_time();
        physics
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    // --- current values ---

    pub fn driving_velocity(&self) -> f64 {
        self.driving_velocity
    }

    fn set_driving_velocity(&mut self, value: f64) {
        let max = self.config.max_driving_velocity;
        self.driving_velocity = value.clamp(-max, max);
    }

    pub fn braking_velocity(&self) -> f64 {
        self.braking_velocity
    }

    fn set_braking_velocity(&mut self, value: f64) {
        let max = self.config.max_driving_velocity;
        self.braking_velocity = value.clamp(-max, max);
    }

    pub fn rotational_velocity(&self) -> f64 {
        self.rotational_velocity
    }

    fn set_rotational_velocity(&mut self, value: f64) {
        let max = self.config.max_rotational_velocity;
        self.rotational_velocity = value.clamp(-max, max);
    }

    pub fn driving_friction(&self) -> f64 {
        self.driving_friction
    }

    fn set_driving_friction(&mut self, value: f64) {
        self.driving_friction = clamp_positive(value);
        self.update_driving_slowdown_time();
    }

    fn update_driving_slowdown_time(&mut self) {
        self.driving_slowdown_time = self.config.max_driving_velocity / self.driving_friction;
    }

    fn update_turning_slowdown_time(&mut self) {
        self.turning_slowdown_time =
            self.config.max_rotational_velocity / self.config.turning_friction;
    }

    /// Seconds to coast from max driving velocity to rest, to two decimals.
    pub fn driving_slowdown_time(&self) -> f64 {
        round_to_decimal(self.driving_slowdown_time, 2)
    }

    /// Seconds to stop turning from max rotational velocity, to two decimals.
    pub fn turning_slowdown_time(&self) -> f64 {
        round_to_decimal(self.turning_slowdown_time, 2)
    }

    // --- derived state ---

    pub fn is_turning(&self) -> bool {
        self.rotational_velocity != 0.0
    }

    pub fn is_being_sped_up(&self) -> bool {
        self.sped_up.is_set()
    }

    pub fn is_being_steered_clockwise(&self) -> bool {
        self.steered_clockwise.is_set()
    }

    pub fn is_being_steered_counter_clockwise(&self) -> bool {
        self.steered_counter_clockwise.is_set()
    }

    pub fn is_being_steered(&self) -> bool {
        self.is_being_steered_clockwise() || self.is_being_steered_counter_clockwise()
    }

    pub fn is_quick_stopping(&self) -> bool {
        self.quick_stop.is_some()
    }

    /// 1 when moving at max driving velocity.
    pub fn driving_velocity_portion_of_max(&self) -> f64 {
        self.body.speed() / self.config.max_driving_velocity
    }

    /// 1 at max clockwise turn rate, -1 at max counter-clockwise.
    pub fn rotational_velocity_portion_of_max(&self) -> f64 {
        self.rotational_velocity / self.config.max_rotational_velocity
    }

    fn driving_sway_scalar(&self) -> f64 {
        let [lo, hi] = self.config.driving_sway_range;
        distance_across_range(lo, hi, self.driving_velocity_portion_of_max())
    }

    fn turn_sway_scalar(&self) -> f64 {
        let [lo, hi] = self.config.turn_sway_range;
        (-self.rotational_velocity).signum()
            * distance_across_range(lo, hi, self.rotational_velocity_portion_of_max().abs())
    }

    /// Largest roll available at the current speed.
    pub fn sway_cap(&self) -> f64 {
        self.config.max_roll * self.driving_sway_scalar()
    }

    /// Roll the model leans towards, centred on the neutral roll.
    pub fn desired_sway_angle(&self) -> f64 {
        self.neutral_roll + self.sway_cap() * self.turn_sway_scalar()
    }

    pub fn collider(&self, id: VehicleId) -> VehicleCollider {
        VehicleCollider {
            id,
            center: self.body.position,
            radius: self.config.hit_radius,
        }
    }

    // --- commands ---

    /// Accelerate the turn clockwise by `portion_of_max` of full rotational
    /// acceleration.
    pub fn steer_clockwise(&mut self, portion_of_max: f64, delta_time: f64) {
        if !self.can_receive_input {
            return;
        }
        let portion = portion_of_max.clamp(0.0, 1.0);
        self.set_rotational_velocity(
            self.rotational_velocity + self.config.rotational_acceleration * delta_time * portion,
        );
        self.steered_clockwise.mark();
    }

    pub fn steer_counter_clockwise(&mut self, portion_of_max: f64, delta_time: f64) {
        if !self.can_receive_input {
            return;
        }
        let portion = portion_of_max.clamp(0.0, 1.0);
        self.set_rotational_velocity(
            self.rotational_velocity - self.config.rotational_acceleration * delta_time * portion,
        );
        self.steered_counter_clockwise.mark();
    }

    pub fn speed_up(&mut self, delta_time: f64) {
        if !self.can_receive_input {
            return;
        }
        self.set_driving_velocity(
            self.driving_velocity + self.config.driving_acceleration * delta_time,
        );
        self.sped_up.mark();
    }

    pub fn slow_down(&mut self, delta_time: f64) {
        if !self.can_receive_input {
            return;
        }
        self.set_braking_velocity(
            self.braking_velocity + self.config.braking_acceleration * delta_time,
        );
    }

    /// Start bringing the vehicle to rest over `stop_time` seconds (scaled by
    /// how fast it is going). Returns how long until
    /// [`finish_quick_stop`](Self::finish_quick_stop) should run, or `None` if
    /// a quick stop is already in progress.
    pub fn begin_quick_stop(&mut self, stop_time: f64) -> Option<f64> {
        if self.quick_stop.is_some() {
            return None;
        }
        if !stop_time.is_finite() || stop_time <= 0.0 {
            self.stop_moving();
            return None;
        }

        let previous_friction = self.driving_friction;
        let portion = self.driving_velocity_portion_of_max().min(1.0);
        self.set_driving_friction(self.config.max_driving_velocity / stop_time);
        self.quick_stop = Some(QuickStop { previous_friction });
        Some(stop_time * portion)
    }

    /// Nullify whatever velocity is left and restore the usual friction.
    pub fn finish_quick_stop(&mut self) {
        if let Some(stop) = self.quick_stop.take() {
            self.body.velocity = Vec3::ZERO;
            self.set_driving_friction(stop.previous_friction);
        }
    }

    pub fn set_driving_velocity_portion_of_max(&mut self, portion_of_max: f64) {
        self.set_driving_velocity(self.config.max_driving_velocity * portion_of_max);
    }

    /// Halt immediately.
    pub fn stop_moving(&mut self) {
        self.set_driving_velocity(0.0);
        self.set_rotational_velocity(0.0);
        self.body.velocity = Vec3::ZERO;
    }

    /// Put the vehicle back on a spawn point at rest.
    pub fn respawn(&mut self, spawn: SpawnPoint) {
        self.stop_moving();
        self.braking_velocity = 0.0;
        self.body = VehicleBody::at(spawn);
        self.body.roll = self.neutral_roll;
    }

    // --- per-step ---

    /// One physics step.
    pub fn fixed_update(&mut self, fixed_delta_time: f64, arena: &Arena) {
        if !self.is_being_steered() {
            self.set_rotational_velocity(apply_friction(
                self.rotational_velocity,
                self.config.max_rotational_velocity,
                self.turning_slowdown_time,
                fixed_delta_time,
            ));
        }
        if self.quick_stop.is_some() {
            self.apply_driving_friction(fixed_delta_time);
        }

        self.apply_driving_velocity();
        self.apply_braking_velocity();
        self.apply_rotational_velocity(fixed_delta_time);
        self.apply_sway(fixed_delta_time);
        self.integrate(fixed_delta_time, arena);
    }

    /// Frame boundary: drop the "this frame" flags that were not re-asserted.
    pub fn late_update(&mut self) {
        self.sped_up.end_frame();
        self.steered_clockwise.end_frame();
        self.steered_counter_clockwise.end_frame();
    }

    fn apply_driving_friction(&mut self, dt: f64) {
        let speed = self.body.speed();
        if speed == 0.0 {
            return;
        }
        let slowed = apply_friction(
            speed,
            self.config.max_driving_velocity,
            self.driving_slowdown_time,
            dt,
        );
        self.body.velocity = scale(normalize_or_zero(self.body.velocity), slowed);
    }

    fn apply_driving_velocity(&mut self) {
        let forward = self.body.forward();
        self.body.velocity = add(self.body.velocity, scale(forward, self.driving_velocity));
        self.driving_velocity = 0.0;
        self.body.velocity = clamp_magnitude(self.body.velocity, self.config.max_driving_velocity);
    }

    fn apply_braking_velocity(&mut self) {
        let forward = self.body.forward();
        // Above reverse speed braking only slows the craft; once it is slower
        // than that, the same input backs it up to the reverse cap.
        if self.body.speed() > self.config.max_reverse_velocity {
            self.body.velocity = sub(self.body.velocity, scale(forward, self.braking_velocity));
            self.body.velocity =
                clamp_magnitude(self.body.velocity, self.config.max_driving_velocity);
        } else {
            self.body.velocity = sub(self.body.velocity, scale(forward, self.braking_velocity));
            self.body.velocity =
                clamp_magnitude(self.body.velocity, self.config.max_reverse_velocity);
        }
        self.braking_velocity = 0.0;
    }

    fn apply_rotational_velocity(&mut self, dt: f64) {
        self.body.yaw = (self.body.yaw + self.rotational_velocity * dt).rem_euclid(360.0);
    }

    fn apply_sway(&mut self, dt: f64) {
        let target = self.desired_sway_angle();
        self.body.roll = move_towards_angle(self.body.roll, target, self.config.sway_speed * dt);
    }

    fn integrate(&mut self, dt: f64, arena: &Arena) {
        let damping = (1.0 - self.config.linear_drag * dt).clamp(0.0, 1.0);
        self.body.velocity = scale(self.body.velocity, damping);

        let moved = add(self.body.position, scale(self.body.velocity, dt));
        let (position, hit_x, hit_z) = arena.confine(moved, self.config.hit_radius);
        self.body.position = position;
        if hit_x {
            self.body.velocity.x = 0.0;
        }
        if hit_z {
            self.body.velocity.z = 0.0;
        }
    }
}

/// A hovercraft in the match: its physics plus the launch trigger that
/// remembers whether it is holding the ball.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub team: Team,
    pub physics: VehiclePhysics,
    pub spawn: SpawnPoint,
    holding_ball: bool,
}

impl Vehicle {
    pub fn new(id: VehicleId, team: Team, config: VehicleConfig, spawn: SpawnPoint) -> Self {
        Self {
            id,
            team,
            physics: VehiclePhysics::new(config, spawn),
            spawn,
            holding_ball: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.physics.body.position
    }

    pub fn collider(&self) -> VehicleCollider {
        self.physics.collider(self.id)
    }

    pub fn is_holding_ball(&self) -> bool {
        self.holding_ball
    }

    pub fn pick_up_ball(&mut self) {
        self.holding_ball = true;
    }

    /// Release the ball for a shot. Returns false if there was nothing to shoot.
    pub fn take_ball(&mut self) -> bool {
        std::mem::replace(&mut self.holding_ball, false)
    }

    pub fn drop_ball(&mut self) {
        self.holding_ball = false;
    }
}
