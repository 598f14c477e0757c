//! Vehicle controls: turning device state into per-frame commands.
//!
//! Every frame the match polls each vehicle's [`InputSource`] for a
//! [`ControlFrame`] and fires the matching physics commands while a control
//! is held. Launch and quick stop are edge-triggered by the sources.

use crate::vehicle::VehiclePhysics;
use hyperbol_shared::team::Team;
use hyperbol_shared::vec3::Vec3;
use rand_chacha::ChaCha8Rng;

/// Default stick dead zone for gamepads.
pub const DEFAULT_DEAD_ZONE: f64 = 0.15;

/// What a vehicle's driver wants this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlFrame {
    /// Portion of full steering in `[-1, 1]`; positive turns clockwise
    pub steer: f64,
    pub throttle: bool,
    pub brake: bool,
    /// Shoot the ball if held
    pub launch: bool,
    pub quick_stop: bool,
}

/// Held keys on a keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub forward: bool,
    pub back: bool,
    pub launch: bool,
    pub quick_stop: bool,
}

/// Analog gamepad state. Axes are in `[-1, 1]`, triggers in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadState {
    pub stick_x: f64,
    pub right_trigger: f64,
    pub left_trigger: f64,
    pub launch: bool,
    pub quick_stop: bool,
}

/// Raw device state reported by a human player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceState {
    Keyboard(KeyState),
    Gamepad(GamepadState),
}

/// Read-only view of the match handed to input sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlContext {
    pub team: Team,
    pub position: Vec3,
    /// Degrees, clockwise from +Z
    pub yaw: f64,
    pub holding_ball: bool,
    pub ball_position: Vec3,
    /// Ball is in free flight (nobody holds it)
    pub ball_free: bool,
    /// Centre of the goal this vehicle attacks
    pub target_goal: Vec3,
}

pub trait InputSource: Send + std::fmt::Debug {
    /// Produce this frame's controls.
    fn poll(&mut self, ctx: &ControlContext, dt: f64, rng: &mut ChaCha8Rng) -> ControlFrame;

    /// Latest device state from a human player. Sources that drive
    /// themselves ignore it.
    fn feed(&mut self, _state: DeviceState) {}

    /// Forget pressed buttons and pending decisions, e.g. after a respawn.
    fn reset(&mut self) {}
}

/// Rising-edge detector for buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ButtonEdge {
    was_down: bool,
}

impl ButtonEdge {
    fn pressed(&mut self, down: bool) -> bool {
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardInput {
    keys: KeyState,
    launch: ButtonEdge,
    quick_stop: ButtonEdge,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self, _ctx: &ControlContext, _dt: f64, _rng: &mut ChaCha8Rng) -> ControlFrame {
        let keys = self.keys;
        // Digital keys steer at full portion; both held cancel out.
        let steer = match (keys.left, keys.right) {
            (false, true) => 1.0,
            (true, false) => -1.0,
            _ => 0.0,
        };
        ControlFrame {
            steer,
            throttle: keys.forward,
            brake: keys.back,
            launch: self.launch.pressed(keys.launch),
            quick_stop: self.quick_stop.pressed(keys.quick_stop),
        }
    }

    fn feed(&mut self, state: DeviceState) {
        match state {
            DeviceState::Keyboard(keys) => self.keys = keys,
            DeviceState::Gamepad(_) => {
                tracing::trace!("Keyboard input ignoring gamepad state");
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct GamepadInput {
    state: GamepadState,
    dead_zone: f64,
    launch: ButtonEdge,
    quick_stop: ButtonEdge,
}

impl GamepadInput {
    pub fn new(dead_zone: f64) -> Self {
        Self {
            state: GamepadState::default(),
            dead_zone: dead_zone.clamp(0.0, 0.95),
            launch: ButtonEdge::default(),
            quick_stop: ButtonEdge::default(),
        }
    }

    /// Rescale an axis so the dead zone maps to 0 and full deflection to 1.
    fn shape(&self, value: f64) -> f64 {
        let magnitude = value.abs();
        if !magnitude.is_finite() || magnitude <= self.dead_zone {
            return 0.0;
        }
        let scaled = ((magnitude - self.dead_zone) / (1.0 - self.dead_zone)).min(1.0);
        scaled * value.signum()
    }
}

impl Default for GamepadInput {
    fn default() -> Self {
        Self::new(DEFAULT_DEAD_ZONE)
    }
}

impl InputSource for GamepadInput {
    fn poll(&mut self, _ctx: &ControlContext, _dt: f64, _rng: &mut ChaCha8Rng) -> ControlFrame {
        let state = self.state;
        ControlFrame {
            steer: self.shape(state.stick_x),
            throttle: self.shape(state.right_trigger) > 0.0,
            brake: self.shape(state.left_trigger) > 0.0,
            launch: self.launch.pressed(state.launch),
            quick_stop: self.quick_stop.pressed(state.quick_stop),
        }
    }

    fn feed(&mut self, state: DeviceState) {
        match state {
            DeviceState::Gamepad(pad) => self.state = pad,
            DeviceState::Keyboard(_) => {
                tracing::trace!("Gamepad input ignoring keyboard state");
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.dead_zone);
    }
}

/// Fire the held-control commands for one frame.
pub fn apply_controls(physics: &mut VehiclePhysics, frame: &ControlFrame, dt: f64) {
    if frame.steer > 0.0 {
        physics.steer_clockwise(frame.steer, dt);
    } else if frame.steer < 0.0 {
        physics.steer_counter_clockwise(-frame.steer, dt);
    }
    if frame.throttle {
        physics.speed_up(dt);
    }
    if frame.brake {
        physics.slow_down(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperbol_shared::config::{SpawnPoint, VehicleConfig};
    use rand::SeedableRng;

    fn ctx() -> ControlContext {
        ControlContext {
            team: Team::Red,
            position: Vec3::ZERO,
            yaw: 0.0,
            holding_ball: false,
            ball_position: Vec3::ZERO,
            ball_free: true,
            target_goal: Vec3::ZERO,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn keyboard_maps_keys_to_full_portion() {
        let mut input = KeyboardInput::new();
        input.feed(DeviceState::Keyboard(KeyState {
            right: true,
            forward: true,
            ..Default::default()
        }));
        let frame = input.poll(&ctx(), 1.0 / 60.0, &mut rng());
        assert_eq!(frame.steer, 1.0);
        assert!(frame.throttle);
        assert!(!frame.brake);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = KeyboardInput::new();
        input.feed(DeviceState::Keyboard(KeyState {
            left: true,
            right: true,
            ..Default::default()
        }));
        assert_eq!(input.poll(&ctx(), 1.0 / 60.0, &mut rng()).steer, 0.0);
    }

    #[test]
    fn launch_fires_once_per_press() {
        let mut input = KeyboardInput::new();
        let held = DeviceState::Keyboard(KeyState {
            launch: true,
            ..Default::default()
        });
        input.feed(held);
        assert!(input.poll(&ctx(), 1.0 / 60.0, &mut rng()).launch);
        assert!(!input.poll(&ctx(), 1.0 / 60.0, &mut rng()).launch);

        input.feed(DeviceState::Keyboard(KeyState::default()));
        input.poll(&ctx(), 1.0 / 60.0, &mut rng());
        input.feed(held);
        assert!(input.poll(&ctx(), 1.0 / 60.0, &mut rng()).launch);
    }

    #[test]
    fn gamepad_dead_zone_and_rescale() {
        let mut input = GamepadInput::new(0.2);
        input.feed(DeviceState::Gamepad(GamepadState {
            stick_x: -0.1,
            right_trigger: 0.1,
            ..Default::default()
        }));
        let frame = input.poll(&ctx(), 1.0 / 60.0, &mut rng());
        assert_eq!(frame.steer, 0.0);
        assert!(!frame.throttle);

        input.feed(DeviceState::Gamepad(GamepadState {
            stick_x: -0.6,
            right_trigger: 1.0,
            ..Default::default()
        }));
        let frame = input.poll(&ctx(), 1.0 / 60.0, &mut rng());
        assert!((frame.steer + 0.5).abs() < 1e-9);
        assert!(frame.throttle);
    }

    #[test]
    fn wrong_device_is_ignored() {
        let mut input = GamepadInput::default();
        input.feed(DeviceState::Keyboard(KeyState {
            forward: true,
            ..Default::default()
        }));
        assert_eq!(
            input.poll(&ctx(), 1.0 / 60.0, &mut rng()),
            ControlFrame::default()
        );
    }

    #[test]
    fn apply_controls_routes_to_physics() {
        let mut physics =
            VehiclePhysics::new(VehicleConfig::default(), SpawnPoint::new(0.0, 0.0, 0.0));
        let frame = ControlFrame {
            steer: -0.5,
            throttle: true,
            brake: true,
            ..Default::default()
        };
        apply_controls(&mut physics, &frame, 0.1);
        assert!((physics.rotational_velocity() + 7.0).abs() < 1e-9);
        assert!((physics.driving_velocity() - 1.5).abs() < 1e-9);
        assert!((physics.braking_velocity() - 1.5).abs() < 1e-9);
        assert!(physics.is_being_steered_counter_clockwise());
        assert!(physics.is_being_sped_up());
    }
}
