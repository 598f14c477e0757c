//! Bot drivers that stand in for human players.
//!
//! Bots are lightweight state machines behind the same [`InputSource`] seam
//! as keyboards and gamepads:
//! - Without the ball they steer at it and drive
//! - Holding the ball they head for the opposing goal, wait out a
//!   personality-dependent delay, then shoot once the orbit lines the ball
//!   up with the goal

use crate::controls::{ControlContext, ControlFrame, InputSource};
use hyperbol_shared::kinematics::delta_angle;
use hyperbol_shared::vec3::{dot, ground_direction, sub, Vec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Heading error (degrees) at which bots steer at full portion
const FULL_STEER_ANGLE: f64 = 45.0;

/// Seconds a bot keeps the ball past its delay waiting for a clean angle
const MAX_EXTRA_HOLD: f64 = 3.0;

/// Bot personality affects timing and accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotPersonality {
    /// Shoots quickly (0.3-0.8s hold)
    Eager,
    /// Carries the ball for a while (1.5-4.0s hold)
    Relaxed,
    /// Unpredictable timing and wobbly steering (0.2-6.0s hold)
    Chaotic,
}

impl BotPersonality {
    pub const ALL: [BotPersonality; 3] = [
        BotPersonality::Eager,
        BotPersonality::Relaxed,
        BotPersonality::Chaotic,
    ];

    /// Hold delay range for this personality (min, max) in seconds
    fn delay_range(&self) -> (f64, f64) {
        match self {
            BotPersonality::Eager => (0.3, 0.8),
            BotPersonality::Relaxed => (1.5, 4.0),
            BotPersonality::Chaotic => (0.2, 6.0),
        }
    }

    fn random_delay(&self, rng: &mut impl Rng) -> f64 {
        let (min, max) = self.delay_range();
        min + rng.gen::<f64>() * (max - min)
    }

    /// How far off the goal line (degrees) a shot may be
    fn aim_tolerance(&self) -> f64 {
        match self {
            BotPersonality::Eager => 35.0,
            BotPersonality::Relaxed => 20.0,
            BotPersonality::Chaotic => 60.0,
        }
    }

    /// Random steering wobble added each frame
    fn steer_noise(&self, rng: &mut impl Rng) -> f64 {
        match self {
            BotPersonality::Chaotic => rng.gen_range(-0.4..0.4),
            _ => 0.0,
        }
    }

    /// Select a random personality
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => BotPersonality::Eager,
            1 => BotPersonality::Relaxed,
            _ => BotPersonality::Chaotic,
        }
    }
}

/// A bot driving one vehicle
#[derive(Debug, Clone)]
pub struct BotPlayer {
    pub personality: BotPersonality,
    /// Time left before the bot is willing to shoot
    hold_delay: Option<f64>,
    /// Time spent holding past the delay
    overtime: f64,
}

impl BotPlayer {
    pub fn new(personality: BotPersonality) -> Self {
        Self {
            personality,
            hold_delay: None,
            overtime: 0.0,
        }
    }

    fn steer_towards(&self, ctx: &ControlContext, point: Vec3) -> (f64, f64) {
        let to_point = sub(point, ctx.position);
        let heading = to_point.x.atan2(to_point.z).to_degrees();
        let error = delta_angle(ctx.yaw, heading);
        ((error / FULL_STEER_ANGLE).clamp(-1.0, 1.0), error)
    }

    /// Whether a shot now (straight out from the hull through the ball)
    /// would head at the goal.
    fn lined_up(&self, ctx: &ControlContext) -> bool {
        let shot = ground_direction(sub(ctx.ball_position, ctx.position));
        let to_goal = ground_direction(sub(ctx.target_goal, ctx.ball_position));
        dot(shot, to_goal) >= self.personality.aim_tolerance().to_radians().cos()
    }

    fn carry(&mut self, ctx: &ControlContext, dt: f64, rng: &mut ChaCha8Rng) -> ControlFrame {
        let personality = self.personality;
        let delay = self
            .hold_delay
            .get_or_insert_with(|| personality.random_delay(rng));
        *delay -= dt;
        let ready = *delay <= 0.0;
        if ready {
            self.overtime += dt;
        }

        let (steer, _) = self.steer_towards(ctx, ctx.target_goal);
        let launch = ready && (self.lined_up(ctx) || self.overtime >= MAX_EXTRA_HOLD);
        if launch {
            self.hold_delay = None;
            self.overtime = 0.0;
        }

        ControlFrame {
            steer: (steer + personality.steer_noise(rng)).clamp(-1.0, 1.0),
            throttle: true,
            launch,
            ..Default::default()
        }
    }

    fn chase(&mut self, ctx: &ControlContext, rng: &mut ChaCha8Rng) -> ControlFrame {
        self.hold_delay = None;
        self.overtime = 0.0;

        let (steer, error) = self.steer_towards(ctx, ctx.ball_position);
        ControlFrame {
            steer: (steer + self.personality.steer_noise(rng)).clamp(-1.0, 1.0),
            throttle: error.abs() < 90.0,
            ..Default::default()
        }
    }
}

impl InputSource for BotPlayer {
    fn poll(&mut self, ctx: &ControlContext, dt: f64, rng: &mut ChaCha8Rng) -> ControlFrame {
        if ctx.holding_ball {
            self.carry(ctx, dt, rng)
        } else {
            self.chase(ctx, rng)
        }
    }

    fn reset(&mut self) {
        self.hold_delay = None;
        self.overtime = 0.0;
    }
}
