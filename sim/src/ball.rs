//! The match ball: free flight with raycast bounces, capture by a vehicle,
//! orbit around the holder and the shot that releases it.

use crate::arena::{Arena, HitKind, VehicleCollider};
use crate::error::{SimError, SimResult};
use crate::vehicle::VehicleId;
use hyperbol_shared::config::BallConfig;
use hyperbol_shared::team::Team;
use hyperbol_shared::vec3::{
    add, along, flatten, from_ground_angle, ground, ground_angle, ground_direction, reflect,
    scale, sub, Vec3,
};
use rand::Rng;
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallState {
    FreeFlight,
    /// Orbiting the vehicle that holds it
    Captured(VehicleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    Goal,
    OutOfBounds,
    /// The vehicle holding it left the match
    HolderLeft,
}

/// Things that happened to the ball during a tick, for the match to act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BallEvent {
    WallBounce { point: Vec3 },
    /// Entered the goal mouth defended by `defended_by`
    Goal { defended_by: Team },
    Captured { by: VehicleId },
    Shot { by: VehicleId, team: Team },
    Reset { reason: ResetReason },
}

#[derive(Debug, Clone)]
pub struct Ball {
    config: BallConfig,
    start: Vec3,
    pub position: Vec3,
    /// Unit ground-plane vector, zero while resting or captured
    pub direction: Vec3,
    pub fly_speed: f64,
    pub current_max_speed: f64,
    pub reset_speed_timer: f64,
    /// Radians in `[0, TAU)`
    pub spin_angle: f64,
    pub state: BallState,
    /// Shooter the ball is still overlapping; it cannot recapture until clear.
    released_by: Option<VehicleId>,
}

impl Ball {
    /// `config` must already be validated.
    pub fn new(config: BallConfig, start: Vec3) -> Self {
        let mut ball = Self {
            start,
            position: start,
            direction: Vec3::ZERO,
            fly_speed: config.base_move_speed,
            current_max_speed: config.base_move_speed,
            reset_speed_timer: 0.0,
            spin_angle: 0.0,
            state: BallState::FreeFlight,
            released_by: None,
            config,
        };
        ball.reset();
        ball
    }

    pub fn config(&self) -> &BallConfig {
        &self.config
    }

    pub fn holder(&self) -> Option<VehicleId> {
        match self.state {
            BallState::Captured(id) => Some(id),
            BallState::FreeFlight => None,
        }
    }

    pub fn is_resting(&self) -> bool {
        self.state == BallState::FreeFlight && self.direction.is_zero()
    }

    /// Back to the start spot, at rest and at base speed.
    pub fn reset(&mut self) {
        self.position = self.start;
        self.direction = Vec3::ZERO;
        self.fly_speed = self.config.base_move_speed;
        self.current_max_speed = self.config.base_move_speed;
        self.reset_speed_timer = 0.0;
        self.spin_angle = 0.0;
        self.state = BallState::FreeFlight;
        self.released_by = None;
    }

    /// Send a resting ball off in a random ground direction at base speed.
    pub fn launch_random(&mut self, rng: &mut impl Rng) {
        let angle = rng.gen_range(0.0..TAU);
        self.direction = from_ground_angle(angle);
        self.fly_speed = self.config.base_move_speed;
        self.current_max_speed = self.config.base_move_speed;
    }

    /// Boost the current speed by `percentage` and start the decay timer.
    pub fn speed_up(&mut self, percentage: u32) {
        let factor = (100.0 + percentage as f64) / 100.0;
        self.current_max_speed = (self.fly_speed * factor).min(self.config.move_speed_cap);
        self.fly_speed = self.current_max_speed;
        self.reset_speed_timer = self.config.time_to_reset_speed;
    }

    /// Enter orbit around `holder`, starting from wherever the ball is now.
    pub fn receive(&mut self, holder: VehicleId, holder_position: Vec3) {
        self.direction = Vec3::ZERO;
        let offset = flatten(sub(self.position, holder_position));
        self.spin_angle = ground_angle(offset).rem_euclid(TAU);
        self.state = BallState::Captured(holder);
        self.current_max_speed = self.fly_speed;
        self.reset_speed_timer = self.config.time_to_reset_speed_when_held;
        self.released_by = None;
    }

    /// Release the ball away from its holder with a speed boost. Returns
    /// `None` if the ball is not held.
    pub fn shoot(&mut self, team: Team, holder_position: Vec3) -> Option<BallEvent> {
        let holder = self.holder()?;

        let mut direction = ground_direction(sub(self.position, holder_position));
        if direction.is_zero() {
            direction = from_ground_angle(self.spin_angle);
        }
        self.direction = direction;
        self.state = BallState::FreeFlight;
        self.released_by = Some(holder);
        self.speed_up(self.config.shoot_speed_increase_percentage);

        Some(BallEvent::Shot { by: holder, team })
    }

    /// Boost remaining on `[0, 1]` between base speed and the cap.
    pub fn glow_portion(&self) -> f64 {
        let span = self.config.move_speed_cap - self.config.base_move_speed;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.fly_speed - self.config.base_move_speed) / span).clamp(0.0, 1.0)
    }

    pub fn glow_color(&self) -> u32 {
        let portion = self.glow_portion();
        if portion == 0.0 {
            return self.config.default_color;
        }
        self.config.color_over_speed.evaluate(portion)
    }

    /// Advance one tick. `vehicles` must include the holder while captured.
    pub fn update(
        &mut self,
        dt: f64,
        arena: &Arena,
        vehicles: &[VehicleCollider],
    ) -> SimResult<Vec<BallEvent>> {
        let mut events = Vec::new();
        match self.state {
            BallState::FreeFlight => self.fly(dt, arena, vehicles, &mut events),
            BallState::Captured(id) => {
                let holder = vehicles.iter().find(|v| v.id == id).ok_or_else(|| {
                    SimError::InvariantViolation(format!("ball held by missing vehicle {}", id))
                })?;
                self.orbit(dt, arena, holder);
            }
        }
        Ok(events)
    }

    fn decay_speed(&mut self, dt: f64, reset_time: f64) {
        if self.reset_speed_timer > 0.0 {
            self.reset_speed_timer -= dt;
            if self.reset_speed_timer <= 0.0 {
                self.reset_speed_timer = 0.0;
                self.fly_speed = self.config.base_move_speed;
                self.current_max_speed = self.config.base_move_speed;
            } else {
                let progress = (reset_time - self.reset_speed_timer) / reset_time;
                let boost = self.config.drag_curve.evaluate(progress);
                let base = self.config.base_move_speed;
                self.fly_speed = base + (self.current_max_speed - base) * boost;
            }
        }
        self.fly_speed = self.fly_speed.clamp(0.0, self.config.move_speed_cap);
    }

    fn fly(
        &mut self,
        dt: f64,
        arena: &Arena,
        vehicles: &[VehicleCollider],
        events: &mut Vec<BallEvent>,
    ) {
        self.decay_speed(dt, self.config.time_to_reset_speed);
        let radius = self.config.radius;

        if let Some(shooter) = self.released_by {
            let still_touching = vehicles
                .iter()
                .filter(|v| v.id == shooter)
                .any(|v| arena.overlapping_vehicle(self.position, radius, &[*v]).is_some());
            if !still_touching {
                self.released_by = None;
            }
        }

        // A hull sitting on the ball picks it up without a ray ever hitting it.
        let touchable: Vec<VehicleCollider> = vehicles
            .iter()
            .filter(|v| Some(v.id) != self.released_by)
            .copied()
            .collect();
        if let Some(id) = arena.overlapping_vehicle(self.position, radius, &touchable) {
            if let Some(holder) = touchable.iter().find(|v| v.id == id) {
                self.receive(id, holder.center);
                events.push(BallEvent::Captured { by: id });
                return;
            }
        }

        if self.direction.is_zero() {
            return;
        }

        let mut remaining = self.fly_speed * dt;
        let mut bounces = 0;
        while remaining > 0.0 {
            let leading_edge = along(self.position, self.direction, radius);
            let hit = match arena.raycast(leading_edge, self.direction, remaining, vehicles) {
                Some(hit) => hit,
                None => {
                    self.position = along(self.position, self.direction, remaining);
                    break;
                }
            };

            match hit.kind {
                HitKind::Goal(defended_by) => {
                    events.push(BallEvent::Goal { defended_by });
                    self.reset();
                    events.push(BallEvent::Reset {
                        reason: ResetReason::Goal,
                    });
                    return;
                }
                HitKind::Vehicle(id) => {
                    self.position = sub(hit.point, scale(self.direction, radius));
                    if let Some(holder) = vehicles.iter().find(|v| v.id == id) {
                        self.receive(id, holder.center);
                        events.push(BallEvent::Captured { by: id });
                    }
                    return;
                }
                HitKind::Wall => {
                    self.position = sub(hit.point, scale(self.direction, radius));
                    self.direction = ground_direction(reflect(self.direction, hit.normal));
                    remaining -= hit.distance;
                    events.push(BallEvent::WallBounce { point: hit.point });

                    bounces += 1;
                    if bounces >= self.config.max_bounces_per_tick {
                        break;
                    }
                }
            }
        }

        if arena.is_out_of_bounds(self.position) {
            self.reset();
            events.push(BallEvent::Reset {
                reason: ResetReason::OutOfBounds,
            });
        }
    }

    fn orbit(&mut self, dt: f64, arena: &Arena, holder: &VehicleCollider) {
        // Once the held timer runs out the ball is back to base and stays
        // there, so holding it longer builds no charge.
        self.decay_speed(dt, self.config.time_to_reset_speed_when_held);

        // TAU / (circumference / (speed / multiplier)), without the division by zero at rest
        let surface_speed = self.fly_speed / self.config.spin_speed_multiplier;
        let rotation_speed = TAU * surface_speed / self.config.circle_distance();
        self.spin_angle = (self.spin_angle + rotation_speed * dt).rem_euclid(TAU);

        let offset = scale(from_ground_angle(self.spin_angle), self.config.spin_distance);
        let offset = ground(
            self.clamp_to_walls(arena, holder.center, offset.x, ground(offset.x.signum(), 0.0)),
            self.clamp_to_walls(arena, holder.center, offset.z, ground(0.0, offset.z.signum())),
        );
        self.position = add(holder.center, offset);
    }

    /// Shorten one axis of the orbit offset so the ball keeps
    /// `radius + wall_offset` clear of whatever static geometry lies that way.
    fn clamp_to_walls(&self, arena: &Arena, center: Vec3, component: f64, towards: Vec3) -> f64 {
        if component == 0.0 {
            return component;
        }
        let clearance = self.config.radius + self.config.wall_offset;
        let reach = self.config.spin_distance + clearance;
        match arena.raycast_static(center, towards, reach) {
            Some(hit) => {
                let max_safe = (hit.distance - clearance).max(0.0);
                component.signum() * component.abs().min(max_safe)
            }
            None => component,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperbol_shared::config::ArenaConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "Expected {} to be close to {}",
            actual,
            expected
        );
    }

    fn arena() -> Arena {
        Arena::new(ArenaConfig::default())
    }

    fn ball() -> Ball {
        Ball::new(BallConfig::default(), Vec3::ZERO)
    }

    fn collider(id: VehicleId, x: f64, z: f64) -> VehicleCollider {
        VehicleCollider {
            id,
            center: ground(x, z),
            radius: 1.0,
        }
    }

    fn flying(position: Vec3, direction: Vec3, speed: f64) -> Ball {
        let mut b = ball();
        b.position = position;
        b.direction = ground_direction(direction);
        b.fly_speed = speed;
        b.current_max_speed = speed;
        b
    }

    #[test]
    fn reset_is_idempotent() {
        let mut b = flying(ground(3.0, 4.0), ground(1.0, 0.0), 30.0);
        b.spin_angle = 1.0;
        b.reset_speed_timer = 2.0;
        b.reset();
        let once = b.clone();
        b.reset();
        assert_eq!(b.position, once.position);
        assert_eq!(b.direction, once.direction);
        assert_eq!(b.fly_speed, once.fly_speed);
        assert_eq!(b.state, once.state);
        assert_eq!(b.position, Vec3::ZERO);
        assert_eq!(b.fly_speed, 10.0);
        assert_eq!(b.state, BallState::FreeFlight);
        assert!(b.is_resting());
    }

    #[test]
    fn wall_bounce_preserves_speed() {
        let mut b = flying(ground(0.0, 15.0), ground(0.0, 1.0), 10.0);
        let events = b.update(0.5, &arena(), &[]).unwrap();

        assert_eq!(
            events,
            vec![BallEvent::WallBounce {
                point: ground(0.0, 18.0)
            }]
        );
        assert_eq!(b.fly_speed, 10.0);
        assert_close(b.direction.z, -1.0);
        assert_close(b.position.z, 15.0);
    }

    #[test]
    fn free_flight_moves_full_distance_without_hits() {
        let mut b = flying(Vec3::ZERO, ground(1.0, 0.0), 10.0);
        let events = b.update(0.1, &arena(), &[]).unwrap();
        assert!(events.is_empty());
        assert_close(b.position.x, 1.0);
    }

    #[test]
    fn captured_then_shot_boosts_speed_by_half() {
        let mut b = ball();
        b.receive(1, ground(-1.0, 0.0));
        assert_eq!(b.state, BallState::Captured(1));
        assert_eq!(b.current_max_speed, 10.0);

        let event = b.shoot(Team::Red, ground(-1.0, 0.0));
        assert_eq!(
            event,
            Some(BallEvent::Shot {
                by: 1,
                team: Team::Red
            })
        );
        assert_close(b.fly_speed, 15.0);
        assert_eq!(b.holder(), None);
        assert_close(b.direction.x, 1.0);
    }

    #[test]
    fn shooting_a_free_ball_does_nothing() {
        let mut b = ball();
        assert_eq!(b.shoot(Team::Blue, ground(1.0, 0.0)), None);
        assert_eq!(b.fly_speed, 10.0);
    }

    #[test]
    fn boost_is_capped() {
        let mut b = ball();
        b.fly_speed = 90.0;
        b.speed_up(50);
        assert_eq!(b.fly_speed, 100.0);
        assert_eq!(b.current_max_speed, 100.0);
    }

    #[test]
    fn goal_preempts_remaining_bounces() {
        // Off the -Z side wall, then straight into the blue goal mouth with
        // distance to spare.
        let mut b = flying(ground(8.0, -15.0), ground(1.0, -1.0), 40.0);
        let events = b.update(1.0, &arena(), &[]).unwrap();

        assert!(matches!(events[0], BallEvent::WallBounce { .. }));
        assert_eq!(
            events[1..],
            [
                BallEvent::Goal {
                    defended_by: Team::Blue
                },
                BallEvent::Reset {
                    reason: ResetReason::Goal
                },
            ]
        );
        assert_eq!(b.position, Vec3::ZERO);
        assert_eq!(b.fly_speed, 10.0);
        assert!(b.is_resting());
    }

    #[test]
    fn bounce_budget_limits_a_tick() {
        let config = BallConfig {
            max_bounces_per_tick: 1,
            ..Default::default()
        };
        let mut b = Ball::new(config, Vec3::ZERO);
        b.position = ground(0.0, 15.0);
        b.direction = ground(0.0, 1.0);
        b.fly_speed = 100.0;
        let events = b.update(1.0, &arena(), &[]).unwrap();
        assert_eq!(events.len(), 1);
        assert_close(b.position.z, 17.5);
    }

    #[test]
    fn flying_into_a_vehicle_captures() {
        let mut b = flying(Vec3::ZERO, ground(1.0, 0.0), 10.0);
        let vehicles = [collider(4, 3.0, 0.0)];
        let events = b.update(1.0, &arena(), &vehicles).unwrap();

        assert_eq!(events, vec![BallEvent::Captured { by: 4 }]);
        assert_eq!(b.state, BallState::Captured(4));
        assert_eq!(b.direction, Vec3::ZERO);
        assert_close(b.position.x, 1.5);
        // Ball sits on the -X side of the holder.
        assert_close(b.spin_angle, std::f64::consts::PI);
    }

    #[test]
    fn resting_ball_is_picked_up_by_overlap() {
        let mut b = ball();
        let vehicles = [collider(2, 0.0, 1.2)];
        let events = b.update(1.0 / 60.0, &arena(), &vehicles).unwrap();
        assert_eq!(events, vec![BallEvent::Captured { by: 2 }]);
        assert_eq!(b.holder(), Some(2));
    }

    #[test]
    fn shooter_cannot_recapture_while_overlapping() {
        let mut b = ball();
        let holder = collider(1, -1.0, 0.0);
        b.receive(1, holder.center);
        b.shoot(Team::Red, holder.center);

        let events = b.update(1.0 / 60.0, &arena(), &[holder]).unwrap();
        assert!(events.is_empty());
        assert_eq!(b.state, BallState::FreeFlight);
    }

    #[test]
    fn leaving_the_pitch_resets() {
        let mut b = flying(ground(0.0, 39.0), ground(0.0, 1.0), 10.0);
        let events = b.update(0.5, &arena(), &[]).unwrap();
        assert_eq!(
            events,
            vec![BallEvent::Reset {
                reason: ResetReason::OutOfBounds
            }]
        );
        assert_eq!(b.position, Vec3::ZERO);
    }

    #[test]
    fn orbit_follows_the_holder() {
        let mut b = ball();
        let holder = collider(1, 5.0, 5.0);
        b.receive(1, holder.center);
        b.spin_angle = 0.0;
        b.update(0.0, &arena(), &[holder]).unwrap();
        assert_close(b.position.x, 6.0);
        assert_close(b.position.z, 5.0);
    }

    #[test]
    fn orbit_rate_scales_with_speed() {
        let mut b = ball();
        let holder = collider(1, 0.0, 0.0);
        b.receive(1, ground(-1.0, 0.0));
        b.spin_angle = 0.0;
        b.update(0.1, &arena(), &[holder]).unwrap();
        // 10 / 5 = 2 units/s around a unit circle: 2 rad/s
        assert_close(b.spin_angle, 0.2);
    }

    #[test]
    fn orbit_angle_wraps() {
        let mut b = ball();
        let holder = collider(1, 0.0, 0.0);
        b.receive(1, ground(-1.0, 0.0));
        b.spin_angle = TAU - 0.05;
        b.update(0.1, &arena(), &[holder]).unwrap();
        assert!(b.spin_angle >= 0.0 && b.spin_angle < TAU);
        assert_close(b.spin_angle, 0.15);
    }

    #[test]
    fn orbit_is_clamped_off_walls() {
        let mut b = ball();
        let holder = collider(1, 0.0, 17.0);
        b.receive(1, ground(-1.0, 0.0));
        b.spin_angle = FRAC_PI_2 - 0.1;
        b.update(0.05, &arena(), &[holder]).unwrap();
        // Wall is 1 away, clearance 0.6
        assert_close(b.position.z, 17.4);
        assert_close(b.position.x, 0.0);
    }

    #[test]
    fn missing_holder_is_an_invariant_violation() {
        let mut b = ball();
        b.receive(9, ground(1.0, 0.0));
        let result = b.update(1.0 / 60.0, &arena(), &[]);
        assert!(matches!(result, Err(SimError::InvariantViolation(_))));
    }

    #[test]
    fn boost_decays_back_to_base() {
        let mut b = ball();
        b.speed_up(100);
        assert_eq!(b.fly_speed, 20.0);
        b.decay_speed(2.5, 5.0);
        assert_close(b.fly_speed, 15.0);
        b.decay_speed(2.5, 5.0);
        assert_eq!(b.fly_speed, 10.0);
        assert_eq!(b.current_max_speed, 10.0);
        assert_eq!(b.reset_speed_timer, 0.0);
    }

    #[test]
    fn held_past_timer_loses_charge() {
        let mut b = ball();
        b.speed_up(100);
        let holder = collider(1, 0.0, 0.0);
        b.receive(1, ground(-1.0, 0.0));
        assert_eq!(b.current_max_speed, 20.0);
        for _ in 0..(6 * 60) {
            b.update(1.0 / 60.0, &arena(), &[holder]).unwrap();
        }
        assert_eq!(b.current_max_speed, 10.0);
        assert_eq!(b.fly_speed, 10.0);
        b.shoot(Team::Blue, holder.center);
        assert_close(b.fly_speed, 15.0);
    }

    #[test]
    fn random_launch_is_seeded_and_at_base_speed() {
        let mut a = ball();
        let mut b = ball();
        a.launch_random(&mut ChaCha8Rng::seed_from_u64(7));
        b.launch_random(&mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a.direction, b.direction);
        assert_close(a.direction.x.hypot(a.direction.z), 1.0);
        assert_eq!(a.direction.y, 0.0);
        assert_eq!(a.fly_speed, 10.0);
    }

    #[test]
    fn glow_tracks_speed() {
        let mut b = ball();
        assert_eq!(b.glow_portion(), 0.0);
        assert_eq!(b.glow_color(), 0xd8f0ff);
        b.fly_speed = 100.0;
        assert_eq!(b.glow_portion(), 1.0);
        assert_eq!(b.glow_color(), 0xff1aa3);
        b.fly_speed = 55.0;
        assert_close(b.glow_portion(), 0.5);
        assert_eq!(b.glow_color(), 0xff8c1a);
    }
}
