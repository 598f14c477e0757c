use crate::arena::{Arena, VehicleCollider};
use crate::ball::{Ball, BallEvent, ResetReason};
use crate::bot::{BotPersonality, BotPlayer};
use crate::config::MatchConfig;
use crate::controls::{
    apply_controls, ControlContext, DeviceState, GamepadInput, InputSource, KeyboardInput,
};
use crate::error::{SimError, SimResult};
use crate::observer::{MatchObserver, TracingObserver};
use crate::scheduler::Scheduler;
use crate::spawn::{assign_team, spawn_layout, team_spawns};
use crate::vehicle::{Vehicle, VehicleId};
use hyperbol_shared::protocol::{
    BallWire, MatchPhase, MatchSnapshot, ScoreWire, VehicleWire, SNAPSHOT_VERSION,
};
use hyperbol_shared::team::Team;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Fixed steps allowed per frame before the backlog is dropped
const MAX_FIXED_STEPS_PER_FRAME: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub red: u32,
    pub blue: u32,
}

impl Scoreboard {
    pub fn record(&mut self, team: Team) {
        match team {
            Team::Red => self.red += 1,
            Team::Blue => self.blue += 1,
        }
    }

    pub fn goals(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn to_wire(self) -> ScoreWire {
        ScoreWire {
            red: self.red,
            blue: self.blue,
        }
    }
}

/// Who drives a newly joined vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    Keyboard,
    Gamepad,
    /// `None` picks a personality at random
    Bot(Option<BotPersonality>),
}

/// Match-level outcomes reported by [`MatchState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    Goal {
        scoring_team: Team,
        score: Scoreboard,
    },
    Ended {
        score: Scoreboard,
    },
}

/// Continuations fired by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    FinishQuickStop(VehicleId),
    ResumePlay,
    Kickoff,
}

struct Seat {
    vehicle: Vehicle,
    input: Box<dyn InputSource>,
}

/// Central match state owned by the match loop task.
pub struct MatchState {
    config: MatchConfig,
    arena: Arena,
    pub ball: Ball,
    seats: BTreeMap<VehicleId, Seat>,
    score: Scoreboard,
    scheduler: Scheduler<Deferred>,
    rng: ChaCha8Rng,
    observer: Box<dyn MatchObserver>,
    /// Simulation time in seconds
    clock: f64,
    time_left: f64,
    /// Unsimulated time carried into the next fixed step
    accumulator: f64,
    frame: u64,
    phase: MatchPhase,
    next_vehicle_id: VehicleId,
}

impl MatchState {
    pub fn new(config: MatchConfig) -> SimResult<Self> {
        Self::with_observer(config, Box::new(TracingObserver))
    }

    pub fn with_observer(config: MatchConfig, observer: Box<dyn MatchObserver>) -> SimResult<Self> {
        config.validate()?;

        let arena = Arena::new(config.arena.clone());
        let ball = Ball::new(config.ball.clone(), arena.ball_start());
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);

        let mut state = Self {
            time_left: config.match_duration_secs,
            config,
            arena,
            ball,
            seats: BTreeMap::new(),
            score: Scoreboard::default(),
            scheduler: Scheduler::new(),
            rng,
            observer,
            clock: 0.0,
            accumulator: 0.0,
            frame: 0,
            phase: MatchPhase::Kickoff,
            next_vehicle_id: 1,
        };
        state.schedule_kickoff();
        tracing::info!(
            "Match started: {:.0}s on a {}x{} pitch",
            state.config.match_duration_secs,
            state.config.arena.half_length * 2.0,
            state.config.arena.half_width * 2.0
        );
        Ok(state)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn score(&self) -> Scoreboard {
        self.score
    }

    pub fn time_left(&self) -> f64 {
        self.time_left
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.seats.get(&id).map(|s| &s.vehicle)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.seats.get_mut(&id).map(|s| &mut s.vehicle)
    }

    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.seats.keys().copied().collect()
    }

    fn team_size(&self, team: Team) -> usize {
        self.seats.values().filter(|s| s.vehicle.team == team).count()
    }

    /// Add a vehicle to the match and return its id.
    pub fn join(&mut self, team: Option<Team>, controller: ControllerKind) -> SimResult<VehicleId> {
        let team = assign_team(self.team_size(Team::Red), self.team_size(Team::Blue), team)?;
        let id = self.next_vehicle_id;
        self.next_vehicle_id += 1;

        let input: Box<dyn InputSource> = match controller {
            ControllerKind::Keyboard => Box::new(KeyboardInput::new()),
            ControllerKind::Gamepad => Box::new(GamepadInput::default()),
            ControllerKind::Bot(personality) => {
                let personality =
                    personality.unwrap_or_else(|| BotPersonality::random(&mut self.rng));
                tracing::info!("Bot {} created with {:?} personality", id, personality);
                Box::new(BotPlayer::new(personality))
            }
        };

        let spawns = team_spawns(&self.config.arena, team);
        let mut vehicle = Vehicle::new(id, team, self.config.vehicle.clone(), spawns.single);
        vehicle.physics.can_receive_input = self.phase != MatchPhase::GoalScored;
        self.seats.insert(id, Seat { vehicle, input });
        self.assign_spawns(team);

        if let Some(seat) = self.seats.get_mut(&id) {
            let spawn = seat.vehicle.spawn;
            seat.vehicle.physics.respawn(spawn);
        }

        tracing::info!("Vehicle {} joined the {:?} team", id, team);
        Ok(id)
    }

    /// Remove a vehicle. A ball it was holding goes back to the centre.
    pub fn leave(&mut self, id: VehicleId) -> SimResult<()> {
        let seat = self.seats.remove(&id).ok_or(SimError::UnknownVehicle(id))?;
        self.scheduler
            .cancel_where(|d| *d == Deferred::FinishQuickStop(id));
        self.assign_spawns(seat.vehicle.team);

        if self.ball.holder() == Some(id) {
            self.ball.reset();
            self.observer.ball_reset(ResetReason::HolderLeft);
            if self.phase != MatchPhase::GoalScored && self.phase != MatchPhase::Ended {
                self.schedule_kickoff();
            }
        }

        tracing::info!("Vehicle {} left", id);
        Ok(())
    }

    /// Spread a team over its spawn layout in join order. Vehicles move there
    /// on their next respawn.
    fn assign_spawns(&mut self, team: Team) {
        let count = self.team_size(team);
        let layout = spawn_layout(team_spawns(&self.config.arena, team), count);
        let members = self
            .seats
            .values_mut()
            .filter(|s| s.vehicle.team == team);
        for (seat, spawn) in members.zip(layout.iter()) {
            seat.vehicle.spawn = *spawn;
        }
    }

    /// Latest device state from a human driver.
    pub fn feed_input(&mut self, id: VehicleId, state: DeviceState) -> SimResult<()> {
        let seat = self
            .seats
            .get_mut(&id)
            .ok_or(SimError::UnknownVehicle(id))?;
        seat.input.feed(state);
        Ok(())
    }

    /// Shoot the ball if `id` holds it. Returns whether a shot happened.
    pub fn launch(&mut self, id: VehicleId) -> SimResult<bool> {
        let seat = self
            .seats
            .get_mut(&id)
            .ok_or(SimError::UnknownVehicle(id))?;
        if !seat.vehicle.physics.can_receive_input {
            return Ok(false);
        }

        let holds = seat.vehicle.take_ball();
        let ball_held_here = self.ball.holder() == Some(id);
        if holds != ball_held_here {
            return Err(SimError::InvariantViolation(format!(
                "vehicle {} holding flag is {} but ball holder is {:?}",
                id,
                holds,
                self.ball.holder()
            )));
        }
        if !holds {
            return Ok(false);
        }

        let team = seat.vehicle.team;
        let position = seat.vehicle.position();
        if let Some(BallEvent::Shot { by, team }) = self.ball.shoot(team, position) {
            self.observer.ball_shot(by, team.color());
        }
        Ok(true)
    }

    /// Start a quick stop. Returns false if one is already running or the
    /// vehicle stopped on the spot.
    pub fn quick_stop(&mut self, id: VehicleId) -> SimResult<bool> {
        let seat = self
            .seats
            .get_mut(&id)
            .ok_or(SimError::UnknownVehicle(id))?;
        let wait = match seat
            .vehicle
            .physics
            .begin_quick_stop(self.config.quick_stop_time_secs)
        {
            Some(wait) => wait,
            None => return Ok(false),
        };
        self.scheduler
            .schedule(self.clock + wait, Deferred::FinishQuickStop(id));
        self.observer.quick_stop(id);
        Ok(true)
    }

    /// Run one rendered frame: fixed physics steps, due timers, input, the
    /// ball, then the frame boundary.
    pub fn advance(&mut self, frame_dt: f64) -> SimResult<Vec<MatchEvent>> {
        let mut events = Vec::new();
        if self.phase == MatchPhase::Ended {
            return Ok(events);
        }

        let fixed_dt = self.config.fixed_dt();
        self.accumulator += frame_dt;
        let mut steps = 0;
        while self.accumulator >= fixed_dt {
            if steps == MAX_FIXED_STEPS_PER_FRAME {
                tracing::warn!("Physics falling behind, dropping {:.3}s", self.accumulator);
                self.accumulator = 0.0;
                break;
            }
            for seat in self.seats.values_mut() {
                seat.vehicle.physics.fixed_update(fixed_dt, &self.arena);
            }
            self.accumulator -= fixed_dt;
            steps += 1;
        }

        self.clock += frame_dt;
        self.time_left = (self.time_left - frame_dt).max(0.0);

        for action in self.scheduler.drain_due(self.clock) {
            self.run_deferred(action);
        }

        self.poll_inputs(frame_dt)?;

        let colliders: Vec<VehicleCollider> =
            self.seats.values().map(|s| s.vehicle.collider()).collect();
        for event in self.ball.update(frame_dt, &self.arena, &colliders)? {
            self.dispatch(event, &mut events)?;
        }

        for seat in self.seats.values_mut() {
            seat.vehicle.physics.late_update();
        }
        self.frame += 1;

        if self.time_left <= 0.0 {
            self.phase = MatchPhase::Ended;
            self.scheduler.clear();
            self.observer.match_ended(&self.score);
            events.push(MatchEvent::Ended { score: self.score });
        }
        Ok(events)
    }

    fn poll_inputs(&mut self, dt: f64) -> SimResult<()> {
        let ball_position = self.ball.position;
        let ball_free = self.ball.holder().is_none();
        let mut launches = Vec::new();
        let mut quick_stops = Vec::new();

        for (id, seat) in self.seats.iter_mut() {
            let vehicle = &mut seat.vehicle;
            let ctx = ControlContext {
                team: vehicle.team,
                position: vehicle.position(),
                yaw: vehicle.physics.body.yaw,
                holding_ball: vehicle.is_holding_ball(),
                ball_position,
                ball_free,
                target_goal: self.arena.goal_center(vehicle.team.opponent()),
            };
            let frame = seat.input.poll(&ctx, dt, &mut self.rng);
            apply_controls(&mut vehicle.physics, &frame, dt);

            if vehicle.physics.can_receive_input {
                if frame.launch {
                    launches.push(*id);
                }
                if frame.quick_stop {
                    quick_stops.push(*id);
                }
            }
        }

        for id in launches {
            self.launch(id)?;
        }
        for id in quick_stops {
            self.quick_stop(id)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: BallEvent, events: &mut Vec<MatchEvent>) -> SimResult<()> {
        match event {
            BallEvent::WallBounce { point } => self.observer.wall_bounce(point),
            BallEvent::Goal { defended_by } => {
                let scoring_team = defended_by.opponent();
                self.score.record(scoring_team);
                self.observer.goal_scored(scoring_team, &self.score);
                events.push(MatchEvent::Goal {
                    scoring_team,
                    score: self.score,
                });
                self.begin_post_goal();
            }
            BallEvent::Captured { by } => {
                let seat = self.seats.get_mut(&by).ok_or_else(|| {
                    SimError::InvariantViolation(format!("ball captured by missing vehicle {}", by))
                })?;
                seat.vehicle.pick_up_ball();
                self.observer.ball_captured(by);
                if self.phase == MatchPhase::Kickoff {
                    self.scheduler.cancel_where(|d| *d == Deferred::Kickoff);
                    self.phase = MatchPhase::Playing;
                }
            }
            BallEvent::Shot { by, team } => self.observer.ball_shot(by, team.color()),
            BallEvent::Reset { reason } => {
                self.observer.ball_reset(reason);
                if reason != ResetReason::Goal && self.phase != MatchPhase::GoalScored {
                    self.schedule_kickoff();
                }
            }
        }
        Ok(())
    }

    fn begin_post_goal(&mut self) {
        self.phase = MatchPhase::GoalScored;
        for seat in self.seats.values_mut() {
            seat.vehicle.physics.can_receive_input = false;
        }
        self.scheduler.cancel_where(|d| *d == Deferred::Kickoff);
        self.scheduler.schedule(
            self.clock + self.config.post_goal_delay_secs,
            Deferred::ResumePlay,
        );
    }

    fn schedule_kickoff(&mut self) {
        self.phase = MatchPhase::Kickoff;
        if !self.scheduler.any(|d| *d == Deferred::Kickoff) {
            self.scheduler
                .schedule(self.clock + self.config.kickoff_delay_secs, Deferred::Kickoff);
        }
    }

    fn run_deferred(&mut self, action: Deferred) {
        match action {
            Deferred::FinishQuickStop(id) => {
                if let Some(seat) = self.seats.get_mut(&id) {
                    seat.vehicle.physics.finish_quick_stop();
                }
            }
            Deferred::ResumePlay => {
                self.scheduler
                    .cancel_where(|d| matches!(d, Deferred::FinishQuickStop(_)));
                for seat in self.seats.values_mut() {
                    let vehicle = &mut seat.vehicle;
                    vehicle.physics.finish_quick_stop();
                    vehicle.physics.respawn(vehicle.spawn);
                    vehicle.physics.can_receive_input = true;
                    vehicle.drop_ball();
                    seat.input.reset();
                }
                self.ball.reset();
                tracing::info!("Play resumed");
                self.schedule_kickoff();
            }
            Deferred::Kickoff => {
                if self.ball.is_resting() {
                    self.ball.launch_random(&mut self.rng);
                    self.observer.kickoff();
                }
                self.phase = MatchPhase::Playing;
            }
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let ball = &self.ball;
        MatchSnapshot {
            version: SNAPSHOT_VERSION,
            frame: self.frame,
            time_left: self.time_left,
            phase: self.phase,
            score: self.score.to_wire(),
            ball: BallWire {
                pos: ball.position.to_array(),
                direction: ball.direction.to_array(),
                fly_speed: ball.fly_speed,
                held_by: ball.holder(),
                spin_angle: ball.spin_angle,
                glow_color: ball.glow_color(),
            },
            vehicles: self
                .seats
                .values()
                .map(|s| {
                    let v = &s.vehicle;
                    VehicleWire {
                        id: v.id,
                        team: v.team,
                        pos: v.position().to_array(),
                        yaw: v.physics.body.yaw,
                        roll: v.physics.body.roll,
                        speed: v.physics.body.speed(),
                        holding_ball: v.is_holding_ball(),
                    }
                })
                .collect(),
        }
    }
}
