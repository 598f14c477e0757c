//! Hooks for the presentation layer around the simulation: score overlay,
//! particle effects, controller rumble. None of them feed back into physics.

use crate::ball::ResetReason;
use crate::state::Scoreboard;
use crate::vehicle::VehicleId;
use hyperbol_shared::team::Team;
use hyperbol_shared::vec3::Vec3;

/// Receives match happenings. Every method defaults to doing nothing.
pub trait MatchObserver: Send {
    fn goal_scored(&mut self, _scoring_team: Team, _score: &Scoreboard) {}

    fn ball_captured(&mut self, _by: VehicleId) {}

    /// `color` is the shooting team's colour for the shot effect.
    fn ball_shot(&mut self, _by: VehicleId, _color: u32) {}

    fn wall_bounce(&mut self, _point: Vec3) {}

    fn ball_reset(&mut self, _reason: ResetReason) {}

    fn quick_stop(&mut self, _vehicle: VehicleId) {}

    fn kickoff(&mut self) {}

    fn match_ended(&mut self, _score: &Scoreboard) {}
}

/// Observer that writes everything to the log.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn goal_scored(&mut self, scoring_team: Team, score: &Scoreboard) {
        tracing::info!(
            "Goal for {:?}! Red {} - {} Blue",
            scoring_team,
            score.red,
            score.blue
        );
    }

    fn ball_captured(&mut self, by: VehicleId) {
        tracing::debug!("Ball captured by vehicle {}", by);
    }

    fn ball_shot(&mut self, by: VehicleId, color: u32) {
        tracing::debug!("Vehicle {} shot the ball (effect #{:06x})", by, color);
    }

    fn wall_bounce(&mut self, point: Vec3) {
        tracing::trace!("Ball bounced at ({:.2}, {:.2})", point.x, point.z);
    }

    fn ball_reset(&mut self, reason: ResetReason) {
        tracing::debug!("Ball reset ({:?})", reason);
    }

    fn quick_stop(&mut self, vehicle: VehicleId) {
        tracing::debug!("Vehicle {} quick stop", vehicle);
    }

    fn kickoff(&mut self) {
        tracing::debug!("Kickoff");
    }

    fn match_ended(&mut self, score: &Scoreboard) {
        tracing::info!("Match over: Red {} - {} Blue", score.red, score.blue);
    }
}
