use crate::team::Team;
use serde::{Deserialize, Serialize};

/// Snapshot format version. Bump when a field changes meaning.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Waiting for the kickoff after a reset
    Kickoff,
    Playing,
    /// Overlay delay after a goal; vehicles ignore input
    GoalScored,
    Ended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWire {
    pub red: u32,
    pub blue: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallWire {
    pub pos: [f64; 3],
    pub direction: [f64; 3],
    pub fly_speed: f64,
    /// Vehicle currently orbiting the ball, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub held_by: Option<u32>,
    pub spin_angle: f64,
    pub glow_color: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleWire {
    pub id: u32,
    pub team: Team,
    pub pos: [f64; 3],
    pub yaw: f64,
    pub roll: f64,
    pub speed: f64,
    #[serde(default)]
    pub holding_ball: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub version: u32,
    pub frame: u64,
    pub time_left: f64,
    pub phase: MatchPhase,
    pub score: ScoreWire,
    pub ball: BallWire,
    pub vehicles: Vec<VehicleWire>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_camel_case_and_skips_empty_holder() {
        let snapshot = MatchSnapshot {
            version: SNAPSHOT_VERSION,
            frame: 3,
            time_left: 299.5,
            phase: MatchPhase::GoalScored,
            score: ScoreWire { red: 1, blue: 0 },
            ball: BallWire {
                pos: [0.0, 0.0, 0.0],
                direction: [1.0, 0.0, 0.0],
                fly_speed: 10.0,
                held_by: None,
                spin_angle: 0.0,
                glow_color: 0xffffff,
            },
            vehicles: vec![VehicleWire {
                id: 1,
                team: Team::Blue,
                pos: [1.0, 0.0, 2.0],
                yaw: 90.0,
                roll: 0.0,
                speed: 0.0,
                holding_ball: false,
            }],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["timeLeft"], 299.5);
        assert_eq!(json["phase"], "goal_scored");
        assert_eq!(json["ball"]["flySpeed"], 10.0);
        assert!(json["ball"].get("heldBy").is_none());
        assert_eq!(json["vehicles"][0]["team"], "blue");
        assert_eq!(json["vehicles"][0]["holdingBall"], false);
    }
}
