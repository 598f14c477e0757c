use crate::config::MatchConfig;
use crate::controls::DeviceState;
use crate::error::{SimError, SimResult};
use crate::state::{ControllerKind, MatchEvent, MatchState};
use crate::vehicle::VehicleId;
use hyperbol_shared::protocol::{MatchPhase, MatchSnapshot, ScoreWire};
use hyperbol_shared::team::Team;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands from players to the match loop
#[derive(Debug)]
pub enum MatchCommand {
    Join {
        team: Option<Team>,
        controller: ControllerKind,
        response: oneshot::Sender<SimResult<VehicleId>>,
    },
    Leave {
        id: VehicleId,
    },
    Input {
        id: VehicleId,
        state: DeviceState,
    },
    Launch {
        id: VehicleId,
    },
    QuickStop {
        id: VehicleId,
    },
}

/// Broadcasts from the match loop to every subscriber
#[derive(Debug, Clone)]
pub enum MatchBroadcast {
    Snapshot(MatchSnapshot),
    Goal { scoring_team: Team, score: ScoreWire },
    MatchEnded { score: ScoreWire },
}

/// Run the match loop. Owns all match state and returns once the match is
/// over or every command sender is gone.
pub async fn run_match_loop(
    mut cmd_rx: mpsc::Receiver<MatchCommand>,
    broadcast_tx: broadcast::Sender<MatchBroadcast>,
    config: MatchConfig,
) -> SimResult<()> {
    let mut state = MatchState::new(config)?;

    let frame_dt = state.config().frame_dt();
    let broadcast_every_n = state.config().broadcast_every_n();

    let mut frame_interval = tokio::time::interval(Duration::from_secs_f64(frame_dt));
    frame_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = frame_interval.tick() => {
                let events = state.advance(frame_dt).map_err(|e| {
                    tracing::error!("Match aborted: {}", e);
                    e
                })?;

                for event in events {
                    let msg = match event {
                        MatchEvent::Goal { scoring_team, score } => MatchBroadcast::Goal {
                            scoring_team,
                            score: score.to_wire(),
                        },
                        MatchEvent::Ended { score } => MatchBroadcast::MatchEnded {
                            score: score.to_wire(),
                        },
                    };
                    let _ = broadcast_tx.send(msg);
                }

                // Snapshots at a lower rate, plus a final one when the match ends
                let ended = state.phase() == MatchPhase::Ended;
                if state.frame() % broadcast_every_n == 0 || ended {
                    let _ = broadcast_tx.send(MatchBroadcast::Snapshot(state.snapshot()));
                }
                if ended {
                    break;
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut state, cmd),
                    None => break,
                }
            }
        }
    }

    tracing::info!("Match loop ended");
    Ok(())
}

fn handle_command(state: &mut MatchState, cmd: MatchCommand) {
    let result = match cmd {
        MatchCommand::Join {
            team,
            controller,
            response,
        } => {
            let _ = response.send(state.join(team, controller));
            Ok(())
        }
        MatchCommand::Leave { id } => state.leave(id),
        MatchCommand::Input { id, state: input } => state.feed_input(id, input),
        MatchCommand::Launch { id } => state.launch(id).map(|_| ()),
        MatchCommand::QuickStop { id } => state.quick_stop(id).map(|_| ()),
    };

    match result {
        Ok(()) => {}
        Err(SimError::UnknownVehicle(id)) => {
            tracing::warn!("Ignoring command for unknown vehicle {}", id);
        }
        Err(e) => tracing::error!("Command failed: {}", e),
    }
}
