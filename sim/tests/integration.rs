//! Integration tests for the match loop.
//!
//! These tests run a real match loop task and talk to it only through its
//! command and broadcast channels.

use hyperbol_shared::protocol::{MatchPhase, MatchSnapshot};
use hyperbol_shared::team::Team;
use hyperbol_sim::config::MatchConfig;
use hyperbol_sim::controls::{DeviceState, KeyState};
use hyperbol_sim::error::{SimError, SimResult};
use hyperbol_sim::game_loop::{run_match_loop, MatchBroadcast, MatchCommand};
use hyperbol_sim::state::ControllerKind;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

struct TestMatch {
    cmd_tx: mpsc::Sender<MatchCommand>,
    broadcast_rx: broadcast::Receiver<MatchBroadcast>,
    task: JoinHandle<SimResult<()>>,
}

fn start_match(config: MatchConfig) -> TestMatch {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (broadcast_tx, broadcast_rx) = broadcast::channel(1024);
    let task = tokio::spawn(run_match_loop(cmd_rx, broadcast_tx, config));
    TestMatch {
        cmd_tx,
        broadcast_rx,
        task,
    }
}

async fn join(
    m: &TestMatch,
    team: Option<Team>,
    controller: ControllerKind,
) -> SimResult<u32> {
    let (response, rx) = oneshot::channel();
    m.cmd_tx
        .send(MatchCommand::Join {
            team,
            controller,
            response,
        })
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(2), rx)
        .await
        .expect("join timed out")
        .expect("match loop dropped the response")
}

/// Wait for the next snapshot matching `pred`.
async fn snapshot_where(
    rx: &mut broadcast::Receiver<MatchBroadcast>,
    pred: impl Fn(&MatchSnapshot) -> bool,
) -> MatchSnapshot {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(MatchBroadcast::Snapshot(s)) if pred(&s) => return s,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("match loop closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("no matching snapshot")
}

#[tokio::test]
async fn joined_vehicle_appears_in_snapshots() {
    let mut m = start_match(MatchConfig::default());
    let id = join(&m, Some(Team::Blue), ControllerKind::Keyboard)
        .await
        .unwrap();

    let snapshot = snapshot_where(&mut m.broadcast_rx, |s| !s.vehicles.is_empty()).await;
    assert_eq!(snapshot.vehicles[0].id, id);
    assert_eq!(snapshot.vehicles[0].team, Team::Blue);
    assert_eq!(snapshot.score.red, 0);
    assert_eq!(snapshot.score.blue, 0);
}

#[tokio::test]
async fn full_team_rejects_join() {
    let m = start_match(MatchConfig::default());
    join(&m, Some(Team::Red), ControllerKind::Keyboard)
        .await
        .unwrap();
    join(&m, Some(Team::Red), ControllerKind::Gamepad)
        .await
        .unwrap();
    let third = join(&m, Some(Team::Red), ControllerKind::Keyboard).await;
    assert!(matches!(third, Err(SimError::ArenaFull(Team::Red))));
}

#[tokio::test]
async fn keyboard_input_moves_the_vehicle() {
    let mut m = start_match(MatchConfig::default());
    let id = join(&m, Some(Team::Red), ControllerKind::Keyboard)
        .await
        .unwrap();
    let start = snapshot_where(&mut m.broadcast_rx, |s| !s.vehicles.is_empty()).await;
    let start_x = start.vehicles[0].pos[0];

    m.cmd_tx
        .send(MatchCommand::Input {
            id,
            state: DeviceState::Keyboard(KeyState {
                forward: true,
                ..Default::default()
            }),
        })
        .await
        .unwrap();

    let moved = snapshot_where(&mut m.broadcast_rx, |s| {
        s.vehicles.first().map_or(false, |v| v.pos[0] > start_x + 0.5)
    })
    .await;
    assert!(moved.vehicles[0].speed > 0.0);
}

#[tokio::test]
async fn commands_for_unknown_vehicles_are_ignored() {
    let mut m = start_match(MatchConfig::default());
    m.cmd_tx
        .send(MatchCommand::Launch { id: 99 })
        .await
        .unwrap();
    m.cmd_tx
        .send(MatchCommand::QuickStop { id: 99 })
        .await
        .unwrap();
    m.cmd_tx.send(MatchCommand::Leave { id: 99 }).await.unwrap();

    // Still ticking afterwards.
    let first = snapshot_where(&mut m.broadcast_rx, |_| true).await;
    let later = snapshot_where(&mut m.broadcast_rx, |s| s.frame > first.frame).await;
    assert!(later.frame > first.frame);
}

#[tokio::test]
async fn match_ends_with_final_score() {
    let config = MatchConfig {
        match_duration_secs: 0.5,
        ..Default::default()
    };
    let mut m = start_match(config);

    let ended = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match m.broadcast_rx.recv().await {
                Ok(MatchBroadcast::MatchEnded { score }) => return score,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("closed before match end"),
            }
        }
    })
    .await
    .expect("match did not end");
    assert_eq!(ended.red + ended.blue, 0);

    let last = snapshot_where(&mut m.broadcast_rx, |s| s.phase == MatchPhase::Ended).await;
    assert_eq!(last.time_left, 0.0);

    let result = tokio::time::timeout(Duration::from_secs(2), m.task)
        .await
        .expect("loop did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn loop_stops_when_commands_close() {
    let m = start_match(MatchConfig::default());
    drop(m.cmd_tx);
    let result = tokio::time::timeout(Duration::from_secs(2), m.task)
        .await
        .expect("loop did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn bots_play_a_match() {
    let config = MatchConfig {
        match_duration_secs: 2.0,
        kickoff_delay_secs: 0.0,
        ..Default::default()
    };
    let mut m = start_match(config);
    for team in [Team::Red, Team::Red, Team::Blue, Team::Blue] {
        join(&m, Some(team), ControllerKind::Bot(None)).await.unwrap();
    }

    let playing = snapshot_where(&mut m.broadcast_rx, |s| {
        s.vehicles.len() == 4 && s.phase == MatchPhase::Playing
    })
    .await;
    let json = serde_json::to_string(&playing).unwrap();
    assert!(json.contains("\"flySpeed\""));
    assert!(json.contains("\"holdingBall\""));

    snapshot_where(&mut m.broadcast_rx, |s| s.phase == MatchPhase::Ended).await;
}
