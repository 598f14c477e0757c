use hyperbol_shared::team::Team;
use hyperbol_sim::config::MatchConfig;
use hyperbol_sim::game_loop::{run_match_loop, MatchBroadcast, MatchCommand};
use hyperbol_sim::state::ControllerKind;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Headless match between four bots. Takes an optional JSON config path.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match MatchConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Could not load configuration from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => MatchConfig::default(),
    };

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid match configuration: {}", e);
        std::process::exit(1);
    }

    let (cmd_tx, cmd_rx) = mpsc::channel::<MatchCommand>(256);
    let (broadcast_tx, mut broadcast_rx) = broadcast::channel::<MatchBroadcast>(64);

    let match_task = tokio::spawn(run_match_loop(cmd_rx, broadcast_tx, config));

    for team in [Team::Red, Team::Red, Team::Blue, Team::Blue] {
        let (response, joined) = oneshot::channel();
        let cmd = MatchCommand::Join {
            team: Some(team),
            controller: ControllerKind::Bot(None),
            response,
        };
        if cmd_tx.send(cmd).await.is_err() {
            break;
        }
        match joined.await {
            Ok(Ok(id)) => tracing::info!("Bot {} on {:?}", id, team),
            Ok(Err(e)) => tracing::warn!("Bot could not join: {}", e),
            Err(_) => break,
        }
    }

    tracing::info!("Starting headless match");
    loop {
        match broadcast_rx.recv().await {
            Ok(MatchBroadcast::Goal {
                scoring_team,
                score,
            }) => {
                println!(
                    "Goal for {:?}! Red {} - {} Blue",
                    scoring_team, score.red, score.blue
                );
            }
            Ok(MatchBroadcast::MatchEnded { score }) => {
                println!("Final score: Red {} - {} Blue", score.red, score.blue);
                break;
            }
            Ok(MatchBroadcast::Snapshot(_)) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::debug!("Skipped {} broadcasts", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    drop(cmd_tx);
    match match_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("Match failed: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Match task panicked: {}", e);
            std::process::exit(1);
        }
    }
}
