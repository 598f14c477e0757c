//! Team assignment and spawn points. A team fields one or two vehicles: a
//! lone player takes the centre spot, a pair takes the two flank spots.

use crate::error::{SimError, SimResult};
use hyperbol_shared::config::{ArenaConfig, SpawnPoint, TeamSpawns};
use hyperbol_shared::team::Team;

pub const MAX_PER_TEAM: usize = 2;

pub fn team_spawns(arena: &ArenaConfig, team: Team) -> &TeamSpawns {
    match team {
        Team::Red => &arena.red_spawns,
        Team::Blue => &arena.blue_spawns,
    }
}

/// Spawn points for a team of `count` vehicles, in join order.
pub fn spawn_layout(spawns: &TeamSpawns, count: usize) -> &[SpawnPoint] {
    match count {
        0 => &[],
        1 => std::slice::from_ref(&spawns.single),
        _ => &spawns.duo,
    }
}

/// Pick a team for a new vehicle. With no preference the smaller team wins,
/// Red on a tie.
pub fn assign_team(red: usize, blue: usize, requested: Option<Team>) -> SimResult<Team> {
    let size = |team| match team {
        Team::Red => red,
        Team::Blue => blue,
    };
    let team = requested.unwrap_or(if blue < red { Team::Blue } else { Team::Red });
    if size(team) >= MAX_PER_TEAM {
        return Err(SimError::ArenaFull(team));
    }
    Ok(team)
}
