//! Snapshot building for network transmission

use tokio::time::Instant;

use crate::ws::protocol::{PlayerSnapshot, ProjectileSnapshot, WorldSnapshot};

use super::world::WorldState;

/// Copy the world into an owned snapshot. Call with the lock held.
pub fn build_snapshot(state: &WorldState, now: Instant) -> WorldSnapshot {
    let players = state
        .players
        .values()
        .map(|p| {
            (
                p.id,
                PlayerSnapshot {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                    dead: !p.alive,
                },
            )
        })
        .collect();

    let projectiles = state
        .projectiles
        .values()
        .map(|p| {
            (
                p.id,
                ProjectileSnapshot {
                    id: p.id,
                    owner: p.owner,
                    x: p.x,
                    y: p.y,
                    dx: p.dx,
                    dy: p.dy,
                    speed: p.speed,
                },
            )
        })
        .collect();

    WorldSnapshot {
        players,
        projectiles,
        round: state.round.to_snapshot(now),
    }
}
