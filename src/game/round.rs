//! Round state machine: one survivor ends the round, a delayed reset starts the next

use tokio::time::Instant;
use tracing::info;

use crate::config::GameConfig;
use crate::ws::protocol::RoundSnapshot;

use super::world::WorldState;

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundState {
    /// More than one player alive, or fewer than two players in total
    #[default]
    Active,
    /// A single survivor remains; everyone respawns at `deadline`
    RoundEnding { deadline: Instant },
}

impl RoundState {
    pub fn to_snapshot(self, now: Instant) -> RoundSnapshot {
        match self {
            RoundState::Active => RoundSnapshot::Active,
            RoundState::RoundEnding { deadline } => RoundSnapshot::RoundEnding {
                reset_in_ms: deadline.saturating_duration_since(now).as_millis() as u64,
            },
        }
    }
}

/// Outcome of a round evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTransition {
    Unchanged,
    Ending { deadline: Instant },
    Reset,
}

/// Advance the round state. Called with the world lock held, once per broadcast tick.
/// Only mutates in place, the wait itself happens between ticks with the lock released.
pub fn evaluate(state: &mut WorldState, config: &GameConfig, now: Instant) -> RoundTransition {
    let round = state.round;
    match round {
        RoundState::Active => {
            if state.players.len() >= 2 && state.alive_count() == 1 {
                let deadline = now + config.round_reset_delay;
                state.round = RoundState::RoundEnding { deadline };
                info!(
                    players = state.players.len(),
                    delay_ms = config.round_reset_delay.as_millis() as u64,
                    "One survivor left, round ending"
                );
                RoundTransition::Ending { deadline }
            } else {
                RoundTransition::Unchanged
            }
        }
        RoundState::RoundEnding { deadline } if now >= deadline => {
            reset(state, config);
            info!(players = state.players.len(), "Round reset");
            RoundTransition::Reset
        }
        RoundState::RoundEnding { .. } => RoundTransition::Unchanged,
    }
}

/// Revive everyone at the spawn point
fn reset(state: &mut WorldState, config: &GameConfig) {
    for player in state.players.values_mut() {
        player.alive = true;
        player.x = config.spawn_x;
        player.y = config.spawn_y;
    }
    state.round = RoundState::Active;
}
