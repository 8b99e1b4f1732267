//! Game simulation modules

pub mod broadcast;
pub mod combat;
pub mod physics;
pub mod round;
pub mod session;
pub mod snapshot;
pub mod world;

#[cfg(test)]
mod scenarios;

pub use broadcast::Broadcaster;
pub use physics::PhysicsLoop;
pub use session::SessionManager;
pub use world::World;

use uuid::Uuid;

/// Simulation errors
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Player id already registered: {0}")]
    DuplicatePlayer(Uuid),
}
