//! Application state shared across routes and background tasks

use std::sync::Arc;

use crate::config::Config;
use crate::game::{Broadcaster, PhysicsLoop, SessionManager, World};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let world = Arc::new(World::new());
        let sessions = SessionManager::new(world.clone(), config.game);

        Self { config, sessions }
    }

    /// Physics tick task over the shared world
    pub fn physics_loop(&self) -> PhysicsLoop {
        PhysicsLoop::new(self.sessions.world().clone(), self.config.game)
    }

    /// Broadcast tick task over the shared world
    pub fn broadcaster(&self) -> Broadcaster {
        Broadcaster::new(self.sessions.world().clone(), self.config.game)
    }
}
