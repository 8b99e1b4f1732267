//! Snapshot broadcaster: copy under the lock, deliver outside it

use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::ServerMsg;

use super::round::{self, RoundTransition};
use super::snapshot::build_snapshot;
use super::world::{OutboundTx, World};

/// What happened during one broadcast tick
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Slow clients whose queue was full; they skip this frame
    pub skipped: usize,
    /// Players removed because their session is gone
    pub dropped: Vec<Uuid>,
    pub round: Option<RoundTransition>,
}

/// Background task pushing world snapshots to every session
pub struct Broadcaster {
    world: Arc<World>,
    config: GameConfig,
    tick: u64,
}

impl Broadcaster {
    pub fn new(world: Arc<World>, config: GameConfig) -> Self {
        Self {
            world,
            config,
            tick: 0,
        }
    }

    /// Run a single broadcast tick
    pub fn tick(&mut self, now: Instant) -> BroadcastReport {
        self.tick += 1;
        let config = &self.config;

        let (snapshot, transition, recipients) = self.world.with_lock(|state| {
            let snapshot = build_snapshot(state, now);
            let transition = round::evaluate(state, config, now);
            let recipients: Vec<(Uuid, OutboundTx)> = state
                .players
                .values()
                .map(|p| (p.id, p.outbound.clone()))
                .collect();
            (snapshot, transition, recipients)
        });

        let mut report = BroadcastReport {
            round: Some(transition),
            ..Default::default()
        };

        let frame: Arc<str> = match serde_json::to_string(&ServerMsg::Snapshot(snapshot)) {
            Ok(json) => json.into(),
            Err(e) => {
                error!(tick = self.tick, error = %e, "Failed to encode snapshot");
                return report;
            }
        };

        for (player_id, outbound) in recipients {
            match outbound.try_send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(player_id = %player_id, "Outbound queue full, skipping snapshot");
                    report.skipped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    if self.world.remove_player(player_id) {
                        info!(player_id = %player_id, "Snapshot delivery failed, player removed");
                    }
                    report.dropped.push(player_id);
                }
            }
        }

        trace!(
            tick = self.tick,
            delivered = report.delivered,
            skipped = report.skipped,
            dropped = report.dropped.len(),
            round = ?report.round,
            bytes = frame.len(),
            "Snapshot broadcast"
        );

        report
    }

    /// Tick forever. One failing session never stops the loop.
    pub async fn run(mut self) {
        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "Broadcast loop started"
        );

        let mut tick_interval = interval(self.config.tick_interval);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            self.tick(Instant::now());
        }
    }
}
