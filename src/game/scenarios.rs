//! Whole-engine scenarios: sessions, physics and broadcast running together

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::{ClientAction, MoveIntent, ShootIntent};

use super::round::RoundTransition;
use super::{Broadcaster, PhysicsLoop, SessionManager, World};

struct Arena {
    sessions: SessionManager,
    physics: PhysicsLoop,
    broadcaster: Broadcaster,
}

impl Arena {
    fn new() -> Self {
        let world = Arc::new(World::new());
        let config = GameConfig::default();
        Self {
            sessions: SessionManager::new(world.clone(), config),
            physics: PhysicsLoop::new(world.clone(), config),
            broadcaster: Broadcaster::new(world, config),
        }
    }

    fn join(&self) -> (Uuid, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(8);
        (self.sessions.on_connect(tx).unwrap(), rx)
    }
}

fn latest(rx: &mut mpsc::Receiver<Arc<str>>) -> serde_json::Value {
    let mut last = None;
    while let Ok(frame) = rx.try_recv() {
        last = Some(frame);
    }
    serde_json::from_str(&last.expect("no snapshot received")).unwrap()
}

#[test]
fn test_shot_eliminates_player_then_round_resets() {
    let mut arena = Arena::new();
    let (a, mut rx_a) = arena.join();
    let (b, _rx_b) = arena.join();
    let start = Instant::now();

    arena.sessions.on_message_at(
        b,
        &ClientAction {
            movement: Some(MoveIntent { x: 89.0, y: 50.0, explicit: false }),
            shoot: None,
        },
        start,
    );
    let fired = arena.sessions.on_message_at(
        a,
        &ClientAction {
            movement: None,
            shoot: Some(ShootIntent { dx: 1.0, dy: 0.0 }),
        },
        start,
    );
    let projectile = fired.fired.unwrap();

    arena.broadcaster.tick(start);
    let json = latest(&mut rx_a);
    let shot = &json["projectiles"][projectile.to_string()];
    assert_eq!(shot["owner"], a.to_string());
    assert_eq!((shot["x"].as_f64(), shot["dx"].as_f64()), (Some(50.0), Some(1.0)));

    let mut now = start;
    let mut hit = false;
    for _ in 0..200 {
        now += Duration::from_millis(16);
        if !arena.physics.tick(now).hits.is_empty() {
            hit = true;
            break;
        }
    }
    assert!(hit);

    let report = arena.broadcaster.tick(now);
    assert!(matches!(report.round, Some(RoundTransition::Ending { .. })));
    let json = latest(&mut rx_a);
    assert_eq!(json["players"][b.to_string()]["dead"], true);
    assert_eq!(json["players"][a.to_string()]["dead"], false);
    assert!(json["projectiles"].get(projectile.to_string()).is_none());

    // Still waiting just before the delay elapses
    let report = arena.broadcaster.tick(now + Duration::from_millis(2900));
    assert_eq!(report.round, Some(RoundTransition::Unchanged));
    assert_eq!(latest(&mut rx_a)["round"]["state"], "round_ending");

    let report = arena.broadcaster.tick(now + Duration::from_secs(3));
    assert_eq!(report.round, Some(RoundTransition::Reset));
    arena.broadcaster.tick(now + Duration::from_millis(3016));
    let json = latest(&mut rx_a);
    for id in [a, b] {
        let player = &json["players"][id.to_string()];
        assert_eq!(player["dead"], false);
        assert_eq!((player["x"].as_f64(), player["y"].as_f64()), (Some(50.0), Some(50.0)));
    }
    assert_eq!(json["round"]["state"], "active");
}

#[test]
fn test_dead_player_is_not_hit() {
    let arena = Arena::new();
    let (a, _rx_a) = arena.join();
    let (b, _rx_b) = arena.join();
    let now = Instant::now();

    arena.sessions.world().with_lock(|state| {
        state.players.get_mut(&b).unwrap().alive = false;
    });
    // B sits right on the spawn point, but a dead player is not a valid target
    arena.sessions.on_message_at(
        a,
        &ClientAction {
            movement: Some(MoveIntent { x: 50.0, y: 50.0, explicit: false }),
            shoot: Some(ShootIntent { dx: 0.0, dy: 1.0 }),
        },
        now,
    );
    let report = arena.physics.tick(now);
    assert!(report.hits.is_empty());
    assert_eq!(arena.sessions.world().with_lock(|state| state.projectiles.len()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unhit_projectile_disappears_after_ttl() {
    let world = Arc::new(World::new());
    let config = GameConfig::default();
    let sessions = SessionManager::new(world.clone(), config);
    tokio::spawn(PhysicsLoop::new(world.clone(), config).run());
    tokio::spawn(Broadcaster::new(world.clone(), config).run());

    let (tx, mut rx) = mpsc::channel(8);
    let id = sessions.on_connect(tx).unwrap();
    let projectile = sessions
        .on_message(
            id,
            &ClientAction {
                movement: None,
                shoot: Some(ShootIntent { dx: 1.0, dy: 1.0 }),
            },
        )
        .fired
        .unwrap();

    tokio::time::sleep(Duration::from_millis(4900)).await;
    while rx.try_recv().is_ok() {}
    let frame = rx.recv().await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert!(json["projectiles"].get(projectile.to_string()).is_some());

    tokio::time::sleep(Duration::from_millis(200)).await;
    while rx.try_recv().is_ok() {}
    let frame = rx.recv().await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert!(json["projectiles"].get(projectile.to_string()).is_none());
    assert_eq!(json["players"][id.to_string()]["dead"], false);
}
