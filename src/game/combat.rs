//! Hit detection between projectiles and players

use std::collections::HashMap;
use uuid::Uuid;

use super::world::{Player, Projectile};

/// A projectile hit resolved during a physics tick
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub projectile_id: Uuid,
    pub shooter_id: Uuid,
    pub target_id: Uuid,
    pub x: f64,
    pub y: f64,
}

/// Point-in-square test. Strict: a point exactly on the edge is outside.
pub fn in_hitbox(player_x: f64, player_y: f64, x: f64, y: f64, half_extent: f64) -> bool {
    (player_x - x).abs() < half_extent && (player_y - y).abs() < half_extent
}

/// Pick the player hit by `projectile`, if any.
///
/// Dead players and the owner are never hit. When several players overlap
/// the projectile, the one whose centre is nearest wins; equal distances go
/// to the lowest id.
pub fn find_target(
    players: &HashMap<Uuid, Player>,
    projectile: &Projectile,
    half_extent: f64,
) -> Option<Uuid> {
    players
        .values()
        .filter(|p| p.alive && p.id != projectile.owner)
        .filter(|p| in_hitbox(p.x, p.y, projectile.x, projectile.y, half_extent))
        .map(|p| {
            let dx = p.x - projectile.x;
            let dy = p.y - projectile.y;
            (dx * dx + dy * dy, p.id)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn players(entries: &[(Uuid, f64, f64, bool)]) -> HashMap<Uuid, Player> {
        entries
            .iter()
            .map(|&(id, x, y, alive)| {
                let (tx, _rx) = mpsc::channel(1);
                let mut player = Player::new(id, x, y, tx);
                player.alive = alive;
                (id, player)
            })
            .collect()
    }

    fn projectile_at(owner: Uuid, x: f64, y: f64) -> Projectile {
        Projectile {
            id: Uuid::new_v4(),
            owner,
            x,
            y,
            dx: 1.0,
            dy: 0.0,
            speed: 0.5,
            expiry: Instant::now(),
        }
    }

    #[test]
    fn test_hitbox_boundary_is_exclusive() {
        assert!(in_hitbox(0.0, 0.0, 39.999, -39.999, 40.0));
        assert!(!in_hitbox(0.0, 0.0, 40.0, 0.0, 40.0));
        assert!(!in_hitbox(0.0, 0.0, 0.0, -40.0, 40.0));
        assert!(!in_hitbox(89.0, 50.0, 49.0, 50.0, 40.0));
        assert!(in_hitbox(89.0, 50.0, 49.5, 50.0, 40.0));
    }

    #[test]
    fn test_owner_is_never_hit() {
        let owner = Uuid::new_v4();
        let players = players(&[(owner, 50.0, 50.0, true)]);
        let projectile = projectile_at(owner, 50.0, 50.0);
        assert_eq!(find_target(&players, &projectile, 40.0), None);
    }

    #[test]
    fn test_dead_players_are_skipped() {
        let owner = Uuid::new_v4();
        let victim = Uuid::new_v4();
        let players = players(&[(owner, 0.0, 0.0, true), (victim, 50.0, 50.0, false)]);
        let projectile = projectile_at(owner, 50.0, 50.0);
        assert_eq!(find_target(&players, &projectile, 40.0), None);
    }

    #[test]
    fn test_nearest_player_wins() {
        let owner = Uuid::new_v4();
        let near = Uuid::new_v4();
        let far = Uuid::new_v4();
        let players = players(&[
            (owner, 500.0, 500.0, true),
            (near, 105.0, 100.0, true),
            (far, 130.0, 100.0, true),
        ]);
        let projectile = projectile_at(owner, 100.0, 100.0);
        assert_eq!(find_target(&players, &projectile, 40.0), Some(near));
    }

    #[test]
    fn test_equal_distance_goes_to_lowest_id() {
        let owner = Uuid::new_v4();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let players = players(&[
            (owner, 500.0, 500.0, true),
            (b, 110.0, 100.0, true),
            (a, 90.0, 100.0, true),
        ]);
        let projectile = projectile_at(owner, 100.0, 100.0);
        assert_eq!(find_target(&players, &projectile, 40.0), Some(a));
    }

    #[test]
    fn test_disconnected_owner_still_hits() {
        let victim = Uuid::new_v4();
        let players = players(&[(victim, 60.0, 60.0, true)]);
        let projectile = projectile_at(Uuid::new_v4(), 50.0, 50.0);
        assert_eq!(find_target(&players, &projectile, 40.0), Some(victim));
    }
}
