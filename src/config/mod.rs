//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Simulation tuning shared by the tick loops and session handling
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameConfig {
    /// Interval of both the physics and the broadcast tick
    pub tick_interval: Duration,
    /// Distance multiplier applied to a projectile's direction every physics tick
    pub projectile_speed: f64,
    /// Projectile lifetime
    pub projectile_ttl: Duration,
    /// Half-extent of the square player hitbox
    pub hitbox_half_extent: f64,
    /// Delay between the one-survivor condition and the round reset
    pub round_reset_delay: Duration,
    /// Spawn and reset position
    pub spawn_x: f64,
    pub spawn_y: f64,
    /// Per-session outbound queue depth
    pub outbound_buffer: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            projectile_speed: 0.5,
            projectile_ttl: Duration::from_secs(5),
            hitbox_half_extent: 40.0,
            round_reset_delay: Duration::from_secs(3),
            spawn_x: 50.0,
            spawn_y: 50.0,
            outbound_buffer: 64,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Simulation settings
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };
        let server_addr = server_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(server_addr))?;

        let defaults = GameConfig::default();

        let tick_ms: u64 = parse_or(&lookup, "TICK_INTERVAL_MS", 16)?;
        if tick_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "TICK_INTERVAL_MS",
                value: tick_ms.to_string(),
            });
        }

        let hitbox_half_extent: f64 =
            parse_or(&lookup, "HITBOX_HALF_EXTENT", defaults.hitbox_half_extent)?;
        if !(hitbox_half_extent > 0.0) {
            return Err(ConfigError::Invalid {
                var: "HITBOX_HALF_EXTENT",
                value: hitbox_half_extent.to_string(),
            });
        }

        let game = GameConfig {
            tick_interval: Duration::from_millis(tick_ms),
            projectile_speed: parse_or(&lookup, "PROJECTILE_SPEED", defaults.projectile_speed)?,
            projectile_ttl: parse_duration_ms(&lookup, "PROJECTILE_TTL_MS", 5000)?,
            hitbox_half_extent,
            round_reset_delay: parse_duration_ms(&lookup, "ROUND_RESET_DELAY_MS", 3000)?,
            spawn_x: parse_or(&lookup, "SPAWN_X", defaults.spawn_x)?,
            spawn_y: parse_or(&lookup, "SPAWN_Y", defaults.spawn_y)?,
            outbound_buffer: parse_or(&lookup, "OUTBOUND_BUFFER", defaults.outbound_buffer)?
                .max(1),
        };

        Ok(Self {
            server_addr,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            game,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Longest accepted lifetime or delay. These are added to `Instant::now()`
/// while the world lock is held, so the sum must never overflow.
const MAX_DURATION_MS: u64 = 3_600_000;

fn parse_duration_ms<F>(lookup: &F, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms: u64 = parse_or(lookup, var, default)?;
    if ms > MAX_DURATION_MS {
        return Err(ConfigError::Invalid {
            var,
            value: ms.to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid server address format: {0}")]
    InvalidAddress(String),
}
