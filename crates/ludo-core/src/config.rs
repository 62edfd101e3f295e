//! Configuration loading and typed config structures for Ludo Arena.
//!
//! The canonical configuration lives in `ludo-config.yaml` next to the
//! server binary. Every field has a default, so an empty file (or no file at
//! all) yields a working in-memory server on port 8080.

use std::path::Path;

use ludo_types::{RuleKey, RuleSet};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration, mirroring `ludo-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LudoConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Timer durations.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Rule defaults and numeric rule values.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Room persistence backend.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fixed RNG seed for reproducible rooms. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LudoConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DRAGONFLY_URL` overrides `store.dragonfly_url`
    /// - `LUDO_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. Environment overrides are not
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.store.dragonfly_url = Some(val);
        }
        if let Ok(val) = std::env::var("LUDO_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid LUDO_PORT"),
            }
        }
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Capacity of each room's command mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

/// Timer durations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Turn clock cadence in milliseconds.
    #[serde(default = "default_turn_tick_ms")]
    pub turn_tick_ms: u64,

    /// Delay before a roll with no legal move passes the turn.
    #[serde(default = "default_auto_skip_delay_ms")]
    pub auto_skip_delay_ms: u64,

    /// Delay before a consumed power-up is replaced.
    #[serde(default = "default_power_up_respawn_ms")]
    pub power_up_respawn_ms: u64,

    /// How long a disconnected seat is held before it counts as a leave.
    #[serde(default = "default_reconnect_grace_seconds")]
    pub reconnect_grace_seconds: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            turn_tick_ms: default_turn_tick_ms(),
            auto_skip_delay_ms: default_auto_skip_delay_ms(),
            power_up_respawn_ms: default_power_up_respawn_ms(),
            reconnect_grace_seconds: default_reconnect_grace_seconds(),
        }
    }
}

/// Rule defaults applied when a player has not voted, plus numeric values.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Default for the turn clock toggle.
    #[serde(default = "default_true")]
    pub timed_moves: bool,

    /// Length of the turn clock in seconds.
    #[serde(default = "default_move_time_limit_seconds")]
    pub move_time_limit_seconds: u32,

    /// Default for power-up spawning.
    #[serde(default = "default_true")]
    pub power_ups: bool,

    /// Default for trap cells.
    #[serde(default = "default_true")]
    pub trap_zones: bool,

    /// Default for reverse-kill.
    #[serde(default)]
    pub reverse_kill: bool,

    /// Default for scoring.
    #[serde(default = "default_true")]
    pub points_system: bool,

    /// Default for the kill-zone window.
    #[serde(default)]
    pub kill_zone: bool,

    /// Turns between kill-zone toggles.
    #[serde(default = "default_kill_zone_interval")]
    pub kill_zone_interval: u32,

    /// Default for the capture bonus roll.
    #[serde(default)]
    pub bonus_roll_on_capture: bool,

    /// Power-ups placed when a game starts.
    #[serde(default = "default_initial_power_ups")]
    pub initial_power_ups: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            timed_moves: true,
            move_time_limit_seconds: default_move_time_limit_seconds(),
            power_ups: true,
            trap_zones: true,
            reverse_kill: false,
            points_system: true,
            kill_zone: false,
            kill_zone_interval: default_kill_zone_interval(),
            bonus_roll_on_capture: false,
            initial_power_ups: default_initial_power_ups(),
        }
    }
}

impl RulesConfig {
    /// The default value of a votable toggle.
    pub const fn default_for(&self, rule: RuleKey) -> bool {
        match rule {
            RuleKey::TimedMoves => self.timed_moves,
            RuleKey::PowerUps => self.power_ups,
            RuleKey::TrapZones => self.trap_zones,
            RuleKey::ReverseKill => self.reverse_kill,
            RuleKey::PointsSystem => self.points_system,
            RuleKey::KillZone => self.kill_zone,
            RuleKey::BonusRollOnCapture => self.bonus_roll_on_capture,
        }
    }

    /// The rule set a new room starts with before any votes.
    pub const fn rule_set(&self) -> RuleSet {
        RuleSet {
            timed_moves: self.timed_moves,
            move_time_limit_seconds: self.move_time_limit_seconds,
            power_ups_enabled: self.power_ups,
            trap_zones_enabled: self.trap_zones,
            reverse_kill_enabled: self.reverse_kill,
            points_system_enabled: self.points_system,
            kill_zone_enabled: self.kill_zone,
            kill_zone_interval: self.kill_zone_interval,
            bonus_roll_on_capture: self.bonus_roll_on_capture,
        }
    }
}

/// Room persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Dragonfly (Redis-compatible) URL. Rooms live only in memory when
    /// absent.
    #[serde(default)]
    pub dragonfly_url: Option<String>,

    /// Seconds a saved room survives without updates.
    #[serde(default = "default_room_ttl_seconds")]
    pub room_ttl_seconds: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dragonfly_url: None,
            room_ttl_seconds: default_room_ttl_seconds(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is
    /// unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_mailbox_capacity() -> usize {
    64
}

const fn default_turn_tick_ms() -> u64 {
    1000
}

const fn default_auto_skip_delay_ms() -> u64 {
    1000
}

const fn default_power_up_respawn_ms() -> u64 {
    15_000
}

const fn default_reconnect_grace_seconds() -> u64 {
    60
}

const fn default_move_time_limit_seconds() -> u32 {
    15
}

const fn default_kill_zone_interval() -> u32 {
    15
}

const fn default_initial_power_ups() -> u32 {
    3
}

const fn default_room_ttl_seconds() -> i64 {
    86_400
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
