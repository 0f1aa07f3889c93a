//! Engine settings
//!
//! Screen size, shot policy, clear target and the tier table live here and
//! are handed to the engine at construction. Settings are validated once at
//! startup; the simulation never sees an invalid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::tier::{Tier, TierError};

/// Configuration errors, all raised at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tier table: {0}")]
    Tier(#[from] TierError),

    #[error("progress target must be at least 1")]
    ZeroProgressTarget,

    #[error("projectile capacity must be at least 1")]
    ZeroProjectileCapacity,

    #[error("play area must be positive and fit the ship (got {width}x{height})")]
    InvalidPlayArea { width: f32, height: f32 },

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// How many projectiles may be live at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectilePolicy {
    /// One beam at a time
    Single,
    /// Several shots in flight, bounded
    Multi { max_live: usize },
}

impl ProjectilePolicy {
    pub fn capacity(&self) -> usize {
        match self {
            ProjectilePolicy::Single => 1,
            ProjectilePolicy::Multi { max_live } => *max_live,
        }
    }
}

impl Default for ProjectilePolicy {
    fn default() -> Self {
        ProjectilePolicy::Multi { max_live: 8 }
    }
}

/// What happens to the score when a tier is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScorePolicy {
    /// Score restarts at zero on every tier
    #[default]
    ResetPerTier,
    /// Score carries over until the run returns to the menu
    PersistAcrossTiers,
}

/// How the menu starts a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MenuMode {
    /// One button per tier
    #[default]
    TierButtons,
    /// Any click starts the first tier
    SingleStart,
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Play area width (pixels)
    pub width: f32,
    /// Play area height (pixels)
    pub height: f32,

    // === Rules ===
    /// Correct answers needed to clear a tier
    pub progress_target: u32,
    pub projectile_policy: ProjectilePolicy,
    pub score_policy: ScorePolicy,
    pub menu_mode: MenuMode,
    /// Ticks between shots
    #[serde(default = "default_fire_cooldown")]
    pub fire_cooldown_ticks: u32,

    // === Visuals ===
    /// Particle cap (bursts past this are truncated)
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
    #[serde(default = "default_star_count")]
    pub star_count: usize,

    /// Difficulty tiers, played in order
    #[serde(default = "Tier::builtin")]
    pub tiers: Vec<Tier>,
}

fn default_fire_cooldown() -> u32 {
    FIRE_COOLDOWN_TICKS
}

fn default_max_particles() -> usize {
    1024
}

fn default_star_count() -> usize {
    STAR_COUNT
}

impl Default for Settings {
    fn default() -> Self {
        Self::classic()
    }
}

impl Settings {
    /// Three tier buttons, multiple shots, ten answers per tier
    pub fn classic() -> Self {
        Self {
            width: 900.0,
            height: 600.0,
            progress_target: 10,
            projectile_policy: ProjectilePolicy::default(),
            score_policy: ScorePolicy::ResetPerTier,
            menu_mode: MenuMode::TierButtons,
            fire_cooldown_ticks: FIRE_COOLDOWN_TICKS,
            max_particles: default_max_particles(),
            star_count: STAR_COUNT,
            tiers: Tier::builtin(),
        }
    }

    /// Click-to-start, one beam at a time, twenty answers per tier
    pub fn arcade() -> Self {
        Self {
            height: 650.0,
            progress_target: 20,
            projectile_policy: ProjectilePolicy::Single,
            score_policy: ScorePolicy::PersistAcrossTiers,
            menu_mode: MenuMode::SingleStart,
            ..Self::classic()
        }
    }

    /// Check everything the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width < SHIP_WIDTH
            || self.height <= SHIP_BOTTOM_OFFSET
        {
            return Err(ConfigError::InvalidPlayArea {
                width: self.width,
                height: self.height,
            });
        }
        if self.progress_target == 0 {
            return Err(ConfigError::ZeroProgressTarget);
        }
        if self.projectile_policy.capacity() == 0 {
            return Err(ConfigError::ZeroProjectileCapacity);
        }
        Tier::validate_table(&self.tiers)?;
        Ok(())
    }

    /// Load settings from a JSON file and validate them
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
