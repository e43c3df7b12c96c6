//! Arena and round settings
//!
//! Loaded from a JSON file; every missing field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::collision::{ArenaError, ArenaRect};

/// Which collider drives the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColliderKind {
    /// Spatial grid
    #[default]
    Grid,
    /// Linear scan over every segment
    Linear,
}

impl ColliderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColliderKind::Grid => "Grid",
            ColliderKind::Linear => "Linear",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "grid" | "spatial" => Some(ColliderKind::Grid),
            "linear" | "oracle" => Some(ColliderKind::Linear),
            _ => None,
        }
    }
}

/// Settings could not be loaded
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

/// Round settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Arena rectangle in integer units
    pub arena: ArenaRect,
    /// Collider used for play
    pub collider: ColliderKind,
    /// Run the other collider alongside and report disagreements
    pub cross_check: bool,

    // === Round ===
    /// Number of light cycles
    pub cycles: usize,
    /// Cycle speed (units per second)
    pub speed: f32,
    /// Bot steering per tick (radians)
    pub turn_rate: f32,
    /// Tick limit for headless rounds
    pub ticks: u64,
    /// Seed for spawn points and bot steering
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena: ArenaRect::default(),
            collider: ColliderKind::Grid,
            cross_check: true,

            cycles: 2,
            speed: CYCLE_SPEED,
            turn_rate: TURN_SPEED,
            ticks: ROUND_TICKS,
            seed: 12345,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.arena.validate()?;
        Ok(())
    }
}
