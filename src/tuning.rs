//! Data-driven game balance
//!
//! Every number the power-up rules depend on lives here so a host can ship
//! a JSON override without rebuilding. Missing fields fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera_fx::CameraTuning;
use crate::sim::PowerUpKind;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(String),
}

/// Effect duration per power-up kind, in milliseconds (0 = permanent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpDurations {
    pub extra_life: u32,
    pub paddle_grow: u32,
    pub paddle_shrink: u32,
    pub multi_ball: u32,
    pub speed_down: u32,
    pub speed_up: u32,
    pub sticky: u32,
    pub laser: u32,
    pub shield: u32,
    pub fireball: u32,
    pub score_multiplier: u32,
}

impl Default for PowerUpDurations {
    fn default() -> Self {
        Self {
            extra_life: 0,
            paddle_grow: 10_000,
            paddle_shrink: 10_000,
            multi_ball: 0,
            speed_down: 8_000,
            speed_up: 8_000,
            sticky: 10_000,
            laser: 8_000,
            shield: 10_000,
            fireball: 8_000,
            score_multiplier: 15_000,
        }
    }
}

impl PowerUpDurations {
    pub fn get(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::ExtraLife => self.extra_life,
            PowerUpKind::PaddleGrow => self.paddle_grow,
            PowerUpKind::PaddleShrink => self.paddle_shrink,
            PowerUpKind::MultiBall => self.multi_ball,
            PowerUpKind::SpeedDown => self.speed_down,
            PowerUpKind::SpeedUp => self.speed_up,
            PowerUpKind::Sticky => self.sticky,
            PowerUpKind::Laser => self.laser,
            PowerUpKind::Shield => self.shield,
            PowerUpKind::Fireball => self.fireball,
            PowerUpKind::ScoreMultiplier => self.score_multiplier,
        }
    }
}

/// Relative drop weight per kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropWeights {
    pub extra_life: u32,
    pub paddle_grow: u32,
    pub paddle_shrink: u32,
    pub multi_ball: u32,
    pub speed_down: u32,
    pub speed_up: u32,
    pub sticky: u32,
    pub laser: u32,
    pub shield: u32,
    pub fireball: u32,
    pub score_multiplier: u32,
}

impl Default for DropWeights {
    fn default() -> Self {
        // Helpful drops are common, harmful and game-changing ones rare
        Self {
            extra_life: 3,
            paddle_grow: 14,
            paddle_shrink: 8,
            multi_ball: 12,
            speed_down: 12,
            speed_up: 8,
            sticky: 10,
            laser: 8,
            shield: 8,
            fireball: 6,
            score_multiplier: 11,
        }
    }
}

impl DropWeights {
    pub fn get(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::ExtraLife => self.extra_life,
            PowerUpKind::PaddleGrow => self.paddle_grow,
            PowerUpKind::PaddleShrink => self.paddle_shrink,
            PowerUpKind::MultiBall => self.multi_ball,
            PowerUpKind::SpeedDown => self.speed_down,
            PowerUpKind::SpeedUp => self.speed_up,
            PowerUpKind::Sticky => self.sticky,
            PowerUpKind::Laser => self.laser,
            PowerUpKind::Shield => self.shield,
            PowerUpKind::Fireball => self.fireball,
            PowerUpKind::ScoreMultiplier => self.score_multiplier,
        }
    }

    pub fn total(&self) -> u32 {
        PowerUpKind::ALL.iter().map(|k| self.get(*k)).sum()
    }

    /// Pick the kind a roll in `0..total()` lands on
    pub fn pick(&self, roll: u32) -> Option<PowerUpKind> {
        let mut acc = 0;
        for kind in PowerUpKind::ALL {
            acc += self.get(kind);
            if roll < acc {
                return Some(kind);
            }
        }
        None
    }
}

/// Power-up balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub durations: PowerUpDurations,
    /// Velocity factor for speed-up / speed-down
    pub speed_factor: f32,
    /// Horizontal paddle scale while grown
    pub grow_scale: f32,
    /// Horizontal paddle scale while shrunk
    pub shrink_scale: f32,
    pub score_multiplier: u32,
    /// Balls added by multi-ball
    pub extra_balls: u32,
    /// Angle (radians) between a multi-ball child and its parent
    pub multi_ball_spread: f32,
    /// Chance a normal brick drops a power-up
    pub drop_chance: f32,
    pub drop_weights: DropWeights,
    pub camera: CameraTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            durations: PowerUpDurations::default(),
            speed_factor: 1.5,
            grow_scale: 1.5,
            shrink_scale: 0.5,
            score_multiplier: 2,
            extra_balls: 2,
            multi_ball_spread: 0.5,
            drop_chance: 0.15,
            drop_weights: DropWeights::default(),
            camera: CameraTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("speed_factor", self.speed_factor),
            ("grow_scale", self.grow_scale),
            ("shrink_scale", self.shrink_scale),
            ("camera.level_complete_zoom", self.camera.level_complete_zoom),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TuningError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.drop_chance) {
            return Err(TuningError::Invalid(format!(
                "drop_chance must be within 0..=1, got {}",
                self.drop_chance
            )));
        }
        if self.score_multiplier == 0 {
            return Err(TuningError::Invalid("score_multiplier must be at least 1".into()));
        }
        if self.drop_weights.total() == 0 {
            return Err(TuningError::Invalid("drop_weights are all zero".into()));
        }
        Ok(())
    }

    /// Duration for a kind; temporary iff non-zero
    pub fn duration_ms(&self, kind: PowerUpKind) -> u32 {
        self.durations.get(kind)
    }
}
