//! Player settings and preferences
//!
//! Stored as JSON by the host, separately from tuning.

use serde::{Deserialize, Serialize};

/// Player-facing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Camera ===
    /// Master switch for all camera feedback
    pub camera_effects: bool,
    /// Shake on impacts
    pub screen_shake: bool,
    /// Full-screen colour flashes
    pub flash: bool,
    /// Draw the concave/convex overlay on paddles
    pub shape_overlay: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_effects: true,
            screen_shake: true,
            flash: true,
            shape_overlay: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    pub fn effective_camera_effects(&self) -> bool {
        self.camera_effects
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.camera_effects && self.screen_shake && !self.reduced_motion
    }

    /// Effective flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        self.camera_effects && self.flash && !self.reduced_motion
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let settings = serde_json::from_str(json)?;
        log::info!("Loaded settings");
        Ok(settings)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
