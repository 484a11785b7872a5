//! Brickfall - breakout physics and effect core
//!
//! Core modules:
//! - `sim`: Collision taxonomy, paddle deflection, power-ups, session driver
//! - `camera_fx`: Camera feedback for gameplay events
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance

pub mod camera_fx;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Play field dimensions (y grows downward)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Paddle defaults - bottom paddle sits just above the floor
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 20.0;
    pub const PADDLE_Y: f32 = 560.0;
    /// Steepest bounce off a paddle edge, measured from the face normal
    pub const MAX_DEFLECTION_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_START_SPEED: f32 = 300.0;

    pub const START_LIVES: u32 = 3;

    /// Brick values before the score multiplier
    pub const BRICK_POINTS: u32 = 10;
    pub const SPECIAL_BRICK_POINTS: u32 = 50;

    /// Shield strip below the paddle
    pub const SHIELD_Y: f32 = 590.0;
    pub const SHIELD_HEIGHT: f32 = 10.0;

    /// Laser bolts
    pub const LASER_SPEED: f32 = 600.0;
    pub const LASER_BOLT_SIZE: glam::Vec2 = glam::Vec2::new(4.0, 12.0);

    /// Paddle shape overlay
    pub const SHAPE_OVERLAY_DEPTH: f32 = 6.0;
    pub const SHAPE_OVERLAY_SAMPLES: usize = 16;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
