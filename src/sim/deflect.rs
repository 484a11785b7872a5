//! Ball deflection off paddles
//!
//! The outgoing direction depends only on where along the paddle the ball
//! landed and on the paddle's orientation and shape. The incoming speed is
//! always kept: a deflection turns the ball, it never speeds it up or slows
//! it down.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::body::{Body, BodyId};
use crate::consts::MAX_DEFLECTION_ANGLE;
use crate::polar_to_cartesian;

/// Which axis the paddle's long edge runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddleOrientation {
    #[default]
    Horizontal,
    Vertical,
}

/// The paddle facts the calculator needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleGeometry {
    /// Centre position
    pub position: Vec2,
    pub display_width: f32,
    pub display_height: f32,
    pub orientation: PaddleOrientation,
    pub is_concave: bool,
}

impl PaddleGeometry {
    /// Extract geometry from an engine body, which must carry paddle data
    pub fn from_body(body: &Body) -> Result<Self, DeflectError> {
        let data = body.data.ok_or(DeflectError::MissingBodyData(body.id))?;
        Ok(Self {
            position: body.position,
            display_width: body.size.x,
            display_height: body.size.y,
            orientation: if data.is_vertical {
                PaddleOrientation::Vertical
            } else {
                PaddleOrientation::Horizontal
            },
            is_concave: data.is_concave,
        })
    }

    /// Length of the edge the ball can land on
    fn face_length(&self) -> f32 {
        match self.orientation {
            PaddleOrientation::Horizontal => self.display_width,
            PaddleOrientation::Vertical => self.display_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeflectError {
    #[error("paddle body {0:?} carries no paddle data")]
    MissingBodyData(BodyId),
    #[error("paddle face has no usable length ({0})")]
    DegenerateFace(f32),
    #[error("non-finite {0}")]
    NonFinite(&'static str),
    #[error("ball is level with the paddle and not moving across it")]
    AmbiguousSide,
}

/// Normalised contact position along the paddle face, clamped to `[-1, 1]`
pub fn hit_factor(paddle: &PaddleGeometry, hit_position: Vec2) -> f32 {
    let (hit, start) = match paddle.orientation {
        PaddleOrientation::Horizontal => (
            hit_position.x,
            paddle.position.x - paddle.display_width / 2.0,
        ),
        PaddleOrientation::Vertical => (
            hit_position.y,
            paddle.position.y - paddle.display_height / 2.0,
        ),
    };
    (((hit - start) / paddle.face_length()) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

/// +1 if the ball is on the positive side of the paddle along its normal axis, -1 otherwise
fn ball_side(
    paddle: &PaddleGeometry,
    ball_position: Vec2,
    ball_velocity: Vec2,
) -> Result<f32, DeflectError> {
    let (offset, approach) = match paddle.orientation {
        PaddleOrientation::Horizontal => (ball_position.y - paddle.position.y, ball_velocity.y),
        PaddleOrientation::Vertical => (ball_position.x - paddle.position.x, ball_velocity.x),
    };

    if offset.abs() > f32::EPSILON {
        Ok(offset.signum())
    } else if approach.abs() > f32::EPSILON {
        // Moving toward +axis means it came from the negative side
        Ok(-approach.signum())
    } else {
        Err(DeflectError::AmbiguousSide)
    }
}

fn ensure_finite(v: Vec2, what: &'static str) -> Result<(), DeflectError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(DeflectError::NonFinite(what))
    }
}

/// Outgoing angle (radians from +x) for a contact
pub fn deflection_angle(
    ball_velocity: Vec2,
    ball_position: Vec2,
    paddle: &PaddleGeometry,
    hit_position: Vec2,
) -> Result<f32, DeflectError> {
    ensure_finite(ball_velocity, "ball velocity")?;
    ensure_finite(ball_position, "ball position")?;
    ensure_finite(paddle.position, "paddle position")?;
    ensure_finite(hit_position, "hit position")?;

    let face = paddle.face_length();
    if !face.is_finite() || face <= 0.0 {
        return Err(DeflectError::DegenerateFace(face));
    }

    let side = ball_side(paddle, ball_position, ball_velocity)?;

    let mut base = hit_factor(paddle, hit_position) * MAX_DEFLECTION_ANGLE;
    // Concave faces send the ball back across the paddle centre
    if paddle.is_concave {
        base = -base;
    }

    let angle = match paddle.orientation {
        PaddleOrientation::Vertical => {
            if side > 0.0 {
                base
            } else {
                PI - base
            }
        }
        PaddleOrientation::Horizontal => {
            // Normal runs along y, so tilt the angle off the y axis
            let tilt = FRAC_PI_2 - base;
            if side < 0.0 { -tilt } else { tilt }
        }
    };

    Ok(angle)
}

/// New ball velocity, or the error that prevented computing it
pub fn try_deflect(
    ball_velocity: Vec2,
    ball_position: Vec2,
    paddle: &PaddleGeometry,
    hit_position: Vec2,
) -> Result<Vec2, DeflectError> {
    let speed = ball_velocity.length();
    let angle = deflection_angle(ball_velocity, ball_position, paddle, hit_position)?;
    Ok(polar_to_cartesian(speed, angle))
}

/// New ball velocity; falls back to the incoming velocity if the contact can't be resolved
pub fn deflect(
    ball_velocity: Vec2,
    ball_position: Vec2,
    paddle: &PaddleGeometry,
    hit_position: Vec2,
) -> Vec2 {
    match try_deflect(ball_velocity, ball_position, paddle, hit_position) {
        Ok(velocity) => velocity,
        Err(err) => {
            log::warn!("Deflection failed, keeping velocity {ball_velocity}: {err}");
            ball_velocity
        }
    }
}

/// Deflect off a raw engine body, extracting the paddle geometry first
pub fn deflect_off_body(
    ball_velocity: Vec2,
    ball_position: Vec2,
    paddle: &Body,
    hit_position: Vec2,
) -> Vec2 {
    match PaddleGeometry::from_body(paddle) {
        Ok(geometry) => deflect(ball_velocity, ball_position, &geometry, hit_position),
        Err(err) => {
            log::warn!("Deflection failed, keeping velocity {ball_velocity}: {err}");
            ball_velocity
        }
    }
}
