//! Paddle shape overlay
//!
//! A curve drawn over the paddle face to show whether it is concave or
//! convex. It is purely cosmetic: deflection reads `Paddle::is_concave`,
//! never the overlay.

use glam::Vec2;

use super::deflect::PaddleOrientation;
use super::state::Paddle;
use crate::consts::{SHAPE_OVERLAY_DEPTH, SHAPE_OVERLAY_SAMPLES};

/// Sampled curve in world space, from one end of the face to the other
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeOverlay {
    pub concave: bool,
    pub points: Vec<Vec2>,
}

/// Sample a bow along the paddle's field-facing edge.
///
/// Convex bows bulge into the field, concave ones dip into the paddle.
pub fn sample_face_curve(paddle: &Paddle, depth: f32, num_points: usize) -> Vec<Vec2> {
    let size = paddle.display_size();
    let normal = paddle.face_normal();
    let (along, half_len, half_thick) = match paddle.orientation {
        PaddleOrientation::Horizontal => (Vec2::X, size.x / 2.0, size.y / 2.0),
        PaddleOrientation::Vertical => (Vec2::Y, size.y / 2.0, size.x / 2.0),
    };
    let face_center = paddle.position + normal * half_thick;
    let bow = if paddle.is_concave { -depth } else { depth };

    (0..num_points)
        .map(|i| {
            let t = i as f32 / (num_points - 1).max(1) as f32;
            let u = t * 2.0 - 1.0;
            // Parabola: full depth at the centre, zero at both ends
            face_center + along * (u * half_len) + normal * (bow * (1.0 - u * u))
        })
        .collect()
}

/// Draw (or redraw) the overlay; any previous overlay is replaced
pub fn apply_paddle_shape_visual(paddle: &mut Paddle) -> &ShapeOverlay {
    let overlay = ShapeOverlay {
        concave: paddle.is_concave,
        points: sample_face_curve(paddle, SHAPE_OVERLAY_DEPTH, SHAPE_OVERLAY_SAMPLES),
    };
    paddle.shape_overlay.insert(overlay)
}

/// Dispose of the overlay; false if there was none
pub fn remove_paddle_shape_visual(paddle: &mut Paddle) -> bool {
    paddle.shape_overlay.take().is_some()
}
