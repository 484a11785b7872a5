//! Game state and core entity types
//!
//! Everything here is session-scoped: it is created when a session starts
//! and dropped when it ends. Entity ids double as engine body ids.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyData, BodyId};
use super::collision::{CollisionGroup, CollisionGroups, CollisionObjectType};
use super::deflect::{PaddleGeometry, PaddleOrientation};
use super::powerup::PowerUpKind;
use super::shape::ShapeOverlay;
use crate::consts::*;

/// How the player drives a paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlType {
    #[default]
    Pointer,
    Keyboard,
    Touch,
    /// Demo/attract mode
    Ai,
}

/// A player paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub id: BodyId,
    /// Centre position
    pub position: Vec2,
    /// Unscaled display size (width, height)
    pub base_size: Vec2,
    pub orientation: PaddleOrientation,
    pub is_concave: bool,
    /// Catches balls instead of bouncing them
    pub sticky: bool,
    pub control: ControlType,
    /// Grow/shrink scale, (1, 1) when unmodified
    pub scale: Vec2,
    pub laser_enabled: bool,
    /// Cosmetic curve drawn over the paddle face
    #[serde(skip)]
    pub shape_overlay: Option<ShapeOverlay>,
}

impl Paddle {
    pub fn new(id: BodyId, position: Vec2, orientation: PaddleOrientation) -> Self {
        let base_size = match orientation {
            PaddleOrientation::Horizontal => Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
            PaddleOrientation::Vertical => Vec2::new(PADDLE_HEIGHT, PADDLE_WIDTH),
        };
        Self {
            id,
            position,
            base_size,
            orientation,
            is_concave: false,
            sticky: false,
            control: ControlType::default(),
            scale: Vec2::ONE,
            laser_enabled: false,
            shape_overlay: None,
        }
    }

    /// Size as displayed, after grow/shrink.
    ///
    /// Scale is along the paddle's long edge, so a vertical paddle swaps axes.
    pub fn display_size(&self) -> Vec2 {
        match self.orientation {
            PaddleOrientation::Horizontal => self.base_size * self.scale,
            PaddleOrientation::Vertical => self.base_size * Vec2::new(self.scale.y, self.scale.x),
        }
    }

    pub fn geometry(&self) -> PaddleGeometry {
        let size = self.display_size();
        PaddleGeometry {
            position: self.position,
            display_width: size.x,
            display_height: size.y,
            orientation: self.orientation,
            is_concave: self.is_concave,
        }
    }

    /// Custom data to attach to the paddle's engine body
    pub fn body_data(&self) -> BodyData {
        BodyData {
            is_vertical: self.orientation == PaddleOrientation::Vertical,
            is_concave: self.is_concave,
            sticky: self.sticky,
        }
    }

    /// Unit normal of the face that looks into the play field
    pub fn face_normal(&self) -> Vec2 {
        match self.orientation {
            PaddleOrientation::Horizontal => {
                if self.position.y > FIELD_HEIGHT / 2.0 {
                    Vec2::NEG_Y
                } else {
                    Vec2::Y
                }
            }
            PaddleOrientation::Vertical => {
                if self.position.x < FIELD_WIDTH / 2.0 {
                    Vec2::X
                } else {
                    Vec2::NEG_X
                }
            }
        }
    }
}

/// A ball caught by a sticky paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StuckBall {
    pub paddle: BodyId,
    /// Offset from the paddle centre, so the ball rides along
    pub offset: Vec2,
    /// Velocity to leave with on release
    pub launch_velocity: Vec2,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: BodyId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Product of every speed factor applied to this ball
    pub speed_multiplier: f32,
    pub active: bool,
    /// Smashes through bricks
    pub fireball: bool,
    #[serde(default)]
    pub stuck: Option<StuckBall>,
}

impl Ball {
    pub fn new(id: BodyId, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            position,
            velocity,
            speed_multiplier: 1.0,
            active: true,
            fireball: false,
            stuck: None,
        }
    }

    pub fn speed(&self) -> f32 {
        match self.stuck {
            Some(stuck) => stuck.launch_velocity.length(),
            None => self.velocity.length(),
        }
    }

    /// Multiply live velocity (and any pending launch velocity) by `factor`
    pub fn scale_speed(&mut self, factor: f32) {
        self.velocity *= factor;
        self.speed_multiplier *= factor;
        if let Some(stuck) = self.stuck.as_mut() {
            stuck.launch_velocity *= factor;
        }
    }

    /// Catch the ball on a paddle, remembering where to send it later
    pub fn stick_to(&mut self, paddle: &Paddle, launch_velocity: Vec2) {
        self.stuck = Some(StuckBall {
            paddle: paddle.id,
            offset: self.position - paddle.position,
            launch_velocity,
        });
        self.velocity = Vec2::ZERO;
    }

    /// Let go of a stuck ball; false if it wasn't stuck
    pub fn release(&mut self) -> bool {
        match self.stuck.take() {
            Some(stuck) => {
                self.velocity = stuck.launch_velocity;
                true
            }
            None => false,
        }
    }
}

/// A brick entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: BodyId,
    pub position: Vec2,
    pub hp: u8,
    /// Special bricks always drop a power-up and hit harder on screen
    pub special: bool,
    /// Base points before the score multiplier
    pub value: u32,
}

impl Brick {
    pub fn new(id: BodyId, position: Vec2, hp: u8, special: bool) -> Self {
        Self {
            id,
            position,
            hp,
            special,
            value: if special { SPECIAL_BRICK_POINTS } else { BRICK_POINTS },
        }
    }

    /// Take one hit (or all remaining hp for a fireball); true once destroyed
    pub fn hit(&mut self, fireball: bool) -> bool {
        self.hp = if fireball { 0 } else { self.hp.saturating_sub(1) };
        self.hp == 0
    }
}

/// Lifecycle of a power-up instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpState {
    /// Falling through the field, not yet collected
    Pending,
    /// Collected and in effect
    Applied,
}

/// A power-up instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: BodyId,
    pub kind: PowerUpKind,
    pub position: Vec2,
    /// 0 = permanent, otherwise milliseconds until removal
    pub duration_ms: u32,
    pub state: PowerUpState,
}

impl PowerUp {
    pub fn new(id: BodyId, kind: PowerUpKind, position: Vec2, duration_ms: u32) -> Self {
        Self {
            id,
            kind,
            position,
            duration_ms,
            state: PowerUpState::Pending,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.duration_ms > 0
    }
}

/// The shield body guarding the bottom of the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shield {
    pub body: Body,
}

/// Capabilities the power-up resolver needs from the game
pub trait GameplayFacade {
    fn add_life(&mut self);
    /// Spawn `count` balls split off an active one; returns how many were spawned
    fn spawn_extra_balls(&mut self, count: u32, spread: f32) -> usize;
    fn paddle_mut(&mut self, id: BodyId) -> Option<&mut Paddle>;
    fn balls_mut(&mut self) -> &mut [Ball];
    /// False if a shield already exists
    fn add_shield(&mut self) -> bool;
    /// False if there was no shield
    fn remove_shield(&mut self) -> bool;
    fn set_score_multiplier(&mut self, multiplier: u32, show_indicator: bool);
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub lives: u32,
    pub score: u64,
    pub score_multiplier: u32,
    /// HUD indicator for an active score multiplier
    pub multiplier_indicator: bool,
    pub paddles: Vec<Paddle>,
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
    /// Power-ups currently on the field
    pub power_ups: Vec<PowerUp>,
    pub shield: Option<Shield>,
    /// Live collision table (the shield pair toggles)
    pub groups: CollisionGroups,
    next_id: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// A fresh session: one bottom paddle with a ball resting above it
    pub fn new() -> Self {
        let mut groups = CollisionGroups::default();
        // Balls only see the shield while one exists
        groups.set_pair_enabled(CollisionObjectType::Ball, CollisionObjectType::Shield, false);

        let mut state = Self {
            lives: START_LIVES,
            score: 0,
            score_multiplier: 1,
            multiplier_indicator: false,
            paddles: Vec::new(),
            balls: Vec::new(),
            bricks: Vec::new(),
            power_ups: Vec::new(),
            shield: None,
            groups,
            next_id: 1,
        };

        let paddle_pos = Vec2::new(FIELD_WIDTH / 2.0, PADDLE_Y);
        state.add_paddle(paddle_pos, PaddleOrientation::Horizontal);
        state.spawn_ball(
            paddle_pos - Vec2::new(0.0, PADDLE_HEIGHT / 2.0 + BALL_RADIUS + 2.0),
            Vec2::new(0.0, -BALL_START_SPEED),
        );
        state
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_paddle(&mut self, position: Vec2, orientation: PaddleOrientation) -> BodyId {
        let id = self.next_entity_id();
        self.paddles.push(Paddle::new(id, position, orientation));
        id
    }

    pub fn spawn_ball(&mut self, position: Vec2, velocity: Vec2) -> BodyId {
        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, position, velocity));
        id
    }

    pub fn add_brick(&mut self, position: Vec2, hp: u8, special: bool) -> BodyId {
        let id = self.next_entity_id();
        self.bricks.push(Brick::new(id, position, hp, special));
        id
    }

    pub fn spawn_power_up(&mut self, kind: PowerUpKind, position: Vec2, duration_ms: u32) -> BodyId {
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp::new(id, kind, position, duration_ms));
        id
    }

    pub fn paddle(&self, id: BodyId) -> Option<&Paddle> {
        self.paddles.iter().find(|p| p.id == id)
    }

    pub fn ball(&self, id: BodyId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_mut(&mut self, id: BodyId) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    /// Remove a power-up from the field, returning it
    pub fn take_power_up(&mut self, id: BodyId) -> Option<PowerUp> {
        let idx = self.power_ups.iter().position(|p| p.id == id)?;
        Some(self.power_ups.remove(idx))
    }

    /// Add points for a destroyed brick, after the multiplier
    pub fn award_points(&mut self, base: u32) -> u64 {
        let points = u64::from(base) * u64::from(self.score_multiplier);
        self.score += points;
        points
    }

    /// Current ball filter; changes when the shield comes and goes
    pub fn ball_filter(&self) -> CollisionGroup {
        self.groups.get(CollisionObjectType::Ball)
    }
}

impl GameplayFacade for GameState {
    fn add_life(&mut self) {
        self.lives += 1;
    }

    fn spawn_extra_balls(&mut self, count: u32, spread: f32) -> usize {
        let Some(parent) = self.balls.iter().find(|b| b.active).cloned() else {
            log::warn!("Multi-ball collected with no active ball to split");
            return 0;
        };

        // Stuck parents split off their launch velocity
        let base_velocity = parent.stuck.map_or(parent.velocity, |s| s.launch_velocity);
        for i in 0..count {
            let step = (i / 2 + 1) as f32;
            let offset = if i % 2 == 0 { spread * step } else { -spread * step };
            let id = self.next_entity_id();
            let mut ball = Ball::new(id, parent.position, Vec2::from_angle(offset).rotate(base_velocity));
            ball.fireball = parent.fireball;
            ball.speed_multiplier = parent.speed_multiplier;
            self.balls.push(ball);
        }
        count as usize
    }

    fn paddle_mut(&mut self, id: BodyId) -> Option<&mut Paddle> {
        self.paddles.iter_mut().find(|p| p.id == id)
    }

    fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }

    fn add_shield(&mut self) -> bool {
        if self.shield.is_some() {
            return false;
        }
        self.groups
            .set_pair_enabled(CollisionObjectType::Ball, CollisionObjectType::Shield, true);

        let id = self.next_entity_id();
        let body = Body::new(
            id,
            Vec2::new(FIELD_WIDTH / 2.0, SHIELD_Y),
            Vec2::new(FIELD_WIDTH, SHIELD_HEIGHT),
        )
        .with_filter(self.groups.get(CollisionObjectType::Shield));
        self.shield = Some(Shield { body });
        true
    }

    fn remove_shield(&mut self) -> bool {
        if self.shield.take().is_none() {
            return false;
        }
        self.groups
            .set_pair_enabled(CollisionObjectType::Ball, CollisionObjectType::Shield, false);
        true
    }

    fn set_score_multiplier(&mut self, multiplier: u32, show_indicator: bool) {
        self.score_multiplier = multiplier;
        self.multiplier_indicator = show_indicator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let state = GameState::new();
        assert_eq!(state.lives, START_LIVES);
        assert_eq!(state.paddles.len(), 1);
        assert_eq!(state.balls.len(), 1);
        assert_eq!(state.score_multiplier, 1);
        assert!(!state.groups.pair_enabled(CollisionObjectType::Ball, CollisionObjectType::Shield));
        assert_ne!(state.paddles[0].id, state.balls[0].id);
    }

    #[test]
    fn test_spawn_extra_balls_keeps_speed() {
        let mut state = GameState::new();
        state.balls[0].fireball = true;
        let speed = state.balls[0].speed();

        assert_eq!(state.spawn_extra_balls(2, 0.5), 2);
        assert_eq!(state.balls.len(), 3);
        for ball in &state.balls {
            assert!((ball.speed() - speed).abs() < 1e-3);
            assert!(ball.fireball);
        }
        // Children fan out on both sides of the parent
        let parent = state.balls[0].velocity;
        let signed_angle = |v: Vec2| parent.perp_dot(v).atan2(parent.dot(v));
        let a = signed_angle(state.balls[1].velocity);
        let b = signed_angle(state.balls[2].velocity);
        assert!((a - 0.5).abs() < 1e-4);
        assert!((b + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_extra_balls_without_parent() {
        let mut state = GameState::new();
        state.balls.clear();
        assert_eq!(state.spawn_extra_balls(2, 0.5), 0);
        assert!(state.balls.is_empty());
    }

    #[test]
    fn test_shield_add_remove_idempotent() {
        let mut state = GameState::new();
        assert!(state.add_shield());
        assert!(!state.add_shield());
        assert!(state.groups.pair_enabled(CollisionObjectType::Ball, CollisionObjectType::Shield));

        assert!(state.remove_shield());
        assert!(!state.remove_shield());
        assert!(state.shield.is_none());
        assert!(!state.groups.pair_enabled(CollisionObjectType::Ball, CollisionObjectType::Shield));
    }

    #[test]
    fn test_sticky_catch_and_release() {
        let mut state = GameState::new();
        let paddle = state.paddles[0].clone();
        let ball = &mut state.balls[0];
        ball.stick_to(&paddle, Vec2::new(10.0, -200.0));
        assert_eq!(ball.velocity, Vec2::ZERO);

        ball.scale_speed(2.0);
        assert!(ball.release());
        assert_eq!(ball.velocity, Vec2::new(20.0, -400.0));
        assert!(!ball.release());
    }

    #[test]
    fn test_score_multiplier_applies_to_points() {
        let mut state = GameState::new();
        assert_eq!(state.award_points(10), 10);
        state.set_score_multiplier(2, true);
        assert_eq!(state.award_points(10), 20);
        assert_eq!(state.score, 30);
    }

    #[test]
    fn test_vertical_display_size_scales_long_edge() {
        let mut paddle = Paddle::new(BodyId(1), Vec2::new(20.0, 300.0), PaddleOrientation::Vertical);
        paddle.scale = Vec2::new(1.5, 1.0);
        let size = paddle.display_size();
        assert_eq!(size, Vec2::new(PADDLE_HEIGHT, PADDLE_WIDTH * 1.5));
        assert_eq!(paddle.face_normal(), Vec2::X);
    }

    #[test]
    fn test_fireball_destroys_brick_outright() {
        let mut brick = Brick::new(BodyId(1), Vec2::ZERO, 3, false);
        assert!(!brick.hit(false));
        assert!(brick.hit(true));
    }
}
