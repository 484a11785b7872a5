//! Session frame driver
//!
//! Ties the pieces together for one play session. The host physics engine
//! reports contacts through [`Session::handle_collision`] and advances time
//! through [`Session::tick`]. Within a frame, contact handling mutates state
//! and emits events; `tick` then fires due effect timers and finally lets
//! the camera dispatcher drain the channel.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{Body, BodyId, CollisionStart};
use super::collision::CollisionObjectType;
use super::deflect::{PaddleGeometry, deflect};
use super::events::{EventChannel, GameplayEvent};
use super::powerup::{ApplyOutcome, EffectKey, PowerUpKind, PowerUpResolver};
use super::shape::{apply_paddle_shape_visual, remove_paddle_shape_visual};
use super::state::{Brick, GameState};
use crate::camera_fx::{CameraEffects, EffectDispatcher};
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::{Tuning, TuningError};

/// Damage dealt to one brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrickHit {
    pub brick: BodyId,
    pub destroyed: bool,
    /// Points awarded, after the score multiplier
    pub points: u64,
    /// Power-up dropped by the brick
    pub drop: Option<BodyId>,
}

/// What a contact did, for the engine to act on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// Filters don't allow this pair, or the bodies are unknown
    Ignored,
    /// Allowed, but the engine's own response is all there is
    Passive,
    /// Write this velocity back to the ball body
    Deflected { ball: BodyId, velocity: Vec2 },
    /// A sticky paddle caught the ball
    Caught { ball: BodyId, paddle: BodyId },
    Brick(BrickHit),
    /// The bolt is spent
    Laser { bolt: BodyId, hit: BrickHit },
    PowerUp {
        power_up: BodyId,
        kind: PowerUpKind,
        outcome: ApplyOutcome,
    },
}

/// One play session
pub struct Session {
    state: GameState,
    resolver: PowerUpResolver,
    dispatcher: EffectDispatcher,
    events: EventChannel,
    settings: Settings,
    tuning: Tuning,
    rng: Pcg32,
    game_over: bool,
}

impl Session {
    /// Rejects tuning that fails [`Tuning::validate`]
    pub fn new(
        tuning: Tuning,
        settings: Settings,
        camera: Box<dyn CameraEffects>,
        seed: u64,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        let events = EventChannel::new();
        let resolver = PowerUpResolver::new(tuning.clone(), events.clone());
        let dispatcher = EffectDispatcher::new(camera, events.clone(), tuning.camera.clone(), &settings);

        let mut session = Self {
            state: GameState::new(),
            resolver,
            dispatcher,
            events,
            settings,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            game_over: false,
        };
        session.sync_overlays();
        log::info!("Session started (seed {seed})");
        Ok(session)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for level setup
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn resolver(&self) -> &PowerUpResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut PowerUpResolver {
        &mut self.resolver
    }

    pub fn dispatcher(&self) -> &EffectDispatcher {
        &self.dispatcher
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Route a collision-start event from the engine
    pub fn handle_collision(&mut self, pair: &CollisionStart) -> CollisionOutcome {
        use CollisionObjectType as T;

        if self.game_over || !pair.is_relevant() {
            return CollisionOutcome::Ignored;
        }
        let (Some(ta), Some(tb)) = (pair.a.object_type(), pair.b.object_type()) else {
            log::debug!("Contact between unclassified bodies {:?} / {:?}", pair.a.id, pair.b.id);
            return CollisionOutcome::Ignored;
        };

        match (ta, tb) {
            (T::Ball, T::Paddle) | (T::Paddle, T::Ball) => {
                let (ball, paddle) = pair.ordered(T::Ball);
                self.ball_hits_paddle(ball, paddle, pair.contact)
            }
            (T::Ball, T::Brick) | (T::Brick, T::Ball) => {
                let (ball, brick) = pair.ordered(T::Ball);
                let fireball = self.state.ball(ball.id).is_some_and(|b| b.fireball);
                self.damage_brick(brick.id, fireball)
                    .map_or(CollisionOutcome::Passive, CollisionOutcome::Brick)
            }
            (T::Laser, T::Brick) | (T::Brick, T::Laser) => {
                let (bolt, brick) = pair.ordered(T::Laser);
                match self.damage_brick(brick.id, true) {
                    Some(hit) => CollisionOutcome::Laser { bolt: bolt.id, hit },
                    None => CollisionOutcome::Passive,
                }
            }
            (T::PowerUp, T::Paddle) | (T::Paddle, T::PowerUp) => {
                let (power_up, paddle) = pair.ordered(T::PowerUp);
                self.collect_power_up(power_up.id, paddle.id)
            }
            _ => CollisionOutcome::Passive,
        }
    }

    fn ball_hits_paddle(&mut self, ball: &Body, paddle_body: &Body, contact: Vec2) -> CollisionOutcome {
        // Entity state wins over the engine snapshot; grow/shrink and sticky live there
        let (geometry, sticky) = match self.state.paddle(paddle_body.id) {
            Some(paddle) => (paddle.geometry(), paddle.sticky),
            None => match PaddleGeometry::from_body(paddle_body) {
                Ok(geometry) => (geometry, paddle_body.data.is_some_and(|d| d.sticky)),
                Err(err) => {
                    log::warn!("Ball hit paddle without geometry: {err}");
                    return CollisionOutcome::Passive;
                }
            },
        };

        let velocity = deflect(ball.velocity, ball.position, &geometry, contact);
        log::debug!("Ball {:?} deflected to {velocity}", ball.id);

        let paddle = self.state.paddle(paddle_body.id).cloned();
        let Some(entity) = self.state.ball_mut(ball.id) else {
            return CollisionOutcome::Deflected {
                ball: ball.id,
                velocity,
            };
        };
        entity.position = ball.position;

        match paddle {
            Some(paddle) if sticky => {
                entity.stick_to(&paddle, velocity);
                CollisionOutcome::Caught {
                    ball: ball.id,
                    paddle: paddle.id,
                }
            }
            _ => {
                entity.velocity = velocity;
                CollisionOutcome::Deflected {
                    ball: ball.id,
                    velocity,
                }
            }
        }
    }

    /// One hit on a brick; `None` if the brick is already gone
    fn damage_brick(&mut self, id: BodyId, destroy: bool) -> Option<BrickHit> {
        let idx = self.state.bricks.iter().position(|b| b.id == id)?;
        if !self.state.bricks[idx].hit(destroy) {
            return Some(BrickHit {
                brick: id,
                destroyed: false,
                points: 0,
                drop: None,
            });
        }

        let brick = self.state.bricks.remove(idx);
        let points = self.state.award_points(brick.value);
        // The level-complete sweep would take any drop straight off the field
        let cleared = self.state.bricks.is_empty();
        let drop = if cleared { None } else { self.roll_drop(&brick) };
        log::debug!("Brick {id:?} destroyed for {points} points");
        self.events.emit(GameplayEvent::BrickDestroyed {
            special: brick.special,
        });

        if cleared {
            self.level_complete();
        }

        Some(BrickHit {
            brick: id,
            destroyed: true,
            points,
            drop,
        })
    }

    fn roll_drop(&mut self, brick: &Brick) -> Option<BodyId> {
        if !brick.special && self.rng.random::<f32>() >= self.tuning.drop_chance {
            return None;
        }
        let total = self.tuning.drop_weights.total();
        if total == 0 {
            return None;
        }
        let roll = self.rng.random_range(0..total);
        let kind = self.tuning.drop_weights.pick(roll)?;
        let id = self
            .state
            .spawn_power_up(kind, brick.position, self.tuning.duration_ms(kind));
        log::debug!("Brick {:?} dropped {kind}", brick.id);
        Some(id)
    }

    fn collect_power_up(&mut self, id: BodyId, paddle: BodyId) -> CollisionOutcome {
        let Some(mut power_up) = self.state.take_power_up(id) else {
            return CollisionOutcome::Passive;
        };
        let outcome = self.resolver.apply(&mut power_up, paddle, &mut self.state);
        CollisionOutcome::PowerUp {
            power_up: id,
            kind: power_up.kind,
            outcome,
        }
    }

    /// Advance one frame: expire effects, carry caught balls, run camera feedback
    pub fn tick(&mut self, dt_ms: u32) -> Vec<EffectKey> {
        let expired = self.resolver.advance(dt_ms, &mut self.state);

        let state = &mut self.state;
        for ball in &mut state.balls {
            if let Some(stuck) = ball.stuck
                && let Some(paddle) = state.paddles.iter().find(|p| p.id == stuck.paddle)
            {
                ball.position = paddle.position + stuck.offset;
            }
        }

        self.dispatcher.tick(dt_ms);
        expired
    }

    /// The last active ball left the field
    pub fn life_lost(&mut self) {
        if self.game_over {
            return;
        }
        self.clear_round();
        self.state.lives = self.state.lives.saturating_sub(1);
        log::info!("Life lost, {} left", self.state.lives);
        self.events.emit(GameplayEvent::LifeLost);

        if self.state.lives == 0 {
            self.game_over = true;
            self.state.balls.clear();
            log::info!("Game over with score {}", self.state.score);
            self.events.emit(GameplayEvent::GameOver);
        } else {
            self.serve_ball();
        }
    }

    pub fn level_complete(&mut self) {
        self.clear_round();
        log::info!("Level complete, score {}", self.state.score);
        self.events.emit(GameplayEvent::LevelComplete);
        self.serve_ball();
    }

    /// Undo every effect and sweep the field
    fn clear_round(&mut self) {
        self.resolver.reset(&mut self.state);
        self.state.power_ups.clear();
    }

    fn serve_ball(&mut self) {
        self.state.balls.clear();
        let Some(paddle) = self.state.paddles.first() else {
            return;
        };
        let normal = paddle.face_normal();
        let position = paddle.position + normal * (PADDLE_HEIGHT / 2.0 + BALL_RADIUS + 2.0);
        self.state.spawn_ball(position, normal * BALL_START_SPEED);
    }

    pub fn change_settings(&mut self, settings: Settings) {
        self.dispatcher.apply_settings(&settings);
        self.settings = settings;
        self.sync_overlays();
        self.events.emit(GameplayEvent::SettingsChanged {
            camera_effects_enabled: self.settings.effective_camera_effects(),
        });
    }

    fn sync_overlays(&mut self) {
        for paddle in &mut self.state.paddles {
            if self.settings.shape_overlay {
                apply_paddle_shape_visual(paddle);
            } else {
                remove_paddle_shape_visual(paddle);
            }
        }
    }

    /// A falling power-up left the field uncollected
    pub fn power_up_left_field(&mut self, id: BodyId) -> bool {
        self.state.take_power_up(id).is_some()
    }

    /// Launch every ball a sticky paddle is holding
    pub fn release_stuck_balls(&mut self) -> usize {
        let mut released = 0;
        for ball in &mut self.state.balls {
            if ball.release() {
                released += 1;
            }
        }
        released
    }

    /// Two bolts from the paddle's ends; empty unless the paddle has lasers
    pub fn fire_laser(&mut self, paddle: BodyId) -> Vec<Body> {
        let Some(paddle) = self.state.paddle(paddle).filter(|p| p.laser_enabled) else {
            return Vec::new();
        };
        let normal = paddle.face_normal();
        let half = paddle.display_size() / 2.0;
        let along = Vec2::new(normal.y.abs(), normal.x.abs()) * half;
        let muzzle = paddle.position + normal * half.dot(normal.abs());
        let filter = self.state.groups.get(CollisionObjectType::Laser);

        [muzzle - along, muzzle + along]
            .into_iter()
            .map(|origin| {
                let id = self.state.next_entity_id();
                Body::new(id, origin, LASER_BOLT_SIZE)
                    .with_filter(filter)
                    .with_velocity(normal * LASER_SPEED)
            })
            .collect()
    }

    /// Stop camera feedback and undo all effects
    pub fn teardown(&mut self) {
        self.dispatcher.teardown();
        self.resolver.reset(&mut self.state);
        for paddle in &mut self.state.paddles {
            remove_paddle_shape_visual(paddle);
        }
        log::info!("Session ended, score {}", self.state.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_fx::tests::{Call, RecordingCamera};
    use crate::sim::events::EventKind;
    use crate::sim::state::GameplayFacade;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quiet_tuning() -> Tuning {
        Tuning {
            drop_chance: 0.0,
            ..Tuning::default()
        }
    }

    fn session_with(tuning: Tuning, seed: u64) -> (Session, Rc<RefCell<Vec<Call>>>) {
        let camera = RecordingCamera::default();
        let calls = camera.calls.clone();
        let session = Session::new(tuning, Settings::default(), Box::new(camera), seed).unwrap();
        (session, calls)
    }

    fn session() -> (Session, Rc<RefCell<Vec<Call>>>) {
        session_with(quiet_tuning(), 7)
    }

    fn ball_body(session: &Session, idx: usize) -> Body {
        let ball = &session.state().balls[idx];
        Body::new(ball.id, ball.position, Vec2::splat(BALL_RADIUS * 2.0))
            .with_filter(session.state().ball_filter())
            .with_velocity(ball.velocity)
    }

    fn paddle_body(session: &Session) -> Body {
        let paddle = &session.state().paddles[0];
        Body::new(paddle.id, paddle.position, paddle.display_size())
            .with_filter(session.state().groups.get(CollisionObjectType::Paddle))
            .with_data(paddle.body_data())
    }

    fn brick_body(session: &Session, id: BodyId) -> Body {
        let brick = session.state().bricks.iter().find(|b| b.id == id).unwrap();
        Body::new(id, brick.position, Vec2::new(60.0, 20.0))
            .with_filter(session.state().groups.get(CollisionObjectType::Brick))
    }

    fn power_up_body(session: &Session, id: BodyId) -> Body {
        let power_up = session.state().power_ups.iter().find(|p| p.id == id).unwrap();
        Body::new(id, power_up.position, Vec2::splat(16.0))
            .with_filter(session.state().groups.get(CollisionObjectType::PowerUp))
    }

    fn contact(a: Body, b: Body, at: Vec2) -> CollisionStart {
        CollisionStart { a, b, contact: at }
    }

    /// Ball just above the bottom paddle, falling onto it
    fn drop_ball_on_paddle(session: &mut Session, x: f32) -> CollisionStart {
        let ball = &mut session.state_mut().balls[0];
        ball.position = Vec2::new(x, 545.0);
        ball.velocity = Vec2::new(0.0, 300.0);
        contact(ball_body(session, 0), paddle_body(session), Vec2::new(x, 550.0))
    }

    #[test]
    fn test_invalid_tuning_is_rejected() {
        let tuning = Tuning {
            speed_factor: 0.0,
            ..Tuning::default()
        };
        let result = Session::new(tuning, Settings::default(), Box::new(RecordingCamera::default()), 1);
        assert!(matches!(result, Err(TuningError::Invalid(_))));
    }

    #[test]
    fn test_filtered_pair_is_ignored() {
        let (mut session, _) = session();
        let pu = session
            .state_mut()
            .spawn_power_up(PowerUpKind::Laser, Vec2::new(400.0, 500.0), 8_000);
        let pair = contact(ball_body(&session, 0), power_up_body(&session, pu), Vec2::ZERO);

        assert_eq!(session.handle_collision(&pair), CollisionOutcome::Ignored);
        assert_eq!(session.state().power_ups.len(), 1);
    }

    #[test]
    fn test_shield_contact_only_while_shield_is_up() {
        let (mut session, _) = session();
        let shield = |s: &Session| {
            Body::new(BodyId(900), Vec2::new(400.0, SHIELD_Y), Vec2::new(FIELD_WIDTH, SHIELD_HEIGHT))
                .with_filter(s.state().groups.get(CollisionObjectType::Shield))
        };

        let pair = contact(ball_body(&session, 0), shield(&session), Vec2::ZERO);
        assert_eq!(session.handle_collision(&pair), CollisionOutcome::Ignored);

        let paddle = session.state().paddles[0].id;
        let id = session.state_mut().next_entity_id();
        let mut pu = crate::sim::PowerUp::new(id, PowerUpKind::Shield, Vec2::ZERO, 10_000);
        let Session { resolver, state, .. } = &mut session;
        resolver.apply(&mut pu, paddle, state);

        let pair = contact(ball_body(&session, 0), shield(&session), Vec2::ZERO);
        assert_eq!(session.handle_collision(&pair), CollisionOutcome::Passive);
    }

    #[test]
    fn test_center_hit_bounces_straight_back() {
        let (mut session, _) = session();
        let pair = drop_ball_on_paddle(&mut session, 400.0);
        let ball = session.state().balls[0].id;

        match session.handle_collision(&pair) {
            CollisionOutcome::Deflected { ball: id, velocity } => {
                assert_eq!(id, ball);
                assert!((velocity - Vec2::new(0.0, -300.0)).length() < 1e-3);
                assert_eq!(session.state().balls[0].velocity, velocity);
            }
            other => panic!("expected deflection, got {other:?}"),
        }
    }

    #[test]
    fn test_edge_hit_is_clamped_and_keeps_speed() {
        let (mut session, _) = session();
        // Well past the right edge of the paddle
        let pair = drop_ball_on_paddle(&mut session, 470.0);

        let CollisionOutcome::Deflected { velocity, .. } = session.handle_collision(&pair) else {
            panic!("expected deflection");
        };
        assert!((velocity.length() - 300.0).abs() < 1e-3);
        let off_vertical = velocity.x.atan2(-velocity.y);
        assert!((off_vertical - MAX_DEFLECTION_ANGLE).abs() < 1e-4);
    }

    #[test]
    fn test_sticky_paddle_catches_then_releases() {
        let (mut session, _) = session();
        session.state_mut().paddles[0].sticky = true;
        let pair = drop_ball_on_paddle(&mut session, 400.0);
        let paddle = session.state().paddles[0].id;

        assert!(matches!(
            session.handle_collision(&pair),
            CollisionOutcome::Caught { paddle: p, .. } if p == paddle
        ));
        assert_eq!(session.state().balls[0].velocity, Vec2::ZERO);

        // Caught balls ride along with the paddle
        session.state_mut().paddles[0].position.x += 50.0;
        session.tick(16);
        assert!((session.state().balls[0].position.x - 450.0).abs() < 1e-3);

        assert_eq!(session.release_stuck_balls(), 1);
        assert!((session.state().balls[0].velocity - Vec2::new(0.0, -300.0)).length() < 1e-3);
        assert_eq!(session.release_stuck_balls(), 0);
    }

    #[test]
    fn test_brick_scoring_uses_multiplier() {
        let (mut session, _) = session();
        let sub = session.events().subscribe(&[EventKind::BrickDestroyed]);
        let brick = session.state_mut().add_brick(Vec2::new(100.0, 100.0), 2, false);
        session.state_mut().add_brick(Vec2::new(200.0, 100.0), 1, false);
        session.state_mut().set_score_multiplier(2, true);

        let first = contact(ball_body(&session, 0), brick_body(&session, brick), Vec2::new(100.0, 110.0));
        assert!(matches!(
            session.handle_collision(&first),
            CollisionOutcome::Brick(BrickHit { destroyed: false, points: 0, .. })
        ));
        let second = contact(ball_body(&session, 0), brick_body(&session, brick), Vec2::new(100.0, 110.0));
        assert!(matches!(
            session.handle_collision(&second),
            CollisionOutcome::Brick(BrickHit { destroyed: true, points: 20, drop: None, .. })
        ));

        assert_eq!(session.state().score, 20);
        assert_eq!(
            session.events().drain(sub),
            vec![GameplayEvent::BrickDestroyed { special: false }]
        );
        // A second contact with a destroyed brick is harmless
        assert_eq!(session.handle_collision(&second), CollisionOutcome::Passive);
    }

    #[test]
    fn test_special_brick_always_drops() {
        let (mut session, _) = session();
        let special = session.state_mut().add_brick(Vec2::new(100.0, 100.0), 1, true);
        session.state_mut().add_brick(Vec2::new(200.0, 100.0), 1, false);

        let pair = contact(ball_body(&session, 0), brick_body(&session, special), Vec2::ZERO);
        let CollisionOutcome::Brick(hit) = session.handle_collision(&pair) else {
            panic!("expected brick hit");
        };
        assert_eq!(hit.points, u64::from(SPECIAL_BRICK_POINTS));
        let drop = hit.drop.expect("special bricks always drop");
        let power_up = &session.state().power_ups[0];
        assert_eq!(power_up.id, drop);
        assert_eq!(power_up.position, Vec2::new(100.0, 100.0));
        assert_eq!(power_up.duration_ms, session.resolver().tuning().duration_ms(power_up.kind));
    }

    #[test]
    fn test_last_brick_drops_nothing() {
        let (mut session, _) = session();
        let special = session.state_mut().add_brick(Vec2::new(100.0, 100.0), 1, true);

        let pair = contact(ball_body(&session, 0), brick_body(&session, special), Vec2::ZERO);
        let CollisionOutcome::Brick(hit) = session.handle_collision(&pair) else {
            panic!("expected brick hit");
        };
        assert!(hit.destroyed);
        assert_eq!(hit.points, u64::from(SPECIAL_BRICK_POINTS));
        assert_eq!(hit.drop, None);
        assert!(session.state().power_ups.is_empty());
    }

    #[test]
    fn test_fireball_and_laser_destroy_outright() {
        let (mut session, _) = session();
        let tough = session.state_mut().add_brick(Vec2::new(100.0, 100.0), 3, false);
        let other = session.state_mut().add_brick(Vec2::new(200.0, 100.0), 3, false);
        session.state_mut().add_brick(Vec2::new(300.0, 100.0), 1, false);

        session.state_mut().balls[0].fireball = true;
        let pair = contact(brick_body(&session, tough), ball_body(&session, 0), Vec2::ZERO);
        assert!(matches!(
            session.handle_collision(&pair),
            CollisionOutcome::Brick(BrickHit { destroyed: true, .. })
        ));

        let paddle = session.state().paddles[0].id;
        assert!(session.fire_laser(paddle).is_empty());
        session.state_mut().paddles[0].laser_enabled = true;
        let bolts = session.fire_laser(paddle);
        assert_eq!(bolts.len(), 2);
        assert!(bolts.iter().all(|b| b.velocity.y < 0.0));

        let pair = contact(bolts[0].clone(), brick_body(&session, other), Vec2::ZERO);
        assert!(matches!(
            session.handle_collision(&pair),
            CollisionOutcome::Laser { bolt, hit: BrickHit { destroyed: true, .. } } if bolt == bolts[0].id
        ));
        assert_eq!(session.state().bricks.len(), 1);
    }

    #[test]
    fn test_collect_then_expire() {
        let (mut session, calls) = session();
        let pu = session
            .state_mut()
            .spawn_power_up(PowerUpKind::PaddleGrow, Vec2::new(400.0, 550.0), 10_000);
        let pair = contact(power_up_body(&session, pu), paddle_body(&session), Vec2::new(400.0, 550.0));

        assert_eq!(
            session.handle_collision(&pair),
            CollisionOutcome::PowerUp {
                power_up: pu,
                kind: PowerUpKind::PaddleGrow,
                outcome: ApplyOutcome::Started,
            }
        );
        assert!(session.state().power_ups.is_empty());
        assert_eq!(session.state().paddles[0].scale, Vec2::new(1.5, 1.0));

        // The dispatcher sees the collection on the next frame
        session.tick(16);
        assert!(matches!(calls.borrow()[..], [Call::Flash(..)]));

        let expired = session.tick(10_000);
        assert_eq!(expired.len(), 1);
        assert_eq!(session.state().paddles[0].scale, Vec2::ONE);
    }

    #[test]
    fn test_life_lost_clears_effects_and_ends_game() {
        let (mut session, _) = session();
        let sub = session.events().subscribe(&[EventKind::LifeLost, EventKind::GameOver]);
        let paddle = session.state().paddles[0].id;
        let id = session.state_mut().next_entity_id();
        let mut pu = crate::sim::PowerUp::new(id, PowerUpKind::Laser, Vec2::ZERO, 8_000);
        let Session { resolver, state, .. } = &mut session;
        resolver.apply(&mut pu, paddle, state);

        session.life_lost();
        assert!(!session.state().paddles[0].laser_enabled);
        assert_eq!(session.resolver().pending_timers(), 0);
        assert_eq!(session.state().lives, START_LIVES - 1);
        assert_eq!(session.state().balls.len(), 1);

        for _ in 1..START_LIVES {
            session.life_lost();
        }
        assert!(session.is_game_over());
        session.life_lost();
        assert_eq!(session.state().lives, 0);

        let events = session.events().drain(sub);
        assert_eq!(events.len(), START_LIVES as usize + 1);
        assert_eq!(events.last(), Some(&GameplayEvent::GameOver));
    }

    #[test]
    fn test_clearing_last_brick_completes_level() {
        let (mut session, calls) = session();
        let sub = session.events().subscribe(&[EventKind::LevelComplete]);
        let brick = session.state_mut().add_brick(Vec2::new(100.0, 100.0), 1, false);

        let pair = contact(ball_body(&session, 0), brick_body(&session, brick), Vec2::ZERO);
        session.handle_collision(&pair);
        assert_eq!(session.events().drain(sub), vec![GameplayEvent::LevelComplete]);

        session.tick(16);
        assert!(calls.borrow().iter().any(|c| matches!(c, Call::Zoom(..))));
    }

    #[test]
    fn test_disabling_camera_effects() {
        let (mut session, calls) = session();
        session.change_settings(Settings {
            camera_effects: false,
            shape_overlay: false,
            ..Settings::default()
        });
        assert!(session.state().paddles[0].shape_overlay.is_none());

        session.life_lost();
        session.tick(16);
        assert!(!session.dispatcher().is_enabled());
        assert!(calls.borrow().is_empty());

        session.change_settings(Settings::default());
        assert!(session.state().paddles[0].shape_overlay.is_some());
        session.life_lost();
        session.tick(16);
        assert!(!calls.borrow().is_empty());
    }

    #[test]
    fn test_power_up_left_field() {
        let (mut session, _) = session();
        let pu = session
            .state_mut()
            .spawn_power_up(PowerUpKind::Fireball, Vec2::new(400.0, 600.0), 8_000);
        assert!(session.power_up_left_field(pu));
        assert!(!session.power_up_left_field(pu));
    }

    #[test]
    fn test_same_seed_same_drops() {
        let run = |seed| {
            let tuning = Tuning {
                drop_chance: 0.5,
                ..Tuning::default()
            };
            let (mut session, _) = session_with(tuning, seed);
            let ids: Vec<BodyId> = (0..20)
                .map(|i| session.state_mut().add_brick(Vec2::new(i as f32 * 30.0, 50.0), 1, false))
                .collect();
            session.state_mut().add_brick(Vec2::new(0.0, 0.0), 1, false);
            for id in ids {
                let pair = contact(ball_body(&session, 0), brick_body(&session, id), Vec2::ZERO);
                session.handle_collision(&pair);
            }
            session
                .state()
                .power_ups
                .iter()
                .map(|p| p.kind)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_teardown() {
        let (mut session, calls) = session();
        session.teardown();
        assert!(!session.dispatcher().is_subscribed());
        assert!(session.state().paddles[0].shape_overlay.is_none());
        assert_eq!(calls.borrow().len(), 2);
    }
}
