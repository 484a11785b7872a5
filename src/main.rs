//! Brickfall entry point
//!
//! Runs a short scripted headless session against the core and logs what
//! happens. Pass a tuning JSON file as the first argument to override
//! balance. Set `RUST_LOG=info` (or `debug`) to see the trace.

use std::error::Error;

use glam::Vec2;

use brickfall::camera_fx::LogCamera;
use brickfall::consts::*;
use brickfall::sim::{Body, BodyId, CollisionObjectType, CollisionOutcome, CollisionStart, Session};
use brickfall::{Settings, Tuning};

const FRAME_MS: u32 = 16;

fn main() {
    env_logger::init();
    log::info!("Brickfall (headless) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match load_tuning(&path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::error!("Failed to load tuning from {path}: {err}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let mut session = match Session::new(tuning, Settings::default(), Box::new(LogCamera), 2024) {
        Ok(session) => session,
        Err(err) => {
            log::error!("Cannot start session: {err}");
            std::process::exit(1);
        }
    };
    run_demo(&mut session);
    session.teardown();
}

fn load_tuning(path: &str) -> Result<Tuning, Box<dyn Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(Tuning::from_json(&json)?)
}

fn ball_body(session: &Session) -> Option<Body> {
    let state = session.state();
    let ball = state.balls.first()?;
    Some(
        Body::new(ball.id, ball.position, Vec2::splat(BALL_RADIUS * 2.0))
            .with_filter(state.ball_filter())
            .with_velocity(ball.velocity),
    )
}

fn body_of(session: &Session, id: BodyId, kind: CollisionObjectType, position: Vec2, size: Vec2) -> Body {
    Body::new(id, position, size).with_filter(session.state().groups.get(kind))
}

/// Knock out a brick wall, catching whatever falls, then lose every life
fn run_demo(session: &mut Session) {
    for row in 0..2 {
        for col in 0..8 {
            let position = Vec2::new(85.0 + col as f32 * 90.0, 80.0 + row as f32 * 30.0);
            session.state_mut().add_brick(position, 1, col == 3);
        }
    }

    let paddle = session.state().paddles[0].clone();
    let paddle_body = body_of(
        session,
        paddle.id,
        CollisionObjectType::Paddle,
        paddle.position,
        paddle.display_size(),
    )
    .with_data(paddle.body_data());

    let bricks: Vec<(BodyId, Vec2)> = session.state().bricks.iter().map(|b| (b.id, b.position)).collect();
    for (i, (brick, position)) in bricks.into_iter().enumerate() {
        // Bounce off a different spot on the paddle each time
        let x = paddle.position.x + (i as f32 - 8.0) * 6.0;
        if let Some(ball) = session.state_mut().balls.first_mut() {
            ball.position = Vec2::new(x, paddle.position.y - 15.0);
            ball.velocity = Vec2::new(0.0, BALL_START_SPEED);
        }
        let Some(ball) = ball_body(session) else {
            break;
        };
        let bounce = CollisionStart {
            a: ball,
            b: paddle_body.clone(),
            contact: Vec2::new(x, paddle.position.y - PADDLE_HEIGHT / 2.0),
        };
        if let CollisionOutcome::Caught { .. } = session.handle_collision(&bounce) {
            session.release_stuck_balls();
        }

        let Some(ball) = ball_body(session) else {
            break;
        };
        let brick_body = body_of(session, brick, CollisionObjectType::Brick, position, Vec2::new(80.0, 24.0));
        let strike = CollisionStart {
            a: ball,
            b: brick_body,
            contact: position,
        };
        if let CollisionOutcome::Brick(hit) = session.handle_collision(&strike)
            && let Some(drop) = hit.drop
        {
            let power_up = body_of(session, drop, CollisionObjectType::PowerUp, paddle.position, Vec2::splat(16.0));
            let catch = CollisionStart {
                a: power_up,
                b: paddle_body.clone(),
                contact: paddle.position,
            };
            let outcome = session.handle_collision(&catch);
            log::info!("Caught drop: {outcome:?}");
        }

        for _ in 0..30 {
            session.tick(FRAME_MS);
        }
    }

    while !session.is_game_over() {
        session.life_lost();
        session.tick(FRAME_MS);
    }

    let state = session.state();
    println!("Final score: {} ({} bricks left)", state.score, state.bricks.len());
}
