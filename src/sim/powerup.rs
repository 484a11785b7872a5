//! Power-up effects: apply, timed removal, and refresh on re-collection
//!
//! Each kind maps to one mutation through `GameplayFacade` and, if the kind
//! is temporary, to its exact inverse. Paddle effects (grow, shrink,
//! sticky, laser) are active at most once per (paddle, kind); the rest act
//! on the whole field and are active at most once per kind, whichever
//! paddle collected them. Collecting the same kind again only pushes the
//! removal deadline back; it never stacks the mutation, so every
//! acquisition is undone exactly once.
//!
//! Speed effects multiply live ball velocity directly. Stacked speed
//! effects therefore depend on which balls exist when each one is applied
//! and removed: a ball spawned while speed-up is active still gets divided
//! when it expires.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::body::BodyId;
use super::events::{EventChannel, GameplayEvent};
use super::state::{GameplayFacade, PowerUp, PowerUpState};
use super::timer::{TimerHandle, TimerQueue};
use crate::tuning::Tuning;

/// Every power-up the game can drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerUpKind {
    ExtraLife,
    PaddleGrow,
    PaddleShrink,
    MultiBall,
    SpeedDown,
    SpeedUp,
    Sticky,
    Laser,
    Shield,
    Fireball,
    ScoreMultiplier,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 11] = [
        PowerUpKind::ExtraLife,
        PowerUpKind::PaddleGrow,
        PowerUpKind::PaddleShrink,
        PowerUpKind::MultiBall,
        PowerUpKind::SpeedDown,
        PowerUpKind::SpeedUp,
        PowerUpKind::Sticky,
        PowerUpKind::Laser,
        PowerUpKind::Shield,
        PowerUpKind::Fireball,
        PowerUpKind::ScoreMultiplier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::ExtraLife => "extra-life",
            PowerUpKind::PaddleGrow => "paddle-grow",
            PowerUpKind::PaddleShrink => "paddle-shrink",
            PowerUpKind::MultiBall => "multi-ball",
            PowerUpKind::SpeedDown => "speed-down",
            PowerUpKind::SpeedUp => "speed-up",
            PowerUpKind::Sticky => "sticky",
            PowerUpKind::Laser => "laser",
            PowerUpKind::Shield => "shield",
            PowerUpKind::Fireball => "fireball",
            PowerUpKind::ScoreMultiplier => "score-multiplier",
        }
    }

    /// Whether the effect belongs to the collecting paddle rather than the field
    pub fn is_paddle_local(&self) -> bool {
        matches!(
            self,
            PowerUpKind::PaddleGrow | PowerUpKind::PaddleShrink | PowerUpKind::Sticky | PowerUpKind::Laser
        )
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown power-up kind `{0}`")]
pub struct ParseKindError(pub String);

impl FromStr for PowerUpKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('_', "-");
        PowerUpKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// UI hook for mirroring active power-ups outside the core
pub trait PowerUpObserver {
    fn on_applied(&mut self, _kind: PowerUpKind) {}
    fn on_removed(&mut self, _kind: PowerUpKind) {}
}

/// Identity of a temporary effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectKey {
    /// `None` for field-wide effects
    pub paddle: Option<BodyId>,
    pub kind: PowerUpKind,
}

impl EffectKey {
    pub fn new(kind: PowerUpKind, paddle: BodyId) -> Self {
        Self {
            paddle: kind.is_paddle_local().then_some(paddle),
            kind,
        }
    }
}

/// A temporary effect waiting for its removal timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveEffect {
    pub key: EffectKey,
    /// Paddle that last collected it
    pub collected_by: BodyId,
    pub timer: TimerHandle,
    pub deadline_ms: u64,
}

/// What `apply` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Permanent effect applied
    Permanent,
    /// Temporary effect applied and removal scheduled
    Started,
    /// Already active; only the removal deadline moved
    Refreshed,
}

/// Applies and removes power-up effects
pub struct PowerUpResolver {
    tuning: Tuning,
    timers: TimerQueue<EffectKey>,
    active: BTreeMap<EffectKey, ActiveEffect>,
    events: EventChannel,
    observers: Vec<Box<dyn PowerUpObserver>>,
}

impl PowerUpResolver {
    pub fn new(tuning: Tuning, events: EventChannel) -> Self {
        Self {
            tuning,
            timers: TimerQueue::new(),
            active: BTreeMap::new(),
            events,
            observers: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn register_observer(&mut self, observer: Box<dyn PowerUpObserver>) {
        self.observers.push(observer);
    }

    pub fn is_active(&self, paddle: BodyId, kind: PowerUpKind) -> bool {
        self.active.contains_key(&EffectKey::new(kind, paddle))
    }

    pub fn active_effects(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.active.values()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Milliseconds left on a temporary effect
    pub fn remaining_ms(&self, paddle: BodyId, kind: PowerUpKind) -> Option<u64> {
        self.active
            .get(&EffectKey::new(kind, paddle))
            .map(|effect| effect.deadline_ms.saturating_sub(self.timers.now_ms()))
    }

    /// Apply a collected power-up on behalf of `paddle`
    pub fn apply<F>(&mut self, power_up: &mut PowerUp, paddle: BodyId, game: &mut F) -> ApplyOutcome
    where
        F: GameplayFacade + ?Sized,
    {
        let kind = power_up.kind;
        power_up.state = PowerUpState::Applied;

        let outcome = if !power_up.is_temporary() {
            self.apply_effect(kind, paddle, game);
            ApplyOutcome::Permanent
        } else {
            let key = EffectKey::new(kind, paddle);
            let outcome = if self.active.contains_key(&key) {
                ApplyOutcome::Refreshed
            } else {
                self.apply_effect(kind, paddle, game);
                ApplyOutcome::Started
            };

            // Scheduling a pending key cancels its old timer first
            let timer = self.timers.schedule(key, power_up.duration_ms);
            let deadline_ms = self.timers.now_ms() + u64::from(power_up.duration_ms);
            self.active.insert(
                key,
                ActiveEffect {
                    key,
                    collected_by: paddle,
                    timer,
                    deadline_ms,
                },
            );
            outcome
        };

        log::info!("Power-up {kind} on paddle {paddle:?}: {outcome:?}");
        if outcome != ApplyOutcome::Refreshed {
            for observer in &mut self.observers {
                observer.on_applied(kind);
            }
        }
        self.events.emit(GameplayEvent::PowerUpCollected { kind });
        outcome
    }

    /// Undo a temporary effect now; false if it wasn't active
    pub fn remove<F>(&mut self, kind: PowerUpKind, paddle: BodyId, game: &mut F) -> bool
    where
        F: GameplayFacade + ?Sized,
    {
        let Some(effect) = self.active.remove(&EffectKey::new(kind, paddle)) else {
            return false;
        };
        self.timers.cancel(effect.timer);
        self.finish(effect, game);
        true
    }

    /// Advance the effect clock and undo everything that expired
    pub fn advance<F>(&mut self, dt_ms: u32, game: &mut F) -> Vec<EffectKey>
    where
        F: GameplayFacade + ?Sized,
    {
        let expired = self.timers.advance(dt_ms);
        for key in &expired {
            if let Some(effect) = self.active.remove(key) {
                log::info!("Power-up {} expired (collected by {:?})", key.kind, effect.collected_by);
                self.finish(effect, game);
            }
        }
        expired
    }

    /// Undo every active effect and drop all timers
    pub fn reset<F>(&mut self, game: &mut F)
    where
        F: GameplayFacade + ?Sized,
    {
        let effects = std::mem::take(&mut self.active);
        self.timers.cancel_all();
        for effect in effects.into_values() {
            self.finish(effect, game);
        }
    }

    fn finish<F>(&mut self, effect: ActiveEffect, game: &mut F)
    where
        F: GameplayFacade + ?Sized,
    {
        let kind = effect.key.kind;
        self.remove_effect(kind, effect.collected_by, game);
        for observer in &mut self.observers {
            observer.on_removed(kind);
        }
    }

    fn apply_effect<F>(&self, kind: PowerUpKind, paddle: BodyId, game: &mut F)
    where
        F: GameplayFacade + ?Sized,
    {
        let t = &self.tuning;
        match kind {
            PowerUpKind::ExtraLife => game.add_life(),
            PowerUpKind::MultiBall => {
                game.spawn_extra_balls(t.extra_balls, t.multi_ball_spread);
            }
            PowerUpKind::PaddleGrow => {
                with_paddle(game, paddle, kind, |p| p.scale = Vec2::new(t.grow_scale, 1.0))
            }
            PowerUpKind::PaddleShrink => {
                with_paddle(game, paddle, kind, |p| p.scale = Vec2::new(t.shrink_scale, 1.0))
            }
            PowerUpKind::SpeedDown => scale_balls(game, 1.0 / t.speed_factor),
            PowerUpKind::SpeedUp => scale_balls(game, t.speed_factor),
            PowerUpKind::Sticky => with_paddle(game, paddle, kind, |p| p.sticky = true),
            PowerUpKind::Laser => with_paddle(game, paddle, kind, |p| p.laser_enabled = true),
            PowerUpKind::Shield => {
                if !game.add_shield() {
                    log::debug!("Shield already up");
                }
            }
            PowerUpKind::Fireball => set_fireball(game, true),
            PowerUpKind::ScoreMultiplier => game.set_score_multiplier(t.score_multiplier, true),
        }
    }

    fn remove_effect<F>(&self, kind: PowerUpKind, paddle: BodyId, game: &mut F)
    where
        F: GameplayFacade + ?Sized,
    {
        let t = &self.tuning;
        match kind {
            // Permanent kinds never get a removal timer
            PowerUpKind::ExtraLife | PowerUpKind::MultiBall => {}
            PowerUpKind::PaddleGrow | PowerUpKind::PaddleShrink => {
                with_paddle(game, paddle, kind, |p| p.scale = Vec2::ONE)
            }
            PowerUpKind::SpeedDown => scale_balls(game, t.speed_factor),
            PowerUpKind::SpeedUp => scale_balls(game, 1.0 / t.speed_factor),
            PowerUpKind::Sticky => {
                with_paddle(game, paddle, kind, |p| p.sticky = false);
                for ball in game.balls_mut() {
                    if ball.stuck.is_some_and(|s| s.paddle == paddle) {
                        ball.release();
                    }
                }
            }
            PowerUpKind::Laser => with_paddle(game, paddle, kind, |p| p.laser_enabled = false),
            PowerUpKind::Shield => {
                game.remove_shield();
            }
            PowerUpKind::Fireball => set_fireball(game, false),
            PowerUpKind::ScoreMultiplier => game.set_score_multiplier(1, false),
        }
    }
}

fn with_paddle<F, M>(game: &mut F, paddle: BodyId, kind: PowerUpKind, mutate: M)
where
    F: GameplayFacade + ?Sized,
    M: FnOnce(&mut super::state::Paddle),
{
    match game.paddle_mut(paddle) {
        Some(p) => mutate(p),
        None => log::warn!("Power-up {kind}: paddle {paddle:?} is gone"),
    }
}

fn scale_balls<F: GameplayFacade + ?Sized>(game: &mut F, factor: f32) {
    for ball in game.balls_mut() {
        ball.scale_speed(factor);
    }
}

fn set_fireball<F: GameplayFacade + ?Sized>(game: &mut F, on: bool) {
    for ball in game.balls_mut() {
        ball.fireball = on;
    }
}
