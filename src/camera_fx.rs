//! Camera feedback for gameplay events
//!
//! The dispatcher listens on the event channel and turns each event into a
//! few camera calls from a fixed table. The camera itself lives outside the
//! core behind [`CameraEffects`]; a failing camera never disturbs play.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;
use crate::sim::events::{EventChannel, EventKind, GameplayEvent, SubscriptionId};
use crate::sim::timer::TimerQueue;
use crate::sim::PowerUpKind;

pub type Rgb = [u8; 3];

pub const WHITE: Rgb = [255, 255, 255];
pub const LIFE_LOST_RED: Rgb = [255, 48, 48];
pub const GAME_OVER_RED: Rgb = [140, 0, 0];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("no camera attached")]
    Detached,
    #[error("camera rejected {effect}: {reason}")]
    Rejected { effect: &'static str, reason: String },
}

/// Presentation-side camera
pub trait CameraEffects {
    fn shake(&mut self, intensity: f32, duration_ms: u32) -> Result<(), CameraError>;
    fn flash(&mut self, color: Rgb, duration_ms: u32) -> Result<(), CameraError>;
    fn zoom_to(&mut self, factor: f32, duration_ms: u32) -> Result<(), CameraError>;
    fn pan_to(&mut self, target: Vec2, duration_ms: u32) -> Result<(), CameraError>;
}

/// Camera that only writes what it would do to the log
#[derive(Debug, Default)]
pub struct LogCamera;

impl CameraEffects for LogCamera {
    fn shake(&mut self, intensity: f32, duration_ms: u32) -> Result<(), CameraError> {
        log::info!("camera: shake {intensity} for {duration_ms}ms");
        Ok(())
    }

    fn flash(&mut self, color: Rgb, duration_ms: u32) -> Result<(), CameraError> {
        log::info!("camera: flash {color:?} for {duration_ms}ms");
        Ok(())
    }

    fn zoom_to(&mut self, factor: f32, duration_ms: u32) -> Result<(), CameraError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CameraError::Rejected {
                effect: "zoom",
                reason: format!("factor {factor}"),
            });
        }
        log::info!("camera: zoom to {factor} over {duration_ms}ms");
        Ok(())
    }

    fn pan_to(&mut self, target: Vec2, duration_ms: u32) -> Result<(), CameraError> {
        log::info!("camera: pan to {target} over {duration_ms}ms");
        Ok(())
    }
}

/// Flash colour for a collected power-up
pub fn palette_color(kind: PowerUpKind) -> Rgb {
    match kind {
        PowerUpKind::ExtraLife => [255, 105, 180],
        PowerUpKind::PaddleGrow => [80, 220, 100],
        PowerUpKind::PaddleShrink => [230, 90, 60],
        PowerUpKind::MultiBall => [90, 170, 255],
        PowerUpKind::SpeedDown => [120, 200, 255],
        PowerUpKind::SpeedUp => [255, 170, 40],
        PowerUpKind::Sticky => [200, 230, 60],
        PowerUpKind::Laser => [255, 40, 40],
        PowerUpKind::Shield => [60, 140, 255],
        PowerUpKind::Fireball => [255, 110, 0],
        PowerUpKind::ScoreMultiplier => [255, 215, 0],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShakeSpec {
    pub intensity: f32,
    pub duration_ms: u32,
}

impl ShakeSpec {
    pub const fn new(intensity: f32, duration_ms: u32) -> Self {
        Self {
            intensity,
            duration_ms,
        }
    }
}

/// Effect strengths, part of [`crate::tuning::Tuning`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub brick_shake: ShakeSpec,
    pub special_brick_shake: ShakeSpec,
    pub life_lost_shake: ShakeSpec,
    pub game_over_shake: ShakeSpec,
    pub power_up_flash_ms: u32,
    pub life_lost_flash_ms: u32,
    pub level_complete_flash_ms: u32,
    pub game_over_flash_ms: u32,
    pub level_complete_zoom: f32,
    /// Zoom in and back out each take this long
    pub zoom_ms: u32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            brick_shake: ShakeSpec::new(0.004, 80),
            special_brick_shake: ShakeSpec::new(0.01, 150),
            life_lost_shake: ShakeSpec::new(0.02, 300),
            game_over_shake: ShakeSpec::new(0.03, 500),
            power_up_flash_ms: 150,
            life_lost_flash_ms: 250,
            level_complete_flash_ms: 300,
            game_over_flash_ms: 500,
            level_complete_zoom: 1.1,
            zoom_ms: 400,
        }
    }
}

/// One camera call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Shake(ShakeSpec),
    Flash { color: Rgb, duration_ms: u32 },
    Zoom { factor: f32, duration_ms: u32 },
}

/// The fixed event → effect table
pub fn effects_for(event: &GameplayEvent, tuning: &CameraTuning) -> Vec<Effect> {
    match *event {
        GameplayEvent::BrickDestroyed { special: false } => vec![Effect::Shake(tuning.brick_shake)],
        GameplayEvent::BrickDestroyed { special: true } => {
            vec![Effect::Shake(tuning.special_brick_shake)]
        }
        GameplayEvent::PowerUpCollected { kind } => vec![Effect::Flash {
            color: palette_color(kind),
            duration_ms: tuning.power_up_flash_ms,
        }],
        GameplayEvent::LifeLost => vec![
            Effect::Shake(tuning.life_lost_shake),
            Effect::Flash {
                color: LIFE_LOST_RED,
                duration_ms: tuning.life_lost_flash_ms,
            },
        ],
        GameplayEvent::LevelComplete => vec![
            Effect::Flash {
                color: WHITE,
                duration_ms: tuning.level_complete_flash_ms,
            },
            Effect::Zoom {
                factor: tuning.level_complete_zoom,
                duration_ms: tuning.zoom_ms,
            },
        ],
        GameplayEvent::GameOver => vec![
            Effect::Shake(tuning.game_over_shake),
            Effect::Flash {
                color: GAME_OVER_RED,
                duration_ms: tuning.game_over_flash_ms,
            },
        ],
        GameplayEvent::SettingsChanged { .. } => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FxTimer {
    /// A shake is playing; further shakes are dropped
    ShakeWindow,
    /// Zoom back to 1.0
    ZoomReturn,
}

/// Subscribes to gameplay events and drives the camera
pub struct EffectDispatcher {
    camera: Box<dyn CameraEffects>,
    channel: EventChannel,
    subscription: Option<SubscriptionId>,
    tuning: CameraTuning,
    enabled: bool,
    allow_shake: bool,
    allow_flash: bool,
    timers: TimerQueue<FxTimer>,
}

impl EffectDispatcher {
    pub fn new(camera: Box<dyn CameraEffects>, channel: EventChannel, tuning: CameraTuning, settings: &Settings) -> Self {
        let subscription = Some(channel.subscribe(&EventKind::ALL));
        let mut dispatcher = Self {
            camera,
            channel,
            subscription,
            tuning,
            enabled: true,
            allow_shake: true,
            allow_flash: true,
            timers: TimerQueue::new(),
        };
        dispatcher.apply_settings(settings);
        dispatcher
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_shaking(&self) -> bool {
        self.timers.is_pending(&FxTimer::ShakeWindow)
    }

    /// Pick up every effect switch from the player's settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.enabled = settings.effective_camera_effects();
        self.allow_shake = settings.effective_screen_shake();
        self.allow_flash = settings.effective_flash();
        if !self.allow_shake {
            self.timers.cancel_key(&FxTimer::ShakeWindow);
        }
    }

    /// Advance effect timers, then handle everything queued since the last call
    pub fn tick(&mut self, dt_ms: u32) -> usize {
        for timer in self.timers.advance(dt_ms) {
            // A zoom already on screen always comes back
            if timer == FxTimer::ZoomReturn {
                let result = self.camera.zoom_to(1.0, self.tuning.zoom_ms);
                report("zoom", result);
            }
        }
        self.process()
    }

    /// Handle queued events; returns how many camera calls went out
    pub fn process(&mut self) -> usize {
        let Some(id) = self.subscription else {
            return 0;
        };

        let mut played = 0;
        for event in self.channel.drain(id) {
            if let GameplayEvent::SettingsChanged {
                camera_effects_enabled,
            } = event
            {
                log::debug!("Camera effects enabled: {camera_effects_enabled}");
                self.enabled = camera_effects_enabled;
                if !camera_effects_enabled {
                    if self.timers.is_pending(&FxTimer::ZoomReturn)
                        && report("zoom", self.camera.zoom_to(1.0, 0))
                    {
                        played += 1;
                    }
                    self.timers.cancel_all();
                }
                continue;
            }
            if !self.enabled {
                continue;
            }
            for effect in effects_for(&event, &self.tuning) {
                if self.play(effect) {
                    played += 1;
                }
            }
        }
        played
    }

    fn play(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::Shake(spec) => {
                if !self.allow_shake || self.is_shaking() {
                    return false;
                }
                let ok = report("shake", self.camera.shake(spec.intensity, spec.duration_ms));
                if ok {
                    self.timers.schedule(FxTimer::ShakeWindow, spec.duration_ms);
                }
                ok
            }
            Effect::Flash { color, duration_ms } => {
                self.allow_flash && report("flash", self.camera.flash(color, duration_ms))
            }
            Effect::Zoom {
                factor,
                duration_ms,
            } => {
                let ok = report("zoom", self.camera.zoom_to(factor, duration_ms));
                if ok {
                    self.timers.schedule(FxTimer::ZoomReturn, duration_ms);
                }
                ok
            }
        }
    }

    /// Stop listening and put the camera back at identity; false if already torn down
    pub fn teardown(&mut self) -> bool {
        let Some(id) = self.subscription.take() else {
            return false;
        };
        self.channel.unsubscribe(id);
        self.timers.cancel_all();
        report("zoom", self.camera.zoom_to(1.0, 0));
        report("pan", self.camera.pan_to(Vec2::ZERO, 0));
        log::debug!("Effect dispatcher torn down");
        true
    }
}

impl Drop for EffectDispatcher {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.channel.unsubscribe(id);
        }
    }
}

fn report(effect: &str, result: Result<(), CameraError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Camera {effect} failed: {err}");
            false
        }
    }
}
