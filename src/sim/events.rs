//! Gameplay events and the channel that carries them
//!
//! Producers emit after they finish mutating state; each subscriber gets its
//! own queue and drains it when it runs. Everything lives on the frame-loop
//! thread, so the handle is a plain `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;

/// Something that happened in play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameplayEvent {
    BrickDestroyed { special: bool },
    PowerUpCollected { kind: PowerUpKind },
    LifeLost,
    LevelComplete,
    GameOver,
    SettingsChanged { camera_effects_enabled: bool },
}

/// Event discriminant, used for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    BrickDestroyed,
    PowerUpCollected,
    LifeLost,
    LevelComplete,
    GameOver,
    SettingsChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::BrickDestroyed,
        EventKind::PowerUpCollected,
        EventKind::LifeLost,
        EventKind::LevelComplete,
        EventKind::GameOver,
        EventKind::SettingsChanged,
    ];
}

impl GameplayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameplayEvent::BrickDestroyed { .. } => EventKind::BrickDestroyed,
            GameplayEvent::PowerUpCollected { .. } => EventKind::PowerUpCollected,
            GameplayEvent::LifeLost => EventKind::LifeLost,
            GameplayEvent::LevelComplete => EventKind::LevelComplete,
            GameplayEvent::GameOver => EventKind::GameOver,
            GameplayEvent::SettingsChanged { .. } => EventKind::SettingsChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

#[derive(Debug, Default)]
struct Subscriber {
    kinds: Vec<EventKind>,
    queue: VecDeque<GameplayEvent>,
}

#[derive(Debug, Default)]
struct ChannelInner {
    next_id: u32,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
}

/// Shared handle to the event channel; clones point at the same channel
#[derive(Debug, Clone, Default)]
pub struct EventChannel {
    inner: Rc<RefCell<ChannelInner>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start receiving the given kinds
    pub fn subscribe(&self, kinds: &[EventKind]) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.subscribers.insert(
            id,
            Subscriber {
                kinds: kinds.to_vec(),
                queue: VecDeque::new(),
            },
        );
        id
    }

    /// Stop receiving; undelivered events are dropped. False if already unsubscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().subscribers.remove(&id).is_some()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.borrow().subscribers.contains_key(&id)
    }

    /// Broadcast to every subscriber interested in this kind
    pub fn emit(&self, event: GameplayEvent) {
        let kind = event.kind();
        let mut inner = self.inner.borrow_mut();
        let mut delivered = 0;
        for sub in inner.subscribers.values_mut() {
            if sub.kinds.contains(&kind) {
                sub.queue.push_back(event);
                delivered += 1;
            }
        }
        log::debug!("Event {event:?} delivered to {delivered} subscriber(s)");
    }

    /// Take everything queued for one subscriber, oldest first
    pub fn drain(&self, id: SubscriptionId) -> Vec<GameplayEvent> {
        self.inner
            .borrow_mut()
            .subscribers
            .get_mut(&id)
            .map(|sub| sub.queue.drain(..).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_only_see_their_kinds() {
        let channel = EventChannel::new();
        let lives = channel.subscribe(&[EventKind::LifeLost, EventKind::GameOver]);
        let all = channel.subscribe(&EventKind::ALL);

        channel.emit(GameplayEvent::BrickDestroyed { special: false });
        channel.emit(GameplayEvent::LifeLost);

        assert_eq!(channel.drain(lives), vec![GameplayEvent::LifeLost]);
        assert_eq!(
            channel.drain(all),
            vec![
                GameplayEvent::BrickDestroyed { special: false },
                GameplayEvent::LifeLost
            ]
        );
        assert!(channel.drain(all).is_empty());
    }

    #[test]
    fn test_clones_share_one_channel() {
        let channel = EventChannel::new();
        let producer = channel.clone();
        let id = channel.subscribe(&[EventKind::LevelComplete]);

        producer.emit(GameplayEvent::LevelComplete);
        assert_eq!(channel.drain(id).len(), 1);
    }

    #[test]
    fn test_unsubscribe_twice_is_noop() {
        let channel = EventChannel::new();
        let id = channel.subscribe(&EventKind::ALL);
        channel.emit(GameplayEvent::GameOver);

        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        assert!(!channel.is_subscribed(id));
        assert!(channel.drain(id).is_empty());
    }

    #[test]
    fn test_event_kind_matches_variant() {
        let event = GameplayEvent::SettingsChanged {
            camera_effects_enabled: false,
        };
        assert_eq!(event.kind(), EventKind::SettingsChanged);
    }
}
