//! Physics body snapshots exchanged with the host engine
//!
//! The engine owns the real bodies. Each collision-start event hands us a
//! copy of both bodies: filter, position, size, velocity and whatever custom
//! data the game attached when the body was created.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionCategory, CollisionGroup, CollisionObjectType};

/// Engine body id; entity ids in `GameState` share this space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Per-body custom data set by the game on paddles
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyData {
    pub is_vertical: bool,
    pub is_concave: bool,
    pub sticky: bool,
}

/// One sub-part of a composite body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPart {
    /// Offset from the parent body's position
    pub offset: Vec2,
    pub size: Vec2,
    pub filter: CollisionGroup,
}

impl BodyPart {
    pub fn new(offset: Vec2, size: Vec2) -> Self {
        Self {
            offset,
            size,
            filter: CollisionGroup::new(CollisionCategory::empty(), CollisionCategory::empty()),
        }
    }
}

/// Snapshot of an engine body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    /// Centre position
    pub position: Vec2,
    /// Display size (width, height)
    pub size: Vec2,
    pub velocity: Vec2,
    pub filter: CollisionGroup,
    /// Sub-parts of a composite body (empty for simple bodies)
    #[serde(default)]
    pub parts: Vec<BodyPart>,
    #[serde(default)]
    pub data: Option<BodyData>,
}

impl Body {
    pub fn new(id: BodyId, position: Vec2, size: Vec2) -> Self {
        Self {
            id,
            position,
            size,
            velocity: Vec2::ZERO,
            filter: CollisionGroup::new(CollisionCategory::empty(), CollisionCategory::empty()),
            parts: Vec::new(),
            data: None,
        }
    }

    pub fn with_filter(mut self, filter: CollisionGroup) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_data(mut self, data: BodyData) -> Self {
        self.data = Some(data);
        self
    }

    /// Which kind of body this is, by its category bit
    pub fn object_type(&self) -> Option<CollisionObjectType> {
        CollisionObjectType::from_category(self.filter.category)
    }
}

/// A discrete collision-start event from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionStart {
    pub a: Body,
    pub b: Body,
    /// Contact point in world space
    pub contact: Vec2,
}

impl CollisionStart {
    /// Whether both filters opted into this contact
    pub fn is_relevant(&self) -> bool {
        self.a.filter.interacts_with(&self.b.filter)
    }

    /// Return the two bodies ordered so the one of type `first` comes first
    pub fn ordered(&self, first: CollisionObjectType) -> (&Body, &Body) {
        if self.a.object_type() == Some(first) {
            (&self.a, &self.b)
        } else {
            (&self.b, &self.a)
        }
    }
}
