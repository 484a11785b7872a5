//! Collision taxonomy: category bits, per-type masks, and body filters
//!
//! Every body the physics engine reports carries a `CollisionGroup`. The
//! engine only raises a contact between two bodies when each side's mask
//! contains the other's category, so both sides must opt in.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::body::Body;

bitflags! {
    /// One bit per collidable kind of body
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CollisionCategory: u32 {
        const BALL = 1 << 0;
        const PADDLE = 1 << 1;
        const BRICK = 1 << 2;
        const WALL = 1 << 3;
        const POWER_UP = 1 << 4;
        const LASER = 1 << 5;
        const SHIELD = 1 << 6;
    }
}

/// Named body types, one per category bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionObjectType {
    Ball,
    Paddle,
    Brick,
    Wall,
    PowerUp,
    Laser,
    Shield,
}

impl CollisionObjectType {
    pub const ALL: [CollisionObjectType; 7] = [
        CollisionObjectType::Ball,
        CollisionObjectType::Paddle,
        CollisionObjectType::Brick,
        CollisionObjectType::Wall,
        CollisionObjectType::PowerUp,
        CollisionObjectType::Laser,
        CollisionObjectType::Shield,
    ];

    /// The single category bit for this type
    pub fn category(self) -> CollisionCategory {
        match self {
            CollisionObjectType::Ball => CollisionCategory::BALL,
            CollisionObjectType::Paddle => CollisionCategory::PADDLE,
            CollisionObjectType::Brick => CollisionCategory::BRICK,
            CollisionObjectType::Wall => CollisionCategory::WALL,
            CollisionObjectType::PowerUp => CollisionCategory::POWER_UP,
            CollisionObjectType::Laser => CollisionCategory::LASER,
            CollisionObjectType::Shield => CollisionCategory::SHIELD,
        }
    }

    /// Reverse lookup from a single category bit
    pub fn from_category(category: CollisionCategory) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.category() == category)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionObjectType::Ball => "ball",
            CollisionObjectType::Paddle => "paddle",
            CollisionObjectType::Brick => "brick",
            CollisionObjectType::Wall => "wall",
            CollisionObjectType::PowerUp => "powerUp",
            CollisionObjectType::Laser => "laser",
            CollisionObjectType::Shield => "shield",
        }
    }
}

impl fmt::Display for CollisionObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collision type `{0}`")]
pub struct UnknownCollisionType(pub String);

impl FromStr for CollisionObjectType {
    type Err = UnknownCollisionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ball" => Ok(CollisionObjectType::Ball),
            "paddle" => Ok(CollisionObjectType::Paddle),
            "brick" => Ok(CollisionObjectType::Brick),
            "wall" => Ok(CollisionObjectType::Wall),
            "powerup" | "power-up" | "power_up" => Ok(CollisionObjectType::PowerUp),
            "laser" => Ok(CollisionObjectType::Laser),
            "shield" => Ok(CollisionObjectType::Shield),
            _ => Err(UnknownCollisionType(s.to_string())),
        }
    }
}

/// Category/mask pair attached to a physics body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroup {
    pub category: CollisionCategory,
    pub mask: CollisionCategory,
}

impl CollisionGroup {
    pub fn new(category: CollisionCategory, mask: CollisionCategory) -> Self {
        Self { category, mask }
    }

    /// Both sides must list each other for the contact to matter
    #[inline]
    pub fn interacts_with(&self, other: &CollisionGroup) -> bool {
        self.category.intersects(other.mask) && other.category.intersects(self.mask)
    }
}

/// Fold a list of types into one OR'd mask
pub fn combined_mask<I>(types: I) -> CollisionCategory
where
    I: IntoIterator<Item = CollisionObjectType>,
{
    types
        .into_iter()
        .fold(CollisionCategory::empty(), |mask, t| mask | t.category())
}

/// Same as [`combined_mask`] but from type names, e.g. `["ball", "brick"]`
pub fn combined_mask_from_names(names: &[&str]) -> Result<CollisionCategory, UnknownCollisionType> {
    let types = names
        .iter()
        .map(|name| name.parse::<CollisionObjectType>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(combined_mask(types))
}

/// Full category → group table for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroups {
    groups: [CollisionGroup; 7],
}

impl CollisionGroups {
    // Variants are declared in `ALL` order
    fn index(t: CollisionObjectType) -> usize {
        t as usize
    }

    pub fn get(&self, t: CollisionObjectType) -> CollisionGroup {
        self.groups[Self::index(t)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CollisionObjectType, CollisionGroup)> + '_ {
        CollisionObjectType::ALL.into_iter().zip(self.groups.iter().copied())
    }

    /// Enable or disable a pair on both sides at once, keeping the table symmetric
    pub fn set_pair_enabled(&mut self, a: CollisionObjectType, b: CollisionObjectType, enabled: bool) {
        let (ia, ib) = (Self::index(a), Self::index(b));
        self.groups[ia].mask.set(b.category(), enabled);
        self.groups[ib].mask.set(a.category(), enabled);
    }

    /// Whether the two types are allowed to generate contacts
    pub fn pair_enabled(&self, a: CollisionObjectType, b: CollisionObjectType) -> bool {
        self.get(a).interacts_with(&self.get(b))
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        build_collision_groups()
    }
}

/// The static category/mask table
pub fn build_collision_groups() -> CollisionGroups {
    use CollisionCategory as C;

    CollisionGroups {
        groups: [
            CollisionGroup::new(C::BALL, C::PADDLE | C::BRICK | C::WALL | C::SHIELD),
            CollisionGroup::new(C::PADDLE, C::BALL | C::POWER_UP),
            CollisionGroup::new(C::BRICK, C::BALL | C::LASER),
            CollisionGroup::new(C::WALL, C::BALL),
            CollisionGroup::new(C::POWER_UP, C::PADDLE),
            CollisionGroup::new(C::LASER, C::BRICK),
            CollisionGroup::new(C::SHIELD, C::BALL),
        ],
    }
}

/// Set the filter on a body and every sub-part of a composite body
pub fn apply_collision_category(body: &mut Body, category: CollisionCategory, mask: CollisionCategory) {
    let group = CollisionGroup::new(category, mask);
    body.filter = group;
    for part in &mut body.parts {
        part.filter = group;
    }
}
