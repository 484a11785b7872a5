//! Gameplay core
//!
//! Pure frame-driven logic with no rendering or platform dependencies:
//! - Collision filtering and paddle deflection
//! - Power-up effects with cancellable timers
//! - Gameplay events for presentation layers
//! - Seeded RNG only, so a seed replays the same drops

pub mod body;
pub mod collision;
pub mod deflect;
pub mod events;
pub mod powerup;
pub mod session;
pub mod shape;
pub mod state;
pub mod timer;

pub use body::{Body, BodyData, BodyId, BodyPart, CollisionStart};
pub use collision::{
    CollisionCategory, CollisionGroup, CollisionGroups, CollisionObjectType, UnknownCollisionType,
    apply_collision_category, build_collision_groups, combined_mask, combined_mask_from_names,
};
pub use deflect::{DeflectError, PaddleGeometry, PaddleOrientation, deflect, deflect_off_body, try_deflect};
pub use events::{EventChannel, EventKind, GameplayEvent, SubscriptionId};
pub use powerup::{ApplyOutcome, ParseKindError, PowerUpKind, PowerUpObserver, PowerUpResolver};
pub use session::{BrickHit, CollisionOutcome, Session};
pub use shape::{apply_paddle_shape_visual, remove_paddle_shape_visual};
pub use state::{Ball, Brick, GameState, GameplayFacade, Paddle, PowerUp, PowerUpState};
pub use timer::{TimerHandle, TimerQueue};
