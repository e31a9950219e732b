//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One `tick` per frame, no wall-clock time
//! - Seeded RNG only
//! - Stable scan order (height-sorted, ties by index)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod body;
pub mod collision;
pub mod generate;
pub mod geometry;
pub mod level;
pub mod session;
pub mod stress;

pub use autopilot::Autopilot;
pub use body::{
    BodyParams, FallState, Handling, HandlingRange, JumpEnvelope, MoveState, PlayerBody,
    SteerState,
};
pub use collision::{CollisionResolver, Resolution, sweep_touches};
pub use generate::LevelGenerator;
pub use geometry::{CONTACT_EPSILON, Diamond, Span};
pub use level::{GenerationStats, Hazard, Hop, Level, Platform, PlatformKind, Token};
pub use session::{LevelOutcome, LevelSession, Phase, RngState, TickInput};
pub use stress::{StressModel, Visuals};
