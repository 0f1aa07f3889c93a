//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (separate streams for questions, layout and effects)
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod particles;
pub mod problem;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod tier;

pub use collision::{Hit, circles_overlap, resolve_collisions};
pub use particles::{Burst, Particle, ParticleColor};
pub use problem::{AnswerSet, Problem, ProblemGenerator, Question};
pub use snapshot::{OptionView, Renderable, Snapshot};
pub use state::{
    FallingOption, GameEvent, GamePhase, GameState, MenuButton, OptionState, Player, Projectile,
    Session, Star,
};
pub use tick::{InputEvent, PointerButton, TickInput, autopilot, handle_event, tick};
pub use tier::{Tier, TierError};
