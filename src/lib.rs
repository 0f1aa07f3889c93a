//! Meteor Division - a division-practice meteor shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (problems, entities, collisions, game state)
//! - `settings`: Engine configuration and startup validation
//!
//! Windowing, audio, input polling and drawing live outside this crate. The
//! host feeds [`sim::TickInput`] into [`sim::tick`] once per frame and draws
//! the [`sim::Snapshot`] it reads back.

pub mod settings;
pub mod sim;

pub use settings::{ConfigError, MenuMode, ProjectilePolicy, ScorePolicy, Settings};

/// Game configuration constants
pub mod consts {
    /// Reference frame rate that per-frame tuning is expressed against
    pub const FPS: f32 = 60.0;
    /// Fixed simulation timestep for frame-locked hosts
    pub const SIM_DT: f32 = 1.0 / FPS;
    /// Largest elapsed time accepted for a single tick (seconds)
    pub const MAX_DT: f32 = 0.1;

    /// Ship footprint
    pub const SHIP_WIDTH: f32 = 70.0;
    pub const SHIP_HEIGHT: f32 = 16.0;
    /// Ship centre sits this far above the bottom edge
    pub const SHIP_BOTTOM_OFFSET: f32 = 50.0;
    /// Ticks between shots
    pub const FIRE_COOLDOWN_TICKS: u32 = 10;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 4.0;
    /// Upward speed (pixels/s)
    pub const PROJECTILE_SPEED: f32 = 600.0;
    /// Projectiles above this y are gone
    pub const PROJECTILE_TOP_BOUND: f32 = -10.0;

    /// Meteor (answer option) defaults
    pub const OPTION_RADIUS: f32 = 28.0;
    pub const OPTION_SPAWN_Y: f32 = -40.0;
    /// Seconds a popped meteor takes to fade out (255 alpha at 15/frame)
    pub const POP_FADE_SECS: f32 = 17.0 / FPS;

    /// Particle gravity (pixels/s²)
    pub const PARTICLE_GRAVITY: f32 = 360.0;
    pub const CORRECT_BURST: usize = 24;
    pub const WRONG_BURST: usize = 12;
    pub const CELEBRATION_BURST: usize = 240;

    /// Background starfield
    pub const STAR_COUNT: usize = 150;

    /// Points per correct answer
    pub const POINTS_PER_CORRECT: u64 = 10;
    /// Ticks the "nice shot" banner stays up
    pub const NICE_SHOT_TICKS: u32 = 30;

    /// Menu tier buttons
    pub const MENU_BUTTON_WIDTH: f32 = 240.0;
    pub const MENU_BUTTON_HEIGHT: f32 = 56.0;
    pub const MENU_BUTTON_SPACING: f32 = 80.0;
}

/// Clamp a horizontal coordinate so a body of `half_width` stays inside `[0, width]`
#[inline]
pub fn clamp_to_bounds(x: f32, half_width: f32, width: f32) -> f32 {
    x.clamp(half_width, (width - half_width).max(half_width))
}
