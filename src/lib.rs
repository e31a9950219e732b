//! Don't Drown - simulation core for a rising-wave platformer
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (body kinematics, collisions, level generation, stress)
//! - `tuning`: Data-driven balance (difficulties, debuffs, physics constants)
//! - `settings`: JSON-loadable configuration bundle
//! - `scores`: Best results per level preset
//! - `error`: Construction-time failures

pub mod error;
pub mod scores;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use scores::Scoreboard;
pub use settings::{Settings, Viewport};
pub use tuning::{Debuff, Difficulty, DifficultyParams};

/// Simulation configuration constants
pub mod consts {
    /// Assumed host frame rate; one `tick` is one frame
    pub const FRAME_RATE: f32 = 60.0;

    /// Default viewport dimensions (pixels)
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 720.0;

    /// Player diameter as a fraction of viewport width
    pub const PC_DIAMETER_DIV: f32 = 40.0;
    /// Velocity unit as a fraction of viewport width
    pub const PC_INCR_DIV: f32 = 100.0;

    /// Platform dimensions as fractions of the viewport
    pub const PF_WIDTH_DIV: f32 = 10.0;
    pub const PF_HEIGHT_DIV: f32 = 40.0;
    /// Left notebook margin as a fraction of viewport width
    pub const MARGIN_DIV: f32 = 10.0;
    /// Lowest platform height as a fraction of viewport height
    pub const LOWEST_PLATFORM_FRAC: f32 = 0.9;
    /// The highest platform sits this fraction of viewport height below the level top
    pub const CEILING_DIV: f32 = 8.0;

    /// Token height as a fraction of viewport width
    pub const T_HEIGHT_DIV: f32 = 40.0;
    /// Frames per half bob cycle
    pub const T_BOUNCE_FRAMES: u64 = 30;

    /// Hazard starts this fraction of viewport width below the viewport
    pub const WAVE_INIT_HEIGHT_MOD_DIV: f32 = 20.0;

    /// Body is kept below this fraction of the viewport height by panning
    pub const PAN_LINE_DIV: f32 = 3.0;
    /// Fraction of the pan excess applied per frame
    pub const PAN_EASE: f32 = 0.15;
}

/// Linear interpolation between `a` and `b`; `t` is not clamped
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
