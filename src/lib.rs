//! Bomb Sort - a timed sorting arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, motion, fuses, drag resolution)
//! - `skin`: Bomb skin capability (asset lookup with warning-cue fallback)
//! - `settings`: Skin preference store (LocalStorage on web)

pub mod settings;
pub mod sim;
pub mod skin;

pub use settings::Settings;
pub use skin::{SkinName, SkinProvider};

/// Game configuration constants
pub mod consts {
    /// Movement tick cadence in ms (~60 steps per second)
    pub const TICK_MS: f64 = 16.0;

    /// Initial spawn interval (ms)
    pub const SPAWN_START_MS: f64 = 1400.0;
    /// Spawn interval floor (ms)
    pub const SPAWN_MIN_MS: f64 = 520.0;
    /// Interval reduction per difficulty step (ms)
    pub const SPAWN_STEP_MS: f64 = 70.0;
    /// Difficulty step cadence (ms)
    pub const RAMP_EVERY_MS: f64 = 5000.0;

    /// Bomb sprite size in px - must match the .bomb CSS rule
    pub const BOMB_SIZE: f32 = 74.0;
    /// Side margins excluded from the spawn zone (goal territory)
    pub const SPAWN_MARGIN: f32 = 210.0;
    /// Distance of fresh spawns from the top/bottom edge
    pub const SPAWN_EDGE_OFFSET: f32 = 70.0;

    /// Fuse duration draw range (ms)
    pub const FUSE_MIN_MS: f64 = 1800.0;
    pub const FUSE_MAX_MS: f64 = 4500.0;
    /// Fuse scaling never drops below this factor of the draw
    pub const FUSE_FLOOR: f64 = 0.65;
    /// Share of the difficulty ramp applied to fuse shortening
    pub const FUSE_RAMP_WEIGHT: f64 = 0.35;
    /// Remaining-fraction threshold where the warning cue starts
    pub const WARN_FRACTION: f64 = 1.0 / 3.0;

    /// Initial speed draw range (px per tick)
    pub const BASE_SPEED_MIN: f32 = 0.8;
    pub const BASE_SPEED_MAX: f32 = 2.6;
    /// Speed ceiling before the difficulty boost (px per tick)
    pub const MAX_SPEED: f32 = 4.2;
    /// Share of the difficulty ramp applied as a speed boost
    pub const SPEED_RAMP_WEIGHT: f32 = 0.55;

    /// Wander cadence (ms) and its per-bomb jitter (±)
    pub const WANDER_EVERY_MS: f64 = 700.0;
    pub const WANDER_JITTER_MS: f64 = 200.0;
    /// Per-axis velocity kick bound (px per tick)
    pub const WANDER_KICK: f32 = 0.35;

    /// Points for a correct drop
    pub const DROP_SCORE: u32 = 10;
    /// How long a resolved bomb's element lingers on stage (ms)
    pub const RESOLVE_LINGER_MS: f64 = 450.0;

    /// Default field size used until the host measures the stage (px)
    pub const FIELD_WIDTH: f32 = 960.0;
    pub const FIELD_HEIGHT: f32 = 620.0;
    /// Default goal strip geometry (px)
    pub const GOAL_WIDTH: f32 = 180.0;
    pub const GOAL_INSET: f32 = 14.0;
}
