//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and timer-free:
//! - Fixed movement step, virtual clock only
//! - Seeded RNG only
//! - No rendering or platform dependencies
//!
//! Whoever transitions a bomb out of the registry owns its resolution; every
//! scheduled callback re-checks run state first, so a stale fire is a
//! harmless no-op rather than a double resolution.

pub mod drag;
pub mod rect;
pub mod state;
pub mod tick;

pub use drag::{DropVerdict, begin_drag, drag_to, release};
pub use rect::Rect;
pub use state::{
    Bomb, BombKind, DragState, Field, GameEvent, GameOverReason, GameState, LossCause, Outcome,
    Scheduler, Wander,
};
pub use tick::{spawn_bomb, tick};
