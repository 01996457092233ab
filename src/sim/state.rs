//! Game state and core simulation types
//!
//! Everything the scheduled actions mutate lives here: the bomb registry,
//! the run-wide counters, the scheduler deadlines, and the event queue the
//! presentation layer drains. Resolving a bomb removes it from the registry
//! in the same step, so whichever callback loses the race finds nothing to
//! act on.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::consts::*;

/// Bomb color, which also names the matching goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BombKind {
    Red,
    Black,
}

impl BombKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BombKind::Red => "red",
            BombKind::Black => "black",
        }
    }

    /// The other color
    pub fn opposite(&self) -> Self {
        match self {
            BombKind::Red => BombKind::Black,
            BombKind::Black => BombKind::Red,
        }
    }
}

/// Terminal outcome of a bomb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Dropped on the matching goal
    Scored,
    /// Dropped on the other goal
    WrongGoal,
    /// Fuse ran out
    TimedOut,
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossCause {
    Timeout,
    WrongGoal,
}

/// Loss report surfaced to the presentation layer, tagged with the bomb
/// that caused it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverReason {
    pub kind: BombKind,
    pub cause: LossCause,
}

/// Drag hold state. While held, the motion integrator must not touch the
/// bomb; its position is written by the drag resolver instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Free,
    /// `grab` is the pointer-to-corner offset captured at drag start
    Held { grab: Vec2 },
}

/// Per-bomb wander cadence, randomized at spawn (not shared between bombs)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wander {
    pub last_at_ms: f64,
    pub every_ms: f64,
}

/// A bomb entity
#[derive(Debug, Clone, PartialEq)]
pub struct Bomb {
    pub id: u32,
    pub kind: BombKind,
    /// Top-left offset within the field
    pub pos: Vec2,
    /// px per movement tick
    pub vel: Vec2,
    /// Speed ceiling after wander kicks
    pub max_speed: f32,
    pub spawned_at_ms: f64,
    /// Fuse duration from spawn to detonation
    pub fuse_ms: f64,
    pub wander: Wander,
    pub drag: DragState,
    /// Warning cue already emitted (one-shot)
    pub warned: bool,
}

impl Bomb {
    /// Instant the fuse detonates
    pub fn fuse_deadline_ms(&self) -> f64 {
        self.spawned_at_ms + self.fuse_ms
    }

    /// Remaining fuse as a fraction of the full duration, clamped to [0, 1]
    pub fn fuse_remaining(&self, now_ms: f64) -> f64 {
        (1.0 - (now_ms - self.spawned_at_ms) / self.fuse_ms).clamp(0.0, 1.0)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Held { .. })
    }

    /// Bounding box at the current position
    pub fn rect(&self) -> Rect {
        Rect::square(self.pos, BOMB_SIZE)
    }

    /// Rescale velocity so its magnitude stays within `max_speed`,
    /// preserving direction
    pub fn clamp_speed(&mut self) {
        let speed = self.vel.length();
        if speed > self.max_speed {
            self.vel *= self.max_speed / speed;
        }
    }
}

/// Play field geometry. Goal rects default to side strips derived from the
/// field size; the host overwrites them with measured DOM rects once the
/// stage is laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub width: f32,
    pub height: f32,
    pub red_goal: Rect,
    pub black_goal: Rect,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        let mut field = Self {
            width,
            height,
            red_goal: Rect::new(0.0, 0.0, 0.0, 0.0),
            black_goal: Rect::new(0.0, 0.0, 0.0, 0.0),
        };
        field.layout_goals();
        field
    }

    fn layout_goals(&mut self) {
        let h = (self.height - 2.0 * GOAL_INSET).max(0.0);
        self.red_goal = Rect::new(GOAL_INSET, GOAL_INSET, GOAL_WIDTH, h);
        self.black_goal = Rect::new(
            self.width - GOAL_INSET - GOAL_WIDTH,
            GOAL_INSET,
            GOAL_WIDTH,
            h,
        );
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.layout_goals();
    }

    /// Replace the derived goal strips with measured rects
    pub fn set_goal_rects(&mut self, red: Rect, black: Rect) {
        self.red_goal = red;
        self.black_goal = black;
    }

    /// The goal that scores for a bomb of the given kind
    pub fn goal_rect(&self, kind: BombKind) -> Rect {
        match kind {
            BombKind::Red => self.red_goal,
            BombKind::Black => self.black_goal,
        }
    }

    /// Clamp a bomb's top-left position to the field interior
    pub fn clamp_pos(&self, pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.clamp(0.0, (self.width - BOMB_SIZE).max(0.0)),
            pos.y.clamp(0.0, (self.height - BOMB_SIZE).max(0.0)),
        )
    }
}

/// Deadlines for the periodic actions. Stopping is idempotent; stale
/// deadlines left behind never fire because `tick` re-checks `running`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduler {
    pub running: bool,
    pub next_spawn_at_ms: f64,
    pub next_ramp_at_ms: f64,
}

impl Scheduler {
    /// Arm both periodic actions starting at `now_ms`
    pub fn start(&mut self, now_ms: f64, spawn_interval_ms: f64) {
        self.running = true;
        self.next_spawn_at_ms = now_ms + spawn_interval_ms;
        self.next_ramp_at_ms = now_ms + RAMP_EVERY_MS;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Invalidate the old spawn schedule and start a fresh one at the new
    /// interval
    pub fn reschedule_spawn(&mut self, now_ms: f64, spawn_interval_ms: f64) {
        self.next_spawn_at_ms = now_ms + spawn_interval_ms;
    }
}

/// Lifecycle cues pushed to the rendering sink. Per-tick positions are not
/// events; the host reads them straight off the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Spawned {
        id: u32,
        kind: BombKind,
        x: f32,
        y: f32,
    },
    /// Warning threshold crossed (emitted once per bomb)
    WarningStarted { id: u32 },
    Resolved { id: u32, outcome: Outcome },
    ScoreChanged { score: u32 },
    SpawnIntervalChanged { interval_ms: f64 },
    GameOver { reason: GameOverReason, score: u32 },
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub field: Field,
    /// Virtual clock, advanced only by `tick`
    pub clock_ms: f64,
    pub score: u32,
    pub spawn_interval_ms: f64,
    /// `Some` once the run is lost; one-way until reset
    pub over: Option<GameOverReason>,
    pub scheduler: Scheduler,
    /// Active bombs. Resolution removes a bomb here in the same step that
    /// reports its outcome.
    pub bombs: Vec<Bomb>,
    next_id: u32,
    /// Pending cues for the rendering sink, drained by the host
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh run with the given seed and field, scheduler armed
    pub fn new(seed: u64, field: Field) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            field,
            clock_ms: 0.0,
            score: 0,
            spawn_interval_ms: SPAWN_START_MS,
            over: None,
            scheduler: Scheduler {
                running: false,
                next_spawn_at_ms: 0.0,
                next_ramp_at_ms: 0.0,
            },
            bombs: Vec::new(),
            next_id: 1,
            events: Vec::new(),
        };
        state.scheduler.start(0.0, SPAWN_START_MS);
        state
    }

    pub fn is_over(&self) -> bool {
        self.over.is_some()
    }

    /// Allocate the next bomb id (monotonic, never reused within a run)
    pub fn next_bomb_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn bomb(&self, id: u32) -> Option<&Bomb> {
        self.bombs.iter().find(|b| b.id == id)
    }

    pub fn bomb_mut(&mut self, id: u32) -> Option<&mut Bomb> {
        self.bombs.iter_mut().find(|b| b.id == id)
    }

    /// Remove a bomb from the registry, returning it if it was still active.
    /// `None` means another resolution path already owned it.
    pub fn take_bomb(&mut self, id: u32) -> Option<Bomb> {
        let idx = self.bombs.iter().position(|b| b.id == id)?;
        Some(self.bombs.remove(idx))
    }

    pub fn set_score(&mut self, score: u32) {
        self.score = score;
        self.events.push(GameEvent::ScoreChanged { score });
    }

    /// Drain pending rendering cues
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// End the run. Idempotent: a second call while already over is a no-op.
    /// Remaining bombs keep their final on-field appearance; the over gate
    /// makes their fuse and drag callbacks no-ops from here on.
    pub fn declare_game_over(&mut self, reason: GameOverReason) {
        if self.over.is_some() {
            log::debug!("duplicate game over suppressed: {reason:?}");
            return;
        }
        self.over = Some(reason);
        self.scheduler.stop();
        for bomb in &mut self.bombs {
            bomb.drag = DragState::Free;
        }
        self.events.push(GameEvent::GameOver {
            reason,
            score: self.score,
        });
        log::info!(
            "game over: {} {:?}, final score {}",
            reason.kind.as_str(),
            reason.cause,
            self.score
        );
    }

    /// Reinitialize the run wholesale and restart the scheduler. The virtual
    /// clock keeps counting; everything else returns to its initial value.
    pub fn reset(&mut self) {
        self.bombs.clear();
        self.next_id = 1;
        self.score = 0;
        self.spawn_interval_ms = SPAWN_START_MS;
        self.over = None;
        self.events.clear();
        self.scheduler.start(self.clock_ms, SPAWN_START_MS);
        log::info!("run reset");
    }
}
