//! Pointer-driven drag repositioning and drop resolution
//!
//! While held, a bomb is excluded from the motion integrator. The drag
//! writes the bomb's real stored position, so motion resumes from wherever
//! the pointer left it. Release resolves goal overlap; the matching goal is
//! always checked first, so a correct-kind overlap wins even when the box
//! touches both goals at once.

use glam::Vec2;

use super::state::{DragState, GameEvent, GameOverReason, GameState, LossCause, Outcome};
use crate::consts::DROP_SCORE;

/// What a drag release decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropVerdict {
    /// The run is over or the bomb is already resolved; nothing happened
    Ignored,
    /// No goal overlap; the bomb keeps flying and its fuse keeps burning
    Kept,
    /// Matching goal: scored and removed
    Scored,
    /// Wrong goal: removed, run over
    Exploded,
}

/// Capture the pointer-to-bomb offset and exclude the bomb from motion.
/// Refused once the run is over or the bomb is already resolved.
pub fn begin_drag(state: &mut GameState, id: u32, pointer: Vec2) -> bool {
    if state.is_over() {
        return false;
    }
    let Some(bomb) = state.bomb_mut(id) else {
        log::debug!("drag start on resolved bomb {id}");
        return false;
    };
    bomb.drag = DragState::Held {
        grab: pointer - bomb.pos,
    };
    true
}

/// Follow the pointer, clamped to the field. Writes the stored position
/// directly so the integrator picks up from here on release.
pub fn drag_to(state: &mut GameState, id: u32, pointer: Vec2) {
    if state.is_over() {
        return;
    }
    let field = state.field.clone();
    let Some(bomb) = state.bomb_mut(id) else {
        return;
    };
    if let DragState::Held { grab } = bomb.drag {
        bomb.pos = field.clamp_pos(pointer - grab);
    }
}

/// Drop the bomb and resolve goal overlap
pub fn release(state: &mut GameState, id: u32) -> DropVerdict {
    if state.is_over() {
        return DropVerdict::Ignored;
    }
    let (rect, kind) = {
        let Some(bomb) = state.bomb_mut(id) else {
            return DropVerdict::Ignored;
        };
        if !bomb.is_dragging() {
            return DropVerdict::Ignored;
        }
        bomb.drag = DragState::Free;
        (bomb.rect(), bomb.kind)
    };

    // Matching goal first (tie-break for ambiguous geometry)
    if rect.overlaps(&state.field.goal_rect(kind)) {
        state.take_bomb(id);
        state.events.push(GameEvent::Resolved {
            id,
            outcome: Outcome::Scored,
        });
        state.set_score(state.score + DROP_SCORE);
        return DropVerdict::Scored;
    }
    if rect.overlaps(&state.field.goal_rect(kind.opposite())) {
        state.take_bomb(id);
        state.events.push(GameEvent::Resolved {
            id,
            outcome: Outcome::WrongGoal,
        });
        state.declare_game_over(GameOverReason {
            kind,
            cause: LossCause::WrongGoal,
        });
        return DropVerdict::Exploded;
    }
    DropVerdict::Kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::{BombKind, Field};
    use crate::sim::tick::{spawn_bomb, tick};

    /// State whose periodic spawn/ramp actions never fire, with one bomb
    /// of a known kind on the field
    fn state_with_bomb(kind: BombKind) -> (crate::sim::state::GameState, u32) {
        let mut state =
            crate::sim::state::GameState::new(23, Field::new(FIELD_WIDTH, FIELD_HEIGHT));
        state.scheduler.next_spawn_at_ms = f64::MAX;
        state.scheduler.next_ramp_at_ms = f64::MAX;
        loop {
            spawn_bomb(&mut state);
            let bomb = state.bombs.last().unwrap();
            if bomb.kind == kind {
                let id = bomb.id;
                state.bombs.retain(|b| b.id == id);
                return (state, id);
            }
            state.bombs.clear();
        }
    }

    /// Top-left position that puts a bomb's box inside the given goal
    fn pos_inside(rect: crate::sim::Rect) -> Vec2 {
        Vec2::new(rect.x + 1.0, rect.y + 1.0)
    }

    #[test]
    fn test_held_bomb_ignores_motion() {
        let (mut state, id) = state_with_bomb(BombKind::Red);
        let pointer = state.bomb(id).unwrap().pos + Vec2::new(10.0, 10.0);
        assert!(begin_drag(&mut state, id, pointer));

        let held_pos = state.bomb(id).unwrap().pos;
        for _ in 0..20 {
            tick(&mut state);
        }
        assert_eq!(state.bomb(id).unwrap().pos, held_pos);

        release(&mut state, id);
        let freed_pos = state.bomb(id).unwrap().pos;
        tick(&mut state);
        assert_ne!(state.bomb(id).unwrap().pos, freed_pos);
    }

    #[test]
    fn test_drag_clamps_to_field() {
        let (mut state, id) = state_with_bomb(BombKind::Red);
        let pointer = state.bomb(id).unwrap().pos;
        begin_drag(&mut state, id, pointer);
        drag_to(&mut state, id, Vec2::new(-500.0, 50_000.0));

        let pos = state.bomb(id).unwrap().pos;
        assert_eq!(pos.x, 0.0);
        assert_eq!(pos.y, FIELD_HEIGHT - BOMB_SIZE);
    }

    #[test]
    fn test_drop_on_matching_goal_scores() {
        let (mut state, id) = state_with_bomb(BombKind::Red);
        let target = pos_inside(state.field.red_goal);
        let grab_at = state.bomb(id).unwrap().pos;
        begin_drag(&mut state, id, grab_at);
        drag_to(&mut state, id, target);

        assert_eq!(release(&mut state, id), DropVerdict::Scored);
        assert_eq!(state.score, DROP_SCORE);
        assert!(state.bomb(id).is_none());
        assert!(!state.is_over());
    }

    #[test]
    fn test_drop_on_wrong_goal_ends_the_run() {
        let (mut state, id) = state_with_bomb(BombKind::Black);
        let target = pos_inside(state.field.red_goal);
        let grab_at = state.bomb(id).unwrap().pos;
        begin_drag(&mut state, id, grab_at);
        drag_to(&mut state, id, target);

        assert_eq!(release(&mut state, id), DropVerdict::Exploded);
        assert_eq!(state.score, 0);
        assert!(state.bomb(id).is_none());
        assert_eq!(
            state.over,
            Some(GameOverReason {
                kind: BombKind::Black,
                cause: LossCause::WrongGoal
            })
        );
    }

    #[test]
    fn test_drop_nowhere_keeps_the_bomb() {
        let (mut state, id) = state_with_bomb(BombKind::Red);
        let deadline = state.bomb(id).unwrap().fuse_deadline_ms();
        let grab_at = state.bomb(id).unwrap().pos;
        begin_drag(&mut state, id, grab_at);

        assert_eq!(release(&mut state, id), DropVerdict::Kept);
        let bomb = state.bomb(id).unwrap();
        assert!(!bomb.is_dragging());
        // Fuse unaffected by the failed drop
        assert_eq!(bomb.fuse_deadline_ms(), deadline);
    }

    #[test]
    fn test_overlapping_both_goals_matching_wins() {
        let (mut state, id) = state_with_bomb(BombKind::Red);
        // Degenerate layout: both goals on the same spot
        let zone = crate::sim::Rect::new(300.0, 100.0, 200.0, 200.0);
        state.field.set_goal_rects(zone, zone);

        let grab_at = state.bomb(id).unwrap().pos;
        begin_drag(&mut state, id, grab_at);
        drag_to(&mut state, id, pos_inside(zone));

        assert_eq!(release(&mut state, id), DropVerdict::Scored);
        assert!(!state.is_over());
        assert_eq!(state.score, DROP_SCORE);
    }

    #[test]
    fn test_no_interaction_after_game_over() {
        let (mut state, id) = state_with_bomb(BombKind::Red);
        state.declare_game_over(GameOverReason {
            kind: BombKind::Black,
            cause: LossCause::Timeout,
        });

        assert!(!begin_drag(&mut state, id, Vec2::ZERO));
        assert_eq!(release(&mut state, id), DropVerdict::Ignored);
        assert_eq!(state.score, 0);
        // The bomb kept its final on-field state
        assert!(state.bomb(id).is_some());
    }

    #[test]
    fn test_release_without_hold_is_ignored() {
        let (mut state, id) = state_with_bomb(BombKind::Red);
        assert_eq!(release(&mut state, id), DropVerdict::Ignored);
        assert!(state.bomb(id).is_some());
    }

    #[test]
    fn test_fuse_and_drop_resolve_exactly_once() {
        use crate::sim::tick::detonate_timeout;

        // Drop first: the later fuse fire finds nothing
        let (mut state, id) = state_with_bomb(BombKind::Red);
        let grab_at = state.bomb(id).unwrap().pos;
        begin_drag(&mut state, id, grab_at);
        let target = pos_inside(state.field.red_goal);
        drag_to(&mut state, id, target);
        assert_eq!(release(&mut state, id), DropVerdict::Scored);
        detonate_timeout(&mut state, id);
        assert!(!state.is_over());
        assert_eq!(state.score, DROP_SCORE);

        // Fuse first: the later release finds nothing
        let (mut state, id) = state_with_bomb(BombKind::Red);
        detonate_timeout(&mut state, id);
        assert!(state.is_over());
        let score_after_timeout = state.score;
        assert_eq!(release(&mut state, id), DropVerdict::Ignored);
        assert_eq!(state.score, score_after_timeout);

        let resolutions = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::Resolved { .. }))
            .count();
        assert_eq!(resolutions, 1);
    }
}
