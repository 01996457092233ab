//! Scheduled actions: difficulty ramp, spawning, motion, fuse processing
//!
//! One `tick` call advances the virtual clock by a single movement step and
//! runs whatever deadlines have come due. There are no wall-clock timers
//! anywhere in the simulation; a tick that arrives after a stop request or
//! after game over is a no-op because the actions re-check run state
//! themselves, not just the scheduler flag.

use glam::Vec2;
use rand::Rng;

use super::state::{
    Bomb, BombKind, DragState, GameEvent, GameOverReason, GameState, LossCause, Outcome, Wander,
};
use crate::consts::*;

/// Advance the simulation by one movement tick
pub fn tick(state: &mut GameState) {
    if state.is_over() || !state.scheduler.running {
        return;
    }
    state.clock_ms += TICK_MS;

    ramp_difficulty(state);
    maybe_spawn(state);
    integrate_motion(state);
    check_fuses(state);
}

/// How much of the difficulty ramp has been applied, in [0, 1]
fn ramp(spawn_interval_ms: f64) -> f64 {
    ((SPAWN_START_MS - spawn_interval_ms) / SPAWN_START_MS).clamp(0.0, 1.0)
}

/// Fuse durations shrink as the spawn interval does, floored at 65% of
/// the random draw
pub fn fuse_scale(spawn_interval_ms: f64) -> f64 {
    (1.0 - ramp(spawn_interval_ms) * FUSE_RAMP_WEIGHT).clamp(FUSE_FLOOR, 1.0)
}

/// Bombs speed up as the spawn interval shrinks, up to +55%
pub fn speed_boost(spawn_interval_ms: f64) -> f32 {
    1.0 + ramp(spawn_interval_ms) as f32 * SPEED_RAMP_WEIGHT
}

/// Every five seconds, shorten the spawn interval down to its floor.
/// A reduction invalidates the old spawn schedule and starts a fresh one
/// at the new interval.
fn ramp_difficulty(state: &mut GameState) {
    let now = state.clock_ms;
    if now < state.scheduler.next_ramp_at_ms {
        return;
    }
    state.scheduler.next_ramp_at_ms = now + RAMP_EVERY_MS;

    let next = (state.spawn_interval_ms - SPAWN_STEP_MS).max(SPAWN_MIN_MS);
    if next != state.spawn_interval_ms {
        state.spawn_interval_ms = next;
        state
            .events
            .push(GameEvent::SpawnIntervalChanged { interval_ms: next });
        state.scheduler.reschedule_spawn(now, next);
        log::debug!("spawn interval ramped to {next} ms");
    }
}

fn maybe_spawn(state: &mut GameState) {
    let now = state.clock_ms;
    if now < state.scheduler.next_spawn_at_ms {
        return;
    }
    state.scheduler.next_spawn_at_ms = now + state.spawn_interval_ms;
    spawn_bomb(state);
}

/// Create one bomb with randomized kind, spawn edge, fuse and velocity,
/// all scaled by the current difficulty
pub fn spawn_bomb(state: &mut GameState) {
    let now = state.clock_ms;
    let kind = if state.rng.random_bool(0.5) {
        BombKind::Red
    } else {
        BombKind::Black
    };
    let from_top = state.rng.random_bool(0.5);

    // Central safe zone: keep clear of the goal strips on both sides
    let left = SPAWN_MARGIN;
    let right = state.field.width - SPAWN_MARGIN - BOMB_SIZE;
    let x = if right > left {
        state.rng.random_range(left..right)
    } else {
        ((state.field.width - BOMB_SIZE) / 2.0).max(0.0)
    };
    let y = if from_top {
        SPAWN_EDGE_OFFSET
    } else {
        state.field.height - SPAWN_EDGE_OFFSET - BOMB_SIZE
    };

    let fuse_ms =
        state.rng.random_range(FUSE_MIN_MS..FUSE_MAX_MS) * fuse_scale(state.spawn_interval_ms);

    let boost = speed_boost(state.spawn_interval_ms);
    let speed = state.rng.random_range(BASE_SPEED_MIN..BASE_SPEED_MAX) * boost;
    let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
    let vel = Vec2::new(angle.cos(), angle.sin()) * speed;

    let wander_every =
        WANDER_EVERY_MS + state.rng.random_range(-WANDER_JITTER_MS..WANDER_JITTER_MS);

    let id = state.next_bomb_id();
    state.bombs.push(Bomb {
        id,
        kind,
        pos: Vec2::new(x, y),
        vel,
        max_speed: MAX_SPEED * boost,
        spawned_at_ms: now,
        fuse_ms,
        wander: Wander {
            last_at_ms: now,
            every_ms: wander_every,
        },
        drag: DragState::Free,
        warned: false,
    });
    state.events.push(GameEvent::Spawned { id, kind, x, y });
}

/// Advance every free bomb: wander, integrate, reflect at the walls.
/// Every bomb sees the same clock snapshot within one tick.
fn integrate_motion(state: &mut GameState) {
    let now = state.clock_ms;
    let max_x = state.field.width - BOMB_SIZE;
    let max_y = state.field.height - BOMB_SIZE;

    let rng = &mut state.rng;
    for bomb in state.bombs.iter_mut() {
        if bomb.is_dragging() {
            continue;
        }

        if now - bomb.wander.last_at_ms > bomb.wander.every_ms {
            bomb.wander.last_at_ms = now;
            bomb.vel.x += rng.random_range(-WANDER_KICK..WANDER_KICK);
            bomb.vel.y += rng.random_range(-WANDER_KICK..WANDER_KICK);
            bomb.clamp_speed();
        }

        bomb.pos += bomb.vel;

        // Reflect at the walls; the clamp leaves the bomb resting on the
        // boundary with its velocity pointing back inside
        if bomb.pos.x <= 0.0 {
            bomb.pos.x = 0.0;
            bomb.vel.x = bomb.vel.x.abs();
        }
        if bomb.pos.x >= max_x {
            bomb.pos.x = max_x;
            bomb.vel.x = -bomb.vel.x.abs();
        }
        if bomb.pos.y <= 0.0 {
            bomb.pos.y = 0.0;
            bomb.vel.y = bomb.vel.y.abs();
        }
        if bomb.pos.y >= max_y {
            bomb.pos.y = max_y;
            bomb.vel.y = -bomb.vel.y.abs();
        }
    }
}

/// Fire warning cues and detonate expired fuses
fn check_fuses(state: &mut GameState) {
    let now = state.clock_ms;

    let mut newly_warned = Vec::new();
    for bomb in &mut state.bombs {
        if !bomb.warned && bomb.fuse_remaining(now) <= WARN_FRACTION {
            bomb.warned = true;
            newly_warned.push(bomb.id);
        }
    }
    for id in newly_warned {
        state.events.push(GameEvent::WarningStarted { id });
    }

    // One expiry is enough: a timeout ends the run
    let expired = state
        .bombs
        .iter()
        .find(|b| now >= b.fuse_deadline_ms())
        .map(|b| b.id);
    if let Some(id) = expired {
        detonate_timeout(state, id);
    }
}

/// Timeout path: remove the bomb, report it, end the run. A stale call
/// (bomb already resolved, or run already over) is absorbed silently.
pub fn detonate_timeout(state: &mut GameState, id: u32) {
    if state.is_over() {
        return;
    }
    let Some(bomb) = state.take_bomb(id) else {
        log::debug!("stale fuse fire for bomb {id}");
        return;
    };
    state.events.push(GameEvent::Resolved {
        id,
        outcome: Outcome::TimedOut,
    });
    state.declare_game_over(GameOverReason {
        kind: bomb.kind,
        cause: LossCause::Timeout,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Field;
    use proptest::prelude::*;

    fn fresh_state(seed: u64) -> GameState {
        GameState::new(seed, Field::new(FIELD_WIDTH, FIELD_HEIGHT))
    }

    /// State whose periodic spawn/ramp actions never fire, for tests that
    /// manage bombs by hand
    fn quiet_state(seed: u64) -> GameState {
        let mut state = fresh_state(seed);
        state.scheduler.next_spawn_at_ms = f64::MAX;
        state.scheduler.next_ramp_at_ms = f64::MAX;
        state
    }

    #[test]
    fn test_spawns_land_in_safe_zone_with_bounded_fuse() {
        for seed in 0..20 {
            let mut state = fresh_state(seed);
            // Sample both ends of the difficulty ramp
            if seed % 2 == 0 {
                state.spawn_interval_ms = SPAWN_MIN_MS;
            }
            for _ in 0..50 {
                spawn_bomb(&mut state);
            }
            for bomb in &state.bombs {
                assert!(bomb.pos.x >= SPAWN_MARGIN);
                assert!(bomb.pos.x <= FIELD_WIDTH - SPAWN_MARGIN - BOMB_SIZE);
                assert!(
                    bomb.pos.y == SPAWN_EDGE_OFFSET
                        || bomb.pos.y == FIELD_HEIGHT - SPAWN_EDGE_OFFSET - BOMB_SIZE
                );
                assert!(bomb.fuse_ms >= FUSE_MIN_MS * FUSE_FLOOR);
                assert!(bomb.fuse_ms <= FUSE_MAX_MS);
                assert!(bomb.vel.length() <= bomb.max_speed);
            }
        }
    }

    #[test]
    fn test_difficulty_ramp_reschedules_spawn() {
        let mut state = fresh_state(7);
        // 313 ticks * 16 ms = 5008 ms, just past the first ramp step
        for _ in 0..313 {
            tick(&mut state);
        }
        assert_eq!(state.spawn_interval_ms, SPAWN_START_MS - SPAWN_STEP_MS);
        // The old spawn schedule was invalidated: the next spawn is one full
        // new interval after the ramp fired
        assert_eq!(
            state.scheduler.next_spawn_at_ms,
            state.clock_ms + state.spawn_interval_ms
        );
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::SpawnIntervalChanged { .. }))
        );
    }

    #[test]
    fn test_interval_floor_stops_rescheduling() {
        let mut state = fresh_state(7);
        state.spawn_interval_ms = SPAWN_MIN_MS;
        state.scheduler.next_spawn_at_ms = f64::MAX;
        state.scheduler.next_ramp_at_ms = 0.0;
        tick(&mut state);
        assert_eq!(state.spawn_interval_ms, SPAWN_MIN_MS);
        // No reduction happened, so the spawn schedule was left alone
        assert_eq!(state.scheduler.next_spawn_at_ms, f64::MAX);
        assert!(
            !state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::SpawnIntervalChanged { .. }))
        );
    }

    #[test]
    fn test_fuse_timeout_ends_the_run() {
        let mut state = quiet_state(11);
        spawn_bomb(&mut state);
        let kind = state.bombs[0].kind;
        let deadline = state.bombs[0].fuse_deadline_ms();

        while !state.is_over() {
            tick(&mut state);
            assert!(state.clock_ms < deadline + 1000.0, "fuse never fired");
        }
        assert_eq!(
            state.over,
            Some(GameOverReason {
                kind,
                cause: LossCause::Timeout
            })
        );
        assert!(state.bombs.is_empty());
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::Resolved {
                outcome: Outcome::TimedOut,
                ..
            }
        )));
    }

    #[test]
    fn test_warning_fires_exactly_once() {
        let mut state = quiet_state(13);
        spawn_bomb(&mut state);
        while !state.is_over() {
            tick(&mut state);
        }
        let warnings = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::WarningStarted { .. }))
            .count();
        assert_eq!(warnings, 1);
        // The cue came before the detonation
        let warn_idx = state
            .events
            .iter()
            .position(|e| matches!(e, GameEvent::WarningStarted { .. }))
            .unwrap();
        let resolve_idx = state
            .events
            .iter()
            .position(|e| matches!(e, GameEvent::Resolved { .. }))
            .unwrap();
        assert!(warn_idx < resolve_idx);
    }

    #[test]
    fn test_tick_is_noop_after_stop() {
        let mut state = fresh_state(3);
        state.scheduler.stop();
        let before = state.clone();
        for _ in 0..10 {
            tick(&mut state);
        }
        assert_eq!(state.clock_ms, before.clock_ms);
        assert_eq!(state.bombs, before.bombs);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_tick_is_noop_after_game_over() {
        let mut state = quiet_state(5);
        spawn_bomb(&mut state);
        state.declare_game_over(GameOverReason {
            kind: BombKind::Red,
            cause: LossCause::WrongGoal,
        });
        let bombs_before = state.bombs.clone();
        let clock_before = state.clock_ms;
        for _ in 0..10 {
            tick(&mut state);
        }
        assert_eq!(state.bombs, bombs_before);
        assert_eq!(state.clock_ms, clock_before);
    }

    #[test]
    fn test_stale_detonation_is_absorbed() {
        let mut state = quiet_state(17);
        spawn_bomb(&mut state);
        let id = state.bombs[0].id;
        state.take_bomb(id);
        detonate_timeout(&mut state, id);
        assert!(!state.is_over());
        assert!(state.events.iter().all(|e| !matches!(e, GameEvent::Resolved { .. })));
    }

    #[test]
    fn test_reset_resumes_spawning() {
        let mut state = quiet_state(19);
        spawn_bomb(&mut state);
        while !state.is_over() {
            tick(&mut state);
        }

        state.reset();
        assert_eq!(state.score, 0);
        assert_eq!(state.spawn_interval_ms, SPAWN_START_MS);
        assert!(state.bombs.is_empty());

        // A little over one spawn interval of ticks
        for _ in 0..(SPAWN_START_MS / TICK_MS) as usize + 2 {
            tick(&mut state);
        }
        assert!(!state.bombs.is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = fresh_state(99_999);
        let mut b = fresh_state(99_999);
        for _ in 0..500 {
            tick(&mut a);
            tick(&mut b);
        }
        assert_eq!(a.clock_ms, b.clock_ms);
        assert_eq!(a.score, b.score);
        assert_eq!(a.bombs, b.bombs);
        assert_eq!(a.over, b.over);
    }

    proptest! {
        #[test]
        fn prop_bombs_stay_in_bounds(seed in any::<u64>(), ticks in 1usize..400) {
            let mut state = fresh_state(seed);
            for _ in 0..ticks {
                tick(&mut state);
            }
            for bomb in &state.bombs {
                prop_assert!(bomb.pos.x >= 0.0 && bomb.pos.x <= FIELD_WIDTH - BOMB_SIZE);
                prop_assert!(bomb.pos.y >= 0.0 && bomb.pos.y <= FIELD_HEIGHT - BOMB_SIZE);
            }
        }

        #[test]
        fn prop_wander_never_exceeds_max_speed(seed in any::<u64>(), ticks in 1usize..400) {
            let mut state = fresh_state(seed);
            for _ in 0..ticks {
                tick(&mut state);
                for bomb in &state.bombs {
                    prop_assert!(bomb.vel.length() <= bomb.max_speed + 1e-3);
                }
            }
        }
    }
}
