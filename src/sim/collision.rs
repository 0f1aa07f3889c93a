//! Collision detection and hit resolution
//!
//! Shots and meteors are circles. Both move in straight lines during a tick,
//! so a hit is tested on their closest approach over the tick rather than on
//! end positions alone; a shot cannot tunnel through a meteor at large `dt`.
//! Projectiles are checked in id order and each takes the first falling
//! meteor (in id order) it touches, so a shot grazing two meteors always
//! resolves the same way.

use glam::Vec2;

use super::particles::{Burst, spawn_burst};
use super::state::{FallingOption, GameEvent, GamePhase, GameState, OptionState, Projectile};
use crate::consts::*;

/// Check if two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> bool {
    let combined = radius_a + radius_b;
    pos_a.distance_squared(pos_b) <= combined * combined
}

/// Squared distance from `point` to the segment `start..end`
fn distance_squared_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let ab = end - start;
    let ab_len_sq = ab.length_squared();
    if ab_len_sq == 0.0 {
        return point.distance_squared(start);
    }
    let t = ((point - start).dot(ab) / ab_len_sq).clamp(0.0, 1.0);
    point.distance_squared(start + ab * t)
}

/// Check if two circles moving linearly from `*_start` to `*_end` touch at
/// any point during the move
pub fn swept_circles_overlap(
    a_start: Vec2,
    a_end: Vec2,
    radius_a: f32,
    b_start: Vec2,
    b_end: Vec2,
    radius_b: f32,
) -> bool {
    // Work in b's frame: a travels along the relative offset segment
    let combined = radius_a + radius_b;
    distance_squared_to_segment(Vec2::ZERO, a_start - b_start, a_end - b_end)
        <= combined * combined
}

/// Index of the first falling meteor `projectile` touched this tick
pub fn first_overlap(projectile: &Projectile, options: &[FallingOption]) -> Option<usize> {
    options.iter().position(|option| {
        option.is_falling()
            && swept_circles_overlap(
                projectile.prev_pos,
                projectile.pos,
                projectile.radius,
                option.prev_pos,
                option.pos,
                option.radius,
            )
    })
}

/// A resolved projectile-meteor hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub projectile_id: u32,
    pub option_id: u32,
    pub value: u32,
    pub correct: bool,
}

/// Resolve every projectile-meteor overlap for this tick
///
/// With no overlapping pair nothing is touched.
pub fn resolve_collisions(state: &mut GameState) -> Vec<Hit> {
    let mut hits = Vec::new();
    let mut i = 0;
    while i < state.projectiles.len() {
        let Some(option_idx) = first_overlap(&state.projectiles[i], &state.options) else {
            i += 1;
            continue;
        };
        let projectile = state.projectiles.remove(i);
        hits.push(apply_hit(state, projectile.id, option_idx));
    }
    hits
}

fn apply_hit(state: &mut GameState, projectile_id: u32, option_idx: usize) -> Hit {
    let quotient = state.question.map(|q| q.problem.quotient);
    let option = &mut state.options[option_idx];
    let correct = quotient == Some(option.value);
    option.pop(correct);
    let hit = Hit {
        projectile_id,
        option_id: option.id,
        value: option.value,
        correct,
    };
    let origin = option.pos;

    state.events.push(GameEvent::OptionPopped {
        value: hit.value,
        correct,
    });
    log::debug!(
        "Hit meteor {} ({}) with shot {}",
        hit.value,
        if correct { "correct" } else { "wrong" },
        projectile_id
    );

    let cap = state.settings().max_particles;
    if !correct {
        spawn_burst(&mut state.particles, &mut state.fx_rng, origin, Burst::Wrong, cap);
        return hit;
    }

    spawn_burst(&mut state.particles, &mut state.fx_rng, origin, Burst::Correct, cap);
    for other in state.options.iter_mut().filter(|o| o.is_falling()) {
        other.state = OptionState::Expired;
    }

    // Resolved: the end of the tick spawns the next question
    state.question = None;
    state.session.correct_count += 1;
    state.session.score += POINTS_PER_CORRECT;
    state.nice_shot_ticks = NICE_SHOT_TICKS;

    if state.session.correct_count >= state.session.progress_target {
        let center = Vec2::new(state.settings().width / 2.0, state.settings().height / 3.0);
        spawn_burst(
            &mut state.particles,
            &mut state.fx_rng,
            center,
            Burst::Celebration,
            cap,
        );
        state.phase = GamePhase::TierClear;
        log::info!(
            "Tier {} cleared with score {}",
            state.session.tier_index,
            state.session.score
        );
        state.events.push(GameEvent::TierCleared {
            tier_index: state.session.tier_index,
        });
    }

    hit
}
