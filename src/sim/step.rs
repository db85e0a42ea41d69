/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Commit the pending direction
///   2. Compute the new head
///   3. Collision check against the pre-move body (tail included)
///   4. Push the new head
///   5. Food: score, speed-up, respawn food, keep the tail (growth)
///   6. Otherwise pop the tail
///
/// A failed step leaves the snake untouched; only the phase,
/// high score and events change.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::FoodPolicy;
use crate::domain::entity::{Cell, Direction};
use super::event::{Collision, GameEvent};
use super::world::{Phase, WorldState, INITIAL_DIRECTION, INITIAL_FOOD, INITIAL_HEAD};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step<R: Rng + ?Sized>(world: &mut WorldState, rng: &mut R) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    world.direction = world.pending;
    let new_head = world.head().offset(world.direction);

    if let Some(cause) = detect_collision(world, new_head) {
        end_game(world, cause, &mut events);
        return events;
    }

    world.snake.push_front(new_head);
    world.tick += 1;

    if new_head == world.food {
        resolve_food(world, rng, &mut events);
    } else {
        world.snake.pop_back();
    }

    events
}

/// Queue a direction for the next step.
///
/// Returns true when the pending direction actually changed, so the
/// caller knows to re-arm its timer. Reversals of the committed
/// direction and requests outside `Playing` are ignored.
pub fn set_direction(world: &mut WorldState, requested: Direction) -> bool {
    if world.phase != Phase::Playing { return false; }
    if requested.is_reverse_of(world.direction) { return false; }
    if world.pending == requested { return false; }
    world.pending = requested;
    true
}

/// Reset every session field and enter `Playing`. The high score survives.
pub fn restart(world: &mut WorldState) {
    world.snake.clear();
    world.snake.push_front(INITIAL_HEAD);
    world.food = INITIAL_FOOD;
    world.direction = INITIAL_DIRECTION;
    world.pending = INITIAL_DIRECTION;
    world.speed_ms = world.rules.base_speed_ms;
    world.score = 0;
    world.tick = 0;
    world.new_high_score = false;
    world.paused = false;
    world.message.clear();
    world.message_timer = 0;
    world.phase = Phase::Playing;
}

// ══════════════════════════════════════════════════════════════
// Phases
// ══════════════════════════════════════════════════════════════

fn detect_collision(world: &WorldState, new_head: Cell) -> Option<Collision> {
    if !new_head.in_bounds(world.rules.board_size) {
        Some(Collision::Wall)
    } else if world.occupies(new_head) {
        Some(Collision::SelfHit)
    } else {
        None
    }
}

fn end_game(world: &mut WorldState, cause: Collision, events: &mut Vec<GameEvent>) {
    world.phase = Phase::GameOver;
    if world.score > world.high_score {
        world.high_score = world.score;
        world.new_high_score = true;
        events.push(GameEvent::NewHighScore { score: world.score });
    }
    events.push(GameEvent::GameOver { cause, score: world.score });
}

fn resolve_food<R: Rng + ?Sized>(world: &mut WorldState, rng: &mut R, events: &mut Vec<GameEvent>) {
    world.score = world.score.saturating_add(world.rules.points_per_food);
    events.push(GameEvent::FoodEaten { at: world.food, score: world.score });

    let faster = world.speed_ms
        .saturating_sub(world.rules.speed_step_ms)
        .max(world.rules.min_speed_ms);
    if faster != world.speed_ms {
        world.speed_ms = faster;
        events.push(GameEvent::SpeedChanged { interval_ms: faster });
    }

    world.food = spawn_food(world, rng);
    events.push(GameEvent::FoodSpawned { at: world.food });
}

/// Pick the next food cell according to the configured policy.
pub fn spawn_food<R: Rng + ?Sized>(world: &WorldState, rng: &mut R) -> Cell {
    let size = world.rules.board_size;
    match world.rules.food_policy {
        FoodPolicy::Anywhere => random_cell(size, rng),
        FoodPolicy::FreeCell => {
            let mut free = Vec::with_capacity(world.area().saturating_sub(world.snake.len()));
            for y in 0..size {
                for x in 0..size {
                    let c = Cell::new(x, y);
                    if !world.occupies(c) { free.push(c); }
                }
            }
            // A full board has nowhere to go; the next step ends the game anyway.
            free.choose(rng).copied().unwrap_or_else(|| random_cell(size, rng))
        }
    }
}

fn random_cell<R: Rng + ?Sized>(size: i32, rng: &mut R) -> Cell {
    Cell::new(rng.gen_range(0..size), rng.gen_range(0..size))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
