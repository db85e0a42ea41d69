/// WorldState: the complete snapshot of a running game.
///
/// ## Ownership
///
/// Every mutable game field lives here and is changed only by
/// `step::step`, `step::set_direction` and `step::restart`.
/// The main loop owns the single instance; the renderer borrows it.
///
/// ## Snake layout
///
/// `snake[0]` is the head, `snake.back()` the tail. A `VecDeque`
/// gives O(1) push-front for the new head and pop-back for the tail.

use std::collections::VecDeque;

use crate::config::RulesConfig;
use crate::domain::entity::{Cell, Direction};

pub const INITIAL_HEAD: Cell = Cell::new(7, 7);
pub const INITIAL_FOOD: Cell = Cell::new(5, 5);
pub const INITIAL_DIRECTION: Direction = Direction::Right;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Landing screen, no game in progress.
    Title,
    Playing,
    GameOver,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
    // ── Rules ──
    pub rules: RulesConfig,

    // ── Session ──
    pub phase: Phase,
    pub snake: VecDeque<Cell>,
    pub food: Cell,
    /// Heading applied on the most recent step.
    pub direction: Direction,
    /// Latest accepted request, committed at the next step.
    pub pending: Direction,
    pub speed_ms: u64,
    pub score: u32,
    pub tick: u64,

    // ── Persisted ──
    pub high_score: u32,
    /// Set when the last game over raised the high score.
    pub new_high_score: bool,

    // ── UI ──
    pub paused: bool,
    pub message: String,
    pub message_timer: u32,
}

// ── Construction ──

impl WorldState {
    /// Fresh world on the title screen. `high_score` comes from the score store.
    pub fn new(rules: RulesConfig, high_score: u32) -> Self {
        let base_speed = rules.base_speed_ms;
        WorldState {
            rules,
            phase: Phase::Title,
            snake: VecDeque::from([INITIAL_HEAD]),
            food: INITIAL_FOOD,
            direction: INITIAL_DIRECTION,
            pending: INITIAL_DIRECTION,
            speed_ms: base_speed,
            score: 0,
            tick: 0,
            high_score,
            new_high_score: false,
            paused: false,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count the message timer down by one frame.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }
}

// ── Queries ──

impl WorldState {
    pub fn head(&self) -> Cell {
        // Length >= 1 is structural: restart seeds one cell and steps never shrink it.
        self.snake.front().copied().unwrap_or(INITIAL_HEAD)
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.snake.contains(&cell)
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Number of cells on the board.
    pub fn area(&self) -> usize {
        (self.rules.board_size as usize) * (self.rules.board_size as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_starts_on_title_with_initial_session() {
        let w = WorldState::new(RulesConfig::default(), 40);
        assert_eq!(w.phase, Phase::Title);
        assert_eq!(w.snake, VecDeque::from([Cell::new(7, 7)]));
        assert_eq!(w.food, Cell::new(5, 5));
        assert_eq!(w.direction, Direction::Right);
        assert_eq!(w.pending, Direction::Right);
        assert_eq!(w.speed_ms, 150);
        assert_eq!(w.score, 0);
        assert_eq!(w.high_score, 40);
        assert!(!w.is_running());
    }

    #[test]
    fn message_expires() {
        let mut w = WorldState::new(RulesConfig::default(), 0);
        w.set_message("hi", 2);
        w.tick_message();
        assert_eq!(w.message, "hi");
        w.tick_message();
        assert!(w.message.is_empty());
    }

    #[test]
    fn area_of_default_board() {
        let w = WorldState::new(RulesConfig::default(), 0);
        assert_eq!(w.area(), 324);
    }
}
