/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound, persistence
/// and timer re-arming.

use crate::domain::entity::Cell;

/// What ended the run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Collision {
    Wall,
    SelfHit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    FoodEaten { at: Cell, score: u32 },
    FoodSpawned { at: Cell },
    SpeedChanged { interval_ms: u64 },
    NewHighScore { score: u32 },
    GameOver { cause: Collision, score: u32 },
}
