/// Entities: grid cells and the snake's heading.
/// The snake body itself is a plain `VecDeque<Cell>` owned by WorldState.

/// A grid coordinate. Signed so a head stepping off the board
/// can be represented before the bounds check rejects it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// The neighbouring cell one step in `dir`.
    pub fn offset(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.delta();
        Cell { x: self.x + dx, y: self.y + dy }
    }

    /// Is this cell inside a square board of `size` × `size`?
    pub fn in_bounds(self, size: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < size && self.y < size
    }
}

/// Heading of the snake (committed or pending).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// (dx, dy) for one step. Screen coordinates: y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// UP↔DOWN and LEFT↔RIGHT are reverse pairs.
    pub fn is_reverse_of(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_follows_screen_axes() {
        let c = Cell::new(7, 7);
        assert_eq!(c.offset(Direction::Up), Cell::new(7, 6));
        assert_eq!(c.offset(Direction::Down), Cell::new(7, 8));
        assert_eq!(c.offset(Direction::Left), Cell::new(6, 7));
        assert_eq!(c.offset(Direction::Right), Cell::new(8, 7));
    }

    #[test]
    fn bounds_are_half_open() {
        assert!(Cell::new(0, 0).in_bounds(18));
        assert!(Cell::new(17, 17).in_bounds(18));
        assert!(!Cell::new(18, 0).in_bounds(18));
        assert!(!Cell::new(0, -1).in_bounds(18));
        assert!(!Cell::new(-1, 5).in_bounds(18));
    }

    #[test]
    fn reverse_pairs() {
        assert!(Direction::Up.is_reverse_of(Direction::Down));
        assert!(Direction::Left.is_reverse_of(Direction::Right));
        assert!(!Direction::Up.is_reverse_of(Direction::Left));
        assert!(!Direction::Right.is_reverse_of(Direction::Right));
    }
}
