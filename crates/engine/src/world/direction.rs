use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute cardinal direction. Index 0 is east (+x) and indices advance
/// counter-clockwise, so adding [`RelativeDirection::Left`] is a +1 quarter turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    North,
    West,
    South,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::East => 0,
            Self::North => 1,
            Self::West => 2,
            Self::South => 3,
        }
    }

    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    pub fn add(self, relative: RelativeDirection) -> Self {
        Self::from_index(self.index() as i64 + relative.quarter_turns())
    }

    pub fn rotate(self, relative: RelativeDirection, times: i64) -> Self {
        Self::from_index(self.index() as i64 + relative.quarter_turns() * times)
    }

    pub fn opposite(self) -> Self {
        self.add(RelativeDirection::Back)
    }

    pub fn relative_to(self, target: Direction) -> RelativeDirection {
        RelativeDirection::from_quarter_turns(target.index() as i64 - self.index() as i64)
    }

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::North => (0, 1),
            Self::West => (-1, 0),
            Self::South => (0, -1),
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::East => "east",
            Self::North => "north",
            Self::West => "west",
            Self::South => "south",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelativeDirection {
    Front,
    Left,
    Back,
    Right,
}

impl RelativeDirection {
    pub const fn quarter_turns(self) -> i64 {
        match self {
            Self::Front => 0,
            Self::Left => 1,
            Self::Back => 2,
            Self::Right => 3,
        }
    }

    pub fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            0 => Self::Front,
            1 => Self::Left,
            2 => Self::Back,
            _ => Self::Right,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Left => "left",
            Self::Back => "back",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for RelativeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub location: Location,
    pub facing: Direction,
}
