//! Grid geometry primitives.

use std::fmt;

/// Orientation on the grid, identified by its angle in degrees.
///
/// The Y axis grows upwards: [`Direction::Up`] points towards +y and
/// [`Direction::Down`] towards -y, matching the planner's neighbour
/// generation and the direction-to-neighbour calculation below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    /// Angle in degrees, as emitted in the trajectory `pitch` column.
    pub fn degrees(&self) -> u16 {
        match self {
            Direction::Right => 0,
            Direction::Up => 90,
            Direction::Left => 180,
            Direction::Down => 270,
        }
    }

    /// Parses the `pitch` column of a map file.
    ///
    /// Unrecognized values fall back to [`Direction::Right`].
    pub fn from_degrees(s: &str) -> Self {
        match s.trim() {
            "90" => Direction::Up,
            "180" => Direction::Left,
            "270" => Direction::Down,
            _ => Direction::Right,
        }
    }
}

/// Integer cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn left_neighbour(&self) -> Point {
        Point::new(self.x - 1, self.y)
    }

    pub fn right_neighbour(&self) -> Point {
        Point::new(self.x + 1, self.y)
    }

    pub fn up_neighbour(&self) -> Point {
        Point::new(self.x, self.y + 1)
    }

    pub fn down_neighbour(&self) -> Point {
        Point::new(self.x, self.y - 1)
    }

    /// The four 4-connected neighbours.
    pub fn neighbours(&self) -> [Point; 4] {
        [
            self.left_neighbour(),
            self.right_neighbour(),
            self.up_neighbour(),
            self.down_neighbour(),
        ]
    }

    /// The adjacent cell in the given direction.
    pub fn neighbour(&self, direction: Direction) -> Point {
        match direction {
            Direction::Right => self.right_neighbour(),
            Direction::Up => self.up_neighbour(),
            Direction::Left => self.left_neighbour(),
            Direction::Down => self.down_neighbour(),
        }
    }

    pub fn is_neighbour(&self, other: Point) -> bool {
        (self.x == other.x && (self.y - other.y).abs() == 1)
            || (self.y == other.y && (self.x - other.x).abs() == 1)
    }

    /// Direction from this cell to an adjacent cell, `None` if not adjacent.
    pub fn pitch_to_neighbour(&self, neighbour: Point) -> Option<Direction> {
        match (neighbour.x - self.x, neighbour.y - self.y) {
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            (0, 1) => Some(Direction::Up),
            (0, -1) => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn manhattan(&self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive bounding box of the map elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_to_neighbour_follows_axis_convention() {
        let p = Point::new(5, 5);
        assert_eq!(p.pitch_to_neighbour(Point::new(6, 5)), Some(Direction::Right));
        assert_eq!(p.pitch_to_neighbour(Point::new(4, 5)), Some(Direction::Left));
        assert_eq!(p.pitch_to_neighbour(Point::new(5, 6)), Some(Direction::Up));
        assert_eq!(p.pitch_to_neighbour(Point::new(5, 4)), Some(Direction::Down));
        assert_eq!(p.pitch_to_neighbour(Point::new(6, 6)), None);
        assert_eq!(p.pitch_to_neighbour(p), None);
    }

    #[test]
    fn neighbour_inverts_pitch_to_neighbour() {
        let p = Point::new(3, 7);
        for direction in [Direction::Right, Direction::Up, Direction::Left, Direction::Down] {
            assert_eq!(p.pitch_to_neighbour(p.neighbour(direction)), Some(direction));
        }
    }

    #[test]
    fn neighbourhood_and_distance() {
        let p = Point::new(2, 2);
        assert!(p.is_neighbour(Point::new(1, 2)));
        assert!(p.is_neighbour(Point::new(2, 3)));
        assert!(!p.is_neighbour(Point::new(3, 3)));
        assert!(!p.is_neighbour(p));
        assert_eq!(p.manhattan(Point::new(5, 4)), 5);
        assert_eq!(p.manhattan(p), 0);
    }

    #[test]
    fn direction_degrees_round_trip() {
        for (s, direction) in [
            ("0", Direction::Right),
            ("90", Direction::Up),
            ("180", Direction::Left),
            ("270", Direction::Down),
        ] {
            assert_eq!(Direction::from_degrees(s), direction);
            assert_eq!(direction.degrees().to_string(), s);
        }
        assert_eq!(Direction::from_degrees(""), Direction::Right);
        assert_eq!(Direction::from_degrees("45"), Direction::Right);
    }
}
