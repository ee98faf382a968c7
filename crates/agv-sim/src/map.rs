//! Map elements.

use itertools::Itertools;

use crate::geometry::{Direction, Point, Rect};

/// Kind of a map element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapElementKind {
    /// Pickup lane of a warehouse rack.
    StartPoint,
    /// Delivery cell.
    EndPoint,
    /// Initial pose of a vehicle.
    Agv,
}

/// A single row of the map file.
#[derive(Debug, Clone)]
pub struct MapElement {
    pub kind: MapElementKind,
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Initial orientation, only meaningful for [`MapElementKind::Agv`] rows.
    pub pitch: Option<Direction>,
}

impl MapElement {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Bounding box over all map elements; zero rect for an empty map.
pub fn map_bounds(elements: &[MapElement]) -> Rect {
    let (left, right) = match elements.iter().map(|e| e.x).minmax().into_option() {
        Some(minmax) => minmax,
        None => return Rect::default(),
    };
    let (bottom, top) = elements.iter().map(|e| e.y).minmax().into_option().unwrap();
    Rect {
        left,
        bottom,
        right,
        top,
    }
}
