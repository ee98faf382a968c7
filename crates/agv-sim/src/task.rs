//! Transport tasks.

use crate::geometry::Point;

/// Start points to the right of this column take their pickup lane on the
/// left side; the rest on the right. Pickup lanes face the interior of the
/// warehouse.
const PICKUP_MIDLINE_X: i32 = 10;

/// Task urgency. High-priority tasks promote their pickup queue during
/// assignment and are flagged as emergencies in the trajectory log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Normal,
    High,
}

/// A transport request as it appears in the task file.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task_id: String,
    pub start_point: String,
    pub end_point: String,
    pub priority: TaskPriority,
    pub remaining_time: Option<u32>,
}

/// A task enriched with grid positions and scheduling state.
#[derive(Debug, Clone)]
pub struct Task {
    pub task_id: String,
    pub start_point: String,
    pub end_point: String,
    pub priority: TaskPriority,
    pub remaining_time: Option<u32>,
    pub start_position: Point,
    pub end_position: Point,
    /// Cell a vehicle must occupy to pick the load up, one step sideways
    /// from the start point.
    pub pickup_position: Point,
    /// Index of the carrying AGV in the context, set when the task is loaded.
    pub agv: Option<usize>,
    pub start_timestamp: u64,
    pub complete_timestamp: u64,
    pub is_completed: bool,
}

impl Task {
    pub fn new(record: TaskRecord, start_position: Point, end_position: Point) -> Self {
        let pickup_position = if start_position.x > PICKUP_MIDLINE_X {
            start_position.left_neighbour()
        } else {
            start_position.right_neighbour()
        };
        Self {
            task_id: record.task_id,
            start_point: record.start_point,
            end_point: record.end_point,
            priority: record.priority,
            remaining_time: record.remaining_time,
            start_position,
            end_position,
            pickup_position,
            agv: None,
            start_timestamp: 0,
            complete_timestamp: 0,
            is_completed: false,
        }
    }

    /// Not yet picked up by any vehicle.
    pub fn is_pending(&self) -> bool {
        self.agv.is_none()
    }

    /// Picked up but not yet delivered.
    pub fn is_running(&self) -> bool {
        !self.is_pending() && !self.is_completed
    }

    pub fn load_by(&mut self, agv: usize, timestamp: u64) {
        self.agv = Some(agv);
        self.start_timestamp = timestamp;
    }

    pub fn unload(&mut self, timestamp: u64) {
        self.complete_timestamp = timestamp;
        self.is_completed = true;
    }
}
