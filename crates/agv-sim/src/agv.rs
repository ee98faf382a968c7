//! AGV state and primitive actions.

use crate::geometry::{Direction, Point};
use crate::pathing::PathTimePoint;
use crate::task::Task;

/// An automated guided vehicle.
///
/// `path_time_points` always starts at the vehicle's current position with
/// time cost 0; the scheduler replans it whenever the obstacle picture
/// changes.
#[derive(Debug, Clone)]
pub struct Agv {
    pub name: String,
    pub position: Point,
    pub pitch: Direction,
    pub is_loaded: bool,
    /// Index of the carried task in the context, while loaded.
    pub task: Option<usize>,
    pub path_time_points: Vec<PathTimePoint>,
}

impl Agv {
    pub fn new(name: &str, position: Point, pitch: Direction) -> Self {
        Self {
            name: name.to_string(),
            position,
            pitch,
            is_loaded: false,
            task: None,
            path_time_points: Vec::new(),
        }
    }

    /// Attaches a task; the task-side back-reference is kept by the caller.
    pub fn load(&mut self, task: usize) {
        self.is_loaded = true;
        self.task = Some(task);
    }

    /// Drops the load together with the remaining path.
    pub fn unload(&mut self) {
        self.path_time_points.clear();
        self.is_loaded = false;
        self.task = None;
    }

    /// Loaded and standing next to the delivery cell of the carried task.
    pub fn can_unload(&self, task: &Task) -> bool {
        self.is_loaded && self.task.is_some() && self.position.is_neighbour(task.end_position)
    }

    /// Direction required by the next path cell, if the path has one.
    pub fn next_step_pitch(&self) -> Option<Direction> {
        self.path_time_points
            .get(1)
            .and_then(|ptp| self.position.pitch_to_neighbour(ptp.position))
    }

    /// The next path cell requires an orientation change.
    pub fn should_turn(&self) -> bool {
        self.next_step_pitch().map_or(false, |pitch| pitch != self.pitch)
    }

    /// The next path cell lies straight ahead.
    pub fn should_move(&self) -> bool {
        self.next_step_pitch().map_or(false, |pitch| pitch == self.pitch)
    }

    /// Rotates in place. With a specified pitch the path is left untouched;
    /// otherwise the vehicle aligns with its next path cell and the consumed
    /// turn unit is discounted from the pending arrival times.
    pub fn turn(&mut self, specified_pitch: Option<Direction>) {
        if let Some(pitch) = specified_pitch {
            self.pitch = pitch;
            return;
        }
        if let Some(pitch) = self.next_step_pitch() {
            self.pitch = pitch;
            for ptp in self.path_time_points.iter_mut().skip(1) {
                ptp.time_cost -= 1;
            }
        }
    }

    /// Advances one cell along the path, discounting the consumed move unit.
    pub fn move_step(&mut self) {
        if self.path_time_points.len() > 1 {
            self.path_time_points.remove(0);
            self.position = self.path_time_points[0].position;
            for ptp in self.path_time_points.iter_mut() {
                ptp.time_cost -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathing::path_timing;
    use crate::task::{TaskPriority, TaskRecord};

    fn agv_with_path(path: &[Point], pitch: Direction) -> Agv {
        let mut agv = Agv::new("A1", path[0], pitch);
        agv.path_time_points = path_timing(path, pitch);
        agv
    }

    #[test]
    fn move_step_advances_and_rebases_times() {
        let path = [Point::new(2, 2), Point::new(3, 2), Point::new(4, 2)];
        let mut agv = agv_with_path(&path, Direction::Right);
        assert!(agv.should_move());
        assert!(!agv.should_turn());

        agv.move_step();
        assert_eq!(agv.position, Point::new(3, 2));
        assert_eq!(agv.path_time_points[0].position, Point::new(3, 2));
        assert_eq!(agv.path_time_points[0].time_cost, 0);
        assert_eq!(agv.path_time_points[1].time_cost, 1);
    }

    #[test]
    fn turn_aligns_with_the_path_and_discounts_times() {
        let path = [Point::new(2, 2), Point::new(2, 3), Point::new(3, 3)];
        let mut agv = agv_with_path(&path, Direction::Right);
        assert!(agv.should_turn());
        assert_eq!(agv.path_time_points[1].time_cost, 2);

        agv.turn(None);
        assert_eq!(agv.pitch, Direction::Up);
        assert!(agv.should_move());
        assert_eq!(agv.path_time_points[1].time_cost, 1);

        // A specified pitch rotates without touching the path.
        agv.turn(Some(Direction::Left));
        assert_eq!(agv.pitch, Direction::Left);
        assert_eq!(agv.path_time_points[1].time_cost, 1);
    }

    #[test]
    fn empty_or_exhausted_paths_do_nothing() {
        let mut agv = Agv::new("A1", Point::new(5, 5), Direction::Down);
        assert!(!agv.should_move());
        assert!(!agv.should_turn());
        agv.move_step();
        agv.turn(None);
        assert_eq!(agv.position, Point::new(5, 5));
        assert_eq!(agv.pitch, Direction::Down);
    }

    #[test]
    fn can_unload_requires_load_and_adjacency() {
        let task = Task::new(
            TaskRecord {
                task_id: "t1".to_string(),
                start_point: "S1".to_string(),
                end_point: "E1".to_string(),
                priority: TaskPriority::Normal,
                remaining_time: None,
            },
            Point::new(5, 5),
            Point::new(8, 5),
        );
        let mut agv = Agv::new("A1", Point::new(7, 5), Direction::Right);
        assert!(!agv.can_unload(&task));

        agv.load(0);
        assert!(agv.can_unload(&task));

        agv.position = Point::new(6, 5);
        assert!(!agv.can_unload(&task));
    }

    #[test]
    fn load_and_unload_keep_the_flag_and_task_in_sync() {
        let mut agv = Agv::new("A1", Point::new(5, 5), Direction::Right);
        agv.load(3);
        assert!(agv.is_loaded);
        assert_eq!(agv.task, Some(3));
        agv.path_time_points = path_timing(&[Point::new(5, 5), Point::new(6, 5)], Direction::Right);
        agv.unload();
        assert!(!agv.is_loaded);
        assert_eq!(agv.task, None);
        assert!(agv.path_time_points.is_empty());
    }
}
