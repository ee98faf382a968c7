//! Simulation world state.

use std::cmp::Reverse;
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::agv::Agv;
use crate::error::Error;
use crate::geometry::{Direction, Point, Rect};
use crate::map::{map_bounds, MapElement, MapElementKind};
use crate::task::{Task, TaskPriority, TaskRecord};
use crate::trajectory::TrajectoryRecorder;

/// Middle row of the warehouse; pickups on it are deprioritised by the
/// compound task order so traffic spreads to the outer rows first.
const MIDDLE_ROW_Y: i32 = 10;

/// The simulation world: map elements, tasks, vehicles, fixed obstacles and
/// the trajectory recorder. The context owns everything; the scheduler takes
/// it over for the duration of a run.
#[derive(Debug)]
pub struct AgvContext {
    pub map_elements: Vec<MapElement>,
    pub tasks: Vec<Task>,
    pub agvs: Vec<Agv>,
    /// Every start/end cell plus a one-cell ring around the map bounding box.
    pub fixed_obstacles: HashSet<Point>,
    pub bounds: Rect,
    pub recorder: TrajectoryRecorder,
}

impl AgvContext {
    /// Builds the world from parsed map elements and task records.
    ///
    /// Tasks are enriched with the grid positions of their named start and
    /// end points; a dangling name fails with [`Error::ElementNotFound`].
    /// The initial fleet state is recorded at timestamp 0.
    pub fn new(map_elements: Vec<MapElement>, task_records: Vec<TaskRecord>) -> Result<Self, Error> {
        let mut tasks = Vec::with_capacity(task_records.len());
        for record in task_records {
            let start_position =
                position_by_name(&map_elements, MapElementKind::StartPoint, &record.start_point)?;
            let end_position =
                position_by_name(&map_elements, MapElementKind::EndPoint, &record.end_point)?;
            tasks.push(Task::new(record, start_position, end_position));
        }

        let agvs: Vec<Agv> = map_elements
            .iter()
            .filter(|element| element.kind == MapElementKind::Agv)
            .map(|element| {
                Agv::new(
                    &element.name,
                    element.position(),
                    element.pitch.unwrap_or(Direction::Right),
                )
            })
            .collect();

        let bounds = map_bounds(&map_elements);
        let mut fixed_obstacles: HashSet<Point> = map_elements
            .iter()
            .filter(|element| {
                matches!(element.kind, MapElementKind::StartPoint | MapElementKind::EndPoint)
            })
            .map(MapElement::position)
            .collect();
        for x in bounds.left - 1..=bounds.right + 1 {
            fixed_obstacles.insert(Point::new(x, bounds.bottom - 1));
            fixed_obstacles.insert(Point::new(x, bounds.top + 1));
        }
        for y in bounds.bottom - 1..=bounds.top + 1 {
            fixed_obstacles.insert(Point::new(bounds.left - 1, y));
            fixed_obstacles.insert(Point::new(bounds.right + 1, y));
        }

        let mut recorder = TrajectoryRecorder::new();
        recorder.record(0, &agvs, &tasks);

        Ok(Self {
            map_elements,
            tasks,
            agvs,
            fixed_obstacles,
            bounds,
            recorder,
        })
    }

    pub fn all_tasks_completed(&self) -> bool {
        self.tasks.iter().all(|task| task.is_completed)
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_completed).count()
    }

    /// Indices of pending tasks in compound priority order.
    ///
    /// Tasks are grouped by start point, file order preserved within a group.
    /// The sort key is, in order: position within the group, task priority,
    /// whether the group contains any high-priority task, group size (larger
    /// backlogs first), and finally whether the pickup sits on the middle
    /// row. The result is recomputed from scratch on every call.
    pub fn sorted_pending_tasks(&self) -> Vec<usize> {
        let mut pending: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.is_pending())
            .map(|(index, _)| index)
            .collect();

        let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for &index in &pending {
            groups
                .entry(self.tasks[index].start_point.as_str())
                .or_default()
                .push(index);
        }

        pending.sort_by_key(|&index| {
            let task = &self.tasks[index];
            let group = &groups[task.start_point.as_str()];
            let sequence = group.iter().position(|&i| i == index).unwrap();
            let has_high = group
                .iter()
                .any(|&i| self.tasks[i].priority == TaskPriority::High);
            let on_middle_row = task.pickup_position.y == MIDDLE_ROW_Y;
            (
                sequence,
                Reverse(task.priority),
                Reverse(has_high),
                Reverse(group.len()),
                on_middle_row,
            )
        });
        pending
    }
}

fn position_by_name(
    elements: &[MapElement],
    kind: MapElementKind,
    name: &str,
) -> Result<Point, Error> {
    elements
        .iter()
        .find(|element| element.kind == kind && element.name == name)
        .map(MapElement::position)
        .ok_or_else(|| Error::ElementNotFound {
            kind,
            name: name.to_string(),
        })
}
