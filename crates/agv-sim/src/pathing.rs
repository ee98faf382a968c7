//! Orientation-aware path planning.

use std::collections::{HashMap, HashSet};

use crate::geometry::{Direction, Point};
use crate::pqueue::PriorityQueue;

/// Time cost of moving to an adjacent cell, in seconds.
pub const MOVE_COST: u32 = 1;
/// Time cost of rotating to a new orientation, in seconds.
pub const TURN_COST: u32 = 1;

/// Grid extent; cells are numbered `1..=width` × `1..=height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            width: 21,
            height: 21,
        }
    }
}

impl GridSize {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= 1 && point.x <= self.width && point.y >= 1 && point.y <= self.height
    }
}

/// A path cell together with the cumulative time needed to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTimePoint {
    pub position: Point,
    pub time_cost: u32,
}

type State = (Point, Direction);

struct Node {
    cost: u32,
    position: Point,
    orientation: Direction,
    parent: Option<State>,
}

/// A* over `(position, orientation)` states with unit move and turn costs.
///
/// Stepping into a cell in a direction other than the current orientation
/// costs an extra [`TURN_COST`]. The visited set is keyed on the full state
/// pair: the same cell entered with different orientations leads to different
/// turn costs downstream, and collapsing them yields suboptimal paths. The
/// Manhattan heuristic ignores turns and therefore never overestimates.
///
/// Returns the cell sequence from `start` to `goal` inclusive, or an empty
/// vector when the goal is unreachable.
pub fn find_path(
    start: Point,
    goal: Point,
    orientation: Direction,
    obstacles: &HashSet<Point>,
    grid: GridSize,
) -> Vec<Point> {
    let mut frontier = PriorityQueue::new();
    frontier.enqueue(
        Node {
            cost: 0,
            position: start,
            orientation,
            parent: None,
        },
        start.manhattan(goal),
    );
    // Parent of each state, recorded when the state is popped. Parents travel
    // inside the frontier entries, so a state pushed several times keeps the
    // parent of the entry that actually wins the pop.
    let mut visited: HashMap<State, Option<State>> = HashMap::new();

    while let Some(node) = frontier.dequeue() {
        let state = (node.position, node.orientation);

        // The goal test happens on pop, not on generation, for optimality.
        if node.position == goal {
            visited.insert(state, node.parent);
            return reconstruct(&visited, state);
        }

        if visited.contains_key(&state) {
            continue;
        }
        visited.insert(state, node.parent);

        for direction in [Direction::Right, Direction::Left, Direction::Up, Direction::Down] {
            let next = node.position.neighbour(direction);
            if !grid.contains(next) || obstacles.contains(&next) {
                continue;
            }
            if visited.contains_key(&(next, direction)) {
                continue;
            }
            let turn_cost = if direction != node.orientation { TURN_COST } else { 0 };
            let cost = node.cost + MOVE_COST + turn_cost;
            frontier.enqueue(
                Node {
                    cost,
                    position: next,
                    orientation: direction,
                    parent: Some(state),
                },
                cost + next.manhattan(goal),
            );
        }
    }

    Vec::new()
}

fn reconstruct(visited: &HashMap<State, Option<State>>, goal: State) -> Vec<Point> {
    let mut path = vec![goal.0];
    let mut state = goal;
    while let Some(parent) = visited[&state] {
        path.push(parent.0);
        state = parent;
    }
    path.reverse();
    path
}

/// Annotates a path with cumulative arrival times, starting from
/// `initial_pitch`.
///
/// The first element carries time 0; each subsequent step adds [`MOVE_COST`]
/// plus [`TURN_COST`] whenever the step direction differs from the running
/// orientation. The final cumulative time equals the planner's g-value for
/// the same path.
pub fn path_timing(path: &[Point], initial_pitch: Direction) -> Vec<PathTimePoint> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut result = Vec::with_capacity(path.len());
    result.push(PathTimePoint {
        position: path[0],
        time_cost: 0,
    });
    let mut time = 0;
    let mut pitch = initial_pitch;
    for window in path.windows(2) {
        let (from, to) = (window[0], window[1]);
        let step_pitch = from.pitch_to_neighbour(to).unwrap();
        if step_pitch != pitch {
            time += TURN_COST;
            pitch = step_pitch;
        }
        time += MOVE_COST;
        result.push(PathTimePoint {
            position: to,
            time_cost: time,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(start: (i32, i32), goal: (i32, i32), pitch: Direction, obstacles: &[(i32, i32)]) -> Vec<Point> {
        let obstacles: HashSet<Point> = obstacles.iter().map(|&(x, y)| Point::new(x, y)).collect();
        find_path(
            Point::new(start.0, start.1),
            Point::new(goal.0, goal.1),
            pitch,
            &obstacles,
            GridSize::default(),
        )
    }

    #[test]
    fn start_equals_goal_yields_single_point() {
        let path = plan((4, 4), (4, 4), Direction::Left, &[]);
        assert_eq!(path, vec![Point::new(4, 4)]);
        let timing = path_timing(&path, Direction::Left);
        assert_eq!(timing.len(), 1);
        assert_eq!(timing[0].time_cost, 0);
    }

    #[test]
    fn straight_line_has_no_turn_cost() {
        let path = plan((1, 1), (5, 1), Direction::Right, &[]);
        assert_eq!(path.len(), 5);
        let timing = path_timing(&path, Direction::Right);
        assert_eq!(timing.last().unwrap().time_cost, 4);
    }

    #[test]
    fn diagonal_goal_costs_one_turn() {
        // Any monotone path from (1,1) to (3,3) has 4 moves and one bend.
        let path = plan((1, 1), (3, 3), Direction::Right, &[]);
        assert_eq!(path.len(), 5);
        let timing = path_timing(&path, Direction::Right);
        assert_eq!(timing.last().unwrap().time_cost, 5);
    }

    #[test]
    fn initial_orientation_changes_the_route_cost() {
        let up = path_timing(&plan((1, 1), (3, 3), Direction::Up, &[]), Direction::Up);
        // Facing up, going up first avoids an extra initial turn.
        assert_eq!(up.last().unwrap().time_cost, 5);
        let down = path_timing(&plan((1, 1), (3, 3), Direction::Down, &[]), Direction::Down);
        // Facing away from the goal, one extra turn is unavoidable.
        assert_eq!(down.last().unwrap().time_cost, 6);
    }

    #[test]
    fn obstructed_goal_is_unreachable() {
        let path = plan((1, 1), (3, 1), Direction::Right, &[(3, 1)]);
        assert!(path.is_empty());
        assert!(path_timing(&path, Direction::Right).is_empty());
    }

    #[test]
    fn walled_off_goal_drains_the_frontier() {
        let path = plan((1, 1), (5, 5), Direction::Right, &[(4, 5), (6, 5), (5, 4), (5, 6)]);
        assert!(path.is_empty());
    }

    #[test]
    fn planner_routes_around_obstacles() {
        let path = plan((1, 1), (5, 1), Direction::Right, &[(3, 1)]);
        assert!(!path.is_empty());
        assert!(!path.contains(&Point::new(3, 1)));
        assert_eq!(*path.first().unwrap(), Point::new(1, 1));
        assert_eq!(*path.last().unwrap(), Point::new(5, 1));
        for window in path.windows(2) {
            assert!(window[0].is_neighbour(window[1]));
        }
    }

    #[test]
    fn repeated_planning_is_deterministic() {
        let first = plan((2, 2), (9, 7), Direction::Up, &[(5, 5), (6, 4)]);
        for _ in 0..5 {
            assert_eq!(plan((2, 2), (9, 7), Direction::Up, &[(5, 5), (6, 4)]), first);
        }
    }

    #[test]
    fn timing_matches_step_costs() {
        let path = vec![
            Point::new(1, 1),
            Point::new(2, 1),
            Point::new(2, 2),
            Point::new(2, 3),
            Point::new(3, 3),
        ];
        let timing = path_timing(&path, Direction::Right);
        let costs: Vec<u32> = timing.iter().map(|ptp| ptp.time_cost).collect();
        // Move, turn+move, move, turn+move.
        assert_eq!(costs, vec![0, 1, 3, 4, 6]);
    }

    #[test]
    fn cells_outside_the_grid_are_rejected() {
        // The direct column is blocked, so the detour must stay inside the
        // 1..=21 range instead of cutting through x = 0.
        let path = plan((1, 1), (1, 3), Direction::Up, &[(1, 2), (2, 2)]);
        assert!(!path.is_empty());
        assert!(path.iter().all(|p| p.x >= 1 && p.y >= 1));
    }
}
