//! Discrete-time fleet scheduling.
//!
//! Time advances in integer one-second ticks. Each tick runs a fixed
//! pipeline over the fleet: unload, load, move loaded vehicles as a batch,
//! turn loaded vehicles, assign pending tasks to idle vehicles, move the
//! newly assigned ones, and park whoever is left once the backlog is empty.
//! An AGV acts at most once per tick; the `handled` set tracks who already
//! did.

use std::collections::HashSet;

use log::{debug, info};

use crate::context::AgvContext;
use crate::error::Error;
use crate::geometry::{Direction, Point};
use crate::pathing::{self, GridSize, PathTimePoint};

/// Scheduler configuration.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Tick ceiling; exceeding it fails the run as deadlocked.
    pub max_timestamp: u64,
    /// Grid extent used for path planning.
    pub grid: GridSize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_timestamp: 400,
            grid: GridSize::default(),
        }
    }
}

/// Drives the fleet one tick at a time until all tasks are delivered.
pub struct Scheduler {
    context: AgvContext,
    config: SimConfig,
    timestamp: u64,
}

impl Scheduler {
    pub fn new(context: AgvContext, config: SimConfig) -> Self {
        Self {
            context,
            config,
            timestamp: 0,
        }
    }

    pub fn context(&self) -> &AgvContext {
        &self.context
    }

    pub fn into_context(self) -> AgvContext {
        self.context
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Runs ticks until every task is completed.
    pub fn run_to_completion(&mut self) -> Result<(), Error> {
        while !self.context.all_tasks_completed() {
            self.tick()?;
        }
        Ok(())
    }

    /// Executes one scheduling step and records the resulting fleet state.
    pub fn tick(&mut self) -> Result<(), Error> {
        if self.timestamp > self.config.max_timestamp {
            return Err(Error::DeadlockExceeded {
                limit: self.config.max_timestamp,
            });
        }
        self.timestamp += 1;

        let mut handled: HashSet<usize> = HashSet::new();

        self.unload_arrived(&mut handled);
        self.load_waiting(&mut handled);

        let loaded: Vec<usize> = (0..self.context.agvs.len())
            .filter(|&index| self.context.agvs[index].is_loaded)
            .collect();
        self.batch_move(&loaded, &mut handled, true, &[]);

        self.turn_loaded(&mut handled);

        let pending = self.context.sorted_pending_tasks();
        let assignments = self.assign_idle(&pending, &handled);
        self.move_assigned(&assignments, &mut handled);

        // With the backlog empty, surviving traffic is only deliveries; idle
        // vehicles head for the map edges so they cannot wall anyone in.
        if pending.is_empty() {
            self.park_idle(&handled);
        }

        info!(
            "[AGV scheduler] {}s, completed {} tasks",
            self.timestamp,
            self.context.completed_task_count()
        );
        let AgvContext {
            recorder,
            agvs,
            tasks,
            ..
        } = &mut self.context;
        recorder.record(self.timestamp, agvs, tasks);
        Ok(())
    }

    /// Phase 1: vehicles adjacent to their delivery cell drop their load.
    fn unload_arrived(&mut self, handled: &mut HashSet<usize>) {
        for index in 0..self.context.agvs.len() {
            if handled.contains(&index) {
                continue;
            }
            let agv = &self.context.agvs[index];
            let task_index = match agv.task {
                Some(task_index) if agv.can_unload(&self.context.tasks[task_index]) => task_index,
                _ => continue,
            };
            self.context.tasks[task_index].unload(self.timestamp);
            self.context.agvs[index].unload();
            handled.insert(index);
            debug!(
                "[AGV scheduler] {}s, {} delivered task {}",
                self.timestamp, self.context.agvs[index].name, self.context.tasks[task_index].task_id
            );
        }
    }

    /// Phase 2: empty vehicles standing on a pickup cell take the task.
    fn load_waiting(&mut self, handled: &mut HashSet<usize>) {
        let pending = self.context.sorted_pending_tasks();
        for index in 0..self.context.agvs.len() {
            if handled.contains(&index) || self.context.agvs[index].is_loaded {
                continue;
            }
            for &task_index in &pending {
                if self.context.tasks[task_index].pickup_position == self.context.agvs[index].position {
                    self.context.agvs[index].load(task_index);
                    self.context.tasks[task_index].load_by(index, self.timestamp);
                    handled.insert(index);
                    debug!(
                        "[AGV scheduler] {}s, {} loaded task {}",
                        self.timestamp,
                        self.context.agvs[index].name,
                        self.context.tasks[task_index].task_id
                    );
                    break;
                }
            }
        }
    }

    /// Phase 4: loaded vehicles that could not move straight rotate towards
    /// their next path cell.
    fn turn_loaded(&mut self, handled: &mut HashSet<usize>) {
        for index in 0..self.context.agvs.len() {
            if handled.contains(&index) || !self.context.agvs[index].is_loaded {
                continue;
            }
            if self.context.agvs[index].should_turn() {
                self.context.agvs[index].turn(None);
                handled.insert(index);
            }
        }
    }

    /// Phase 5: plans every idle vehicle against every pending task, in
    /// compound task order, and picks the fastest vehicle per task.
    ///
    /// Returns `(agv, task)` pairs in assignment order. The winning vehicle
    /// is claimed even when its best path is empty; it then sits out the
    /// tick while the unreachable task stays pending.
    fn assign_idle(&mut self, pending: &[usize], handled: &HashSet<usize>) -> Vec<(usize, usize)> {
        let mut assignments: Vec<(usize, usize)> = Vec::new();
        let mut idle: Vec<usize> = (0..self.context.agvs.len())
            .filter(|index| !handled.contains(index) && !self.context.agvs[*index].is_loaded)
            .collect();

        for &task_index in pending {
            if idle.is_empty() {
                break;
            }
            let options: Vec<(usize, Vec<PathTimePoint>)> = idle
                .iter()
                .map(|&agv_index| {
                    let path = self.plan_to_pickup(agv_index, task_index);
                    let timing = pathing::path_timing(&path, self.context.agvs[agv_index].pitch);
                    (agv_index, timing)
                })
                .collect();
            // Shortest total travel time wins; ties go to the earliest
            // vehicle in declaration order.
            let best = options
                .into_iter()
                .min_by_key(|(_, timing)| timing.last().map_or(u32::MAX, |ptp| ptp.time_cost));
            if let Some((agv_index, timing)) = best {
                idle.retain(|&index| index != agv_index);
                let total_time = timing.last().map(|ptp| ptp.time_cost);
                self.context.agvs[agv_index].path_time_points = timing;
                if let Some(total_time) = total_time {
                    debug!(
                        "[AGV scheduler] {}s, assigned task {} to {} ({}s away)",
                        self.timestamp,
                        self.context.tasks[task_index].task_id,
                        self.context.agvs[agv_index].name,
                        total_time
                    );
                    assignments.push((agv_index, task_index));
                }
            }
        }
        assignments
    }

    /// Phase 6: newly assigned vehicles rotate towards their first step or
    /// join a batched move.
    fn move_assigned(&mut self, assignments: &[(usize, usize)], handled: &mut HashSet<usize>) {
        let mut movers: Vec<usize> = Vec::new();
        for &(index, _) in assignments {
            if self.context.agvs[index].should_turn() {
                self.context.agvs[index].turn(None);
            } else if self.context.agvs[index].should_move() {
                movers.push(index);
            }
        }
        self.batch_move(&movers, handled, false, assignments);
    }

    /// Serializes the moves of a batch of vehicles, resolving conflicts.
    ///
    /// Each unhandled candidate replans against the current obstacle
    /// picture, skips if the fresh path is degenerate or starts with a turn,
    /// and otherwise either performs a cross-lock avoidance turn or commits
    /// the move. The pass repeats until it makes no progress, so a vehicle
    /// blocked early can still move once another vehicle has yielded a cell.
    fn batch_move(
        &mut self,
        candidates: &[usize],
        handled: &mut HashSet<usize>,
        loaded: bool,
        assignments: &[(usize, usize)],
    ) {
        // (vehicle, pre-move position, task) of everyone moved in this batch.
        let mut moved: Vec<(usize, Point, usize)> = Vec::new();

        loop {
            let mut progress = false;

            for &index in candidates {
                if handled.contains(&index) || self.context.agvs[index].is_loaded != loaded {
                    continue;
                }
                let task_index = if loaded {
                    match self.context.agvs[index].task {
                        Some(task_index) => task_index,
                        None => continue,
                    }
                } else {
                    match assignments.iter().find(|&&(agv, _)| agv == index) {
                        Some(&(_, task_index)) => task_index,
                        None => continue,
                    }
                };

                let path = if loaded {
                    self.plan_to_end_point(index, task_index)
                } else {
                    self.plan_to_pickup(index, task_index)
                };
                let timing = pathing::path_timing(&path, self.context.agvs[index].pitch);
                self.context.agvs[index].path_time_points = timing;

                if self.context.agvs[index].path_time_points.len() < 2 {
                    continue;
                }
                if !self.context.agvs[index].should_move() {
                    // Misaligned; a later phase will turn it.
                    continue;
                }

                if let Some(direction) = self.cross_lock_turn(index, task_index, &moved) {
                    let agv = &mut self.context.agvs[index];
                    agv.turn(Some(direction));
                    agv.path_time_points.clear();
                    handled.insert(index);
                    progress = true;
                    debug!(
                        "[AGV scheduler] {}s, {} turned {:?} to break a cross lock",
                        self.timestamp, self.context.agvs[index].name, direction
                    );
                    continue;
                }

                let pre_move = self.context.agvs[index].position;
                moved.push((index, pre_move, task_index));
                handled.insert(index);
                self.context.agvs[index].move_step();
                progress = true;
            }

            if !progress {
                break;
            }
        }
    }

    /// Cross-lock test against vehicles already moved in this batch.
    ///
    /// Two same-pitch vehicles on adjacent rows (or columns) routing into
    /// opposing perpendicular half-planes would deadlock if both kept
    /// straight; the one processed later turns towards the other's row
    /// instead of moving.
    fn cross_lock_turn(
        &self,
        index: usize,
        task_index: usize,
        moved: &[(usize, Point, usize)],
    ) -> Option<Direction> {
        let agv = &self.context.agvs[index];
        let end = self.context.tasks[task_index].end_position;
        for &(moved_index, moved_pos, moved_task) in moved {
            let moved_agv = &self.context.agvs[moved_index];
            if moved_agv.pitch != agv.pitch {
                continue;
            }
            let moved_end = self.context.tasks[moved_task].end_position;
            match agv.pitch {
                Direction::Left | Direction::Right => {
                    if moved_pos.x == agv.position.x
                        && moved_pos.y == agv.position.y + 1
                        && end.y > agv.position.y
                        && moved_end.y <= moved_agv.position.y
                    {
                        return Some(Direction::Up);
                    }
                    if moved_pos.x == agv.position.x
                        && moved_pos.y == agv.position.y - 1
                        && end.y < agv.position.y
                        && moved_end.y >= moved_agv.position.y
                    {
                        return Some(Direction::Down);
                    }
                }
                Direction::Up | Direction::Down => {
                    if moved_pos.y == agv.position.y
                        && moved_pos.x == agv.position.x - 1
                        && end.x < agv.position.x
                        && moved_end.x >= moved_agv.position.x
                    {
                        return Some(Direction::Left);
                    }
                    if moved_pos.y == agv.position.y
                        && moved_pos.x == agv.position.x + 1
                        && end.x > agv.position.x
                        && moved_end.x <= moved_agv.position.x
                    {
                        return Some(Direction::Right);
                    }
                }
            }
        }
        None
    }

    /// Phase 7: with no pending tasks, leftover vehicles head for the
    /// closest reachable grid edge on their row or column.
    fn park_idle(&mut self, handled: &HashSet<usize>) {
        let unhandled: Vec<usize> = (0..self.context.agvs.len())
            .filter(|index| !handled.contains(index))
            .collect();
        for index in unhandled {
            let obstacles = self.build_obstacles(self.dynamic_obstacles(index), None);
            let position = self.context.agvs[index].position;
            let loaded_positions: Vec<Point> = self
                .context
                .agvs
                .iter()
                .filter(|agv| agv.is_loaded)
                .map(|agv| agv.position)
                .collect();

            // Edge cells on the current row and column, skipping any axis
            // where a loaded vehicle stands in the way. Edge coordinates are
            // fixed for the 21x21 warehouse map.
            let mut candidates: Vec<Point> = Vec::new();
            if !loaded_positions.iter().any(|p| p.x == position.x && p.y > position.y) {
                candidates.push(Point::new(position.x, 20));
            }
            if !loaded_positions.iter().any(|p| p.x == position.x && p.y < position.y) {
                candidates.push(Point::new(position.x, 1));
            }
            if !loaded_positions.iter().any(|p| p.x > position.x && p.y == position.y) {
                candidates.push(Point::new(20, position.y));
            }
            if !loaded_positions.iter().any(|p| p.x < position.x && p.y == position.y) {
                candidates.push(Point::new(1, position.y));
            }

            let goal = candidates
                .into_iter()
                .min_by_key(|cell| cell.manhattan(position));
            if let Some(goal) = goal {
                let pitch = self.context.agvs[index].pitch;
                let path = pathing::find_path(position, goal, pitch, &obstacles, self.config.grid);
                let agv = &mut self.context.agvs[index];
                agv.path_time_points = pathing::path_timing(&path, pitch);
                if agv.should_move() {
                    agv.move_step();
                } else if agv.should_turn() {
                    agv.turn(None);
                }
            }
        }
    }

    fn plan_to_pickup(&self, index: usize, task_index: usize) -> Vec<Point> {
        let obstacles = self.build_obstacles(self.dynamic_obstacles(index), None);
        let agv = &self.context.agvs[index];
        pathing::find_path(
            agv.position,
            self.context.tasks[task_index].pickup_position,
            agv.pitch,
            &obstacles,
            self.config.grid,
        )
    }

    /// The delivery cell itself is carved out of the obstacle set here; the
    /// planner could never arrive otherwise.
    fn plan_to_end_point(&self, index: usize, task_index: usize) -> Vec<Point> {
        let goal = self.context.tasks[task_index].end_position;
        let obstacles = self.build_obstacles(self.dynamic_obstacles(index), Some(goal));
        let agv = &self.context.agvs[index];
        pathing::find_path(agv.position, goal, agv.pitch, &obstacles, self.config.grid)
    }

    fn build_obstacles(&self, additional: Vec<Point>, carve: Option<Point>) -> HashSet<Point> {
        let mut obstacles = self.context.fixed_obstacles.clone();
        obstacles.extend(additional);
        if let Some(cell) = carve {
            obstacles.remove(&cell);
        }
        obstacles
    }

    /// Obstacles induced by the rest of the fleet, as seen from one vehicle.
    fn dynamic_obstacles(&self, index: usize) -> Vec<Point> {
        let agvs = &self.context.agvs;
        let position = agvs[index].position;
        let occupied: HashSet<Point> = agvs.iter().map(|agv| agv.position).collect();

        let mut obstacles: Vec<Point> = position
            .neighbours()
            .iter()
            .copied()
            .filter(|cell| occupied.contains(cell))
            .collect();

        // Cross-lock pre-emption: a vehicle down to a single free neighbour
        // must keep that escape cell. Stepping into it from here would lock
        // both vehicles crosswise.
        for (other_index, other) in agvs.iter().enumerate() {
            if other_index == index {
                continue;
            }
            let mut free: Vec<Point> = other
                .position
                .neighbours()
                .iter()
                .copied()
                .filter(|cell| !self.context.fixed_obstacles.contains(cell))
                .collect();
            for (third_index, third) in agvs.iter().enumerate() {
                if third_index != other_index && third.position.is_neighbour(other.position) {
                    free.retain(|&cell| cell != third.position);
                }
            }
            if free.len() == 1 && position.is_neighbour(free[0]) {
                obstacles.push(free[0]);
            }
        }

        obstacles
    }
}
