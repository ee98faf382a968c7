//! End-to-end run driver.

use std::path::Path;

use log::info;

use crate::context::AgvContext;
use crate::error::Error;
use crate::parsers;
use crate::scheduler::{Scheduler, SimConfig};

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks it took to deliver every task.
    pub ticks: u64,
    pub completed_tasks: usize,
    /// Rows written to the trajectory file.
    pub records: usize,
}

/// Loads the map and task files, schedules the fleet to completion and
/// writes the trajectory log.
pub fn run(
    map_path: &Path,
    tasks_path: &Path,
    output_path: &Path,
    config: SimConfig,
) -> Result<RunSummary, Error> {
    let map_elements = parsers::read_map_elements(map_path)?;
    let task_records = parsers::read_task_records(tasks_path)?;

    let context = AgvContext::new(map_elements, task_records)?;
    info!(
        "created context with {} AGVs and {} tasks",
        context.agvs.len(),
        context.tasks.len()
    );

    let mut scheduler = Scheduler::new(context, config);
    scheduler.run_to_completion()?;
    let ticks = scheduler.timestamp();
    let context = scheduler.into_context();
    info!("all tasks completed in {}s", ticks);

    context.recorder.save_to_csv(output_path)?;
    info!(
        "trajectory saved to {} ({} records)",
        output_path.display(),
        context.recorder.len()
    );

    Ok(RunSummary {
        ticks,
        completed_tasks: context.completed_task_count(),
        records: context.recorder.len(),
    })
}
