//! Trajectory recording and CSV export.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::agv::Agv;
use crate::error::Error;
use crate::task::{Task, TaskPriority};

/// One vehicle snapshot, one CSV row.
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryRecord {
    pub timestamp: u64,
    pub name: String,
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
    /// Orientation in degrees.
    pub pitch: u16,
    pub loaded: bool,
    /// End point name of the carried task, empty when unloaded.
    pub destination: String,
    /// Whether the carried task is high priority.
    #[serde(rename = "Emergency")]
    pub emergency: bool,
    #[serde(rename = "TaskId")]
    pub task_id: String,
}

/// Collects one snapshot per vehicle per tick, starting at timestamp 0.
#[derive(Debug, Default)]
pub struct TrajectoryRecorder {
    records: Vec<TrajectoryRecord>,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the whole fleet at the given timestamp.
    pub fn record(&mut self, timestamp: u64, agvs: &[Agv], tasks: &[Task]) {
        for agv in agvs {
            let task = agv.task.map(|index| &tasks[index]);
            self.records.push(TrajectoryRecord {
                timestamp,
                name: agv.name.clone(),
                x: agv.position.x,
                y: agv.position.y,
                pitch: agv.pitch.degrees(),
                loaded: agv.is_loaded,
                destination: task.map(|t| t.end_point.clone()).unwrap_or_default(),
                emergency: task.map_or(false, |t| t.priority == TaskPriority::High),
                task_id: task.map(|t| t.task_id.clone()).unwrap_or_default(),
            });
        }
    }

    pub fn records(&self) -> &[TrajectoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes all records to a CSV file, creating missing parent directories.
    pub fn save_to_csv(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = fs::File::create(path)?;
        self.write_csv(file)
    }

    fn write_csv<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &self.records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Direction, Point};
    use crate::task::TaskRecord;

    fn task(task_id: &str, priority: TaskPriority) -> Task {
        Task::new(
            TaskRecord {
                task_id: task_id.to_string(),
                start_point: "S1".to_string(),
                end_point: "E1".to_string(),
                priority,
                remaining_time: None,
            },
            Point::new(5, 5),
            Point::new(15, 5),
        )
    }

    #[test]
    fn loaded_vehicles_report_their_task() {
        let tasks = vec![task("t-7", TaskPriority::High)];
        let mut agv = Agv::new("A1", Point::new(4, 9), Direction::Left);
        agv.load(0);

        let mut recorder = TrajectoryRecorder::new();
        recorder.record(3, &[agv], &tasks);
        let record = &recorder.records()[0];
        assert_eq!(record.timestamp, 3);
        assert_eq!(record.name, "A1");
        assert_eq!((record.x, record.y), (4, 9));
        assert_eq!(record.pitch, 180);
        assert!(record.loaded);
        assert_eq!(record.destination, "E1");
        assert!(record.emergency);
        assert_eq!(record.task_id, "t-7");
    }

    #[test]
    fn unloaded_vehicles_have_empty_task_columns() {
        let agv = Agv::new("A2", Point::new(1, 1), Direction::Right);
        let mut recorder = TrajectoryRecorder::new();
        recorder.record(0, &[agv], &[]);
        let record = &recorder.records()[0];
        assert!(!record.loaded);
        assert!(!record.emergency);
        assert!(record.destination.is_empty());
        assert!(record.task_id.is_empty());
    }

    #[test]
    fn csv_output_has_the_exact_header_and_literals() {
        let tasks = vec![task("t-1", TaskPriority::Normal)];
        let mut loaded = Agv::new("A1", Point::new(2, 3), Direction::Up);
        loaded.load(0);
        let idle = Agv::new("A2", Point::new(7, 8), Direction::Right);

        let mut recorder = TrajectoryRecorder::new();
        recorder.record(0, &[loaded, idle], &tasks);

        let mut buffer = Vec::new();
        recorder.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,name,X,Y,pitch,loaded,destination,Emergency,TaskId"
        );
        assert_eq!(lines.next().unwrap(), "0,A1,2,3,90,true,E1,false,t-1");
        assert_eq!(lines.next().unwrap(), "0,A2,7,8,0,false,,false,");
    }
}
