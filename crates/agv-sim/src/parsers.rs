//! CSV readers for map and task files.
//!
//! Headers are accepted in both snake_case and PascalCase, matching the
//! files produced by the warehouse tooling.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::Error;
use crate::geometry::Direction;
use crate::map::{MapElement, MapElementKind};
use crate::task::{TaskPriority, TaskRecord};

#[derive(Debug, Deserialize)]
struct MapRow {
    #[serde(rename = "type", alias = "Type")]
    kind: String,
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "X")]
    x: i32,
    #[serde(alias = "Y")]
    y: i32,
    #[serde(default, alias = "Pitch")]
    pitch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskRow {
    #[serde(alias = "TaskId")]
    task_id: String,
    #[serde(alias = "StartPoint")]
    start_point: String,
    #[serde(alias = "EndPoint")]
    end_point: String,
    #[serde(default, alias = "Priority")]
    priority: Option<String>,
    #[serde(default, alias = "RemainingTime")]
    remaining_time: Option<String>,
}

/// Reads map elements from a CSV file.
pub fn read_map_elements(path: &Path) -> Result<Vec<MapElement>, Error> {
    if !path.exists() {
        return Err(Error::MapFileMissing(path.to_path_buf()));
    }
    let elements = read_map_elements_from(File::open(path)?)?;
    info!("loaded {} map elements from {}", elements.len(), path.display());
    Ok(elements)
}

/// Reads map elements from any CSV source. Rows with an unknown type are
/// skipped; a missing or unrecognized AGV pitch defaults to facing right.
pub fn read_map_elements_from<R: Read>(reader: R) -> Result<Vec<MapElement>, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut elements = Vec::new();
    for row in csv_reader.deserialize() {
        let row: MapRow = row?;
        let kind = match row.kind.trim() {
            "start_point" | "StartPoint" => MapElementKind::StartPoint,
            "end_point" | "EndPoint" => MapElementKind::EndPoint,
            "agv" | "Agv" => MapElementKind::Agv,
            _ => continue,
        };
        let pitch = match kind {
            MapElementKind::Agv => Some(Direction::from_degrees(row.pitch.as_deref().unwrap_or(""))),
            _ => None,
        };
        elements.push(MapElement {
            kind,
            name: row.name.trim().to_string(),
            x: row.x,
            y: row.y,
            pitch,
        });
    }
    Ok(elements)
}

/// Reads task records from a CSV file.
pub fn read_task_records(path: &Path) -> Result<Vec<TaskRecord>, Error> {
    if !path.exists() {
        return Err(Error::TaskFileMissing(path.to_path_buf()));
    }
    let records = read_task_records_from(File::open(path)?)?;
    info!("loaded {} tasks from {}", records.len(), path.display());
    Ok(records)
}

/// Reads task records from any CSV source.
///
/// `priority` maps "High" and "1" to [`TaskPriority::High`] and anything
/// else to normal; `remaining_time` is kept only when it is a plain decimal
/// number.
pub fn read_task_records_from<R: Read>(reader: R) -> Result<Vec<TaskRecord>, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize() {
        let row: TaskRow = row?;
        let priority = match row.priority.as_deref().map(str::trim) {
            Some("High") | Some("1") => TaskPriority::High,
            _ => TaskPriority::Normal,
        };
        let remaining_time = row
            .remaining_time
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
            .and_then(|value| value.parse().ok());
        records.push(TaskRecord {
            task_id: row.task_id.trim().to_string(),
            start_point: row.start_point.trim().to_string(),
            end_point: row.end_point.trim().to_string(),
            priority,
            remaining_time,
        });
    }
    Ok(records)
}
