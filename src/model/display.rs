// File: ./src/model/display.rs
// Projects ClickUp task records into fixed-shape rows for the note table.
use crate::model::item::Task;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Labels the first release of the plugin printed in every priority cell.
pub const LEGACY_PRIORITY_LABELS: [&str; 4] = ["Low", "Medium", "High", "Critical"];

const DATE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// How the priority column is filled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PriorityColumn {
    /// The task's own priority label, or nothing when unset.
    #[default]
    Derived,
    /// The constant label list, whatever the task says.
    Legacy,
}

/// Time zone creation dates are rendered in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DateZone {
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowOptions {
    pub priority: PriorityColumn,
    pub zone: DateZone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub id: String,
    pub order: usize,
    pub name: String,
    pub status: String,
    pub date_created: String,
    pub creator: String,
    pub assignees: Vec<String>,
    pub priority: Vec<String>,
}

/// One row per task, same order, `order` starting at 1.
pub fn map_rows(tasks: &[Task], opts: RowOptions) -> Vec<DisplayRow> {
    tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| DisplayRow {
            id: task.id.clone(),
            order: idx + 1,
            name: task.name.clone(),
            status: task.status.status.clone(),
            date_created: format_created(&task.date_created, opts.zone),
            creator: task.creator.display_name().to_string(),
            assignees: task
                .assignees
                .iter()
                .map(|u| u.display_name().to_string())
                .collect(),
            priority: priority_cell(task, opts.priority),
        })
        .collect()
}

fn priority_cell(task: &Task, mode: PriorityColumn) -> Vec<String> {
    match mode {
        PriorityColumn::Legacy => LEGACY_PRIORITY_LABELS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        PriorityColumn::Derived => task.priority.iter().map(|p| p.label()).collect(),
    }
}

/// Formats an epoch-milliseconds string as `M/D/YYYY, h:mm:ss AM`.
///
/// Values that are not a valid timestamp are passed through untouched.
pub fn format_created(raw: &str, zone: DateZone) -> String {
    let Some(dt) = raw
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
    else {
        return raw.to_string();
    };
    match zone {
        DateZone::Utc => dt.format(DATE_FORMAT).to_string(),
        DateZone::Local => dt.with_timezone(&Local).format(DATE_FORMAT).to_string(),
    }
}
