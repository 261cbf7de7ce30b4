use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of units of work a job can perform. Dispatch is a `match`
/// on this enum; there is no name-based lookup at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Screenshot,
    Report,
    Processing,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [TaskKind::Screenshot, TaskKind::Report, TaskKind::Processing];

    pub fn from_name(name: &str) -> Option<TaskKind> {
        match name {
            "screenshot" => Some(TaskKind::Screenshot),
            "report" => Some(TaskKind::Report),
            "processing" => Some(TaskKind::Processing),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Screenshot => "screenshot",
            TaskKind::Report => "report",
            TaskKind::Processing => "processing",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filter requested task names down to the recognized ones, preserving
/// declaration order. Unknown names are dropped silently.
pub fn recognized(names: &[String]) -> Vec<TaskKind> {
    names
        .iter()
        .filter_map(|name| TaskKind::from_name(name))
        .collect()
}
