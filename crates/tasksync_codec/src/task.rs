//! VTODO decoding.

use crate::component::Component;
use crate::contentline::{split_list, ContentLine};
use crate::error::CodecResult;
use crate::Decode;
use serde::{Deserialize, Serialize};

/// Completion status of a task (RFC 5545 §3.8.1.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started.
    NeedsAction,
    /// In progress.
    InProcess,
    /// Done.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl TaskStatus {
    /// Parses a STATUS value; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Some(TaskStatus::NeedsAction),
            "IN-PROCESS" => Some(TaskStatus::InProcess),
            "COMPLETED" => Some(TaskStatus::Completed),
            "CANCELLED" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

/// A DATE or DATE-TIME value, kept in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    /// Raw value, e.g. `20240131` or `20240131T090000Z`.
    pub value: String,
    /// TZID parameter, if any.
    pub tzid: Option<String>,
    /// True for `VALUE=DATE` (or an 8 character value).
    pub all_day: bool,
}

impl DateValue {
    fn from_line(line: &ContentLine) -> Option<Self> {
        let value = line.value.trim();
        if value.is_empty() {
            return None;
        }
        let all_day = line
            .param("VALUE")
            .map(|v| v.eq_ignore_ascii_case("DATE"))
            .unwrap_or(value.len() == 8);

        Some(Self {
            value: value.to_string(),
            tzid: line.param("TZID").map(str::to_string),
            all_day,
        })
    }
}

/// A task (VTODO) decoded from a remote payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Task {
    /// Globally unique identifier.
    pub uid: Option<String>,
    /// Short title.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Related URL.
    pub url: Option<String>,
    /// Completion status.
    pub status: Option<TaskStatus>,
    /// Priority, 0 (undefined) to 9.
    pub priority: Option<u8>,
    /// Percent complete, 0 to 100.
    pub percent_complete: Option<u8>,
    /// Due date.
    pub due: Option<DateValue>,
    /// Start date.
    pub dtstart: Option<DateValue>,
    /// Completion timestamp.
    pub completed: Option<DateValue>,
    /// Categories, in order, without duplicates.
    pub categories: Vec<String>,
    /// Revision sequence.
    pub sequence: u32,
}

impl Task {
    /// Builds a task from a VTODO component.
    ///
    /// Unparseable numeric or enumerated values are dropped rather than
    /// failing the whole task.
    pub fn from_component(todo: &Component) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for line in todo.properties_named("CATEGORIES") {
            for category in split_list(&line.value) {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }

        Self {
            uid: todo.text("UID"),
            summary: todo.text("SUMMARY"),
            description: todo.text("DESCRIPTION"),
            location: todo.text("LOCATION"),
            url: todo.text("URL"),
            status: todo.text("STATUS").as_deref().and_then(TaskStatus::parse),
            priority: todo
                .text("PRIORITY")
                .and_then(|v| v.parse::<u8>().ok())
                .filter(|p| *p <= 9),
            percent_complete: todo
                .text("PERCENT-COMPLETE")
                .and_then(|v| v.parse::<u8>().ok())
                .map(|p| p.min(100)),
            due: todo.property("DUE").and_then(DateValue::from_line),
            dtstart: todo.property("DTSTART").and_then(DateValue::from_line),
            completed: todo.property("COMPLETED").and_then(DateValue::from_line),
            categories,
            sequence: todo
                .text("SEQUENCE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Returns true if the task is marked completed.
    pub fn is_completed(&self) -> bool {
        self.status == Some(TaskStatus::Completed) || self.completed.is_some()
    }
}

impl Decode for Task {
    /// Decodes every VTODO in the payload, in document order.
    fn decode_all(payload: &[u8]) -> CodecResult<Vec<Self>> {
        let roots = Component::parse_all(payload)?;

        let mut todos = Vec::new();
        for root in &roots {
            root.find_all("VTODO", &mut todos);
        }

        Ok(todos.into_iter().map(Task::from_component).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
BEGIN:VTODO\r\n\
UID:task-1@example.com\r\n\
SUMMARY:Write the\r\n  report\r\n\
DESCRIPTION:Line one\\nLine two\r\n\
STATUS:IN-PROCESS\r\n\
PRIORITY:1\r\n\
PERCENT-COMPLETE:40\r\n\
DUE;VALUE=DATE:20240131\r\n\
DTSTART;TZID=Europe/Vienna:20240101T090000\r\n\
CATEGORIES:work,urgent\r\n\
CATEGORIES:work\r\n\
SEQUENCE:3\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn decode_full_task() {
        let tasks = Task::decode_all(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tasks.len(), 1);

        let task = &tasks[0];
        assert_eq!(task.uid.as_deref(), Some("task-1@example.com"));
        assert_eq!(task.summary.as_deref(), Some("Write the report"));
        assert_eq!(task.description.as_deref(), Some("Line one\nLine two"));
        assert_eq!(task.status, Some(TaskStatus::InProcess));
        assert_eq!(task.priority, Some(1));
        assert_eq!(task.percent_complete, Some(40));
        assert_eq!(task.categories, vec!["work", "urgent"]);
        assert_eq!(task.sequence, 3);

        let due = task.due.as_ref().unwrap();
        assert!(due.all_day);
        assert_eq!(due.value, "20240131");

        let start = task.dtstart.as_ref().unwrap();
        assert!(!start.all_day);
        assert_eq!(start.tzid.as_deref(), Some("Europe/Vienna"));
        assert!(!task.is_completed());
    }

    #[test]
    fn decode_multiple_todos_in_order() {
        let payload = "BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:a\nEND:VTODO\nBEGIN:VTODO\nUID:b\nEND:VTODO\nEND:VCALENDAR\n";
        let tasks = Task::decode_all(payload.as_bytes()).unwrap();
        let uids: Vec<_> = tasks.iter().map(|t| t.uid.clone().unwrap()).collect();
        assert_eq!(uids, vec!["a", "b"]);
    }

    #[test]
    fn calendar_without_todo_is_empty() {
        let payload = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:e\nEND:VEVENT\nEND:VCALENDAR\n";
        assert!(Task::decode_all(payload.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn invalid_values_are_dropped() {
        let payload = "BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:x\nPRIORITY:high\nSTATUS:WHATEVER\nPERCENT-COMPLETE:250\nEND:VTODO\nEND:VCALENDAR\n";
        let task = &Task::decode_all(payload.as_bytes()).unwrap()[0];
        assert_eq!(task.priority, None);
        assert_eq!(task.status, None);
        assert_eq!(task.percent_complete, Some(100));
    }

    #[test]
    fn completed_task() {
        let payload = "BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:x\nCOMPLETED:20240102T100000Z\nEND:VTODO\nEND:VCALENDAR\n";
        let task = &Task::decode_all(payload.as_bytes()).unwrap()[0];
        assert!(task.is_completed());
    }

    #[test]
    fn malformed_payload_fails() {
        assert!(Task::decode_all(b"BEGIN:VCALENDAR\nBEGIN:VTODO\n").is_err());
    }
}
