//! Core type definitions for the Gardener loop

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Fixed number of files after which a project is considered complete
/// and a new one is brainstormed.
pub const PROJECT_FILE_CAP: usize = 5;

/// Event categories, one per producing component plus severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRole {
    System,
    Hosted,
    Local,
    Git,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for LogRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Hosted => write!(f, "hosted"),
            Self::Local => write!(f, "local"),
            Self::Git => write!(f, "git"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single observer-facing event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub role: LogRole,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    pub fn new(role: LogRole, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Producer half of the event channel.
///
/// Cloned into every component. Sending never blocks and never fails the
/// producer: a closed channel (observer gone) drops the event silently.
#[derive(Debug, Clone)]
pub struct EventLog {
    tx: UnboundedSender<LogEvent>,
}

impl EventLog {
    /// Create an event channel, returning the producer and consumer halves
    pub fn channel() -> (Self, UnboundedReceiver<LogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn log(&self, role: LogRole, message: impl Into<String>) {
        let _ = self.tx.send(LogEvent::new(role, message));
    }
}

/// The current unit of generated work, persisted after every mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    /// Filesystem-safe, date-prefixed directory name
    pub folder: String,
    pub description: String,
    /// Insertion order is creation order; names are unique within a project
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub file_count: usize,
}

impl Project {
    /// Build a project from a brainstormed idea, deriving the folder name:
    /// strip everything outside `[A-Za-z0-9_-]` and prefix the local date.
    pub fn from_idea(idea: ProjectIdea, today: NaiveDate) -> Self {
        let safe: String = idea
            .folder_name
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        let safe = if safe.is_empty() {
            "Project".to_string()
        } else {
            safe
        };
        Self {
            name: idea.project_name,
            folder: format!("{}_{}", today.format("%Y%m%d"), safe),
            description: idea.description,
            files: Vec::new(),
            file_count: 0,
        }
    }

    /// A project at or past the file cap gets replaced by a fresh one
    pub fn is_complete(&self) -> bool {
        self.file_count >= PROJECT_FILE_CAP
    }

    /// Disambiguate a proposed filename against the recorded file list.
    ///
    /// Collisions get an incrementing version prefix: `v2_name`, `v3_name`,
    /// and so on until the result is unused.
    pub fn disambiguate(&self, filename: &str) -> String {
        if !self.files.iter().any(|f| f == filename) {
            return filename.to_string();
        }
        let mut version = 2usize;
        loop {
            let candidate = format!("v{}_{}", version, filename);
            if !self.files.iter().any(|f| f == &candidate) {
                return candidate;
            }
            version += 1;
        }
    }

    /// Record a successfully committed file
    pub fn record_file(&mut self, filename: impl Into<String>) {
        self.files.push(filename.into());
        self.file_count = self.files.len();
    }
}

/// Daily commit counter; the count is only meaningful for the stored date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuota {
    pub date: NaiveDate,
    pub count: u32,
}

/// Structured payload expected from a project brainstorm response
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectIdea {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_project_name() -> String {
    "Unnamed".to_string()
}

fn default_folder_name() -> String {
    "Project".to_string()
}

fn default_description() -> String {
    "A small tool".to_string()
}

/// Structured payload expected from a next-file proposal response
#[derive(Debug, Clone, Deserialize)]
pub struct FileTask {
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default = "default_file_description")]
    pub description: String,
    #[serde(default = "default_code_prompt")]
    pub code_prompt: String,
}

fn default_filename() -> String {
    "utils.py".to_string()
}

fn default_file_description() -> String {
    "Utility".to_string()
}

fn default_code_prompt() -> String {
    "Write code".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea(folder: &str) -> ProjectIdea {
        ProjectIdea {
            project_name: "Log Parser".to_string(),
            folder_name: folder.to_string(),
            description: "Parses logs".to_string(),
        }
    }

    #[test]
    fn test_folder_derivation_strips_and_prefixes() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        let project = Project::from_idea(idea("Log Parser! (v1)"), today);
        assert_eq!(project.folder, "20260831_LogParserv1");
    }

    #[test]
    fn test_folder_derivation_keeps_underscore_and_hyphen() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let project = Project::from_idea(idea("log_parser-2"), today);
        assert_eq!(project.folder, "20260102_log_parser-2");
    }

    #[test]
    fn test_folder_derivation_empty_falls_back() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let project = Project::from_idea(idea("!!!"), today);
        assert_eq!(project.folder, "20260102_Project");
    }

    #[test]
    fn test_disambiguate_no_collision() {
        let project = Project::default();
        assert_eq!(project.disambiguate("main.py"), "main.py");
    }

    #[test]
    fn test_disambiguate_single_collision() {
        let mut project = Project::default();
        project.record_file("main.py");
        assert_eq!(project.disambiguate("main.py"), "v2_main.py");
    }

    #[test]
    fn test_disambiguate_double_collision() {
        let mut project = Project::default();
        project.record_file("main.py");
        project.record_file("v2_main.py");
        assert_eq!(project.disambiguate("main.py"), "v3_main.py");
    }

    #[test]
    fn test_record_file_keeps_count_in_sync() {
        let mut project = Project::default();
        project.record_file("a.py");
        project.record_file("b.py");
        assert_eq!(project.file_count, 2);
        assert_eq!(project.files, vec!["a.py", "b.py"]);
        assert!(!project.is_complete());
        for name in ["c.py", "d.py", "e.py"] {
            project.record_file(name);
        }
        assert!(project.is_complete());
    }

    #[tokio::test]
    async fn test_event_log_preserves_order() {
        let (events, mut rx) = EventLog::channel();
        events.log(LogRole::System, "first");
        events.log(LogRole::Git, "second");
        assert_eq!(rx.recv().await.unwrap().message, "first");
        assert_eq!(rx.recv().await.unwrap().message, "second");
    }

    #[test]
    fn test_event_log_closed_channel_does_not_panic() {
        let (events, rx) = EventLog::channel();
        drop(rx);
        events.log(LogRole::Error, "nobody listening");
    }
}
