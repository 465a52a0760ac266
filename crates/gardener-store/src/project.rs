//! Whole-object persistence for the current project

use crate::atomic_write;
use gardener_core::{Project, Result};
use std::path::PathBuf;
use tracing::debug;

/// Reads and writes the single project state file.
///
/// No migration or versioning: an unparsable file reads as "no project",
/// which makes the loop brainstorm a fresh one.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Option<Project> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(project) => Some(project),
            Err(e) => {
                debug!("Unreadable project state, starting fresh: {}", e);
                None
            }
        }
    }

    pub fn save(&self, project: &Project) -> Result<()> {
        atomic_write(&self.path, &serde_json::to_string_pretty(project)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("current_project.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("current_project.json"));

        let mut project = Project {
            name: "Log Parser".to_string(),
            folder: "20260831_LogParser".to_string(),
            description: "Parses logs".to_string(),
            files: Vec::new(),
            file_count: 0,
        };
        project.record_file("parser.py");
        store.save(&project).unwrap();

        assert_eq!(store.load().unwrap(), project);
    }

    #[test]
    fn test_corrupt_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_project.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(ProjectStore::new(&path).load().is_none());
    }
}
