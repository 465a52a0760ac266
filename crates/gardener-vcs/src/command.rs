//! Git command execution abstraction

use async_trait::async_trait;
use gardener_core::{GardenerError, Result};
use std::path::PathBuf;
use std::process::Output;
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Output from a git command
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl GitOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }

    /// Combined stdout/stderr for diagnostics
    pub fn diagnostic(&self) -> String {
        format!("STDOUT: {}\nSTDERR: {}", self.stdout, self.stderr)
    }
}

impl From<Output> for GitOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }
}

/// Trait for executing git commands (allows mocking in tests)
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Execute a git command with the given arguments, cwd at the repo root
    async fn exec(&self, args: &[&str]) -> Result<GitOutput>;

    /// The fixed working repository root
    fn repo_root(&self) -> &PathBuf;
}

/// Real git command executor
#[derive(Debug, Clone)]
pub struct GitCommand {
    repo_root: PathBuf,
}

impl GitCommand {
    /// Create a git executor rooted at the given repository
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }
}

#[async_trait]
impl GitExecutor for GitCommand {
    #[instrument(skip(self), fields(repo = %self.repo_root.display()))]
    async fn exec(&self, args: &[&str]) -> Result<GitOutput> {
        debug!("Executing git {:?}", args);

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .await
            .map_err(|e| GardenerError::GitCommand(format!("Failed to execute git: {}", e)))?;

        let git_output = GitOutput::from(output);

        if !git_output.success {
            debug!("git command failed: {}", git_output.stderr);
        }

        Ok(git_output)
    }

    fn repo_root(&self) -> &PathBuf {
        &self.repo_root
    }
}

/// Mock git executor for testing.
///
/// Records every invocation; commands without a canned response succeed with
/// empty output so happy paths need no setup.
#[derive(Debug, Clone)]
pub struct MockGitExecutor {
    repo_root: PathBuf,
    responses: std::collections::HashMap<String, GitOutput>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockGitExecutor {
    fn default() -> Self {
        Self::new("/mock/repo")
    }
}

impl MockGitExecutor {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            responses: std::collections::HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(mut self, command: &str, output: GitOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }

    /// Every command executed so far, space-joined
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitExecutor for MockGitExecutor {
    async fn exec(&self, args: &[&str]) -> Result<GitOutput> {
        let key = args.join(" ");
        self.calls.lock().unwrap().push(key.clone());
        Ok(self
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| GitOutput::ok("")))
    }

    fn repo_root(&self) -> &PathBuf {
        &self.repo_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_executor_canned_response() {
        let executor = MockGitExecutor::default()
            .with_response("status", GitOutput::failed("not a repository"));

        let output = executor.exec(&["status"]).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.stderr, "not a repository");
        assert_eq!(executor.calls(), vec!["status"]);
    }

    #[tokio::test]
    async fn test_mock_executor_defaults_to_success() {
        let executor = MockGitExecutor::default();
        let output = executor.exec(&["add", "--force", "x"]).await.unwrap();
        assert!(output.success);
    }
}
