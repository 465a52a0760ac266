//! Repository manager: init, commit, push against one fixed working repo

use crate::command::GitExecutor;
use gardener_core::{EventLog, LogRole, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Committer identity applied on fresh `git init`
#[derive(Debug, Clone)]
pub struct CommitterIdentity {
    pub name: String,
    pub email: String,
}

/// Wraps add/commit/push sequencing for the single working repository.
///
/// Every operation reports success or failure through the event channel;
/// nothing here raises past the caller for an unhappy git exit.
pub struct RepoManager<E: GitExecutor> {
    executor: E,
    identity: CommitterIdentity,
    /// Empty string disables pushing
    remote_url: String,
    events: EventLog,
}

impl<E: GitExecutor> RepoManager<E> {
    pub fn new(
        executor: E,
        identity: CommitterIdentity,
        remote_url: impl Into<String>,
        events: EventLog,
    ) -> Self {
        Self {
            executor,
            identity,
            remote_url: remote_url.into(),
            events,
        }
    }

    /// Initialize the repository if `.git` is absent; idempotent.
    ///
    /// The committer identity is configured on fresh init only.
    pub async fn init_repo(&self) -> Result<()> {
        if self.executor.repo_root().join(".git").exists() {
            debug!("Repository already initialized");
            return Ok(());
        }
        self.executor.exec(&["init"]).await?;
        self.executor
            .exec(&["config", "user.name", &self.identity.name])
            .await?;
        self.executor
            .exec(&["config", "user.email", &self.identity.email])
            .await?;
        self.events
            .log(LogRole::System, "Git repository initialized");
        Ok(())
    }

    /// Stage one file forcibly and commit it.
    ///
    /// The path is resolved to an absolute, forward-slash form before any
    /// git invocation; a missing file fails without ever staging.
    pub async fn commit(&self, path: &Path, message: &str) -> Result<bool> {
        let absolute = self.resolve(path);

        if !Path::new(&absolute).exists() {
            self.events
                .log(LogRole::Error, format!("File not found: {}", absolute));
            return Ok(false);
        }

        let add = self
            .executor
            .exec(&["add", "--force", "--verbose", &absolute])
            .await?;
        if !add.success {
            self.events.log(
                LogRole::Error,
                format!("Git add failed: {}", add.diagnostic()),
            );
            return Ok(false);
        }

        let commit = self.executor.exec(&["commit", "-m", message]).await?;
        if commit.success {
            self.events
                .log(LogRole::Git, format!("Committed: {}", message));
            Ok(true)
        } else {
            self.events.log(
                LogRole::Error,
                format!("Commit failed: {}", commit.diagnostic()),
            );
            Ok(false)
        }
    }

    /// Best-effort push; a no-op without a configured remote.
    ///
    /// Registers the remote idempotently and rebase-pulls first so the push
    /// is not rejected as non-fast-forward. Push failure is a Warning —
    /// local commits are never unwound.
    pub async fn push(&self) -> Result<()> {
        if self.remote_url.is_empty() {
            return Ok(());
        }

        // Fails harmlessly when origin already exists
        let _ = self
            .executor
            .exec(&["remote", "add", "origin", &self.remote_url])
            .await?;
        let _ = self
            .executor
            .exec(&["pull", "--rebase", "origin", "master"])
            .await?;

        let push = self
            .executor
            .exec(&["push", "-u", "origin", "master"])
            .await?;
        if push.success {
            self.events.log(LogRole::Git, "Pushed to remote");
        } else {
            self.events.log(
                LogRole::Warning,
                format!("Push failed: {}", push.diagnostic()),
            );
        }
        Ok(())
    }

    /// Forcibly remove any nested repository metadata under a project
    /// directory, so the working repo stays a monorepo. Fail-soft.
    pub fn remove_nested_repo(&self, project_dir: &Path) {
        let nested = project_dir.join(".git");
        if !nested.exists() {
            return;
        }
        self.events.log(
            LogRole::Warning,
            format!("Removing nested git repo in {}", project_dir.display()),
        );
        if let Err(e) = force_remove_dir(&nested) {
            self.events.log(
                LogRole::Error,
                format!("Failed to remove nested git: {}", e),
            );
        }
    }

    fn resolve(&self, path: &Path) -> String {
        let absolute: PathBuf = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.executor.repo_root().join(path)
        };
        absolute.to_string_lossy().replace('\\', "/")
    }
}

/// Remove a directory tree, clearing read-only attributes when the first
/// attempt fails (nested `.git` object files are read-only).
fn force_remove_dir(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(first) => {
            warn!("Initial removal failed ({}), clearing read-only", first);
            clear_readonly(path)?;
            std::fs::remove_dir_all(path)
        }
    }
}

fn clear_readonly(path: &Path) -> std::io::Result<()> {
    let metadata = std::fs::symlink_metadata(path)?;
    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        std::fs::set_permissions(path, permissions)?;
    }
    if metadata.is_dir() {
        for entry in std::fs::read_dir(path)? {
            clear_readonly(&entry?.path())?;
        }
    }
    Ok(())
}
