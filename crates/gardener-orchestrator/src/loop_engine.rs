//! Loop engine — drives the pure state machine with real side effects
//!
//! One side effect per state, the outcome fed back as an event. Anything
//! unexpected that escapes a step is logged as Critical and answered with a
//! backoff; the loop terminates only through the stop signal.

use crate::idle::IdleMonitor;
use crate::machine::{transition, Delay, Event, State, CRITICAL_BACKOFF, IDLE_POLL, STOP_POLL};
use crate::prompts;
use chrono::Local;
use gardener_agent::{HostedClient, LocalClient, ModelRotation};
use gardener_core::{
    extract_json, strip_code_fences, EventLog, FileTask, GardenerConfig, GardenerError, LogRole,
    Project, ProjectIdea, Result,
};
use gardener_store::{ProjectStore, QuotaTracker, TranscriptLog};
use gardener_vcs::{CommitterIdentity, GitExecutor, RepoManager};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Project directories live here, relative to the repository root
const PROJECTS_SUBDIR: &str = "output/projects";

/// A proposed file waiting for code generation
#[derive(Debug, Clone)]
struct PendingFile {
    filename: String,
    description: String,
    code_prompt: String,
}

/// The orchestration loop. Single writer of project and quota state.
pub struct LoopEngine<E: GitExecutor> {
    config: GardenerConfig,
    events: EventLog,
    stop: Arc<AtomicBool>,

    quota: QuotaTracker,
    projects: ProjectStore,
    transcript: TranscriptLog,
    repo: RepoManager<E>,
    hosted: HostedClient,
    local: LocalClient,
    rotation: ModelRotation,
    idle: IdleMonitor,
    repo_root: PathBuf,

    project: Option<Project>,
    pending: Option<PendingFile>,
    written: Option<PathBuf>,
}

impl<E: GitExecutor> LoopEngine<E> {
    pub fn new(
        config: GardenerConfig,
        executor: E,
        events: EventLog,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let repo_root = executor.repo_root().clone();
        let identity = CommitterIdentity {
            name: config.committer_name.clone(),
            email: config.committer_email.clone(),
        };
        Self {
            quota: QuotaTracker::new(repo_root.join("daily_quota.json")),
            projects: ProjectStore::new(repo_root.join("current_project.json")),
            transcript: TranscriptLog::new(repo_root.join("transcript.md")),
            repo: RepoManager::new(executor, identity, config.repo_url.clone(), events.clone()),
            hosted: HostedClient::new(config.api_key.clone(), events.clone()),
            local: LocalClient::new(config.model.clone(), events.clone()),
            rotation: ModelRotation::new(&[]),
            idle: IdleMonitor::new(config.idle_threshold_percent, events.clone()),
            repo_root,
            config,
            events,
            stop,
            project: None,
            pending: None,
            written: None,
        }
    }

    /// Run until the stop signal is observed. Never returns early: every
    /// error inside an iteration is converted to a Critical event plus
    /// backoff.
    pub async fn run(mut self) {
        self.events.log(LogRole::System, "Bot started");
        self.startup().await;

        let mut state = State::QuotaGate;
        while !self.stopping() {
            debug!("Loop state: {:?}", state);
            match self.step(&state).await {
                Ok(event) => {
                    let (next, delay) = transition(state, event);
                    self.pause(delay).await;
                    state = next;
                }
                Err(e) => {
                    self.events
                        .log(LogRole::Critical, format!("Loop iteration failed: {}", e));
                    self.pause(Delay::Fixed(CRITICAL_BACKOFF)).await;
                    state = State::QuotaGate;
                }
            }
        }
        self.events.log(LogRole::System, "Bot stopped");
    }

    /// One-time startup work: repository init and model catalog fetch.
    /// Both are fail-soft; the loop starts regardless.
    async fn startup(&mut self) {
        if let Err(e) = self.repo.init_repo().await {
            self.events
                .log(LogRole::Critical, format!("Repository init failed: {}", e));
        }
        self.events
            .log(LogRole::System, "Connecting to hosted service...");
        let catalog = self.hosted.list_models().await;
        self.rotation = ModelRotation::new(&catalog);
        info!("Model rotation holds {} candidate(s)", self.rotation.len());
    }

    /// Perform the side effect for one state and report the outcome
    async fn step(&mut self, state: &State) -> Result<Event> {
        match state {
            State::QuotaGate => Ok(self.check_quota()),
            State::SelectProject => self.select_project().await,
            State::ProposeFile => self.propose_file().await,
            State::AwaitIdle => Ok(self.await_idle().await),
            State::GenerateCode => self.generate_code().await,
            State::Commit => self.commit_pending().await,
        }
    }

    fn check_quota(&self) -> Event {
        let count = self.quota.get_count();
        let max = self.config.max_commits_per_day;
        if count >= max {
            self.events.log(
                LogRole::System,
                format!("Daily Limit Reached ({}/{})", count, max),
            );
            Event::QuotaExceeded
        } else {
            Event::QuotaAvailable
        }
    }

    /// Load the persisted project, brainstorming a replacement when none
    /// exists or the current one hit the file cap.
    async fn select_project(&mut self) -> Result<Event> {
        let mut project = self.project.take().or_else(|| self.projects.load());

        if project.as_ref().map_or(true, |p| p.is_complete()) {
            project = self.brainstorm_project().await?;
        }

        let Some(project) = project else {
            return Ok(Event::ProjectUnavailable);
        };

        let project_dir = self.repo_root.join(PROJECTS_SUBDIR).join(&project.folder);
        std::fs::create_dir_all(&project_dir)?;
        // A generated file occasionally arrives with its own repo metadata
        self.repo.remove_nested_repo(&project_dir);

        self.project = Some(project);
        Ok(Event::ProjectReady)
    }

    async fn brainstorm_project(&mut self) -> Result<Option<Project>> {
        self.events.log(
            LogRole::Hosted,
            format!("Brainstorming new project ({})", self.rotation.current()),
        );
        let prompt = prompts::idea_prompt();
        let Some(response) = self.hosted.generate(&prompt, self.rotation.current()).await else {
            return Ok(None);
        };
        self.transcript.append("hosted (ideation)", &prompt, &response);

        // Malformed payloads are silently ignored; the loop retries later
        let Some(idea) = extract_json::<ProjectIdea>(&response) else {
            return Ok(None);
        };
        let project = Project::from_idea(idea, Local::now().date_naive());
        self.projects.save(&project)?;
        self.events
            .log(LogRole::System, format!("New project: {}", project.name));
        Ok(Some(project))
    }

    async fn propose_file(&mut self) -> Result<Event> {
        let project = self.current_project()?;
        self.events.log(
            LogRole::Hosted,
            format!("Designing next file for {}...", project.name),
        );
        let prompt = prompts::next_file_prompt(&project);

        let Some(response) = self.hosted.generate(&prompt, self.rotation.current()).await else {
            self.events.log(
                LogRole::Warning,
                format!("Model {} failed. Rotating...", self.rotation.current()),
            );
            if self.rotation.len() > 1 {
                self.rotation.rotate();
                return Ok(Event::ProposalFailed { rotated: true });
            }
            return Ok(Event::ProposalFailed { rotated: false });
        };
        self.transcript.append("hosted (task)", &prompt, &response);

        let Some(task) = extract_json::<FileTask>(&response) else {
            self.events
                .log(LogRole::Error, "Failed to parse task payload");
            return Ok(Event::ProposalRejected);
        };

        let filename = project.disambiguate(&task.filename);
        self.events
            .log(LogRole::System, format!("Task: create {}", filename));
        self.pending = Some(PendingFile {
            filename,
            description: task.description,
            code_prompt: task.code_prompt,
        });
        Ok(Event::ProposalAccepted)
    }

    /// Poll the idle monitor until the system is quiet or stop is requested
    async fn await_idle(&self) -> Event {
        loop {
            if self.stopping() {
                return Event::StopRequested;
            }
            if self.idle.is_idle() {
                return Event::SystemIdle;
            }
            self.sleep_checking_stop(IDLE_POLL).await;
        }
    }

    async fn generate_code(&mut self) -> Result<Event> {
        let project = self.current_project()?;
        let pending = self
            .pending
            .clone()
            .ok_or_else(|| GardenerError::State("no pending file proposal".to_string()))?;

        self.events.log(LogRole::Local, "Coding...");
        let prompt = prompts::code_prompt(&pending.filename, &project, &pending.code_prompt);

        let Some(code) = self.local.generate(&prompt).await else {
            // The client already emitted the Error event
            return Ok(Event::CodeFailed);
        };
        self.transcript.append("local (coding)", &prompt, &code);

        let text = strip_code_fences(&code);
        let rel_path = PathBuf::from(PROJECTS_SUBDIR)
            .join(&project.folder)
            .join(&pending.filename);
        let abs_path = self.repo_root.join(&rel_path);
        if let Some(parent) = abs_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&abs_path, text)?;

        self.written = Some(rel_path);
        Ok(Event::CodeReady)
    }

    /// Commit the written file; only on success do quota and project state
    /// advance, so a failed commit leaves the next iteration a clean slate.
    async fn commit_pending(&mut self) -> Result<Event> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| GardenerError::State("no pending file to commit".to_string()))?;
        let rel_path = self
            .written
            .take()
            .ok_or_else(|| GardenerError::State("no written file to commit".to_string()))?;

        let message = format!("feat: {}", pending.description);
        if !self.repo.commit(&rel_path, &message).await? {
            return Ok(Event::CommitFailed);
        }

        // Best-effort; a failed push never blocks quota or project state
        if let Err(e) = self.repo.push().await {
            self.events
                .log(LogRole::Warning, format!("Push errored: {}", e));
        }

        let count = self.quota.increment()?;
        self.events.log(
            LogRole::System,
            format!(
                "Daily Progress: {}/{}",
                count, self.config.max_commits_per_day
            ),
        );

        if let Some(project) = self.project.as_mut() {
            project.record_file(&pending.filename);
            self.projects.save(project)?;
        }
        Ok(Event::Committed)
    }

    fn current_project(&self) -> Result<Project> {
        self.project
            .clone()
            .ok_or_else(|| GardenerError::State("no project selected".to_string()))
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    async fn pause(&self, delay: Delay) {
        let duration = match delay {
            Delay::None => return,
            Delay::Fixed(duration) => duration,
            Delay::Interval => Duration::from_secs(self.config.interval_secs),
        };
        self.sleep_checking_stop(duration).await;
    }

    /// Sleep in stop-poll slices so shutdown stays responsive
    async fn sleep_checking_stop(&self, duration: Duration) {
        let mut remaining = duration;
        while !self.stopping() && remaining > Duration::ZERO {
            let tick = remaining.min(STOP_POLL);
            tokio::time::sleep(tick).await;
            remaining = remaining.saturating_sub(tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardener_vcs::MockGitExecutor;

    fn engine(dir: &tempfile::TempDir) -> (LoopEngine<MockGitExecutor>, Arc<AtomicBool>) {
        let (events, _rx) = EventLog::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let engine = LoopEngine::new(
            GardenerConfig::default(),
            MockGitExecutor::new(dir.path()),
            events,
            stop.clone(),
        );
        (engine, stop)
    }

    #[tokio::test]
    async fn test_quota_gate_blocks_at_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _stop) = engine(&dir);
        let today = Local::now().date_naive();
        for _ in 0..engine.config.max_commits_per_day {
            engine.quota.increment_on(today).unwrap();
        }
        assert_eq!(engine.check_quota(), Event::QuotaExceeded);
    }

    #[tokio::test]
    async fn test_quota_gate_opens_below_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _stop) = engine(&dir);
        assert_eq!(engine.check_quota(), Event::QuotaAvailable);
    }

    #[tokio::test]
    async fn test_commit_advances_quota_and_project() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _stop) = engine(&dir);

        let mut project = Project {
            name: "Log Parser".to_string(),
            folder: "20260831_LogParser".to_string(),
            description: "Parses logs".to_string(),
            files: Vec::new(),
            file_count: 0,
        };
        let rel_path = PathBuf::from(PROJECTS_SUBDIR)
            .join(&project.folder)
            .join("parser.py");
        let abs_path = dir.path().join(&rel_path);
        std::fs::create_dir_all(abs_path.parent().unwrap()).unwrap();
        std::fs::write(&abs_path, "print(1)").unwrap();

        engine.project = Some(project.clone());
        engine.pending = Some(PendingFile {
            filename: "parser.py".to_string(),
            description: "Parse logs".to_string(),
            code_prompt: "p".to_string(),
        });
        engine.written = Some(rel_path);

        let event = engine.commit_pending().await.unwrap();
        assert_eq!(event, Event::Committed);
        assert_eq!(engine.quota.get_count(), 1);

        project.record_file("parser.py");
        assert_eq!(engine.projects.load().unwrap(), project);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_state_untouched() {
        use gardener_vcs::GitOutput;

        let dir = tempfile::tempdir().unwrap();
        let (events, _rx) = EventLog::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let executor = MockGitExecutor::new(dir.path())
            .with_response("commit -m feat: d", GitOutput::failed("index locked"));
        let mut engine = LoopEngine::new(GardenerConfig::default(), executor, events, stop);

        let rel_path = PathBuf::from("a.py");
        std::fs::write(dir.path().join(&rel_path), "print(1)").unwrap();
        engine.project = Some(Project::default());
        engine.pending = Some(PendingFile {
            filename: "a.py".to_string(),
            description: "d".to_string(),
            code_prompt: "p".to_string(),
        });
        engine.written = Some(rel_path);

        let event = engine.commit_pending().await.unwrap();
        assert_eq!(event, Event::CommitFailed);
        assert_eq!(engine.quota.get_count(), 0);
        assert!(engine.projects.load().is_none());
    }

    #[tokio::test]
    async fn test_push_failure_still_advances_state() {
        use gardener_vcs::GitOutput;

        let dir = tempfile::tempdir().unwrap();
        let (events, mut rx) = EventLog::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let executor = MockGitExecutor::new(dir.path())
            .with_response("push -u origin master", GitOutput::failed("rejected"));
        let mut config = GardenerConfig::default();
        config.repo_url = "https://example.com/r.git".to_string();
        let mut engine = LoopEngine::new(config, executor, events, stop);

        let rel_path = PathBuf::from("a.py");
        std::fs::write(dir.path().join(&rel_path), "print(1)").unwrap();
        engine.project = Some(Project::default());
        engine.pending = Some(PendingFile {
            filename: "a.py".to_string(),
            description: "d".to_string(),
            code_prompt: "p".to_string(),
        });
        engine.written = Some(rel_path);

        let event = engine.commit_pending().await.unwrap();
        assert_eq!(event, Event::Committed);
        assert_eq!(engine.quota.get_count(), 1);
        assert_eq!(engine.projects.load().unwrap().files, vec!["a.py"]);

        // The only non-info surface of the failed push is a Warning event
        let mut saw_warning = false;
        while let Ok(logged) = rx.try_recv() {
            assert_ne!(logged.role, LogRole::Critical);
            assert_ne!(logged.role, LogRole::Error);
            if logged.role == LogRole::Warning {
                saw_warning = true;
            }
        }
        assert!(saw_warning);
    }

    #[tokio::test]
    async fn test_sleep_checking_stop_exits_early() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, stop) = engine(&dir);
        stop.store(true, Ordering::Relaxed);

        let started = std::time::Instant::now();
        engine.sleep_checking_stop(Duration::from_secs(60)).await;
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_await_idle_honors_stop() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, stop) = engine(&dir);
        stop.store(true, Ordering::Relaxed);
        assert_eq!(engine.await_idle().await, Event::StopRequested);
    }
}
