//! # gardener-vcs
//!
//! Git integration for Gardener: a subprocess executor behind a trait (so the
//! repository manager is testable without a git binary) and the manager that
//! implements init/commit/push against one fixed working repository.

mod command;
mod repo;

pub use command::{GitCommand, GitExecutor, GitOutput, MockGitExecutor};
pub use repo::{CommitterIdentity, RepoManager};
