//! Pure state machine for the orchestration loop
//!
//! No I/O lives here: the engine performs one side effect per state and
//! feeds the outcome back as an [`Event`]. Every transition is deterministic
//! and total — an unexpected pairing recovers to the quota gate instead of
//! panicking, so the loop can never wedge on a bad edge.

use std::time::Duration;

/// Backoff after the daily quota is exhausted
pub const QUOTA_BACKOFF: Duration = Duration::from_secs(60);
/// Backoff after a recoverable failure (parse error, missing code, ...)
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);
/// Short pause after rotating to the next model candidate
pub const ROTATE_BACKOFF: Duration = Duration::from_secs(1);
/// Backoff after an unexpected error escapes an iteration
pub const CRITICAL_BACKOFF: Duration = Duration::from_secs(10);
/// Idle re-check interval while the system is busy
pub const IDLE_POLL: Duration = Duration::from_secs(30);
/// Stop-signal granularity inside long sleeps
pub const STOP_POLL: Duration = Duration::from_secs(1);

/// Loop states, in the order a successful pass visits them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// May we commit more today?
    QuotaGate,
    /// Load or brainstorm the current project
    SelectProject,
    /// Ask the hosted service for the next file
    ProposeFile,
    /// Wait for the system to go idle before heavy local work
    AwaitIdle,
    /// Ask the local service for the file's code
    GenerateCode,
    /// Persist, commit, push, advance quota and project state
    Commit,
}

/// Outcome of one state's side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    QuotaExceeded,
    QuotaAvailable,
    ProjectReady,
    ProjectUnavailable,
    ProposalAccepted,
    /// Hosted call failed; `rotated` says whether another candidate exists
    ProposalFailed { rotated: bool },
    /// Hosted call succeeded but the payload did not parse
    ProposalRejected,
    SystemIdle,
    StopRequested,
    CodeReady,
    CodeFailed,
    Committed,
    CommitFailed,
}

/// What to do before entering the next state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delay {
    None,
    Fixed(Duration),
    /// The configured post-commit interval (resolved by the engine)
    Interval,
}

/// Pure transition function: `(state, event) -> (next state, delay)`.
///
/// Never panics; pairings that should not occur recover to the quota gate
/// with the critical backoff.
pub fn transition(state: State, event: Event) -> (State, Delay) {
    match (state, event) {
        (State::QuotaGate, Event::QuotaExceeded) => {
            (State::QuotaGate, Delay::Fixed(QUOTA_BACKOFF))
        }
        (State::QuotaGate, Event::QuotaAvailable) => (State::SelectProject, Delay::None),

        (State::SelectProject, Event::ProjectReady) => (State::ProposeFile, Delay::None),
        (State::SelectProject, Event::ProjectUnavailable) => {
            (State::QuotaGate, Delay::Fixed(RETRY_BACKOFF))
        }

        (State::ProposeFile, Event::ProposalAccepted) => (State::AwaitIdle, Delay::None),
        (State::ProposeFile, Event::ProposalFailed { rotated: true }) => {
            (State::QuotaGate, Delay::Fixed(ROTATE_BACKOFF))
        }
        (State::ProposeFile, Event::ProposalFailed { rotated: false }) => {
            (State::QuotaGate, Delay::Fixed(RETRY_BACKOFF))
        }
        (State::ProposeFile, Event::ProposalRejected) => {
            (State::QuotaGate, Delay::Fixed(RETRY_BACKOFF))
        }

        (State::AwaitIdle, Event::SystemIdle) => (State::GenerateCode, Delay::None),
        (State::AwaitIdle, Event::StopRequested) => (State::QuotaGate, Delay::None),

        (State::GenerateCode, Event::CodeReady) => (State::Commit, Delay::None),
        (State::GenerateCode, Event::CodeFailed) => {
            (State::QuotaGate, Delay::Fixed(RETRY_BACKOFF))
        }

        (State::Commit, Event::Committed) => (State::QuotaGate, Delay::Interval),
        (State::Commit, Event::CommitFailed) => (State::QuotaGate, Delay::Fixed(RETRY_BACKOFF)),

        // Anything else is a logic slip; recover rather than wedge
        (_, _) => (State::QuotaGate, Delay::Fixed(CRITICAL_BACKOFF)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exhaustion_loops_on_the_gate() {
        let mut state = State::QuotaGate;
        for _ in 0..3 {
            let (next, delay) = transition(state, Event::QuotaExceeded);
            assert_eq!(next, State::QuotaGate);
            assert_eq!(delay, Delay::Fixed(QUOTA_BACKOFF));
            state = next;
        }
    }

    #[test]
    fn test_happy_path_visits_every_state() {
        let steps = [
            (Event::QuotaAvailable, State::SelectProject),
            (Event::ProjectReady, State::ProposeFile),
            (Event::ProposalAccepted, State::AwaitIdle),
            (Event::SystemIdle, State::GenerateCode),
            (Event::CodeReady, State::Commit),
            (Event::Committed, State::QuotaGate),
        ];
        let mut state = State::QuotaGate;
        for (event, expected) in steps {
            let (next, _) = transition(state, event);
            assert_eq!(next, expected);
            state = next;
        }
    }

    #[test]
    fn test_committed_sleeps_for_the_configured_interval() {
        let (_, delay) = transition(State::Commit, Event::Committed);
        assert_eq!(delay, Delay::Interval);
    }

    #[test]
    fn test_rotation_never_reaches_await_idle() {
        // Two candidates, hosted call fails twice: the loop rotates through
        // both and restarts from the gate each time.
        let mut state = State::QuotaGate;
        let mut visited = Vec::new();
        for _ in 0..2 {
            for event in [
                Event::QuotaAvailable,
                Event::ProjectReady,
                Event::ProposalFailed { rotated: true },
            ] {
                let (next, _) = transition(state, event);
                visited.push(next.clone());
                state = next;
            }
        }
        assert!(!visited.contains(&State::AwaitIdle));
        assert_eq!(state, State::QuotaGate);

        // Eventually a call succeeds and the idle gate is reached
        for event in [
            Event::QuotaAvailable,
            Event::ProjectReady,
            Event::ProposalAccepted,
        ] {
            let (next, _) = transition(state, event);
            state = next;
        }
        assert_eq!(state, State::AwaitIdle);
    }

    #[test]
    fn test_single_candidate_failure_backs_off_longer() {
        let (next, delay) = transition(State::ProposeFile, Event::ProposalFailed { rotated: false });
        assert_eq!(next, State::QuotaGate);
        assert_eq!(delay, Delay::Fixed(RETRY_BACKOFF));
    }

    #[test]
    fn test_commit_failure_skips_the_interval() {
        let (next, delay) = transition(State::Commit, Event::CommitFailed);
        assert_eq!(next, State::QuotaGate);
        assert_ne!(delay, Delay::Interval);
    }

    #[test]
    fn test_invalid_pairing_recovers_to_the_gate() {
        let (next, delay) = transition(State::AwaitIdle, Event::Committed);
        assert_eq!(next, State::QuotaGate);
        assert_eq!(delay, Delay::Fixed(CRITICAL_BACKOFF));
    }
}
