//! # gardener-orchestrator
//!
//! The guarded orchestration loop: a pure state machine (`machine`), the
//! engine that executes its side effects (`loop_engine`), the idle gate,
//! the prompt templates, and the background-worker lifecycle (`runtime`).

mod idle;
mod loop_engine;
mod machine;
mod prompts;
mod runtime;

pub use idle::IdleMonitor;
pub use loop_engine::LoopEngine;
pub use machine::{
    transition, Delay, Event, State, CRITICAL_BACKOFF, IDLE_POLL, QUOTA_BACKOFF, RETRY_BACKOFF,
    ROTATE_BACKOFF, STOP_POLL,
};
pub use prompts::{code_prompt, idea_prompt, next_file_prompt};
pub use runtime::{start, GardenerHandle};
