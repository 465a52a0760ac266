//! # gardener-agent
//!
//! Clients for the two generation services: the hosted API (with model
//! catalog filtering and priority-based failover) and the local service.
//! Both are fail-soft: any network or decode failure becomes an Error event
//! plus `None`, never an error the loop has to handle.

mod hosted;
mod local;
mod models;
mod types;

pub use hosted::HostedClient;
pub use local::LocalClient;
pub use models::{build_candidates, ModelRotation, DEFAULT_MODEL, PRIORITY_MODELS};
