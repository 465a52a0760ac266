//! System-idle gate for heavy local generation work

use gardener_core::{EventLog, LogRole};
use tracing::debug;

/// Reports whether CPU load is low enough to start local generation.
///
/// Samples the 1-minute load average and normalizes it by the core count.
/// A broken sensor reads as idle so the loop can never block forever on a
/// measurement failure.
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    threshold_percent: u8,
    events: EventLog,
}

impl IdleMonitor {
    pub fn new(threshold_percent: u8, events: EventLog) -> Self {
        Self {
            threshold_percent,
            events,
        }
    }

    pub fn is_idle(&self) -> bool {
        let Some(load) = sample_load_percent() else {
            debug!("Load sampling failed, treating system as idle");
            return true;
        };
        let idle = load < f64::from(self.threshold_percent);
        if !idle {
            self.events.log(
                LogRole::System,
                format!("System busy ({:.0}% CPU). Waiting for idle...", load),
            );
        }
        idle
    }
}

/// Current load as a percentage of total core capacity
fn sample_load_percent() -> Option<f64> {
    let raw = std::fs::read_to_string("/proc/loadavg").ok()?;
    let load = parse_loadavg(&raw)?;
    let cores = std::thread::available_parallelism().ok()?.get();
    Some(load / cores as f64 * 100.0)
}

/// First field of `/proc/loadavg` (1-minute load average)
fn parse_loadavg(raw: &str) -> Option<f64> {
    raw.split_whitespace().next()?.parse().ok()
}
