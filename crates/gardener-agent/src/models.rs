//! Candidate model ordering and failover rotation for the hosted service

/// Preferred models, highest priority first
pub const PRIORITY_MODELS: &[&str] = &[
    "models/gemini-1.5-flash",
    "models/gemini-1.5-flash-latest",
    "models/gemini-1.5-pro",
    "models/gemini-1.5-pro-latest",
    "models/gemini-1.0-pro",
];

/// Catalog entries containing this substring get pulled ahead of the rest
const PREFERRED_SUBSTRING: &str = "flash";

/// Fallback when the catalog is empty or unreachable
pub const DEFAULT_MODEL: &str = "models/gemini-1.5-flash";

/// Build the working candidate list from the provider catalog.
///
/// Order: priority-list entries present in the catalog (priority order),
/// then remaining entries containing the preferred substring (descending
/// lexicographic), then everything else in catalog order. An empty catalog
/// yields the single hardcoded default.
pub fn build_candidates(catalog: &[String]) -> Vec<String> {
    let mut candidates: Vec<String> = PRIORITY_MODELS
        .iter()
        .filter(|p| catalog.iter().any(|m| m == *p))
        .map(|p| p.to_string())
        .collect();

    let mut preferred: Vec<String> = catalog
        .iter()
        .filter(|m| {
            m.to_lowercase().contains(PREFERRED_SUBSTRING) && !candidates.contains(m)
        })
        .cloned()
        .collect();
    preferred.sort_by(|a, b| b.cmp(a));
    candidates.extend(preferred);

    let rest: Vec<String> = catalog
        .iter()
        .filter(|m| !candidates.contains(m))
        .cloned()
        .collect();
    candidates.extend(rest);

    if candidates.is_empty() {
        candidates.push(DEFAULT_MODEL.to_string());
    }
    candidates
}

/// Current candidate plus wrap-around rotation on failure
#[derive(Debug, Clone)]
pub struct ModelRotation {
    candidates: Vec<String>,
    index: usize,
}

impl ModelRotation {
    pub fn new(catalog: &[String]) -> Self {
        Self {
            candidates: build_candidates(catalog),
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.candidates[self.index]
    }

    /// Advance to the next candidate, wrapping around
    pub fn rotate(&mut self) {
        self.index = (self.index + 1) % self.candidates.len();
    }

    /// Number of candidates; always at least 1
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}
