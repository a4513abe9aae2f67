// ── Engine configuration ──
//
// Built by the embedding layer (API server, job runner) and handed in;
// the engine never reads config files.

/// Tunables for a single `OfferEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound on optimistic-concurrency retries for conditional writes
    /// (usage ledger, lifecycle transitions, recurrence sweep). When
    /// exhausted, the operation fails with `ConcurrentModification`
    /// rather than blocking.
    pub max_write_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 3,
        }
    }
}
