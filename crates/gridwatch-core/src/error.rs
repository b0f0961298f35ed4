// ── Error types for the wallboard core ──

use thiserror::Error;

/// Errors surfaced by foreground wallboard operations.
///
/// Background operations (poll cycles, debounced persistence) never return
/// these — they degrade silently per the error-handling policy. Only
/// deliberate user actions (manual refresh, explicit sync, editor queries)
/// propagate errors up to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] gridwatch_api::Error),

    #[error("cache file I/O failed: {0}")]
    Cache(#[from] std::io::Error),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
