//! Debugging feature flags.

pub struct LogFlags {
    /// Per-symbol progress through the engine (start, finish, skip).
    pub log_engine: bool,

    /// Loss per epoch / solver details while training regressors.
    pub log_training: bool,

    /// Activate trace_time macro (for scope-level timing)
    pub log_performance: bool,

    /// Source fetches and store reads.
    pub log_source: bool,
}

pub const DF: LogFlags = LogFlags {
    log_engine: true,
    log_training: false,
    log_performance: cfg!(debug_assertions),
    log_source: true,
};
