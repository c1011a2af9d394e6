//! Default values for routing, escalation and delivery
//!
//! Every value here is only a default; all of them can be overridden through
//! settings files or environment variables.

/// Routing thresholds
pub mod routing {
    /// Minimum top score before falling back to the handoff agent
    pub const MIN_CONFIDENCE: f32 = 0.35;

    /// History phase: minimum intensity of a hostile message from a customer
    /// with prior escalations
    pub const REPEAT_NEGATIVE_INTENSITY: f32 = 0.6;

    /// Sentiment phase: urgency at or above this is acute
    pub const ACUTE_URGENCY: f32 = 0.8;

    /// Sentiment phase: intensity at or above this is acute
    pub const ACUTE_INTENSITY: f32 = 0.9;

    /// Content phase weights
    pub const SIMILARITY_WEIGHT: f32 = 0.7;
    pub const TAG_WEIGHT: f32 = 0.3;

    /// End-to-end routing latency budget
    pub const LATENCY_BUDGET_MS: u64 = 2000;

    /// Routed message ids remembered per customer for retry deduplication
    pub const DEDUP_WINDOW: usize = 64;

    /// Idle customer slots older than this are dropped, dedup memory included
    pub const SLOT_IDLE_TTL_SECS: u64 = 15 * 60;

    /// Slot acquisitions between idle sweeps
    pub const SLOT_SWEEP_EVERY: usize = 256;
}

pub mod escalation {
    /// Window in which a second signal escalates a watched conversation
    pub const WINDOW_SECS: u64 = 30 * 60;

    pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;
}

pub mod classifier {
    pub const TIMEOUT_MS: u64 = 2000;

    /// Below this confidence the emotion signal is discarded
    pub const MIN_CONFIDENCE: f32 = 0.3;
}

pub mod notifier {
    pub const MAX_RETRIES: u32 = 3;
    pub const BACKOFF_MS: u64 = 500;
    pub const TIMEOUT_SECS: u64 = 5;
}

pub mod paths {
    pub const AGENTS: &str = "config/agents.yaml";
    pub const TEMPLATES: &str = "config/templates.yaml";
}
