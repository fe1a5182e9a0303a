pub mod id;

/// `tracing` target of the per-supercycle allocation events.
pub const ANALYTICS_TARGET: &str = "analytics";
