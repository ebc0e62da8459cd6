//! Trace analysis for FeSenDA: widget-API association, reset-delimited
//! playback traces, candidate generation, the exploration-oracle seam, and
//! the policy-enforcing replay strategy.

pub mod association;
pub mod candidate;
pub mod enforcement;
pub mod oracle;
pub mod sim;
pub mod trace;
