//! Multi-account orchestration and filter state
//!
//! The orchestrator owns one API client per connected account and all
//! shared mutable dashboard state; the filter controller layers the
//! draft/applied distinction on top and drives refreshes.

pub mod filters;
pub mod orchestrator;

pub use filters::FilterController;
pub use orchestrator::Orchestrator;
