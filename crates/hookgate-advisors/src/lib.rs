//! hookgate-advisors: built-in decision callbacks.
//!
//! Both callbacks treat the execution log as their only shared state, so
//! they stay correct across independent hook processes. They are written to
//! tolerate races: a duplicate advisory is harmless, a missed one is not.

mod pattern_advisory;
mod review_gate;

pub use pattern_advisory::PatternAdvisory;
pub use review_gate::ReviewGate;
