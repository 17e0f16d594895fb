//! Plan synthesis: one completion call that turns a profile into a
//! multi-day set of workout templates.

pub mod routes;
pub mod synthesizer;

pub use synthesizer::{PlanSynthesizer, parse_plan};
