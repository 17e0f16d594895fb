//! Adaptive coach: onboarding chat, plan synthesis, and progressive overload.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod onboarding;
pub mod plans;
pub mod store;
pub mod workouts;
