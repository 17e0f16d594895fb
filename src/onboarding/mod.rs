//! Onboarding: a free-form chat with the model that ends when the model
//! returns a structured user profile.
//!
//! The extractor decides whether a reply is still conversation or a
//! finished profile; the orchestrator owns the chat history and the
//! `collecting → finalized` state machine.

pub mod extract;
pub mod manager;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod state;

pub use extract::{ExpectedShape, Extraction, extract};
pub use manager::{ConversationOrchestrator, Exchange};
pub use model::{ChatTurn, Sender, UserProfile, Weekday};
pub use prompts::FALLBACK_REPLY;
pub use state::{Conversation, ConversationState, START_PLACEHOLDER};
