//! ConversationOrchestrator: drives onboarding exchanges with the model and
//! decides when a profile has been captured.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::OnboardingConfig;
use crate::error::OnboardingError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::extract::{ExpectedShape, Extraction, extract};
use super::model::{ChatTurn, UserProfile};
use super::prompts::ONBOARDING_SYSTEM_PROMPT;
use super::state::{Conversation, ConversationState};

/// Result of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    /// The model asked something else; show `reply` to the user.
    Continue { reply: String },
    /// The model returned a valid profile. The conversation is over.
    Finalized { profile: UserProfile },
}

/// Owns one onboarding conversation.
///
/// `send` takes `&mut self`, so a conversation can have at most one request
/// in flight.
pub struct ConversationOrchestrator {
    llm: Arc<dyn LlmProvider>,
    config: OnboardingConfig,
    conversation: Conversation,
}

impl ConversationOrchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: OnboardingConfig) -> Self {
        Self::resume(llm, config, Conversation::new())
    }

    /// Continue an existing conversation.
    pub fn resume(
        llm: Arc<dyn LlmProvider>,
        config: OnboardingConfig,
        conversation: Conversation,
    ) -> Self {
        Self {
            llm,
            config,
            conversation,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> ConversationState {
        self.conversation.state()
    }

    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    /// Send the user's next utterance and interpret the model's reply.
    ///
    /// A blank utterance is allowed (e.g. to open the conversation). On a
    /// provider error the user's turn is rolled back so the caller can
    /// resubmit it.
    pub async fn send(&mut self, user_text: &str) -> Result<Exchange, OnboardingError> {
        if self.conversation.state().is_terminal() {
            return Err(OnboardingError::AlreadyFinalized);
        }

        let pending_id = if user_text.trim().is_empty() {
            None
        } else {
            let turn = ChatTurn::user(user_text.trim());
            let id = turn.id.clone();
            self.conversation.push(turn);
            Some(id)
        };

        let mut messages = vec![ChatMessage::system(ONBOARDING_SYSTEM_PROMPT)];
        messages.extend(self.conversation.to_messages());
        let request = CompletionRequest::new(messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    category = e.category(),
                    error = %e,
                    turns = self.conversation.turns().len(),
                    "Onboarding completion failed"
                );
                if let Some(ref id) = pending_id {
                    self.conversation.rollback(id);
                }
                return Err(e.into());
            }
        };

        match extract(&response.content, ExpectedShape::Profile) {
            Extraction::Structured(data) => {
                let profile = UserProfile::from_extracted(&data);
                self.conversation.finalize(profile.clone());
                info!(
                    turns = self.conversation.turns().len(),
                    goal = ?profile.primary_goal,
                    "Onboarding finalized"
                );
                Ok(Exchange::Finalized { profile })
            }
            Extraction::Conversational(reply) => {
                debug!(chars = reply.len(), "Onboarding continues");
                self.conversation.push(ChatTurn::assistant(reply.clone()));
                Ok(Exchange::Continue { reply })
            }
        }
    }
}
