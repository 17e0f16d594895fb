//! Onboarding state machine: `Collecting` until a profile is extracted,
//! then `Finalized` for good.

use serde::{Deserialize, Serialize};

use super::model::{ChatTurn, Sender, UserProfile};
use crate::llm::{ChatMessage, Role};

/// Placeholder sent when there is nothing else to send. Completion APIs
/// reject an empty message list.
pub const START_PLACEHOLDER: &str = "[Start Conversation]";

/// Observable conversation states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Collecting,
    Finalized,
}

impl ConversationState {
    /// Valid transitions: collecting → collecting, collecting → finalized.
    pub fn can_transition_to(&self, target: ConversationState) -> bool {
        matches!(
            (self, target),
            (Self::Collecting, Self::Collecting) | (Self::Collecting, Self::Finalized)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Collecting => "collecting",
            Self::Finalized => "finalized",
        };
        write!(f, "{s}")
    }
}

/// One onboarding conversation: append-only turns plus state.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
    state: ConversationState,
    profile: Option<UserProfile>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a collecting conversation from client-held turns.
    pub fn from_turns(turns: Vec<ChatTurn>) -> Self {
        Self {
            turns,
            ..Self::default()
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub(crate) fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// Remove the newest turn if it has `id`. Used to undo a user turn whose
    /// request failed.
    pub(crate) fn rollback(&mut self, id: &str) {
        if self.turns.last().is_some_and(|t| t.id == id) {
            self.turns.pop();
        }
    }

    /// Move to `Finalized`. Returns false (and changes nothing) if already
    /// finalized.
    pub(crate) fn finalize(&mut self, profile: UserProfile) -> bool {
        if !self.state.can_transition_to(ConversationState::Finalized) {
            return false;
        }
        self.state = ConversationState::Finalized;
        self.profile = Some(profile);
        true
    }

    /// Messages for the completion request. Never empty, and always opens
    /// with a user message.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> = self
            .turns
            .iter()
            .filter(|t| !t.text.trim().is_empty())
            .map(|t| match t.sender {
                Sender::User => ChatMessage::user(&t.text),
                Sender::Assistant => ChatMessage::assistant(&t.text),
            })
            .collect();
        if messages.first().is_none_or(|m| m.role != Role::User) {
            messages.insert(0, ChatMessage::user(START_PLACEHOLDER));
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        use ConversationState::*;
        assert!(Collecting.can_transition_to(Collecting));
        assert!(Collecting.can_transition_to(Finalized));
        assert!(!Finalized.can_transition_to(Collecting));
        assert!(!Finalized.can_transition_to(Finalized));
        assert!(Finalized.is_terminal());
        assert!(!Collecting.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        for state in [ConversationState::Collecting, ConversationState::Finalized] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(format!("\"{state}\""), json);
        }
    }

    #[test]
    fn empty_conversation_sends_single_placeholder() {
        let conversation = Conversation::new();
        let messages = conversation.to_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, START_PLACEHOLDER);
    }

    #[test]
    fn turns_map_to_roles_in_order() {
        let conversation = Conversation::from_turns(vec![
            ChatTurn::assistant("Hi! What's your main goal?"),
            ChatTurn::user("Get stronger"),
        ]);
        let messages = conversation.to_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, START_PLACEHOLDER);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].content, "Get stronger");
    }

    #[test]
    fn finalize_is_one_way() {
        let mut conversation = Conversation::new();
        assert!(conversation.finalize(UserProfile::default()));
        assert_eq!(conversation.state(), ConversationState::Finalized);
        assert!(!conversation.finalize(UserProfile::default()));
    }

    #[test]
    fn rollback_only_removes_matching_last_turn() {
        let mut conversation = Conversation::new();
        let first = ChatTurn::user("one");
        let second = ChatTurn::user("two");
        conversation.push(first.clone());
        conversation.push(second.clone());
        conversation.rollback(&first.id);
        assert_eq!(conversation.turns().len(), 2);
        conversation.rollback(&second.id);
        assert_eq!(conversation.turns().len(), 1);
    }
}
