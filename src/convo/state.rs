//! Conversation state machine — tracks where each party is in the dialogue.

/// The states of the conversation.
///
/// `Choosing` is the hub: every non-terminal branch leads back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvoState {
    /// Picking a category from the keyboard.
    Choosing,
    /// Typing a count for the chosen category.
    TypingReply,
    /// Typing the name of a custom category.
    TypingChoice,
    /// Asked to share a contact.
    RequestContact,
    /// Conversation over; the session is discarded.
    Done,
}

impl ConvoState {
    /// Whether this state is terminal (conversation is over).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for ConvoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Choosing => "choosing",
            Self::TypingReply => "typing_reply",
            Self::TypingChoice => "typing_choice",
            Self::RequestContact => "request_contact",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}
