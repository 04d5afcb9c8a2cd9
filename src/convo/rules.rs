//! The dispatch table: scope × predicate → action.
//!
//! The whole dialogue script is one static, ordered table. Rules are
//! evaluated top to bottom and the first match wins; an event that matches
//! no row is a silent no-op.

use crate::convo::keyboards::{self, CATEGORIES};
use crate::convo::state::ConvoState;
use crate::transport::Payload;

/// Which parties a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No session exists for the party yet.
    Fresh,
    /// Session is in this exact state.
    In(ConvoState),
    /// Any live (non-terminal) session, regardless of state.
    Any,
}

/// What an inbound payload must look like for a rule to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// A slash command with this name.
    Command(&'static str),
    /// Text equal to this label.
    Exact(&'static str),
    /// Text equal to one of these labels.
    OneOf(&'static [&'static str]),
    /// Any text that is not a command and not the finish label.
    PlainText,
    /// A contact payload.
    Contact,
}

impl Predicate {
    pub fn matches(&self, payload: &Payload) -> bool {
        match (self, payload) {
            (Self::Command(name), Payload::Command(cmd)) => cmd == name,
            (Self::Exact(label), Payload::Text(text)) => text == label,
            (Self::OneOf(labels), Payload::Text(text)) => labels.contains(&text.as_str()),
            (Self::PlainText, Payload::Text(text)) => text != keyboards::DONE,
            (Self::Contact, Payload::Contact(_)) => true,
            _ => false,
        }
    }
}

/// What the controller does when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Welcome the party and show the category keyboard.
    Greet,
    /// Store the text as the current category and ask for a count.
    PickCategory,
    /// Ask the party to name a custom category.
    AskCustomCategory,
    /// Ask the party to share a contact.
    AskContact,
    /// Parse the text as a count and accumulate it.
    RecordCount,
    /// Store the shared phone number.
    SaveContact,
    /// Summarize everything and end the conversation.
    Finish,
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub scope: Scope,
    pub predicate: Predicate,
    pub action: Action,
}

/// The conversation script. Order matters: the first matching row wins.
pub const RULES: &[Rule] = &[
    Rule {
        scope: Scope::Fresh,
        predicate: Predicate::Command("start"),
        action: Action::Greet,
    },
    Rule {
        scope: Scope::In(ConvoState::Choosing),
        predicate: Predicate::OneOf(CATEGORIES),
        action: Action::PickCategory,
    },
    Rule {
        scope: Scope::In(ConvoState::Choosing),
        predicate: Predicate::Exact(keyboards::SEND_NUMBER),
        action: Action::AskContact,
    },
    Rule {
        scope: Scope::In(ConvoState::Choosing),
        predicate: Predicate::Exact(keyboards::SOMETHING_ELSE),
        action: Action::AskCustomCategory,
    },
    Rule {
        scope: Scope::In(ConvoState::TypingChoice),
        predicate: Predicate::PlainText,
        action: Action::PickCategory,
    },
    Rule {
        scope: Scope::In(ConvoState::TypingReply),
        predicate: Predicate::PlainText,
        action: Action::RecordCount,
    },
    Rule {
        scope: Scope::In(ConvoState::RequestContact),
        predicate: Predicate::Contact,
        action: Action::SaveContact,
    },
    Rule {
        scope: Scope::Any,
        predicate: Predicate::Exact(keyboards::DONE),
        action: Action::Finish,
    },
];

/// Find the first rule matching the party's state and payload.
///
/// `state` is `None` when no session exists for the party yet.
pub fn dispatch(state: Option<ConvoState>, payload: &Payload) -> Option<Action> {
    RULES
        .iter()
        .find(|rule| scope_matches(rule.scope, state) && rule.predicate.matches(payload))
        .map(|rule| rule.action)
}

fn scope_matches(scope: Scope, state: Option<ConvoState>) -> bool {
    match (scope, state) {
        (Scope::Fresh, None) => true,
        (Scope::In(expected), Some(current)) => current == expected,
        (Scope::Any, Some(current)) => !current.is_terminal(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ContactPayload;

    fn text(s: &str) -> Payload {
        Payload::Text(s.to_string())
    }

    fn contact() -> Payload {
        Payload::Contact(ContactPayload {
            phone_number: "+15551234".to_string(),
            first_name: "Alice".to_string(),
        })
    }

    // ── Fresh parties ───────────────────────────────────────────────

    #[test]
    fn fresh_party_start_greets() {
        let action = dispatch(None, &Payload::Command("start".to_string()));
        assert_eq!(action, Some(Action::Greet));
    }

    #[test]
    fn fresh_party_anything_else_is_ignored() {
        assert_eq!(dispatch(None, &text("Push ups")), None);
        assert_eq!(dispatch(None, &text("Done")), None);
        assert_eq!(dispatch(None, &contact()), None);
        assert_eq!(dispatch(None, &Payload::Command("help".to_string())), None);
    }

    // ── Choosing ────────────────────────────────────────────────────

    #[test]
    fn choosing_category_labels_pick() {
        for label in ["Push ups", "Squats", "Crunches"] {
            assert_eq!(
                dispatch(Some(ConvoState::Choosing), &text(label)),
                Some(Action::PickCategory),
                "{label} should pick a category"
            );
        }
    }

    #[test]
    fn choosing_send_number_asks_for_contact() {
        assert_eq!(
            dispatch(Some(ConvoState::Choosing), &text("Send number")),
            Some(Action::AskContact)
        );
    }

    #[test]
    fn choosing_something_else_asks_for_custom_category() {
        assert_eq!(
            dispatch(Some(ConvoState::Choosing), &text("Something else...")),
            Some(Action::AskCustomCategory)
        );
    }

    #[test]
    fn choosing_free_text_is_ignored() {
        assert_eq!(dispatch(Some(ConvoState::Choosing), &text("push ups")), None);
        assert_eq!(dispatch(Some(ConvoState::Choosing), &text("hello")), None);
    }

    // ── Typing states ───────────────────────────────────────────────

    #[test]
    fn typing_choice_plain_text_picks_custom_category() {
        assert_eq!(
            dispatch(Some(ConvoState::TypingChoice), &text("Most impressive skill")),
            Some(Action::PickCategory)
        );
    }

    #[test]
    fn typing_reply_plain_text_records() {
        assert_eq!(
            dispatch(Some(ConvoState::TypingReply), &text("20")),
            Some(Action::RecordCount)
        );
        // Even non-numeric text dispatches to RecordCount; validation is
        // the action's job.
        assert_eq!(
            dispatch(Some(ConvoState::TypingReply), &text("twenty")),
            Some(Action::RecordCount)
        );
    }

    #[test]
    fn commands_do_not_count_as_plain_text() {
        let cmd = Payload::Command("start".to_string());
        assert_eq!(dispatch(Some(ConvoState::TypingReply), &cmd), None);
        assert_eq!(dispatch(Some(ConvoState::TypingChoice), &cmd), None);
    }

    // ── Contact ─────────────────────────────────────────────────────

    #[test]
    fn request_contact_accepts_contact_payload() {
        assert_eq!(
            dispatch(Some(ConvoState::RequestContact), &contact()),
            Some(Action::SaveContact)
        );
    }

    #[test]
    fn request_contact_ignores_text() {
        // Cancel has no handler by design.
        assert_eq!(dispatch(Some(ConvoState::RequestContact), &text("Cancel")), None);
        assert_eq!(dispatch(Some(ConvoState::RequestContact), &text("+15551234")), None);
    }

    #[test]
    fn contact_outside_request_state_is_ignored() {
        assert_eq!(dispatch(Some(ConvoState::Choosing), &contact()), None);
        assert_eq!(dispatch(Some(ConvoState::TypingReply), &contact()), None);
    }

    // ── Finish ──────────────────────────────────────────────────────

    #[test]
    fn done_finishes_from_every_live_state() {
        for state in [
            ConvoState::Choosing,
            ConvoState::TypingReply,
            ConvoState::TypingChoice,
            ConvoState::RequestContact,
        ] {
            assert_eq!(
                dispatch(Some(state), &text("Done")),
                Some(Action::Finish),
                "Done should finish from {state}"
            );
        }
    }

    #[test]
    fn done_does_not_match_terminal_sessions() {
        assert_eq!(dispatch(Some(ConvoState::Done), &text("Done")), None);
    }
}
