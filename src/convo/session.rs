//! Per-party session data.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::convo::state::ConvoState;

/// Accumulated state for one conversing party.
///
/// Created by the greeting handler, mutated only by the controller while
/// holding the per-party lock, removed from the table on reaching `Done`.
#[derive(Debug, Clone)]
pub struct Session {
    /// Where this party is in the dialogue.
    pub state: ConvoState,
    /// Category name → accumulated count.
    pub counts: BTreeMap<String, i64>,
    /// Category currently being filled in. `Some` only while the party is
    /// typing a count or a custom category name.
    pub choice: Option<String>,
    /// Shared phone number, if the party submitted a contact.
    pub telephone: Option<String>,
    /// Last time an event for this party was handled (drives idle eviction).
    pub last_seen: Instant,
}

impl Session {
    /// Fresh session at the start of the dialogue.
    pub fn new() -> Self {
        Self {
            state: ConvoState::Choosing,
            counts: BTreeMap::new(),
            choice: None,
            telephone: None,
            last_seen: Instant::now(),
        }
    }

    /// Add `n` to the accumulated count for `category`, creating it at 0.
    /// Returns the new total.
    pub fn record(&mut self, category: &str, n: i64) -> i64 {
        let total = self.counts.entry(category.to_string()).or_insert(0);
        *total = total.saturating_add(n);
        *total
    }

    /// Render the gathered data, one `"key - value"` line per entry, the
    /// whole body wrapped in a leading and trailing newline. Empty data
    /// renders as a lone pair of newlines.
    pub fn summary_block(&self) -> String {
        let mut facts: Vec<String> = self
            .counts
            .iter()
            .map(|(key, value)| format!("{key} - {value}"))
            .collect();
        if let Some(ref telephone) = self.telephone {
            facts.push(format!("telephone - {telephone}"));
        }
        format!("\n{}\n", facts.join("\n"))
    }

    /// Drop everything the party accumulated.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.choice = None;
        self.telephone = None;
    }

    /// Mark the session as just-used.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_choosing_and_empty() {
        let session = Session::new();
        assert_eq!(session.state, ConvoState::Choosing);
        assert!(session.counts.is_empty());
        assert!(session.choice.is_none());
        assert!(session.telephone.is_none());
    }

    #[test]
    fn record_accumulates_into_one_entry() {
        let mut session = Session::new();
        assert_eq!(session.record("Push ups", 10), 10);
        assert_eq!(session.record("Push ups", 5), 15);
        assert_eq!(session.counts.len(), 1);
        assert_eq!(session.counts["Push ups"], 15);
    }

    #[test]
    fn record_saturates_instead_of_overflowing() {
        let mut session = Session::new();
        session.record("Push ups", i64::MAX);
        assert_eq!(session.record("Push ups", 1), i64::MAX);
    }

    #[test]
    fn summary_empty_is_two_newlines() {
        let session = Session::new();
        assert_eq!(session.summary_block(), "\n\n");
    }

    #[test]
    fn summary_renders_key_dash_value_lines() {
        let mut session = Session::new();
        session.record("Squats", 20);
        session.record("Crunches", 7);
        assert_eq!(session.summary_block(), "\nCrunches - 7\nSquats - 20\n");
    }

    #[test]
    fn summary_includes_telephone_last() {
        let mut session = Session::new();
        session.record("Squats", 20);
        session.telephone = Some("+15551234".to_string());
        assert_eq!(
            session.summary_block(),
            "\nSquats - 20\ntelephone - +15551234\n"
        );
    }

    #[test]
    fn clear_empties_everything() {
        let mut session = Session::new();
        session.record("Squats", 20);
        session.choice = Some("Squats".to_string());
        session.telephone = Some("+15551234".to_string());
        session.clear();
        assert!(session.counts.is_empty());
        assert!(session.choice.is_none());
        assert!(session.telephone.is_none());
        assert_eq!(session.summary_block(), "\n\n");
    }
}
