//! ConversationController — drives the dialogue state machine.
//!
//! Holds the per-party session table and emits replies through the
//! transport. Transition and reply are one atomic step per party: the
//! per-party session lock is held across the send, so a second event for
//! the same party never observes a half-applied transition. Different
//! parties share nothing and are handled concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Mutex;

use crate::config::BotConfig;
use crate::convo::keyboards::{category_keyboard, contact_keyboard};
use crate::convo::rules::{self, Action};
use crate::convo::session::Session;
use crate::convo::state::ConvoState;
use crate::error::Result;
use crate::transport::{Inbound, Outbound, Payload, Transport};

const WELCOME: &str = "Hi! My name is Doctor Botter. I will hold a more complex conversation \
                       with you. Why don't you tell me something about yourself?";
const CUSTOM_CATEGORY_PROMPT: &str =
    "Alright, please send me the category first, for example \"Most impressive skill\"";
const CONTACT_PROMPT: &str = "How can we contact you?";
const NOT_A_NUMBER: &str = "That doesn't look like a number. How many did you do?";

type SessionHandle = Arc<Mutex<Session>>;

/// Drives the conversation script over a transport.
pub struct ConversationController {
    transport: Arc<dyn Transport>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    config: BotConfig,
}

impl ConversationController {
    pub fn new(config: BotConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Consume the transport's event stream until it ends.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        self.transport.health_check().await?;
        let mut events = self.transport.start().await?;
        let _eviction_handle = spawn_eviction_task(Arc::clone(&self));
        tracing::info!(transport = self.transport.name(), "conversation loop started");

        while let Some(event) = events.next().await {
            let controller = Arc::clone(&self);
            tokio::spawn(async move {
                let party_id = event.party_id.clone();
                if let Err(e) = controller.handle(event).await {
                    tracing::error!(party_id = %party_id, "failed to handle event: {e}");
                }
            });
        }

        self.transport.shutdown().await?;
        Ok(())
    }

    /// Handle one inbound event: find the matching rule, run its action,
    /// send the reply, move the session.
    pub async fn handle(&self, event: Inbound) -> Result<()> {
        let Some(handle) = self.session_handle(&event.party_id).await else {
            // No session yet: only the greeting can create one.
            if rules::dispatch(None, &event.payload) == Some(Action::Greet) {
                return self.greet(&event.party_id).await;
            }
            tracing::debug!(party_id = %event.party_id, "no session and no entry rule; ignoring");
            return Ok(());
        };

        let mut session = handle.lock().await;
        session.touch();
        let Some(action) = rules::dispatch(Some(session.state), &event.payload) else {
            tracing::debug!(
                party_id = %event.party_id,
                state = %session.state,
                "no rule matched; ignoring"
            );
            return Ok(());
        };

        match action {
            Action::PickCategory => self.pick_category(&event, &mut session).await?,
            Action::AskCustomCategory => self.ask_custom_category(&event, &mut session).await?,
            Action::AskContact => self.ask_contact(&event, &mut session).await?,
            Action::RecordCount => self.record_count(&event, &mut session).await?,
            Action::SaveContact => self.save_contact(&event, &mut session).await?,
            Action::Finish => self.finish(&event, &mut session).await?,
            // Greet only fires for parties with no session.
            Action::Greet => {}
        }

        if session.state.is_terminal() {
            drop(session);
            self.remove_session(&event.party_id).await;
            tracing::info!(party_id = %event.party_id, "conversation finished");
        }
        Ok(())
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Create the session and send the welcome with the category keyboard.
    async fn greet(&self, party_id: &str) -> Result<()> {
        let handle = {
            let mut sessions = self.sessions.lock().await;
            Arc::clone(
                sessions
                    .entry(party_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(Session::new()))),
            )
        };
        // Hold the party lock across the send so the welcome lands before
        // any follow-up event is handled.
        let _session = handle.lock().await;
        tracing::info!(party_id = %party_id, "conversation started");
        self.transport
            .send(party_id, Outbound::with_keyboard(WELCOME, category_keyboard()))
            .await?;
        Ok(())
    }

    /// Store the label as the current category and ask for a count.
    async fn pick_category(&self, event: &Inbound, session: &mut Session) -> Result<()> {
        let Payload::Text(text) = &event.payload else {
            return Ok(());
        };
        let prompt = format!(
            "Your {}? Yes, I would love to hear about that!",
            text.to_lowercase()
        );
        self.transport
            .send(&event.party_id, Outbound::plain(prompt))
            .await?;
        session.choice = Some(text.clone());
        session.state = ConvoState::TypingReply;
        Ok(())
    }

    /// Ask the party to name a custom category.
    async fn ask_custom_category(&self, event: &Inbound, session: &mut Session) -> Result<()> {
        self.transport
            .send(&event.party_id, Outbound::plain(CUSTOM_CATEGORY_PROMPT))
            .await?;
        session.state = ConvoState::TypingChoice;
        Ok(())
    }

    /// Ask the party to share a contact.
    async fn ask_contact(&self, event: &Inbound, session: &mut Session) -> Result<()> {
        self.transport
            .send(
                &event.party_id,
                Outbound::with_keyboard(CONTACT_PROMPT, contact_keyboard()),
            )
            .await?;
        session.state = ConvoState::RequestContact;
        Ok(())
    }

    /// Parse the count, accumulate it, reply with the running total and the
    /// full summary. Bad input re-prompts and leaves the session where it is.
    async fn record_count(&self, event: &Inbound, session: &mut Session) -> Result<()> {
        let Payload::Text(text) = &event.payload else {
            return Ok(());
        };
        let n: i64 = match text.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                self.transport
                    .send(&event.party_id, Outbound::plain(NOT_A_NUMBER))
                    .await?;
                return Ok(());
            }
        };
        let Some(category) = session.choice.take() else {
            // TypingReply is only ever entered with a choice set.
            tracing::warn!(party_id = %event.party_id, "typing_reply with no category; resetting");
            session.state = ConvoState::Choosing;
            return Ok(());
        };
        let total = session.record(&category, n);
        session.state = ConvoState::Choosing;
        let reply = format!(
            "Neat! You've done a total of {} {}!{}",
            total,
            category.to_lowercase(),
            session.summary_block()
        );
        self.transport
            .send(&event.party_id, Outbound::with_keyboard(reply, category_keyboard()))
            .await?;
        Ok(())
    }

    /// Store the shared phone number and return to the category keyboard.
    async fn save_contact(&self, event: &Inbound, session: &mut Session) -> Result<()> {
        let Payload::Contact(contact) = &event.payload else {
            return Ok(());
        };
        session.telephone = Some(contact.phone_number.clone());
        session.state = ConvoState::Choosing;
        let reply = format!(
            "Thank you {} with phone {}!",
            contact.first_name, contact.phone_number
        );
        self.transport
            .send(&event.party_id, Outbound::with_keyboard(reply, category_keyboard()))
            .await?;
        Ok(())
    }

    /// Summarize everything, clear the data, end the conversation.
    async fn finish(&self, event: &Inbound, session: &mut Session) -> Result<()> {
        // Drop the transient choice so it never shows up in the summary.
        session.choice = None;
        let reply = format!(
            "I learned these facts about you: {}Until next time!",
            session.summary_block()
        );
        self.transport
            .send(&event.party_id, Outbound::removing_keyboard(reply))
            .await?;
        session.clear();
        session.state = ConvoState::Done;
        Ok(())
    }

    // ── Session table ───────────────────────────────────────────────

    async fn session_handle(&self, party_id: &str) -> Option<SessionHandle> {
        self.sessions.lock().await.get(party_id).cloned()
    }

    async fn remove_session(&self, party_id: &str) {
        self.sessions.lock().await.remove(party_id);
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Clone of a party's session, if one exists.
    pub async fn session_snapshot(&self, party_id: &str) -> Option<Session> {
        let handle = self.session_handle(party_id).await?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Remove sessions idle longer than the configured timeout. Sessions
    /// whose lock is held are mid-handling, hence not idle.
    pub async fn evict_idle(&self) {
        let idle_timeout = self.config.session_idle_timeout;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|party_id, handle| match handle.try_lock() {
            Err(_) => true,
            Ok(session) => {
                let keep = session.last_seen.elapsed() < idle_timeout;
                if !keep {
                    tracing::info!(party_id = %party_id, "evicting idle session");
                }
                keep
            }
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "idle session sweep");
        }
    }
}

/// Spawn the periodic idle-session sweep.
pub fn spawn_eviction_task(controller: Arc<ConversationController>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(controller.config.eviction_interval);
        loop {
            interval.tick().await;
            controller.evict_idle().await;
        }
    })
}
