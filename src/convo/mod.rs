//! The conversation core: states, sessions, the dispatch table, and the
//! controller that ties them to a transport.

pub mod controller;
pub mod keyboards;
pub mod rules;
pub mod session;
pub mod state;

pub use controller::ConversationController;
pub use session::Session;
pub use state::ConvoState;
