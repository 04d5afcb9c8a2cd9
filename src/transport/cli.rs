//! CLI transport — stdin/stdout REPL for local testing.
//!
//! Keyboards are rendered as bracketed label rows on stderr. A line
//! starting with `/` is a command; `contact <phone> [first name]`
//! simulates sharing a contact so the contact flow is reachable locally.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::TransportError;
use crate::transport::{EventStream, Inbound, Outbound, ReplyOptions, Transport};

/// Party id used for everything typed on stdin.
const LOCAL_PARTY: &str = "local-user";

/// A simple CLI transport that reads from stdin and writes to stdout.
pub struct CliTransport;

impl CliTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for CliTransport {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, TransportError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        if tx.send(parse_line(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send(&self, _party_id: &str, message: Outbound) -> Result<(), TransportError> {
        println!("\n{}", message.text);
        match &message.reply {
            ReplyOptions::Keyboard(keyboard) => {
                for row in &keyboard.rows {
                    let labels: Vec<String> =
                        row.iter().map(|b| format!("[{}]", b.label)).collect();
                    eprintln!("  {}", labels.join(" "));
                }
            }
            ReplyOptions::RemoveKeyboard | ReplyOptions::None => {}
        }
        eprint!("> ");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Map one stdin line to a transport event.
fn parse_line(line: &str) -> Inbound {
    if let Some(rest) = line.strip_prefix('/') {
        let name = rest.split_whitespace().next().unwrap_or("");
        return Inbound::command(LOCAL_PARTY, name);
    }
    if let Some(rest) = line.strip_prefix("contact ") {
        let mut parts = rest.split_whitespace();
        if let Some(phone) = parts.next() {
            let first_name = parts.collect::<Vec<_>>().join(" ");
            let first_name = if first_name.is_empty() {
                LOCAL_PARTY.to_string()
            } else {
                first_name
            };
            return Inbound::contact(LOCAL_PARTY, phone, first_name);
        }
    }
    Inbound::text(LOCAL_PARTY, line)
}
