use std::sync::Arc;

use repbot::config::BotConfig;
use repbot::convo::ConversationController;
use repbot::transport::{CliTransport, TelegramTransport, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env();

    eprintln!("🤖 Repbot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Sessions: idle timeout {}s, sweep every {}s",
        config.session_idle_timeout.as_secs(),
        config.eviction_interval.as_secs()
    );

    // Telegram if a bot token is set, CLI otherwise
    let transport: Arc<dyn Transport> = match std::env::var("TELEGRAM_BOT_TOKEN") {
        Ok(token) => {
            let allowed_users: Vec<String> = std::env::var("TELEGRAM_ALLOWED_USERS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            eprintln!(
                "   Transport: telegram (allowed: {})\n",
                if allowed_users.iter().any(|u| u == "*") {
                    "everyone".to_string()
                } else {
                    allowed_users.join(", ")
                }
            );

            Arc::new(TelegramTransport::new(
                secrecy::SecretString::from(token),
                allowed_users,
                config.poll_timeout_secs,
            ))
        }
        Err(_) => {
            eprintln!("   Transport: cli (set TELEGRAM_BOT_TOKEN to go live)");
            eprintln!("   Type /start to begin. Ctrl-D to exit.\n");
            Arc::new(CliTransport::new())
        }
    };

    let controller = Arc::new(ConversationController::new(config, transport));
    controller.run().await?;

    Ok(())
}
