//! Line-based operator console over the on-demand handlers.

use crate::handlers::SnapshotService;
use crate::model::SubscriberId;
use log::{info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: forecast <PAIR> | stats <PAIR> | sub <PAIR> | subs | \
                    threshold | mode | currency <USD|RUB|EUR> | <amount> <SYMBOL>";

pub async fn handle_line(service: &SnapshotService, user: SubscriberId, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };

    let reply = match (command.to_ascii_lowercase().as_str(), arg) {
        ("forecast" | "ai", pair) if !pair.is_empty() => service.forecast(user, pair).await,
        ("stats", pair) if !pair.is_empty() => service.stats(user, pair).await,
        ("sub", pair) if !pair.is_empty() => service.toggle_subscription(user, pair).await,
        ("subs", "") => service.subscriptions_overview(user).await,
        ("threshold", "") => service.cycle_threshold(user).await,
        ("mode", "") => service.toggle_mode(user).await,
        ("currency", code) if !code.is_empty() => service.set_currency(user, code).await,
        ("help", _) => HELP.to_string(),
        _ => match service.convert_amount(line).await {
            Some(reply) => reply,
            None => format!("unknown command, {HELP}"),
        },
    };
    Some(reply)
}

/// Serves stdin until EOF, acting as subscriber `user`.
pub async fn run(service: Arc<SnapshotService>, user: SubscriberId) {
    info!("Console ready for subscriber {}", user);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(reply) = handle_line(&service, user, &line).await {
                    println!("{reply}\n");
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Console input error: {}", e);
                break;
            }
        }
    }
    info!("Console closed");
}
