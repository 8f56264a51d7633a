//! Configuration validation functions.

use super::Config;

/// Reject configurations the server cannot run with. Called once at
/// startup after loading; `--validate-config` surfaces the result and
/// exits.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.scheduler.tick_rate == 0 {
        anyhow::bail!("scheduler.tick_rate must be greater than zero");
    }

    if config.server.outbound_queue_capacity == 0 {
        anyhow::bail!("server.outbound_queue_capacity must be greater than zero");
    }

    if config.server.max_message_size == 0 {
        anyhow::bail!("server.max_message_size must be greater than zero");
    }

    if config.matchmaking.max_players_limit == 0 {
        anyhow::bail!("matchmaking.max_players_limit must be greater than zero");
    }

    if config.chat.max_message_length == 0 {
        anyhow::bail!("chat.max_message_length must be greater than zero");
    }

    if config.chat.history_capacity == 0 {
        anyhow::bail!("chat.history_capacity must be greater than zero");
    }

    Ok(())
}
