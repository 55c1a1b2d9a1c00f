//! Best-effort direct notifications with a channel fallback.

use crate::{context::Context, log_internal};
use anyhow::Result;
use serenity::all::{ChannelId, CreateMessage, UserId};

/// DM `user_id` with `direct`; if the DM cannot be delivered (closed
/// DMs, blocked bot), post `fallback` to the configured fallback
/// channel instead.
///
/// The ledger mutation has already been persisted by the time this
/// runs, so callers log a delivery failure rather than failing the
/// command.
pub async fn notify_user(
    ctx: &Context<'_>,
    user_id: UserId,
    direct: &str,
    fallback: &str,
) -> Result<()> {
    let message = CreateMessage::new().content(direct);
    let delivered = match user_id.to_user(ctx.http).await {
        Ok(user) => user.direct_message(ctx.cache_http, message).await.is_ok(),
        Err(_) => false,
    };

    if delivered {
        return Ok(());
    }

    log_internal!("Could not DM user {}; notifying the fallback channel", user_id);
    let channel = ChannelId::new(ctx.cfg.read().await.general.fallback_channel_id);
    channel.say(ctx.cache_http, fallback).await?;
    Ok(())
}
