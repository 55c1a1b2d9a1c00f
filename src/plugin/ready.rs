use crate::{event::*, plugin::*};
use anyhow::Result;
use serenity::all::ActivityData;

/// Sets the bot's presence once the connection to Discord is ready.
pub struct Ready;

#[serenity::async_trait]
impl Plugin for Ready {
    fn name(&self) -> &'static str {
        "ready"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Event::Ready(_) = event else {
            return Ok(EventHandled::No);
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        ctx.cache_http
            .set_activity(Some(ActivityData::playing(format!("{}help", prefix))));

        Ok(EventHandled::Yes)
    }
}
