use crate::{event::*, plugin::*};
use anyhow::Result;

/// Static card describing who maintains the bot.
pub struct Developer;

#[serenity::async_trait]
impl Plugin for Developer {
    fn name(&self) -> &'static str {
        "developer"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} - show bot developer information",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some(msg) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        msg.reply(
            ctx.cache_http,
            "👨‍💻 honorbot developer info\n\
             Maintained by the server staff.  Written in Rust with the serenity crate.\n\
             Bug reports and feature requests: ping a staff member or open an issue on the \
             server's bot repository.",
        )
        .await?;

        Ok(EventHandled::Yes)
    }
}
