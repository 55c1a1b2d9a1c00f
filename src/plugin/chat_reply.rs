use crate::{event::*, llm::ChatRequest, log_internal, plugin::*};
use anyhow::Result;

/// Relays messages in the configured chat channel (and all DMs) to the
/// chat-completion endpoint and posts the reply.  Upstream failures are
/// absorbed with an apology so the event loop never crashes.
pub struct ChatReply;

#[serenity::async_trait]
impl Plugin for ChatReply {
    fn name(&self) -> &'static str {
        "chat_reply"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        let is_dm = msg.guild_id.is_none();
        let relay_channel = ctx.cfg.read().await.llm.channel_id;
        if !is_dm && msg.channel_id.get() != relay_channel {
            return Ok(EventHandled::No);
        }

        let typing = msg.channel_id.start_typing(ctx.http);

        let reply = {
            let cfg = ctx.cfg.read().await;
            match ChatRequest::single_turn(&cfg.llm, &msg.content)
                .post(&cfg.llm)
                .await
            {
                Ok(reply) => reply,
                Err(err) => {
                    log_internal!("Chat relay request failed: {}", err);
                    "Something went wrong while thinking.  Please try again later.".to_string()
                }
            }
        };

        typing.stop();
        msg.channel_id.say(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}
