//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! this module translates the callbacks to a distinct Event enum.

use crate::context::Context;
use serenity::all::{Message, Ready};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => eprintln!("Error in plugin {}: {}", plugin.name(), err),
            }
        }
    }

    // Check if a message should be interpreted as a special bot command.
    //
    // These are typically prefixed with a semicolon, e.g. `;honor grant @user 5`.
    pub async fn is_bot_cmd<'a>(&'a self, ctx: &Context<'_>, cmd: &str) -> Option<&'a Message> {
        let Event::Message(msg) = self else {
            return None;
        };

        let prefix = &ctx.cfg.read().await.general.command_prefix;
        let command = format!("{}{}", prefix, cmd);
        (msg.content.split_ascii_whitespace().next() == Some(command.as_str())).then_some(msg)
    }
}

pub enum EventHandled {
    Yes,
    No,
}
