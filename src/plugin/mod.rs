pub use crate::context::Context;

use crate::event::{Event, EventHandled};
use anyhow::Result;

mod chat_reply;
mod debug;
mod developer;
mod help;
mod honor;
mod ignore_bots;
mod ready;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Used for debug
    fn name(&self) -> &'static str;
    /// Help message lines.  None if the plugin has no user-facing command
    async fn usage(&self, ctx: &Context<'_>) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    ///   handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    use crate::plugin::*;

    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ignore_bots::IgnoreBots),
        Box::new(ready::Ready),
        Box::new(help::Help),
        // Honor ledger command surface
        Box::new(honor::Honor),
        Box::new(developer::Developer),
        // Chat relay, used if no other plugin handles the event.
        // Keep last.
        Box::new(chat_reply::ChatReply),
    ]
}
