mod config;
mod context;
mod event;
mod handler;
mod helper;
mod ledger;
mod llm;
mod logging;
mod notify;
mod plugin;
mod store;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let store = crate::store::Store::new(crate::store::Store::default_dir()?);
    let ledger = crate::ledger::Ledger::load(store).await?;
    let handler = handler::Handler::new(cfg, ledger);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
