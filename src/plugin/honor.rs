use crate::{
    event::*,
    helper::{has_privileged_role, parse_user_mention, NickHelper},
    ledger::{Actor, LedgerError},
    log_internal, notify,
    plugin::*,
};
use anyhow::Result;
use serenity::all::{Message, UserId};

/// How many entries the ranking and history views show.
const DISPLAY_LIMIT: usize = 10;

/// The honor-point command surface.  Parses mentions and amounts,
/// resolves display names, and delegates to the ledger; it never touches
/// the balance map or history directly.
pub struct Honor;

#[serenity::async_trait]
impl Plugin for Honor {
    fn name(&self) -> &'static str {
        "honor"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{p}honor grant <@user> <points> - grant honor points to another member\n\
             {p}honor remove <@user> <points> - deduct honor points (privileged roles only)\n\
             {p}honor ranking - top honor point holders\n\
             {p}honor history - recent grants and deductions\n\
             {p}honor mine - your own honor history",
            p = prefix
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some(msg) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let tokens: Vec<&str> = msg.content.split_whitespace().collect();
        match tokens.get(1) {
            Some(&"grant") => grant(ctx, msg, &tokens[2..]).await,
            Some(&"remove") => remove(ctx, msg, &tokens[2..]).await,
            Some(&"ranking") => ranking(ctx, msg).await,
            Some(&"history") => history(ctx, msg, None).await,
            Some(&"mine") => {
                let name = msg.author.nick_in_guild(ctx, msg.guild_id).await;
                history(ctx, msg, Some(name)).await
            }
            _ => {
                let prefix = ctx.cfg.read().await.general.command_prefix.clone();
                msg.reply(
                    ctx.cache_http,
                    format!("Unknown honor subcommand.  See `{}help`.", prefix),
                )
                .await?;
                Ok(EventHandled::Yes)
            }
        }
    }
}

fn parse_target(args: &[&str]) -> Option<(UserId, i64)> {
    let user_id = parse_user_mention(args.first()?)?;
    let amount = args.get(1)?.parse().ok()?;
    Some((user_id, amount))
}

async fn grant(ctx: &Context<'_>, msg: &Message, args: &[&str]) -> Result<EventHandled> {
    let Some((recipient_id, amount)) = parse_target(args) else {
        msg.reply(ctx.cache_http, "Usage: honor grant <@user> <points>")
            .await?;
        return Ok(EventHandled::Yes);
    };

    let granter_name = msg.author.nick_in_guild(ctx, msg.guild_id).await;
    let recipient_name = recipient_id.nick_in_guild(ctx, msg.guild_id).await;
    let granter = Actor {
        id: msg.author.id.to_string(),
        name: granter_name.clone(),
    };
    let recipient = Actor {
        id: recipient_id.to_string(),
        name: recipient_name.clone(),
    };

    // Hold the write lock across the mutate+persist pair so concurrent
    // commands cannot interleave their file writes.
    let result = {
        let mut ledger = ctx.ledger.write().await;
        ledger.credit(&granter, &recipient, amount).await
    };

    let total = match result {
        Ok(total) => total,
        Err(err) => return reply_ledger_error(ctx, msg, err).await,
    };

    msg.channel_id
        .say(
            ctx.cache_http,
            format!(
                "🎉 {} granted {} honor point(s) to {}!  {} now has {} point(s).",
                granter_name, amount, recipient_name, recipient_name, total
            ),
        )
        .await?;

    // The mutation is already persisted; a lost notification must not
    // fail the command.
    let direct = format!(
        "🎉 {} granted you {} honor point(s)!",
        granter_name, amount
    );
    let fallback = format!(
        "Could not DM {}.  {} granted them {} honor point(s).",
        recipient_name, granter_name, amount
    );
    if let Err(err) = notify::notify_user(ctx, recipient_id, &direct, &fallback).await {
        log_internal!("Honor grant notification failed entirely: {}", err);
    }

    Ok(EventHandled::Yes)
}

async fn remove(ctx: &Context<'_>, msg: &Message, args: &[&str]) -> Result<EventHandled> {
    if !has_privileged_role(ctx, msg).await? {
        msg.reply(
            ctx.cache_http,
            "You do not have permission to deduct honor points.",
        )
        .await?;
        return Ok(EventHandled::Yes);
    }

    let Some((recipient_id, amount)) = parse_target(args) else {
        msg.reply(ctx.cache_http, "Usage: honor remove <@user> <points>")
            .await?;
        return Ok(EventHandled::Yes);
    };

    let remover_name = msg.author.nick_in_guild(ctx, msg.guild_id).await;
    let recipient_name = recipient_id.nick_in_guild(ctx, msg.guild_id).await;
    let remover = Actor {
        id: msg.author.id.to_string(),
        name: remover_name.clone(),
    };
    let recipient = Actor {
        id: recipient_id.to_string(),
        name: recipient_name.clone(),
    };

    let result = {
        let mut ledger = ctx.ledger.write().await;
        ledger.debit(&remover, &recipient, amount).await
    };

    let remaining = match result {
        Ok(remaining) => remaining,
        Err(err) => return reply_ledger_error(ctx, msg, err).await,
    };

    msg.channel_id
        .say(
            ctx.cache_http,
            format!(
                "🔻 {} deducted {} honor point(s) from {}.  {} now has {} point(s).",
                remover_name, amount, recipient_name, recipient_name, remaining
            ),
        )
        .await?;

    let direct = format!(
        "🔻 {} deducted {} honor point(s) from you.",
        remover_name, amount
    );
    let fallback = format!(
        "Could not DM {}.  {} deducted {} honor point(s) from them.",
        recipient_name, remover_name, amount
    );
    if let Err(err) = notify::notify_user(ctx, recipient_id, &direct, &fallback).await {
        log_internal!("Honor removal notification failed entirely: {}", err);
    }

    Ok(EventHandled::Yes)
}

/// Validation errors go back to the invoker; persistence failures are
/// logged in full and surfaced as a generic message.
async fn reply_ledger_error(
    ctx: &Context<'_>,
    msg: &Message,
    err: LedgerError,
) -> Result<EventHandled> {
    let reply = match &err {
        LedgerError::SelfTarget | LedgerError::InsufficientBalance { .. } => err.to_string(),
        LedgerError::Store(source) => {
            log_internal!("Failed to persist the honor ledger: {}", source);
            "Something went wrong while saving the ledger.  Please try again later.".to_string()
        }
    };

    msg.reply(ctx.cache_http, reply).await?;
    Ok(EventHandled::Yes)
}

async fn ranking(ctx: &Context<'_>, msg: &Message) -> Result<EventHandled> {
    let ranked = ctx.ledger.read().await.rank(DISPLAY_LIMIT);

    if ranked.is_empty() {
        msg.reply(ctx.cache_http, "No honor points have been recorded yet.")
            .await?;
        return Ok(EventHandled::Yes);
    }

    let mut reply = String::from("🏆 Honor point ranking:\n");
    for (index, (user_id, points)) in ranked.iter().enumerate() {
        // The ledger stores only ids; names are resolved at render time.
        let name = match user_id.parse::<u64>() {
            Ok(raw) => UserId::new(raw).nick_in_guild(ctx, msg.guild_id).await,
            Err(_) => user_id.clone(),
        };
        reply.push_str(&format!("{}. {} - {} point(s)\n", index + 1, name, points));
    }

    msg.reply(ctx.cache_http, reply).await?;
    Ok(EventHandled::Yes)
}

async fn history(
    ctx: &Context<'_>,
    msg: &Message,
    filter: Option<String>,
) -> Result<EventHandled> {
    let entries: Vec<String> = {
        let ledger = ctx.ledger.read().await;
        ledger
            .history(filter.as_deref(), DISPLAY_LIMIT)
            .iter()
            .map(|line| line.to_string())
            .collect()
    };

    if entries.is_empty() {
        msg.reply(ctx.cache_http, "No honor records found.").await?;
        return Ok(EventHandled::Yes);
    }

    let mut reply = String::from("📜 Honor history:\n");
    for entry in entries {
        reply.push_str(&entry);
        reply.push('\n');
    }

    msg.reply(ctx.cache_http, reply).await?;
    Ok(EventHandled::Yes)
}
