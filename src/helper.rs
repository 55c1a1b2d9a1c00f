//! Miscellaneous convenience methods

use crate::context::Context;
use anyhow::Result;
use serenity::all::{GuildId, Message, UserId};

/// Parse a raw Discord user mention token such as `<@1234567890>` or
/// `<@!1234567890>`.
pub fn parse_user_mention(token: &str) -> Option<UserId> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    inner.parse::<u64>().ok().map(UserId::new)
}

#[serenity::async_trait]
pub trait NickHelper {
    /// Preferred display name: the per-guild nickname when one is set,
    /// the global username otherwise (e.g. in DMs).
    async fn nick_in_guild(&self, ctx: &Context<'_>, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl NickHelper for serenity::all::User {
    async fn nick_in_guild(&self, ctx: &Context<'_>, guild_id: Option<GuildId>) -> String {
        let nick = match guild_id {
            Some(guild_id) => self.nick_in(ctx.cache_http, guild_id).await,
            None => None,
        };

        nick.unwrap_or_else(|| self.name.clone())
    }
}

#[serenity::async_trait]
impl NickHelper for serenity::all::UserId {
    async fn nick_in_guild(&self, ctx: &Context<'_>, guild_id: Option<GuildId>) -> String {
        match self.to_user(ctx.cache_http).await {
            Ok(user) => user.nick_in_guild(ctx, guild_id).await,
            Err(_) => format!("<unknown-user-{}>", *self),
        }
    }
}

/// Whether the message author holds one of the configured privileged
/// roles.  Resolved here, at the command boundary, so the ledger itself
/// stays authorization-agnostic.  Always false in DMs.
pub async fn has_privileged_role(ctx: &Context<'_>, msg: &Message) -> Result<bool> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(false);
    };

    let member = guild_id.member(ctx.cache_http, msg.author.id).await?;
    let roles = guild_id.roles(ctx.http).await?;
    let privileged = &ctx.cfg.read().await.general.privileged_roles;

    Ok(member
        .roles
        .iter()
        .filter_map(|role_id| roles.get(role_id))
        .any(|role| {
            privileged
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&role.name))
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_nickname_mentions() {
        assert_eq!(parse_user_mention("<@123>"), Some(UserId::new(123)));
        assert_eq!(parse_user_mention("<@!456>"), Some(UserId::new(456)));
    }

    #[test]
    fn rejects_non_mentions() {
        assert_eq!(parse_user_mention("bob"), None);
        assert_eq!(parse_user_mention("<@abc>"), None);
        assert_eq!(parse_user_mention("<#123>"), None);
        assert_eq!(parse_user_mention("<@123"), None);
    }
}
