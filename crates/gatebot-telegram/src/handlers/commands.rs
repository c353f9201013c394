use std::sync::Arc;

use teloxide::{prelude::*, types::User};
use tracing::{error, warn};

use gatebot_core::{
    domain::{ChatId, UserId},
    formatting::escape_html,
    messaging::types::{CallbackAction, InlineButton, InlineKeyboard},
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Commands only make sense in the private chat with the bot.
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let (cmd, _args) = parse_command(msg.text().unwrap_or(""));
    let result = match cmd.as_str() {
        "start" => start(&msg, user, &state).await,
        "botlink" => botlink(&bot, &msg, user, &state).await,
        _ => Ok(()),
    };

    if let Err(e) = result {
        error!(
            user_id = user.id.0,
            command = %cmd,
            error = %e,
            "command handler failed"
        );
        let _ = state
            .messenger
            .send_html(
                ChatId(msg.chat.id.0),
                "Something went wrong. Please try again later.",
            )
            .await;
    }

    Ok(())
}

async fn start(msg: &Message, user: &User, state: &AppState) -> gatebot_core::Result<()> {
    let chat = ChatId(msg.chat.id.0);
    let user_id = UserId(user.id.0 as i64);
    let first_name = escape_html(&user.first_name);

    if state.cfg.is_admin(user_id.0) {
        state
            .messenger
            .send_html(
                chat,
                &format!(
                    "Hello, {first_name}! You are an administrator of this bot. \
                     You will be notified whenever a new join application arrives."
                ),
            )
            .await?;
        return Ok(());
    }

    // Membership lookup fails safe: a transient error must not block the flow.
    let already_member = match state.membership.is_member(user_id).await {
        Ok(v) => v,
        Err(e) => {
            warn!(
                user_id = user_id.0,
                error = %e,
                "membership lookup failed, assuming not a member"
            );
            false
        }
    };
    if already_member {
        state
            .messenger
            .send_html(
                chat,
                &format!("Hello, {first_name}! You are already a member of the group."),
            )
            .await?;
        return Ok(());
    }

    if state.lifecycle.has_pending(user_id).await? {
        state
            .messenger
            .send_html(
                chat,
                &format!(
                    "Hello, {first_name}! You already have an active join application. \
                     Please wait for the administrators to review it."
                ),
            )
            .await?;
        return Ok(());
    }

    let keyboard = InlineKeyboard::row(vec![InlineButton::new(
        "Apply to join the group",
        CallbackAction::Apply,
    )]);
    state
        .messenger
        .send_inline_keyboard(
            chat,
            &format!(
                "Hello, {first_name}! This bot helps you apply to join our private group."
            ),
            keyboard,
        )
        .await?;
    Ok(())
}

async fn botlink(
    bot: &Bot,
    msg: &Message,
    user: &User,
    state: &AppState,
) -> gatebot_core::Result<()> {
    if !state.cfg.is_admin(user.id.0 as i64) {
        return Ok(());
    }

    let me = bot
        .get_me()
        .await
        .map_err(|e| gatebot_core::Error::Transport(format!("get_me failed: {e}")))?;
    let link = format!("https://t.me/{}", me.username());

    state
        .messenger
        .send_html(
            ChatId(msg.chat.id.0),
            &format!(
                "This bot handles applications to join the group.\n\n\
                 Add this link to the group description so users can apply:\n{link}\n\n\
                 Suggested description text:\n\
                 \"To join the group, follow the link and submit an application: {link}\""
            ),
        )
        .await?;
    Ok(())
}
