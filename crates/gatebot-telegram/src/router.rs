use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use gatebot_core::{
    config::Config,
    domain::UserId,
    fanout::NotificationFanout,
    lifecycle::ApplicationLifecycle,
    messaging::port::MessagingPort,
    ports::{InvitePort, MembershipPort},
};

use crate::group::TelegramGroup;
use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub lifecycle: Arc<ApplicationLifecycle>,
    pub fanout: Arc<NotificationFanout>,
    pub messenger: Arc<dyn MessagingPort>,
    pub membership: Arc<dyn MembershipPort>,
    pub invites: Arc<dyn InvitePort>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    lifecycle: Arc<ApplicationLifecycle>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!(username = me.username(), "gatebot started");
    }
    info!(
        admins = cfg.admin_ids.len(),
        group_chat_id = cfg.group_chat_id,
        "configuration loaded"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let group = Arc::new(TelegramGroup::new(bot.clone(), cfg.group_chat_id));
    let fanout = Arc::new(NotificationFanout::new(
        cfg.admin_ids.iter().map(|&id| UserId(id)).collect(),
        messenger.clone(),
    ));

    let state = Arc::new(AppState {
        cfg,
        lifecycle,
        fanout,
        messenger,
        membership: group.clone(),
        invites: group,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
