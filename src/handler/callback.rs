use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    prelude::*,
    types::CallbackQuery,
};

use crate::{
    error::{BotError, BotResult, HandlerResult},
    state::AppState,
    transport::{BotApi, TelegramTransport},
    utils::identity_of,
};

use super::dispatch::{dispatch, EventKind, InboundEvent};

pub fn inbound_from_callback(q: &CallbackQuery) -> BotResult<InboundEvent> {
    let data = q
        .data
        .clone()
        .ok_or_else(|| BotError::MalformedUpdate("No callback data".into()))?;
    let message = q
        .message
        .as_ref()
        .ok_or_else(|| BotError::MalformedUpdate("No message".into()))?;

    let user_id = q.from.id.0 as i64;
    Ok(InboundEvent {
        identity: identity_of(q.from.username.as_deref(), user_id),
        user_id,
        chat_id: message.chat().id.0,
        message_id: message.id().0,
        username: q.from.username.clone(),
        first_name: q.from.first_name.clone(),
        last_name: q.from.last_name.clone(),
        kind: EventKind::Button(data),
    })
}

async fn handle_callback<B: BotApi>(bot: B, q: CallbackQuery, state: AppState) -> HandlerResult<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).send().await {
        warn!("Failed to answer callback query: {}", e);
    }

    let event = inbound_from_callback(&q)?;
    let transport = TelegramTransport::new(bot);
    dispatch(&state, &transport, event).await?;
    Ok(())
}

pub fn get_callback_handler<B: BotApi>() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_callback_query().endpoint(handle_callback::<B>)
}
