use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    types::{Message, Update},
};

use crate::{
    error::{BotError, BotResult, HandlerResult},
    state::AppState,
    transport::{BotApi, TelegramTransport},
    utils::identity_of,
};

use super::dispatch::{dispatch, EventKind, InboundEvent};

pub fn inbound_from_message(msg: &Message, kind: EventKind) -> BotResult<InboundEvent> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| BotError::MalformedUpdate("Message without sender".into()))?;
    let user_id = user.id.0 as i64;

    Ok(InboundEvent {
        identity: identity_of(user.username.as_deref(), user_id),
        user_id,
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        kind,
    })
}

async fn handle_message_text<B: BotApi>(bot: B, msg: Message, state: AppState) -> HandlerResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let event = inbound_from_message(&msg, EventKind::Text(text.to_string()))?;
    dispatch(&state, &TelegramTransport::new(bot), event).await?;
    Ok(())
}

pub fn get_message_handler<B: BotApi>() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(handle_message_text::<B>)
}
