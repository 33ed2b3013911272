use teloxide::{
    dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler},
    types::{Message, Update},
};

use crate::{
    command::Command,
    error::HandlerResult,
    state::AppState,
    transport::{BotApi, TelegramTransport},
};

use super::{
    dispatch::{dispatch, EventKind},
    message::inbound_from_message,
};

async fn handle_command<B: BotApi>(bot: B, msg: Message, cmd: Command, state: AppState) -> HandlerResult<()> {
    match cmd {
        Command::Start => {
            let event = inbound_from_message(&msg, EventKind::Start)?;
            dispatch(&state, &TelegramTransport::new(bot), event).await?;
        }
    }
    Ok(())
}

pub fn get_command_handler<B: BotApi>() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command::<B>)
}
