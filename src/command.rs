use teloxide::{
    adaptors::Throttle,
    macros::BotCommands,
    payloads::SetMyCommandsSetters,
    prelude::Requester,
    types::BotCommand,
    Bot,
};

use crate::{error::HandlerResult, service::language::Language};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
}

impl Command {
    pub fn user_commands(locale: &str) -> Vec<BotCommand> {
        vec![BotCommand::new("start", t!("commands.start", locale = locale))]
    }
}

/// Registers the command list once per supported language, plus a default for everyone else.
pub async fn setup_user_commands(bot: &Throttle<Bot>) -> HandlerResult<()> {
    bot.delete_my_commands().await?;
    bot.set_my_commands(Command::user_commands(Language::default().code()))
        .await?;

    for language in Language::ALL {
        bot.set_my_commands(Command::user_commands(language.code()))
            .language_code(language.code())
            .await?;
    }
    Ok(())
}
