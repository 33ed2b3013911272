use async_trait::async_trait;
use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, ReplyParameters},
    ApiError, RequestError,
};

use super::{ChatTransport, DeliveryError, Keyboard, OutgoingMessage};

/// Any bot handle a dispatcher can inject: `Throttle<Bot>` in production, a plain `Bot` under test.
pub trait BotApi:
    Requester<Err = RequestError, SendMessage: Send, EditMessageText: Send> + Clone + Send + Sync + 'static
{
}

impl<B> BotApi for B where
    B: Requester<Err = RequestError, SendMessage: Send, EditMessageText: Send> + Clone + Send + Sync + 'static
{
}

/// Bot API calls inherit the HTTP client's request timeout configured in `bot.rs`.
#[derive(Clone)]
pub struct TelegramTransport<B> {
    bot: B,
}

impl<B: BotApi> TelegramTransport<B> {
    pub fn new(bot: B) -> Self {
        Self { bot }
    }
}

fn to_markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.data))
            .collect::<Vec<_>>()
    }))
}

fn edit_outcome(result: Result<(), RequestError>, message_id: i32) -> Result<i32, DeliveryError> {
    match result {
        Ok(()) => Ok(message_id),
        // identical content counts as a successful edit
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(message_id),
        Err(e) => Err(DeliveryError::NotEditable(e.to_string())),
    }
}

#[async_trait]
impl<B: BotApi> ChatTransport for TelegramTransport<B> {
    async fn send(&self, message: OutgoingMessage) -> Result<i32, DeliveryError> {
        let mut request = self.bot.send_message(ChatId(message.chat_id), message.text);
        if let Some(keyboard) = message.keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }
        if let Some(reply_to) = message.reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }
        if message.html {
            request = request.parse_mode(ParseMode::Html);
        }

        match request.send().await {
            Ok(sent) => Ok(sent.id.0),
            Err(e) => Err(DeliveryError::Rejected(e.to_string())),
        }
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<i32, DeliveryError> {
        let mut request = self.bot.edit_message_text(ChatId(chat_id), MessageId(message_id), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }

        edit_outcome(request.send().await.map(|_| ()), message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Button;

    #[test]
    fn test_unchanged_edit_counts_as_success() {
        let result = edit_outcome(Err(RequestError::Api(ApiError::MessageNotModified)), 42);
        assert!(matches!(result, Ok(42)));
    }

    #[test]
    fn test_missing_message_is_not_editable() {
        let result = edit_outcome(Err(RequestError::Api(ApiError::MessageToEditNotFound)), 42);
        assert!(matches!(result, Err(DeliveryError::NotEditable(_))));

        let result = edit_outcome(Err(RequestError::Api(ApiError::BotBlocked)), 42);
        assert!(matches!(result, Err(DeliveryError::NotEditable(_))));
    }

    #[test]
    fn test_markup_keeps_rows_and_callback_data() {
        let keyboard = Keyboard::new(vec![
            vec![Button::new("A", "a"), Button::new("B", "b")],
            vec![Button::new("C", "c")],
        ]);
        let markup = to_markup(keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "C");
    }
}
