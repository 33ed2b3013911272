mod telegram;

pub use telegram::{BotApi, TelegramTransport};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The target message cannot be edited (deleted, too old, or not ours).
    #[error("Message not editable: {0}")]
    NotEditable(String),
    #[error("Message rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Inline button grid attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    pub fn single(button: Button) -> Self {
        Self { rows: vec![vec![button]] }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub reply_to: Option<i32>,
    pub html: bool,
}

impl OutgoingMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
            reply_to: None,
            html: false,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn reply_to(mut self, message_id: i32) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn html(mut self) -> Self {
        self.html = true;
        self
    }
}

/// Outbound half of the chat platform. Implementations must bound every call with a timeout.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Returns the id of the sent message.
    async fn send(&self, message: OutgoingMessage) -> Result<i32, DeliveryError>;

    /// Returns the id of the edited message.
    async fn edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<i32, DeliveryError>;
}
