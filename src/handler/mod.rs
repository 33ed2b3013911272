mod callback;
mod command;
mod dispatch;
mod doc;
mod faq;
mod keyboard;
mod language;
mod message;
mod question;
mod questions;
mod start;
mod users;

#[cfg(test)]
pub use callback::inbound_from_callback;
#[cfg(test)]
pub use dispatch::{dispatch, EventKind, InboundEvent};
#[cfg(test)]
pub use message::inbound_from_message;

use callback::get_callback_handler;
use command::get_command_handler;
use message::get_message_handler;
use teloxide::{dispatching::UpdateHandler, dptree};

use crate::transport::BotApi;

pub fn get_handler<B: BotApi>() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(get_command_handler::<B>())
        .branch(get_message_handler::<B>())
        .branch(get_callback_handler::<B>())
}
