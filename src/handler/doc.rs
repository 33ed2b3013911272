use crate::{error::BotResult, transport::OutgoingMessage};

use super::dispatch::{Outcome, Turn};

pub async fn handle_callback_view_doc(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let Some(language) = turn.session.language else {
        return Ok(Outcome::Finish);
    };
    info!("Sending documentation ({}) to {}", language, turn.session.identity);

    for section in turn.app.docs.sections(language) {
        let message = OutgoingMessage::text(turn.event.chat_id, section.clone()).html();
        if let Err(e) = turn.transport.send(message).await {
            warn!("Failed to deliver a documentation section to {}: {}", turn.session.identity, e);
        }
    }

    Ok(Outcome::FinishBelow)
}
