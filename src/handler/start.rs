use crate::{
    error::BotResult,
    service::{dialogue::model::StateTag, session::CurrentState},
};

use super::{dispatch::Turn, keyboard::get_root_menu_keyboard, language};

/// Root menu. Always reachable; resets scratch and forces a language choice first.
pub async fn render_root(turn: &mut Turn<'_>) -> BotResult<()> {
    turn.session.scratch.clear();
    turn.session.awaiting_input = false;

    if turn.session.language.is_none() {
        let anchor = language::present_language_picker(turn, 0, true).await;
        turn.session.state = CurrentState::new(StateTag::NeededLanguage, Some(anchor));
        return Ok(());
    }

    let text = t!("start.mode_choice", locale = turn.locale());
    let keyboard = get_root_menu_keyboard(&turn.session);
    let anchor = turn.present(text, Some(keyboard)).await;

    turn.session.state = CurrentState::new(StateTag::Start, Some(anchor));
    Ok(())
}
