use crate::{
    error::BotResult,
    service::{
        dialogue::model::StateTag,
        language::{language_pages, Language},
    },
    utils::{next_page, previous_page},
};

use super::{
    dispatch::{Outcome, Turn},
    keyboard::get_language_keyboard,
};

pub async fn present_language_picker(turn: &mut Turn<'_>, page: usize, forced: bool) -> i32 {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("main.language_choice_suggestion", locale = locale),
            Some(get_language_keyboard(locale, page, forced)),
        )
        .await;
    turn.session.scratch.page = Some(page);
    anchor
}

pub async fn handle_callback_view_languages_group(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    info!("Language picker for {}", turn.session.identity);
    let anchor = present_language_picker(turn, 0, false).await;
    Ok(Outcome::Present {
        tag: StateTag::ViewLanguagesGroup,
        anchor,
    })
}

pub async fn handle_callback_turn_languages_group(turn: &mut Turn<'_>, forward: bool) -> BotResult<Outcome> {
    let forced = turn.session.state.tag == Some(StateTag::NeededLanguage);
    let tag = match (forced, forward) {
        (true, _) => StateTag::NeededLanguage,
        (false, true) => StateTag::NextLanguagesGroup,
        (false, false) => StateTag::PreviousLanguagesGroup,
    };

    let pages = language_pages();
    let current = turn.session.scratch.page.unwrap_or(0);
    let page = if forward {
        next_page(current, pages)
    } else {
        previous_page(current, pages)
    };

    let anchor = present_language_picker(turn, page, forced).await;
    Ok(Outcome::Present { tag, anchor })
}

pub async fn handle_callback_set_language(turn: &mut Turn<'_>, language: Language) -> BotResult<Outcome> {
    info!("{} switches language to {}", turn.session.identity, language);
    turn.app.sessions.set_language(&mut turn.session, language).await?;
    Ok(Outcome::Finish)
}
