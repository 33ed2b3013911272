use crate::{
    error::BotResult,
    service::dialogue::model::{Action, StateTag},
    storage::model::FaqField,
    utils::{next_page, page_count, previous_page},
};

use super::{
    dispatch::{Outcome, Turn},
    keyboard::{
        get_back_keyboard, get_confirm_keyboard, get_faq_edit_field_keyboard, get_faq_handle_keyboard,
        get_faq_page_keyboard,
    },
};

pub const FAQ_PAGE_SIZE: usize = 9;

/// Shows `text` with a single back button to the FAQ menu and waits for free text.
async fn prompt(turn: &mut Turn<'_>, text: impl Into<String>, tag: StateTag) -> BotResult<Outcome> {
    let keyboard = get_back_keyboard(turn.locale(), Action::HandleFaq);
    let anchor = turn.present(text, Some(keyboard)).await;
    Ok(Outcome::Await { tag, anchor })
}

pub async fn handle_callback_handle_faq(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    turn.session.scratch.clear();
    let anchor = turn
        .present(
            t!("faq.handle.mode_choice", locale = locale),
            Some(get_faq_handle_keyboard(locale)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::HandleFaq,
        anchor,
    })
}

pub async fn handle_callback_add_faq(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let text = t!("faq.handle.input_question_suggestion", locale = turn.locale());
    prompt(turn, text, StateTag::AddFaq).await
}

/// Holds the question as a draft; the entry is only written once the answer arrives.
pub async fn handle_message_faq_question(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    turn.session.scratch.faq_draft = Some(text.to_string());
    let prompt_text = t!("faq.handle.input_answer_suggestion", locale = turn.locale());
    prompt(turn, prompt_text, StateTag::InputFaqText).await
}

pub async fn handle_message_faq_answer(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let Some(question) = turn.session.scratch.faq_draft.take() else {
        return Ok(Outcome::Finish);
    };
    let id = turn.app.records.insert_faq(&question, text).await?;
    info!("FAQ entry {} added by {}", id, turn.session.identity);

    turn.notify(t!("faq.message.added_confirmation", locale = turn.locale(), id = id))
        .await;
    Ok(Outcome::Finish)
}

pub async fn handle_callback_remove_faq(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let text = t!("faq.handle.input_id_to_remove_suggestion", locale = turn.locale());
    prompt(turn, text, StateTag::RemoveFaq).await
}

pub async fn handle_message_faq_id_to_remove(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let Some(id) = turn.read_positive(text).await else {
        return Ok(Outcome::Finish);
    };
    let locale = turn.locale();

    if turn.app.records.delete_faq(id).await? {
        info!("FAQ entry {} deleted by {}", id, turn.session.identity);
        turn.notify(t!("faq.message.deleted_confirmation", locale = locale, id = id))
            .await;
    } else {
        turn.notify(t!("faq.message.not_found_warning", locale = locale, id = id))
            .await;
    }
    Ok(Outcome::Finish)
}

pub async fn handle_callback_edit_faq(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let text = t!("faq.handle.input_id_to_edit_suggestion", locale = turn.locale());
    prompt(turn, text, StateTag::EditFaq).await
}

pub async fn handle_message_faq_id_to_edit(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let Some(id) = turn.read_positive(text).await else {
        return Ok(Outcome::Finish);
    };
    let locale = turn.locale();

    if turn.app.records.find_faq(id).await?.is_none() {
        turn.notify(t!("faq.message.not_found_warning", locale = locale, id = id))
            .await;
        return Ok(Outcome::Finish);
    }

    turn.session.scratch.faq_id = Some(id);
    let anchor = turn
        .present(
            t!("faq.handle.edit_field_choice", locale = locale, id = id),
            Some(get_faq_edit_field_keyboard(locale)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::InputFaqIdToEdit,
        anchor,
    })
}

pub async fn handle_callback_edit_faq_field(turn: &mut Turn<'_>, tag: StateTag) -> BotResult<Outcome> {
    let locale = turn.locale();
    let text = if tag == StateTag::EditFaqText {
        t!("faq.handle.input_new_question_suggestion", locale = locale)
    } else {
        t!("faq.handle.input_new_answer_suggestion", locale = locale)
    };
    prompt(turn, text, tag).await
}

pub async fn handle_message_faq_new_value(turn: &mut Turn<'_>, field: FaqField, text: &str) -> BotResult<Outcome> {
    let Some(id) = turn.session.scratch.faq_id else {
        return Ok(Outcome::Finish);
    };
    let locale = turn.locale();

    if turn.app.records.update_faq(id, field, text).await? {
        info!("FAQ entry {} {:?} edited by {}", id, field, turn.session.identity);
        turn.notify(t!("faq.message.edited_confirmation", locale = locale, id = id))
            .await;
    } else {
        turn.notify(t!("faq.message.not_found_warning", locale = locale, id = id))
            .await;
    }
    Ok(Outcome::Finish)
}

pub async fn handle_callback_clear_faq_request(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("faq.handle.clear_confirmation_request", locale = locale),
            Some(get_confirm_keyboard(locale, Action::ClearFaqConfirmation, Action::HandleFaq)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::ClearFaqRequest,
        anchor,
    })
}

pub async fn handle_callback_clear_faq_confirmation(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    turn.app.records.clear_faq().await?;
    warn!("FAQ cleared by {}", turn.session.identity);

    turn.present(t!("faq.handle.cleared_confirmation", locale = turn.locale()), None)
        .await;
    Ok(Outcome::FinishBelow)
}

async fn present_faq_page(turn: &mut Turn<'_>, page: usize, tag: StateTag) -> BotResult<Outcome> {
    let locale = turn.locale();
    let total = turn.app.records.count_faq().await?;
    let pages = page_count(total.max(0) as usize, FAQ_PAGE_SIZE);

    if pages == 0 {
        let anchor = turn
            .present(
                t!("faq.view.empty", locale = locale),
                Some(get_back_keyboard(locale, Action::Start)),
            )
            .await;
        return Ok(Outcome::Present { tag, anchor });
    }

    let page = page.min(pages - 1);
    let entries = turn
        .app
        .records
        .faq_page(page as i64, FAQ_PAGE_SIZE as i64)
        .await?;
    let anchor = turn
        .present(
            t!("faq.view.group_choice", locale = locale, page = page + 1, pages = pages),
            Some(get_faq_page_keyboard(locale, &entries)),
        )
        .await;
    turn.session.scratch.page = Some(page);
    Ok(Outcome::Present { tag, anchor })
}

pub async fn handle_callback_view_faq_group(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    present_faq_page(turn, 0, StateTag::ViewFaqGroup).await
}

pub async fn handle_callback_turn_faq_group(turn: &mut Turn<'_>, forward: bool) -> BotResult<Outcome> {
    let total = turn.app.records.count_faq().await?;
    let pages = page_count(total.max(0) as usize, FAQ_PAGE_SIZE);
    let current = turn.session.scratch.page.unwrap_or(0);

    let (page, tag) = if forward {
        (next_page(current, pages), StateTag::NextFaqGroup)
    } else {
        (previous_page(current, pages), StateTag::PreviousFaqGroup)
    };
    present_faq_page(turn, page, tag).await
}

/// Opens one entry, counting the view, and leaves it on screen.
pub async fn handle_callback_view_faq_answer(turn: &mut Turn<'_>, id: i64) -> BotResult<Outcome> {
    let locale = turn.locale();
    let text = match turn.app.records.view_faq(id).await? {
        Some(entry) => t!(
            "faq.view.entry",
            locale = locale,
            question = entry.question,
            answer = entry.answer,
            views = entry.view_count
        ),
        None => t!("faq.message.not_found_warning", locale = locale, id = id),
    };
    turn.present(text, None).await;
    Ok(Outcome::FinishBelow)
}
