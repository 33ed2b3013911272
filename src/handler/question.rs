use crate::{
    error::BotResult,
    service::{dialogue::model::{Action, StateTag}, language::Language},
    storage::model::{NewQuestion, Question},
    transport::OutgoingMessage,
    utils::identity_of,
};

use super::{
    dispatch::{now, Outcome, Turn},
    keyboard::{get_back_keyboard, get_question_preview_keyboard},
};

pub async fn handle_callback_ask_question(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("main.input_question_suggestion", locale = locale),
            Some(get_back_keyboard(locale, Action::Start)),
        )
        .await;
    Ok(Outcome::Await {
        tag: StateTag::AskQuestion,
        anchor,
    })
}

pub async fn handle_message_question(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let event = turn.event;
    let question = NewQuestion {
        user_id: event.user_id,
        chat_id: event.chat_id,
        message_id: event.message_id,
        username: event.username.clone(),
        first_name: event.first_name.clone(),
        last_name: event.last_name.clone(),
        text: text.to_string(),
        asked_at: now(),
    };
    let id = turn.app.records.insert_question(&question).await?;
    info!("Question {} accepted from {}", id, turn.session.identity);

    broadcast_new_question(turn, text).await;

    turn.notify(t!("main.new_question_accepted_confirmation", locale = turn.locale()))
        .await;
    Ok(Outcome::Finish)
}

/// Tells every message-receiving moderator about a new question. Failures are per recipient.
async fn broadcast_new_question(turn: &Turn<'_>, text: &str) {
    let recipients = match turn.app.records.broadcast_recipients().await {
        Ok(recipients) => recipients,
        Err(e) => {
            warn!("Failed to load broadcast recipients: {}", e);
            return;
        }
    };

    for recipient in recipients {
        if recipient.chat_id == turn.event.chat_id {
            continue;
        }
        let locale = recipient
            .language
            .as_deref()
            .and_then(|code| code.parse::<Language>().ok())
            .unwrap_or_default()
            .code();
        let message = OutgoingMessage::text(
            recipient.chat_id,
            t!("main.new_question_notification", locale = locale, text = text),
        );
        if let Err(e) = turn.transport.send(message).await {
            warn!("Failed to notify {} about a new question: {}", recipient.username, e);
        }
    }
}

pub async fn handle_callback_answer_question(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    present_next_question(turn).await
}

pub async fn handle_callback_decline_question(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    if let Some(id) = turn.session.scratch.question_id.take() {
        turn.app.records.release_question(id, &turn.session.identity).await?;
        turn.session.scratch.declined.push(id);
        debug!("{} declined question {}", turn.session.identity, id);
    }
    present_next_question(turn).await
}

/// Reserves the next eligible question and previews it, or ends the loop when there is none.
async fn present_next_question(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let reserved = turn
        .app
        .records
        .reserve_next_question(
            &turn.session.identity,
            now(),
            turn.app.lease_secs,
            &turn.session.scratch.declined,
        )
        .await?;

    let Some(question) = reserved else {
        turn.session.scratch.question_id = None;
        turn.present(t!("main.no_questions_warning", locale = locale), None)
            .await;
        return Ok(Outcome::FinishBelow);
    };

    info!("Question {} reserved by {}", question.id, turn.session.identity);
    turn.session.scratch.question_id = Some(question.id);
    let anchor = turn
        .present(
            t!("main.question_preview", locale = locale, id = question.id, text = question.text),
            Some(get_question_preview_keyboard(locale)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::AnswerQuestion,
        anchor,
    })
}

pub async fn handle_callback_reply_to_question(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    if turn.session.scratch.question_id.is_none() {
        return Ok(Outcome::Finish);
    }
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("main.input_answer_suggestion", locale = locale),
            Some(get_back_keyboard(locale, Action::Start)),
        )
        .await;
    Ok(Outcome::Await {
        tag: StateTag::ReplyToQuestion,
        anchor,
    })
}

pub async fn handle_message_answer(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let locale = turn.locale();
    let identity = turn.session.identity.clone();

    let reserved = match turn.session.scratch.question_id {
        Some(id) => turn.app.records.find_reserved_question(id, &identity).await?,
        None => None,
    };
    let Some(question) = reserved else {
        turn.notify(t!("main.question_answered_warning", locale = locale)).await;
        return Ok(Outcome::Finish);
    };

    // the conditional update is what settles a race with another moderator
    if !turn.app.records.mark_answered(question.id, &identity, now()).await? {
        turn.notify(t!("main.question_answered_warning", locale = locale)).await;
        return Ok(Outcome::Finish);
    }
    info!("Question {} answered by {}", question.id, identity);

    deliver_answer(turn, &question, text).await;

    turn.notify(t!("main.answer_accepted_confirmation", locale = locale)).await;
    Ok(Outcome::Finish)
}

/// Threaded reply to the asker, then a standalone notification if that fails.
async fn deliver_answer(turn: &Turn<'_>, question: &Question, answer: &str) {
    let reply = OutgoingMessage::text(question.chat_id, answer).reply_to(question.message_id);
    let Err(e) = turn.transport.send(reply).await else {
        return;
    };
    debug!("Threaded answer to question {} failed: {}", question.id, e);

    let asker = identity_of(question.username.as_deref(), question.user_id);
    let locale = match turn.app.sessions.language_of(&asker).await {
        Ok(language) => language.unwrap_or_default().code(),
        Err(e) => {
            warn!("Failed to resolve the language of {}: {}", asker, e);
            Language::default().code()
        }
    };
    let notification = OutgoingMessage::text(
        question.chat_id,
        t!("main.answer_notification", locale = locale, question = question.text, answer = answer),
    );
    if let Err(e) = turn.transport.send(notification).await {
        warn!("Failed to deliver the answer to question {}: {}", question.id, e);
    }
}
