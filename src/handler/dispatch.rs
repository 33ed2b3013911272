use chrono::Utc;

use crate::{
    error::BotResult,
    service::{
        dialogue::model::{Action, StateTag, TextStep},
        session::{CurrentState, Session},
    },
    state::AppState,
    transport::{ChatTransport, Keyboard, OutgoingMessage},
    utils::{chunk_lines, MESSAGE_MAX_CHARS},
};

use super::{doc, faq, language, question, questions, start, users};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The `/start` command.
    Start,
    /// Callback payload of a pressed inline button.
    Button(String),
    Text(String),
}

/// A platform-neutral inbound update.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub identity: String,
    pub user_id: i64,
    pub chat_id: i64,
    /// For buttons, the message carrying the button; for text, the user's message.
    pub message_id: i32,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub kind: EventKind,
}

/// What a flow step leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Buttons are on screen; the next event is a button press.
    Present { tag: StateTag, anchor: i32 },
    /// A prompt is on screen; the next text message belongs to this flow.
    Await { tag: StateTag, anchor: i32 },
    /// The flow is over; the root menu replaces the current message.
    Finish,
    /// The flow is over and its last message stays; the root menu is sent below it.
    FinishBelow,
}

/// One event being handled for one session.
pub struct Turn<'a> {
    pub app: &'a AppState,
    pub transport: &'a dyn ChatTransport,
    pub event: &'a InboundEvent,
    pub session: Session,
}

pub fn now() -> i64 {
    Utc::now().timestamp()
}

impl Turn<'_> {
    pub fn locale(&self) -> &'static str {
        self.session.locale()
    }

    pub fn is_from_anchor(&self) -> bool {
        matches!(self.event.kind, EventKind::Button(_)) && self.session.state.anchor == Some(self.event.message_id)
    }

    /// Edits the anchor when the event came from it, otherwise sends a new message.
    /// Returns the id of the message now carrying `text`. Delivery failures are logged
    /// and the event's own message id is returned so the turn still completes.
    pub async fn present(&self, text: impl Into<String>, keyboard: Option<Keyboard>) -> i32 {
        let text = text.into();
        if self.is_from_anchor() {
            match self
                .transport
                .edit(self.event.chat_id, self.event.message_id, text.clone(), keyboard.clone())
                .await
            {
                Ok(id) => return id,
                Err(e) => warn!("Falling back to a new message for {}: {}", self.session.identity, e),
            }
        }

        let mut message = OutgoingMessage::text(self.event.chat_id, text);
        if let Some(keyboard) = keyboard {
            message = message.with_keyboard(keyboard);
        }
        match self.transport.send(message).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to present to {}: {}", self.session.identity, e);
                self.event.message_id
            }
        }
    }

    /// Best-effort message to the current chat.
    pub async fn notify(&self, text: impl Into<String>) {
        if let Err(e) = self
            .transport
            .send(OutgoingMessage::text(self.event.chat_id, text))
            .await
        {
            warn!("Failed to notify {}: {}", self.session.identity, e);
        }
    }

    /// Parses a positive integer typed by the user, warning about anything else.
    pub async fn read_positive(&self, text: &str) -> Option<i64> {
        let locale = self.locale();
        match text.trim().parse::<i64>() {
            Ok(number) if number > 0 => Some(number),
            Ok(_) => {
                self.notify(t!("common.above_zero_needed_warning", locale = locale)).await;
                None
            }
            Err(_) => {
                self.notify(t!("common.integer_needed_warning", locale = locale)).await;
                None
            }
        }
    }

    /// Sends `lines` to the current chat, split into as few messages as the platform allows.
    pub async fn notify_lines<S: AsRef<str>>(&self, lines: &[S]) {
        for chunk in chunk_lines(lines, MESSAGE_MAX_CHARS) {
            self.notify(chunk).await;
        }
    }
}

pub async fn dispatch(app: &AppState, transport: &dyn ChatTransport, event: InboundEvent) -> BotResult<()> {
    let lock = app.identity_lock(&event.identity);
    let result = {
        let _guard = lock.lock().await;
        handle_event(app, transport, &event).await
    };
    drop(lock);
    app.release_identity_lock(&event.identity);
    result
}

async fn handle_event(app: &AppState, transport: &dyn ChatTransport, event: &InboundEvent) -> BotResult<()> {
    let session = app.sessions.load(&event.identity, event.chat_id).await?;
    let mut turn = Turn {
        app,
        transport,
        event,
        session,
    };

    match &event.kind {
        EventKind::Start => start::render_root(&mut turn).await?,
        EventKind::Button(data) => handle_button(&mut turn, data).await?,
        EventKind::Text(text) => handle_text(&mut turn, text).await?,
    }

    app.sessions.persist(&turn.session).await?;
    Ok(())
}

async fn handle_button(turn: &mut Turn<'_>, data: &str) -> BotResult<()> {
    let Some(action) = turn.app.routes.resolve(data) else {
        debug!("Unknown callback {:?} from {}", data, turn.session.identity);
        return start::render_root(turn).await;
    };

    if action == Action::Start || (turn.session.language.is_none() && !action.is_language_route()) {
        return start::render_root(turn).await;
    }

    if !action.accepted_in(turn.session.state.tag) || turn.session.state.anchor != Some(turn.event.message_id) {
        debug!(
            "Stale {} from {} in {:?}",
            data, turn.session.identity, turn.session.state
        );
        return start::render_root(turn).await;
    }

    if let Some(ability) = action.required_ability() {
        if !turn.session.abilities().has(ability) {
            return deny(turn).await;
        }
    }

    let outcome = run_action(turn, action).await?;
    apply(turn, outcome).await
}

async fn handle_text(turn: &mut Turn<'_>, text: &str) -> BotResult<()> {
    if turn.session.language.is_none() {
        return start::render_root(turn).await;
    }

    let step = if turn.session.awaiting_input {
        turn.session.state.tag.and_then(TextStep::for_state)
    } else {
        None
    };

    let Some(step) = step else {
        if turn.session.awaiting_input {
            debug!("Ignoring text from {} in {:?}", turn.session.identity, turn.session.state);
            return Ok(());
        }
        return start::render_root(turn).await;
    };

    if !turn.session.abilities().has(step.required_ability()) {
        return deny(turn).await;
    }

    let outcome = run_text(turn, step, text).await?;
    apply(turn, outcome).await
}

/// Replaces the anchor with a rights warning and falls back to the root menu.
async fn deny(turn: &mut Turn<'_>) -> BotResult<()> {
    info!("Denied {:?} for {} ({})", turn.event.kind, turn.session.identity, turn.session.role.name);
    turn.present(t!("common.rights_warning", locale = turn.locale()), None)
        .await;
    turn.session.state = CurrentState::new(StateTag::Warning, None);
    start::render_root(turn).await
}

async fn run_action(turn: &mut Turn<'_>, action: Action) -> BotResult<Outcome> {
    match action {
        Action::Start => Ok(Outcome::Finish),

        Action::AskQuestion => question::handle_callback_ask_question(turn).await,
        Action::AnswerQuestion => question::handle_callback_answer_question(turn).await,
        Action::DeclineQuestion => question::handle_callback_decline_question(turn).await,
        Action::ReplyToQuestion => question::handle_callback_reply_to_question(turn).await,
        Action::ViewLanguagesGroup => language::handle_callback_view_languages_group(turn).await,
        Action::NextLanguagesGroup => language::handle_callback_turn_languages_group(turn, true).await,
        Action::PreviousLanguagesGroup => language::handle_callback_turn_languages_group(turn, false).await,
        Action::SetLanguage(selected) => language::handle_callback_set_language(turn, selected).await,
        Action::ViewDoc => doc::handle_callback_view_doc(turn).await,

        Action::HandleQuestions => questions::handle_callback_handle_questions(turn).await,
        Action::ClearQuestionsRequest => questions::handle_callback_clear_questions_request(turn).await,
        Action::ClearQuestionsConfirm => questions::handle_callback_clear_questions_confirm(turn).await,
        Action::ViewQuestions => questions::handle_callback_view_questions(turn).await,
        Action::ViewQuestionsStatistics => questions::handle_callback_view_questions_statistics(turn).await,
        Action::ViewQuestionsList => questions::handle_callback_view_questions_list(turn).await,

        Action::HandleFaq => faq::handle_callback_handle_faq(turn).await,
        Action::AddFaq => faq::handle_callback_add_faq(turn).await,
        Action::RemoveFaq => faq::handle_callback_remove_faq(turn).await,
        Action::EditFaq => faq::handle_callback_edit_faq(turn).await,
        Action::EditFaqText => faq::handle_callback_edit_faq_field(turn, StateTag::EditFaqText).await,
        Action::EditFaqAnswer => faq::handle_callback_edit_faq_field(turn, StateTag::EditFaqAnswer).await,
        Action::ClearFaqRequest => faq::handle_callback_clear_faq_request(turn).await,
        Action::ClearFaqConfirmation => faq::handle_callback_clear_faq_confirmation(turn).await,
        Action::ViewFaqGroup => faq::handle_callback_view_faq_group(turn).await,
        Action::NextFaqGroup => faq::handle_callback_turn_faq_group(turn, true).await,
        Action::PreviousFaqGroup => faq::handle_callback_turn_faq_group(turn, false).await,
        Action::ViewFaqAnswer(id) => faq::handle_callback_view_faq_answer(turn, id).await,

        Action::HandleUsers => users::handle_callback_handle_users(turn).await,
        Action::AddUserRole => users::handle_callback_add_user_role(turn).await,
        Action::ChoseUserToAddRole(role) => users::handle_callback_chose_role(turn, &role).await,
        Action::RemoveUserRole => users::handle_callback_remove_user_role(turn).await,
        Action::ViewUsers => users::handle_callback_view_users(turn).await,
        Action::ViewUsersList => users::handle_callback_view_users_list(turn).await,
        Action::ViewUsersStatistics => users::handle_callback_view_users_statistics(turn).await,
    }
}

async fn run_text(turn: &mut Turn<'_>, step: TextStep, text: &str) -> BotResult<Outcome> {
    match step {
        TextStep::Question => question::handle_message_question(turn, text).await,
        TextStep::Answer => question::handle_message_answer(turn, text).await,
        TextStep::QuestionsCount => questions::handle_message_questions_count(turn, text).await,
        TextStep::UsernameToGrant => users::handle_message_grant(turn, text).await,
        TextStep::UsernameToRevoke => users::handle_message_revoke(turn, text).await,
        TextStep::FaqQuestion => faq::handle_message_faq_question(turn, text).await,
        TextStep::FaqAnswer => faq::handle_message_faq_answer(turn, text).await,
        TextStep::FaqIdToRemove => faq::handle_message_faq_id_to_remove(turn, text).await,
        TextStep::FaqIdToEdit => faq::handle_message_faq_id_to_edit(turn, text).await,
        TextStep::FaqNewValue(field) => faq::handle_message_faq_new_value(turn, field, text).await,
    }
}

async fn apply(turn: &mut Turn<'_>, outcome: Outcome) -> BotResult<()> {
    match outcome {
        Outcome::Present { tag, anchor } => {
            turn.session.state = CurrentState::new(tag, Some(anchor));
            turn.session.awaiting_input = false;
        }
        Outcome::Await { tag, anchor } => {
            turn.session.state = CurrentState::new(tag, Some(anchor));
            turn.session.awaiting_input = true;
        }
        Outcome::Finish => start::render_root(turn).await?,
        Outcome::FinishBelow => {
            turn.session.state.anchor = None;
            start::render_root(turn).await?
        }
    }
    Ok(())
}
