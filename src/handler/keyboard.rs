use crate::{
    service::{
        dialogue::model::Action,
        language::{language_page, role_label},
        session::Session,
    },
    storage::model::{FaqEntry, Role},
    transport::{Button, Keyboard},
};

const FAQ_BUTTON_MAX_CHARS: usize = 48;

fn button(label: impl Into<String>, action: Action) -> Button {
    Button::new(label, action.callback_data())
}

fn back_button(locale: &str, to: Action) -> Button {
    button(t!("common.back_button", locale = locale), to)
}

pub fn get_back_keyboard(locale: &str, to: Action) -> Keyboard {
    Keyboard::single(back_button(locale, to))
}

pub fn get_root_menu_keyboard(session: &Session) -> Keyboard {
    let locale = session.locale();
    let abilities = session.abilities();

    let entries = [
        (abilities.faq_handle, "start.handle_faq", Action::HandleFaq),
        (abilities.faq_view, "start.view_faq", Action::ViewFaqGroup),
        (abilities.questions_handle, "start.handle_questions", Action::HandleQuestions),
        (abilities.questions_view, "start.view_questions", Action::ViewQuestions),
        (abilities.users_handle, "start.handle_users", Action::HandleUsers),
        (abilities.users_view, "start.view_users", Action::ViewUsers),
        (abilities.ask, "start.ask_question", Action::AskQuestion),
        (abilities.answer, "start.answer_question", Action::AnswerQuestion),
    ];

    let mut rows: Vec<Vec<Button>> = entries
        .into_iter()
        .filter(|(allowed, _, _)| *allowed)
        .map(|(_, key, action)| vec![button(t!(key, locale = locale), action)])
        .collect();

    rows.push(vec![
        button(t!("start.view_doc", locale = locale), Action::ViewDoc),
        button(t!("start.chose_language", locale = locale), Action::ViewLanguagesGroup),
    ]);

    Keyboard::new(rows)
}

/// Language buttons for one page plus the wrapping page turners. A forced choice has no way back.
pub fn get_language_keyboard(locale: &str, page: usize, forced: bool) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = language_page(page)
        .iter()
        .map(|language| vec![button(language.native_name(), Action::SetLanguage(*language))])
        .collect();

    rows.push(vec![
        button(t!("common.previous_button", locale = locale), Action::PreviousLanguagesGroup),
        button(t!("common.next_button", locale = locale), Action::NextLanguagesGroup),
    ]);
    if !forced {
        rows.push(vec![back_button(locale, Action::Start)]);
    }

    Keyboard::new(rows)
}

pub fn get_question_preview_keyboard(locale: &str) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("main.answer_question_button", locale = locale), Action::ReplyToQuestion)],
        vec![button(t!("main.next_question_button", locale = locale), Action::DeclineQuestion)],
        vec![back_button(locale, Action::Start)],
    ])
}

pub fn get_confirm_keyboard(locale: &str, confirm: Action, back: Action) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("common.confirm_button", locale = locale), confirm)],
        vec![back_button(locale, back)],
    ])
}

pub fn get_questions_handle_keyboard(locale: &str) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("questions.handle.clear_button", locale = locale), Action::ClearQuestionsRequest)],
        vec![back_button(locale, Action::Start)],
    ])
}

pub fn get_questions_view_keyboard(locale: &str) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("questions.view.statistics_button", locale = locale), Action::ViewQuestionsStatistics)],
        vec![button(t!("questions.view.list_button", locale = locale), Action::ViewQuestionsList)],
        vec![back_button(locale, Action::Start)],
    ])
}

pub fn get_faq_handle_keyboard(locale: &str) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("faq.handle.add_button", locale = locale), Action::AddFaq)],
        vec![button(t!("faq.handle.remove_button", locale = locale), Action::RemoveFaq)],
        vec![button(t!("faq.handle.edit_button", locale = locale), Action::EditFaq)],
        vec![button(t!("faq.handle.clear_button", locale = locale), Action::ClearFaqRequest)],
        vec![back_button(locale, Action::Start)],
    ])
}

pub fn get_faq_edit_field_keyboard(locale: &str) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("faq.handle.edit_question_button", locale = locale), Action::EditFaqText)],
        vec![button(t!("faq.handle.edit_answer_button", locale = locale), Action::EditFaqAnswer)],
        vec![back_button(locale, Action::HandleFaq)],
    ])
}

fn shorten(text: &str) -> String {
    if text.chars().count() <= FAQ_BUTTON_MAX_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(FAQ_BUTTON_MAX_CHARS - 1).collect();
    short.push('…');
    short
}

pub fn get_faq_page_keyboard(locale: &str, entries: &[FaqEntry]) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = entries
        .iter()
        .map(|entry| {
            vec![button(
                format!("{}. {}", entry.id, shorten(&entry.question)),
                Action::ViewFaqAnswer(entry.id),
            )]
        })
        .collect();

    rows.push(vec![
        button(t!("common.previous_button", locale = locale), Action::PreviousFaqGroup),
        button(t!("common.next_button", locale = locale), Action::NextFaqGroup),
    ]);
    rows.push(vec![back_button(locale, Action::Start)]);

    Keyboard::new(rows)
}

pub fn get_users_handle_keyboard(locale: &str) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("users.handle.add_role_button", locale = locale), Action::AddUserRole)],
        vec![button(t!("users.handle.remove_role_button", locale = locale), Action::RemoveUserRole)],
        vec![back_button(locale, Action::Start)],
    ])
}

pub fn get_role_choice_keyboard(locale: &str, roles: &[Role]) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = roles
        .iter()
        .map(|role| {
            vec![button(
                role_label(&role.name, locale),
                Action::ChoseUserToAddRole(role.name.clone()),
            )]
        })
        .collect();
    rows.push(vec![back_button(locale, Action::HandleUsers)]);
    Keyboard::new(rows)
}

pub fn get_users_view_keyboard(locale: &str) -> Keyboard {
    Keyboard::new(vec![
        vec![button(t!("users.view.list_button", locale = locale), Action::ViewUsersList)],
        vec![button(t!("users.view.statistics_button", locale = locale), Action::ViewUsersStatistics)],
        vec![back_button(locale, Action::Start)],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_long_questions() {
        assert_eq!(shorten("short"), "short");
        let long = "x".repeat(100);
        let short = shorten(&long);
        assert_eq!(short.chars().count(), FAQ_BUTTON_MAX_CHARS);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_forced_language_keyboard_has_no_back() {
        let forced = get_language_keyboard("en", 0, true);
        assert!(forced.buttons().all(|b| b.data != "start"));

        let optional = get_language_keyboard("en", 0, false);
        assert!(optional.buttons().any(|b| b.data == "start"));
    }

    #[test]
    fn test_language_keyboard_always_turns_pages() {
        for forced in [true, false] {
            let keyboard = get_language_keyboard("en", 0, forced);
            let data: Vec<_> = keyboard.buttons().map(|b| b.data.as_str()).collect();
            assert!(data.contains(&"next_languages_group"));
            assert!(data.contains(&"previous_languages_group"));
        }
    }
}
