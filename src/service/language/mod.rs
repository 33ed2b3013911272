mod model;

pub use model::Language;

use super::ServiceError;

pub const LANGUAGE_PAGE_SIZE: usize = 9;

/// Every localization key the bot looks up. Checked against all locales at startup.
pub const KEYS: &[&str] = &[
    "start.mode_choice",
    "start.handle_faq",
    "start.view_faq",
    "start.handle_questions",
    "start.view_questions",
    "start.handle_users",
    "start.view_users",
    "start.ask_question",
    "start.answer_question",
    "start.view_doc",
    "start.chose_language",
    "main.input_question_suggestion",
    "main.input_answer_suggestion",
    "main.question_preview",
    "main.answer_question_button",
    "main.next_question_button",
    "main.no_questions_warning",
    "main.language_choice_suggestion",
    "main.answer_notification",
    "main.answer_accepted_confirmation",
    "main.question_answered_warning",
    "main.new_question_notification",
    "main.new_question_accepted_confirmation",
    "questions.handle.mode_choice",
    "questions.handle.clear_button",
    "questions.handle.clear_confirmation_request",
    "questions.handle.cleared_confirmation",
    "questions.view.mode_choice",
    "questions.view.statistics_button",
    "questions.view.list_button",
    "questions.view.input_count_suggestion",
    "questions.view.total_count",
    "questions.view.unanswered_count",
    "questions.view.reserved_count",
    "questions.view.answered_count",
    "questions.view.average_time",
    "questions.view.no_average_time",
    "questions.view.questions_count",
    "faq.handle.mode_choice",
    "faq.handle.add_button",
    "faq.handle.remove_button",
    "faq.handle.edit_button",
    "faq.handle.clear_button",
    "faq.handle.input_question_suggestion",
    "faq.handle.input_answer_suggestion",
    "faq.handle.input_id_to_remove_suggestion",
    "faq.handle.input_id_to_edit_suggestion",
    "faq.handle.edit_field_choice",
    "faq.handle.edit_question_button",
    "faq.handle.edit_answer_button",
    "faq.handle.input_new_question_suggestion",
    "faq.handle.input_new_answer_suggestion",
    "faq.handle.clear_confirmation_request",
    "faq.handle.cleared_confirmation",
    "faq.message.added_confirmation",
    "faq.message.deleted_confirmation",
    "faq.message.edited_confirmation",
    "faq.message.not_found_warning",
    "faq.view.group_choice",
    "faq.view.empty",
    "faq.view.entry",
    "users.handle.mode_choice",
    "users.handle.add_role_button",
    "users.handle.remove_role_button",
    "users.handle.role_choice",
    "users.handle.no_roles_warning",
    "users.handle.input_username_to_add_suggestion",
    "users.handle.input_username_to_remove_suggestion",
    "users.message.role_added_confirmation",
    "users.message.role_removed_confirmation",
    "users.message.cant_remove_role_warning",
    "users.message.dont_have_role_warning",
    "users.message.role_not_grantable_warning",
    "users.message.invalid_username_warning",
    "users.message.role_lost_notification",
    "users.view.mode_choice",
    "users.view.list_button",
    "users.view.statistics_button",
    "users.view.list_empty",
    "users.view.statistics_header",
    "users.view.statistics_empty",
    "commands.start",
    "common.rights_warning",
    "common.integer_needed_warning",
    "common.above_zero_needed_warning",
    "common.back_button",
    "common.confirm_button",
    "common.previous_button",
    "common.next_button",
    "roles.developer",
    "roles.administrator",
    "roles.moderator",
    "roles.user",
];

fn is_missing(locale: &str, key: &str, text: &str) -> bool {
    text.is_empty() || text == key || text == format!("{}.{}", locale, key)
}

/// Fails on the first key that any supported locale does not define.
pub fn validate() -> Result<(), ServiceError> {
    for language in Language::ALL {
        let locale = language.code();
        for &key in KEYS {
            let text = t!(key, locale = locale);
            if is_missing(locale, key, &text) {
                return Err(ServiceError::MissingTranslation { locale, key });
            }
        }
    }
    info!("Localization verified: {} keys in {} locales", KEYS.len(), Language::ALL.len());
    Ok(())
}

/// Localized role name; roles added to the table by hand fall back to their raw name.
pub fn role_label(role: &str, locale: &str) -> String {
    let key = format!("roles.{}", role);
    let text = t!(&key, locale = locale);
    if is_missing(locale, &key, &text) {
        role.to_string()
    } else {
        text.into_owned()
    }
}

pub fn language_page(page: usize) -> &'static [Language] {
    let start = (page * LANGUAGE_PAGE_SIZE).min(Language::ALL.len());
    let end = (start + LANGUAGE_PAGE_SIZE).min(Language::ALL.len());
    &Language::ALL[start..end]
}

pub fn language_pages() -> usize {
    crate::utils::page_count(Language::ALL.len(), LANGUAGE_PAGE_SIZE)
}
