use std::{fmt, str::FromStr};

use crate::service::language::Language;
use crate::storage::model::{Ability, FaqField};

macro_rules! state_tags {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Where in a flow a session currently is. The string forms double as callback payloads
        /// and are embedded in already-sent messages, so they never change.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StateTag {
            $($variant),+
        }

        impl StateTag {
            pub const ALL: &'static [StateTag] = &[$(StateTag::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(StateTag::$variant => $name),+
                }
            }
        }

        impl FromStr for StateTag {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(StateTag::$variant),)+
                    _ => Err(format!("Unknown state tag: {}", s)),
                }
            }
        }
    };
}

state_tags! {
    Start => "start",
    NeededLanguage => "needed_language",
    Warning => "warning",

    AskQuestion => "ask_question",
    AnswerQuestion => "answer_question",
    DeclineQuestion => "decline_question",
    ReplyToQuestion => "reply_to_question",
    ViewLanguagesGroup => "view_languages_group",
    NextLanguagesGroup => "next_languages_group",
    PreviousLanguagesGroup => "previous_languages_group",
    SetLanguage => "set_language",
    ViewDoc => "view_doc",

    HandleQuestions => "handle_questions",
    ClearQuestionsRequest => "clear_questions_request",
    ClearQuestionsConfirm => "clear_questions_confirm",
    ViewQuestions => "view_questions",
    ViewQuestionsStatistics => "view_questions_statistics",
    ViewQuestionsList => "view_questions_list",

    HandleFaq => "handle_faq",
    AddFaq => "add_faq",
    InputFaqText => "input_faq_text",
    RemoveFaq => "remove_faq",
    EditFaq => "edit_faq",
    InputFaqIdToEdit => "input_faq_id_to_edit",
    EditFaqText => "edit_faq_text",
    EditFaqAnswer => "edit_faq_answer",
    ClearFaqRequest => "clear_faq_request",
    ClearFaqConfirmation => "clear_faq_confirmation",
    ViewFaqGroup => "view_fags_group",
    NextFaqGroup => "next_fags_group",
    PreviousFaqGroup => "previous_fags_group",
    ViewFaqAnswer => "view_fag_answer",

    HandleUsers => "handle_users",
    AddUserRole => "add_user_role",
    ChoseUserToAddRole => "chose_user_to_add_role",
    RemoveUserRole => "remove_user_role",
    ViewUsers => "view_users",
    ViewUsersList => "view_users_list",
    ViewUsersStatistics => "view_users_statistics",
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const SET_LANGUAGE_PREFIX: &str = "set_language_";
pub const VIEW_FAQ_ANSWER_PREFIX: &str = "view_fag_answer_id";
pub const CHOSE_ROLE_PREFIX: &str = "chose_user_to_add_role_";

/// A button press resolved from its callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,

    AskQuestion,
    AnswerQuestion,
    DeclineQuestion,
    ReplyToQuestion,
    ViewLanguagesGroup,
    NextLanguagesGroup,
    PreviousLanguagesGroup,
    SetLanguage(Language),
    ViewDoc,

    HandleQuestions,
    ClearQuestionsRequest,
    ClearQuestionsConfirm,
    ViewQuestions,
    ViewQuestionsStatistics,
    ViewQuestionsList,

    HandleFaq,
    AddFaq,
    RemoveFaq,
    EditFaq,
    EditFaqText,
    EditFaqAnswer,
    ClearFaqRequest,
    ClearFaqConfirmation,
    ViewFaqGroup,
    NextFaqGroup,
    PreviousFaqGroup,
    ViewFaqAnswer(i64),

    HandleUsers,
    AddUserRole,
    ChoseUserToAddRole(String),
    RemoveUserRole,
    ViewUsers,
    ViewUsersList,
    ViewUsersStatistics,
}

impl Action {
    /// Actions whose payload is exactly their state tag.
    pub const FIXED: &'static [Action] = &[
        Action::Start,
        Action::AskQuestion,
        Action::AnswerQuestion,
        Action::DeclineQuestion,
        Action::ReplyToQuestion,
        Action::ViewLanguagesGroup,
        Action::NextLanguagesGroup,
        Action::PreviousLanguagesGroup,
        Action::ViewDoc,
        Action::HandleQuestions,
        Action::ClearQuestionsRequest,
        Action::ClearQuestionsConfirm,
        Action::ViewQuestions,
        Action::ViewQuestionsStatistics,
        Action::ViewQuestionsList,
        Action::HandleFaq,
        Action::AddFaq,
        Action::RemoveFaq,
        Action::EditFaq,
        Action::EditFaqText,
        Action::EditFaqAnswer,
        Action::ClearFaqRequest,
        Action::ClearFaqConfirmation,
        Action::ViewFaqGroup,
        Action::NextFaqGroup,
        Action::PreviousFaqGroup,
        Action::HandleUsers,
        Action::AddUserRole,
        Action::RemoveUserRole,
        Action::ViewUsers,
        Action::ViewUsersList,
        Action::ViewUsersStatistics,
    ];

    pub fn tag(&self) -> StateTag {
        match self {
            Action::Start => StateTag::Start,
            Action::AskQuestion => StateTag::AskQuestion,
            Action::AnswerQuestion => StateTag::AnswerQuestion,
            Action::DeclineQuestion => StateTag::DeclineQuestion,
            Action::ReplyToQuestion => StateTag::ReplyToQuestion,
            Action::ViewLanguagesGroup => StateTag::ViewLanguagesGroup,
            Action::NextLanguagesGroup => StateTag::NextLanguagesGroup,
            Action::PreviousLanguagesGroup => StateTag::PreviousLanguagesGroup,
            Action::SetLanguage(_) => StateTag::SetLanguage,
            Action::ViewDoc => StateTag::ViewDoc,
            Action::HandleQuestions => StateTag::HandleQuestions,
            Action::ClearQuestionsRequest => StateTag::ClearQuestionsRequest,
            Action::ClearQuestionsConfirm => StateTag::ClearQuestionsConfirm,
            Action::ViewQuestions => StateTag::ViewQuestions,
            Action::ViewQuestionsStatistics => StateTag::ViewQuestionsStatistics,
            Action::ViewQuestionsList => StateTag::ViewQuestionsList,
            Action::HandleFaq => StateTag::HandleFaq,
            Action::AddFaq => StateTag::AddFaq,
            Action::RemoveFaq => StateTag::RemoveFaq,
            Action::EditFaq => StateTag::EditFaq,
            Action::EditFaqText => StateTag::EditFaqText,
            Action::EditFaqAnswer => StateTag::EditFaqAnswer,
            Action::ClearFaqRequest => StateTag::ClearFaqRequest,
            Action::ClearFaqConfirmation => StateTag::ClearFaqConfirmation,
            Action::ViewFaqGroup => StateTag::ViewFaqGroup,
            Action::NextFaqGroup => StateTag::NextFaqGroup,
            Action::PreviousFaqGroup => StateTag::PreviousFaqGroup,
            Action::ViewFaqAnswer(_) => StateTag::ViewFaqAnswer,
            Action::HandleUsers => StateTag::HandleUsers,
            Action::AddUserRole => StateTag::AddUserRole,
            Action::ChoseUserToAddRole(_) => StateTag::ChoseUserToAddRole,
            Action::RemoveUserRole => StateTag::RemoveUserRole,
            Action::ViewUsers => StateTag::ViewUsers,
            Action::ViewUsersList => StateTag::ViewUsersList,
            Action::ViewUsersStatistics => StateTag::ViewUsersStatistics,
        }
    }

    pub fn callback_data(&self) -> String {
        match self {
            Action::SetLanguage(language) => format!("{}{}", SET_LANGUAGE_PREFIX, language.code()),
            Action::ViewFaqAnswer(id) => format!("{}{}", VIEW_FAQ_ANSWER_PREFIX, id),
            Action::ChoseUserToAddRole(role) => format!("{}*{}*", CHOSE_ROLE_PREFIX, role),
            other => other.tag().as_str().to_string(),
        }
    }

    /// States from which this button is accepted. `None` means always reachable.
    pub fn predecessors(&self) -> Option<&'static [StateTag]> {
        use StateTag::*;

        let states: &'static [StateTag] = match self {
            Action::Start => return None,

            Action::AskQuestion => &[Start],
            Action::AnswerQuestion => &[Start, DeclineQuestion],
            Action::DeclineQuestion | Action::ReplyToQuestion => &[AnswerQuestion],
            Action::ViewLanguagesGroup => &[Start, NextLanguagesGroup, PreviousLanguagesGroup],
            Action::NextLanguagesGroup | Action::PreviousLanguagesGroup | Action::SetLanguage(_) => {
                &[ViewLanguagesGroup, NextLanguagesGroup, PreviousLanguagesGroup]
            }
            Action::ViewDoc => &[Start],

            Action::HandleQuestions => &[Start, ClearQuestionsRequest],
            Action::ClearQuestionsRequest => &[HandleQuestions],
            Action::ClearQuestionsConfirm => &[ClearQuestionsRequest],
            Action::ViewQuestions => &[Start, ViewQuestionsStatistics, ViewQuestionsList],
            Action::ViewQuestionsStatistics | Action::ViewQuestionsList => &[ViewQuestions],

            Action::HandleFaq => &[
                Start,
                AddFaq,
                InputFaqText,
                RemoveFaq,
                EditFaq,
                InputFaqIdToEdit,
                EditFaqText,
                EditFaqAnswer,
                ClearFaqRequest,
            ],
            Action::AddFaq | Action::RemoveFaq | Action::EditFaq | Action::ClearFaqRequest => &[HandleFaq],
            Action::EditFaqText | Action::EditFaqAnswer => &[InputFaqIdToEdit],
            Action::ClearFaqConfirmation => &[ClearFaqRequest],
            Action::ViewFaqGroup => &[Start, NextFaqGroup, PreviousFaqGroup],
            Action::NextFaqGroup | Action::PreviousFaqGroup | Action::ViewFaqAnswer(_) => {
                &[ViewFaqGroup, NextFaqGroup, PreviousFaqGroup]
            }

            Action::HandleUsers => &[Start, AddUserRole, ChoseUserToAddRole, RemoveUserRole],
            Action::AddUserRole | Action::RemoveUserRole => &[HandleUsers],
            Action::ChoseUserToAddRole(_) => &[AddUserRole],
            Action::ViewUsers => &[Start, ViewUsersList, ViewUsersStatistics],
            Action::ViewUsersList | Action::ViewUsersStatistics => &[ViewUsers],
        };
        Some(states)
    }

    /// Language picker buttons stay usable while a language choice is being forced.
    pub fn is_language_route(&self) -> bool {
        matches!(
            self,
            Action::ViewLanguagesGroup
                | Action::NextLanguagesGroup
                | Action::PreviousLanguagesGroup
                | Action::SetLanguage(_)
        )
    }

    pub fn accepted_in(&self, tag: Option<StateTag>) -> bool {
        let Some(predecessors) = self.predecessors() else {
            return true;
        };
        match tag {
            Some(StateTag::NeededLanguage) if self.is_language_route() && *self != Action::ViewLanguagesGroup => true,
            Some(tag) => predecessors.contains(&tag),
            None => false,
        }
    }

    pub fn required_ability(&self) -> Option<Ability> {
        match self {
            Action::Start
            | Action::ViewLanguagesGroup
            | Action::NextLanguagesGroup
            | Action::PreviousLanguagesGroup
            | Action::SetLanguage(_)
            | Action::ViewDoc => None,

            Action::AskQuestion => Some(Ability::Ask),
            Action::AnswerQuestion | Action::DeclineQuestion | Action::ReplyToQuestion => Some(Ability::Answer),

            Action::HandleQuestions | Action::ClearQuestionsRequest | Action::ClearQuestionsConfirm => {
                Some(Ability::QuestionsHandle)
            }
            Action::ViewQuestions | Action::ViewQuestionsStatistics | Action::ViewQuestionsList => {
                Some(Ability::QuestionsView)
            }

            Action::HandleFaq
            | Action::AddFaq
            | Action::RemoveFaq
            | Action::EditFaq
            | Action::EditFaqText
            | Action::EditFaqAnswer
            | Action::ClearFaqRequest
            | Action::ClearFaqConfirmation => Some(Ability::FaqHandle),
            Action::ViewFaqGroup | Action::NextFaqGroup | Action::PreviousFaqGroup | Action::ViewFaqAnswer(_) => {
                Some(Ability::FaqView)
            }

            Action::HandleUsers | Action::AddUserRole | Action::ChoseUserToAddRole(_) | Action::RemoveUserRole => {
                Some(Ability::UsersHandle)
            }
            Action::ViewUsers | Action::ViewUsersList | Action::ViewUsersStatistics => Some(Ability::UsersView),
        }
    }
}

/// Free-text input expected in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStep {
    Question,
    Answer,
    QuestionsCount,
    UsernameToGrant,
    UsernameToRevoke,
    FaqQuestion,
    FaqAnswer,
    FaqIdToRemove,
    FaqIdToEdit,
    FaqNewValue(FaqField),
}

impl TextStep {
    pub fn for_state(tag: StateTag) -> Option<TextStep> {
        match tag {
            StateTag::AskQuestion => Some(TextStep::Question),
            StateTag::ReplyToQuestion => Some(TextStep::Answer),
            StateTag::ViewQuestionsList => Some(TextStep::QuestionsCount),
            StateTag::ChoseUserToAddRole => Some(TextStep::UsernameToGrant),
            StateTag::RemoveUserRole => Some(TextStep::UsernameToRevoke),
            StateTag::AddFaq => Some(TextStep::FaqQuestion),
            StateTag::InputFaqText => Some(TextStep::FaqAnswer),
            StateTag::RemoveFaq => Some(TextStep::FaqIdToRemove),
            StateTag::EditFaq => Some(TextStep::FaqIdToEdit),
            StateTag::EditFaqText => Some(TextStep::FaqNewValue(FaqField::Question)),
            StateTag::EditFaqAnswer => Some(TextStep::FaqNewValue(FaqField::Answer)),
            _ => None,
        }
    }

    pub fn required_ability(&self) -> Ability {
        match self {
            TextStep::Question => Ability::Ask,
            TextStep::Answer => Ability::Answer,
            TextStep::QuestionsCount => Ability::QuestionsView,
            TextStep::UsernameToGrant | TextStep::UsernameToRevoke => Ability::UsersHandle,
            TextStep::FaqQuestion
            | TextStep::FaqAnswer
            | TextStep::FaqIdToRemove
            | TextStep::FaqIdToEdit
            | TextStep::FaqNewValue(_) => Ability::FaqHandle,
        }
    }
}
