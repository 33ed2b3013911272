use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Capability flags a role grants. Always resolved from the role row, never stored per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abilities {
    pub receives_messages: bool,
    pub users_handle: bool,
    pub users_view: bool,
    pub faq_handle: bool,
    pub faq_view: bool,
    pub questions_handle: bool,
    pub questions_view: bool,
    pub ask: bool,
    pub answer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    ReceivesMessages,
    UsersHandle,
    UsersView,
    FaqHandle,
    FaqView,
    QuestionsHandle,
    QuestionsView,
    Ask,
    Answer,
}

impl Abilities {
    pub fn has(&self, ability: Ability) -> bool {
        match ability {
            Ability::ReceivesMessages => self.receives_messages,
            Ability::UsersHandle => self.users_handle,
            Ability::UsersView => self.users_view,
            Ability::FaqHandle => self.faq_handle,
            Ability::FaqView => self.faq_view,
            Ability::QuestionsHandle => self.questions_handle,
            Ability::QuestionsView => self.questions_view,
            Ability::Ask => self.ask,
            Ability::Answer => self.answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub level: i64,
    pub abilities: Abilities,
}

impl Role {
    /// Strictly lower priority than `other`.
    pub fn is_below(&self, other: &Role) -> bool {
        self.level < other.level
    }
}

/// A persisted directory entry.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub role: String,
    pub chat_id: Option<i64>,
    pub language: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub username: String,
    pub chat_id: i64,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Unprocessed,
    Reserved,
    Answered,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Unprocessed => "unprocessed",
            QuestionStatus::Reserved => "reserved",
            QuestionStatus::Answered => "answered",
        }
    }
}

impl FromStr for QuestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unprocessed" => Ok(QuestionStatus::Unprocessed),
            "reserved" => Ok(QuestionStatus::Reserved),
            "answered" => Ok(QuestionStatus::Answered),
            _ => Err(format!("Unknown question status: {}", s)),
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the asker taken when the question is submitted.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub user_id: i64,
    pub chat_id: i64,
    pub message_id: i32,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub text: String,
    pub asked_at: i64,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: i64,
    pub user_id: i64,
    pub chat_id: i64,
    pub message_id: i32,
    pub username: Option<String>,
    pub text: String,
    pub asked_at: i64,
    pub reserved_at: Option<i64>,
    pub answered_at: Option<i64>,
    pub status: QuestionStatus,
    pub reserved_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionStats {
    pub total: i64,
    pub unanswered: i64,
    pub reserved: i64,
    pub answered: i64,
    pub mean_resolution_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratorStat {
    pub username: String,
    pub answered: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub view_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaqField {
    Question,
    Answer,
}
