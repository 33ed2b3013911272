use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::service::dialogue::model::StateTag;
use crate::service::language::Language;
use crate::storage::model::{Abilities, Role};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentState {
    /// `None` until the first menu is shown, or when the stored tag is no longer known.
    pub tag: Option<StateTag>,
    /// Message carrying the buttons that are valid for `tag`.
    pub anchor: Option<i32>,
}

impl CurrentState {
    pub fn new(tag: StateTag, anchor: Option<i32>) -> Self {
        Self { tag: Some(tag), anchor }
    }
}

/// Flow-local data. Cleared whenever the root menu renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scratch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub declined: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_to_grant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq_id: Option<i64>,
    /// Question text of a FAQ entry that has no answer yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq_draft: Option<String>,
}

impl Scratch {
    pub fn clear(&mut self) {
        *self = Scratch::default();
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub identity: String,
    pub chat_id: i64,
    pub role: Role,
    pub language: Option<Language>,
    pub state: CurrentState,
    pub scratch: Scratch,
    pub awaiting_input: bool,
    pub(super) persisted: bool,
}

impl Session {
    pub(super) fn new(identity: &str, chat_id: i64, role: Role) -> Self {
        Self {
            identity: identity.to_string(),
            chat_id,
            role,
            language: None,
            state: CurrentState::default(),
            scratch: Scratch::default(),
            awaiting_input: false,
            persisted: false,
        }
    }

    pub fn abilities(&self) -> &Abilities {
        &self.role.abilities
    }

    pub fn locale(&self) -> &'static str {
        self.language.unwrap_or_default().code()
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(super) fn to_blob(&self) -> ContextBlob {
        ContextBlob {
            current_state: StoredState {
                tag: self.state.tag.map(|tag| tag.as_str().to_string()),
                anchor: self.state.anchor,
            },
            scratch: self.scratch.clone(),
            awaiting_input: self.awaiting_input,
        }
    }

    pub(super) fn apply_blob(&mut self, blob: ContextBlob) {
        self.state = CurrentState {
            tag: blob
                .current_state
                .tag
                .as_deref()
                .and_then(|tag| StateTag::from_str(tag).ok()),
            anchor: blob.current_state.anchor,
        };
        self.scratch = blob.scratch;
        self.awaiting_input = blob.awaiting_input;
    }
}

/// Serialized form of `(current_state, scratch, awaiting_input)`; always written as one value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct ContextBlob {
    pub current_state: StoredState,
    pub scratch: Scratch,
    pub awaiting_input: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct StoredState {
    pub tag: Option<String>,
    pub anchor: Option<i32>,
}
