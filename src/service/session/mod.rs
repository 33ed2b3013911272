mod error;
mod model;

pub use error::SessionError;
pub use model::*;

use std::{str::FromStr, sync::Arc};

use crate::service::language::Language;
use crate::storage::{model::Role, MemoryCache, RecordStore};

/// Role given to identities without a directory entry.
pub const DEFAULT_ROLE: &str = "user";
/// Role the configured owner is bootstrapped with.
pub const OWNER_ROLE: &str = "developer";

/// Loads and persists sessions. Identities holding the default role live only in memory;
/// everyone else is backed by a directory row.
#[derive(Clone)]
pub struct SessionStore {
    records: Arc<dyn RecordStore>,
    guests: MemoryCache<Session>,
    owner: String,
}

impl SessionStore {
    pub fn new(records: Arc<dyn RecordStore>, owner: &str, cache_capacity: usize) -> Self {
        info!("Initializing SessionStore...");
        Self {
            records,
            guests: MemoryCache::new(cache_capacity),
            owner: owner.to_string(),
        }
    }

    async fn resolve_role(&self, name: &str) -> Result<Role, SessionError> {
        self.records
            .find_role(name)
            .await?
            .ok_or_else(|| SessionError::RoleNotFound(name.to_string()))
    }

    pub async fn load(&self, identity: &str, chat_id: i64) -> Result<Session, SessionError> {
        if let Some(record) = self.records.find_user(identity).await? {
            let role = self.resolve_role(&record.role).await?;
            let mut session = Session::new(identity, chat_id, role);
            session.persisted = true;
            session.language = record.language.as_deref().and_then(|code| Language::from_str(code).ok());

            if let Some(context) = record.context.as_deref() {
                match serde_json::from_str::<ContextBlob>(context) {
                    Ok(blob) => session.apply_blob(blob),
                    Err(e) => warn!("Discarding unreadable context of {}: {}", identity, e),
                }
            } else if let Some(guest) = self.guests.del(identity) {
                // first contact since the role was granted
                session.state = guest.state;
                session.scratch = guest.scratch;
                session.awaiting_input = guest.awaiting_input;
                if session.language.is_none() {
                    if let Some(language) = guest.language {
                        self.records.set_user_language(identity, language.code()).await?;
                        session.language = Some(language);
                    }
                }
            }

            if session.abilities().receives_messages && record.chat_id.is_none() {
                self.records.set_user_chat(identity, chat_id).await?;
            }
            return Ok(session);
        }

        if identity == self.owner {
            info!("Bootstrapping owner {} as {}", identity, OWNER_ROLE);
            self.records.upsert_user_role(identity, OWNER_ROLE).await?;
            let role = self.resolve_role(OWNER_ROLE).await?;
            if role.abilities.receives_messages {
                self.records.set_user_chat(identity, chat_id).await?;
            }
            let mut session = Session::new(identity, chat_id, role);
            session.persisted = true;
            return Ok(session);
        }

        let role = self.resolve_role(DEFAULT_ROLE).await?;
        match self.guests.get(identity) {
            Some(mut guest) => {
                guest.role = role;
                guest.chat_id = chat_id;
                Ok(guest)
            }
            None => Ok(Session::new(identity, chat_id, role)),
        }
    }

    /// Writes state, scratch and the awaiting flag back as one record.
    pub async fn persist(&self, session: &Session) -> Result<(), SessionError> {
        if session.persisted {
            let context = serde_json::to_string(&session.to_blob())?;
            self.records.save_user_context(&session.identity, &context).await?;
        } else {
            self.guests.set(&session.identity, session);
        }
        Ok(())
    }

    /// Language of another identity, for messages sent to them.
    pub async fn language_of(&self, identity: &str) -> Result<Option<Language>, SessionError> {
        if let Some(record) = self.records.find_user(identity).await? {
            return Ok(record.language.as_deref().and_then(|code| Language::from_str(code).ok()));
        }
        Ok(self.guests.get(identity).and_then(|guest| guest.language))
    }

    pub async fn set_language(&self, session: &mut Session, language: Language) -> Result<(), SessionError> {
        if session.persisted {
            self.records.set_user_language(&session.identity, language.code()).await?;
        }
        session.language = Some(language);
        Ok(())
    }
}
