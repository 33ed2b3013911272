use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    error::BotResult,
    service::{dialogue::CallbackRegistry, doc::DocProvider, session::SessionStore},
    storage::{RecordStore, TursoStore},
};

/// Shared services handed to every update. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub sessions: SessionStore,
    pub docs: Arc<DocProvider>,
    pub routes: Arc<CallbackRegistry>,
    pub lease_secs: i64,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> BotResult<Self> {
        let records: Arc<dyn RecordStore> =
            Arc::new(TursoStore::open_remote(&config.turso.url, &config.turso.token).await?);

        let released = records.reset_reservations().await?;
        if released > 0 {
            info!("Released {} question reservations left from the previous run", released);
        }

        let docs = DocProvider::load(&config.doc.dir).await?;

        Ok(Self::from_parts(config, records, docs))
    }

    pub fn from_parts(config: &AppConfig, records: Arc<dyn RecordStore>, docs: DocProvider) -> Self {
        let sessions = SessionStore::new(
            records.clone(),
            &config.session.owner_username,
            config.session.cache_capacity,
        );

        Self {
            records,
            sessions,
            docs: Arc::new(docs),
            routes: Arc::new(CallbackRegistry::new()),
            lease_secs: config.dialogue.lease_secs,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Events of one identity are processed strictly one at a time.
    pub fn identity_lock(&self, identity: &str) -> Arc<Mutex<()>> {
        self.locks.entry(identity.to_string()).or_default().clone()
    }

    /// Drops the identity's lock once no event holds or waits on it.
    pub fn release_identity_lock(&self, identity: &str) {
        self.locks.remove_if(identity, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }
}
