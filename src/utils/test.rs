use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    config::build_config_from,
    handler::{dispatch, EventKind, InboundEvent},
    service::{dialogue::model::Action, doc::DocProvider, language::Language},
    state::AppState,
    storage::{RecordStore, TursoStore},
    transport::{ChatTransport, DeliveryError, Keyboard, OutgoingMessage},
};

pub const OWNER: &str = "owner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent {
        message_id: i32,
        message: OutgoingMessage,
    },
    Edited {
        chat_id: i64,
        message_id: i32,
        text: String,
        keyboard: Option<Keyboard>,
    },
}

impl Delivery {
    pub fn chat_id(&self) -> i64 {
        match self {
            Delivery::Sent { message, .. } => message.chat_id,
            Delivery::Edited { chat_id, .. } => *chat_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Delivery::Sent { message, .. } => &message.text,
            Delivery::Edited { text, .. } => text,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Delivery::Sent { message, .. } => message.keyboard.as_ref(),
            Delivery::Edited { keyboard, .. } => keyboard.as_ref(),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, Delivery::Edited { .. })
    }
}

/// Records every outgoing call instead of talking to Telegram.
pub struct RecordingTransport {
    next_id: AtomicI32,
    log: Mutex<Vec<Delivery>>,
    unreachable_chats: Mutex<HashSet<i64>>,
    reject_replies: AtomicBool,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            next_id: AtomicI32::new(1000),
            log: Mutex::new(Vec::new()),
            unreachable_chats: Mutex::new(HashSet::new()),
            reject_replies: AtomicBool::new(false),
        }
    }
}

impl RecordingTransport {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Delivery {
        self.deliveries().last().cloned().expect("nothing was delivered")
    }

    /// The delivery `n` steps before the last one.
    pub fn nth_last(&self, n: usize) -> Delivery {
        let log = self.deliveries();
        log[log.len() - 1 - n].clone()
    }

    pub fn to_chat(&self, chat_id: i64) -> Vec<Delivery> {
        self.deliveries().into_iter().filter(|d| d.chat_id() == chat_id).collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn make_unreachable(&self, chat_id: i64) {
        self.unreachable_chats.lock().unwrap().insert(chat_id);
    }

    /// Threaded replies fail, plain messages still go through.
    pub fn reject_replies(&self) {
        self.reject_replies.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, message: OutgoingMessage) -> Result<i32, DeliveryError> {
        if self.unreachable_chats.lock().unwrap().contains(&message.chat_id) {
            return Err(DeliveryError::Rejected(format!("chat {} is unreachable", message.chat_id)));
        }
        if message.reply_to.is_some() && self.reject_replies.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected("reply target is gone".into()));
        }
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(Delivery::Sent { message_id, message });
        Ok(message_id)
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<i32, DeliveryError> {
        if self.unreachable_chats.lock().unwrap().contains(&chat_id) {
            return Err(DeliveryError::NotEditable(format!("chat {} is unreachable", chat_id)));
        }
        self.log.lock().unwrap().push(Delivery::Edited {
            chat_id,
            message_id,
            text,
            keyboard,
        });
        Ok(message_id)
    }
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub username: &'static str,
    pub user_id: i64,
    pub chat_id: i64,
}

impl TestUser {
    pub fn new(username: &'static str, user_id: i64) -> Self {
        Self {
            username,
            user_id,
            chat_id: user_id,
        }
    }
}

pub struct TestBot {
    pub app: AppState,
    pub transport: Arc<RecordingTransport>,
    pub records: Arc<dyn RecordStore>,
    next_message_id: AtomicI32,
}

/// Shared services over an in-memory database, with no transport attached.
pub async fn setup_test_app() -> (AppState, Arc<dyn RecordStore>) {
    let config = build_config_from(|key| {
        match key {
            "TELEGRAM_BOT_TOKEN" => Some("0:test"),
            "TURSO_URL" => Some("libsql://localhost"),
            "TURSO_TOKEN" => Some("test"),
            "OWNER_USERNAME" => Some(OWNER),
            _ => None,
        }
        .map(str::to_string)
    })
    .expect("test config");

    let records: Arc<dyn RecordStore> = Arc::new(TursoStore::open_local(":memory:").await.expect("in-memory database"));
    let docs = DocProvider::from_sections(
        Language::ALL
            .iter()
            .map(|language| (*language, vec![format!("<b>{}</b>", language.code()), "second".to_string()]))
            .collect(),
    );

    (AppState::from_parts(&config, records.clone(), docs), records)
}

/// A fully wired bot over an in-memory database and a recording transport.
pub async fn setup_test_bot() -> TestBot {
    let (app, records) = setup_test_app().await;

    TestBot {
        app,
        transport: Arc::new(RecordingTransport::default()),
        records,
        next_message_id: AtomicI32::new(1),
    }
}

impl TestBot {
    fn event(&self, user: &TestUser, message_id: i32, kind: EventKind) -> InboundEvent {
        InboundEvent {
            identity: user.username.to_string(),
            user_id: user.user_id,
            chat_id: user.chat_id,
            message_id,
            username: Some(user.username.to_string()),
            first_name: user.username.to_string(),
            last_name: None,
            kind,
        }
    }

    fn next_message_id(&self) -> i32 {
        self.next_message_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn start(&self, user: &TestUser) {
        let event = self.event(user, self.next_message_id(), EventKind::Start);
        dispatch(&self.app, self.transport.as_ref(), event).await.unwrap();
    }

    /// Message id of the user's current anchor.
    pub async fn anchor(&self, user: &TestUser) -> i32 {
        let session = self.app.sessions.load(user.username, user.chat_id).await.unwrap();
        session.state.anchor.expect("no anchor")
    }

    /// Presses a button on the message the session currently treats as its anchor.
    pub async fn press(&self, user: &TestUser, action: Action) {
        let anchor = self.anchor(user).await;
        self.press_on(user, anchor, &action.callback_data()).await;
    }

    pub async fn press_on(&self, user: &TestUser, message_id: i32, data: &str) {
        let event = self.event(user, message_id, EventKind::Button(data.to_string()));
        dispatch(&self.app, self.transport.as_ref(), event).await.unwrap();
    }

    /// Returns the id of the typed message.
    pub async fn type_text(&self, user: &TestUser, text: &str) -> i32 {
        let message_id = self.next_message_id();
        let event = self.event(user, message_id, EventKind::Text(text.to_string()));
        dispatch(&self.app, self.transport.as_ref(), event).await.unwrap();
        message_id
    }

    /// `/start` followed by a language choice, leaving the user at the root menu.
    pub async fn enter(&self, user: &TestUser, language: Language) {
        self.start(user).await;
        self.press(user, Action::SetLanguage(language)).await;
    }
}
