use shelfie::{Action, Intent, Position, Tile, Update};
use tokio::sync::mpsc;

use super::{IntentSource, Link, UpdateSink};
use crate::TransportError;

struct LocalSource {
    intents: mpsc::UnboundedReceiver<Intent>,
}

#[async_trait::async_trait]
impl IntentSource for LocalSource {
    async fn next_intent(&mut self) -> Result<Option<Intent>, TransportError> {
        Ok(self.intents.recv().await)
    }
}

struct LocalSink {
    updates: mpsc::UnboundedSender<Update>,
}

#[async_trait::async_trait]
impl UpdateSink for LocalSink {
    async fn push(&mut self, update: &Update) -> Result<(), TransportError> {
        self.updates
            .send(update.clone())
            .map_err(|_| TransportError::Closed)
    }
}

/// A client in the same process as the server.
///
/// Intents are sent with plain method calls and values are passed along as
/// they are, without serialization. Dropping the client closes the connection.
pub struct LocalClient {
    nickname: String,
    session_id: String,
    intents: mpsc::UnboundedSender<Intent>,
    updates: mpsc::UnboundedReceiver<Update>,
}

/// Creates the server side and the client side of an in-process connection.
pub fn local_link(nickname: &str, session_id: &str) -> (Link, LocalClient) {
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let link = Link {
        peer: format!("local:{}", nickname),
        source: Box::new(LocalSource { intents: intent_rx }),
        sink: Box::new(LocalSink { updates: update_tx }),
    };
    let client = LocalClient {
        nickname: String::from(nickname),
        session_id: String::from(session_id),
        intents: intent_tx,
        updates: update_rx,
    };
    (link, client)
}

impl LocalClient {
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Sends an intent as is, whoever it claims to be from.
    pub fn send(&self, intent: Intent) -> Result<(), TransportError> {
        self.intents.send(intent).map_err(|_| TransportError::Closed)
    }

    fn act(&self, action: Action) -> Result<(), TransportError> {
        self.send(Intent::new(&self.nickname, &self.session_id, action))
    }

    pub fn login(&self) -> Result<(), TransportError> {
        self.act(Action::Login)
    }

    pub fn set_lobby_size(&self, size: usize) -> Result<(), TransportError> {
        self.act(Action::SetLobbySize { size })
    }

    pub fn select_tiles(&self, positions: Vec<Position>) -> Result<(), TransportError> {
        self.act(Action::SelectTiles { positions })
    }

    pub fn insert_tiles(&self, column: usize, tiles: Vec<Tile>) -> Result<(), TransportError> {
        self.act(Action::InsertTiles { column, tiles })
    }

    pub fn chat(&self, recipient: Option<&str>, content: &str) -> Result<(), TransportError> {
        self.act(Action::Chat {
            recipient: recipient.map(String::from),
            content: String::from(content),
        })
    }

    pub fn ping(&self) -> Result<(), TransportError> {
        self.act(Action::Ping)
    }

    /// Returns `None` once the server has closed the connection.
    pub async fn next_update(&mut self) -> Option<Update> {
        self.updates.recv().await
    }
}
