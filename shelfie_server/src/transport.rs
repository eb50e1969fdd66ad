//! The boundary between sessions and the way clients are connected.
//!
//! A transport hands the server a [`Link`]: something to read [`Intent`]s from
//! and something to push [`Update`]s into. Sessions never know which
//! transport a client uses.

mod local;
mod stream;

pub use local::*;
pub use stream::*;

use shelfie::{Intent, Update};

use crate::TransportError;

#[async_trait::async_trait]
pub trait IntentSource: Send {
    /// The next intent from the client, or `None` once it has hung up.
    async fn next_intent(&mut self) -> Result<Option<Intent>, TransportError>;
}

#[async_trait::async_trait]
pub trait UpdateSink: Send {
    async fn push(&mut self, update: &Update) -> Result<(), TransportError>;
}

/// Both directions of one client connection.
pub struct Link {
    /// Where the client is, for log messages.
    pub peer: String,
    pub source: Box<dyn IntentSource>,
    pub sink: Box<dyn UpdateSink>,
}
