use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{spawn_session, ServerConfig, SessionHandle};

struct Sessions {
    by_id: HashMap<String, SessionHandle>,
    /// How many sessions were ever created. Used to derive each session's seed.
    created: u64,
}

/// All sessions of a server, by session id.
#[derive(Clone)]
pub struct Lobby {
    config: Arc<ServerConfig>,
    sessions: Arc<Mutex<Sessions>>,
}

impl Lobby {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(Sessions {
                by_id: HashMap::new(),
                created: 0,
            })),
        }
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.config)
    }

    /// The running session with this id. A new one is started if there is
    /// none yet or the previous one is over.
    pub async fn session(&self, id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.by_id.get(id) {
            if !handle.is_ended() {
                return handle.clone();
            }
        }

        let seed = self.config.seed.wrapping_add(sessions.created);
        sessions.created += 1;
        debug!(session_id = id, seed, "Starting session");
        let handle = spawn_session(id, self.config(), StdRng::seed_from_u64(seed));
        sessions.by_id.insert(String::from(id), handle.clone());
        handle
    }
}
