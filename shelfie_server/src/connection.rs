use std::time::Duration;

use shelfie::{Action, Intent, Update};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant};
use tracing::{debug, info, trace};

use crate::{ConnectionId, Link, Lobby, Outbound, SessionEvent, SessionHandle};

/// Why a connection stopped reading.
enum Exit {
    Lost(String),
    SessionEnded,
    Shutdown,
}

/// Resolves once the flag is `true`, or once nobody can set it anymore.
pub(crate) async fn wait_until_set(flag: &mut watch::Receiver<bool>) {
    loop {
        if *flag.borrow_and_update() {
            return;
        }
        if flag.changed().await.is_err() {
            return;
        }
    }
}

async fn wait_until_ended(ended: &mut Option<watch::Receiver<bool>>) {
    match ended {
        Some(ended) => wait_until_set(ended).await,
        None => std::future::pending().await,
    }
}

fn spawn_heartbeat(outbound: Outbound, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + period, period);
        loop {
            ticks.tick().await;
            if outbound.send(Update::Heartbeat).is_err() {
                break;
            }
        }
    })
}

/// Runs one client connection until it is lost, its session ends or the server shuts down.
///
/// Intents are forwarded to the session the client logged into. Updates are
/// pushed by a separate writer task, in the order they were queued.
pub(crate) async fn drive_connection(
    conn: ConnectionId,
    link: Link,
    lobby: Lobby,
    mut shutdown: watch::Receiver<bool>,
) {
    let Link {
        peer,
        mut source,
        mut sink,
    } = link;
    let config = lobby.config();
    debug!(%conn, peer, "Connection opened");

    // Closing the queue makes the reader report the connection as lost
    let (outbound, mut queue) = mpsc::unbounded_channel::<Update>();
    let push_timeout = config.liveness_timeout;
    let writer = tokio::spawn(async move {
        while let Some(update) = queue.recv().await {
            match timeout(push_timeout, sink.push(&update)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    debug!(%conn, %err, "Could not push update");
                    break;
                }
                Err(_) => {
                    debug!(%conn, "Client stopped reading updates");
                    break;
                }
            }
        }
    });

    let mut session: Option<SessionHandle> = None;
    let mut ended: Option<watch::Receiver<bool>> = None;
    let mut heartbeat: Option<JoinHandle<()>> = None;

    let exit = loop {
        let next: Result<Intent, Exit> = tokio::select! {
            _ = wait_until_set(&mut shutdown) => Err(Exit::Shutdown),
            _ = wait_until_ended(&mut ended) => Err(Exit::SessionEnded),
            _ = outbound.closed() => Err(Exit::Lost(String::from("updates could not be delivered"))),
            received = timeout(config.liveness_timeout, source.next_intent()) => match received {
                Err(_) => Err(Exit::Lost(String::from("timed out"))),
                Ok(Err(err)) => Err(Exit::Lost(err.to_string())),
                Ok(Ok(None)) => Err(Exit::Lost(String::from("closed by the client"))),
                Ok(Ok(Some(intent))) => Ok(intent),
            },
        };
        let intent = match next {
            Ok(intent) => intent,
            Err(exit) => break exit,
        };
        trace!(%conn, ?intent, "Intent");

        match intent.action {
            Action::Ping => continue,
            Action::Login => {
                if let Some(handle) = &session {
                    if handle.id() != intent.session_id {
                        let message = format!("Already joined session {}", handle.id());
                        let _ = outbound.send(Update::failure(message));
                        continue;
                    }
                } else {
                    let handle = lobby.session(&intent.session_id).await;
                    ended = Some(handle.ended());
                    heartbeat = Some(spawn_heartbeat(outbound.clone(), config.heartbeat_interval));
                    session = Some(handle);
                }
            }
            _ => {}
        }
        let Some(handle) = &session else {
            let _ = outbound.send(Update::failure("Log in first"));
            continue;
        };
        let event = SessionEvent::Intent {
            conn,
            outbound: outbound.clone(),
            intent,
        };
        if !handle.send(event) {
            break Exit::SessionEnded;
        }
    };

    if let Some(heartbeat) = heartbeat {
        heartbeat.abort();
    }
    match exit {
        Exit::Lost(reason) => {
            info!(%conn, peer, reason, "Connection lost");
            if let Some(handle) = &session {
                handle.send(SessionEvent::Disconnected { conn });
            }
            drop(outbound);
            let _ = writer.await;
        }
        Exit::SessionEnded => {
            debug!(%conn, peer, "Session over, closing connection");
            drop(outbound);
            let _ = writer.await;
        }
        Exit::Shutdown => writer.abort(),
    }
}
