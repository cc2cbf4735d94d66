//! Session Router - one actor per conversation, bounded worker pool.
//!
//! Each session gets a tokio task that owns its queue and runs turns through
//! the Human Input Gate one at a time. A message that arrives while a turn is
//! in flight waits in the queue. A shared semaphore caps how many turns run
//! at once across all sessions. Actors that sit idle past the configured
//! timeout stop and are respawned on the next message. A respawned actor
//! waits for its retiring predecessor to drain before taking any turn.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::handlers::dialogue::{GateError, HumanInputGate};
use crate::config::RuntimeConfig;
use crate::domain::dialogue::Emission;
use crate::domain::foundation::SessionId;

/// Errors from routing a message to its session.
#[derive(Debug, Clone, Error)]
pub enum SessionRouterError {
    #[error("Session router is shutting down")]
    ShuttingDown,

    /// The session actor stopped before answering.
    #[error("Session actor stopped before replying")]
    ActorGone,

    #[error(transparent)]
    Gate(#[from] GateError),
}

type TurnReply = Result<Emission, SessionRouterError>;

struct TurnRequest {
    utterance: String,
    reply: oneshot::Sender<TurnReply>,
}

struct SessionHandle {
    sender: mpsc::Sender<TurnRequest>,
    task: JoinHandle<()>,
    generation: u64,
}

type SessionMap = Arc<Mutex<HashMap<SessionId, SessionHandle>>>;

/// Routes utterances to per-session actors.
pub struct SessionRouter {
    gate: Arc<HumanInputGate>,
    pool: Arc<Semaphore>,
    sessions: SessionMap,
    queue_capacity: usize,
    idle_timeout: Duration,
    generations: AtomicU64,
    shutting_down: AtomicBool,
}

impl SessionRouter {
    pub fn new(
        gate: Arc<HumanInputGate>,
        worker_pool_size: usize,
        queue_capacity: usize,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            gate,
            pool: Arc::new(Semaphore::new(worker_pool_size)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            queue_capacity,
            idle_timeout,
            generations: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn from_config(gate: Arc<HumanInputGate>, config: &RuntimeConfig) -> Self {
        Self::new(
            gate,
            config.worker_pool_size,
            config.session_queue_capacity,
            config.session_idle_timeout(),
        )
    }

    /// Queues `utterance` for the session and waits for its turn to finish.
    ///
    /// # Errors
    ///
    /// `ShuttingDown` once `shutdown` has started, `Gate` when the turn
    /// itself fails.
    pub async fn submit(
        &self,
        session_id: SessionId,
        utterance: impl Into<String>,
    ) -> Result<Emission, SessionRouterError> {
        let (reply, response) = oneshot::channel();
        let mut request = TurnRequest {
            utterance: utterance.into(),
            reply,
        };

        // A send only fails if the actor retired between lookup and send;
        // the second lookup finds the closed queue and spawns a successor.
        for _ in 0..2 {
            let sender = self.sender_for(session_id).await?;
            match sender.send(request).await {
                Ok(()) => {
                    return response.await.map_err(|_| SessionRouterError::ActorGone)?;
                }
                Err(mpsc::error::SendError(returned)) => {
                    debug!(%session_id, "Session actor retired, respawning");
                    request = returned;
                }
            }
        }

        Err(SessionRouterError::ActorGone)
    }

    /// Sessions with a live actor.
    pub async fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|handle| !handle.sender.is_closed())
            .count()
    }

    /// Stops accepting messages, lets every actor finish its queue, and
    /// waits for them.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        let handles: Vec<SessionHandle> = self.sessions.lock().await.drain().map(|(_, h)| h).collect();
        info!(sessions = handles.len(), "Shutting down session router");

        // Dropping the senders ends each actor once its queue is empty.
        let tasks: Vec<JoinHandle<()>> = handles.into_iter().map(|h| h.task).collect();
        for result in join_all(tasks).await {
            if let Err(err) = result {
                warn!(error = %err, "Session actor ended abnormally");
            }
        }
    }

    async fn sender_for(&self, session_id: SessionId) -> Result<mpsc::Sender<TurnRequest>, SessionRouterError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(SessionRouterError::ShuttingDown);
        }

        let mut sessions = self.sessions.lock().await;
        // Checked again under the lock so nothing is inserted after
        // `shutdown` has drained the map.
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(SessionRouterError::ShuttingDown);
        }

        // A closed queue means the actor is retiring and may still be
        // draining turns; its successor must not start until it exits.
        if let Some(handle) = sessions.get(&session_id) {
            if !handle.sender.is_closed() {
                return Ok(handle.sender.clone());
            }
        }
        let predecessor = sessions.remove(&session_id).map(|handle| handle.task);

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let actor = SessionActor {
            session_id,
            generation,
            gate: Arc::clone(&self.gate),
            pool: Arc::clone(&self.pool),
            sessions: Arc::clone(&self.sessions),
            idle_timeout: self.idle_timeout,
        };
        let chained = predecessor.is_some();
        let task = tokio::spawn(actor.run(predecessor, receiver));

        debug!(%session_id, generation, chained, "Spawned session actor");
        sessions.insert(
            session_id,
            SessionHandle {
                sender: sender.clone(),
                task,
                generation,
            },
        );
        Ok(sender)
    }
}

struct SessionActor {
    session_id: SessionId,
    generation: u64,
    gate: Arc<HumanInputGate>,
    pool: Arc<Semaphore>,
    sessions: SessionMap,
    idle_timeout: Duration,
}

impl SessionActor {
    async fn run(self, predecessor: Option<JoinHandle<()>>, mut receiver: mpsc::Receiver<TurnRequest>) {
        if let Some(predecessor) = predecessor {
            if let Err(err) = predecessor.await {
                warn!(session_id = %self.session_id, error = %err, "Retired session actor ended abnormally");
            }
        }

        loop {
            match timeout(self.idle_timeout, receiver.recv()).await {
                Ok(Some(request)) => self.process(request).await,
                Ok(None) => break,
                Err(_) => {
                    debug!(session_id = %self.session_id, "Session actor idle, retiring");
                    receiver.close();
                    while let Some(request) = receiver.recv().await {
                        self.process(request).await;
                    }
                    break;
                }
            }
        }

        let mut sessions = self.sessions.lock().await;
        if sessions
            .get(&self.session_id)
            .is_some_and(|handle| handle.generation == self.generation)
        {
            sessions.remove(&self.session_id);
        }
    }

    async fn process(&self, request: TurnRequest) {
        let reply = match self.pool.acquire().await {
            Ok(_permit) => self
                .gate
                .resume(self.session_id, &request.utterance)
                .await
                .map_err(SessionRouterError::from),
            Err(_) => Err(SessionRouterError::ShuttingDown),
        };

        if request.reply.send(reply).is_err() {
            debug!(session_id = %self.session_id, "Caller went away before the turn finished");
        }
    }
}
