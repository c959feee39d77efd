//! Handle for communicating with the engine actor.
//!
//! The `EngineHandle` provides a cloneable interface for sending commands to
//! the engine actor, querying committed state and registering notification
//! handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::messages::{Command, EngineMessage, Outcome};
use super::on_engine_thread;
use crate::dispatch::Dispatcher;
use crate::engine::SpaceReader;
use crate::error::EngineError;
use crate::state::{Display, SpaceState, WindowEntry};

/// Error types for actor communication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to actor.
    #[error("Failed to send message to engine: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from engine: channel closed")]
    ReceiveFailed,

    /// Command timed out.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// A blocking command was issued from a notification handler.
    #[error("Commands cannot be issued from a notification handler")]
    Reentrant,
}

/// Handle for communicating with the engine actor.
///
/// This handle is cheap to clone and can be shared across threads.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineMessage>,
    reader: SpaceReader,
    dispatcher: Arc<Dispatcher>,
    host_version: Arc<str>,
}

impl EngineHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<EngineMessage>,
        reader: SpaceReader,
        dispatcher: Arc<Dispatcher>,
        host_version: &str,
    ) -> Self {
        Self {
            sender,
            reader,
            dispatcher,
            host_version: Arc::from(host_version),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Apply a command and block until the engine replies.
    ///
    /// Must not be called from inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Reentrant`] when called from a notification
    /// handler, a transport error if the actor has stopped, or the engine's
    /// rejection of the command.
    pub fn call(&self, command: Command) -> Result<Outcome, EngineError> {
        if on_engine_thread() {
            return Err(ActorError::Reentrant.into());
        }
        let (tx, rx) = oneshot::channel();

        self.sender
            .blocking_send(EngineMessage::Execute { command, respond_to: Some(tx) })
            .map_err(|_| ActorError::SendFailed)?;

        let reply = rx.blocking_recv().map_err(|_| ActorError::ReceiveFailed)?;
        Ok(reply?)
    }

    /// Apply a command and wait for the reply.
    ///
    /// # Errors
    ///
    /// Same as [`Self::call`].
    pub async fn call_async(&self, command: Command) -> Result<Outcome, EngineError> {
        if on_engine_thread() {
            return Err(ActorError::Reentrant.into());
        }
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(EngineMessage::Execute { command, respond_to: Some(tx) })
            .await
            .map_err(|_| ActorError::SendFailed)?;

        let reply = rx.await.map_err(|_| ActorError::ReceiveFailed)?;
        Ok(reply?)
    }

    /// Apply a command with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Timeout`] if the command doesn't complete in time,
    /// or any error from [`Self::call_async`].
    pub async fn call_timeout(
        &self,
        command: Command,
        timeout: Duration,
    ) -> Result<Outcome, EngineError> {
        tokio::time::timeout(timeout, self.call_async(command))
            .await
            .map_err(|_| ActorError::Timeout(timeout))?
    }

    /// Queue a command without waiting for it to be applied.
    ///
    /// Rejections are only logged.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed or full.
    pub fn send(&self, command: Command) -> Result<(), ActorError> {
        self.sender
            .try_send(EngineMessage::Execute { command, respond_to: None })
            .map_err(|_| ActorError::SendFailed)
    }

    /// Ask the actor to stop after the commands already queued.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the actor has already stopped.
    pub fn shutdown(&self) -> Result<(), ActorError> {
        self.sender.try_send(EngineMessage::Shutdown).map_err(|_| ActorError::SendFailed)
    }

    /// Whether the actor is still receiving messages.
    #[must_use]
    pub fn is_alive(&self) -> bool { !self.sender.is_closed() }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Run a query against the committed state.
    ///
    /// Queries do not go through the channel and are safe to run from a
    /// notification handler.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the actor has stopped.
    pub fn query<R>(&self, query: impl FnOnce(&SpaceState) -> R) -> Result<R, ActorError> {
        if !self.is_alive() {
            return Err(ActorError::SendFailed);
        }
        Ok(self.reader.read(query))
    }

    /// Displays, main display first.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub fn displays(&self) -> Result<Vec<Display>, ActorError> {
        self.query(|s| s.displays.clone())
    }

    /// Tracked windows in front-to-back order per space.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub fn windows(&self) -> Result<Vec<WindowEntry>, ActorError> {
        self.query(SpaceState::list_windows)
    }

    /// Version of this library, as reported to hosts.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub fn api_version(&self) -> Result<&'static str, ActorError> {
        self.query(|_| env!("CARGO_PKG_VERSION"))
    }

    /// Whether the engine answers with the API version this library was
    /// built against.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api_version().is_ok_and(|v| v == env!("CARGO_PKG_VERSION"))
    }

    /// Version of the host application, from configuration.
    #[must_use]
    pub fn host_version(&self) -> &str { &self.host_version }

    // ========================================================================
    // Notifications
    // ========================================================================

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher { &self.dispatcher }
}
