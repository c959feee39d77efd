//! Engine actor module.
//!
//! The engine actor owns the [`SpaceEngine`] and applies commands
//! sequentially on a dedicated thread, so every mutation is serialized and
//! notifications always arrive on the same thread.
//!
//! # Panic Recovery
//!
//! If a command panics, the panic is caught and logged and the caller gets an
//! invariant error. The scratch copy the command was working on is dropped,
//! so committed state stays consistent and the actor keeps processing.

mod handle;
mod messages;

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};

pub use handle::{ActorError, EngineHandle};
pub use messages::{Command, EngineMessage, Outcome};
use spacegrid_shared::EngineConfig;
use tokio::sync::mpsc;

use crate::constants::actor::{CHANNEL_BUFFER_SIZE, THREAD_NAME};
use crate::engine::SpaceEngine;
use crate::error::{EngineError, SpaceError};

thread_local! {
    static ON_ENGINE_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is the engine thread.
///
/// True while a notification handler is running.
#[must_use]
pub fn on_engine_thread() -> bool { ON_ENGINE_THREAD.with(Cell::get) }

/// The actor that owns the engine.
pub struct EngineActor {
    engine: SpaceEngine,
    receiver: mpsc::Receiver<EngineMessage>,
}

impl EngineActor {
    /// Spawn the actor on its own thread and return a handle to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration produces an inconsistent initial
    /// state or the thread cannot be spawned.
    pub fn spawn(config: EngineConfig) -> Result<EngineHandle, EngineError> {
        tracing::debug!("spacegrid: spawning engine actor");
        let host_version = config.host_version.clone();
        let engine = SpaceEngine::new(config)?;
        let reader = engine.reader();
        let dispatcher = std::sync::Arc::clone(engine.dispatcher());

        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let actor = Self { engine, receiver };

        std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || actor.run_on_current_thread())?;

        Ok(EngineHandle::new(sender, reader, dispatcher, &host_version))
    }

    fn run_on_current_thread(self) {
        ON_ENGINE_THREAD.set(true);

        let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!(error = %err, "spacegrid: failed to build engine runtime");
                return;
            }
        };
        runtime.block_on(self.run());
    }

    /// Run the actor's message loop.
    async fn run(mut self) {
        tracing::trace!("spacegrid: engine message loop starting");

        while let Some(msg) = self.receiver.recv().await {
            let (command, respond_to) = match msg {
                EngineMessage::Shutdown => {
                    tracing::debug!("spacegrid: engine received shutdown message");
                    return;
                }
                EngineMessage::Execute { command, respond_to } => (command, respond_to),
            };

            let name = command.name();
            let result = catch_unwind(AssertUnwindSafe(|| self.engine.execute(command)));

            let reply = result.unwrap_or_else(|panic_info| {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());

                tracing::error!(command = name, panic = %panic_msg, "spacegrid: PANIC in engine");
                Err(SpaceError::invariant(format!("panic while handling {name}: {panic_msg}")))
            });

            match respond_to {
                Some(respond_to) => {
                    if respond_to.send(reply).is_err() {
                        tracing::trace!(command = name, "spacegrid: caller went away");
                    }
                }
                None => {
                    if let Err(err) = reply {
                        tracing::debug!(
                            command = name,
                            error = %err,
                            "spacegrid: queued command failed"
                        );
                    }
                }
            }
        }

        tracing::debug!("spacegrid: engine channel closed, exiting");
    }
}
