use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::error::EngineError;
use crate::level::LevelState;

/// Runs a level-loading job on a background thread.
///
/// The engine never sees a half-built level: the only way to get the
/// [`LevelState`] out is [`poll`](Self::poll) or [`wait`](Self::wait), and
/// both hand it over only once the job has finished successfully.
pub struct LevelLoader {
    rx: Receiver<Result<LevelState, EngineError>>,
    handle: Option<JoinHandle<()>>,
}

impl LevelLoader {
    /// Start `job` on its own thread.
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce() -> Result<LevelState, EngineError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            // The receiver may already be gone if the loader was dropped.
            let _ = tx.send(job());
        });
        Self { rx, handle: Some(handle) }
    }

    /// Non-blocking check. `None` while the job is still running.
    pub fn poll(&mut self) -> Option<Result<LevelState, EngineError>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.failure())),
        }
    }

    /// Block until the job finishes.
    pub fn wait(mut self) -> Result<LevelState, EngineError> {
        match self.rx.recv() {
            Ok(result) => {
                self.join();
                result
            }
            Err(_) => Err(self.failure()),
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Sender dropped without a message: the job panicked.
    fn failure(&mut self) -> EngineError {
        match self.handle.take().map(JoinHandle::join) {
            Some(Err(_)) => EngineError::LoaderPanicked,
            _ => EngineError::LoaderDisconnected,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
