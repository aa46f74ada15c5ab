//! Background thread for commits.
//!
//! `SaveWorker` owns a thread that runs [`AnnotationStore::save`] so the
//! caller never blocks on disk I/O. Results come back tagged with the
//! session they belong to; the controller drops results whose session is
//! gone.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::error::PersistenceError;
use super::key::ImageKey;
use super::traits::AnnotationStore;
use crate::session::{CommitRequest, SessionId};

/// Save request sent to the background thread.
struct SaveRequest {
    id: u32,
    commit: CommitRequest,
}

/// Message sent to the save thread.
enum ThreadMessage {
    Save(SaveRequest),
    Shutdown,
}

/// Outcome of one background save.
#[derive(Debug)]
pub struct SaveResult {
    /// Id returned by [`SaveWorker::submit`]
    pub request_id: u32,
    /// Session that asked for the save
    pub session_id: SessionId,
    /// Image that was saved
    pub image: ImageKey,
    /// Objects as written (rounded pixels)
    pub objects: Vec<crate::model::AnnotatedObject>,
    pub result: Result<(), PersistenceError>,
}

/// Manages a background thread for saving object lists.
pub struct SaveWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<SaveResult>,
    thread_handle: Option<JoinHandle<()>>,
    next_id: u32,
    /// Request ids not yet collected
    pending: HashSet<u32>,
}

impl SaveWorker {
    /// Spawn a save thread writing through `store`.
    pub fn spawn(store: Arc<dyn AnnotationStore>) -> Result<Self, PersistenceError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<SaveResult>();

        let thread_handle = thread::Builder::new()
            .name("annotation-saver".to_string())
            .spawn(move || {
                log::info!("Save thread started ({})", store.display_name());
                Self::thread_loop(store.as_ref(), request_rx, result_tx);
                log::info!("Save thread exiting");
            })
            .map_err(|e| {
                PersistenceError::WorkerUnavailable(format!("failed to spawn save thread: {}", e))
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_id: 0,
            pending: HashSet::new(),
        })
    }

    fn thread_loop(
        store: &dyn AnnotationStore,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<SaveResult>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Save(request)) => {
                    let SaveRequest { id, commit } = request;
                    log::debug!(
                        "Saving request {} ({} objects for '{}')",
                        id,
                        commit.objects.len(),
                        commit.image
                    );
                    let result = store.save(&commit.image, &commit.objects);
                    let message = SaveResult {
                        request_id: id,
                        session_id: commit.session_id,
                        image: commit.image,
                        objects: commit.objects,
                        result,
                    };
                    if result_tx.send(message).is_err() {
                        log::warn!("Result channel closed, save thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, save thread exiting");
                    break;
                }
            }
        }
    }

    /// Queue a commit; returns the request id.
    pub fn submit(&mut self, commit: CommitRequest) -> Result<u32, PersistenceError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        self.request_tx
            .send(ThreadMessage::Save(SaveRequest { id, commit }))
            .map_err(|_| PersistenceError::WorkerUnavailable("save thread is gone".to_string()))?;

        self.pending.insert(id);
        log::debug!("Sent save request {}", id);
        Ok(id)
    }

    /// Take one completed result. Non-blocking.
    pub fn take_one_result(&mut self) -> Option<SaveResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.pending.remove(&result.request_id);
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Save thread disconnected");
                None
            }
        }
    }

    /// Block up to `timeout` for the next result.
    pub fn wait_result(&mut self, timeout: Duration) -> Option<SaveResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.pending.remove(&result.request_id);
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Save thread disconnected");
                None
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down save thread ({} pending)", self.pending.len());

        // Queued saves ahead of the shutdown message still run
        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Save thread panicked: {:?}", e);
            }
        }
    }
}
