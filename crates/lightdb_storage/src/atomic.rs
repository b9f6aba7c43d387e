//! Write-coalescing atomic store.
//!
//! [`AtomicStore`] owns one [`StorageBackend`] and guarantees that at most
//! one physical write is in flight at any time. Requests arriving while a
//! write is running are coalesced: only the newest payload is kept, and all
//! of those callers share the single write that follows.
//!
//! ## State Machine
//!
//! ```text
//!            write()                        write()
//!   Idle ─────────────▶ Writing ─────────────▶ Writing + queued
//!    ▲                    │  ▲                      │
//!    │   done, no queue   │  │  done, promote queue │
//!    └────────────────────┘  └──────────────────────┘
//! ```
//!
//! Physical writes run on a drain thread that lives for one busy window:
//! it is spawned on the `Idle -> Writing` transition and exits when the
//! store returns to `Idle`.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::file::FileBackend;
use parking_lot::{Condvar, Mutex};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Shape written when a store is read before anything was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyShape {
    /// An empty JSON object, `{}`.
    Object,
    /// An empty JSON array, `[]`.
    Array,
}

impl EmptyShape {
    /// Returns the serialized empty value.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Object => b"{}",
            Self::Array => b"[]",
        }
    }
}

/// Outcome slot shared by every caller waiting on one physical write.
#[derive(Debug, Default)]
struct Completion {
    outcome: Mutex<Option<StorageResult<()>>>,
    ready: Condvar,
}

impl Completion {
    fn resolved(outcome: StorageResult<()>) -> Self {
        Self {
            outcome: Mutex::new(Some(outcome)),
            ready: Condvar::new(),
        }
    }

    fn resolve(&self, outcome: StorageResult<()>) {
        *self.outcome.lock() = Some(outcome);
        self.ready.notify_all();
    }

    fn wait(&self) -> StorageResult<()> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.ready.wait(&mut outcome);
        }
    }

    fn peek(&self) -> Option<StorageResult<()>> {
        self.outcome.lock().clone()
    }
}

/// Handle to the physical write that will cover a requested payload.
///
/// Tickets handed out during the same busy window share one completion and
/// resolve together with the outcome of that single write.
#[derive(Debug, Clone)]
pub struct WriteTicket {
    completion: Arc<Completion>,
}

impl WriteTicket {
    /// Creates a ticket that is already resolved with `outcome`.
    #[must_use]
    pub fn ready(outcome: StorageResult<()>) -> Self {
        Self {
            completion: Arc::new(Completion::resolved(outcome)),
        }
    }

    /// Blocks until the covering write finished and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns the error of the physical write that covered this request.
    pub fn wait(&self) -> StorageResult<()> {
        self.completion.wait()
    }

    /// Returns the outcome if the covering write already finished.
    #[must_use]
    pub fn try_result(&self) -> Option<StorageResult<()>> {
        self.completion.peek()
    }

    /// Returns true once the covering write finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion.peek().is_some()
    }

    /// Returns true if both tickets are resolved by the same physical write.
    #[must_use]
    pub fn shares_write_with(&self, other: &WriteTicket) -> bool {
        Arc::ptr_eq(&self.completion, &other.completion)
    }
}

/// The newest payload waiting for the in-flight write to finish.
struct QueuedWrite {
    payload: Vec<u8>,
    completion: Arc<Completion>,
}

enum WriteState {
    Idle,
    Writing {
        in_flight: Arc<Completion>,
        queued: Option<QueuedWrite>,
    },
}

struct Shared {
    backend: Arc<dyn StorageBackend>,
    state: Mutex<WriteState>,
    idle: Condvar,
}

impl Shared {
    /// Runs physical writes until no payload is queued.
    fn drain(&self, mut payload: Vec<u8>) {
        loop {
            debug!(
                path = %self.backend.path().display(),
                bytes = payload.len(),
                "writing snapshot"
            );
            let outcome = self.backend.replace(&payload);
            if let Err(e) = &outcome {
                warn!(path = %self.backend.path().display(), error = %e, "snapshot write failed");
            }

            let mut state = self.state.lock();
            let next = match std::mem::replace(&mut *state, WriteState::Idle) {
                WriteState::Writing {
                    in_flight,
                    queued: Some(next),
                } => {
                    in_flight.resolve(outcome);
                    *state = WriteState::Writing {
                        in_flight: next.completion,
                        queued: None,
                    };
                    Some(next.payload)
                }
                WriteState::Writing {
                    in_flight,
                    queued: None,
                } => {
                    in_flight.resolve(outcome);
                    None
                }
                WriteState::Idle => None,
            };

            match next {
                Some(queued) => payload = queued,
                None => {
                    self.idle.notify_all();
                    return;
                }
            }
        }
    }

    /// Fails every pending waiter and returns to idle.
    fn abort(&self, err: StorageError) {
        let mut state = self.state.lock();
        if let WriteState::Writing { in_flight, queued } =
            std::mem::replace(&mut *state, WriteState::Idle)
        {
            in_flight.resolve(Err(err.clone()));
            if let Some(next) = queued {
                next.completion.resolve(Err(err));
            }
        }
        self.idle.notify_all();
    }
}

/// A store that persists whole snapshots atomically and coalesces bursts.
///
/// # Guarantees
///
/// - At most one physical write is in flight per store
/// - A write arriving while one is in flight supersedes any queued payload;
///   superseded payloads are never written
/// - Every caller is resolved only after a write covering its payload (or a
///   newer one) finished, with that write's outcome
/// - Dropping the store blocks until pending writes have landed
///
/// # Example
///
/// ```rust
/// use lightdb_storage::{AtomicStore, EmptyShape, InMemoryBackend};
/// use std::sync::Arc;
///
/// let backend = Arc::new(InMemoryBackend::new());
/// let store = AtomicStore::new(backend.clone());
///
/// assert_eq!(store.read(EmptyShape::Object).unwrap(), b"{}");
/// store.write(br#"{"a":1}"#.to_vec()).wait().unwrap();
/// assert_eq!(backend.data().unwrap(), br#"{"a":1}"#);
/// ```
pub struct AtomicStore {
    shared: Arc<Shared>,
}

impl AtomicStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                state: Mutex::new(WriteState::Idle),
                idle: Condvar::new(),
            }),
        }
    }

    /// Creates a store persisting to the file at `path`.
    #[must_use]
    pub fn file(path: &Path) -> Self {
        Self::new(Arc::new(FileBackend::open(path)))
    }

    /// Returns the location this store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.shared.backend.path()
    }

    /// Reads the persisted contents synchronously.
    ///
    /// If nothing is stored yet, a best-effort write of the empty shape is
    /// queued and the empty shape is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AccessDenied`] on permission failures and the
    /// backend's error for any other failure besides "not found".
    pub fn read(&self, shape: EmptyShape) -> StorageResult<Vec<u8>> {
        match self.shared.backend.load()? {
            Some(data) => Ok(data),
            None => {
                info!(path = %self.path().display(), "creating empty store");
                let _ = self.write(shape.as_bytes().to_vec());
                Ok(shape.as_bytes().to_vec())
            }
        }
    }

    /// Requests that `payload` becomes the persisted contents.
    ///
    /// Returns immediately; use the ticket to wait for the outcome.
    pub fn write(&self, payload: Vec<u8>) -> WriteTicket {
        let mut state = self.shared.state.lock();

        if let WriteState::Writing { queued, .. } = &mut *state {
            let completion = match queued {
                Some(next) => {
                    debug!(path = %self.path().display(), "superseding queued snapshot");
                    next.payload = payload;
                    Arc::clone(&next.completion)
                }
                None => {
                    debug!(path = %self.path().display(), "write in flight, queueing snapshot");
                    let completion = Arc::new(Completion::default());
                    *queued = Some(QueuedWrite {
                        payload,
                        completion: Arc::clone(&completion),
                    });
                    completion
                }
            };
            return WriteTicket { completion };
        }

        let completion = Arc::new(Completion::default());
        *state = WriteState::Writing {
            in_flight: Arc::clone(&completion),
            queued: None,
        };
        drop(state);

        self.start_drain(payload);
        WriteTicket { completion }
    }

    /// Returns true while a physical write is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(*self.shared.state.lock(), WriteState::Writing { .. })
    }

    /// Blocks until no write is in flight or queued.
    pub fn wait_idle(&self) {
        let mut state = self.shared.state.lock();
        while matches!(*state, WriteState::Writing { .. }) {
            self.shared.idle.wait(&mut state);
        }
    }

    fn start_drain(&self, payload: Vec<u8>) {
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("lightdb-writer".to_string())
            .spawn(move || shared.drain(payload));

        if let Err(e) = spawned {
            warn!(path = %self.path().display(), error = %e, "could not start writer thread");
            let err = StorageError::from_io(self.path(), e);
            self.shared.abort(err);
        }
    }
}

impl Drop for AtomicStore {
    fn drop(&mut self) {
        self.wait_idle();
    }
}

impl std::fmt::Debug for AtomicStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicStore")
            .field("path", &self.path())
            .field("busy", &self.is_busy())
            .finish()
    }
}
