// src/exec/registry.rs

//! Registry of in-flight executions.
//!
//! Every running child process is registered under a unique id together with
//! a one-shot cancel sender. [`ExecutionRegistry::kill_all`] fires all of them
//! at once; the process runner owning the receiving side kills its child.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, info};

/// Unique id of one execution.
pub type ExecutionId = String;

/// Source of execution ids.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&self) -> ExecutionId;
}

/// Random UUID v4 ids (production default).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> ExecutionId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Predictable ids (`exec-1`, `exec-2`, ...) for tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> ExecutionId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("exec-{n}")
    }
}

/// Map of running executions, keyed by id.
///
/// All mutation happens under one mutex, so `register`, `unregister` and
/// `kill_all` are atomic with respect to each other. An execution that was
/// registered but whose process is not spawned yet still receives the kill:
/// its cancel receiver is already resolved when the runner starts waiting.
pub struct ExecutionRegistry {
    ids: Box<dyn IdGenerator>,
    running: Mutex<HashMap<ExecutionId, oneshot::Sender<()>>>,
}

impl fmt::Debug for ExecutionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRegistry")
            .field("ids", &self.ids)
            .field("running", &self.len())
            .finish()
    }
}

impl Default for ExecutionRegistry {
    fn default() -> Self {
        Self::new(Box::new(UuidIdGenerator))
    }
}

impl ExecutionRegistry {
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            ids,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new execution and return its id and cancel receiver.
    pub fn register(&self) -> (ExecutionId, oneshot::Receiver<()>) {
        let id = self.ids.next_id();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let mut running = self.lock();
        running.insert(id.clone(), cancel_tx);
        debug!(execution_id = %id, running = running.len(), "execution registered");

        (id, cancel_rx)
    }

    /// Remove an execution. Returns `false` if it was already gone
    /// (finished earlier or removed by `kill_all`).
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.lock().remove(id).is_some();
        debug!(execution_id = %id, removed, "execution unregistered");
        removed
    }

    /// Signal every registered execution to be killed and clear the registry.
    ///
    /// Returns the number of executions signalled. Calling this with nothing
    /// registered is a no-op.
    pub fn kill_all(&self) -> usize {
        let drained: Vec<(ExecutionId, oneshot::Sender<()>)> = self.lock().drain().collect();
        let count = drained.len();

        for (id, cancel) in drained {
            if cancel.send(()).is_err() {
                debug!(execution_id = %id, "execution already finished while killing");
            } else {
                debug!(execution_id = %id, "kill signalled");
            }
        }

        if count > 0 {
            info!(count, "aborted all running executions");
        }
        count
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ExecutionId, oneshot::Sender<()>>> {
        // A poisoned map is still structurally valid; keep serving it.
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Removes its execution from the registry when dropped.
///
/// Held by the process runner for the lifetime of the child, so the entry
/// disappears on every exit path, including a dropped `execute` future.
pub struct Registration {
    registry: Arc<ExecutionRegistry>,
    id: ExecutionId,
}

impl Registration {
    pub fn new(registry: Arc<ExecutionRegistry>) -> (Self, oneshot::Receiver<()>) {
        let (id, cancel_rx) = registry.register();
        (Self { registry, id }, cancel_rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}
