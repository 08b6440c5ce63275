//! Ordered asynchronous listener callbacks
//!
//! Each listener owns an unbounded queue drained by its own worker thread, so
//! callbacks for one listener run in enqueue order and a slow or failing
//! listener never delays the others. Enqueueing never blocks, which lets
//! writers enqueue while holding their critical section.

use crate::error::KnowledgeError;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Callback to run against one listener
pub type Callback<L> = Arc<dyn Fn(&L) + Send + Sync>;

/// What to do with a listener whose callback panicked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionPolicy {
    /// Log the failure and deregister the listener
    #[default]
    LogAndCancel,
    /// Log the failure and keep delivering
    LogAndProceed,
}

/// Handle returned on registration, used to deregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Slot<L: ?Sized + 'static> {
    sender: Sender<Callback<L>>,
    cancelled: Arc<AtomicBool>,
}

struct ManagerState<L: ?Sized + 'static> {
    next_id: u64,
    slots: HashMap<ListenerId, Slot<L>>,
}

/// Per-listener ordered callback dispatcher
pub struct OrderedCallbackManager<L: ?Sized + Send + Sync + 'static> {
    policy: ExceptionPolicy,
    state: Mutex<ManagerState<L>>,
}

impl<L: ?Sized + Send + Sync + 'static> OrderedCallbackManager<L> {
    pub fn new(policy: ExceptionPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(ManagerState {
                next_id: 0,
                slots: HashMap::new(),
            }),
        }
    }

    /// Register a listener; `initial` is its first callback
    pub fn add_listener_and_enqueue(
        &self,
        listener: Arc<L>,
        initial: Callback<L>,
    ) -> Result<ListenerId, KnowledgeError> {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_id);
        state.next_id += 1;

        let (sender, receiver) = unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);
        let policy = self.policy;
        thread::Builder::new()
            .name(format!("knowledge-listener-{}", id.0))
            .spawn(move || run_worker(id, listener, receiver, worker_cancelled, policy))?;

        // the worker holds the receiver, so this cannot fail
        let _ = sender.send(initial);
        state.slots.insert(id, Slot { sender, cancelled });
        debug!(listener = id.0, "Listener registered");
        Ok(id)
    }

    /// Enqueue a callback for every registered listener
    pub fn enqueue(&self, callback: Callback<L>) {
        let mut state = self.state.lock();
        state.slots.retain(|id, slot| {
            if slot.cancelled.load(Ordering::Acquire) {
                return false;
            }
            match slot.sender.send(Arc::clone(&callback)) {
                Ok(()) => true,
                Err(_) => {
                    debug!(listener = id.0, "Dropping listener with closed queue");
                    false
                }
            }
        });
    }

    /// Deregister a listener; pending callbacks for it are discarded
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        match self.state.lock().slots.remove(&id) {
            Some(slot) => {
                slot.cancelled.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .filter(|s| !s.cancelled.load(Ordering::Acquire))
            .count()
    }
}

fn run_worker<L: ?Sized + 'static>(
    id: ListenerId,
    listener: Arc<L>,
    receiver: Receiver<Callback<L>>,
    cancelled: Arc<AtomicBool>,
    policy: ExceptionPolicy,
) {
    for callback in receiver {
        if cancelled.load(Ordering::Acquire) {
            break;
        }
        let result = catch_unwind(AssertUnwindSafe(|| callback(listener.as_ref())));
        if let Err(panic) = result {
            let message = panic_message(panic.as_ref());
            match policy {
                ExceptionPolicy::LogAndCancel => {
                    error!(listener = id.0, error = %message, "Listener callback failed; cancelling listener");
                    cancelled.store(true, Ordering::Release);
                    break;
                }
                ExceptionPolicy::LogAndProceed => {
                    error!(listener = id.0, error = %message, "Listener callback failed");
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
