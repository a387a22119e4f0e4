//! Host-granted periodic ticks for animated controls.
//!
//! Controls never own timers. They register with the tree's [`Ticker`] and the host calls
//! [`ControlTree::tick`] from its event loop; a [`TickPump`] is available for hosts that
//! want a background thread to tell them when a tick is due.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::runtime::tree::{ControlId, ControlTree, InvalidationReason};

#[derive(Debug, Clone, Copy)]
struct TickEntry {
    interval: Duration,
    next_due: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct Ticker {
    entries: BTreeMap<ControlId, TickEntry>,
}

impl Ticker {
    /// Registers (or re-registers with a new interval). The first tick is due immediately.
    pub fn register(&mut self, id: ControlId, interval: Duration) {
        self.entries.insert(
            id,
            TickEntry {
                interval,
                next_due: None,
            },
        );
    }

    pub fn unregister(&mut self, id: ControlId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn is_registered(&self, id: ControlId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids due at `now`, rescheduled one interval later.
    fn take_due(&mut self, now: Instant) -> Vec<ControlId> {
        let mut due = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            if entry.next_due.map_or(true, |deadline| deadline <= now) {
                entry.next_due = Some(now + entry.interval);
                due.push(*id);
            }
        }
        due
    }

    /// Earliest pending deadline; `None` when nothing is registered.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .values()
            .map(|entry| entry.next_due.unwrap_or_else(Instant::now))
            .min()
    }
}

impl ControlTree {
    /// Grants `id` periodic ticks; `None` uses the configured default interval.
    pub fn register_tick(&mut self, id: ControlId, interval: Option<Duration>) {
        let interval = interval.unwrap_or(self.config().tick_interval);
        self.ticker.register(id, interval);
    }

    pub fn unregister_tick(&mut self, id: ControlId) -> bool {
        self.ticker.unregister(id)
    }

    pub fn is_ticking(&self, id: ControlId) -> bool {
        self.ticker.is_registered(id)
    }

    pub fn next_tick_deadline(&self) -> Option<Instant> {
        self.ticker.next_deadline()
    }

    /// Delivers due ticks. Returns `true` when any control changed and was invalidated.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for id in self.ticker.take_due(now) {
            if !self.contains(id) {
                self.ticker.unregister(id);
                continue;
            }
            let repaint = self
                .with_control(id, |control, tree| {
                    control
                        .as_tickable()
                        .is_some_and(|tickable| tickable.on_tick(tree, id, now))
                })
                .unwrap_or(false);
            if repaint {
                self.invalidate(id, InvalidationReason::State);
                changed = true;
            }
        }
        changed
    }
}

type WakeCallback = Arc<dyn Fn() + Send + Sync>;

/// Background thread that raises a "tick due" flag every `interval` and wakes the host.
///
/// The pump never touches controls; the host observes [`TickPump::take_pending`] on its own
/// thread and calls [`ControlTree::tick`]. Dropping the pump stops and joins the thread.
pub struct TickPump {
    stop_flag: Arc<AtomicBool>,
    pending: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TickPump {
    pub fn start(interval: Duration, wake: impl Fn() + Send + Sync + 'static) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(AtomicBool::new(false));
        let wake: WakeCallback = Arc::new(wake);

        let thread_stop = Arc::clone(&stop_flag);
        let thread_pending = Arc::clone(&pending);
        let thread = thread::spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if thread_stop.load(Ordering::SeqCst) {
                    break;
                }
                if !thread_pending.swap(true, Ordering::SeqCst) {
                    wake();
                }
            }
        });

        Self {
            stop_flag,
            pending,
            thread: Some(thread),
        }
    }

    /// Clears and returns the pending flag.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickPump {
    fn drop(&mut self) {
        self.stop();
    }
}
