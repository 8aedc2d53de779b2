//! Timer scheduling
//!
//! This module provides the timer capability used by flow controllers. A
//! scheduler hands out opaque [`TimerHandle`]s; when a timer fires, the handle
//! itself is delivered back to the owner, which routes it to whatever
//! registered it. Nothing is captured by closure, so a controller never has to
//! be shared with the timer machinery.
//!
//! Two implementations are provided:
//! - [`ManualScheduler`] - deterministic fake clock for tests and previews
//! - [`TokioScheduler`] - real timers backed by tokio tasks

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Shortest period a repeating timer may have
pub const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Clamp a repeating period so it always moves the clock forward
fn repeat_interval(interval: Duration) -> Duration {
    if interval < MIN_REPEAT_INTERVAL {
        tracing::warn!(?interval, "Repeating interval too short, clamped");
        MIN_REPEAT_INTERVAL
    } else {
        interval
    }
}

/// Opaque identifier for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw numeric id, useful for logging
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Timer capability consumed by controllers
///
/// Cancellation is enforced here: once [`Scheduler::cancel`] returns, the
/// handle must never be delivered again, even if its timer had already
/// elapsed.
pub trait Scheduler: Send + Sync {
    /// Schedule a single firing after `delay`
    fn schedule_once(&self, delay: Duration) -> TimerHandle;

    /// Schedule a firing every `interval`, first one after one interval
    fn schedule_repeating(&self, interval: Duration) -> TimerHandle;

    /// Cancel a timer. Unknown or already-cancelled handles are ignored.
    fn cancel(&self, handle: TimerHandle);

    /// Whether the handle can still fire
    fn is_scheduled(&self, handle: TimerHandle) -> bool;
}

// =============================================================================
// Manual Scheduler
// =============================================================================

#[derive(Debug, Clone)]
struct ManualTimer {
    due: Duration,
    interval: Option<Duration>,
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<u64, ManualTimer>,
}

impl ManualState {
    fn insert(&mut self, delay: Duration, interval: Option<Duration>) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.insert(
            id,
            ManualTimer {
                due: self.now + delay,
                interval,
            },
        );
        TimerHandle(id)
    }

    /// Pop the earliest timer due at or before `target`, re-arming repeaters
    fn take_due(&mut self, target: Duration) -> Option<TimerHandle> {
        let (id, timer) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(id, t)| (t.due, **id))
            .map(|(id, t)| (*id, t.clone()))?;

        self.now = timer.due;
        match timer.interval {
            Some(interval) => {
                if let Some(t) = self.timers.get_mut(&id) {
                    t.due = timer.due + interval;
                }
            }
            None => {
                self.timers.remove(&id);
            }
        }
        Some(TimerHandle(id))
    }
}

/// Deterministic scheduler driven by an explicit clock
///
/// Time only moves when [`ManualScheduler::advance`] is called. Firings are
/// delivered one at a time and the lock is released between deliveries, so
/// the receiving code may schedule or cancel timers from inside the callback.
///
/// # Example
///
/// ```rust
/// use app_core::scheduler::{ManualScheduler, Scheduler};
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let tick = scheduler.schedule_repeating(Duration::from_secs(1));
///
/// let mut fired = Vec::new();
/// scheduler.advance(Duration::from_secs(3), |handle| fired.push(handle));
/// assert_eq!(fired, vec![tick, tick, tick]);
/// ```
#[derive(Debug, Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// Create a scheduler with its clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the fake clock
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of timers that can still fire
    pub fn pending(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Move the clock forward, delivering every firing that becomes due
    pub fn advance(&self, by: Duration, mut deliver: impl FnMut(TimerHandle)) {
        let target = self.state.lock().now + by;
        loop {
            // Guard dropped before delivery
            let next = self.state.lock().take_due(target);
            match next {
                Some(handle) => deliver(handle),
                None => break,
            }
        }
        self.state.lock().now = target;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration) -> TimerHandle {
        self.state.lock().insert(delay, None)
    }

    fn schedule_repeating(&self, interval: Duration) -> TimerHandle {
        let interval = repeat_interval(interval);
        self.state.lock().insert(interval, Some(interval))
    }

    fn cancel(&self, handle: TimerHandle) {
        self.state.lock().timers.remove(&handle.0);
    }

    fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.state.lock().timers.contains_key(&handle.0)
    }
}

// =============================================================================
// Tokio Scheduler
// =============================================================================

struct LiveTimer {
    task: JoinHandle<()>,
    repeating: bool,
}

type LiveTimers = Arc<Mutex<HashMap<TimerHandle, LiveTimer>>>;

/// Scheduler backed by tokio timers
///
/// Each timer is a spawned task that pushes its handle into a channel. The
/// paired [`TimerReceiver`] filters out handles that were cancelled after
/// being queued.
pub struct TokioScheduler {
    runtime: Handle,
    live: LiveTimers,
    tx: mpsc::UnboundedSender<TimerHandle>,
    next_id: AtomicU64,
}

impl TokioScheduler {
    /// Create a scheduler spawning onto `runtime`, plus its firing receiver
    pub fn new(runtime: Handle) -> (Self, TimerReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let live: LiveTimers = Arc::new(Mutex::new(HashMap::new()));
        let scheduler = Self {
            runtime,
            live: Arc::clone(&live),
            tx,
            next_id: AtomicU64::new(0),
        };
        (scheduler, TimerReceiver { rx, live })
    }

    fn next_handle(&self) -> TimerHandle {
        TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Spawn `body` and register it, holding the lock so the task can't
    /// report before it is tracked
    fn spawn_tracked<F>(&self, handle: TimerHandle, repeating: bool, body: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut live = self.live.lock();
        let task = self.runtime.spawn(body);
        live.insert(handle, LiveTimer { task, repeating });
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration) -> TimerHandle {
        let handle = self.next_handle();
        let tx = self.tx.clone();
        self.spawn_tracked(handle, false, async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(handle);
        });
        handle
    }

    fn schedule_repeating(&self, interval: Duration) -> TimerHandle {
        let interval = repeat_interval(interval);
        let handle = self.next_handle();
        let tx = self.tx.clone();
        self.spawn_tracked(handle, true, async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(handle).is_err() {
                    break;
                }
            }
        });
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(timer) = self.live.lock().remove(&handle) {
            timer.task.abort();
            tracing::debug!(timer = handle.id(), "Timer cancelled");
        }
    }

    fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.live.lock().contains_key(&handle)
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.live.lock().drain() {
            timer.task.abort();
        }
    }
}

/// Receiving side of a [`TokioScheduler`]
pub struct TimerReceiver {
    rx: mpsc::UnboundedReceiver<TimerHandle>,
    live: LiveTimers,
}

impl TimerReceiver {
    /// Wait for the next live firing
    ///
    /// Returns `None` once the scheduler has been dropped and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<TimerHandle> {
        loop {
            let handle = self.rx.recv().await?;
            if self.accept(handle) {
                return Some(handle);
            }
            tracing::debug!(timer = handle.id(), "Dropping firing of cancelled timer");
        }
    }

    /// Check liveness; a one-shot timer is retired by its own delivery
    fn accept(&self, handle: TimerHandle) -> bool {
        let mut live = self.live.lock();
        match live.get(&handle) {
            Some(timer) if timer.repeating => true,
            Some(_) => {
                live.remove(&handle);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_once_fires_exactly_once() {
        let scheduler = ManualScheduler::new();
        let once = scheduler.schedule_once(Duration::from_secs(5));

        let mut fired = Vec::new();
        scheduler.advance(Duration::from_secs(4), |h| fired.push(h));
        assert!(fired.is_empty());
        assert!(scheduler.is_scheduled(once));

        scheduler.advance(Duration::from_secs(10), |h| fired.push(h));
        assert_eq!(fired, vec![once]);
        assert!(!scheduler.is_scheduled(once));
        assert_eq!(scheduler.now(), Duration::from_secs(14));
    }

    #[test]
    fn test_manual_orders_by_due_then_creation() {
        let scheduler = ManualScheduler::new();
        let once = scheduler.schedule_once(Duration::from_secs(2));
        let tick = scheduler.schedule_repeating(Duration::from_secs(1));

        let mut fired = Vec::new();
        scheduler.advance(Duration::from_secs(2), |h| fired.push(h));
        assert_eq!(fired, vec![tick, once, tick]);
    }

    #[test]
    fn test_manual_cancel_during_delivery() {
        let scheduler = ManualScheduler::new();
        let first = scheduler.schedule_once(Duration::from_secs(1));
        let second = scheduler.schedule_repeating(Duration::from_secs(1));

        let mut fired = Vec::new();
        scheduler.advance(Duration::from_secs(3), |h| {
            fired.push(h);
            if h == first {
                scheduler.cancel(second);
            }
        });

        assert_eq!(fired, vec![first]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_manual_zero_interval_is_clamped() {
        let scheduler = ManualScheduler::new();
        let tick = scheduler.schedule_repeating(Duration::ZERO);

        let mut fired = Vec::new();
        scheduler.advance(3 * MIN_REPEAT_INTERVAL, |h| fired.push(h));
        assert_eq!(fired, vec![tick, tick, tick]);
        assert_eq!(scheduler.now(), 3 * MIN_REPEAT_INTERVAL);
    }

    #[test]
    fn test_manual_cancel_is_idempotent() {
        let scheduler = ManualScheduler::new();
        let tick = scheduler.schedule_repeating(Duration::from_secs(1));
        scheduler.cancel(tick);
        scheduler.cancel(tick);
        assert!(!scheduler.is_scheduled(tick));

        let mut fired = 0;
        scheduler.advance(Duration::from_secs(5), |_| fired += 1);
        assert_eq!(fired, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_once_delivers_after_delay() {
        let (scheduler, mut rx) = TokioScheduler::new(Handle::current());
        let started = tokio::time::Instant::now();
        let once = scheduler.schedule_once(Duration::from_secs(5));

        assert_eq!(rx.recv().await, Some(once));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(!scheduler.is_scheduled(once));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_cancel_stops_repeating() {
        let (scheduler, mut rx) = TokioScheduler::new(Handle::current());
        let tick = scheduler.schedule_repeating(Duration::from_secs(1));

        assert_eq!(rx.recv().await, Some(tick));
        scheduler.cancel(tick);

        let next = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(next.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_zero_interval_still_fires() {
        let (scheduler, mut rx) = TokioScheduler::new(Handle::current());
        let tick = scheduler.schedule_repeating(Duration::ZERO);

        let fired = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(fired.unwrap(), Some(tick));
        assert!(scheduler.is_scheduled(tick));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_drops_firing_queued_before_cancel() {
        let (scheduler, mut rx) = TokioScheduler::new(Handle::current());
        let once = scheduler.schedule_once(Duration::from_secs(1));

        // Let the timer elapse so its handle sits in the channel
        tokio::time::sleep(Duration::from_secs(2)).await;
        scheduler.cancel(once);

        let next = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(next.is_err());
    }
}
