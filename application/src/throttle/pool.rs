//! Priority worker pool
//!
//! A bounded set of slots shared by every provider call. When the pool is
//! full, waiters are served by ascending priority, then by request admission
//! sequence, then by arrival. A free slot is handed straight to the next
//! waiter, so `available > 0` implies nobody is waiting.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// (priority, admission sequence, ticket)
type WaiterKey = (i32, u64, u64);

#[derive(Debug)]
struct PoolState {
    available: usize,
    waiters: BTreeMap<WaiterKey, oneshot::Sender<()>>,
}

#[derive(Debug)]
pub struct WorkerPool {
    capacity: usize,
    state: Mutex<PoolState>,
    tickets: AtomicU64,
}

enum Enqueued {
    Granted,
    Waiting(WaiterKey, oneshot::Receiver<()>),
}

impl WorkerPool {
    /// Create a pool with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            capacity,
            state: Mutex::new(PoolState {
                available: capacity,
                waiters: BTreeMap::new(),
            }),
            tickets: AtomicU64::new(0),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.lock().available
    }

    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Wait for a slot.
    ///
    /// Cancel-safe: dropping the future gives up the place in line, or
    /// returns the slot if it was granted in the meantime.
    pub async fn acquire(self: &Arc<Self>, priority: i32, sequence: u64) -> WorkerSlot {
        let (key, receiver) = match self.enqueue(priority, sequence) {
            Enqueued::Granted => return WorkerSlot::new(Arc::clone(self)),
            Enqueued::Waiting(key, receiver) => (key, receiver),
        };

        let mut waiter = Waiter {
            pool: Arc::clone(self),
            key,
            granted: false,
        };
        // senders leave the queue only by sending, so this cannot fail while
        // the waiter is alive
        let _ = receiver.await;
        waiter.granted = true;
        WorkerSlot::new(Arc::clone(self))
    }

    fn enqueue(&self, priority: i32, sequence: u64) -> Enqueued {
        let mut state = self.lock();
        if state.available > 0 {
            state.available -= 1;
            return Enqueued::Granted;
        }
        let key = (
            priority,
            sequence,
            self.tickets.fetch_add(1, Ordering::Relaxed),
        );
        let (sender, receiver) = oneshot::channel();
        state.waiters.insert(key, sender);
        Enqueued::Waiting(key, receiver)
    }

    fn release(&self) {
        let mut state = self.lock();
        while let Some((_, sender)) = state.waiters.pop_first() {
            if sender.send(()).is_ok() {
                return;
            }
        }
        state.available = (state.available + 1).min(self.capacity);
    }

    fn abandon(&self, key: WaiterKey) {
        let still_queued = self.lock().waiters.remove(&key).is_some();
        if !still_queued {
            // granted after we stopped listening; pass it on
            self.release();
        }
    }
}

struct Waiter {
    pool: Arc<WorkerPool>,
    key: WaiterKey,
    granted: bool,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if !self.granted {
            self.pool.abandon(self.key);
        }
    }
}

/// A held pool slot, returned on drop
#[derive(Debug)]
pub struct WorkerSlot {
    pool: Arc<WorkerPool>,
}

impl WorkerSlot {
    fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.pool.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let pool = WorkerPool::new(2);
        let a = pool.acquire(0, 0).await;
        let b = pool.acquire(0, 1).await;
        assert_eq!(pool.available(), 0);
        drop(a);
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_waiters_served_by_priority_then_sequence() {
        let pool = WorkerPool::new(1);
        let held = pool.acquire(0, 0).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        for (priority, sequence) in [(5, 1), (1, 3), (1, 2), (-2, 4)] {
            let pool = Arc::clone(&pool);
            let tx = tx.clone();
            tokio::spawn(async move {
                let slot = pool.acquire(priority, sequence).await;
                tx.send((priority, sequence)).unwrap();
                drop(slot);
            });
        }
        while pool.waiting() < 4 {
            tokio::task::yield_now().await;
        }

        drop(held);
        let mut order = Vec::new();
        for _ in 0..4 {
            order.push(rx.recv().await.unwrap());
        }
        assert_eq!(order, vec![(-2, 4), (1, 2), (1, 3), (5, 1)]);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_waiter_does_not_leak_slot() {
        let pool = WorkerPool::new(1);
        let held = pool.acquire(0, 0).await;

        let waited =
            tokio::time::timeout(Duration::from_millis(10), pool.acquire(0, 1)).await;
        assert!(waited.is_err());
        assert_eq!(pool.waiting(), 0);

        drop(held);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_capacity_at_least_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.available(), 1);
    }
}
