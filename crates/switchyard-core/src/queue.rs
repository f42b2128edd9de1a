//! Request queue coordinator.
//!
//! A single global admission queue with one active slot:
//! - `enqueue` runs a job only once every job submitted before it has settled
//! - jobs run strictly one at a time, in submission order
//! - a job's error is returned to its own caller only; the next job starts regardless
//!
//! The job runs on the caller's task, so it may borrow the request and
//! response it operates on. Admission order is the order in which `enqueue`
//! futures are first polled.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, watch};
use tracing::debug;

/// FIFO admission queue allowing one active job at a time.
///
/// Dropping a waiting `enqueue` future removes it from the queue. Dropping
/// an active job (or panicking inside it) releases the slot to the next
/// waiter, so a failure never stalls the queue.
pub struct RequestQueue {
    state: Mutex<QueueState>,
    len_tx: watch::Sender<usize>,
}

#[derive(Default)]
struct QueueState {
    /// Whether a job currently holds the active slot.
    active: bool,
    /// Ticket handed to the next waiter.
    next_ticket: u64,
    /// Jobs waiting for the active slot, oldest first.
    waiting: VecDeque<Waiter>,
}

impl QueueState {
    fn len(&self) -> usize {
        self.waiting.len() + usize::from(self.active)
    }
}

struct Waiter {
    ticket: u64,
    wake: oneshot::Sender<()>,
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestQueue {
    /// Create an idle queue.
    pub fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            state: Mutex::new(QueueState::default()),
            len_tx,
        }
    }

    /// Run `job` under global mutual exclusion and return its output.
    ///
    /// The job is started once all previously admitted jobs have settled.
    /// Its output, including any error, is forwarded unchanged.
    pub async fn enqueue<F, Fut, T>(&self, job: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _slot = self.admit().await;
        job().await
    }

    /// Number of jobs in the queue, including the active one.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no job is active or waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to changes in [`RequestQueue::len`].
    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }

    async fn admit(&self) -> ActiveSlot<'_> {
        let (ticket, wake) = {
            let mut state = self.lock();
            if !state.active {
                state.active = true;
                self.publish_len(&state);
                debug!("job admitted to idle queue");
                return ActiveSlot { queue: self };
            }

            let ticket = state.next_ticket;
            state.next_ticket = state.next_ticket.wrapping_add(1);
            let (tx, rx) = oneshot::channel();
            state.waiting.push_back(Waiter { ticket, wake: tx });
            self.publish_len(&state);
            debug!(ticket, waiting = state.waiting.len(), "job waiting for active slot");
            (ticket, rx)
        };

        let mut pending = PendingAdmission {
            queue: self,
            ticket,
            wake,
            admitted: false,
        };
        // The sender is consumed only by `release`, which sends while this
        // receiver is alive.
        let _ = (&mut pending.wake).await;
        pending.admitted = true;
        debug!(ticket, "job admitted");
        ActiveSlot { queue: self }
    }

    /// Hand the active slot to the oldest live waiter, or go idle.
    fn release(&self) {
        let mut state = self.lock();
        while let Some(waiter) = state.waiting.pop_front() {
            if waiter.wake.send(()).is_ok() {
                self.publish_len(&state);
                return;
            }
        }
        state.active = false;
        self.publish_len(&state);
        debug!("queue idle");
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_len(&self, state: &QueueState) {
        self.len_tx.send_replace(state.len());
    }
}

/// Held by the running job; releases the slot when dropped.
struct ActiveSlot<'a> {
    queue: &'a RequestQueue,
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        self.queue.release();
    }
}

/// Held while waiting for admission; cleans up if the wait is abandoned.
///
/// Owns the wake receiver so the waiter entry and the receiver go away
/// together, under the state lock.
struct PendingAdmission<'a> {
    queue: &'a RequestQueue,
    ticket: u64,
    wake: oneshot::Receiver<()>,
    admitted: bool,
}

impl Drop for PendingAdmission<'_> {
    fn drop(&mut self) {
        if self.admitted {
            return;
        }
        let queue = self.queue;
        let mut state = queue.lock();
        if let Some(index) = state.waiting.iter().position(|w| w.ticket == self.ticket) {
            state.waiting.remove(index);
            queue.publish_len(&state);
            debug!(ticket = self.ticket, "abandoned job left the queue");
            return;
        }
        // `release` pops and sends under the same lock, so a missing entry
        // with a delivered wake means this job owns the slot.
        if self.wake.try_recv().is_ok() {
            drop(state);
            debug!(ticket = self.ticket, "admitted job dropped before running");
            queue.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use switchyard_types::errors::SwitchyardError;

    fn push(log: &Mutex<Vec<String>>, entry: &str) {
        log.lock().unwrap().push(entry.to_string());
    }

    /// Poll `fut` once; true if it completed.
    async fn poll_once<F: Future + Unpin>(fut: &mut F) -> bool {
        tokio::select! {
            biased;
            _ = fut => true,
            _ = std::future::ready(()) => false,
        }
    }

    /// Counts jobs inside their body; records any overlap.
    struct Running<'a> {
        running: &'a AtomicUsize,
    }

    impl<'a> Running<'a> {
        fn enter(running: &'a AtomicUsize, overlaps: &AtomicUsize) -> Self {
            if running.fetch_add(1, Ordering::SeqCst) != 0 {
                overlaps.fetch_add(1, Ordering::SeqCst);
            }
            Self { running }
        }
    }

    impl Drop for Running<'_> {
        fn drop(&mut self) {
            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_returns_job_output() {
        let queue = RequestQueue::new();
        let value = queue.enqueue(|| async { 42 }).await;
        assert_eq!(value, 42);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_forwards_job_error() {
        let queue = RequestQueue::new();
        let result: Result<(), SwitchyardError> = queue
            .enqueue(|| async { Err(SwitchyardError::ApprovalDeclined("no".to_string())) })
            .await;
        assert_eq!(
            result,
            Err(SwitchyardError::ApprovalDeclined("no".to_string()))
        );
    }

    #[tokio::test]
    async fn test_jobs_run_one_at_a_time_in_order() {
        let queue = RequestQueue::new();
        let log = Mutex::new(Vec::new());
        let log = &log;

        let job = |name: &'static str| {
            move || async move {
                push(log, &format!("start {name}"));
                tokio::task::yield_now().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
                push(log, &format!("end {name}"));
            }
        };

        tokio::join!(
            queue.enqueue(job("a")),
            queue.enqueue(job("b")),
            queue.enqueue(job("c")),
        );

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start a", "end a", "start b", "end b", "start c", "end c"]
        );
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_failed_job_does_not_block_next() {
        let queue = RequestQueue::new();

        let (first, second) = tokio::join!(
            queue.enqueue(|| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Err::<u32, _>(SwitchyardError::Internal("boom".to_string()))
            }),
            queue.enqueue(|| async { Ok::<u32, SwitchyardError>(7) }),
        );

        assert!(first.is_err());
        assert_eq!(second, Ok(7));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_job_releases_slot() {
        let queue = Arc::new(RequestQueue::new());

        let panicking = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue
                    .enqueue(|| async {
                        panic!("job panicked");
                    })
                    .await
            })
        };
        assert!(panicking.await.is_err());

        let value = tokio::time::timeout(
            Duration::from_secs(1),
            queue.enqueue(|| async { "next" }),
        )
        .await
        .expect("queue stalled after panic");
        assert_eq!(value, "next");
    }

    #[tokio::test]
    async fn test_abandoned_waiter_is_removed() {
        let owned = RequestQueue::new();
        let queue = &owned;
        let (hold_tx, hold_rx) = oneshot::channel::<()>();

        let holder = queue.enqueue(move || async move {
            let _ = hold_rx.await;
        });

        let check = async move {
            // The holder is active; this waiter gives up before it is admitted.
            let abandoned =
                tokio::time::timeout(Duration::from_millis(10), queue.enqueue(|| async {})).await;
            assert!(abandoned.is_err());
            assert_eq!(queue.len(), 1);

            hold_tx.send(()).unwrap();
        };

        tokio::join!(holder, check);
        assert!(queue.is_empty());

        let value = queue.enqueue(|| async { 1 }).await;
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_len_tracks_waiting_and_active_jobs() {
        let owned = RequestQueue::new();
        let queue = &owned;
        let mut len_rx = queue.subscribe_len();
        assert_eq!(*len_rx.borrow(), 0);

        let (release_tx, release_rx) = oneshot::channel::<()>();
        let observed = Mutex::new(Vec::new());
        let observed = &observed;

        let first = queue.enqueue(move || async move {
            let _ = release_rx.await;
        });
        let second = queue.enqueue(|| async {});
        let observer = async move {
            tokio::task::yield_now().await;
            observed.lock().unwrap().push(queue.len());
            release_tx.send(()).unwrap();
        };

        tokio::join!(first, second, observer);

        assert_eq!(*observed.lock().unwrap(), vec![2]);
        assert!(len_rx.has_changed().unwrap());
        assert_eq!(*len_rx.borrow_and_update(), 0);
    }

    #[tokio::test]
    async fn test_woken_job_dropped_before_running_passes_slot_on() {
        let queue = RequestQueue::new();
        let slot = queue.admit().await;

        let mut b = Box::pin(queue.enqueue(|| async { "b" }));
        let mut c = Box::pin(queue.enqueue(|| async { "c" }));
        assert!(!poll_once(&mut b).await);
        assert!(!poll_once(&mut c).await);
        assert_eq!(queue.len(), 3);

        // b is woken, then dropped without ever running.
        drop(slot);
        drop(b);
        {
            let state = queue.lock();
            assert!(state.active);
            assert!(state.waiting.is_empty());
        }

        let mut d = Box::pin(queue.enqueue(|| async { "d" }));
        assert!(!poll_once(&mut d).await);
        assert_eq!(queue.len(), 2);

        assert_eq!(c.await, "c");
        assert_eq!(d.await, "d");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_dropped_before_wake_never_frees_active_slot() {
        let queue = RequestQueue::new();
        let slot = queue.admit().await;

        let mut b = Box::pin(queue.enqueue(|| async { "b" }));
        let mut c = Box::pin(queue.enqueue(|| async { "c" }));
        assert!(!poll_once(&mut b).await);
        assert!(!poll_once(&mut c).await);

        drop(b);
        assert_eq!(queue.len(), 2);

        // Release skips nothing and hands the slot straight to c.
        drop(slot);
        let mut d = Box::pin(queue.enqueue(|| async { "d" }));
        assert!(!poll_once(&mut d).await);
        {
            let state = queue.lock();
            assert!(state.active);
            assert_eq!(state.waiting.len(), 1);
        }

        assert_eq!(c.await, "c");
        assert_eq!(d.await, "d");
        assert!(queue.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancellations_never_admit_two_jobs() {
        let queue = Arc::new(RequestQueue::new());
        let running = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for i in 0..64u64 {
            let queue = Arc::clone(&queue);
            let running = Arc::clone(&running);
            let overlaps = Arc::clone(&overlaps);
            tasks.push(tokio::spawn(async move {
                let job = queue.enqueue(|| async {
                    let _running = Running::enter(&running, &overlaps);
                    tokio::time::sleep(Duration::from_micros(200)).await;
                });
                let _ = tokio::time::timeout(Duration::from_micros(100 * (i % 7)), job).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_untouched_queue_publishes_nothing() {
        let queue = RequestQueue::new();
        let len_rx = queue.subscribe_len();
        assert!(!len_rx.has_changed().unwrap());
        assert_eq!(queue.len(), 0);
    }
}
