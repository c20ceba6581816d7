// src/queue.rs
// =============================================================================
// A FIFO work queue with a concurrency limit, pause/resume and dequeue.
//
// Both pools use it: pages in HtmlUrlChecker and links in UrlChecker.
//
// How it works:
// 1. enqueue() pushes an item to the back of a VecDeque and returns its id
// 2. pump() moves items from the front into the active set while there is
//    room and the queue is not paused, spawning one tokio task per item
// 3. when a task finishes, its slot is freed and pump() runs again
// 4. when nothing is pending or active any more, the worker is told the
//    queue has drained. This also happens when dequeue() removes the last
//    waiting item, but only once per batch of enqueued work
//
// Bookkeeping happens under a std Mutex that is never held across an
// .await, so it is always short.
// =============================================================================

use crate::error::CheckerError;
use futures::future::BoxFuture;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifies one enqueued item. Ids increase monotonically per queue.
pub type QueueId = u64;

/// What a queue does with its items.
pub(crate) trait Worker<I>: Send + Sync + 'static {
    /// Processes one item. Runs on its own task; the result is reported by
    /// the worker itself (usually on an event channel).
    fn process(self: Arc<Self>, id: QueueId, item: I) -> BoxFuture<'static, ()>;

    /// Called after the last pending/active item has finished.
    fn drained(&self);
}

struct State<I> {
    next_id: QueueId,
    pending: VecDeque<(QueueId, I)>,
    active: HashSet<QueueId>,
    paused: bool,
    limit: usize,
    // Work was enqueued since the last drained() call
    unreported: bool,
}

struct Shared<I> {
    state: Mutex<State<I>>,
    worker: Arc<dyn Worker<I>>,
}

pub(crate) struct WorkQueue<I> {
    shared: Arc<Shared<I>>,
}

impl<I: Send + 'static> WorkQueue<I> {
    pub fn new(limit: usize, worker: Arc<dyn Worker<I>>) -> Self {
        WorkQueue {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    next_id: 0,
                    pending: VecDeque::new(),
                    active: HashSet::new(),
                    paused: false,
                    limit: limit.max(1),
                    unreported: false,
                }),
                worker,
            }),
        }
    }

    /// Adds an item and returns its id right away.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, item: I) -> QueueId {
        let id = {
            let mut state = self.shared.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.pending.push_back((id, item));
            state.unreported = true;
            id
        };
        self.shared.pump();
        id
    }

    /// Removes an item that has not started yet. Active or finished items
    /// are never interrupted.
    pub fn dequeue(&self, id: QueueId) -> Result<(), CheckerError> {
        {
            let mut state = self.shared.lock();
            let position = state
                .pending
                .iter()
                .position(|(pending_id, _)| *pending_id == id)
                .ok_or(CheckerError::NotFound(id))?;
            state.pending.remove(position);
        }
        self.shared.report_if_drained();
        Ok(())
    }

    pub fn pause(&self) {
        self.shared.lock().paused = true;
    }

    pub fn resume(&self) {
        self.shared.lock().paused = false;
        self.shared.pump();
        self.shared.report_if_drained();
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    pub fn num_active(&self) -> usize {
        self.shared.lock().active.len()
    }

    pub fn num_queued(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Pending plus active items.
    pub fn len(&self) -> usize {
        let state = self.shared.lock();
        state.pending.len() + state.active.len()
    }
}

impl<I: Send + 'static> Shared<I> {
    fn lock(&self) -> MutexGuard<'_, State<I>> {
        // Nothing panics while the lock is held, so a poisoned lock still
        // holds consistent state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn pump(self: &Arc<Self>) {
        let started: Vec<(QueueId, I)> = {
            let mut state = self.lock();
            let mut started = Vec::new();
            while !state.paused && state.active.len() < state.limit {
                let Some((id, item)) = state.pending.pop_front() else {
                    break;
                };
                state.active.insert(id);
                started.push((id, item));
            }
            started
        };

        for (id, item) in started {
            log::trace!("queue item {} started", id);
            let shared = Arc::clone(self);
            let work = Arc::clone(&self.worker).process(id, item);
            tokio::spawn(async move {
                work.await;
                shared.finish(id);
            });
        }
    }

    fn finish(self: &Arc<Self>, id: QueueId) {
        self.lock().active.remove(&id);
        if !self.report_if_drained() {
            self.pump();
        }
    }

    // Tells the worker the queue drained, at most once per batch of work
    fn report_if_drained(&self) -> bool {
        let drained = {
            let mut state = self.lock();
            let drained = state.unreported && state.pending.is_empty() && state.active.is_empty();
            if drained {
                state.unreported = false;
            }
            drained
        };

        if drained {
            self.worker.drained();
        }
        drained
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a VecDeque?
//    - push_back() on enqueue and pop_front() on promotion keeps FIFO order
//    - dequeue() needs removal from the middle, which VecDeque also supports
//
// 2. Why is the work future built before tokio::spawn?
//    - process() takes the item by value; building the future first keeps
//      the spawned task free of any borrow of the queue
//
// 3. Why is drained() only called when the pending list is empty?
//    - a paused queue with items still waiting has not finished, so no
//      end-of-queue event is sent for it
//    - a paused queue whose last item was dequeued has finished, so it is
//      reported right away; resume() then has nothing left to report
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::time::Duration;
    use tokio::sync::mpsc;

    // Sleeps for the item's number of milliseconds, then reports it
    struct Sleeper {
        done: mpsc::UnboundedSender<Option<QueueId>>,
    }

    impl Worker<u64> for Sleeper {
        fn process(self: Arc<Self>, id: QueueId, millis: u64) -> BoxFuture<'static, ()> {
            async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                let _ = self.done.send(Some(id));
            }
            .boxed()
        }

        fn drained(&self) {
            let _ = self.done.send(None);
        }
    }

    fn queue(limit: usize) -> (WorkQueue<u64>, mpsc::UnboundedReceiver<Option<QueueId>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WorkQueue::new(limit, Arc::new(Sleeper { done: tx })), rx)
    }

    #[tokio::test]
    async fn test_fifo_with_single_slot() {
        let (queue, mut rx) = queue(1);
        let ids: Vec<QueueId> = [30, 1, 1].iter().map(|ms| queue.enqueue(*ms)).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(queue.num_active(), 1);
        assert_eq!(queue.num_queued(), 2);

        let mut order = Vec::new();
        while let Some(Some(id)) = rx.recv().await {
            order.push(id);
        }
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_completion_order_with_parallel_slots() {
        let (queue, mut rx) = queue(2);
        queue.enqueue(50);
        queue.enqueue(1);

        assert_eq!(rx.recv().await, Some(Some(1)));
        assert_eq!(rx.recv().await, Some(Some(0)));
        assert_eq!(rx.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_pause_and_dequeue() {
        let (queue, mut rx) = queue(2);
        queue.pause();
        let first = queue.enqueue(1);
        let second = queue.enqueue(1);
        assert_eq!(queue.num_active(), 0);
        assert_eq!(queue.len(), 2);

        queue.dequeue(first).unwrap();
        assert_eq!(queue.len(), 1);
        assert!(matches!(queue.dequeue(first), Err(CheckerError::NotFound(_))));
        assert!(matches!(queue.dequeue(99), Err(CheckerError::NotFound(99))));

        queue.resume();
        assert_eq!(rx.recv().await, Some(Some(second)));
        assert_eq!(rx.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_dequeue_last_item_reports_drained_once() {
        let (queue, mut rx) = queue(1);
        queue.pause();
        let id = queue.enqueue(1);
        queue.dequeue(id).unwrap();
        assert_eq!(queue.len(), 0);
        assert_eq!(rx.recv().await, Some(None));

        queue.resume();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());

        // A new batch gets its own report
        let id = queue.enqueue(1);
        assert_eq!(rx.recv().await, Some(Some(id)));
        assert_eq!(rx.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_resume_without_work_reports_nothing() {
        let (queue, mut rx) = queue(1);
        queue.pause();
        queue.resume();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_active_items_cannot_be_dequeued() {
        let (queue, mut rx) = queue(1);
        let id = queue.enqueue(10);
        assert!(queue.dequeue(id).is_err());
        assert_eq!(rx.recv().await, Some(Some(id)));
    }

    #[tokio::test]
    async fn test_pause_lets_active_work_finish() {
        let (queue, mut rx) = queue(1);
        let first = queue.enqueue(10);
        queue.enqueue(1);
        queue.pause();

        assert_eq!(rx.recv().await, Some(Some(first)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(queue.num_queued(), 1);
        assert!(rx.try_recv().is_err());

        queue.resume();
        assert_eq!(rx.recv().await, Some(Some(1)));
        assert_eq!(rx.recv().await, Some(None));
    }
}
