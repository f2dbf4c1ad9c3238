use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use tokio::sync::futures::Notified;
use tokio::sync::{mpsc, Notify};

use crate::error::SubmitError;
use crate::types::{Submission, SubmissionId};

/// Create a multi-producer, single-consumer submission queue.
///
/// `max_depth` is a sanity bound, not a backpressure mechanism: the rate
/// ceiling is. Pushing past the bound fails with [`SubmitError::Overloaded`].
pub fn submission_queue<D>(max_depth: Option<usize>) -> (QueueSender<D>, QueueReceiver<D>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        depth: AtomicUsize::new(0),
        next_id: AtomicU64::new(0),
        closed: AtomicBool::new(false),
        notify: Notify::new(),
        max_depth,
    });

    (
        QueueSender {
            tx,
            shared: shared.clone(),
        },
        QueueReceiver {
            rx,
            head: None,
            shared,
        },
    )
}

struct Shared {
    depth: AtomicUsize,
    next_id: AtomicU64,
    closed: AtomicBool,
    notify: Notify,
    max_depth: Option<usize>,
}

/// Producer half. Cheap to clone; never blocks.
pub struct QueueSender<D> {
    tx: mpsc::UnboundedSender<Submission<D>>,
    shared: Arc<Shared>,
}

impl<D> Clone for QueueSender<D> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<D> QueueSender<D> {
    /// Enqueue a submission. FIFO with respect to earlier pushes from the same producer.
    pub fn push(&self, document: D, signature: impl Into<String>) -> Result<SubmissionId, SubmitError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(SubmitError::Closed);
        }

        let previous = self.shared.depth.fetch_add(1, Ordering::AcqRel);
        if let Some(max) = self.shared.max_depth {
            if previous >= max {
                self.shared.depth.fetch_sub(1, Ordering::AcqRel);
                return Err(SubmitError::Overloaded { depth: previous });
            }
        }

        let id = SubmissionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        if self.tx.send(Submission::new(id, document, signature)).is_err() {
            self.shared.depth.fetch_sub(1, Ordering::AcqRel);
            return Err(SubmitError::Closed);
        }

        self.shared.notify.notify_one();
        Ok(id)
    }

    /// Reject every later push. Already queued submissions are untouched.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn depth(&self) -> usize {
        self.shared.depth.load(Ordering::Acquire)
    }
}

/// Consumer half, owned by the dispatcher.
pub struct QueueReceiver<D> {
    rx: mpsc::UnboundedReceiver<Submission<D>>,
    head: Option<Submission<D>>,
    shared: Arc<Shared>,
}

impl<D> QueueReceiver<D> {
    /// Look at the next submission without taking it.
    pub fn peek(&mut self) -> Option<&Submission<D>> {
        if self.head.is_none() {
            self.head = self.rx.try_recv().ok();
        }
        self.head.as_ref()
    }

    /// Take the next submission, if any. Never waits.
    pub fn try_pop(&mut self) -> Option<Submission<D>> {
        self.peek();
        let submission = self.head.take()?;
        self.shared.depth.fetch_sub(1, Ordering::AcqRel);
        Some(submission)
    }

    /// Resolves after a push (or close) following the last wake-up.
    pub fn notified(&self) -> Notified<'_> {
        self.shared.notify.notified()
    }

    pub fn depth(&self) -> usize {
        self.shared.depth.load(Ordering::Acquire)
    }

    /// Close the queue and drop everything still in it. Returns the number discarded.
    pub fn discard(&mut self) -> usize {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.rx.close();

        let mut discarded = 0usize;
        if self.head.take().is_some() {
            discarded += 1;
        }
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        self.shared.depth.fetch_sub(discarded, Ordering::AcqRel);
        discarded
    }
}
