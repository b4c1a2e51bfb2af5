//! Deferred mutations posted from any thread, run on the UI thread.
//!
//! Worker threads block while the queue is full, which throttles them to
//! the pace of the UI. The UI thread itself cannot wait on its own queue,
//! so its posts spill into an unbounded overflow list once the channel is
//! full; the surface drains that list after the channel.

use super::Surface;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::trace;

/// A unit of deferred work against the surface and the application context.
pub type Task<C> = Box<dyn FnOnce(&mut Surface<C>, &mut C) -> Result<()> + Send>;

struct Shared<C> {
    ui_thread: ThreadId,
    overflow: Mutex<VecDeque<Task<C>>>,
}

impl<C> Shared<C> {
    fn overflow(&self) -> MutexGuard<'_, VecDeque<Task<C>>> {
        self.overflow.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable, thread-safe handle for posting [`Task`]s.
///
/// Background workers never touch panels directly; they post a closure that
/// the main loop runs between input events.
pub struct Updater<C> {
    tx: Sender<Task<C>>,
    shared: Arc<Shared<C>>,
}

impl<C> Clone for Updater<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C> std::fmt::Debug for Updater<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("pending", &self.pending())
            .finish()
    }
}

impl<C> Updater<C> {
    /// Queue a mutation.
    ///
    /// From a worker thread this blocks while the queue is full. From the
    /// UI thread it never blocks: tasks that do not fit wait in the overflow
    /// list and run after the queued ones, in posting order.
    pub fn post<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce(&mut Surface<C>, &mut C) -> Result<()> + Send + 'static,
    {
        let task: Task<C> = Box::new(task);
        if thread::current().id() != self.shared.ui_thread {
            return self.tx.send(task).map_err(|_| Error::QueueClosed);
        }

        let mut overflow = self.shared.overflow();
        if !overflow.is_empty() {
            overflow.push_back(task);
            return Ok(());
        }
        match self.tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(task)) => {
                trace!(capacity = ?self.tx.capacity(), "update queue full, deferring");
                overflow.push_back(task);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::QueueClosed),
        }
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.tx.len() + self.shared.overflow().len()
    }

    pub(crate) fn has_overflow(&self) -> bool {
        !self.shared.overflow().is_empty()
    }

    /// Next task the UI thread deferred because the queue was full.
    pub(crate) fn take_overflow(&self) -> Option<Task<C>> {
        self.shared.overflow().pop_front()
    }
}

/// Create the queue; the calling thread becomes the UI thread.
pub(crate) fn channel<C>(capacity: usize) -> (Updater<C>, Receiver<Task<C>>) {
    let (tx, rx) = bounded(capacity.max(1));
    let shared = Arc::new(Shared {
        ui_thread: thread::current().id(),
        overflow: Mutex::new(VecDeque::new()),
    });
    (Updater { tx, shared }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<u32>;

    fn push(n: u32) -> impl FnOnce(&mut Surface<Log>, &mut Log) -> Result<()> + Send {
        move |_, log| {
            log.push(n);
            Ok(())
        }
    }

    #[test]
    fn test_ui_thread_post_on_full_queue_defers() {
        let (updater, rx) = channel::<Log>(1);
        for n in 0..4 {
            updater.post(push(n)).unwrap();
        }
        assert_eq!(rx.len(), 1);
        assert_eq!(updater.pending(), 4);
        assert!(updater.has_overflow());

        // Later posts queue behind the deferred ones even after room frees up
        drop(rx.try_recv().unwrap());
        updater.post(push(4)).unwrap();
        assert_eq!(rx.len(), 0);
        assert_eq!(updater.pending(), 4);
    }

    #[test]
    fn test_take_overflow_is_fifo() {
        let (updater, _rx) = channel::<Log>(1);
        for n in 0..3 {
            updater.post(push(n)).unwrap();
        }

        let mut surface = Surface::new(10, 1);
        let mut log = Log::new();
        while let Some(task) = updater.take_overflow() {
            task(&mut surface, &mut log).unwrap();
        }
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn test_worker_post_after_close_fails() {
        let (updater, rx) = channel::<Log>(1);
        drop(rx);
        let result = thread::spawn(move || updater.post(push(0))).join().unwrap();
        assert!(matches!(result, Err(Error::QueueClosed)));
    }
}
