//! Mailboxes and in-flight messages.
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Upper bound on a single condvar sleep, so aborts are noticed by waiters
/// that nobody notifies.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Lock a mutex, ignoring poisoning from a panicked participant.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bookkeeping for one blocking call.
pub(crate) struct Deadline<'a> {
    rank: i32,
    op: &'static str,
    started: Instant,
    timeout: Option<Duration>,
    aborted: &'a AtomicBool,
}

impl<'a> Deadline<'a> {
    pub(crate) fn new(
        rank: i32,
        op: &'static str,
        timeout: Option<Duration>,
        aborted: &'a AtomicBool,
    ) -> Deadline<'a> {
        Deadline {
            rank,
            op,
            started: Instant::now(),
            timeout,
            aborted,
        }
    }

    /// Sleep on the condvar once, failing if the world was aborted or the
    /// stall timeout ran out.
    pub(crate) fn wait<'g, T>(
        &self,
        cond: &Condvar,
        guard: MutexGuard<'g, T>,
    ) -> Result<MutexGuard<'g, T>> {
        if self.aborted.load(Ordering::Acquire) {
            return Err(Error::Aborted { rank: self.rank });
        }
        let slice = match self.timeout {
            Some(timeout) => {
                let waited = self.started.elapsed();
                if waited >= timeout {
                    return Err(Error::Stalled {
                        rank: self.rank,
                        op: self.op,
                        waited,
                    });
                }
                (timeout - waited).min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };
        let (guard, _) = cond
            .wait_timeout(guard, slice)
            .unwrap_or_else(PoisonError::into_inner);
        Ok(guard)
    }
}

/// Delivery flag the sender blocks on until the receiver has taken the data.
pub(crate) struct Completion {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    pub(crate) fn new() -> Arc<Completion> {
        Arc::new(Completion {
            done: Mutex::new(false),
            cond: Condvar::new(),
        })
    }

    pub(crate) fn complete(&self) {
        *lock(&self.done) = true;
        self.cond.notify_all();
    }

    pub(crate) fn wait(&self, deadline: &Deadline) -> Result<()> {
        let mut done = lock(&self.done);
        while !*done {
            done = deadline.wait(&self.cond, done)?;
        }
        Ok(())
    }
}

/// A message posted to a mailbox.
pub(crate) struct Envelope {
    pub source: i32,
    pub tag: u64,
    pub payload: Vec<u8>,
    pub delivered: Arc<Completion>,
}

/// Incoming message queue of one rank.
pub(crate) struct Mailbox {
    queue: Mutex<VecDeque<Envelope>>,
    arrived: Condvar,
}

impl Mailbox {
    pub(crate) fn new() -> Mailbox {
        Mailbox {
            queue: Mutex::new(VecDeque::new()),
            arrived: Condvar::new(),
        }
    }

    pub(crate) fn post(&self, envelope: Envelope) {
        lock(&self.queue).push_back(envelope);
        self.arrived.notify_all();
    }

    /// Take the oldest message from `source` carrying `tag`, blocking until
    /// one arrives.
    pub(crate) fn take(&self, source: i32, tag: u64, deadline: &Deadline) -> Result<Envelope> {
        let mut queue = lock(&self.queue);
        loop {
            let found = queue
                .iter()
                .position(|e| e.source == source && e.tag == tag)
                .and_then(|pos| queue.remove(pos));
            if let Some(envelope) = found {
                return Ok(envelope);
            }
            queue = deadline.wait(&self.arrived, queue)?;
        }
    }

    /// Wake every waiter so it can observe an abort.
    pub(crate) fn wake(&self) {
        let _queue = lock(&self.queue);
        self.arrived.notify_all();
    }
}
