//! Context handle code for an mpilite participant.
use crate::{
    communicator::{Communicator, Status},
    datatype::Datatype,
    message::{lock, Completion, Deadline, Envelope, Mailbox},
    tag::{decode_tag, encode_tag, BARRIER_TAG, BCAST_TAG, GATHER_TAG, SCATTER_TAG, USER_TAG},
    Error, Result,
};
use log::{error, trace};
use std::mem::size_of;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// State shared by every participant of a world.
pub(crate) struct Shared {
    /// One incoming queue per rank.
    pub mailboxes: Vec<Mailbox>,

    /// Common origin of `wtime()`.
    pub epoch: Instant,

    /// Maximum time any blocking call may wait.
    pub stall_timeout: Option<Duration>,

    /// Set once any participant fails.
    pub aborted: AtomicBool,

    /// Rank whose failure triggered the abort.
    pub first_failure: Mutex<Option<i32>>,
}

impl Shared {
    pub(crate) fn new(size: usize, stall_timeout: Option<Duration>) -> Shared {
        Shared {
            mailboxes: (0..size).map(|_| Mailbox::new()).collect(),
            epoch: Instant::now(),
            stall_timeout,
            aborted: AtomicBool::new(false),
            first_failure: Mutex::new(None),
        }
    }

    /// Mark the world as failed and release every blocked participant.
    pub(crate) fn abort(&self, rank: i32) {
        {
            let mut first = lock(&self.first_failure);
            if first.is_none() {
                error!("(rank = {}) participant failed, aborting world", rank);
                *first = Some(rank);
            }
        }
        if !self.aborted.swap(true, Ordering::AcqRel) {
            for mailbox in &self.mailboxes {
                mailbox.wake();
            }
        }
    }

    pub(crate) fn first_failure(&self) -> Option<i32> {
        *lock(&self.first_failure)
    }
}

/// Context handle.
///
/// This implements Communicator and acts as the world communicator of one
/// participant. It is handed to the participant's closure by [`crate::World::run`].
pub struct Context {
    rank: i32,
    shared: Arc<Shared>,
}

impl Context {
    /// Create a new context.
    pub(crate) fn new(rank: i32, shared: Arc<Shared>) -> Context {
        Context { rank, shared }
    }

    fn deadline(&self, op: &'static str) -> Deadline<'_> {
        Deadline::new(self.rank, op, self.shared.stall_timeout, &self.shared.aborted)
    }

    fn check_rank(&self, rank: i32) -> Result<()> {
        if rank < 0 || rank >= self.size() {
            Err(Error::InvalidRank {
                rank,
                size: self.size(),
            })
        } else {
            Ok(())
        }
    }

    /// Check a counts/displacements table against the communicator size and
    /// the length of the buffer it indexes.
    fn check_table(&self, counts: &[usize], displs: &[usize], len: usize) -> Result<()> {
        let size = self.size() as usize;
        if counts.len() != size || displs.len() != size {
            return Err(Error::CountMismatch(format!(
                "{} counts and {} displacements for {} ranks",
                counts.len(),
                displs.len(),
                size
            )));
        }
        for (rank, (count, displ)) in counts.iter().zip(displs).enumerate() {
            if displ + count > len {
                return Err(Error::CountMismatch(format!(
                    "rank {} spans [{}, {}) of a {} element buffer",
                    rank,
                    displ,
                    displ + count,
                    len
                )));
            }
        }
        Ok(())
    }

    /// Synchronous send: returns once the destination has taken the message.
    fn internal_send(&self, data: &[u8], dest: i32, tag: u64, op: &'static str) -> Result<()> {
        self.check_rank(dest)?;
        let (class, user_tag) = decode_tag(tag);
        trace!(
            "(rank = {}) {}: {} bytes to {} (class {}, tag {})",
            self.rank,
            op,
            data.len(),
            dest,
            class,
            user_tag
        );

        let delivered = Completion::new();
        self.shared.mailboxes[dest as usize].post(Envelope {
            source: self.rank,
            tag,
            payload: data.to_vec(),
            delivered: Arc::clone(&delivered),
        });
        delivered.wait(&self.deadline(op))
    }

    /// Blocking receive, returning the number of bytes written.
    fn internal_recv(
        &self,
        data: &mut [u8],
        source: i32,
        tag: u64,
        op: &'static str,
    ) -> Result<usize> {
        self.check_rank(source)?;
        let envelope =
            self.shared.mailboxes[self.rank as usize].take(source, tag, &self.deadline(op))?;
        let len = envelope.payload.len();
        // The sender is released either way; a truncated message is the
        // receiver's error.
        envelope.delivered.complete();
        if len > data.len() {
            return Err(Error::Truncated {
                actual: len,
                capacity: data.len(),
            });
        }
        data[..len].copy_from_slice(&envelope.payload);
        trace!("(rank = {}) {}: {} bytes from {}", self.rank, op, len, source);
        Ok(len)
    }
}

impl Communicator for Context {
    fn size(&self) -> i32 {
        self.shared.mailboxes.len() as i32
    }

    fn rank(&self) -> i32 {
        self.rank
    }

    /// Barrier operation on all processes.
    ///
    /// Uses a simple O(n) algorithm.
    fn barrier(&self) -> Result<()> {
        let size = self.size();
        let tag = encode_tag(BARRIER_TAG, 0);
        let mut buf = [0u8; 1];
        if self.rank == 0 {
            for i in 1..size {
                self.internal_send(&buf, i, tag, "barrier")?;
            }
            for i in 1..size {
                self.internal_recv(&mut buf, i, tag, "barrier")?;
            }
        } else {
            self.internal_recv(&mut buf, 0, tag, "barrier")?;
            self.internal_send(&buf, 0, tag, "barrier")?;
        }
        Ok(())
    }

    fn wtime(&self) -> f64 {
        self.shared.epoch.elapsed().as_secs_f64()
    }

    fn send<T: Datatype>(&self, data: &[T], dest: i32, tag: i32) -> Result<()> {
        self.internal_send(T::as_bytes(data), dest, encode_tag(USER_TAG, tag), "send")
    }

    fn recv<T: Datatype>(&self, data: &mut [T], source: i32, tag: i32) -> Result<Status> {
        let len = self.internal_recv(
            T::as_bytes_mut(data),
            source,
            encode_tag(USER_TAG, tag),
            "recv",
        )?;
        Ok(Status {
            source,
            tag,
            count: len / size_of::<T>(),
        })
    }

    /// Binomial tree broadcast.
    fn broadcast<T: Datatype>(&self, data: &mut [T], root: i32) -> Result<()> {
        self.check_rank(root)?;
        let size = self.size();
        let tag = encode_tag(BCAST_TAG, 0);
        let relative = (self.rank - root + size) % size;

        // Receive from the parent, which differs from us in the lowest set bit.
        let mut mask = 1;
        while mask < size {
            if relative & mask != 0 {
                let parent = (relative - mask + root) % size;
                self.internal_recv(T::as_bytes_mut(data), parent, tag, "broadcast")?;
                break;
            }
            mask <<= 1;
        }

        // Forward to the children below that bit.
        mask >>= 1;
        while mask > 0 {
            if relative + mask < size {
                let child = (relative + mask + root) % size;
                self.internal_send(T::as_bytes(data), child, tag, "broadcast")?;
            }
            mask >>= 1;
        }
        Ok(())
    }

    fn scatterv<T: Datatype>(
        &self,
        send: &[T],
        counts: &[usize],
        displs: &[usize],
        recv: &mut [T],
        root: i32,
    ) -> Result<()> {
        self.check_rank(root)?;
        let tag = encode_tag(SCATTER_TAG, 0);
        let size = self.size() as usize;
        if counts.len() != size {
            return Err(Error::CountMismatch(format!(
                "{} counts for {} ranks",
                counts.len(),
                size
            )));
        }
        let rank = self.rank as usize;
        let mine = counts[rank];
        if recv.len() < mine {
            return Err(Error::Truncated {
                actual: mine * size_of::<T>(),
                capacity: recv.len() * size_of::<T>(),
            });
        }

        if self.rank == root {
            self.check_table(counts, displs, send.len())?;
            for (r, (&count, &displ)) in counts.iter().zip(displs).enumerate() {
                let chunk = &send[displ..displ + count];
                if r == rank {
                    recv[..count].copy_from_slice(chunk);
                } else {
                    self.internal_send(T::as_bytes(chunk), r as i32, tag, "scatterv")?;
                }
            }
        } else {
            self.internal_recv(T::as_bytes_mut(&mut recv[..mine]), root, tag, "scatterv")?;
        }
        Ok(())
    }

    fn gatherv<T: Datatype>(
        &self,
        send: &[T],
        recv: &mut [T],
        counts: &[usize],
        displs: &[usize],
        root: i32,
    ) -> Result<()> {
        self.check_rank(root)?;
        let tag = encode_tag(GATHER_TAG, 0);
        let size = self.size() as usize;
        if counts.len() != size {
            return Err(Error::CountMismatch(format!(
                "{} counts for {} ranks",
                counts.len(),
                size
            )));
        }
        let rank = self.rank as usize;
        if send.len() != counts[rank] {
            return Err(Error::CountMismatch(format!(
                "rank {} sends {} elements but {} are expected",
                rank,
                send.len(),
                counts[rank]
            )));
        }

        if self.rank == root {
            self.check_table(counts, displs, recv.len())?;
            for (r, (&count, &displ)) in counts.iter().zip(displs).enumerate() {
                let slot = &mut recv[displ..displ + count];
                if r == rank {
                    slot.copy_from_slice(send);
                } else {
                    self.internal_recv(T::as_bytes_mut(slot), r as i32, tag, "gatherv")?;
                }
            }
        } else {
            self.internal_send(T::as_bytes(send), root, tag, "gatherv")?;
        }
        Ok(())
    }
}
