//! Code abstracting out Rust communicators.
use crate::datatype::Datatype;
use crate::Result;

/// Result of a completed receive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Status {
    /// Source process.
    pub source: i32,

    /// Tag the message was sent with.
    pub tag: i32,

    /// Number of elements received.
    pub count: usize,
}

/// Trait implementing blocking p2p and collective communication on top of
/// some lower-level library.
///
/// Every call blocks the calling participant until its part of the
/// operation is complete. Collectives must be entered by every rank of the
/// communicator, in the same order.
pub trait Communicator {
    /// Return the number of processes in this communicator.
    fn size(&self) -> i32;

    /// Return the current rank of the process.
    fn rank(&self) -> i32;

    /// Perform a barrier on the processes.
    fn barrier(&self) -> Result<()>;

    /// Wall-clock time in seconds since an arbitrary epoch shared by all ranks.
    fn wtime(&self) -> f64;

    /// Blocking send of data to the destination with the specified tag.
    fn send<T: Datatype>(&self, data: &[T], dest: i32, tag: i32) -> Result<()>;

    /// Blocking receive of data from the source with the specified tag.
    fn recv<T: Datatype>(&self, data: &mut [T], source: i32, tag: i32) -> Result<Status>;

    /// Replicate `data` from `root` into `data` on every other rank.
    fn broadcast<T: Datatype>(&self, data: &mut [T], root: i32) -> Result<()>;

    /// Variable-count scatter.
    ///
    /// Rank `r` receives `counts[r]` elements of `send` starting at
    /// `displs[r]`. `send` is only read on the root.
    fn scatterv<T: Datatype>(
        &self,
        send: &[T],
        counts: &[usize],
        displs: &[usize],
        recv: &mut [T],
        root: i32,
    ) -> Result<()>;

    /// Variable-count gather.
    ///
    /// The `send` slice of rank `r` lands in `recv` at `displs[r]` on the
    /// root. `recv` is only written on the root.
    fn gatherv<T: Datatype>(
        &self,
        send: &[T],
        recv: &mut [T],
        counts: &[usize],
        displs: &[usize],
        root: i32,
    ) -> Result<()>;
}
