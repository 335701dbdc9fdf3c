//! mpilite library code and entry points.
//!
//! An in-process message-passing runtime. Each participant of a [`World`] is
//! an OS thread with its own rank; participants share nothing but their
//! mailboxes and talk exclusively through the [`communicator::Communicator`]
//! operations.
use std::time::Duration;
use thiserror::Error;

pub mod communicator;
mod context;
pub use context::Context;
pub mod datatype;
mod message;
mod tag;
mod world;
pub use world::World;

#[derive(Debug, Error)]
pub enum Error {
    /// A rank outside of the world was named.
    #[error("invalid rank {rank} (world size {size})")]
    InvalidRank { rank: i32, size: i32 },

    /// A world needs at least one participant.
    #[error("invalid world size {0}")]
    InvalidWorldSize(usize),

    /// The incoming message did not fit in the receive buffer.
    #[error("message of {actual} bytes truncated by a {capacity} byte receive buffer")]
    Truncated { actual: usize, capacity: usize },

    /// Counts or displacements of a variable-count collective are inconsistent.
    #[error("count table mismatch: {0}")]
    CountMismatch(String),

    /// A blocking call waited longer than the configured stall timeout.
    #[error("rank {rank} stalled in {op} after {waited:?}")]
    Stalled {
        rank: i32,
        op: &'static str,
        waited: Duration,
    },

    /// Another participant failed and the world was torn down.
    #[error("rank {rank} aborted because another participant failed")]
    Aborted { rank: i32 },

    /// The participant's closure panicked.
    #[error("rank {rank} panicked: {message}")]
    ParticipantPanicked { rank: i32, message: String },

    /// The participant thread could not be started.
    #[error("failed to spawn participant thread")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
