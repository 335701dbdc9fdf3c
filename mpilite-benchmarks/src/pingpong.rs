//! Ring ping-pong benchmark.
//!
//! Every rank passes a message to its successor and takes one from its
//! predecessor, `warmup_reps` times untimed and then `measured_reps` times
//! under the coordinator's clock.
use crate::metrics::{timed, Record};
use crate::report::{Report, ReportKind};
use crate::sweep::sweep;
use crate::{Error, Result, COORDINATOR};
use log::debug;
use mpilite::communicator::Communicator;
use serde::Deserialize;
use std::path::Path;

/// The ring needs a distinct successor and predecessor.
pub const REQUIRED_PARTICIPANTS: i32 = 2;

/// Byte the ring message is filled with.
const FILL: u8 = b'a';

const TAG: i32 = 0;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PingPongOptions {
    pub min_size: usize,
    pub max_size: usize,
    pub warmup_reps: usize,
    pub measured_reps: usize,
}

impl Default for PingPongOptions {
    fn default() -> PingPongOptions {
        PingPongOptions {
            min_size: 1,
            max_size: 1048576,
            warmup_reps: 10,
            measured_reps: 100,
        }
    }
}

impl PingPongOptions {
    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 {
            return Err(Error::InvalidOptions("min_size must be at least 1".to_string()));
        }
        if self.measured_reps == 0 {
            return Err(Error::InvalidOptions(
                "measured_reps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Neighbours of a rank in the logical ring.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ring {
    pub successor: i32,
    pub predecessor: i32,
}

impl Ring {
    pub fn new(rank: i32, size: i32) -> Ring {
        Ring {
            successor: (rank + 1) % size,
            predecessor: (rank - 1 + size) % size,
        }
    }
}

/// Order of the two halves of one exchange.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExchangeOrder {
    /// Send to the successor, then receive from the predecessor.
    SendFirst,

    /// Receive from the predecessor, then send to the successor.
    ReceiveFirst,
}

impl ExchangeOrder {
    /// The coordinator sends first and everybody else receives first.
    ///
    /// At least one rank has to start by receiving: if every rank sends
    /// first, each blocks on a peer that is itself blocked sending.
    pub fn for_rank(rank: i32) -> ExchangeOrder {
        if rank == COORDINATOR {
            ExchangeOrder::SendFirst
        } else {
            ExchangeOrder::ReceiveFirst
        }
    }
}

/// One send to the successor and one receive from the predecessor, both
/// using `message`.
pub fn exchange<C: Communicator>(
    comm: &C,
    ring: Ring,
    order: ExchangeOrder,
    message: &mut [u8],
) -> Result<()> {
    match order {
        ExchangeOrder::SendFirst => {
            comm.send(&message[..], ring.successor, TAG)?;
            comm.recv(&mut message[..], ring.predecessor, TAG)?;
        }
        ExchangeOrder::ReceiveFirst => {
            comm.recv(&mut message[..], ring.predecessor, TAG)?;
            comm.send(&message[..], ring.successor, TAG)?;
        }
    }
    Ok(())
}

/// `reps` consecutive exchanges.
pub fn relay<C: Communicator>(
    comm: &C,
    ring: Ring,
    order: ExchangeOrder,
    message: &mut [u8],
    reps: usize,
) -> Result<()> {
    for _ in 0..reps {
        exchange(comm, ring, order, message)?;
    }
    Ok(())
}

/// Warm up, then time the measured exchanges for one message size.
///
/// Returns the derived record on the coordinator.
pub fn trial<C: Communicator>(
    comm: &C,
    ring: Ring,
    order: ExchangeOrder,
    size: usize,
    opts: &PingPongOptions,
) -> Result<Option<Record>> {
    let mut message = vec![FILL; size];
    relay(comm, ring, order, &mut message, opts.warmup_reps)?;
    let ((), timing) = timed(comm, || {
        relay(comm, ring, order, &mut message, opts.measured_reps)
    })?;

    if comm.rank() != COORDINATOR {
        return Ok(None);
    }
    Ok(Some(Record::derive(
        size,
        size,
        timing.elapsed(),
        opts.measured_reps,
    )))
}

/// Sweep all message sizes, reporting from the coordinator into
/// `output_dir`.
///
/// Fails on every rank with [`Error::InsufficientParticipants`] before any
/// communication when the world is smaller than [`REQUIRED_PARTICIPANTS`].
pub fn run<C: Communicator>(
    comm: &C,
    opts: &PingPongOptions,
    output_dir: &Path,
) -> Result<Vec<Record>> {
    opts.validate()?;
    let size = comm.size();
    if size < REQUIRED_PARTICIPANTS {
        return Err(Error::InsufficientParticipants {
            required: REQUIRED_PARTICIPANTS,
            actual: size,
        });
    }

    let rank = comm.rank();
    let ring = Ring::new(rank, size);
    let order = ExchangeOrder::for_rank(rank);
    let mut report = if rank == COORDINATOR {
        Some(Report::create(output_dir, ReportKind::PingPong, size)?)
    } else {
        None
    };

    let mut records = vec![];
    for message_size in sweep(opts.min_size, opts.max_size) {
        debug!("(rank = {}) message size {}", rank, message_size);
        let record = trial(comm, ring, order, message_size, opts)?;
        if let (Some(report), Some(record)) = (report.as_mut(), record) {
            report.write(&record)?;
            records.push(record);
        }
    }

    if let Some(report) = report {
        report.finish()?;
    }
    Ok(records)
}
