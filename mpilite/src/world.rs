//! Bootstrap and teardown of a group of participants.
use crate::context::{Context, Shared};
use crate::Error;
use log::{debug, info};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A fixed set of participants, each running on its own thread.
#[derive(Clone, Debug)]
pub struct World {
    size: usize,
    stall_timeout: Option<Duration>,
}

impl World {
    /// Describe a world of `size` participants.
    pub fn new(size: usize) -> World {
        World {
            size,
            stall_timeout: None,
        }
    }

    /// Fail any blocking call that waits longer than `timeout` with
    /// [`Error::Stalled`] instead of blocking forever.
    pub fn stall_timeout(mut self, timeout: Duration) -> World {
        self.stall_timeout = Some(timeout);
        self
    }

    /// Number of participants.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `f` once per rank and return the per-rank results in rank order.
    ///
    /// If any participant returns an error or panics, the remaining
    /// participants are released from their blocking calls with
    /// [`Error::Aborted`] and the error of the participant that failed first
    /// is returned.
    pub fn run<F, R, E>(&self, f: F) -> Result<Vec<R>, E>
    where
        F: Fn(Context) -> Result<R, E> + Sync,
        R: Send,
        E: From<Error> + Send,
    {
        if self.size == 0 || self.size > i32::MAX as usize {
            return Err(Error::InvalidWorldSize(self.size).into());
        }
        info!("bootstrapping world of {} participants", self.size);
        let shared = Arc::new(Shared::new(self.size, self.stall_timeout));

        let (outcomes, spawn_error) = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.size);
            let mut spawn_error = None;
            for rank in 0..self.size as i32 {
                let ctx = Context::new(rank, Arc::clone(&shared));
                let peer_shared = Arc::clone(&shared);
                let f = &f;
                let spawned = thread::Builder::new()
                    .name(format!("rank-{}", rank))
                    .spawn_scoped(scope, move || {
                        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| f(ctx))) {
                            Ok(outcome) => outcome,
                            Err(payload) => Err(Error::ParticipantPanicked {
                                rank,
                                message: panic_message(&*payload),
                            }
                            .into()),
                        };
                        if outcome.is_err() {
                            peer_shared.abort(rank);
                        }
                        outcome
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        // Release the ranks already running; they would wait
                        // forever for the missing peer.
                        shared.abort(rank);
                        spawn_error = Some(err);
                        break;
                    }
                }
            }

            let outcomes: Vec<Result<R, E>> = handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle.join().unwrap_or_else(|payload| {
                        Err(Error::ParticipantPanicked {
                            rank: rank as i32,
                            message: panic_message(&*payload),
                        }
                        .into())
                    })
                })
                .collect();
            (outcomes, spawn_error)
        });

        info!("tearing down world of {} participants", self.size);
        if let Some(err) = spawn_error {
            return Err(Error::Spawn(err).into());
        }
        if let Some(rank) = shared.first_failure() {
            debug!("world failed first on rank {}", rank);
            return match outcomes.into_iter().nth(rank as usize) {
                Some(Err(err)) => Err(err),
                _ => Err(Error::Aborted { rank }.into()),
            };
        }
        outcomes.into_iter().collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
