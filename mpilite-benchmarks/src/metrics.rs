//! Timing and derived metrics.
use crate::Result;
use mpilite::communicator::Communicator;

const MIB: f64 = 1024.0 * 1024.0;

/// Wall-clock readings around a measured region, in seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Timing {
    pub start: f64,
    pub end: f64,
}

impl Timing {
    /// Elapsed seconds.
    pub fn elapsed(&self) -> f64 {
        self.end - self.start
    }
}

/// Synchronize all ranks, then time `body` with the communicator's clock.
pub fn timed<C, F, R>(comm: &C, body: F) -> Result<(R, Timing)>
where
    C: Communicator,
    F: FnOnce() -> Result<R>,
{
    comm.barrier()?;
    let start = comm.wtime();
    let out = body()?;
    let end = comm.wtime();
    Ok((out, Timing { start, end }))
}

/// Per-repetition latency in microseconds.
pub fn latency_us(elapsed: f64, reps: usize) -> f64 {
    elapsed * 1.0e6 / reps as f64
}

/// Bandwidth in MiB/s for `bytes` moved in `elapsed` seconds.
pub fn bandwidth_mib_s(bytes: usize, elapsed: f64) -> f64 {
    bytes as f64 / MIB / elapsed
}

/// One result row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Record {
    /// Matrix dimension or message length.
    pub size: usize,

    /// Bytes attributed to one repetition.
    pub data_volume_bytes: usize,

    /// Microseconds per repetition.
    pub latency_us: f64,

    /// MiB/s over one repetition.
    pub bandwidth_mib_s: f64,
}

impl Record {
    /// Derive a record from a region of `reps` repetitions that took
    /// `elapsed` seconds in total.
    pub fn derive(size: usize, data_volume_bytes: usize, elapsed: f64, reps: usize) -> Record {
        let latency_us = latency_us(elapsed, reps);
        Record {
            size,
            data_volume_bytes,
            latency_us,
            bandwidth_mib_s: bandwidth_mib_s(data_volume_bytes, latency_us / 1.0e6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn one_mib_in_a_millisecond() {
        assert_relative_eq!(bandwidth_mib_s(1048576, 0.001), 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn latency_is_split_across_repetitions() {
        assert_relative_eq!(latency_us(0.001, 100), 10.0, max_relative = 1e-12);
        assert_relative_eq!(latency_us(0.001, 1), 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn single_trial_record() {
        let record = Record::derive(8, 1048576, 0.001, 1);
        assert_relative_eq!(record.latency_us, 1000.0, max_relative = 1e-12);
        assert_relative_eq!(record.bandwidth_mib_s, 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn repeated_record_uses_per_iteration_time() {
        // 100 reps of 1 MiB in 0.1 s: 1 ms each.
        let record = Record::derive(1048576, 1048576, 0.1, 100);
        assert_relative_eq!(record.latency_us, 1000.0, max_relative = 1e-12);
        assert_relative_eq!(record.bandwidth_mib_s, 1000.0, max_relative = 1e-9);
    }

    #[test]
    fn elapsed_is_end_minus_start() {
        let timing = Timing {
            start: 1.25,
            end: 1.5,
        };
        assert_relative_eq!(timing.elapsed(), 0.25);
    }
}
