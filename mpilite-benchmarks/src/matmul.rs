//! Row-partitioned matrix multiplication benchmark.
//!
//! Per size: the coordinator's source matrix is scattered by rows, the
//! multiplicand is broadcast in full, every rank multiplies its rows and the
//! partial results are gathered back to the coordinator.
use crate::metrics::{timed, Record};
use crate::partition::RowPartition;
use crate::report::{Report, ReportKind};
use crate::sweep::sweep;
use crate::{Error, Result, COORDINATOR};
use log::debug;
use mpilite::communicator::Communicator;
use serde::Deserialize;
use std::mem::size_of;
use std::path::Path;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatMulOptions {
    pub min_size: usize,
    pub max_size: usize,
}

impl Default for MatMulOptions {
    fn default() -> MatMulOptions {
        MatMulOptions {
            min_size: 2,
            max_size: 1024,
        }
    }
}

impl MatMulOptions {
    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 {
            return Err(Error::InvalidOptions("min_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Source matrix, scattered by rows: `S[j][k] = j + k`.
pub fn fill_source(n: usize) -> Vec<f32> {
    (0..n * n).map(|i| (i / n + i % n) as f32).collect()
}

/// Multiplicand, broadcast in full: `M[j][k] = 10 * j + k`.
pub fn fill_multiplicand(n: usize) -> Vec<f32> {
    (0..n * n).map(|i| (10 * (i / n) + i % n) as f32).collect()
}

/// Multiply a block of rows by the full `n` x `n` multiplicand.
///
/// `rows` and `out` hold the same number of row-major rows of length `n`.
pub fn multiply_rows(rows: &[f32], multiplicand: &[f32], n: usize, out: &mut [f32]) {
    debug_assert_eq!(rows.len(), out.len());
    debug_assert_eq!(multiplicand.len(), n * n);
    if n == 0 {
        return;
    }
    for (row, out_row) in rows.chunks_exact(n).zip(out.chunks_exact_mut(n)) {
        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..n {
                sum += row[k] * multiplicand[k * n + j];
            }
            out_row[j] = sum;
        }
    }
}

/// Outcome of one trial; the coordinator is the only rank holding
/// anything.
#[derive(Debug)]
pub struct Trial {
    /// Derived metrics.
    pub record: Option<Record>,

    /// Gathered `n` x `n` product.
    pub product: Option<Vec<f32>>,
}

/// Bytes attributed to the coordinator's own share: its scattered rows,
/// the broadcast multiplicand and its gathered rows.
///
/// This is not the cluster-wide traffic; the convention is kept so results
/// stay comparable with earlier runs.
pub fn data_volume(n: usize, partition: &RowPartition) -> usize {
    let own = partition.counts()[COORDINATOR as usize] * size_of::<f32>();
    own + n * n * size_of::<f32>() + own
}

/// Run one scatter/broadcast/multiply/gather trial of size `n`.
///
/// Every buffer lives for this trial only.
pub fn trial<C: Communicator>(comm: &C, n: usize) -> Result<Trial> {
    let rank = comm.rank();
    let coordinator = rank == COORDINATOR;
    let partition = RowPartition::new(n, n, comm.size() as usize);
    let mine = partition.counts()[rank as usize];

    let (source, mut product, mut multiplicand) = if coordinator {
        (fill_source(n), vec![0.0f32; n * n], fill_multiplicand(n))
    } else {
        (vec![], vec![], vec![0.0f32; n * n])
    };
    let mut source_rows = vec![0.0f32; mine];
    let mut product_rows = vec![0.0f32; mine];

    let ((), timing) = timed(comm, || {
        comm.scatterv(
            &source,
            partition.counts(),
            partition.displs(),
            &mut source_rows,
            COORDINATOR,
        )?;
        comm.broadcast(&mut multiplicand, COORDINATOR)?;
        multiply_rows(&source_rows, &multiplicand, n, &mut product_rows);
        comm.gatherv(
            &product_rows,
            &mut product,
            partition.counts(),
            partition.displs(),
            COORDINATOR,
        )?;
        Ok(())
    })?;

    if !coordinator {
        return Ok(Trial {
            record: None,
            product: None,
        });
    }
    Ok(Trial {
        record: Some(Record::derive(n, data_volume(n, &partition), timing.elapsed(), 1)),
        product: Some(product),
    })
}

/// Sweep all sizes, reporting from the coordinator into `output_dir`.
///
/// Returns the emitted records on the coordinator and nothing elsewhere.
pub fn run<C: Communicator>(
    comm: &C,
    opts: &MatMulOptions,
    output_dir: &Path,
) -> Result<Vec<Record>> {
    opts.validate()?;
    let mut report = if comm.rank() == COORDINATOR {
        Some(Report::create(output_dir, ReportKind::MatMul, comm.size())?)
    } else {
        None
    };

    let mut records = vec![];
    for n in sweep(opts.min_size, opts.max_size) {
        debug!("(rank = {}) matrix size {}", comm.rank(), n);
        let trial = trial(comm, n)?;
        if let (Some(report), Some(record)) = (report.as_mut(), trial.record) {
            report.write(&record)?;
            records.push(record);
        }
    }

    if let Some(report) = report {
        report.finish()?;
    }
    Ok(records)
}
