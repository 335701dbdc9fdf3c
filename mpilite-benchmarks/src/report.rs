//! Result output: a CSV file plus a mirrored console table.
use crate::metrics::Record;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Which benchmark a report belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReportKind {
    /// Row-partitioned matrix multiplication.
    MatMul,

    /// Ring ping-pong.
    PingPong,
}

impl ReportKind {
    /// Fixed name of the results file.
    pub fn file_name(self) -> &'static str {
        match self {
            ReportKind::MatMul => "mat_mat_results.csv",
            ReportKind::PingPong => "pingpong_results.csv",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ReportKind::MatMul => "Matrix Multiplication Benchmark",
            ReportKind::PingPong => "Pingpong Benchmark (Round-Robin Implementation)",
        }
    }

    fn console_header(self) -> &'static str {
        match self {
            ReportKind::MatMul => {
                "Matrix Size (nxn)\tData Size (bytes)\tLatency (us)\tBandwidth (MiB/s)"
            }
            ReportKind::PingPong => "Message Size (bytes)\tLatency (us)\tBandwidth (MiB/s)",
        }
    }

    /// First line of the results file.
    pub fn csv_header(self) -> &'static str {
        match self {
            ReportKind::MatMul => {
                "Matrix Size (nxn),Data Size (bytes),Latency (us),Bandwidth (MiB/s)"
            }
            // The volume of a ring message is its size, so there is no
            // separate column for it.
            ReportKind::PingPong => "Message Size (bytes),Latency (us),Bandwidth (MiB/s)",
        }
    }

    /// One line of the results file.
    pub fn csv_row(self, record: &Record) -> String {
        match self {
            ReportKind::MatMul => format!(
                "{},{},{:.6},{:.6}",
                record.size, record.data_volume_bytes, record.latency_us, record.bandwidth_mib_s
            ),
            ReportKind::PingPong => format!(
                "{},{:.6},{:.6}",
                record.size, record.latency_us, record.bandwidth_mib_s
            ),
        }
    }

    /// One line of the console table.
    pub fn console_row(self, record: &Record) -> String {
        match self {
            ReportKind::MatMul => format!(
                "{:>8}x{}\t\t{:>17}\t{:>12.2}\t{:>17.2}",
                record.size,
                record.size,
                record.data_volume_bytes,
                record.latency_us,
                record.bandwidth_mib_s
            ),
            ReportKind::PingPong => format!(
                "{:>20}\t{:>12.2}\t{:>17.2}",
                record.size, record.latency_us, record.bandwidth_mib_s
            ),
        }
    }
}

/// Open results file of the coordinator.
pub struct Report {
    kind: ReportKind,
    path: PathBuf,
    csv: BufWriter<File>,
}

impl Report {
    /// Print the banner and create the results file in `dir`.
    pub fn create(dir: &Path, kind: ReportKind, participants: i32) -> Result<Report> {
        println!("{}", kind.title());
        println!("Number of processes: {}", participants);
        println!("{}", kind.console_header());

        let path = dir.join(kind.file_name());
        let file = File::create(&path).map_err(|source| Error::Sink {
            path: path.clone(),
            source,
        })?;
        let mut report = Report {
            kind,
            path,
            csv: BufWriter::new(file),
        };
        report.write_line(kind.csv_header())?;
        Ok(report)
    }

    /// Emit one record to the console and the file.
    pub fn write(&mut self, record: &Record) -> Result<()> {
        println!("{}", self.kind.console_row(record));
        let row = self.kind.csv_row(record);
        self.write_line(&row)
    }

    /// Flush the file and return where it was written.
    pub fn finish(mut self) -> Result<PathBuf> {
        if let Err(source) = self.csv.flush() {
            return Err(self.sink_error(source));
        }
        let path = self.path.canonicalize().unwrap_or(self.path);
        println!("Results saved to {}", path.display());
        Ok(path)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        match writeln!(self.csv, "{}", line) {
            Ok(()) => Ok(()),
            Err(source) => Err(self.sink_error(source)),
        }
    }

    fn sink_error(&self, source: std::io::Error) -> Error {
        Error::Sink {
            path: self.path.clone(),
            source,
        }
    }
}
