use clap::Parser;
use mpilite::communicator::Communicator;
use mpilite_benchmarks::rsmpi::RsmpiComm;
use mpilite_benchmarks::{matmul, MatMulOptions, RsmpiArgs};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let args = RsmpiArgs::parse();
    let options_path = args.options_path.as_deref();
    let opts: MatMulOptions = match mpilite_benchmarks::options_or_default(options_path) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let output_dir = args.output_dir.as_deref().unwrap_or(Path::new("."));

    let Some(universe) = mpi::initialize() else {
        eprintln!("failed to initialize rsmpi");
        return ExitCode::FAILURE;
    };
    let comm = RsmpiComm::new(universe.world());
    // Finalized when the universe drops; fatal errors abort the whole job.
    match matmul::run(&comm, &opts, output_dir) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("(rank = {}) {}", comm.rank(), err);
            comm.abort(1)
        }
    }
}
