use clap::Parser;
use mpilite::World;
use mpilite_benchmarks::{pingpong, BenchmarkArgs, PingPongOptions};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let args = BenchmarkArgs::parse();
    let options_path = args.options_path.as_deref();
    let opts: PingPongOptions = match mpilite_benchmarks::options_or_default(options_path) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let output_dir = args.output_dir.as_deref().unwrap_or(Path::new("."));

    match World::new(args.ranks).run(|ctx| pingpong::run(&ctx, &opts, output_dir)) {
        Ok(_) => ExitCode::SUCCESS,
        // Not running at all is a clean exit.
        Err(err) if err.is_precondition() => {
            println!("{}", err);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
