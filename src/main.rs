use clap::Parser;
use trendscan::cli::{run, Cli};
use trendscan::logging::init_logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
