use clap::Parser;
use sessiontrader::cli::{run, Cli};
use sessiontrader::logging::init_logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
