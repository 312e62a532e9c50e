use clap::Parser;
use folioval::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
