use std::process::ExitCode;

use clap::Parser;

mod commands;

use commands::Command;
use mscan_runtime::logging;

#[derive(Debug, Parser)]
#[command(name = "mscan", version, about = "Medline citation retrieval engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

fn main() -> ExitCode {
    logging::init().ok();

    // Argument problems exit with code 1; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        }
    };

    match cli.command {
        Command::ScoreCalc(args) => commands::score::run(args),
        Command::FeatCount(args) => commands::count::run(args),
        Command::Validate(args) => commands::validate::run(args),
        Command::Index(args) => commands::index::run(args),
    }
}
