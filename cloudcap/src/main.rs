#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cloudcap::commands::{self, CheckArgs, EstimatesArgs, SmtArgs};

#[derive(Parser, Debug)]
#[command(
    name = "cloudcap",
    version,
    about = "Check usage estimates against the capacity constraints of a CloudFormation template"
)]
struct Cli {
    /// Enable debug logging (`RUST_LOG` takes precedence)
    #[arg(long, short, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decide whether the estimates satisfy the constraints of the infrastructure
    ///
    /// Exit status: 0 PASS, 2 REJECT, 3 UNKNOWN, 1 on any error.
    Check(CheckArgs),
    /// Print the constraint program in SMT-LIB 2 without solving it
    Smt(SmtArgs),
    /// Write a skeleton estimates file for the template
    Estimates(EstimatesArgs),
}

fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    cloudcap::logging::init(cli.debug);

    match cli.cmd {
        Cmd::Check(args) => {
            let outcome = commands::check(&args)?;
            println!("{}", outcome.verdict);
            Ok(ExitCode::from(outcome.verdict.exit_code()))
        }
        Cmd::Smt(args) => {
            print!("{}", commands::smt(&args)?);
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Estimates(args) => {
            commands::estimates(&args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
