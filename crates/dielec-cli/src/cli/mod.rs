mod commands;
mod dispatch;
mod helpers;

use clap::Parser;
use dielec_core::domain::DielecError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let fatal = error.as_dielec_error();
            eprintln!("{}", fatal.diagnostic_line());
            eprintln!("{}", fatal.fatal_exit_line());
            fatal.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("dielec-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "dielec-rs",
    version,
    about = "Zone-centre phonon dielectric tensor and mode effective charges"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compute the frequency-dependent ionic dielectric tensor
    Dielec(commands::DielecArgs),
    /// Compute mode effective charges of the zone-centre modes
    Zmode(commands::ZmodeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Dielec(args) => commands::run_dielec_command(args),
        CliCommand::Zmode(args) => commands::run_zmode_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(DielecError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_dielec_error(&self) -> DielecError {
        match self {
            Self::Usage(message) => {
                DielecError::configuration("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => DielecError::io("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};
    use dielec_core::domain::DielecError;

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let error = run(["dielec", "--input", "dielec.json", "--processes", "4"])
            .expect_err("participants come from mpirun");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.as_dielec_error().exit_code(), 2);
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["phonons"]).expect_err("unknown command");
        assert_eq!(error.as_dielec_error().placeholder(), "INPUT.CLI_USAGE");
    }

    #[test]
    fn compute_errors_keep_their_placeholder() {
        let error = CliError::Compute(DielecError::numerical("RUN.PHONON_EIGEN", "failed"));
        assert_eq!(error.as_dielec_error().placeholder(), "RUN.PHONON_EIGEN");
        assert_eq!(error.as_dielec_error().exit_code(), 4);

        let error = CliError::from(anyhow::anyhow!("disk full"));
        assert_eq!(error.as_dielec_error().placeholder(), "IO.CLI");
    }
}
