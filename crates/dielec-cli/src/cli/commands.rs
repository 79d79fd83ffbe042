use super::CliError;
use super::dispatch::{ModuleCommandSpec, build_request, module_command_spec};
use super::helpers::ensure_input_deck;
use dielec_core::domain::DielecError;
use dielec_core::modules::execute_module;
use dielec_core::parallel::launched_under_mpi;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct DielecArgs {
    /// Input deck (JSON)
    #[arg(short, long, default_value = "dielec.json")]
    input: PathBuf,

    /// Directory receiving <prefix>.dielec
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ZmodeArgs {
    /// Input deck (JSON)
    #[arg(short, long, default_value = "dielec.json")]
    input: PathBuf,

    /// Directory receiving <prefix>.zmode
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

pub(super) fn run_dielec_command(args: DielecArgs) -> Result<i32, CliError> {
    run_module_command(registered("dielec")?, args.input, args.output_dir)
}

pub(super) fn run_zmode_command(args: ZmodeArgs) -> Result<i32, CliError> {
    run_module_command(registered("zmode")?, args.input, args.output_dir)
}

fn registered(command: &str) -> Result<ModuleCommandSpec, CliError> {
    module_command_spec(command).ok_or_else(|| {
        CliError::Compute(DielecError::internal(
            "SYS.CLI_COMMAND",
            format!("command '{command}' is not registered"),
        ))
    })
}

fn run_module_command(
    spec: ModuleCommandSpec,
    input: PathBuf,
    output_dir: PathBuf,
) -> Result<i32, CliError> {
    let request = build_request(spec, input, output_dir, launched_under_mpi())?;
    ensure_input_deck(&request.input_path)?;

    println!("Running {}...", spec.module);
    tracing::debug!(
        input = %request.input_path.display(),
        mode = request.execution_mode.as_str(),
        "dispatching module request"
    );
    let artifacts = execute_module(&request).map_err(CliError::Compute)?;
    for artifact in &artifacts {
        println!(
            "  wrote {}",
            request.output_dir.join(&artifact.relative_path).display()
        );
    }
    println!(
        "{} completed ({} artifacts).",
        spec.module,
        artifacts.len()
    );
    Ok(0)
}
