use super::CliError;
use dielec_core::domain::{ComputeModule, ComputeRequest, ExecutionMode};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy)]
pub(super) struct ModuleCommandSpec {
    pub(super) command: &'static str,
    pub(super) module: ComputeModule,
    pub(super) supports_mpi: bool,
}

pub(super) const MODULE_COMMANDS: [ModuleCommandSpec; 2] = [
    ModuleCommandSpec {
        command: "dielec",
        module: ComputeModule::Dielec,
        supports_mpi: true,
    },
    ModuleCommandSpec {
        command: "zmode",
        module: ComputeModule::Zmode,
        supports_mpi: false,
    },
];

pub(super) fn module_command_spec(command: &str) -> Option<ModuleCommandSpec> {
    MODULE_COMMANDS
        .iter()
        .copied()
        .find(|spec| spec.command.eq_ignore_ascii_case(command))
}

/// `mpi_launch` is true when the process was started by an MPI launcher.
pub(super) fn build_request(
    spec: ModuleCommandSpec,
    input: PathBuf,
    output_dir: PathBuf,
    mpi_launch: bool,
) -> Result<ComputeRequest, CliError> {
    let execution_mode = match (mpi_launch, spec.supports_mpi) {
        (false, _) => ExecutionMode::Serial,
        (true, true) => ExecutionMode::Mpi,
        (true, false) => {
            return Err(CliError::Usage(format!(
                "'{}' runs on a single process; launch it without mpirun",
                spec.command
            )));
        }
    };

    Ok(ComputeRequest::new(spec.module, input, output_dir).with_execution_mode(execution_mode))
}
