mod model;

use super::deck::DielecInput;
use super::{ModuleExecutor, ensure_output_dir, write_module_artifact};
use crate::domain::{
    ComputeArtifact, ComputeModule, ComputeRequest, DielecError, DielecResult, ExecutionMode,
};
use crate::parallel::{Communicator, SerialComm};

use model::DielecReport;

/// Frequency-dependent ionic dielectric tensor on the configured grid.
pub struct DielecModule;

impl DielecModule {
    fn run_participant<C: Communicator>(
        input: &DielecInput,
        comm: &C,
    ) -> DielecResult<Option<DielecReport>> {
        let mut dielec = input.dielec();
        dielec.init(comm, &input.bounds)?;
        dielec.run(&input.solver, &input.system)?;
        if comm.is_root() {
            DielecReport::from_dielec(&input.prefix, &dielec).map(Some)
        } else {
            Ok(None)
        }
    }

    #[cfg(feature = "mpi-support")]
    fn run_under_mpi(input: &DielecInput) -> DielecResult<Option<DielecReport>> {
        let session = crate::parallel::MpiSession::initialize()?;
        let comm = session.world();
        tracing::debug!(rank = comm.rank(), size = comm.size(), "joined MPI world");
        Self::run_participant(input, &comm)
    }

    #[cfg(not(feature = "mpi-support"))]
    fn run_under_mpi(_input: &DielecInput) -> DielecResult<Option<DielecReport>> {
        Err(DielecError::configuration(
            "INPUT.MPI_SUPPORT",
            "launched under an MPI launcher, but this build lacks the mpi-support feature",
        ))
    }
}

impl ModuleExecutor for DielecModule {
    fn execute(&self, request: &ComputeRequest) -> DielecResult<Vec<ComputeArtifact>> {
        if request.module != ComputeModule::Dielec {
            return Err(DielecError::configuration(
                "INPUT.DIELEC_MODULE",
                format!("DIELEC module expects DIELEC, got {}", request.module),
            ));
        }

        let input = DielecInput::load(&request.input_path)?;
        if !input.settings.enabled {
            tracing::info!(
                deck = %request.input_path.display(),
                "DIELEC = 0; no dielectric tensor requested"
            );
            return Ok(Vec::new());
        }

        let report = match request.execution_mode {
            ExecutionMode::Serial => Self::run_participant(&input, &SerialComm)?,
            ExecutionMode::Mpi => Self::run_under_mpi(&input)?,
        };
        // Only the root writes.
        let Some(report) = report else {
            return Ok(Vec::new());
        };

        ensure_output_dir(request)?;
        let artifact = ComputeArtifact::new(report.file_name());
        write_module_artifact(
            &request.output_dir.join(&artifact.relative_path),
            &report.render(),
            "IO.DIELEC_OUTPUT_WRITE",
        )?;
        tracing::info!(
            artifact = %artifact.relative_path.display(),
            nomega = report.tensor().nomega(),
            "dielectric tensor written"
        );
        Ok(vec![artifact])
    }
}
