mod model;

use super::deck::DielecInput;
use super::{ModuleExecutor, ensure_output_dir, write_module_artifact};
use crate::domain::{
    ComputeArtifact, ComputeModule, ComputeRequest, DielecError, DielecResult, ExecutionMode,
};
use crate::phonon::{GAMMA_POINT, PhononSolver};

use model::ZmodeReport;

/// Mode effective charges of every zone-centre mode, independent of the
/// DIELEC flag.
pub struct ZmodeModule;

impl ModuleExecutor for ZmodeModule {
    fn execute(&self, request: &ComputeRequest) -> DielecResult<Vec<ComputeArtifact>> {
        if request.module != ComputeModule::Zmode {
            return Err(DielecError::configuration(
                "INPUT.ZMODE_MODULE",
                format!("ZMODE module expects ZMODE, got {}", request.module),
            ));
        }
        if request.execution_mode != ExecutionMode::Serial {
            return Err(DielecError::configuration(
                "INPUT.ZMODE_EXECUTION",
                "ZMODE runs on a single participant",
            ));
        }

        let input = DielecInput::load(&request.input_path)?;
        let mut dielec = input.dielec();
        let raw = dielec.mode_effective_charges(false, &input.solver, &input.system)?;
        let normalized = dielec.mode_effective_charges(true, &input.solver, &input.system)?;
        let eigenvalues = input.solver.evaluate(GAMMA_POINT)?.eigenvalues;
        let report = ZmodeReport::new(&input.prefix, &eigenvalues, raw, normalized)?;

        ensure_output_dir(request)?;
        let artifact = ComputeArtifact::new(report.file_name());
        write_module_artifact(
            &request.output_dir.join(&artifact.relative_path),
            &report.render(),
            "IO.ZMODE_OUTPUT_WRITE",
        )?;
        tracing::info!(
            artifact = %artifact.relative_path.display(),
            modes = eigenvalues.len(),
            "mode effective charges written"
        );
        Ok(vec![artifact])
    }
}
