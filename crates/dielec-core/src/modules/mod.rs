pub mod deck;
pub mod dielec;
pub mod serialization;
pub mod zmode;

mod traits;

pub use deck::{DielecDeck, DielecInput};
pub use dielec::DielecModule;
pub use traits::ModuleExecutor;
pub use zmode::ZmodeModule;

use crate::domain::{ComputeArtifact, ComputeModule, ComputeRequest, DielecError, DielecResult};
use serialization::write_text_artifact;
use std::fs;
use std::path::Path;

pub fn execute_module(request: &ComputeRequest) -> DielecResult<Vec<ComputeArtifact>> {
    let _span = tracing::info_span!("module", module = %request.module).entered();
    match request.module {
        ComputeModule::Dielec => DielecModule.execute(request),
        ComputeModule::Zmode => ZmodeModule.execute(request),
    }
}

pub(crate) fn ensure_output_dir(request: &ComputeRequest) -> DielecResult<()> {
    fs::create_dir_all(&request.output_dir).map_err(|source| {
        DielecError::io(
            "IO.OUTPUT_DIRECTORY",
            format!(
                "failed to create {} output directory '{}': {}",
                request.module,
                request.output_dir.display(),
                source
            ),
        )
    })
}

pub(crate) fn write_module_artifact(
    output_path: &Path,
    contents: &str,
    placeholder: &'static str,
) -> DielecResult<()> {
    write_text_artifact(output_path, contents).map_err(|source| {
        DielecError::io(
            placeholder,
            format!(
                "failed to write artifact '{}': {}",
                output_path.display(),
                source
            ),
        )
    })
}
