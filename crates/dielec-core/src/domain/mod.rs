pub mod errors;

pub use errors::{DielecError, DielecErrorCategory, DielecResult};

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    #[default]
    Serial,
    /// One participant of an MPI job launched by `mpirun`.
    Mpi,
}

impl ExecutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Mpi => "mpi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputeModule {
    Dielec,
    Zmode,
}

impl ComputeModule {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dielec => "DIELEC",
            Self::Zmode => "ZMODE",
        }
    }
}

impl Display for ComputeModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeRequest {
    pub module: ComputeModule,
    pub execution_mode: ExecutionMode,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
}

impl ComputeRequest {
    pub fn new(
        module: ComputeModule,
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            module,
            execution_mode: ExecutionMode::Serial,
            input_path: input_path.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_execution_mode(mut self, execution_mode: ExecutionMode) -> Self {
        self.execution_mode = execution_mode;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeArtifact {
    pub relative_path: PathBuf,
}

impl ComputeArtifact {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }
}
