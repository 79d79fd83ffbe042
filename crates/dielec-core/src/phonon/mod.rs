//! Zone-centre phonon collaborators: eigen-mode container, solver contract,
//! and a Γ-point dynamical-matrix solver built from force constants.

mod dynmat;
mod projection;

pub use dynmat::GammaDynamicalMatrix;
pub use projection::{degenerate_blocks, project_degenerate_modes};

use crate::domain::DielecResult;
use crate::numerics::{DenseComplexMatrix, Vector3};

pub const GAMMA_POINT: Vector3 = [0.0, 0.0, 0.0];

/// Number of translational modes at the zone centre.
pub const ACOUSTIC_MODE_COUNT: usize = 3;

/// Eigen-pairs of the dynamical matrix.
///
/// `eigenvectors[(mode, dof)]` is the mass-weighted amplitude of mode `mode`
/// on degree of freedom `dof = 3 * atom + component`.
#[derive(Debug, Clone)]
pub struct PhononModes {
    pub eigenvalues: Vec<f64>,
    pub eigenvectors: DenseComplexMatrix,
}

impl PhononModes {
    pub fn mode_count(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn dof_count(&self) -> usize {
        self.eigenvectors.ncols()
    }

    pub fn eigenvector_rows(&self) -> Vec<Vec<(f64, f64)>> {
        (0..self.eigenvectors.nrows())
            .map(|mode| {
                (0..self.eigenvectors.ncols())
                    .map(|dof| {
                        let value = self.eigenvectors[(mode, dof)];
                        (value.re, value.im)
                    })
                    .collect()
            })
            .collect()
    }
}

pub trait PhononSolver {
    /// Number of modes (`3 × atoms`).
    fn mode_count(&self) -> usize;

    /// Eigenvalues in ascending order with eigenvectors at `q`.
    fn evaluate(&self, q: Vector3) -> DielecResult<PhononModes>;

    /// Like [`PhononSolver::evaluate`], with every degenerate subspace
    /// rotated so that its leading vectors align with `directions`.
    fn project_degenerate_eigenvectors(
        &self,
        q: Vector3,
        directions: &[Vector3],
    ) -> DielecResult<PhononModes> {
        let modes = self.evaluate(q)?;
        project_degenerate_modes(modes, directions)
    }
}
