use super::{PhononModes, PhononSolver};
use crate::domain::{DielecError, DielecResult};
use crate::numerics::{DenseComplexMatrix, DenseRealMatrix, Vector3, symmetric_eigen};
use crate::system::SystemGeometry;
use num_complex::Complex64;

const ZONE_CENTRE_EPSILON: f64 = 1.0e-12;

/// Dynamical matrix at Γ assembled from Γ-folded second-order force
/// constants `Φ[(3a+α, 3b+β)]` in Ry/Bohr².
#[derive(Debug, Clone)]
pub struct GammaDynamicalMatrix {
    force_constants: DenseRealMatrix,
    masses_ry: Vec<f64>,
}

impl GammaDynamicalMatrix {
    pub fn new(force_constants: DenseRealMatrix, masses_ry: Vec<f64>) -> DielecResult<Self> {
        let dof = 3 * masses_ry.len();
        if masses_ry.is_empty() {
            return Err(DielecError::configuration(
                "INPUT.FORCE_CONSTANTS",
                "force constants require at least one atom",
            ));
        }
        if force_constants.nrows() != dof || force_constants.ncols() != dof {
            return Err(DielecError::configuration(
                "INPUT.FORCE_CONSTANTS",
                format!(
                    "force-constant matrix must be {dof}x{dof} for {} atoms, got {}x{}",
                    masses_ry.len(),
                    force_constants.nrows(),
                    force_constants.ncols()
                ),
            ));
        }
        if let Some(atom) = masses_ry.iter().position(|mass| !mass.is_finite() || *mass <= 0.0) {
            return Err(DielecError::configuration(
                "INPUT.FORCE_CONSTANTS",
                format!("atom {} has non-positive mass", atom + 1),
            ));
        }

        Ok(Self {
            force_constants,
            masses_ry,
        })
    }

    pub fn from_system(
        system: &dyn SystemGeometry,
        force_constants: DenseRealMatrix,
    ) -> DielecResult<Self> {
        let masses = (0..system.atom_count())
            .map(|atom| system.mass_ry(atom))
            .collect();
        Self::new(force_constants, masses)
    }

    /// Mass-weighted, explicitly symmetrized dynamical matrix.
    fn dynamical_matrix(&self) -> DenseRealMatrix {
        let dof = self.force_constants.nrows();
        let mut matrix = DenseRealMatrix::zeros(dof, dof);
        for row in 0..dof {
            for col in 0..dof {
                let mass_factor =
                    (self.masses_ry[row / 3] * self.masses_ry[col / 3]).sqrt();
                let symmetric =
                    0.5 * (self.force_constants[(row, col)] + self.force_constants[(col, row)]);
                matrix[(row, col)] = symmetric / mass_factor;
            }
        }
        matrix
    }
}

impl PhononSolver for GammaDynamicalMatrix {
    fn mode_count(&self) -> usize {
        self.force_constants.nrows()
    }

    fn evaluate(&self, q: Vector3) -> DielecResult<PhononModes> {
        if q.iter().any(|component| component.abs() > ZONE_CENTRE_EPSILON) {
            return Err(DielecError::numerical(
                "RUN.PHONON_QPOINT",
                format!(
                    "Γ-point force constants cannot be evaluated at q = ({}, {}, {})",
                    q[0], q[1], q[2]
                ),
            ));
        }

        let eigen = symmetric_eigen(&self.dynamical_matrix()).map_err(|error| {
            DielecError::numerical(
                "RUN.PHONON_EIGEN",
                format!("dynamical matrix diagonalization failed: {error}"),
            )
        })?;

        let dof = eigen.dimension();
        let mut eigenvectors = DenseComplexMatrix::zeros(dof, dof);
        for mode in 0..dof {
            for component in 0..dof {
                eigenvectors[(mode, component)] =
                    Complex64::new(eigen.eigenvectors[(component, mode)], 0.0);
            }
        }

        Ok(PhononModes {
            eigenvalues: eigen.eigenvalues,
            eigenvectors,
        })
    }
}
