use super::DenseRealMatrix;
use faer::Side;

const SYMMETRY_EPSILON: f64 = 1.0e-10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EigenError {
    #[error("eigen decomposition requires a square matrix, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("eigen decomposition requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix element ({row}, {col}) is not finite")]
    NonFiniteElement { row: usize, col: usize },
    #[error("matrix is not symmetric at ({row}, {col}): |a_ij - a_ji| = {deviation:e}")]
    NotSymmetric {
        row: usize,
        col: usize,
        deviation: f64,
    },
    #[error("self-adjoint eigensolver did not converge for a {dimension}x{dimension} matrix")]
    NotConverged { dimension: usize },
}

/// Eigen-pairs of a real symmetric matrix, eigenvalues ascending.
/// Column `n` of `eigenvectors` belongs to `eigenvalues[n]`.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    pub eigenvalues: Vec<f64>,
    pub eigenvectors: DenseRealMatrix,
}

impl SymmetricEigen {
    pub fn dimension(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn eigenvector(&self, index: usize) -> Vec<f64> {
        (0..self.dimension())
            .map(|row| self.eigenvectors[(row, index)])
            .collect()
    }
}

/// Diagonalizes a real symmetric matrix with faer's self-adjoint solver.
///
/// The input is checked for shape, finiteness and symmetry first; faer only
/// reads the lower triangle and would silently accept an asymmetric matrix.
pub fn symmetric_eigen(matrix: &DenseRealMatrix) -> Result<SymmetricEigen, EigenError> {
    let dimension = validate_symmetric(matrix)?;

    let decomposition = matrix
        .self_adjoint_eigen(Side::Lower)
        .map_err(|_| EigenError::NotConverged { dimension })?;

    Ok(SymmetricEigen {
        eigenvalues: decomposition.S().column_vector().iter().copied().collect(),
        eigenvectors: decomposition.U().to_owned(),
    })
}

fn validate_symmetric(matrix: &DenseRealMatrix) -> Result<usize, EigenError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(EigenError::EmptyMatrix);
    }
    if rows != cols {
        return Err(EigenError::NonSquareMatrix { rows, cols });
    }

    for row in 0..rows {
        for col in 0..cols {
            if !matrix[(row, col)].is_finite() {
                return Err(EigenError::NonFiniteElement { row, col });
            }
        }
    }
    let scale = matrix.norm_l2().max(1.0);
    for row in 0..rows {
        for col in (row + 1)..cols {
            let deviation = (matrix[(row, col)] - matrix[(col, row)]).abs();
            if deviation > SYMMETRY_EPSILON * scale {
                return Err(EigenError::NotSymmetric {
                    row,
                    col,
                    deviation,
                });
            }
        }
    }
    Ok(rows)
}
