pub mod eigen;

pub use eigen::{EigenError, SymmetricEigen, symmetric_eigen};

use faer::Mat;
use num_complex::Complex64;

pub type DenseRealMatrix = Mat<f64>;
pub type DenseComplexMatrix = Mat<Complex64>;

pub type Vector3 = [f64; 3];
pub type Matrix3 = [[f64; 3]; 3];

pub fn dot3(lhs: Vector3, rhs: Vector3) -> f64 {
    lhs[0] * rhs[0] + lhs[1] * rhs[1] + lhs[2] * rhs[2]
}

pub fn cross3(lhs: Vector3, rhs: Vector3) -> Vector3 {
    [
        lhs[1] * rhs[2] - lhs[2] * rhs[1],
        lhs[2] * rhs[0] - lhs[0] * rhs[2],
        lhs[0] * rhs[1] - lhs[1] * rhs[0],
    ]
}

pub fn norm3(vector: Vector3) -> f64 {
    dot3(vector, vector).sqrt()
}

pub fn dense_real_from_rows(rows: &[Vec<f64>]) -> DenseRealMatrix {
    let nrows = rows.len();
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    let mut matrix = DenseRealMatrix::zeros(nrows, ncols);
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate().take(ncols) {
            matrix[(row, col)] = *value;
        }
    }
    matrix
}
