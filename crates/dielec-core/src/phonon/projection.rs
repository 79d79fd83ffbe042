use super::PhononModes;
use crate::domain::{DielecError, DielecResult};
use crate::numerics::{DenseRealMatrix, Vector3, norm3, symmetric_eigen};
use num_complex::Complex64;
use std::ops::Range;

const DEGENERACY_RELATIVE_TOLERANCE: f64 = 1.0e-8;
const DEGENERACY_ABSOLUTE_FLOOR: f64 = 1.0e-14;

/// Index ranges of consecutive (ascending) eigenvalues that coincide within
/// a tolerance relative to the largest eigenvalue magnitude.
pub fn degenerate_blocks(eigenvalues: &[f64]) -> Vec<Range<usize>> {
    let scale = eigenvalues
        .iter()
        .fold(0.0_f64, |acc, value| acc.max(value.abs()));
    let tolerance = (scale * DEGENERACY_RELATIVE_TOLERANCE).max(DEGENERACY_ABSOLUTE_FLOOR);

    let mut blocks = Vec::new();
    let mut start = 0;
    for index in 1..=eigenvalues.len() {
        let closes_block = index == eigenvalues.len()
            || (eigenvalues[index] - eigenvalues[start]).abs() > tolerance;
        if closes_block {
            if index > start {
                blocks.push(start..index);
            }
            start = index;
        }
    }
    blocks
}

/// Rotates every degenerate subspace so that, for each direction in turn,
/// the next basis vector maximizes the atom-wise projection
/// `Σ_atom |e_atom · d|²`. Vectors left over keep spanning the orthogonal
/// complement. Non-degenerate modes are untouched.
///
/// The projection matrix is taken as the real part of the Hermitian overlap,
/// which is exact for the real eigenvectors produced at the zone centre.
pub fn project_degenerate_modes(
    mut modes: PhononModes,
    directions: &[Vector3],
) -> DielecResult<PhononModes> {
    let dof = modes.dof_count();
    if dof % 3 != 0 {
        return Err(DielecError::precondition(
            "INPUT.PHONON_PROJECTION",
            format!("eigenvector length {dof} is not a multiple of three"),
        ));
    }

    let unit_directions = directions
        .iter()
        .map(|direction| {
            let length = norm3(*direction);
            if length > 0.0 && length.is_finite() {
                Ok(direction.map(|component| component / length))
            } else {
                Err(DielecError::configuration(
                    "INPUT.PHONON_PROJECTION",
                    format!(
                        "projection direction ({}, {}, {}) has zero length",
                        direction[0], direction[1], direction[2]
                    ),
                ))
            }
        })
        .collect::<DielecResult<Vec<Vector3>>>()?;

    for block in degenerate_blocks(&modes.eigenvalues) {
        if block.len() < 2 {
            continue;
        }

        let mut remaining: Vec<Vec<Complex64>> = block
            .clone()
            .map(|mode| (0..dof).map(|j| modes.eigenvectors[(mode, j)]).collect())
            .collect();
        let mut ordered = Vec::with_capacity(remaining.len());

        for direction in &unit_directions {
            if remaining.len() < 2 {
                break;
            }
            let mut rotated = rotate_towards(&remaining, *direction)?;
            ordered.push(rotated.remove(0));
            remaining = rotated;
        }
        ordered.extend(remaining);

        for (offset, vector) in ordered.into_iter().enumerate() {
            for (j, value) in vector.into_iter().enumerate() {
                modes.eigenvectors[(block.start + offset, j)] = value;
            }
        }
    }

    Ok(modes)
}

/// Returns the basis re-expressed in eigenvectors of the projection matrix,
/// ordered by decreasing projection onto `direction`.
fn rotate_towards(
    basis: &[Vec<Complex64>],
    direction: Vector3,
) -> DielecResult<Vec<Vec<Complex64>>> {
    let size = basis.len();
    let projected: Vec<Vec<Complex64>> = basis
        .iter()
        .map(|vector| {
            vector
                .chunks_exact(3)
                .map(|atom| atom[0] * direction[0] + atom[1] * direction[1] + atom[2] * direction[2])
                .collect()
        })
        .collect();

    let mut overlap = DenseRealMatrix::zeros(size, size);
    for a in 0..size {
        for b in 0..size {
            overlap[(a, b)] = projected[a]
                .iter()
                .zip(&projected[b])
                .map(|(lhs, rhs)| (lhs.conj() * *rhs).re)
                .sum();
        }
    }

    let eigen = symmetric_eigen(&overlap).map_err(|error| {
        DielecError::numerical(
            "RUN.PHONON_PROJECTION",
            format!("degenerate-subspace projection failed: {error}"),
        )
    })?;

    let dof = basis[0].len();
    Ok((0..size)
        .rev()
        .map(|column| {
            let mut vector = vec![Complex64::new(0.0, 0.0); dof];
            for (a, source) in basis.iter().enumerate() {
                let weight = eigen.eigenvectors[(a, column)];
                for (target, value) in vector.iter_mut().zip(source) {
                    *target += *value * weight;
                }
            }
            vector
        })
        .collect())
}
