use super::grid::EnergyGrid;
use crate::common::constants::{FREQ_CONV_FACTOR, OSCILLATOR_PREFACTOR};
use crate::domain::{DielecError, DielecResult};
use crate::numerics::Matrix3;
use crate::phonon::ACOUSTIC_MODE_COUNT;

/// Ionic dielectric response on the frequency grid, stored flat with shape
/// `[nomega][3][3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DielectricTensor {
    nomega: usize,
    values: Vec<f64>,
}

impl DielectricTensor {
    fn zeros(nomega: usize) -> Self {
        Self {
            nomega,
            values: vec![0.0; nomega * 9],
        }
    }

    const fn offset(k: usize, i: usize, j: usize) -> usize {
        9 * k + 3 * i + j
    }

    pub fn nomega(&self) -> usize {
        self.nomega
    }

    pub fn component(&self, k: usize, i: usize, j: usize) -> f64 {
        self.values[Self::offset(k, i, j)]
    }

    pub fn at(&self, k: usize) -> Matrix3 {
        let mut tensor = [[0.0; 3]; 3];
        for (i, row) in tensor.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = self.component(k, i, j);
            }
        }
        tensor
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// `ε[k][i][j] = 8π/V · Σ_{mode ≥ 3} S[mode][i][j] / (λ[mode] − ω_k² c)`,
/// with `ω_k` the grid wavenumber and `c` the cm⁻² to eigenvalue conversion.
///
/// A grid point that hits an eigenvalue exactly divides by zero and yields
/// non-finite entries.
pub fn assemble_dielectric_tensor(
    grid: &EnergyGrid,
    eigenvalues: &[f64],
    strengths: &[Matrix3],
    cell_volume: f64,
) -> DielecResult<DielectricTensor> {
    if eigenvalues.len() != strengths.len() {
        return Err(DielecError::internal(
            "SYS.DIELEC_MODES",
            format!(
                "{} eigenvalues but {} oscillator strengths",
                eigenvalues.len(),
                strengths.len()
            ),
        ));
    }
    if !(cell_volume.is_finite() && cell_volume > 0.0) {
        return Err(DielecError::precondition(
            "INPUT.SYSTEM_LATTICE",
            format!("cell volume must be positive, got {cell_volume}"),
        ));
    }

    let factor = OSCILLATOR_PREFACTOR / cell_volume;
    let optical = eigenvalues
        .iter()
        .zip(strengths)
        .skip(ACOUSTIC_MODE_COUNT)
        .collect::<Vec<_>>();

    let mut tensor = DielectricTensor::zeros(grid.nomega());
    for (k, omega) in grid.values().iter().enumerate() {
        let w2 = omega * omega * FREQ_CONV_FACTOR;
        for i in 0..3 {
            for j in 0..3 {
                let sum: f64 = optical
                    .iter()
                    .map(|(eigenvalue, strength)| strength[i][j] / (**eigenvalue - w2))
                    .sum();
                tensor.values[DielectricTensor::offset(k, i, j)] = sum * factor;
            }
        }
    }
    Ok(tensor)
}
