use crate::born::BornCharges;
use crate::common::constants::AMU_RY;
use crate::diagnostics::{Diagnostic, DiagnosticGate};
use crate::domain::{DielecError, DielecResult};
use crate::numerics::{DenseComplexMatrix, Matrix3, Vector3, norm3};
use crate::phonon::PhononModes;
use crate::system::SystemGeometry;
use num_complex::Complex64;

/// Mass unit used when turning mass-weighted eigenvectors into
/// normal-coordinate displacements.
///
/// The dielectric sum needs displacements per `sqrt(2 mₑ)` so that it pairs
/// with eigenvalues in Rydberg units. Mode effective charges reported to the
/// user are quoted per `sqrt(amu)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MassUnit {
    Rydberg,
    AtomicMassUnit,
}

impl MassUnit {
    /// Rydberg-unit mass of one unit of `self`.
    pub const fn in_rydberg_units(self) -> f64 {
        match self {
            Self::Rydberg => 1.0,
            Self::AtomicMassUnit => AMU_RY,
        }
    }
}

/// Dense `modes × 3` mode effective charges. Acoustic rows are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeEffectiveCharges {
    charges: Vec<Vector3>,
    normalized: bool,
}

impl ModeEffectiveCharges {
    pub fn mode_count(&self) -> usize {
        self.charges.len()
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub fn charge(&self, mode: usize) -> Vector3 {
        self.charges[mode]
    }

    pub fn as_rows(&self) -> &[Vector3] {
        &self.charges
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.charges.iter().map(|charge| norm3(*charge)).collect()
    }

    /// Unit vectors along each charge; modes without a charge stay zero.
    pub fn directions(&self) -> Vec<Vector3> {
        self.charges
            .iter()
            .map(|charge| {
                let length = norm3(*charge);
                if length > 0.0 {
                    charge.map(|component| component / length)
                } else {
                    [0.0; 3]
                }
            })
            .collect()
    }

    /// `S[mode][i][j] = Z_i[mode] · Z_j[mode]`.
    pub fn oscillator_strengths(&self) -> Vec<Matrix3> {
        self.charges
            .iter()
            .map(|charge| {
                let mut strength = [[0.0; 3]; 3];
                for i in 0..3 {
                    for j in 0..3 {
                        strength[i][j] = charge[i] * charge[j];
                    }
                }
                strength
            })
            .collect()
    }
}

/// Divides each eigenvector component by `sqrt(mass[atom(dof)] / unit)`.
pub fn scale_to_displacements(
    modes: &PhononModes,
    system: &dyn SystemGeometry,
    unit: MassUnit,
    diagnostics: DiagnosticGate<'_>,
) -> DielecResult<DenseComplexMatrix> {
    let dof = system.dof_count();
    if modes.dof_count() != dof || modes.eigenvectors.nrows() != modes.mode_count() {
        return Err(DielecError::precondition(
            "INPUT.DIELEC_MODES",
            format!(
                "eigenvectors are {}x{} but the system has {dof} degrees of freedom",
                modes.eigenvectors.nrows(),
                modes.dof_count()
            ),
        ));
    }

    let factors: Vec<f64> = (0..dof)
        .map(|j| 1.0 / (system.mass_ry(system.atom_of_dof(j)) / unit.in_rydberg_units()).sqrt())
        .collect();

    let mut scaled = DenseComplexMatrix::zeros(modes.mode_count(), dof);
    for mode in 0..modes.mode_count() {
        for (j, factor) in factors.iter().enumerate() {
            scaled[(mode, j)] = modes.eigenvectors[(mode, j)] * *factor;
        }
    }

    diagnostics.emit_with(|| Diagnostic::MassScaledModes {
        eigenvectors: complex_rows(&scaled),
    });
    Ok(scaled)
}

/// `Z[mode][i] = Σ_dof Z_born[atom(dof)][i][dof % 3] · Re(U[mode][dof])`,
/// divided by `|U[mode]|` when `normalize` is set.
pub fn mode_effective_charges(
    displacements: &DenseComplexMatrix,
    born: &BornCharges,
    system: &dyn SystemGeometry,
    normalize: bool,
    diagnostics: DiagnosticGate<'_>,
) -> DielecResult<ModeEffectiveCharges> {
    if born.atom_count() != system.atom_count() {
        return Err(DielecError::configuration(
            "INPUT.DIELEC_BORNINFO",
            format!(
                "Born charges are given for {} atoms but the system has {}",
                born.atom_count(),
                system.atom_count()
            ),
        ));
    }
    let dof = system.dof_count();
    if displacements.ncols() != dof {
        return Err(DielecError::precondition(
            "INPUT.DIELEC_MODES",
            format!(
                "displacements have {} components but the system has {dof} degrees of freedom",
                displacements.ncols()
            ),
        ));
    }

    let charges = (0..displacements.nrows())
        .map(|mode| {
            let mut charge = [0.0; 3];
            let mut norm_sqr = 0.0;
            for j in 0..dof {
                let value = displacements[(mode, j)];
                let born_charge = born.charge(system.atom_of_dof(j));
                for (i, component) in charge.iter_mut().enumerate() {
                    *component += born_charge[i][j % 3] * value.re;
                }
                norm_sqr += value.norm_sqr();
            }
            if normalize && norm_sqr > 0.0 {
                let norm = norm_sqr.sqrt();
                charge = charge.map(|component| component / norm);
            }
            charge
        })
        .collect::<Vec<_>>();

    diagnostics.emit_with(|| Diagnostic::ModeCharges {
        charges: charges.clone(),
    });
    Ok(ModeEffectiveCharges {
        charges,
        normalized: normalize,
    })
}

pub(crate) fn complex_rows(matrix: &DenseComplexMatrix) -> Vec<Vec<(f64, f64)>> {
    (0..matrix.nrows())
        .map(|row| {
            (0..matrix.ncols())
                .map(|col| {
                    let value: Complex64 = matrix[(row, col)];
                    (value.re, value.im)
                })
                .collect()
        })
        .collect()
}
