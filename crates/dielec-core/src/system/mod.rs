//! Crystal geometry and masses as seen by the phonon kernels.

use crate::common::constants::AMU_RY;
use crate::domain::{DielecError, DielecResult};
use crate::numerics::{Matrix3, cross3, dot3};

/// Geometry provider consumed by the dielectric core.
///
/// Masses are in Rydberg units (2 mₑ). `atom_of_dof` maps a degree of
/// freedom `3 * atom + component` back to the atom that carries it.
pub trait SystemGeometry {
    fn atom_count(&self) -> usize;

    fn mass_ry(&self, atom: usize) -> f64;

    /// Unit-cell volume in Bohr³.
    fn cell_volume(&self) -> f64;

    fn atom_of_dof(&self, dof: usize) -> usize {
        dof / 3
    }

    fn dof_count(&self) -> usize {
        3 * self.atom_count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    pub element: String,
    pub mass_amu: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrystalSystem {
    lattice: Matrix3,
    atoms: Vec<AtomSite>,
}

impl CrystalSystem {
    /// `lattice` rows are the primitive vectors in Bohr.
    pub fn new(lattice: Matrix3, atoms: Vec<AtomSite>) -> DielecResult<Self> {
        if atoms.is_empty() {
            return Err(DielecError::configuration(
                "INPUT.SYSTEM_ATOMS",
                "crystal system requires at least one atom",
            ));
        }
        for (index, atom) in atoms.iter().enumerate() {
            if !(atom.mass_amu.is_finite() && atom.mass_amu > 0.0) {
                return Err(DielecError::configuration(
                    "INPUT.SYSTEM_MASS",
                    format!(
                        "atom {} ({}) has non-positive mass {}",
                        index + 1,
                        atom.element,
                        atom.mass_amu
                    ),
                ));
            }
        }

        let system = Self { lattice, atoms };
        let volume = system.cell_volume();
        if !(volume.is_finite() && volume > 0.0) {
            return Err(DielecError::configuration(
                "INPUT.SYSTEM_LATTICE",
                format!("lattice vectors span a degenerate cell (volume = {volume})"),
            ));
        }
        Ok(system)
    }

    pub fn lattice(&self) -> &Matrix3 {
        &self.lattice
    }

    pub fn atoms(&self) -> &[AtomSite] {
        &self.atoms
    }

    pub fn masses_ry(&self) -> Vec<f64> {
        self.atoms
            .iter()
            .map(|atom| atom.mass_amu * AMU_RY)
            .collect()
    }
}

impl SystemGeometry for CrystalSystem {
    fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    fn mass_ry(&self, atom: usize) -> f64 {
        self.atoms[atom].mass_amu * AMU_RY
    }

    fn cell_volume(&self) -> f64 {
        dot3(self.lattice[0], cross3(self.lattice[1], self.lattice[2])).abs()
    }
}
