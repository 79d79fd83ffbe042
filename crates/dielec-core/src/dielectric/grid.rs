use crate::domain::{DielecError, DielecResult};
use serde::{Deserialize, Serialize};

/// Frequency window of the density-of-states configuration, in cm⁻¹.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBounds {
    pub emin: f64,
    pub emax: f64,
    pub delta_e: f64,
}

impl Default for EnergyBounds {
    fn default() -> Self {
        Self {
            emin: 0.0,
            emax: 1.0,
            delta_e: 1.0,
        }
    }
}

impl EnergyBounds {
    pub fn new(emin: f64, emax: f64, delta_e: f64) -> Self {
        Self {
            emin,
            emax,
            delta_e,
        }
    }

    /// `floor((emax - emin) / delta_e)`, after validating the bounds.
    pub fn point_count(&self) -> DielecResult<usize> {
        if !(self.emin.is_finite() && self.emax.is_finite() && self.delta_e.is_finite()) {
            return Err(DielecError::precondition(
                "INPUT.DIELEC_GRID",
                format!(
                    "energy grid bounds must be finite (emin = {}, emax = {}, delta_e = {})",
                    self.emin, self.emax, self.delta_e
                ),
            ));
        }
        if self.delta_e <= 0.0 {
            return Err(DielecError::precondition(
                "INPUT.DIELEC_GRID",
                format!("energy grid step must be positive, got {}", self.delta_e),
            ));
        }
        if self.emax <= self.emin {
            return Err(DielecError::precondition(
                "INPUT.DIELEC_GRID",
                format!(
                    "energy grid requires emax > emin, got emin = {} and emax = {}",
                    self.emin, self.emax
                ),
            ));
        }

        let count = ((self.emax - self.emin) / self.delta_e).floor();
        if count < 1.0 {
            return Err(DielecError::precondition(
                "INPUT.DIELEC_GRID",
                format!(
                    "energy window [{}, {}] is narrower than one step of {}",
                    self.emin, self.emax, self.delta_e
                ),
            ));
        }
        Ok(count as usize)
    }
}

/// Supplier of the grid bounds; only consulted on the coordinating participant.
pub trait DosProvider {
    fn energy_bounds(&self) -> EnergyBounds;
}

impl DosProvider for EnergyBounds {
    fn energy_bounds(&self) -> EnergyBounds {
        *self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyGrid {
    bounds: EnergyBounds,
    values: Vec<f64>,
}

impl EnergyGrid {
    pub fn build(bounds: EnergyBounds) -> DielecResult<Self> {
        let nomega = bounds.point_count()?;
        let values = (0..nomega)
            .map(|index| bounds.emin + bounds.delta_e * index as f64)
            .collect();
        Ok(Self { bounds, values })
    }

    pub fn bounds(&self) -> EnergyBounds {
        self.bounds
    }

    pub fn nomega(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
