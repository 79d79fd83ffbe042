//! Born effective charges and their lazily loaded per-process cache.

mod parser;

use crate::diagnostics::Verbosity;
use crate::domain::{DielecError, DielecResult};
use crate::numerics::Matrix3;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct BornCharges {
    epsilon_infinity: Matrix3,
    charges: Vec<Matrix3>,
}

impl BornCharges {
    pub fn new(epsilon_infinity: Matrix3, charges: Vec<Matrix3>) -> Self {
        Self {
            epsilon_infinity,
            charges,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.charges.len()
    }

    /// Electronic (clamped-ion) dielectric tensor.
    pub fn epsilon_infinity(&self) -> &Matrix3 {
        &self.epsilon_infinity
    }

    pub fn charge(&self, atom: usize) -> &Matrix3 {
        &self.charges[atom]
    }

    pub fn charges(&self) -> &[Matrix3] {
        &self.charges
    }

    /// `Σ_atoms Z[atom]`; vanishes when the acoustic sum rule holds.
    pub fn neutrality_deviation(&self) -> Matrix3 {
        let mut sum = [[0.0; 3]; 3];
        for charge in &self.charges {
            for i in 0..3 {
                for j in 0..3 {
                    sum[i][j] += charge[i][j];
                }
            }
        }
        sum
    }

    pub fn max_neutrality_deviation(&self) -> f64 {
        self.neutrality_deviation()
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, value| acc.max(value.abs()))
    }

    /// Subtracts the per-component average so that the charges sum to zero.
    pub fn enforce_charge_neutrality(&mut self) {
        if self.charges.is_empty() {
            return;
        }
        let deviation = self.neutrality_deviation();
        let count = self.charges.len() as f64;
        for charge in &mut self.charges {
            for i in 0..3 {
                for j in 0..3 {
                    charge[i][j] -= deviation[i][j] / count;
                }
            }
        }
    }
}

pub trait BornChargeSource: Send + Sync {
    /// Human-readable origin used in log and error messages.
    fn label(&self) -> String;

    fn load(&self) -> DielecResult<BornCharges>;
}

impl BornChargeSource for BornCharges {
    fn label(&self) -> String {
        "in-memory Born charges".to_string()
    }

    fn load(&self) -> DielecResult<BornCharges> {
        Ok(self.clone())
    }
}

/// BORNINFO file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BornInfoFile {
    path: PathBuf,
    enforce_neutrality: bool,
}

impl BornInfoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enforce_neutrality: false,
        }
    }

    pub fn with_charge_neutrality(mut self, enforce: bool) -> Self {
        self.enforce_neutrality = enforce;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BornChargeSource for BornInfoFile {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> DielecResult<BornCharges> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            DielecError::io(
                "IO.BORNINFO_READ",
                format!(
                    "failed to read BORNINFO '{}': {}",
                    self.path.display(),
                    source
                ),
            )
        })?;
        let mut charges = parser::parse_borninfo_source(&self.label(), &content)?;
        if self.enforce_neutrality {
            charges.enforce_charge_neutrality();
        }
        Ok(charges)
    }
}

/// Per-process cache of the Born charges, loaded on first demand.
#[derive(Default)]
pub struct BornChargeCache {
    source: Option<Box<dyn BornChargeSource>>,
    loaded: Option<BornCharges>,
}

impl BornChargeCache {
    pub fn new(source: Option<Box<dyn BornChargeSource>>) -> Self {
        Self {
            source,
            loaded: None,
        }
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn loaded(&self) -> Option<&BornCharges> {
        self.loaded.as_ref()
    }

    /// Fails when no source is configured. `call_site` names the caller in
    /// the diagnostic.
    pub fn require_configured(&self, call_site: &str) -> DielecResult<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(missing_born_source(call_site))
        }
    }

    pub fn load_if_absent(
        &mut self,
        verbosity: Verbosity,
        call_site: &str,
    ) -> DielecResult<&BornCharges> {
        if self.loaded.is_none() {
            let source = self
                .source
                .as_ref()
                .ok_or_else(|| missing_born_source(call_site))?;
            let charges = source.load()?;
            log_loaded_charges(&source.label(), &charges, verbosity);
            self.loaded = Some(charges);
        }

        self.loaded
            .as_ref()
            .ok_or_else(|| DielecError::internal("SYS.BORN_CACHE", "Born charge cache is empty"))
    }
}

fn missing_born_source(call_site: &str) -> DielecError {
    DielecError::configuration(
        "INPUT.DIELEC_BORNINFO",
        format!("{call_site}: BORNINFO must be set when DIELEC = 1."),
    )
}

fn log_loaded_charges(label: &str, charges: &BornCharges, verbosity: Verbosity) {
    let atoms = charges.atom_count();
    let deviation = charges.max_neutrality_deviation();
    if verbosity >= Verbosity::Normal {
        tracing::info!(source = label, atoms, "Born effective charges loaded");
        if deviation > 1.0e-6 {
            tracing::warn!(
                deviation,
                "sum of Born effective charges deviates from charge neutrality"
            );
        }
    } else {
        tracing::debug!(source = label, atoms, deviation, "Born effective charges loaded");
    }
}
