//! `dielec.json` input deck shared by the DIELEC and ZMODE modules.

mod parser;

pub use parser::{DeckError, load_deck};

use crate::born::{BornChargeCache, BornChargeSource, BornInfoFile};
use crate::diagnostics::Verbosity;
use crate::dielectric::{Dielec, DielecSettings, EnergyBounds};
use crate::domain::{DielecError, DielecResult};
use crate::numerics::{Matrix3, Vector3, dense_real_from_rows};
use crate::phonon::GammaDynamicalMatrix;
use crate::system::{AtomSite, CrystalSystem};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DielecDeck {
    pub prefix: String,
    #[serde(default)]
    pub dielec: bool,
    #[serde(rename = "bornInfo", default)]
    pub born_info: Option<PathBuf>,
    #[serde(rename = "bornSymmetrize", default)]
    pub born_symmetrize: bool,
    #[serde(default)]
    pub dos: DosSection,
    #[serde(rename = "projectionDirections", default)]
    pub projection_directions: Vec<Vector3>,
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,
    /// Primitive vectors as rows, in Bohr.
    pub lattice: Matrix3,
    pub atoms: Vec<AtomEntry>,
    /// Γ-folded second-order force constants, Ry/Bohr².
    #[serde(rename = "forceConstants")]
    pub force_constants: Vec<Vec<f64>>,
}

/// Frequency window in cm⁻¹.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DosSection {
    pub emin: f64,
    pub emax: f64,
    #[serde(rename = "deltaE")]
    pub delta_e: f64,
}

impl Default for DosSection {
    fn default() -> Self {
        let bounds = EnergyBounds::default();
        Self {
            emin: bounds.emin,
            emax: bounds.emax,
            delta_e: bounds.delta_e,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AtomEntry {
    pub element: String,
    /// Atomic mass in amu.
    pub mass: f64,
}

fn default_verbosity() -> u8 {
    Verbosity::Normal.level()
}

/// Validated run configuration built from a deck.
#[derive(Debug, Clone)]
pub struct DielecInput {
    pub prefix: String,
    pub settings: DielecSettings,
    pub bounds: EnergyBounds,
    pub born_source: Option<BornInfoFile>,
    pub system: CrystalSystem,
    pub solver: GammaDynamicalMatrix,
}

impl DielecInput {
    pub fn load(deck_path: &Path) -> DielecResult<Self> {
        let deck = load_deck(deck_path).map_err(|error| match error {
            DeckError::Read { .. } => DielecError::io("IO.DECK_READ", error.to_string()),
            DeckError::Parse { .. } => {
                DielecError::configuration("INPUT.DECK_PARSE", error.to_string())
            }
        })?;
        let deck_dir = deck_path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_deck(deck, deck_dir)
    }

    /// `deck_dir` anchors a relative `bornInfo` path.
    pub fn from_deck(deck: DielecDeck, deck_dir: &Path) -> DielecResult<Self> {
        let prefix = deck.prefix.trim().to_string();
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(DielecError::configuration(
                "INPUT.DECK_PREFIX",
                format!("prefix '{}' must be a non-empty file stem", deck.prefix),
            ));
        }

        let atoms = deck
            .atoms
            .into_iter()
            .map(|atom| AtomSite {
                element: atom.element,
                mass_amu: atom.mass,
            })
            .collect();
        let system = CrystalSystem::new(deck.lattice, atoms)?;

        let dof = 3 * system.atoms().len();
        if deck.force_constants.len() != dof
            || deck.force_constants.iter().any(|row| row.len() != dof)
        {
            return Err(DielecError::configuration(
                "INPUT.FORCE_CONSTANTS",
                format!("forceConstants must be a {dof}x{dof} matrix"),
            ));
        }
        let solver = GammaDynamicalMatrix::new(
            dense_real_from_rows(&deck.force_constants),
            system.masses_ry(),
        )?;

        let born_source = deck.born_info.map(|path| {
            let resolved = if path.is_absolute() {
                path
            } else {
                deck_dir.join(path)
            };
            BornInfoFile::new(resolved).with_charge_neutrality(deck.born_symmetrize)
        });

        Ok(Self {
            prefix,
            settings: DielecSettings {
                enabled: deck.dielec,
                projection_directions: deck.projection_directions,
                verbosity: Verbosity::from_level(deck.verbosity),
            },
            bounds: EnergyBounds::new(deck.dos.emin, deck.dos.emax, deck.dos.delta_e),
            born_source,
            system,
            solver,
        })
    }

    /// Fresh per-participant Born-charge cache.
    pub fn born_cache(&self) -> BornChargeCache {
        BornChargeCache::new(
            self.born_source
                .clone()
                .map(|source| Box::new(source) as Box<dyn BornChargeSource>),
        )
    }

    pub fn dielec(&self) -> Dielec {
        Dielec::new(self.settings.clone(), self.born_cache())
    }
}
