//! Frequency-dependent ionic dielectric tensor and mode effective charges at
//! the zone centre (Gonze & Lee, PRB 55, 10355 (1997)).

mod grid;
mod tensor;
mod zstar;

pub use grid::{DosProvider, EnergyBounds, EnergyGrid};
pub use tensor::{DielectricTensor, assemble_dielectric_tensor};
pub use zstar::{MassUnit, ModeEffectiveCharges, mode_effective_charges, scale_to_displacements};

use crate::born::{BornChargeCache, BornCharges};
use crate::diagnostics::{Diagnostic, DiagnosticGate, DiagnosticHook, TracingDiagnostics, Verbosity};
use crate::domain::{DielecError, DielecResult};
use crate::numerics::Vector3;
use crate::parallel::Communicator;
use crate::phonon::{GAMMA_POINT, PhononModes, PhononSolver};
use crate::system::SystemGeometry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DielecState {
    Uninitialized,
    Initialized,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DielecSettings {
    /// `DIELEC` flag as read by the coordinating participant.
    pub enabled: bool,
    /// Directions used to fix the basis of degenerate modes for mode charges.
    pub projection_directions: Vec<Vector3>,
    pub verbosity: Verbosity,
}

/// What the coordinating participant hands to everybody during `init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InitPayload {
    enabled: bool,
    grid: Option<EnergyGrid>,
}

pub struct Dielec {
    settings: DielecSettings,
    born: BornChargeCache,
    diagnostics: Arc<dyn DiagnosticHook>,
    state: DielecState,
    grid: Option<EnergyGrid>,
    tensor: Option<DielectricTensor>,
}

impl Dielec {
    pub fn new(settings: DielecSettings, born: BornChargeCache) -> Self {
        Self {
            settings,
            born,
            diagnostics: Arc::new(TracingDiagnostics),
            state: DielecState::Uninitialized,
            grid: None,
            tensor: None,
        }
    }

    pub fn with_diagnostics(mut self, hook: Arc<dyn DiagnosticHook>) -> Self {
        self.diagnostics = hook;
        self
    }

    pub fn state(&self) -> DielecState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn settings(&self) -> &DielecSettings {
        &self.settings
    }

    /// Born charges, once any operation has loaded them.
    pub fn born_charges(&self) -> Option<&BornCharges> {
        self.born.loaded()
    }

    fn gate(&self) -> DiagnosticGate<'_> {
        DiagnosticGate::new(self.diagnostics.as_ref(), self.settings.verbosity)
    }

    /// Collective: every participant of `comm` must call it. The root reads
    /// the enable flag and `dos`, validates them and broadcasts the result;
    /// a root-side failure is returned by every participant.
    pub fn init<C: Communicator>(&mut self, comm: &C, dos: &dyn DosProvider) -> DielecResult<()> {
        let proposal = comm.is_root().then(|| self.prepare_payload(dos));
        let payload = comm.broadcast(proposal)??;

        self.settings.enabled = payload.enabled;
        self.grid = payload.grid;
        self.tensor = None;
        if self.settings.enabled {
            let verbosity = self.settings.verbosity.min(Verbosity::Normal);
            self.born.load_if_absent(verbosity, "Dielec::init()")?;
            if let Some(grid) = &self.grid {
                tracing::debug!(
                    rank = comm.rank(),
                    nomega = grid.nomega(),
                    "dielectric frequency grid ready"
                );
            }
        }
        self.state = DielecState::Initialized;
        Ok(())
    }

    fn prepare_payload(&self, dos: &dyn DosProvider) -> DielecResult<InitPayload> {
        if !self.settings.enabled {
            return Ok(InitPayload {
                enabled: false,
                grid: None,
            });
        }
        self.born.require_configured("Dielec::init()")?;
        let grid = EnergyGrid::build(dos.energy_bounds())?;
        Ok(InitPayload {
            enabled: true,
            grid: Some(grid),
        })
    }

    /// Evaluates the Γ-point modes and assembles the tensor on the grid.
    pub fn run(
        &mut self,
        solver: &dyn PhononSolver,
        system: &dyn SystemGeometry,
    ) -> DielecResult<()> {
        if self.state == DielecState::Uninitialized {
            return Err(DielecError::precondition(
                "RUN.DIELEC_NOT_INITIALIZED",
                "Dielec::run(): init must complete before the dielectric tensor is computed",
            ));
        }
        if !self.settings.enabled {
            return Err(DielecError::precondition(
                "RUN.DIELEC_DISABLED",
                "Dielec::run(): the dielectric calculation is disabled (DIELEC = 0)",
            ));
        }

        let tensor = {
            let modes = solver.evaluate(GAMMA_POINT)?;
            self.assemble(&modes, system)?
        };
        tracing::info!(
            nomega = tensor.nomega(),
            "frequency-dependent dielectric tensor computed"
        );
        self.tensor = Some(tensor);
        self.state = DielecState::Computed;
        Ok(())
    }

    fn assemble(
        &mut self,
        modes: &PhononModes,
        system: &dyn SystemGeometry,
    ) -> DielecResult<DielectricTensor> {
        let verbosity = self.settings.verbosity.min(Verbosity::Normal);
        self.born.load_if_absent(verbosity, "Dielec::run()")?;

        let gate = self.gate();
        gate.emit_with(|| Diagnostic::EigenModes {
            eigenvalues: modes.eigenvalues.clone(),
            eigenvectors: modes.eigenvector_rows(),
        });

        let born = self.born.loaded().ok_or_else(|| {
            DielecError::internal("SYS.BORN_CACHE", "Born charges missing after load")
        })?;
        let displacements = scale_to_displacements(modes, system, MassUnit::Rydberg, gate)?;
        let charges = mode_effective_charges(&displacements, born, system, false, gate)?;
        let strengths = charges.oscillator_strengths();
        gate.emit_with(|| Diagnostic::OscillatorStrengths {
            strengths: strengths.clone(),
        });

        let grid = self.grid.as_ref().ok_or_else(|| {
            DielecError::internal("SYS.DIELEC_GRID", "frequency grid missing after init")
        })?;
        assemble_dielectric_tensor(grid, &modes.eigenvalues, &strengths, system.cell_volume())
    }

    pub fn omega_grid(&self) -> DielecResult<&EnergyGrid> {
        match (&self.state, &self.grid) {
            (DielecState::Computed, Some(grid)) => Ok(grid),
            _ => Err(not_computed("Dielec::omega_grid()")),
        }
    }

    pub fn dielectric_tensor(&self) -> DielecResult<&DielectricTensor> {
        match (&self.state, &self.tensor) {
            (DielecState::Computed, Some(tensor)) => Ok(tensor),
            _ => Err(not_computed("Dielec::dielectric_tensor()")),
        }
    }

    /// Mode effective charges per `sqrt(amu)`. Works without `init`: the Born
    /// charges are loaded on demand and the configured projection directions
    /// fix the basis of degenerate modes.
    pub fn mode_effective_charges(
        &mut self,
        normalize: bool,
        solver: &dyn PhononSolver,
        system: &dyn SystemGeometry,
    ) -> DielecResult<ModeEffectiveCharges> {
        const CALL_SITE: &str = "Dielec::compute_mode_effective_charge()";
        self.born.require_configured(CALL_SITE)?;
        self.born.load_if_absent(Verbosity::Silent, CALL_SITE)?;

        let modes = if self.settings.projection_directions.is_empty() {
            solver.evaluate(GAMMA_POINT)?
        } else {
            solver.project_degenerate_eigenvectors(
                GAMMA_POINT,
                &self.settings.projection_directions,
            )?
        };

        let gate = self.gate();
        let born = self.born.loaded().ok_or_else(|| {
            DielecError::internal("SYS.BORN_CACHE", "Born charges missing after load")
        })?;
        let displacements = scale_to_displacements(&modes, system, MassUnit::AtomicMassUnit, gate)?;
        mode_effective_charges(&displacements, born, system, normalize, gate)
    }
}

fn not_computed(call_site: &str) -> DielecError {
    DielecError::precondition(
        "RUN.DIELEC_NOT_COMPUTED",
        format!("{call_site}: the dielectric tensor has not been computed yet"),
    )
}

#[cfg(test)]
mod tests {
    use super::{Dielec, DielecSettings, DielecState, EnergyBounds};
    use crate::born::{BornChargeCache, BornCharges};
    use crate::diagnostics::{RecordingDiagnostics, Verbosity};
    use crate::domain::DielecErrorCategory;
    use crate::numerics::DenseRealMatrix;
    use crate::parallel::SerialComm;
    use crate::phonon::GammaDynamicalMatrix;
    use crate::system::{AtomSite, CrystalSystem};
    use std::sync::Arc;

    fn rock_salt_like() -> (CrystalSystem, GammaDynamicalMatrix) {
        let system = CrystalSystem::new(
            [[0.0, 5.3, 5.3], [5.3, 0.0, 5.3], [5.3, 5.3, 0.0]],
            vec![
                AtomSite {
                    element: "Na".to_string(),
                    mass_amu: 22.98977,
                },
                AtomSite {
                    element: "Cl".to_string(),
                    mass_amu: 35.453,
                },
            ],
        )
        .expect("system");
        let k = 0.05;
        let mut phi = DenseRealMatrix::zeros(6, 6);
        for alpha in 0..3 {
            phi[(alpha, alpha)] = k;
            phi[(3 + alpha, 3 + alpha)] = k;
            phi[(alpha, 3 + alpha)] = -k;
            phi[(3 + alpha, alpha)] = -k;
        }
        let solver = GammaDynamicalMatrix::new(phi, system.masses_ry()).expect("solver");
        (system, solver)
    }

    fn born(q: f64) -> BornChargeCache {
        let diag = |value: f64| [[value, 0.0, 0.0], [0.0, value, 0.0], [0.0, 0.0, value]];
        BornChargeCache::new(Some(Box::new(BornCharges::new(
            diag(2.4),
            vec![diag(q), diag(-q)],
        ))))
    }

    fn enabled() -> DielecSettings {
        DielecSettings {
            enabled: true,
            ..DielecSettings::default()
        }
    }

    #[test]
    fn accessors_fail_until_computed() {
        let (system, solver) = rock_salt_like();
        let mut dielec = Dielec::new(enabled(), born(1.1));
        assert_eq!(dielec.state(), DielecState::Uninitialized);
        let error = dielec.omega_grid().expect_err("not computed");
        assert_eq!(error.placeholder(), "RUN.DIELEC_NOT_COMPUTED");
        assert_eq!(error.category(), DielecErrorCategory::Precondition);
        assert!(dielec.run(&solver, &system).is_err());

        dielec
            .init(&SerialComm, &EnergyBounds::new(0.0, 400.0, 1.0))
            .expect("init");
        assert_eq!(dielec.state(), DielecState::Initialized);
        assert!(dielec.born_charges().is_some());
        assert!(dielec.dielectric_tensor().is_err());

        dielec.run(&solver, &system).expect("run");
        assert_eq!(dielec.state(), DielecState::Computed);
        assert_eq!(dielec.omega_grid().expect("grid").nomega(), 400);
        assert_eq!(dielec.dielectric_tensor().expect("tensor").nomega(), 400);
    }

    #[test]
    fn init_without_born_source_is_fatal_when_enabled() {
        let mut dielec = Dielec::new(enabled(), BornChargeCache::unset());
        let error = dielec
            .init(&SerialComm, &EnergyBounds::default())
            .expect_err("unset BORNINFO");
        assert_eq!(error.category(), DielecErrorCategory::Configuration);
        assert_eq!(error.placeholder(), "INPUT.DIELEC_BORNINFO");
        assert!(error.message().contains("BORNINFO must be set when DIELEC = 1."));
        assert_eq!(dielec.state(), DielecState::Uninitialized);
    }

    #[test]
    fn disabled_run_skips_born_charges_and_refuses_to_run() {
        let (system, solver) = rock_salt_like();
        let mut dielec = Dielec::new(DielecSettings::default(), BornChargeCache::unset());
        dielec
            .init(&SerialComm, &EnergyBounds::new(0.0, -1.0, 0.0))
            .expect("disabled init ignores the grid");
        assert!(!dielec.is_enabled());
        let error = dielec.run(&solver, &system).expect_err("disabled");
        assert_eq!(error.placeholder(), "RUN.DIELEC_DISABLED");
    }

    #[test]
    fn mode_charges_work_without_init_and_emit_diagnostics() {
        let (system, solver) = rock_salt_like();
        let recorder = Arc::new(RecordingDiagnostics::new());
        let settings = DielecSettings {
            verbosity: Verbosity::Debug,
            projection_directions: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            ..DielecSettings::default()
        };
        let mut dielec = Dielec::new(settings, born(1.1)).with_diagnostics(recorder.clone());

        let charges = dielec
            .mode_effective_charges(false, &solver, &system)
            .expect("mode charges");
        assert_eq!(charges.mode_count(), 6);
        assert!(charges.charge(3)[0].abs() > 0.1, "first optical mode along x");
        assert!(charges.charge(4)[1].abs() > 0.1, "second optical mode along y");
        assert_eq!(recorder.labels(), vec!["mass_scaled_modes", "mode_charges"]);

        let error = Dielec::new(DielecSettings::default(), BornChargeCache::unset())
            .mode_effective_charges(true, &solver, &system)
            .expect_err("unset BORNINFO");
        assert_eq!(error.placeholder(), "INPUT.DIELEC_BORNINFO");
        assert!(error
            .message()
            .starts_with("Dielec::compute_mode_effective_charge()"));
    }
}
