//! Verbosity-gated diagnostic events.
//!
//! Kernels report intermediate arrays (eigenvalues, mass-scaled eigenvectors,
//! mode charges, oscillator strengths) through a [`DiagnosticHook`]. The
//! default hook forwards them to `tracing`; tests install a recorder.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    Silent,
    #[default]
    Normal,
    Debug,
}

impl Verbosity {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Silent,
            1 => Self::Normal,
            _ => Self::Debug,
        }
    }

    pub const fn level(self) -> u8 {
        match self {
            Self::Silent => 0,
            Self::Normal => 1,
            Self::Debug => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Raw zone-centre eigenvalues and eigenvectors (real, imaginary rows).
    EigenModes {
        eigenvalues: Vec<f64>,
        eigenvectors: Vec<Vec<(f64, f64)>>,
    },
    /// Eigenvectors after division by the square root of the atomic masses.
    MassScaledModes { eigenvectors: Vec<Vec<(f64, f64)>> },
    ModeCharges { charges: Vec<[f64; 3]> },
    /// `S[i][j]` per mode.
    OscillatorStrengths { strengths: Vec<[[f64; 3]; 3]> },
}

impl Diagnostic {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EigenModes { .. } => "eigen_modes",
            Self::MassScaledModes { .. } => "mass_scaled_modes",
            Self::ModeCharges { .. } => "mode_charges",
            Self::OscillatorStrengths { .. } => "oscillator_strengths",
        }
    }
}

pub trait DiagnosticHook: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticHook for TracingDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::EigenModes { eigenvalues, .. } => {
                tracing::debug!(target: "dielec::diagnostics", ?eigenvalues, "zone-centre eigenvalues");
                tracing::trace!(target: "dielec::diagnostics", ?diagnostic, "zone-centre eigenvectors");
            }
            Diagnostic::MassScaledModes { .. } => {
                tracing::trace!(target: "dielec::diagnostics", ?diagnostic, "mass-scaled eigenvectors");
            }
            Diagnostic::ModeCharges { charges } => {
                tracing::debug!(target: "dielec::diagnostics", ?charges, "mode effective charges");
            }
            Diagnostic::OscillatorStrengths { strengths } => {
                tracing::debug!(target: "dielec::diagnostics", ?strengths, "oscillator strengths");
            }
        }
    }
}

/// Keeps every emitted diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.events().iter().map(Diagnostic::label).collect()
    }
}

impl DiagnosticHook for RecordingDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic.clone());
        }
    }
}

/// A hook paired with the verbosity at which it fires.
#[derive(Clone, Copy)]
pub struct DiagnosticGate<'a> {
    hook: &'a dyn DiagnosticHook,
    verbosity: Verbosity,
}

impl<'a> DiagnosticGate<'a> {
    pub fn new(hook: &'a dyn DiagnosticHook, verbosity: Verbosity) -> Self {
        Self { hook, verbosity }
    }

    pub fn enabled(&self) -> bool {
        self.verbosity >= Verbosity::Debug
    }

    /// Builds and emits the event only when debug diagnostics are enabled.
    pub fn emit_with(&self, build: impl FnOnce() -> Diagnostic) {
        if self.enabled() {
            self.hook.emit(&build());
        }
    }
}
