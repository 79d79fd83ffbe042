//! Physical constants and unit conversions used by the phonon kernels.
//!
//! Internal units are Rydberg atomic units: lengths in Bohr, energies in Ry,
//! masses in units of 2 mₑ, so that the dynamical-matrix eigenvalues are
//! squared angular frequencies in inverse Rydberg time units squared.

pub const PI: f64 = std::f64::consts::PI;

/// One atomic mass unit expressed in Rydberg mass units (2 mₑ).
pub const AMU_RY: f64 = 911.444_243_f64;

/// Rydberg atomic unit of time in seconds.
pub const TIME_RY: f64 = 4.837_768_7e-17_f64;

/// Speed of light in cm/s.
pub const SPEED_OF_LIGHT_CM: f64 = 2.997_924_58e10_f64;

/// Conversion from angular frequency (rad/s) to wavenumbers (cm⁻¹).
pub const HZ_TO_KAYSER: f64 = 1.0 / (2.0 * PI * SPEED_OF_LIGHT_CM);

/// Multiplies a squared wavenumber (cm⁻²) into the squared-frequency units of
/// the dynamical-matrix eigenvalues.
pub const FREQ_CONV_FACTOR: f64 = TIME_RY * TIME_RY / (HZ_TO_KAYSER * HZ_TO_KAYSER);

/// Prefactor numerator of the ionic dielectric sum; e² = 2 in Rydberg units.
pub const OSCILLATOR_PREFACTOR: f64 = 8.0 * PI;

/// Converts an eigenvalue (ω² in Rydberg units) to a signed wavenumber.
/// Imaginary modes come out negative.
pub fn eigenvalue_to_kayser(eigenvalue: f64) -> f64 {
    eigenvalue.signum() * eigenvalue.abs().sqrt() * HZ_TO_KAYSER / TIME_RY
}

/// Converts a wavenumber (cm⁻¹) to the squared-frequency eigenvalue scale.
pub fn kayser_to_eigenvalue(wavenumber: f64) -> f64 {
    wavenumber * wavenumber * FREQ_CONV_FACTOR
}
