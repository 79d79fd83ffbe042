pub mod born;
pub mod common;
pub mod diagnostics;
pub mod dielectric;
pub mod domain;
pub mod modules;
pub mod numerics;
pub mod parallel;
pub mod phonon;
pub mod system;
