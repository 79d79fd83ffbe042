use crate::common::constants::eigenvalue_to_kayser;
use crate::dielectric::ModeEffectiveCharges;
use crate::domain::{DielecError, DielecResult};
use crate::modules::serialization::format_fixed_f64;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ZmodeReport {
    prefix: String,
    frequencies: Vec<f64>,
    raw: ModeEffectiveCharges,
    normalized: ModeEffectiveCharges,
}

impl ZmodeReport {
    pub(super) fn new(
        prefix: &str,
        eigenvalues: &[f64],
        raw: ModeEffectiveCharges,
        normalized: ModeEffectiveCharges,
    ) -> DielecResult<Self> {
        if eigenvalues.len() != raw.mode_count() || raw.mode_count() != normalized.mode_count() {
            return Err(DielecError::internal(
                "SYS.ZMODE_MODES",
                format!(
                    "{} eigenvalues for {} raw and {} normalized mode charges",
                    eigenvalues.len(),
                    raw.mode_count(),
                    normalized.mode_count()
                ),
            ));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            frequencies: eigenvalues.iter().map(|value| eigenvalue_to_kayser(*value)).collect(),
            raw,
            normalized,
        })
    }

    pub(super) fn file_name(&self) -> String {
        format!("{}.zmode", self.prefix)
    }

    pub(super) fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.frequencies.len() + 3);
        lines.push(format!(
            "# Mode effective charges at q = 0 ({}), in e/sqrt(amu)",
            self.prefix
        ));
        lines.push("# Negative frequencies denote imaginary modes.".to_string());
        lines.push(
            "# Mode, Frequency [cm^-1], Z_x, Z_y, Z_z, Z_x/|u|, Z_y/|u|, Z_z/|u|".to_string(),
        );

        for (mode, frequency) in self.frequencies.iter().enumerate() {
            let mut line = format!("{:>6}", mode + 1);
            line.push_str(&format_fixed_f64(*frequency, 14, 4));
            for value in self.raw.charge(mode).iter().chain(&self.normalized.charge(mode)) {
                line.push_str(&format_fixed_f64(*value, 14, 6));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}
