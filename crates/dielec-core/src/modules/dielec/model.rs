use crate::dielectric::{Dielec, DielectricTensor};
use crate::domain::{DielecError, DielecResult};
use crate::modules::serialization::{format_fixed_f64, format_scientific_f64};
use crate::numerics::Matrix3;

const COMPONENT_LABELS: [&str; 9] = [
    "xx", "xy", "xz", "yx", "yy", "yz", "zx", "zy", "zz",
];

/// Everything the coordinating participant needs to render `<prefix>.dielec`.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct DielecReport {
    prefix: String,
    epsilon_infinity: Matrix3,
    omega: Vec<f64>,
    tensor: DielectricTensor,
}

impl DielecReport {
    pub(super) fn from_dielec(prefix: &str, dielec: &Dielec) -> DielecResult<Self> {
        let epsilon_infinity = dielec
            .born_charges()
            .map(|born| *born.epsilon_infinity())
            .ok_or_else(|| {
                DielecError::internal(
                    "SYS.DIELEC_BORN_CHARGES",
                    "Born charges were not loaded during the DIELEC run",
                )
            })?;
        Ok(Self {
            prefix: prefix.to_string(),
            epsilon_infinity,
            omega: dielec.omega_grid()?.values().to_vec(),
            tensor: dielec.dielectric_tensor()?.clone(),
        })
    }

    pub(super) fn file_name(&self) -> String {
        format!("{}.dielec", self.prefix)
    }

    pub(super) fn tensor(&self) -> &DielectricTensor {
        &self.tensor
    }

    pub(super) fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.omega.len() + 7);
        lines.push(format!(
            "# Ionic contribution to the dielectric tensor at q = 0 ({})",
            self.prefix
        ));
        lines.push("# Electronic dielectric tensor (epsilon_infinity):".to_string());
        for row in &self.epsilon_infinity {
            lines.push(format!(
                "#{}",
                row.iter()
                    .map(|value| format_fixed_f64(*value, 12, 6))
                    .collect::<String>()
            ));
        }
        lines.push(format!(
            "# Omega [cm^-1], {}",
            COMPONENT_LABELS
                .iter()
                .map(|label| format!("eps_{label}"))
                .collect::<Vec<_>>()
                .join(", ")
        ));

        for (k, omega) in self.omega.iter().enumerate() {
            let mut line = format_fixed_f64(*omega, 12, 4);
            for value in self.tensor.at(k).iter().flatten() {
                line.push_str(&format_scientific_f64(*value, 16, 7));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}
