use super::BornCharges;
use crate::domain::{DielecError, DielecResult};
use crate::numerics::Matrix3;

/// Parses a BORNINFO document.
///
/// Layout: three rows of the electronic dielectric tensor ε∞, followed by
/// three rows per atom of the Born effective-charge tensor `Z[atom][i][j]`.
/// Blank lines and lines starting with `#` are ignored.
pub(super) fn parse_borninfo_source(source_label: &str, content: &str) -> DielecResult<BornCharges> {
    let mut rows: Vec<[f64; 3]> = Vec::new();

    for (line_index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(DielecError::configuration(
                "INPUT.BORNINFO_PARSE",
                format!(
                    "{}:{}: expected three numbers per row, found {}",
                    source_label,
                    line_index + 1,
                    tokens.len()
                ),
            ));
        }

        let mut row = [0.0; 3];
        for (component, token) in tokens.iter().take(3).enumerate() {
            row[component] = parse_number(token).ok_or_else(|| {
                DielecError::configuration(
                    "INPUT.BORNINFO_PARSE",
                    format!(
                        "{}:{}: invalid number '{}'",
                        source_label,
                        line_index + 1,
                        token
                    ),
                )
            })?;
        }
        rows.push(row);
    }

    if rows.len() < 6 || rows.len() % 3 != 0 {
        return Err(DielecError::configuration(
            "INPUT.BORNINFO_PARSE",
            format!(
                "{}: expected 3 dielectric rows plus 3 rows per atom, found {} rows",
                source_label,
                rows.len()
            ),
        ));
    }

    let mut blocks = rows.chunks_exact(3).map(|block| -> Matrix3 {
        [block[0], block[1], block[2]]
    });
    let epsilon_infinity = blocks.next().unwrap_or([[0.0; 3]; 3]);
    let charges: Vec<Matrix3> = blocks.collect();

    Ok(BornCharges::new(epsilon_infinity, charges))
}

/// Accepts Fortran-style `D` exponents as well as the usual `E`.
fn parse_number(token: &str) -> Option<f64> {
    let normalized = token.replace(['D', 'd'], "e");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
