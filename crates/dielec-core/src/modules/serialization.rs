use std::fs;
use std::path::Path;

pub fn format_fixed_f64(value: f64, width: usize, precision: usize) -> String {
    format!(
        "{value:>width$.precision$}",
        width = width,
        precision = precision
    )
}

/// Right-aligned scientific notation, e.g. `  1.234560E-03`.
/// Non-finite values render as `inf`, `-inf` or `nan`.
pub fn format_scientific_f64(value: f64, width: usize, precision: usize) -> String {
    if !value.is_finite() {
        let rendered = if value.is_nan() {
            "nan"
        } else if value > 0.0 {
            "inf"
        } else {
            "-inf"
        };
        return format!("{rendered:>width$}", width = width);
    }
    let formatted = format!("{value:.precision$E}", precision = precision);
    let (mantissa, exponent) = formatted.split_once('E').unwrap_or((formatted.as_str(), "0"));
    let exponent = exponent.parse::<i32>().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let rendered = format!("{mantissa}E{sign}{:02}", exponent.abs());
    format!("{rendered:>width$}", width = width)
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}
