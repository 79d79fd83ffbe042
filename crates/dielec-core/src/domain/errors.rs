use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DielecResult<T> = Result<T, DielecError>;

/// Failure classes of a dielectric run. Every class is fatal for the whole
/// process group; there is no recoverable or per-participant failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DielecErrorCategory {
    /// A required input is missing or malformed (Born-charge source unset,
    /// unreadable deck, bad command line).
    Configuration,
    /// Reading or writing a file failed.
    Io,
    /// A numerical kernel failed, e.g. an eigensolver that did not converge.
    Numerical,
    /// Broken internal invariant; never caused by user input.
    Internal,
    /// An operation was called with arguments or in a state it does not
    /// accept: non-positive grid step, empty grid, accessor before `run`.
    Precondition,
}

impl DielecErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Configuration => 2,
            Self::Io => 3,
            Self::Numerical => 4,
            Self::Internal => 5,
            Self::Precondition => 6,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Configuration => "configuration error",
            Self::Io => "I/O error",
            Self::Numerical => "numerical error",
            Self::Internal => "internal error",
            Self::Precondition => "precondition violation",
        }
    }
}

/// Fatal diagnostic shared by every participant of a run.
///
/// `placeholder` is a stable identifier of the failing call site
/// (`INPUT.DIELEC_BORNINFO`, `RUN.DIELEC_NOT_COMPUTED`, ...) so that scripts
/// can match on it without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DielecError {
    category: DielecErrorCategory,
    placeholder: Cow<'static, str>,
    message: String,
}

impl DielecError {
    pub fn new(
        category: DielecErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder: Cow::Borrowed(placeholder),
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DielecErrorCategory::Configuration, placeholder, message)
    }

    pub fn io(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DielecErrorCategory::Io, placeholder, message)
    }

    pub fn numerical(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DielecErrorCategory::Numerical, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DielecErrorCategory::Internal, placeholder, message)
    }

    pub fn precondition(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DielecErrorCategory::Precondition, placeholder, message)
    }

    pub const fn category(&self) -> DielecErrorCategory {
        self.category
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for DielecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for DielecError {}

#[cfg(test)]
mod tests {
    use super::{DielecError, DielecErrorCategory};

    #[test]
    fn every_category_has_a_distinct_nonzero_exit_code() {
        let categories = [
            DielecErrorCategory::Configuration,
            DielecErrorCategory::Io,
            DielecErrorCategory::Numerical,
            DielecErrorCategory::Internal,
            DielecErrorCategory::Precondition,
        ];
        let codes: Vec<i32> = categories.iter().map(|category| category.exit_code()).collect();

        assert_eq!(codes, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn configuration_error_renders_call_site_and_requirement() {
        let error = DielecError::configuration(
            "INPUT.DIELEC_BORNINFO",
            "Dielec::init(): BORNINFO must be set when DIELEC = 1.",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.DIELEC_BORNINFO] Dielec::init(): BORNINFO must be set when DIELEC = 1."
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
    }

    #[test]
    fn display_names_the_failure_class() {
        let error = DielecError::precondition("INPUT.DIELEC_GRID", "delta_e must be positive");
        assert_eq!(
            error.to_string(),
            "precondition violation [INPUT.DIELEC_GRID] delta_e must be positive"
        );
    }

    #[test]
    fn errors_survive_a_json_round_trip() {
        let error = DielecError::numerical("RUN.PHONON_EIGEN", "no convergence");
        let bytes = serde_json::to_vec(&error).expect("serialize");
        let decoded: DielecError = serde_json::from_slice(&bytes).expect("deserialize");

        assert_eq!(decoded, error);
        assert_eq!(decoded.placeholder(), "RUN.PHONON_EIGEN");
    }
}
