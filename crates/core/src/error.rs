use serde::Serialize;
use thiserror::Error;

use crate::path::FieldPath;

/// A single problem found while building or validating a resource.
///
/// `MissingRequiredField` and `TypeMismatch` come from construction and abort
/// it; the remaining kinds are produced by cross-field validation and are
/// reported in batches (see [`Violations`]).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    #[error("{path}: required field is missing")]
    MissingRequiredField { path: FieldPath },

    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: String,
        found: String,
    },

    #[error("{path}: '{name}' does not name a replicated job")]
    ReferentialIntegrityViolation { path: FieldPath, name: String },

    #[error("{path}: duplicate name '{name}'")]
    UniquenessViolation { path: FieldPath, name: String },

    #[error("{path}: {message}")]
    RangeViolation { path: FieldPath, message: String },
}

impl ValidationError {
    pub fn missing(path: FieldPath) -> Self {
        Self::MissingRequiredField { path }
    }

    pub fn mismatch(path: FieldPath, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn dangling(path: FieldPath, name: impl Into<String>) -> Self {
        Self::ReferentialIntegrityViolation {
            path,
            name: name.into(),
        }
    }

    pub fn duplicate(path: FieldPath, name: impl Into<String>) -> Self {
        Self::UniquenessViolation {
            path,
            name: name.into(),
        }
    }

    pub fn range(path: FieldPath, message: impl Into<String>) -> Self {
        Self::RangeViolation {
            path,
            message: message.into(),
        }
    }

    /// Path of the offending field
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::MissingRequiredField { path }
            | Self::TypeMismatch { path, .. }
            | Self::ReferentialIntegrityViolation { path, .. }
            | Self::UniquenessViolation { path, .. }
            | Self::RangeViolation { path, .. } => path,
        }
    }

    /// Stable name of the error kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingRequiredField { .. } => "MissingRequiredField",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::ReferentialIntegrityViolation { .. } => "ReferentialIntegrityViolation",
            Self::UniquenessViolation { .. } => "UniquenessViolation",
            Self::RangeViolation { .. } => "RangeViolation",
        }
    }
}

/// Every violation found in one validation pass, in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[serde(transparent)]
#[error("{} violation(s): {}", .0.len(), summary(.0))]
pub struct Violations(Vec<ValidationError>);

fn summary(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }

    /// `Ok(())` when nothing was collected, otherwise the whole batch.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<Vec<ValidationError>> for Violations {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for Violations {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
