use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeamError {
    #[error("Invalid strength key: {0}")]
    InvalidKey(String),

    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("Unknown integrator type: {0}")]
    UnknownIntegratorType(String),

    #[error("Unknown interpolator type: {0}")]
    UnknownInterpolatorType(String),

    #[error("Unknown array reflection type: {0}")]
    UnknownReflectionType(String),

    #[error("Unknown field map format: {0}")]
    UnknownFieldFormat(String),

    #[error("Interpolator {interpolator} requires a {expected}D array, got {found}D")]
    InterpolatorMismatch {
        interpolator: String,
        expected: usize,
        found: usize,
    },

    #[error("Dimension mismatch for {name}: expected {expected}, found {found}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Field \"{0}\" refers to itself as a sub-field")]
    SelfReference(String),

    #[error("Unknown field name: \"{0}\"")]
    UnknownFieldName(String),

    #[error("Malformed field map {path}: {message}")]
    FieldMapFormat { path: String, message: String },

    #[error("Field map file not found: {0}")]
    MissingFile(String),

    #[error("Integrator {integrator} is not suitable for field {field}: {reason}")]
    UnsuitableIntegrator {
        integrator: String,
        field: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BeamResult<T> = Result<T, BeamError>;
