//! Error types for factsnap-measurement

use thiserror::Error;

use crate::measurement::MeasurementType;
use crate::reading::ReadingKind;

/// Errors that can occur while building, querying, comparing or decoding measurements
#[derive(Error, Debug)]
pub enum MeasurementError {
    /// Subtype has no data
    #[error("empty data")]
    EmptyData,

    /// Measurement has no subtypes
    #[error("measurement has no subtypes")]
    NoSubtypes,

    /// A subtype inside a measurement failed validation
    #[error("subtype {index} ({name:?}) is invalid: {source}")]
    InvalidSubtype {
        /// Position in the measurement
        index: usize,
        /// Subtype name
        name: String,
        /// Underlying validation error
        #[source]
        source: Box<MeasurementError>,
    },

    /// Requested key is absent from the subtype
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Stored reading does not hold the requested type
    #[error("wrong type for key {key}: expected {expected}, got {actual}")]
    WrongType {
        /// Requested key
        key: String,
        /// Requested kind
        expected: ReadingKind,
        /// Kind actually stored
        actual: ReadingKind,
    },

    /// Measurements of different types cannot be compared or merged
    #[error(
        "measurement type mismatch: {old_type} ({old_subtypes} subtypes) vs {new_type} ({new_subtypes} subtypes)"
    )]
    TypeMismatch {
        /// Type of the old (or receiving) measurement
        old_type: MeasurementType,
        /// Subtype count of the old measurement
        old_subtypes: usize,
        /// Type of the new (or incoming) measurement
        new_type: MeasurementType,
        /// Subtype count of the new measurement
        new_subtypes: usize,
    },

    /// Measurement type name is not one of the known categories
    #[error("unknown measurement type: {0}")]
    UnknownType(String),

    /// JSON has no representation for NaN or infinity
    #[error("non-finite float in subtype {subtype:?} key {key}: {value}")]
    NonFiniteFloat {
        /// Subtype name
        subtype: String,
        /// Data key
        key: String,
        /// Offending value
        value: f64,
    },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Policy file could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Policy file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MeasurementError {
    /// Check if error comes from a `validate` call
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MeasurementError::EmptyData
                | MeasurementError::NoSubtypes
                | MeasurementError::InvalidSubtype { .. }
        )
    }

    /// Check if error comes from a typed getter
    #[must_use]
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            MeasurementError::KeyNotFound(_) | MeasurementError::WrongType { .. }
        )
    }
}

/// Result type for measurement operations
pub type Result<T> = std::result::Result<T, MeasurementError>;
