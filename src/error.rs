use std::fmt;

/// Opaque storage-collaborator error, boxed so mock stores and rusqlite share
/// one surface.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub enum PipelineError {
    /// A field the feature contract requires was never answered.
    MissingField(String),
    /// A present value could not be converted to its required type.
    TypeCoercion {
        field: String,
        value: String,
        expected: &'static str,
    },
    /// A value lies outside its domain (Likert 1-5, demographics >= 0).
    RangeValidation { field: String, value: f64 },
    /// The prediction result is missing its probability.
    InvalidModelOutput(String),
    /// The storage collaborator kept failing after the retry budget.
    StorageWrite {
        response_id: String,
        attempts: u32,
        source: StoreError,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingField(field) => {
                write!(f, "required field {field} is missing")
            }
            PipelineError::TypeCoercion {
                field,
                value,
                expected,
            } => {
                write!(f, "cannot convert {field}={value} to {expected}")
            }
            PipelineError::RangeValidation { field, value } => {
                write!(f, "value out of range for {field}: {value}")
            }
            PipelineError::InvalidModelOutput(msg) => {
                write!(f, "invalid model output: {msg}")
            }
            PipelineError::StorageWrite {
                response_id,
                attempts,
                source,
            } => {
                write!(
                    f,
                    "failed to store record {response_id} after {attempts} attempts: {source}"
                )
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::StorageWrite { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
