use thiserror::Error;

/// Errors the engine can report.
///
/// Every variant is a fatal input error: the engine validates everything up
/// front and never produces a partial result. There are no transient faults
/// to retry: the computation is a pure function of its inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Dimensionality or count mismatch between inputs.
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// A cutoff radius that is not a positive finite number.
    #[error("Invalid cutoff radius {value}: cutoffs must be positive and finite")]
    InvalidCutoff { value: f32 },

    /// Zero atoms, zero residues, or an empty target range.
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
}
