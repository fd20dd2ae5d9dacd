//! Error types for format construction and unit resolution.
//!
//! Format construction reports exactly one kind of failure,
//! [`FormatError::InvalidJson`], always carrying the name of the format and a
//! message naming the offending attribute. Errors raised by a units authority
//! are expressed as [`UnitsError`] and folded into `InvalidJson` when they
//! happen while a format is being built.

/// Result type for format operations
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised by a [`UnitsProvider`](crate::units::UnitsProvider).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitsError {
    /// No unit is registered under the requested name.
    #[error("Unit not found: {0}")]
    NotFound(String),

    /// The unit exists but is flagged as unusable.
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    /// The two units measure different phenomena.
    #[error("Incompatible units: cannot convert '{from}' to '{to}'")]
    IncompatibleUnits { from: String, to: String },

    /// A unit registry could not be read or parsed.
    #[error("Registry configuration error: {0}")]
    Configuration(String),
}

/// Error type for format operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// The raw configuration violates a format rule.
    ///
    /// This is the only error a format construction ever returns.
    #[error("Invalid JSON for format '{format_name}': {message}")]
    InvalidJson {
        format_name: String,
        message: String,
    },

    /// A units authority failed while preparing a formatter.
    #[error("Units error: {0}")]
    Units(#[from] UnitsError),

    /// Configuration file or TOML content is unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FormatError {
    /// Create an `InvalidJson` error for the named format.
    pub fn invalid_json(format_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidJson {
            format_name: format_name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` for the `InvalidJson` variant.
    pub fn is_invalid_json(&self) -> bool {
        matches!(self, Self::InvalidJson { .. })
    }

    /// Name of the format the error refers to, if any.
    pub fn format_name(&self) -> Option<&str> {
        match self {
            Self::InvalidJson { format_name, .. } => Some(format_name),
            _ => None,
        }
    }
}
