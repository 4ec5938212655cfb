//! Structured Error Handling for fuzzywash
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error responses (JSON-friendly)
//! - Context preservation through error chains
//! - HTTP status code mapping
//!
//! # Error Categories
//!
//! - Configuration faults - a malformed rule bank, variable or universe.
//!   These surface while the engine is being built, never during inference.
//! - Validation faults - a request-scoped value the engine cannot use
//!   (missing antecedent, NaN input, empty load).
//! - Catalog faults - lookups in the in-memory cloth catalog.
//! - Config file faults - problems loading `fuzzywash.toml`.
//!
//! # Example
//!
//! ```rust
//! use fuzzywash::error::{WashError, ErrorCode};
//!
//! fn check_load(load: f64) -> Result<(), WashError> {
//!     if !load.is_finite() {
//!         return Err(WashError::non_finite_input("load", load)
//!             .with_hint("Pass the total weight in kilograms"));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(check_load(f64::NAN).unwrap_err().code, ErrorCode::NonFiniteInput);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration faults (1xxx)
    /// Generic configuration fault in the fuzzy model
    ModelError = 1000,
    /// A rule references a variable that was never registered
    UnknownVariable = 1001,
    /// A rule or lookup references a term the variable does not define
    UnknownTerm = 1002,
    /// Two variables registered under the same name
    DuplicateVariable = 1003,
    /// Two terms registered under the same name on one variable
    DuplicateTerm = 1004,
    /// Universe bounds or step are not usable
    InvalidUniverse = 1005,
    /// Membership function parameters are not ordered or not finite
    InvalidMembership = 1006,
    /// A rule assigns no consequent
    EmptyConsequents = 1007,
    /// An antecedent used as a consequent or vice versa
    WrongVariableKind = 1008,

    // Catalog errors (3xxx)
    /// Generic catalog error
    CatalogError = 3000,
    /// Cloth id not present in the catalog
    ClothNotFound = 3001,

    // Validation errors (5xxx)
    /// Generic validation error
    ValidationError = 5000,
    /// A required antecedent input was not supplied
    MissingInput = 5001,
    /// Input is NaN or infinite
    NonFiniteInput = 5002,
    /// Load aggregation over zero garments
    EmptyLoad = 5003,
    /// Value outside its accepted range
    InvalidValue = 5004,
    /// Output requested that has not been computed
    UnknownOutput = 5005,
    /// Invalid request format
    InvalidFormat = 5006,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Invalid config value
    InvalidConfigValue = 7003,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ModelError => "Fuzzy model error",
            ErrorCode::UnknownVariable => "Unknown linguistic variable",
            ErrorCode::UnknownTerm => "Unknown linguistic term",
            ErrorCode::DuplicateVariable => "Duplicate linguistic variable",
            ErrorCode::DuplicateTerm => "Duplicate linguistic term",
            ErrorCode::InvalidUniverse => "Invalid universe of discourse",
            ErrorCode::InvalidMembership => "Invalid membership function",
            ErrorCode::EmptyConsequents => "Rule has no consequents",
            ErrorCode::WrongVariableKind => "Variable used with the wrong kind",

            ErrorCode::CatalogError => "Catalog error",
            ErrorCode::ClothNotFound => "Cloth not found",

            ErrorCode::ValidationError => "Validation error",
            ErrorCode::MissingInput => "Missing input value",
            ErrorCode::NonFiniteInput => "Input is not a finite number",
            ErrorCode::EmptyLoad => "Load contains no garments",
            ErrorCode::InvalidValue => "Invalid value",
            ErrorCode::UnknownOutput => "Unknown or uncomputed output",
            ErrorCode::InvalidFormat => "Invalid format",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether this code belongs to the fatal configuration-fault class
    pub fn is_model_fault(&self) -> bool {
        (1000..2000).contains(&self.code())
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::MissingInput
            | ErrorCode::NonFiniteInput
            | ErrorCode::EmptyLoad
            | ErrorCode::InvalidValue
            | ErrorCode::UnknownOutput
            | ErrorCode::InvalidFormat => 400,

            ErrorCode::ClothNotFound | ErrorCode::ConfigNotFound => 404,

            ErrorCode::ModelError
            | ErrorCode::UnknownVariable
            | ErrorCode::UnknownTerm
            | ErrorCode::DuplicateVariable
            | ErrorCode::DuplicateTerm
            | ErrorCode::InvalidUniverse
            | ErrorCode::InvalidMembership
            | ErrorCode::EmptyConsequents
            | ErrorCode::WrongVariableKind
            | ErrorCode::CatalogError
            | ErrorCode::ConfigError
            | ErrorCode::InvalidConfigSyntax
            | ErrorCode::InvalidConfigValue
            | ErrorCode::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for fuzzywash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WashError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl WashError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods: configuration faults
    // ========================================================================

    /// A rule or lookup names a variable that does not exist
    pub fn unknown_variable(variable: &str) -> Self {
        Self::new(
            ErrorCode::UnknownVariable,
            format!("Linguistic variable '{}' is not defined", variable),
        )
        .with_context("variable", variable)
    }

    /// A rule or lookup names a term the variable does not define
    pub fn unknown_term(variable: &str, term: &str) -> Self {
        Self::new(
            ErrorCode::UnknownTerm,
            format!("Variable '{}' has no term '{}'", variable, term),
        )
        .with_context("variable", variable)
        .with_context("term", term)
    }

    pub fn duplicate_variable(variable: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateVariable,
            format!("Linguistic variable '{}' is registered twice", variable),
        )
    }

    pub fn duplicate_term(variable: &str, term: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateTerm,
            format!("Variable '{}' already defines term '{}'", variable, term),
        )
    }

    pub fn invalid_universe(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidUniverse, message)
    }

    pub fn invalid_membership(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMembership, message)
    }

    // ========================================================================
    // Factory methods: request-scoped faults
    // ========================================================================

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// An antecedent had no crisp value at compute time
    pub fn missing_input(variable: &str) -> Self {
        Self::new(
            ErrorCode::MissingInput,
            format!("No crisp input supplied for '{}'", variable),
        )
        .with_context("variable", variable)
    }

    pub fn non_finite_input(variable: &str, value: f64) -> Self {
        Self::new(
            ErrorCode::NonFiniteInput,
            format!("Input '{}' must be a finite number, got {}", variable, value),
        )
        .with_context("variable", variable)
    }

    pub fn empty_load() -> Self {
        Self::new(ErrorCode::EmptyLoad, "A load needs at least one garment")
    }

    /// A value fell outside `[min, max]`
    pub fn out_of_range(field: &str, value: f64, min: f64, max: f64) -> Self {
        Self::new(
            ErrorCode::InvalidValue,
            format!("{} must be between {} and {}, got {}", field, min, max, value),
        )
        .with_context("field", field)
    }

    pub fn unknown_output(variable: &str) -> Self {
        Self::new(
            ErrorCode::UnknownOutput,
            format!("Output '{}' has not been computed", variable),
        )
    }

    pub fn cloth_not_found(id: u64) -> Self {
        Self::new(ErrorCode::ClothNotFound, format!("Cloth {} not found", id))
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Check if this error means the fuzzy model itself is malformed
    pub fn is_model_fault(&self) -> bool {
        self.code.is_model_fault()
    }
}

impl fmt::Display for WashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for WashError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for WashError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::ConfigNotFound,
            _ => ErrorCode::InternalError,
        };
        WashError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for WashError {
    fn from(err: serde_json::Error) -> Self {
        WashError::validation(err.to_string())
            .with_code(ErrorCode::InvalidFormat)
            .with_context("format", "JSON")
    }
}

impl From<toml::de::Error> for WashError {
    fn from(err: toml::de::Error) -> Self {
        WashError::config(err.to_string()).with_code(ErrorCode::InvalidConfigSyntax)
    }
}

impl From<crate::config::ConfigError> for WashError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        let code = match &err {
            ConfigError::IoError(..) => ErrorCode::ConfigNotFound,
            ConfigError::ParseError(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::SerializeError(_) => ErrorCode::ConfigError,
        };
        WashError::new(code, err.to_string())
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using WashError
pub type WashResult<T> = Result<T, WashError>;

// ============================================================================
// Error response for HTTP APIs
// ============================================================================

/// Structured error response for HTTP APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator
    pub error: bool,
    /// Error code (string form)
    pub code: String,
    /// Numeric error code
    pub code_num: u32,
    /// HTTP status code
    pub status: u16,
    /// Error message
    pub message: String,
    /// Additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    /// Hint for resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&WashError> for ErrorResponse {
    fn from(err: &WashError) -> Self {
        Self {
            error: true,
            code: format!("{:?}", err.code),
            code_num: err.code.code(),
            status: err.http_status(),
            message: err.message.clone(),
            details: err.context.as_ref().map(|c| c.fields.clone()),
            hint: err.hint.clone(),
        }
    }
}

impl From<WashError> for ErrorResponse {
    fn from(err: WashError) -> Self {
        Self::from(&err)
    }
}

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a WashError with context from the current location
#[macro_export]
macro_rules! wash_error {
    ($code:expr, $msg:expr) => {
        $crate::error::WashError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::WashError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! wash_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::wash_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::wash_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! wash_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::wash_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::wash_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
