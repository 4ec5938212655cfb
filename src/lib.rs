//! fuzzywash - Mamdani fuzzy inference for washing-machine cycles
//!
//! Turns three crisp measurements of a laundry load (total weight, average
//! dirtiness, maximum fabric delicateness) into four cycle parameters (wash
//! time, water level, spin speed, detergent).
//!
//! # Architecture
//!
//! - [`fuzzy`] - a general Mamdani engine: universes, triangular membership
//!   functions, linguistic variables, rule banks validated at build time,
//!   and a stateless [`InferenceEngine`]
//! - [`washer`] - the washing-machine rule bank, built once per process, and
//!   the request/response types around it
//! - [`config`], [`logging`], [`error`] - the ambient stack
//! - [`server`] - a thin axum adapter
//!
//! # Example
//!
//! ```rust
//! use fuzzywash::{InferenceEngine, WashRequest, Washer};
//!
//! let washer = Washer::shared(InferenceEngine::new()).unwrap();
//! let program = washer.recommend(&WashRequest::new(2.0, 2.0, 2.0)).unwrap();
//!
//! // small, barely dirty, robust load: short wash, fast spin
//! assert!(program.wash_time < 20.0);
//! assert!(program.spin_speed > 1000.0);
//! ```

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod logging;
pub mod server;
pub mod washer;

// Re-export the engine
pub use fuzzy::{
    ClampPolicy, Defuzzified, DefuzzificationMethod, Expr, Fallback, Inference, InferenceEngine,
    LinguisticVariable, MembershipFunction, Rule, RuleBank, Simulation, Universe,
};

// Re-export the washing-machine façade
pub use washer::{
    build_rule_bank, shared_rule_bank, ClothCatalog, ClothItem, LoadSummary, WashProgram,
    WashRequest, Washer,
};

// Re-export configuration types
pub use config::{
    ConfigError, EngineConfig, GeneralConfig, LogLevel, OutputFormat, ServerConfig, WashConfig,
};

// Re-export error types
pub use error::{ErrorCode, ErrorContext, ErrorResponse, WashError, WashResult};
