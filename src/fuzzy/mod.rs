//! Mamdani fuzzy inference.
//!
//! The pieces, leaves first:
//!
//! - [`Universe`] - a bounded, evenly sampled domain
//! - [`MembershipFunction`] - a triangle over the reals, degree in [0, 1]
//! - [`LinguisticVariable`] - a universe plus named terms
//! - [`Rule`] / [`RuleBank`] - IF/THEN rules, validated once at build time
//! - [`InferenceEngine`] - fuzzify, fire, implicate (min), aggregate (max),
//!   defuzzify
//! - [`Simulation`] - per-request inputs and outputs
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use fuzzywash::fuzzy::{Expr, InferenceEngine, LinguisticVariable, Rule, RuleBank, Universe};
//!
//! # fn main() -> fuzzywash::error::WashResult<()> {
//! let bank = RuleBank::builder()
//!     .variable(
//!         LinguisticVariable::antecedent("temp", Universe::new(0.0, 40.0, 1.0)?)
//!             .with_trimf("cold", 0.0, 0.0, 20.0)?
//!             .with_trimf("hot", 20.0, 40.0, 40.0)?,
//!     )
//!     .variable(
//!         LinguisticVariable::consequent("fan", Universe::new(0.0, 10.0, 1.0)?)
//!             .with_trimf("slow", 0.0, 0.0, 5.0)?
//!             .with_trimf("fast", 5.0, 10.0, 10.0)?,
//!     )
//!     .rule(Rule::new(Expr::is("temp", "cold")).then("fan", "slow"))
//!     .rule(Rule::new(Expr::is("temp", "hot")).then("fan", "fast"))
//!     .build()?;
//!
//! let inputs = HashMap::from([("temp".to_string(), 35.0)]);
//! let result = InferenceEngine::new().compute(&bank, &inputs)?;
//! assert!(result.output("fan").unwrap() > 5.0);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod membership;
pub mod rule;
pub mod simulation;
pub mod universe;
pub mod variable;

pub use engine::{
    ClampPolicy, Defuzzified, DefuzzificationMethod, Fallback, Inference, InferenceEngine,
    RuleActivation,
};
pub use membership::{FuzzyValue, MembershipFunction};
pub use rule::{Consequent, Expr, Rule, RuleBank, RuleBankBuilder};
pub use simulation::Simulation;
pub use universe::Universe;
pub use variable::{LinguisticVariable, VariableKind};
