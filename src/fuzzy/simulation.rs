//! Per-request inference session.

use std::collections::HashMap;

use crate::error::{WashError, WashResult};
use crate::fuzzy::engine::{Inference, InferenceEngine};
use crate::fuzzy::rule::RuleBank;

/// Crisp inputs for one request and, after [`compute`](Self::compute), the
/// crisp outputs.
///
/// Borrows the bank read-only; create one per request and drop it once the
/// outputs have been read.
#[derive(Debug)]
pub struct Simulation<'a> {
    bank: &'a RuleBank,
    inputs: HashMap<String, f64>,
    inference: Option<Inference>,
}

impl<'a> Simulation<'a> {
    pub fn new(bank: &'a RuleBank) -> Self {
        Self {
            bank,
            inputs: HashMap::with_capacity(bank.input_count()),
            inference: None,
        }
    }

    /// Set an antecedent value. Invalidates any previous outputs.
    pub fn set_input(&mut self, name: &str, value: f64) -> WashResult<()> {
        if self.bank.input(name).is_none() {
            return Err(WashError::unknown_variable(name)
                .with_code(crate::error::ErrorCode::InvalidValue)
                .with_hint(format!(
                    "Known inputs: {}",
                    self.bank.inputs().map(|v| v.name()).collect::<Vec<_>>().join(", ")
                )));
        }
        self.inputs.insert(name.to_string(), value);
        self.inference = None;
        Ok(())
    }

    /// Builder form of [`set_input`](Self::set_input)
    pub fn with_input(mut self, name: &str, value: f64) -> WashResult<Self> {
        self.set_input(name, value)?;
        Ok(self)
    }

    pub fn input(&self, name: &str) -> Option<f64> {
        self.inputs.get(name).copied()
    }

    pub fn compute(&mut self, engine: &InferenceEngine) -> WashResult<&Inference> {
        let inference = engine.compute(self.bank, &self.inputs)?;
        Ok(self.inference.insert(inference))
    }

    pub fn inference(&self) -> Option<&Inference> {
        self.inference.as_ref()
    }

    /// Crisp value of a consequent; fails until `compute` has run
    pub fn output(&self, name: &str) -> WashResult<f64> {
        self.inference
            .as_ref()
            .and_then(|inference| inference.output(name))
            .ok_or_else(|| WashError::unknown_output(name))
    }
}
