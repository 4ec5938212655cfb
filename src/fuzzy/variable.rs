//! Linguistic variables: a named universe plus its terms.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{WashError, WashResult};
use crate::fuzzy::membership::{FuzzyValue, MembershipFunction};
use crate::fuzzy::universe::Universe;

/// Which side of a rule a variable may appear on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Consumes a crisp input
    Antecedent,
    /// Produces an aggregated set that is later defuzzified
    Consequent,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Antecedent => "antecedent",
            VariableKind::Consequent => "consequent",
        }
    }
}

/// A linguistic variable with associated terms.
///
/// Terms keep their registration order so iteration (and anything printed
/// from it) is reproducible.
#[derive(Debug, Clone)]
pub struct LinguisticVariable {
    name: String,
    kind: VariableKind,
    universe: Universe,
    terms: IndexMap<String, MembershipFunction>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, kind: VariableKind, universe: Universe) -> Self {
        Self {
            name: name.into(),
            kind,
            universe,
            terms: IndexMap::new(),
        }
    }

    pub fn antecedent(name: impl Into<String>, universe: Universe) -> Self {
        Self::new(name, VariableKind::Antecedent, universe)
    }

    pub fn consequent(name: impl Into<String>, universe: Universe) -> Self {
        Self::new(name, VariableKind::Consequent, universe)
    }

    /// Register a term; names must be unique per variable.
    pub fn add_term(
        &mut self,
        name: impl Into<String>,
        membership: MembershipFunction,
    ) -> WashResult<()> {
        let name = name.into();
        if self.terms.contains_key(&name) {
            return Err(WashError::duplicate_term(&self.name, &name));
        }
        self.terms.insert(name, membership);
        Ok(())
    }

    /// Builder form of [`add_term`](Self::add_term) for a triangle `[a, b, c]`
    pub fn with_trimf(mut self, name: &str, a: f64, b: f64, c: f64) -> WashResult<Self> {
        let mf = MembershipFunction::triangular(a, b, c).map_err(|e| {
            e.with_context("variable", self.name.as_str())
                .with_context("term", name)
        })?;
        self.add_term(name, mf)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn term_names(&self) -> Vec<&str> {
        self.terms.keys().map(String::as_str).collect()
    }

    /// Look up a term; an undefined name is a configuration fault
    pub fn term(&self, term: &str) -> WashResult<&MembershipFunction> {
        self.terms
            .get(term)
            .ok_or_else(|| WashError::unknown_term(&self.name, term))
    }

    /// Membership of `value` in a single term
    pub fn membership(&self, term: &str, value: f64) -> WashResult<FuzzyValue> {
        self.term(term).map(|mf| mf.evaluate(value))
    }

    /// Fuzzify a crisp value - get membership for all terms
    pub fn fuzzify(&self, value: f64) -> IndexMap<String, FuzzyValue> {
        self.terms
            .iter()
            .map(|(name, mf)| (name.clone(), mf.evaluate(value)))
            .collect()
    }
}
