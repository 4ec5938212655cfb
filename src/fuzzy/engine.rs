//! Mamdani inference: clamp → fire rules → min-implicate → max-aggregate →
//! defuzzify.
//!
//! [`InferenceEngine`] holds only options. Every call to
//! [`compute`](InferenceEngine::compute) allocates its own working buffers and
//! reads the [`RuleBank`] through a shared reference, so one bank can serve
//! any number of concurrent callers.

use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{WashError, WashResult};
use crate::fuzzy::membership::FuzzyValue;
use crate::fuzzy::rule::RuleBank;
use crate::fuzzy::universe::Universe;

/// How crisp inputs are brought into their antecedent universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClampPolicy {
    /// Cap at the universe maximum; values below the minimum pass through
    #[default]
    Upper,
    /// Clamp to `[min, max]`
    Symmetric,
}

impl ClampPolicy {
    pub fn apply(&self, value: f64, universe: &Universe) -> f64 {
        match self {
            ClampPolicy::Upper => value.min(universe.max()),
            ClampPolicy::Symmetric => value.clamp(universe.min(), universe.max()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClampPolicy::Upper => "upper",
            ClampPolicy::Symmetric => "symmetric",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "upper" | "upper-only" | "cap" => Some(ClampPolicy::Upper),
            "symmetric" | "both" | "full" => Some(ClampPolicy::Symmetric),
            _ => None,
        }
    }
}

/// Defuzzification method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefuzzificationMethod {
    /// Center of Gravity over the sample points
    #[default]
    Centroid,
    /// First sample where the cumulative mass reaches half the total
    Bisector,
    /// Mean of Maximum
    Mom,
    /// Smallest of Maximum
    Som,
    /// Largest of Maximum
    Lom,
}

impl DefuzzificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefuzzificationMethod::Centroid => "centroid",
            DefuzzificationMethod::Bisector => "bisector",
            DefuzzificationMethod::Mom => "mom",
            DefuzzificationMethod::Som => "som",
            DefuzzificationMethod::Lom => "lom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "centroid" | "cog" => Some(DefuzzificationMethod::Centroid),
            "bisector" => Some(DefuzzificationMethod::Bisector),
            "mom" | "mean-of-maximum" => Some(DefuzzificationMethod::Mom),
            "som" | "smallest-of-maximum" => Some(DefuzzificationMethod::Som),
            "lom" | "largest-of-maximum" => Some(DefuzzificationMethod::Lom),
            _ => None,
        }
    }

    /// Crisp value of `membership` sampled at `points`, or `None` when the
    /// set carries no mass.
    pub fn defuzzify(&self, points: &[f64], membership: &[f64]) -> Option<f64> {
        let total: f64 = membership.iter().sum();
        if total <= 0.0 {
            return None;
        }

        let pairs = || points.iter().copied().zip(membership.iter().copied());

        match self {
            DefuzzificationMethod::Centroid => {
                let numerator: f64 = pairs().map(|(x, m)| x * m).sum();
                Some(numerator / total)
            }
            DefuzzificationMethod::Bisector => {
                let half = total / 2.0;
                let mut cumulative = 0.0;
                for (x, m) in pairs() {
                    cumulative += m;
                    if cumulative >= half {
                        return Some(x);
                    }
                }
                points.last().copied()
            }
            DefuzzificationMethod::Mom
            | DefuzzificationMethod::Som
            | DefuzzificationMethod::Lom => {
                let peak = membership.iter().copied().fold(0.0, f64::max);
                let maxima: Vec<f64> = pairs()
                    .filter(|&(_, m)| (m - peak).abs() < f64::EPSILON)
                    .map(|(x, _)| x)
                    .collect();
                match self {
                    DefuzzificationMethod::Som => maxima.first().copied(),
                    DefuzzificationMethod::Lom => maxima.last().copied(),
                    _ if maxima.is_empty() => None,
                    _ => Some(maxima.iter().sum::<f64>() / maxima.len() as f64),
                }
            }
        }
    }
}

/// Crisp value reported when an aggregated set has zero mass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    /// `(min + max) / 2` of the consequent universe
    #[default]
    Midpoint,
    /// Universe minimum
    Minimum,
    /// Universe maximum
    Maximum,
}

impl Fallback {
    pub fn value_for(&self, universe: &Universe) -> f64 {
        match self {
            Fallback::Midpoint => universe.midpoint(),
            Fallback::Minimum => universe.min(),
            Fallback::Maximum => universe.max(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Fallback::Midpoint => "midpoint",
            Fallback::Minimum => "minimum",
            Fallback::Maximum => "maximum",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "midpoint" | "mid" => Some(Fallback::Midpoint),
            "minimum" | "min" => Some(Fallback::Minimum),
            "maximum" | "max" => Some(Fallback::Maximum),
            _ => None,
        }
    }
}

/// A defuzzified output and whether it came from the zero-mass fallback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Defuzzified {
    pub value: f64,
    pub fallback: bool,
}

/// Firing strength of one rule for one inference
#[derive(Debug, Clone, PartialEq)]
pub struct RuleActivation {
    /// Position in the bank, 0-based
    pub index: usize,
    pub label: Option<String>,
    pub strength: FuzzyValue,
}

/// Everything one call to [`InferenceEngine::compute`] produced
#[derive(Debug, Clone)]
pub struct Inference {
    inputs: IndexMap<String, f64>,
    activations: Vec<RuleActivation>,
    aggregated: IndexMap<String, Vec<f64>>,
    outputs: IndexMap<String, Defuzzified>,
}

impl Inference {
    /// Crisp inputs after clamping
    pub fn inputs(&self) -> &IndexMap<String, f64> {
        &self.inputs
    }

    pub fn activations(&self) -> &[RuleActivation] {
        &self.activations
    }

    /// Rules with non-zero firing strength
    pub fn fired(&self) -> impl Iterator<Item = &RuleActivation> {
        self.activations.iter().filter(|a| !a.strength.is_zero())
    }

    /// Aggregated membership of an output at each universe sample
    pub fn aggregated(&self, output: &str) -> Option<&[f64]> {
        self.aggregated.get(output).map(Vec::as_slice)
    }

    pub fn defuzzified(&self, output: &str) -> Option<Defuzzified> {
        self.outputs.get(output).copied()
    }

    pub fn output(&self, output: &str) -> Option<f64> {
        self.outputs.get(output).map(|d| d.value)
    }

    /// Whether `output` was resolved by the zero-mass fallback
    pub fn used_fallback(&self, output: &str) -> bool {
        self.outputs.get(output).map(|d| d.fallback).unwrap_or(false)
    }

    /// Output name → crisp value, in bank order
    pub fn crisp_outputs(&self) -> IndexMap<String, f64> {
        self.outputs
            .iter()
            .map(|(name, d)| (name.clone(), d.value))
            .collect()
    }

    /// Multi-line summary of input memberships, fired rules and outputs
    pub fn explain(&self, bank: &RuleBank) -> String {
        let mut out = String::new();
        for (name, &value) in &self.inputs {
            let Some(variable) = bank.input(name) else {
                continue;
            };
            let degrees: Vec<String> = variable
                .fuzzify(value)
                .iter()
                .map(|(term, degree)| format!("{} {}", term, degree))
                .collect();
            let _ = writeln!(out, "{} = {:.2}: {}", name, value, degrees.join(", "));
        }
        for activation in self.fired() {
            let rule = bank
                .rules()
                .get(activation.index)
                .map(ToString::to_string)
                .unwrap_or_default();
            let _ = writeln!(out, "[{}] {}", activation.strength, rule);
        }
        for (name, d) in &self.outputs {
            let note = if d.fallback { " (no rule fired)" } else { "" };
            let _ = writeln!(out, "{} = {:.2}{}", name, d.value, note);
        }
        out
    }
}

/// Stateless Mamdani inference over a [`RuleBank`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceEngine {
    pub clamp: ClampPolicy,
    pub defuzzification: DefuzzificationMethod,
    pub fallback: Fallback,
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clamp(mut self, clamp: ClampPolicy) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_defuzzification(mut self, method: DefuzzificationMethod) -> Self {
        self.defuzzification = method;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Run one inference.
    ///
    /// Every antecedent in `bank` needs a finite entry in `inputs`; extra
    /// entries are ignored. Never fails otherwise.
    pub fn compute(
        &self,
        bank: &RuleBank,
        inputs: &HashMap<String, f64>,
    ) -> WashResult<Inference> {
        let mut crisp = Vec::with_capacity(bank.input_count());
        let mut clamped = IndexMap::with_capacity(bank.input_count());
        for variable in bank.inputs() {
            let name = variable.name();
            let raw = *inputs.get(name).ok_or_else(|| WashError::missing_input(name))?;
            if !raw.is_finite() {
                return Err(WashError::non_finite_input(name, raw));
            }
            let value = self.clamp.apply(raw, variable.universe());
            crisp.push(value);
            clamped.insert(name.to_string(), value);
        }

        let strengths = bank.firing_strengths(&crisp);

        let mut aggregated: Vec<Vec<f64>> = bank
            .outputs()
            .map(|variable| vec![0.0; variable.universe().len()])
            .collect();
        let samples: Vec<&[f64]> = bank.outputs().map(|v| v.universe().samples()).collect();

        for (index, strength) in strengths.iter().enumerate() {
            trace!(rule = index + 1, strength = strength.value(), "rule evaluated");
            if strength.is_zero() {
                continue;
            }
            for implication in bank.implications(index) {
                let (Some(buffer), Some(points)) = (
                    aggregated.get_mut(implication.output),
                    samples.get(implication.output),
                ) else {
                    continue;
                };
                for (slot, &x) in buffer.iter_mut().zip(points.iter()) {
                    let implied = strength.implies_mamdani(&implication.membership.evaluate(x));
                    *slot = slot.max(implied.value());
                }
            }
        }

        let mut outputs = IndexMap::with_capacity(bank.output_count());
        for (variable, set) in bank.outputs().zip(aggregated.iter()) {
            let universe = variable.universe();
            let defuzzified = match self.defuzzification.defuzzify(universe.samples(), set) {
                Some(value) => Defuzzified {
                    value,
                    fallback: false,
                },
                None => {
                    debug!(
                        output = variable.name(),
                        policy = self.fallback.as_str(),
                        "aggregated set is empty, using fallback"
                    );
                    Defuzzified {
                        value: self.fallback.value_for(universe),
                        fallback: true,
                    }
                }
            };
            trace!(output = variable.name(), value = defuzzified.value, "defuzzified");
            outputs.insert(variable.name().to_string(), defuzzified);
        }

        let activations = bank
            .rules()
            .iter()
            .zip(strengths)
            .enumerate()
            .map(|(index, (rule, strength))| RuleActivation {
                index,
                label: rule.label.clone(),
                strength,
            })
            .collect();

        Ok(Inference {
            inputs: clamped,
            activations,
            aggregated: bank
                .outputs()
                .map(|v| v.name().to_string())
                .zip(aggregated)
                .collect(),
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::fuzzy::rule::{Expr, Rule};
    use crate::fuzzy::variable::LinguisticVariable;

    /// temp in [0, 40], fan in [0, 10]; a second output `heater` no rule touches
    fn bank() -> RuleBank {
        RuleBank::builder()
            .variable(
                LinguisticVariable::antecedent("temp", Universe::new(0.0, 40.0, 1.0).unwrap())
                    .with_trimf("cold", 0.0, 0.0, 20.0)
                    .unwrap()
                    .with_trimf("hot", 20.0, 40.0, 40.0)
                    .unwrap(),
            )
            .variable(
                LinguisticVariable::consequent("fan", Universe::new(0.0, 10.0, 1.0).unwrap())
                    .with_trimf("slow", 0.0, 0.0, 5.0)
                    .unwrap()
                    .with_trimf("fast", 5.0, 10.0, 10.0)
                    .unwrap(),
            )
            .variable(
                LinguisticVariable::consequent("heater", Universe::new(0.0, 4.0, 1.0).unwrap())
                    .with_trimf("on", 0.0, 4.0, 4.0)
                    .unwrap(),
            )
            .rule(Rule::new(Expr::is("temp", "cold")).then("fan", "slow").with_label("chill"))
            .rule(Rule::new(Expr::is("temp", "hot")).then("fan", "fast").with_label("blast"))
            .build()
            .unwrap()
    }

    fn inputs(temp: f64) -> HashMap<String, f64> {
        HashMap::from([("temp".to_string(), temp)])
    }

    #[test]
    fn test_full_strength_centroid() {
        let result = InferenceEngine::new().compute(&bank(), &inputs(40.0)).unwrap();
        // fast = [5, 10, 10] sampled at 5..=10: 0, .2, .4, .6, .8, 1
        // centroid = (6*.2 + 7*.4 + 8*.6 + 9*.8 + 10) / 3 = 26 / 3
        let fan = result.defuzzified("fan").unwrap();
        assert!(!fan.fallback);
        assert!((fan.value - 26.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_implication_clips_term() {
        let result = InferenceEngine::new().compute(&bank(), &inputs(30.0)).unwrap();
        let set = result.aggregated("fan").unwrap();
        // hot(30) = 0.5, so fast is clipped at 0.5
        assert_eq!(set.len(), 11);
        assert!((set[10] - 0.5).abs() < 1e-12);
        assert!((set[6] - 0.2).abs() < 1e-12);
        assert!(set.iter().all(|&m| m <= 0.5 + 1e-12));
        // cold(30) = 0, slow contributes nothing
        assert_eq!(set[0], 0.0);
    }

    #[test]
    fn test_max_aggregation_over_rules() {
        let result = InferenceEngine::new().compute(&bank(), &inputs(15.0)).unwrap();
        // cold(15) = 0.25, hot(15) = 0
        let set = result.aggregated("fan").unwrap();
        assert!((set[0] - 0.25).abs() < 1e-12);
        assert_eq!(set[10], 0.0);
        assert_eq!(result.fired().count(), 1);
        assert_eq!(result.fired().next().unwrap().label.as_deref(), Some("chill"));
    }

    #[test]
    fn test_untouched_output_falls_back_to_midpoint() {
        let result = InferenceEngine::new().compute(&bank(), &inputs(30.0)).unwrap();
        let heater = result.defuzzified("heater").unwrap();
        assert!(heater.fallback);
        assert_eq!(heater.value, 2.0);
        assert!(result.aggregated("heater").unwrap().iter().all(|&m| m == 0.0));
        assert!(!result.used_fallback("fan"));
    }

    #[test]
    fn test_zero_strength_everywhere_falls_back() {
        // 20 sits at the foot of both terms
        let result = InferenceEngine::new().compute(&bank(), &inputs(20.0)).unwrap();
        assert!(result.used_fallback("fan"));
        assert_eq!(result.output("fan"), Some(5.0));

        let result = InferenceEngine::new()
            .with_fallback(Fallback::Maximum)
            .compute(&bank(), &inputs(20.0))
            .unwrap();
        assert_eq!(result.output("fan"), Some(10.0));

        let result = InferenceEngine::new()
            .with_fallback(Fallback::Minimum)
            .compute(&bank(), &inputs(20.0))
            .unwrap();
        assert_eq!(result.output("fan"), Some(0.0));
    }

    #[test]
    fn test_upper_clamp_only() {
        let engine = InferenceEngine::new();
        let result = engine.compute(&bank(), &inputs(55.0)).unwrap();
        assert_eq!(result.inputs()["temp"], 40.0);

        // below the universe: passes through untouched, cold(-5) = 0
        let result = engine.compute(&bank(), &inputs(-5.0)).unwrap();
        assert_eq!(result.inputs()["temp"], -5.0);
        assert!(result.used_fallback("fan"));
    }

    #[test]
    fn test_symmetric_clamp() {
        let engine = InferenceEngine::new().with_clamp(ClampPolicy::Symmetric);
        let result = engine.compute(&bank(), &inputs(-5.0)).unwrap();
        assert_eq!(result.inputs()["temp"], 0.0);
        assert!(!result.used_fallback("fan"));
    }

    #[test]
    fn test_missing_and_non_finite_inputs() {
        let engine = InferenceEngine::new();
        let err = engine.compute(&bank(), &HashMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingInput);

        let err = engine.compute(&bank(), &inputs(f64::NAN)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NonFiniteInput);

        let err = engine.compute(&bank(), &inputs(f64::INFINITY)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NonFiniteInput);
    }

    #[test]
    fn test_activations_follow_bank_order() {
        let result = InferenceEngine::new().compute(&bank(), &inputs(30.0)).unwrap();
        let labels: Vec<_> = result
            .activations()
            .iter()
            .map(|a| (a.index, a.label.clone().unwrap()))
            .collect();
        assert_eq!(labels, vec![(0, "chill".to_string()), (1, "blast".to_string())]);
    }

    #[test]
    fn test_explain_lists_fired_rules() {
        let b = bank();
        let result = InferenceEngine::new().compute(&b, &inputs(30.0)).unwrap();
        let text = result.explain(&b);
        assert!(text.contains("blast: IF temp[hot] THEN fan[fast]"));
        assert!(!text.contains("chill"));
        assert!(text.contains("heater = 2.00 (no rule fired)"));
        assert!(text.contains("temp = 30.00: cold 0.000, hot 0.500"));
    }

    #[test]
    fn test_crisp_outputs_in_bank_order() {
        let result = InferenceEngine::new().compute(&bank(), &inputs(40.0)).unwrap();
        let outputs = result.crisp_outputs();
        let names: Vec<&str> = outputs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["fan", "heater"]);
        assert!((outputs["fan"] - 26.0 / 3.0).abs() < 1e-9);
        assert_eq!(outputs["heater"], 2.0);
        assert_eq!(Some(outputs["fan"]), result.output("fan"));
    }

    #[test]
    fn test_defuzzification_methods() {
        let points = [0.0, 1.0, 2.0, 3.0, 4.0];
        let set = [0.0, 0.5, 1.0, 1.0, 0.0];

        let centroid = DefuzzificationMethod::Centroid.defuzzify(&points, &set).unwrap();
        assert!((centroid - 5.5 / 2.5).abs() < 1e-12);
        assert_eq!(DefuzzificationMethod::Bisector.defuzzify(&points, &set), Some(2.0));
        assert_eq!(DefuzzificationMethod::Mom.defuzzify(&points, &set), Some(2.5));
        assert_eq!(DefuzzificationMethod::Som.defuzzify(&points, &set), Some(2.0));
        assert_eq!(DefuzzificationMethod::Lom.defuzzify(&points, &set), Some(3.0));

        let empty = [0.0; 5];
        for method in [
            DefuzzificationMethod::Centroid,
            DefuzzificationMethod::Bisector,
            DefuzzificationMethod::Mom,
            DefuzzificationMethod::Som,
            DefuzzificationMethod::Lom,
        ] {
            assert_eq!(method.defuzzify(&points, &empty), None);
        }
    }

    #[test]
    fn test_policy_names_round_trip() {
        assert_eq!(ClampPolicy::from_str("symmetric"), Some(ClampPolicy::Symmetric));
        assert_eq!(ClampPolicy::from_str("UPPER"), Some(ClampPolicy::Upper));
        assert_eq!(DefuzzificationMethod::from_str("cog"), Some(DefuzzificationMethod::Centroid));
        assert_eq!(Fallback::from_str("max"), Some(Fallback::Maximum));
        assert_eq!(Fallback::from_str("nearest"), None);
    }
}
