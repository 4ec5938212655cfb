//! Rules, antecedent expressions and the validated rule bank.
//!
//! Rules are written against variable and term *names* ([`Expr`],
//! [`Consequent`]). [`RuleBankBuilder::build`] resolves every name once, so a
//! malformed bank fails at construction and inference never does a string
//! lookup.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{WashError, WashResult};
use crate::fuzzy::membership::{FuzzyValue, MembershipFunction};
use crate::fuzzy::variable::{LinguisticVariable, VariableKind};

/// Antecedent expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `variable is term`
    Term { variable: String, term: String },
    /// Minimum of both sides
    And(Box<Expr>, Box<Expr>),
    /// Maximum of both sides
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Leaf: `variable is term`
    pub fn is(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Expr::Term {
            variable: variable.into(),
            term: term.into(),
        }
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term { variable, term } => write!(f, "{}[{}]", variable, term),
            Expr::And(l, r) => write!(f, "({} AND {})", l, r),
            Expr::Or(l, r) => write!(f, "({} OR {})", l, r),
        }
    }
}

/// One `variable is term` conclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consequent {
    pub variable: String,
    pub term: String,
}

impl Consequent {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

/// IF `antecedent` THEN every consequent
#[derive(Debug, Clone)]
pub struct Rule {
    /// Rule name/label
    pub label: Option<String>,
    pub antecedent: Expr,
    pub consequents: Vec<Consequent>,
}

impl Rule {
    pub fn new(antecedent: Expr) -> Self {
        Self {
            label: None,
            antecedent,
            consequents: Vec::new(),
        }
    }

    /// Add a conclusion
    pub fn then(mut self, variable: impl Into<String>, term: impl Into<String>) -> Self {
        self.consequents.push(Consequent::new(variable, term));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write!(f, "IF {} THEN ", self.antecedent)?;
        for (i, c) in self.consequents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}[{}]", c.variable, c.term)?;
        }
        Ok(())
    }
}

// ============================================================================
// Resolved form
// ============================================================================

/// Antecedent tree with names resolved to input positions
#[derive(Debug, Clone)]
enum Node {
    Leaf {
        input: usize,
        membership: MembershipFunction,
    },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

impl Node {
    fn strength(&self, crisp: &[f64]) -> FuzzyValue {
        match self {
            Node::Leaf { input, membership } => crisp
                .get(*input)
                .map(|&x| membership.evaluate(x))
                .unwrap_or(FuzzyValue::ZERO),
            Node::And(l, r) => l.strength(crisp).and(&r.strength(crisp)),
            Node::Or(l, r) => l.strength(crisp).or(&r.strength(crisp)),
        }
    }
}

/// A consequent resolved to an output position
#[derive(Debug, Clone)]
pub(crate) struct Implication {
    pub(crate) output: usize,
    pub(crate) membership: MembershipFunction,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    antecedent: Node,
    implications: Vec<Implication>,
}

// ============================================================================
// Rule bank
// ============================================================================

/// Immutable, validated set of variables and rules.
///
/// Build it once and share it by reference; inference only reads it.
#[derive(Debug, Clone)]
pub struct RuleBank {
    inputs: IndexMap<String, LinguisticVariable>,
    outputs: IndexMap<String, LinguisticVariable>,
    rules: Vec<Rule>,
    compiled: Vec<CompiledRule>,
}

impl RuleBank {
    pub fn builder() -> RuleBankBuilder {
        RuleBankBuilder::default()
    }

    /// Antecedent variables in registration order
    pub fn inputs(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.inputs.values()
    }

    /// Consequent variables in registration order
    pub fn outputs(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.outputs.values()
    }

    pub fn input(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&LinguisticVariable> {
        self.outputs.get(name)
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Firing strength of every rule, in bank order. `crisp` is indexed like
    /// [`inputs`](Self::inputs).
    pub(crate) fn firing_strengths(&self, crisp: &[f64]) -> Vec<FuzzyValue> {
        self.compiled
            .iter()
            .map(|rule| rule.antecedent.strength(crisp))
            .collect()
    }

    /// Resolved conclusions of the rule at `index`
    pub(crate) fn implications(&self, index: usize) -> &[Implication] {
        self.compiled
            .get(index)
            .map(|rule| rule.implications.as_slice())
            .unwrap_or(&[])
    }
}

/// Collects variables and rules, then validates them all in [`build`](Self::build)
#[derive(Debug, Default)]
pub struct RuleBankBuilder {
    variables: Vec<LinguisticVariable>,
    rules: Vec<Rule>,
}

impl RuleBankBuilder {
    pub fn variable(mut self, variable: LinguisticVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Validate and resolve everything; any dangling reference is a
    /// configuration fault.
    pub fn build(self) -> WashResult<RuleBank> {
        let mut inputs = IndexMap::new();
        let mut outputs = IndexMap::new();

        for variable in self.variables {
            let name = variable.name().to_string();
            if inputs.contains_key(&name) || outputs.contains_key(&name) {
                return Err(WashError::duplicate_variable(&name));
            }
            match variable.kind() {
                VariableKind::Antecedent => inputs.insert(name, variable),
                VariableKind::Consequent => outputs.insert(name, variable),
            };
        }

        let compiled = self
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                compile_rule(rule, &inputs, &outputs)
                    .map_err(|e| e.with_context("rule", rule_name(rule, index)))
            })
            .collect::<WashResult<Vec<_>>>()?;

        Ok(RuleBank {
            inputs,
            outputs,
            rules: self.rules,
            compiled,
        })
    }
}

fn rule_name(rule: &Rule, index: usize) -> String {
    rule.label
        .clone()
        .unwrap_or_else(|| format!("#{}", index + 1))
}

fn compile_rule(
    rule: &Rule,
    inputs: &IndexMap<String, LinguisticVariable>,
    outputs: &IndexMap<String, LinguisticVariable>,
) -> WashResult<CompiledRule> {
    if rule.consequents.is_empty() {
        return Err(WashError::new(
            crate::error::ErrorCode::EmptyConsequents,
            "Rule assigns no consequent",
        ));
    }

    let antecedent = compile_expr(&rule.antecedent, inputs, outputs)?;

    let implications = rule
        .consequents
        .iter()
        .map(|c| {
            let (output, _, variable) = match outputs.get_full(&c.variable) {
                Some(found) => found,
                None if inputs.contains_key(&c.variable) => {
                    return Err(wrong_kind(&c.variable, VariableKind::Consequent))
                }
                None => return Err(WashError::unknown_variable(&c.variable)),
            };
            Ok(Implication {
                output,
                membership: *variable.term(&c.term)?,
            })
        })
        .collect::<WashResult<Vec<_>>>()?;

    Ok(CompiledRule {
        antecedent,
        implications,
    })
}

fn compile_expr(
    expr: &Expr,
    inputs: &IndexMap<String, LinguisticVariable>,
    outputs: &IndexMap<String, LinguisticVariable>,
) -> WashResult<Node> {
    match expr {
        Expr::Term { variable, term } => {
            let (input, _, var) = match inputs.get_full(variable) {
                Some(found) => found,
                None if outputs.contains_key(variable) => {
                    return Err(wrong_kind(variable, VariableKind::Antecedent))
                }
                None => return Err(WashError::unknown_variable(variable)),
            };
            Ok(Node::Leaf {
                input,
                membership: *var.term(term)?,
            })
        }
        Expr::And(l, r) => Ok(Node::And(
            Box::new(compile_expr(l, inputs, outputs)?),
            Box::new(compile_expr(r, inputs, outputs)?),
        )),
        Expr::Or(l, r) => Ok(Node::Or(
            Box::new(compile_expr(l, inputs, outputs)?),
            Box::new(compile_expr(r, inputs, outputs)?),
        )),
    }
}

fn wrong_kind(variable: &str, expected: VariableKind) -> WashError {
    WashError::new(
        crate::error::ErrorCode::WrongVariableKind,
        format!("Variable '{}' cannot be used as an {}", variable, expected.as_str()),
    )
    .with_context("variable", variable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::fuzzy::universe::Universe;

    fn temperature() -> LinguisticVariable {
        LinguisticVariable::antecedent("temp", Universe::new(0.0, 40.0, 1.0).unwrap())
            .with_trimf("cold", 0.0, 0.0, 20.0)
            .unwrap()
            .with_trimf("hot", 20.0, 40.0, 40.0)
            .unwrap()
    }

    fn humidity() -> LinguisticVariable {
        LinguisticVariable::antecedent("humidity", Universe::new(0.0, 100.0, 1.0).unwrap())
            .with_trimf("dry", 0.0, 0.0, 60.0)
            .unwrap()
            .with_trimf("damp", 40.0, 100.0, 100.0)
            .unwrap()
    }

    fn fan() -> LinguisticVariable {
        LinguisticVariable::consequent("fan", Universe::new(0.0, 10.0, 1.0).unwrap())
            .with_trimf("slow", 0.0, 0.0, 5.0)
            .unwrap()
            .with_trimf("fast", 5.0, 10.0, 10.0)
            .unwrap()
    }

    fn builder() -> RuleBankBuilder {
        RuleBank::builder()
            .variable(temperature())
            .variable(humidity())
            .variable(fan())
    }

    #[test]
    fn test_expr_display() {
        let e = Expr::is("temp", "hot")
            .and(Expr::is("humidity", "damp").or(Expr::is("temp", "cold")));
        assert_eq!(e.to_string(), "(temp[hot] AND (humidity[damp] OR temp[cold]))");
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::new(Expr::is("temp", "hot"))
            .then("fan", "fast")
            .with_label("cooling");
        assert_eq!(rule.to_string(), "cooling: IF temp[hot] THEN fan[fast]");
    }

    #[test]
    fn test_build_valid_bank() {
        let bank = builder()
            .rule(Rule::new(Expr::is("temp", "hot")).then("fan", "fast"))
            .rule(Rule::new(Expr::is("temp", "cold")).then("fan", "slow"))
            .build()
            .unwrap();

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.input_count(), 2);
        assert_eq!(bank.output_count(), 1);
        assert!(bank.input("temp").is_some());
        assert!(bank.output("fan").is_some());
        assert!(bank.output("temp").is_none());
    }

    #[test]
    fn test_and_is_min_or_is_max() {
        let bank = builder()
            .rule(
                Rule::new(Expr::is("temp", "hot").and(Expr::is("humidity", "damp")))
                    .then("fan", "fast"),
            )
            .rule(
                Rule::new(Expr::is("temp", "hot").or(Expr::is("humidity", "damp")))
                    .then("fan", "fast"),
            )
            .build()
            .unwrap();

        // hot(30) = 0.5, damp(85) = 0.75
        let strengths = bank.firing_strengths(&[30.0, 85.0]);
        assert!((strengths[0].value() - 0.5).abs() < 1e-12);
        assert!((strengths[1].value() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_variable_fails_at_build() {
        let err = builder()
            .rule(Rule::new(Expr::is("pressure", "high")).then("fan", "fast").with_label("r1"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownVariable);
        let fields = err.context.unwrap().fields;
        assert_eq!(fields.get("rule"), Some(&"r1".to_string()));
    }

    #[test]
    fn test_unknown_term_fails_at_build() {
        let err = builder()
            .rule(Rule::new(Expr::is("temp", "hot")).then("fan", "turbo"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownTerm);
        assert_eq!(
            err.context.unwrap().fields.get("rule"),
            Some(&"#1".to_string())
        );
    }

    #[test]
    fn test_nested_unknown_term_fails_at_build() {
        let err = builder()
            .rule(
                Rule::new(Expr::is("temp", "hot").or(Expr::is("humidity", "soaked")))
                    .then("fan", "fast"),
            )
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownTerm);
    }

    #[test]
    fn test_wrong_kind_fails_at_build() {
        let err = builder()
            .rule(Rule::new(Expr::is("fan", "fast")).then("fan", "slow"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WrongVariableKind);

        let err = builder()
            .rule(Rule::new(Expr::is("temp", "hot")).then("temp", "cold"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WrongVariableKind);
    }

    #[test]
    fn test_empty_consequents_rejected() {
        let err = builder()
            .rule(Rule::new(Expr::is("temp", "hot")))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyConsequents);
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let err = builder().variable(temperature()).build().unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);
    }

    #[test]
    fn test_rule_order_preserved() {
        let bank = builder()
            .rules((0..5).map(|i| {
                Rule::new(Expr::is("temp", "hot"))
                    .then("fan", "fast")
                    .with_label(format!("r{}", i))
            }))
            .build()
            .unwrap();
        let labels: Vec<_> = bank.rules().iter().filter_map(|r| r.label.as_deref()).collect();
        assert_eq!(labels, vec!["r0", "r1", "r2", "r3", "r4"]);
    }
}
