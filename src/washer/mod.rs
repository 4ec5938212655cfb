//! Washing-machine rule bank and the request/response façade around it.
//!
//! Three antecedents describe the load (`load`, `dirt`, `sensitivity`) and
//! four consequents describe the cycle (`wash_time`, `water_level`,
//! `spin_speed`, `detergent`). Nine rules over `load × dirt` set time, water
//! and detergent together; three rules over `sensitivity` alone set the spin
//! speed, so spin never depends on load or dirt.
//!
//! The bank is built once per process ([`shared_rule_bank`]) and read
//! concurrently by every [`Washer`].

pub mod catalog;
pub mod load;

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WashResult;
use crate::fuzzy::{
    Expr, InferenceEngine, LinguisticVariable, Rule, RuleBank, Simulation, Universe, VariableKind,
};

pub use catalog::{CatalogEntry, ClothCatalog};
pub use load::{ClothItem, LoadSummary};

pub const LOAD: &str = "load";
pub const DIRT: &str = "dirt";
pub const SENSITIVITY: &str = "sensitivity";

pub const WASH_TIME: &str = "wash_time";
pub const WATER_LEVEL: &str = "water_level";
pub const SPIN_SPEED: &str = "spin_speed";
pub const DETERGENT: &str = "detergent";

/// Consequents in bank order
pub const OUTPUTS: [&str; 4] = [WASH_TIME, WATER_LEVEL, SPIN_SPEED, DETERGENT];

type TermTable = &'static [(&'static str, [f64; 3])];

/// (name, kind, [min, max, step], terms)
const VARIABLES: [(&str, VariableKind, [f64; 3], TermTable); 7] = [
    (
        LOAD,
        VariableKind::Antecedent,
        [0.0, 12.0, 1.0],
        &[
            ("small", [0.0, 0.0, 5.0]),
            ("medium", [3.0, 6.0, 9.0]),
            ("large", [7.0, 12.0, 12.0]),
        ],
    ),
    (
        DIRT,
        VariableKind::Antecedent,
        [0.0, 10.0, 1.0],
        &[
            ("low", [0.0, 0.0, 4.0]),
            ("medium", [2.0, 5.0, 8.0]),
            ("high", [6.0, 10.0, 10.0]),
        ],
    ),
    (
        SENSITIVITY,
        VariableKind::Antecedent,
        [0.0, 10.0, 1.0],
        &[
            ("robust", [0.0, 0.0, 4.0]),
            ("normal", [2.0, 5.0, 8.0]),
            ("delicate", [6.0, 10.0, 10.0]),
        ],
    ),
    (
        WASH_TIME,
        VariableKind::Consequent,
        [0.0, 60.0, 1.0],
        &[
            ("short", [0.0, 15.0, 25.0]),
            ("medium", [20.0, 35.0, 45.0]),
            ("long", [40.0, 60.0, 60.0]),
        ],
    ),
    (
        WATER_LEVEL,
        VariableKind::Consequent,
        [0.0, 100.0, 1.0],
        &[
            ("low", [0.0, 20.0, 40.0]),
            ("medium", [30.0, 50.0, 70.0]),
            ("high", [60.0, 100.0, 100.0]),
        ],
    ),
    (
        SPIN_SPEED,
        VariableKind::Consequent,
        [0.0, 1400.0, 10.0],
        &[
            ("very_low", [0.0, 400.0, 600.0]),
            // no rule concludes `low`
            ("low", [400.0, 600.0, 800.0]),
            ("medium", [600.0, 1000.0, 1200.0]),
            ("high", [1000.0, 1400.0, 1400.0]),
        ],
    ),
    (
        DETERGENT,
        VariableKind::Consequent,
        [0.0, 200.0, 1.0],
        &[
            ("little", [0.0, 30.0, 60.0]),
            ("normal", [50.0, 100.0, 130.0]),
            ("lots", [120.0, 200.0, 200.0]),
        ],
    ),
];

/// (load, dirt) → (wash_time, water_level, detergent)
const LOAD_DIRT_RULES: [(&str, &str, &str, &str, &str); 9] = [
    ("small", "low", "short", "low", "little"),
    ("small", "medium", "medium", "low", "normal"),
    ("small", "high", "medium", "medium", "normal"),
    ("medium", "low", "medium", "medium", "normal"),
    ("medium", "medium", "medium", "medium", "normal"),
    ("medium", "high", "long", "high", "lots"),
    ("large", "low", "medium", "high", "normal"),
    ("large", "medium", "long", "high", "lots"),
    ("large", "high", "long", "high", "lots"),
];

/// sensitivity → spin_speed
const SPIN_RULES: [(&str, &str); 3] = [
    ("delicate", "very_low"),
    ("normal", "medium"),
    ("robust", "high"),
];

/// Build the washing-machine bank from the term and rule tables.
///
/// Fails only if the tables themselves are inconsistent.
pub fn build_rule_bank() -> WashResult<RuleBank> {
    let mut builder = RuleBank::builder();

    for (name, kind, [min, max, step], terms) in VARIABLES {
        let mut variable = LinguisticVariable::new(name, kind, Universe::new(min, max, step)?);
        for &(term, [a, b, c]) in terms {
            variable = variable.with_trimf(term, a, b, c)?;
        }
        builder = builder.variable(variable);
    }

    let load_dirt = LOAD_DIRT_RULES
        .iter()
        .map(|&(load, dirt, time, water, detergent)| {
            Rule::new(Expr::is(LOAD, load).and(Expr::is(DIRT, dirt)))
                .then(WASH_TIME, time)
                .then(WATER_LEVEL, water)
                .then(DETERGENT, detergent)
                .with_label(format!("{} load, {} dirt", load, dirt))
        });
    let spin = SPIN_RULES.iter().map(|&(sensitivity, speed)| {
        Rule::new(Expr::is(SENSITIVITY, sensitivity))
            .then(SPIN_SPEED, speed)
            .with_label(format!("{} fabric", sensitivity))
    });

    builder.rules(load_dirt).rules(spin).build()
}

static SHARED_BANK: OnceLock<WashResult<RuleBank>> = OnceLock::new();

/// Process-wide bank, built on first use
pub fn shared_rule_bank() -> WashResult<&'static RuleBank> {
    SHARED_BANK
        .get_or_init(build_rule_bank)
        .as_ref()
        .map_err(Clone::clone)
}

/// Crisp description of a load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WashRequest {
    /// Kilograms
    pub total_load: f64,
    /// 1-10
    pub avg_dirt_level: f64,
    /// 1-10
    pub max_delicateness: f64,
}

impl WashRequest {
    pub fn new(total_load: f64, avg_dirt_level: f64, max_delicateness: f64) -> Self {
        Self {
            total_load,
            avg_dirt_level,
            max_delicateness,
        }
    }

    /// Summary of the raw (unclamped) inputs
    pub fn explanation(&self) -> String {
        format!(
            "Fuzzy Calculation based on Load={:.1}, Dirt={:.1}, Sensitivity={:.1}",
            self.total_load, self.avg_dirt_level, self.max_delicateness
        )
    }
}

/// Recommended cycle parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashProgram {
    /// Minutes
    pub wash_time: f64,
    /// Percent
    pub water_level: f64,
    /// RPM
    pub spin_speed: f64,
    /// Millilitres
    pub detergent_amount: f64,
    #[serde(default)]
    pub explanation: String,
    /// Outputs no rule fired for; their values are the configured fallback
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_outputs: Vec<String>,
}

/// The washing-machine bank paired with engine options
#[derive(Debug, Clone, Copy)]
pub struct Washer<'a> {
    bank: &'a RuleBank,
    engine: InferenceEngine,
}

impl<'a> Washer<'a> {
    pub fn new(bank: &'a RuleBank, engine: InferenceEngine) -> Self {
        Self { bank, engine }
    }

    pub fn bank(&self) -> &'a RuleBank {
        self.bank
    }

    /// Run one request through a fresh [`Simulation`]
    pub fn simulate(&self, request: &WashRequest) -> WashResult<Simulation<'a>> {
        let mut simulation = Simulation::new(self.bank)
            .with_input(LOAD, request.total_load)?
            .with_input(DIRT, request.avg_dirt_level)?
            .with_input(SENSITIVITY, request.max_delicateness)?;
        simulation.compute(&self.engine)?;
        Ok(simulation)
    }

    pub fn recommend(&self, request: &WashRequest) -> WashResult<WashProgram> {
        let simulation = self.simulate(request)?;

        let fallback_outputs = simulation
            .inference()
            .map(|inference| {
                OUTPUTS
                    .iter()
                    .filter(|name| inference.used_fallback(name))
                    .map(|name| name.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let program = WashProgram {
            wash_time: simulation.output(WASH_TIME)?,
            water_level: simulation.output(WATER_LEVEL)?,
            spin_speed: simulation.output(SPIN_SPEED)?,
            detergent_amount: simulation.output(DETERGENT)?,
            explanation: request.explanation(),
            fallback_outputs,
        };

        debug!(
            load = request.total_load,
            dirt = request.avg_dirt_level,
            sensitivity = request.max_delicateness,
            wash_time = program.wash_time,
            spin_speed = program.spin_speed,
            "wash program computed"
        );

        Ok(program)
    }
}

impl Washer<'static> {
    /// Washer over [`shared_rule_bank`]
    pub fn shared(engine: InferenceEngine) -> WashResult<Self> {
        Ok(Self::new(shared_rule_bank()?, engine))
    }
}
