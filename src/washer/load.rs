//! Garments and their aggregation into a single wash request.

use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, WashError, WashResult};
use crate::washer::WashRequest;
use crate::wash_ensure;

/// Accepted garment weight, kilograms
pub const WEIGHT_RANGE: RangeInclusive<f64> = 0.1..=10.0;
/// Accepted dirt and delicateness ratings
pub const RATING_RANGE: RangeInclusive<f64> = 1.0..=10.0;

/// One garment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Kilograms
    pub weight: f64,
    /// 1-10
    pub dirt_level: f64,
    /// 1 (robust) to 10 (delicate)
    pub delicateness: f64,
}

impl ClothItem {
    pub fn new(name: impl Into<String>, weight: f64, dirt_level: f64, delicateness: f64) -> Self {
        Self {
            name: name.into(),
            image_url: None,
            weight,
            dirt_level,
            delicateness,
        }
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> WashResult<()> {
        wash_ensure!(
            !self.name.trim().is_empty(),
            ErrorCode::InvalidValue,
            "Cloth name must not be empty"
        );
        check_range("weight", self.weight, &WEIGHT_RANGE)?;
        check_range("dirt_level", self.dirt_level, &RATING_RANGE)?;
        check_range("delicateness", self.delicateness, &RATING_RANGE)?;
        Ok(())
    }
}

fn check_range(field: &str, value: f64, range: &RangeInclusive<f64>) -> WashResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(WashError::out_of_range(field, value, *range.start(), *range.end()))
    }
}

/// Parses `name:weight:dirt:delicateness`
impl FromStr for ClothItem {
    type Err = WashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [name, weight, dirt, delicate] = parts.as_slice() else {
            return Err(WashError::new(
                ErrorCode::InvalidFormat,
                format!("Expected name:weight:dirt:delicateness, got '{}'", s),
            ));
        };

        let number = |field: &str, text: &str| -> WashResult<f64> {
            text.parse::<f64>().map_err(|e| {
                WashError::new(
                    ErrorCode::InvalidFormat,
                    format!("{} '{}' is not a number", field, text),
                )
                .with_context("item", s)
                .with_cause(e.to_string())
            })
        };

        Ok(ClothItem::new(
            *name,
            number("weight", *weight)?,
            number("dirt_level", *dirt)?,
            number("delicateness", *delicate)?,
        ))
    }
}

/// The three crisp inputs derived from a set of garments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Sum of weights
    pub total_load: f64,
    /// Mean dirt level
    pub avg_dirt_level: f64,
    /// Most delicate garment wins
    pub max_delicateness: f64,
    pub items: usize,
}

impl LoadSummary {
    /// Validate and aggregate; an empty list is rejected.
    pub fn from_items(items: &[ClothItem]) -> WashResult<Self> {
        if items.is_empty() {
            return Err(WashError::empty_load());
        }

        let mut total_load = 0.0;
        let mut dirt_sum = 0.0;
        let mut max_delicateness = f64::MIN;
        for (index, item) in items.iter().enumerate() {
            item.validate()
                .map_err(|e| e.with_context("item", format!("#{} {}", index + 1, item.name)))?;
            total_load += item.weight;
            dirt_sum += item.dirt_level;
            max_delicateness = max_delicateness.max(item.delicateness);
        }

        Ok(Self {
            total_load,
            avg_dirt_level: dirt_sum / items.len() as f64,
            max_delicateness,
            items: items.len(),
        })
    }

    pub fn to_request(&self) -> WashRequest {
        WashRequest::new(self.total_load, self.avg_dirt_level, self.max_delicateness)
    }
}

impl From<LoadSummary> for WashRequest {
    fn from(summary: LoadSummary) -> Self {
        summary.to_request()
    }
}
