use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CriteriaValidationError;
use crate::process::CanonicalRecord;
use crate::schema::CanonicalField;

/// Inclusive `[min, max]`; an absent end is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bound {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }
}

/// User thresholds for one screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterCriteria {
    #[serde(default)]
    pub bounds: BTreeMap<CanonicalField, Bound>,
    /// Records must score strictly below this.
    pub max_graham_score: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        use CanonicalField::*;

        Self {
            bounds: BTreeMap::from([
                (PriceEarnings, Bound::at_most(15.0)),
                (ReturnOnInvestedCapital, Bound::at_least(10.0)),
                (ReturnOnEquity, Bound::at_least(10.0)),
                (DailyLiquidity, Bound::at_least(500_000.0)),
                (DebtToEquity, Bound::at_most(1.0)),
                (RevenueGrowth5y, Bound::between(1.0, 20.0)),
            ]),
            max_graham_score: 22.5,
        }
    }
}

/// One check a record must pass to be retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    Within(CanonicalField, Bound),
    Positive(CanonicalField),
    NonNegative(CanonicalField),
    ScoreBelow(f64),
}

impl Predicate {
    /// A missing value fails every predicate that reads it.
    pub fn test(&self, record: &CanonicalRecord) -> bool {
        match *self {
            Predicate::Within(field, bound) => {
                record.metric(field).map_or(false, |v| bound.contains(v))
            }
            Predicate::Positive(field) => record.metric(field).map_or(false, |v| v > 0.0),
            Predicate::NonNegative(field) => record.metric(field).map_or(false, |v| v >= 0.0),
            Predicate::ScoreBelow(ceiling) => record.graham_score.map_or(false, |s| s < ceiling),
        }
    }
}

impl FilterCriteria {
    pub fn with_bound(mut self, field: CanonicalField, bound: Bound) -> Self {
        self.bounds.insert(field, bound);
        self
    }

    pub fn validate(&self) -> Result<(), CriteriaValidationError> {
        for (&field, bound) in &self.bounds {
            if !field.is_numeric() {
                return Err(CriteriaValidationError::NotNumeric(field));
            }
            let ends = [bound.min, bound.max];
            if ends.iter().flatten().any(|v| !v.is_finite()) {
                return Err(CriteriaValidationError::NonFinite { field });
            }
            if let (Some(min), Some(max)) = (bound.min, bound.max) {
                if min > max {
                    return Err(CriteriaValidationError::Inverted { field, min, max });
                }
            }
        }
        if !self.max_graham_score.is_finite() {
            return Err(CriteriaValidationError::NonFiniteScoreCeiling(
                self.max_graham_score,
            ));
        }
        Ok(())
    }

    /// The full predicate list: configured bounds, then the fixed methodology
    /// rules, then the score ceiling.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut list: Vec<Predicate> = self
            .bounds
            .iter()
            .map(|(&field, &bound)| Predicate::Within(field, bound))
            .collect();
        list.push(Predicate::Positive(CanonicalField::PriceEarnings));
        list.push(Predicate::NonNegative(CanonicalField::DebtToEquity));
        list.push(Predicate::ScoreBelow(self.max_graham_score));
        list
    }
}
