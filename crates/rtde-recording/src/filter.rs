// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Change-significance filtering.
//!
//! Telemetry arrives at a fixed rate whether or not the robot moves. The
//! filter keeps a sample only when its tracked numeric field moved by more than
//! a threshold in at least one component since the previous sample.

use rtde::{Recipe, Sample};
use thiserror::Error;

/// Default significance threshold.
pub const DEFAULT_THRESHOLD: f64 = 1e-3;

/// Field tracked by default (joint actual positions).
pub const DEFAULT_TRACKED_FIELD: &str = "actual_q";

/// Filter setup errors.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Tracked field '{0}' is not part of the recipe")]
    UnknownField(String),

    #[error("Tracked field '{field}' has non-numeric type {type_name}")]
    NonNumericField { field: String, type_name: String },

    #[error("Threshold must be a finite, non-negative number (got {0})")]
    InvalidThreshold(f64),
}

/// `true` iff some component differs by strictly more than `threshold`.
///
/// Slices of different lengths are always significant.
pub fn is_significant(old: &[f64], new: &[f64], threshold: f64) -> bool {
    if old.len() != new.len() {
        return true;
    }
    old.iter()
        .zip(new)
        .any(|(o, n)| (n - o).abs() > threshold)
}

/// Stateful filter over one recording session.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    field: String,
    index: usize,
    threshold: f64,
    baseline: Option<Vec<f64>>,
}

impl ChangeFilter {
    /// Resolve `field` in `recipe` once, up front.
    pub fn for_recipe(recipe: &Recipe, field: &str, threshold: f64) -> Result<Self, FilterError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(FilterError::InvalidThreshold(threshold));
        }

        let index = recipe
            .index_of(field)
            .ok_or_else(|| FilterError::UnknownField(field.to_string()))?;
        let ty = recipe.types()[index];
        if !ty.is_numeric() {
            return Err(FilterError::NonNumericField {
                field: field.to_string(),
                type_name: ty.to_string(),
            });
        }

        Ok(Self {
            field: field.to_string(),
            index,
            threshold,
            baseline: None,
        })
    }

    /// Decide whether `sample` must be recorded, then adopt it as the baseline.
    ///
    /// The first sample of a session is always significant. The baseline is
    /// replaced whether or not the sample was significant.
    pub fn observe(&mut self, sample: &Sample) -> bool {
        let current = sample
            .values()
            .get(self.index)
            .and_then(|v| v.to_f64_components())
            .unwrap_or_default();

        let significant = match &self.baseline {
            None => true,
            Some(old) => is_significant(old, &current, self.threshold),
        };

        self.baseline = Some(current);
        significant
    }

    /// Tracked components of the last observed sample.
    pub fn baseline(&self) -> Option<&[f64]> {
        self.baseline.as_deref()
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}
