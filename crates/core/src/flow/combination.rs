//! Composite flow fields.
//!
//! Weighted linear combinations build composite winds out of shared
//! constituents; scaling by a negative factor yields the mirrored
//! (reversed-time) field used to dualize a planning problem — swap start
//! and target and negate the flow.

use std::sync::Arc;

use crate::core_types::{Mat2, Vec2};
use crate::error::{ZermeloError, ZermeloResult};
use crate::flow::FlowField;

/// A flow field scaled by a constant factor.
pub struct ScaledFlow {
    inner: Arc<dyn FlowField>,
    factor: f64,
}

impl ScaledFlow {
    #[must_use]
    pub fn new(inner: Arc<dyn FlowField>, factor: f64) -> Self {
        Self { inner, factor }
    }

    /// The mirrored field `-w`, the dual of `inner`.
    #[must_use]
    pub fn reversed(inner: Arc<dyn FlowField>) -> Self {
        Self::new(inner, -1.0)
    }
}

impl FlowField for ScaledFlow {
    fn value(&self, t: f64, x: Vec2) -> Vec2 {
        self.inner.value(t, x) * self.factor
    }

    fn d_value(&self, t: f64, x: Vec2) -> Mat2 {
        self.inner.d_value(t, x) * self.factor
    }

    fn time_derivative(&self, t: f64, x: Vec2) -> Vec2 {
        self.inner.time_derivative(t, x) * self.factor
    }
}

/// Weighted sum `Σ wᵢ · fieldᵢ` over shared constituents.
pub struct LinearCombination {
    weights: Vec<f64>,
    fields: Vec<Arc<dyn FlowField>>,
}

impl LinearCombination {
    /// Build a combination; weights and fields must pair up one-to-one
    /// and at least one constituent is required.
    pub fn new(weights: Vec<f64>, fields: Vec<Arc<dyn FlowField>>) -> ZermeloResult<Self> {
        if fields.is_empty() {
            return Err(ZermeloError::EmptyComposite {
                what: "flow linear combination",
            });
        }
        if weights.len() != fields.len() {
            return Err(ZermeloError::ShapeMismatch {
                what: "flow combination weights",
                expected: fields.len(),
                got: weights.len(),
            });
        }
        Ok(Self { weights, fields })
    }

    /// Plain sum with unit weights.
    pub fn sum(fields: Vec<Arc<dyn FlowField>>) -> ZermeloResult<Self> {
        let weights = vec![1.0; fields.len()];
        Self::new(weights, fields)
    }
}

impl FlowField for LinearCombination {
    fn value(&self, t: f64, x: Vec2) -> Vec2 {
        self.weights
            .iter()
            .zip(&self.fields)
            .map(|(w, f)| f.value(t, x) * *w)
            .sum()
    }

    fn d_value(&self, t: f64, x: Vec2) -> Mat2 {
        self.weights
            .iter()
            .zip(&self.fields)
            .map(|(w, f)| f.d_value(t, x) * *w)
            .sum()
    }

    fn time_derivative(&self, t: f64, x: Vec2) -> Vec2 {
        self.weights
            .iter()
            .zip(&self.fields)
            .map(|(w, f)| f.time_derivative(t, x) * *w)
            .sum()
    }
}
