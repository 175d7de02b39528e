// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime predicate evaluation
//!
//! Evaluation reads column values through an [`EvalContext`]. Runtime
//! failures (a malformed string in a CAST, a scalar subquery returning more
//! than one row) abort evaluation; [`filter_rows`] surfaces the first one
//! and never drops the offending row silently.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::between::evaluate_between;
use super::in_list::{evaluate_in_list_naive, InListProbe, ProbeThresholds};
use super::logical::{and_all, or_any};
use super::{comparison, ColumnRef, Predicate, ScalarExpr};
use crate::coercion::cast_value;
use crate::core::{DataType, Error, EvalMode, Result, Row, TriBool, Value};

/// Source of column, parameter and subquery values during evaluation
pub trait EvalContext {
    fn column(&self, column: ColumnRef) -> Result<&Value>;

    fn parameter(&self, index: usize) -> Result<&Value>;

    /// All rows produced by a scalar subquery
    fn subquery_rows(&self, id: usize) -> Result<&[Value]>;
}

/// Per-execution values: bound parameters, subquery results and the
/// current row of any enclosing query block
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub params: Vec<Value>,
    pub subqueries: FxHashMap<usize, Vec<Value>>,
    pub outer: FxHashMap<ColumnRef, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: Vec<Value>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn with_subquery(mut self, id: usize, rows: Vec<Value>) -> Self {
        self.subqueries.insert(id, rows);
        self
    }

    pub fn with_outer(mut self, column: ColumnRef, value: Value) -> Self {
        self.outer.insert(column, value);
        self
    }

    pub fn parameter(&self, index: usize) -> Result<&Value> {
        self.params.get(index).ok_or(Error::UnboundParameter(index))
    }

    pub fn subquery(&self, id: usize) -> Result<&[Value]> {
        self.subqueries
            .get(&id)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::internal(format!("scalar subquery {} has no result", id)))
    }
}

/// Evaluation context over one row with a column layout
pub struct RowContext<'a> {
    layout: &'a FxHashMap<ColumnRef, usize>,
    row: &'a Row,
    bindings: &'a Bindings,
}

impl<'a> RowContext<'a> {
    pub fn new(layout: &'a FxHashMap<ColumnRef, usize>, row: &'a Row, bindings: &'a Bindings) -> Self {
        Self {
            layout,
            row,
            bindings,
        }
    }
}

impl EvalContext for RowContext<'_> {
    fn column(&self, column: ColumnRef) -> Result<&Value> {
        if let Some(value) = self.layout.get(&column).and_then(|&i| self.row.get(i)) {
            return Ok(value);
        }
        self.bindings
            .outer
            .get(&column)
            .ok_or(Error::InvalidColumnReference {
                result_set: column.result_set,
                column: column.column,
            })
    }

    fn parameter(&self, index: usize) -> Result<&Value> {
        self.bindings.parameter(index)
    }

    fn subquery_rows(&self, id: usize) -> Result<&[Value]> {
        self.bindings.subquery(id)
    }
}

impl ScalarExpr {
    /// Evaluate to a value
    pub fn evaluate(&self, ctx: &dyn EvalContext) -> Result<Value> {
        match self {
            ScalarExpr::Column(c) => ctx.column(*c).cloned(),
            ScalarExpr::Literal(v) => Ok(v.clone()),
            ScalarExpr::Parameter(i) => ctx.parameter(*i).cloned(),
            ScalarExpr::Cast { expr, to } => cast_value(&expr.evaluate(ctx)?, *to),
            ScalarExpr::ScalarSubquery(id) => {
                let rows = ctx.subquery_rows(*id)?;
                match rows {
                    [] => Ok(Value::null(DataType::Null)),
                    [single] => Ok(single.clone()),
                    many => Err(Error::CardinalityViolation { rows: many.len() }),
                }
            }
        }
    }
}

impl Predicate {
    /// Evaluate under three-valued logic
    pub fn evaluate(&self, ctx: &dyn EvalContext) -> Result<TriBool> {
        match self {
            Predicate::Comparison { op, left, right } => {
                comparison::evaluate(*op, &left.evaluate(ctx)?, &right.evaluate(ctx)?)
            }
            Predicate::Between { target, low, high } => evaluate_between(
                &target.evaluate(ctx)?,
                &low.evaluate(ctx)?,
                &high.evaluate(ctx)?,
            ),
            Predicate::InList {
                target,
                candidates,
                negated,
            } => {
                let target = target.evaluate(ctx)?;
                let values = candidates
                    .iter()
                    .map(|c| c.evaluate(ctx))
                    .collect::<Result<Vec<_>>>()?;
                evaluate_in_list_naive(&target, &values, *negated)
            }
            Predicate::InProbe { target, probe } => probe.probe(&target.evaluate(ctx)?),
            Predicate::IsNull { expr, negated } => {
                Ok(TriBool::from_bool(expr.evaluate(ctx)?.is_null() != *negated))
            }
            Predicate::Truth(expr) => {
                let value = expr.evaluate(ctx)?;
                TriBool::from_value(&value)
                    .ok_or_else(|| Error::type_mismatch(value.data_type(), DataType::Boolean))
            }
            Predicate::And(children) => and_all(children.iter().map(|c| c.evaluate(ctx))),
            Predicate::Or(children) => or_any(children.iter().map(|c| c.evaluate(ctx))),
            Predicate::Not(child) => Ok(!child.evaluate(ctx)?),
            Predicate::Const(t) => Ok(*t),
        }
    }

    /// Whether a row passes under the given mode
    pub fn accepts(&self, ctx: &dyn EvalContext, mode: EvalMode) -> Result<bool> {
        Ok(mode.accepts(self.evaluate(ctx)?))
    }

    /// Substitute bound parameters and resolve IN lists into probes
    ///
    /// Candidate lists are re-sorted and deduplicated for every execution,
    /// since parameter values are only known now.
    pub fn bind_parameters(&self, params: &[Value], thresholds: ProbeThresholds) -> Result<Predicate> {
        self.substitute_parameters(params)?
            .prepare_in_lists(thresholds)
    }

    fn substitute_parameters(&self, params: &[Value]) -> Result<Predicate> {
        match self {
            Predicate::And(children) => Ok(Predicate::And(
                children
                    .iter()
                    .map(|c| c.substitute_parameters(params))
                    .collect::<Result<_>>()?,
            )),
            Predicate::Or(children) => Ok(Predicate::Or(
                children
                    .iter()
                    .map(|c| c.substitute_parameters(params))
                    .collect::<Result<_>>()?,
            )),
            Predicate::Not(child) => Ok(Predicate::not(child.substitute_parameters(params)?)),
            leaf => leaf.try_map_node_operands(&|e| substitute_scalar(e, params)),
        }
    }

    /// Replace every IN list whose candidates are all constant with a probe
    ///
    /// Lists that still contain parameters, columns or subqueries are left
    /// for [`Predicate::bind_parameters`] or row-at-a-time evaluation.
    pub fn prepare_in_lists(&self, thresholds: ProbeThresholds) -> Result<Predicate> {
        match self {
            Predicate::And(children) => Ok(Predicate::And(
                children
                    .iter()
                    .map(|c| c.prepare_in_lists(thresholds))
                    .collect::<Result<_>>()?,
            )),
            Predicate::Or(children) => Ok(Predicate::Or(
                children
                    .iter()
                    .map(|c| c.prepare_in_lists(thresholds))
                    .collect::<Result<_>>()?,
            )),
            Predicate::Not(child) => Ok(Predicate::not(child.prepare_in_lists(thresholds)?)),
            Predicate::InList {
                target,
                candidates,
                negated,
            } => {
                let constants: Option<Vec<&ScalarExpr>> =
                    candidates.iter().map(|c| is_constant(c).then_some(c)).collect();
                let Some(constants) = constants else {
                    return Ok(self.clone());
                };
                let values = constants
                    .into_iter()
                    .map(constant_value)
                    .collect::<Result<Vec<_>>>()?;
                let probe = InListProbe::build(&values, *negated, thresholds)?;
                Ok(Predicate::InProbe {
                    target: target.clone(),
                    probe: Arc::new(probe),
                })
            }
            other => Ok(other.clone()),
        }
    }
}

fn substitute_scalar(expr: &ScalarExpr, params: &[Value]) -> Result<ScalarExpr> {
    match expr {
        ScalarExpr::Parameter(i) => params
            .get(*i)
            .cloned()
            .map(ScalarExpr::Literal)
            .ok_or(Error::UnboundParameter(*i)),
        ScalarExpr::Cast { expr, to } => Ok(ScalarExpr::cast(substitute_scalar(expr, params)?, *to)),
        other => Ok(other.clone()),
    }
}

fn is_constant(expr: &ScalarExpr) -> bool {
    match expr {
        ScalarExpr::Literal(_) => true,
        ScalarExpr::Cast { expr, .. } => is_constant(expr),
        _ => false,
    }
}

fn constant_value(expr: &ScalarExpr) -> Result<Value> {
    match expr {
        ScalarExpr::Literal(v) => Ok(v.clone()),
        ScalarExpr::Cast { expr, to } => cast_value(&constant_value(expr)?, *to),
        _ => Err(Error::internal(format!("{} is not a constant", expr))),
    }
}

/// Keep the rows for which `predicate` passes under `mode`
///
/// The first runtime error fails the whole batch.
pub fn filter_rows(
    predicate: &Predicate,
    layout: &FxHashMap<ColumnRef, usize>,
    rows: Vec<Row>,
    bindings: &Bindings,
    mode: EvalMode,
) -> Result<Vec<Row>> {
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        let ctx = RowContext::new(layout, &row, bindings);
        if predicate.accepts(&ctx, mode)? {
            kept.push(row);
        }
    }
    Ok(kept)
}
