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

//! Predicate expression trees
//!
//! Predicates are immutable values. Every rewrite pass builds a new tree
//! instead of editing one in place, so a pass that gives up halfway can
//! simply drop what it built.
//!
//! Column references are bound by position: `#7.2` is column 2 of the
//! result set numbered 7, which is either a base table or a join node.

pub mod between;
pub mod comparison;
pub mod evaluator;
pub mod in_list;
pub mod logical;
pub mod typecheck;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::core::{CompareOp, DataType, Result, TriBool, Value};

pub use evaluator::{filter_rows, Bindings, EvalContext, RowContext};
pub use in_list::{InListProbe, ProbeStrategy, ProbeThresholds};
pub use typecheck::{check_predicate, type_of, TypeEnv};

/// A column bound to a result set by position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    pub result_set: u32,
    pub column: usize,
}

impl ColumnRef {
    pub const fn new(result_set: u32, column: usize) -> Self {
        Self { result_set, column }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.result_set, self.column)
    }
}

/// Scalar operand of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    Column(ColumnRef),
    Literal(Value),
    /// `?` parameter, numbered from 0
    Parameter(usize),
    Cast {
        expr: Box<ScalarExpr>,
        to: DataType,
    },
    /// Single-column subquery, resolved by the evaluation context
    ScalarSubquery(usize),
}

impl ScalarExpr {
    pub fn column(result_set: u32, column: usize) -> Self {
        ScalarExpr::Column(ColumnRef::new(result_set, column))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ScalarExpr::Literal(value.into())
    }

    /// Untyped NULL literal, as written in SQL text
    pub fn null() -> Self {
        ScalarExpr::Literal(Value::null(DataType::Null))
    }

    pub fn parameter(index: usize) -> Self {
        ScalarExpr::Parameter(index)
    }

    pub fn cast(expr: ScalarExpr, to: DataType) -> Self {
        ScalarExpr::Cast {
            expr: Box::new(expr),
            to,
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, ScalarExpr::Parameter(_))
    }

    /// A NULL literal without a type, which is illegal in BETWEEN and IN
    pub fn is_untyped_null(&self) -> bool {
        matches!(self, ScalarExpr::Literal(Value::Null(DataType::Null)))
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            ScalarExpr::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<ColumnRef> {
        match self {
            ScalarExpr::Column(c) => Some(*c),
            _ => None,
        }
    }

    /// Collect every column referenced by this expression
    pub fn collect_columns(&self, out: &mut Vec<ColumnRef>) {
        match self {
            ScalarExpr::Column(c) => out.push(*c),
            ScalarExpr::Cast { expr, .. } => expr.collect_columns(out),
            ScalarExpr::Literal(_) | ScalarExpr::Parameter(_) | ScalarExpr::ScalarSubquery(_) => {}
        }
    }

    /// Returns true if any referenced column belongs to one of `result_sets`
    pub fn references_any(&self, result_sets: &FxHashSet<u32>) -> bool {
        match self {
            ScalarExpr::Column(c) => result_sets.contains(&c.result_set),
            ScalarExpr::Cast { expr, .. } => expr.references_any(result_sets),
            _ => false,
        }
    }

    /// Rebuild with every column reference passed through `f`
    pub fn map_columns<F: Fn(ColumnRef) -> ColumnRef>(&self, f: &F) -> ScalarExpr {
        match self {
            ScalarExpr::Column(c) => ScalarExpr::Column(f(*c)),
            ScalarExpr::Cast { expr, to } => ScalarExpr::Cast {
                expr: Box::new(expr.map_columns(f)),
                to: *to,
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Column(c) => write!(f, "{}", c),
            ScalarExpr::Literal(Value::Text(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            ScalarExpr::Literal(v) => write!(f, "{}", v),
            ScalarExpr::Parameter(i) => write!(f, "?{}", i),
            ScalarExpr::Cast { expr, to } => write!(f, "CAST({} AS {})", expr, to),
            ScalarExpr::ScalarSubquery(id) => write!(f, "(subquery {})", id),
        }
    }
}

/// Boolean-valued expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Comparison {
        op: CompareOp,
        left: ScalarExpr,
        right: ScalarExpr,
    },
    Between {
        target: ScalarExpr,
        low: ScalarExpr,
        high: ScalarExpr,
    },
    InList {
        target: ScalarExpr,
        candidates: Vec<ScalarExpr>,
        negated: bool,
    },
    /// IN list whose candidates were resolved into a probe structure
    InProbe {
        target: ScalarExpr,
        probe: Arc<InListProbe>,
    },
    IsNull {
        expr: ScalarExpr,
        negated: bool,
    },
    /// A BOOLEAN expression used as a predicate
    Truth(ScalarExpr),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Const(TriBool),
}

impl Predicate {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn compare(op: CompareOp, left: ScalarExpr, right: ScalarExpr) -> Self {
        Predicate::Comparison { op, left, right }
    }

    pub fn eq(left: ScalarExpr, right: ScalarExpr) -> Self {
        Self::compare(CompareOp::Eq, left, right)
    }

    pub fn between(target: ScalarExpr, low: ScalarExpr, high: ScalarExpr) -> Self {
        Predicate::Between { target, low, high }
    }

    pub fn not_between(target: ScalarExpr, low: ScalarExpr, high: ScalarExpr) -> Self {
        Predicate::not(Predicate::between(target, low, high))
    }

    pub fn in_list(target: ScalarExpr, candidates: Vec<ScalarExpr>) -> Self {
        Predicate::InList {
            target,
            candidates,
            negated: false,
        }
    }

    pub fn not_in_list(target: ScalarExpr, candidates: Vec<ScalarExpr>) -> Self {
        Predicate::InList {
            target,
            candidates,
            negated: true,
        }
    }

    pub fn is_null(expr: ScalarExpr) -> Self {
        Predicate::IsNull {
            expr,
            negated: false,
        }
    }

    pub fn is_not_null(expr: ScalarExpr) -> Self {
        Predicate::IsNull {
            expr,
            negated: true,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Predicate) -> Self {
        Predicate::Not(Box::new(child))
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    pub fn constant(value: TriBool) -> Self {
        Predicate::Const(value)
    }

    /// AND of the given conjuncts without a wrapper for zero or one of them
    pub fn conjoin(mut conjuncts: Vec<Predicate>) -> Self {
        match conjuncts.len() {
            0 => Predicate::Const(TriBool::True),
            1 => conjuncts.pop().unwrap_or(Predicate::Const(TriBool::True)),
            _ => Predicate::And(conjuncts),
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Split a predicate into its top-level AND operands
    pub fn conjuncts(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            Predicate::And(children) => {
                for child in children {
                    child.collect_conjuncts(out);
                }
            }
            Predicate::Const(TriBool::True) => {}
            other => out.push(other),
        }
    }

    /// Owned variant of [`Predicate::conjuncts`]
    pub fn into_conjuncts(self) -> Vec<Predicate> {
        match self {
            Predicate::And(children) => children
                .into_iter()
                .flat_map(Predicate::into_conjuncts)
                .collect(),
            Predicate::Const(TriBool::True) => Vec::new(),
            other => vec![other],
        }
    }

    /// Scalar operands directly owned by this node
    pub fn operands(&self) -> SmallVec<[&ScalarExpr; 4]> {
        let mut out = SmallVec::new();
        match self {
            Predicate::Comparison { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            Predicate::Between { target, low, high } => {
                out.push(target);
                out.push(low);
                out.push(high);
            }
            Predicate::InList {
                target, candidates, ..
            } => {
                out.push(target);
                out.extend(candidates.iter());
            }
            Predicate::InProbe { target, .. } => out.push(target),
            Predicate::IsNull { expr, .. } | Predicate::Truth(expr) => out.push(expr),
            Predicate::And(_) | Predicate::Or(_) | Predicate::Not(_) | Predicate::Const(_) => {}
        }
        out
    }

    /// Child predicates of a connective
    pub fn children(&self) -> &[Predicate] {
        match self {
            Predicate::And(children) | Predicate::Or(children) => children,
            Predicate::Not(child) => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// Every column referenced anywhere in the tree
    pub fn referenced_columns(&self) -> Vec<ColumnRef> {
        let mut out = Vec::new();
        self.visit(&mut |p| {
            for operand in p.operands() {
                operand.collect_columns(&mut out);
            }
        });
        out
    }

    /// Result sets referenced anywhere in the tree
    pub fn referenced_result_sets(&self) -> FxHashSet<u32> {
        self.referenced_columns()
            .into_iter()
            .map(|c| c.result_set)
            .collect()
    }

    /// Returns true if the tree references any of `result_sets`
    pub fn references_any(&self, result_sets: &FxHashSet<u32>) -> bool {
        let mut found = false;
        self.visit(&mut |p| {
            if !found {
                found = p.operands().iter().any(|e| e.references_any(result_sets));
            }
        });
        found
    }

    /// Returns true if the tree contains a `?` parameter
    pub fn has_parameters(&self) -> bool {
        let mut found = false;
        self.visit(&mut |p| {
            if !found {
                found = p.operands().iter().any(|e| contains_parameter(e));
            }
        });
        found
    }

    /// Pre-order walk over every node
    pub fn visit<F: FnMut(&Predicate)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.visit(&mut |_| n += 1);
        n
    }

    // =========================================================================
    // Reconstruction
    // =========================================================================

    /// Rebuild with every scalar operand passed through `f`
    pub fn map_operands<F: Fn(&ScalarExpr) -> ScalarExpr>(&self, f: &F) -> Predicate {
        match self {
            Predicate::Comparison { op, left, right } => Predicate::Comparison {
                op: *op,
                left: f(left),
                right: f(right),
            },
            Predicate::Between { target, low, high } => Predicate::Between {
                target: f(target),
                low: f(low),
                high: f(high),
            },
            Predicate::InList {
                target,
                candidates,
                negated,
            } => Predicate::InList {
                target: f(target),
                candidates: candidates.iter().map(f).collect(),
                negated: *negated,
            },
            Predicate::InProbe { target, probe } => Predicate::InProbe {
                target: f(target),
                probe: Arc::clone(probe),
            },
            Predicate::IsNull { expr, negated } => Predicate::IsNull {
                expr: f(expr),
                negated: *negated,
            },
            Predicate::Truth(expr) => Predicate::Truth(f(expr)),
            Predicate::And(children) => {
                Predicate::And(children.iter().map(|c| c.map_operands(f)).collect())
            }
            Predicate::Or(children) => {
                Predicate::Or(children.iter().map(|c| c.map_operands(f)).collect())
            }
            Predicate::Not(child) => Predicate::not(child.map_operands(f)),
            Predicate::Const(t) => Predicate::Const(*t),
        }
    }

    /// Fallible [`Predicate::map_operands`] for a single node
    ///
    /// Connectives are returned unchanged; callers recurse themselves so they
    /// can track where in the tree an error occurred.
    pub fn try_map_node_operands<F>(&self, f: &F) -> Result<Predicate>
    where
        F: Fn(&ScalarExpr) -> Result<ScalarExpr>,
    {
        Ok(match self {
            Predicate::Comparison { op, left, right } => Predicate::Comparison {
                op: *op,
                left: f(left)?,
                right: f(right)?,
            },
            Predicate::Between { target, low, high } => Predicate::Between {
                target: f(target)?,
                low: f(low)?,
                high: f(high)?,
            },
            Predicate::InList {
                target,
                candidates,
                negated,
            } => Predicate::InList {
                target: f(target)?,
                candidates: candidates.iter().map(f).collect::<Result<Vec<_>>>()?,
                negated: *negated,
            },
            Predicate::InProbe { target, probe } => Predicate::InProbe {
                target: f(target)?,
                probe: Arc::clone(probe),
            },
            Predicate::IsNull { expr, negated } => Predicate::IsNull {
                expr: f(expr)?,
                negated: *negated,
            },
            Predicate::Truth(expr) => Predicate::Truth(f(expr)?),
            other => other.clone(),
        })
    }

    /// Rebuild with every column reference passed through `f`
    pub fn map_columns<F: Fn(ColumnRef) -> ColumnRef>(&self, f: &F) -> Predicate {
        self.map_operands(&|e| e.map_columns(f))
    }
}

fn contains_parameter(expr: &ScalarExpr) -> bool {
    match expr {
        ScalarExpr::Parameter(_) => true,
        ScalarExpr::Cast { expr, .. } => contains_parameter(expr),
        _ => false,
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Predicate::Between { target, low, high } => {
                write!(f, "{} BETWEEN {} AND {}", target, low, high)
            }
            Predicate::InList {
                target,
                candidates,
                negated,
            } => {
                write!(f, "{} {}IN (", target, if *negated { "NOT " } else { "" })?;
                for (i, c) in candidates.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
            Predicate::InProbe { target, probe } => write!(f, "{} {}", target, probe),
            Predicate::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, if *negated { "NOT " } else { "" })
            }
            Predicate::Truth(expr) => write!(f, "{}", expr),
            Predicate::And(children) => write_joined(f, children, "AND"),
            Predicate::Or(children) => write_joined(f, children, "OR"),
            Predicate::Not(child) => write!(f, "NOT ({})", child),
            Predicate::Const(t) => write!(f, "{}", t),
        }
    }
}
