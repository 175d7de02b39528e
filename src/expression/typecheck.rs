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

//! Compile-time type checking
//!
//! Every comparability error is raised here, before any row is read.
//! Errors carry the [`Location`] of the offending predicate node.

use rustc_hash::FxHashMap;

use super::{ColumnRef, Predicate, ScalarExpr};
use crate::coercion::{cast_literal, check_cast, check_comparable, dominant_type};
use crate::core::{DataType, Error, Location, Result};

/// Column and subquery types visible to a query block
pub trait TypeEnv {
    fn column_type(&self, column: ColumnRef) -> Result<DataType>;

    /// Type of a scalar subquery's single column; untyped if unknown
    fn subquery_type(&self, _id: usize) -> DataType {
        DataType::Null
    }
}

impl TypeEnv for FxHashMap<ColumnRef, DataType> {
    fn column_type(&self, column: ColumnRef) -> Result<DataType> {
        self.get(&column)
            .copied()
            .ok_or(Error::InvalidColumnReference {
                result_set: column.result_set,
                column: column.column,
            })
    }
}

/// Static type of a scalar expression
///
/// Parameters are untyped until bound and take the type of whatever they
/// are compared with.
pub fn type_of(expr: &ScalarExpr, env: &dyn TypeEnv) -> Result<DataType> {
    match expr {
        ScalarExpr::Column(c) => env.column_type(*c),
        ScalarExpr::Literal(v) => Ok(v.data_type()),
        ScalarExpr::Parameter(_) => Ok(DataType::Null),
        ScalarExpr::Cast { expr, to } => {
            check_cast(type_of(expr, env)?, *to)?;
            Ok(*to)
        }
        ScalarExpr::ScalarSubquery(id) => Ok(env.subquery_type(*id)),
    }
}

/// Type-check a predicate tree rooted at `location`
pub fn check_predicate(
    predicate: &Predicate,
    env: &dyn TypeEnv,
    location: &Location,
) -> Result<()> {
    check_node(predicate, env).map_err(|e| e.at(location.clone()))?;
    for (i, child) in predicate.children().iter().enumerate() {
        check_predicate(child, env, &location.child(i))?;
    }
    Ok(())
}

fn check_node(predicate: &Predicate, env: &dyn TypeEnv) -> Result<()> {
    match predicate {
        Predicate::Comparison { left, right, .. } => {
            check_comparable(type_of(left, env)?, type_of(right, env)?)
        }
        Predicate::Between { target, low, high } => {
            if target.is_parameter() && low.is_parameter() && high.is_parameter() {
                return Err(Error::between_all_parameters());
            }
            if target.is_untyped_null() || low.is_untyped_null() || high.is_untyped_null() {
                return Err(Error::between_null_operand());
            }
            let types = [type_of(target, env)?, type_of(low, env)?, type_of(high, env)?];
            // Pairwise against the target so the message names the target type
            check_comparable(types[0], types[1])?;
            check_comparable(types[0], types[2])?;
            dominant_type(&types).map(|_| ())
        }
        Predicate::InList {
            target, candidates, ..
        } => {
            if candidates.is_empty() {
                return Err(Error::in_list_syntax("an IN list must not be empty"));
            }
            if target.is_untyped_null() || candidates.iter().any(ScalarExpr::is_untyped_null) {
                return Err(Error::in_list_syntax(
                    "NULL is not allowed as an operand of IN",
                ));
            }
            if target.is_parameter() && candidates.iter().all(ScalarExpr::is_parameter) {
                return Err(Error::in_list_all_parameters());
            }
            let target_type = type_of(target, env)?;
            let mut types = Vec::with_capacity(candidates.len() + 1);
            types.push(target_type);
            for candidate in candidates {
                let candidate_type = type_of(candidate, env)?;
                check_comparable(target_type, candidate_type)?;
                types.push(candidate_type);
            }
            dominant_type(&types).map(|_| ())
        }
        Predicate::InProbe { target, probe } => {
            check_comparable(type_of(target, env)?, probe.list_type())
        }
        Predicate::IsNull { expr, .. } => type_of(expr, env).map(|_| ()),
        Predicate::Truth(expr) => {
            let t = type_of(expr, env)?;
            if t == DataType::Boolean || t == DataType::Null {
                Ok(())
            } else {
                Err(Error::type_mismatch(t, DataType::Boolean))
            }
        }
        Predicate::And(_) | Predicate::Or(_) | Predicate::Not(_) | Predicate::Const(_) => Ok(()),
    }
}

/// Replace `CAST(<literal> AS T)` with the converted literal
///
/// A string literal that does not parse as the target type is a
/// compile-time `InvalidCastLiteral`.
pub fn fold_literal_casts(predicate: &Predicate, location: &Location) -> Result<Predicate> {
    let folded = match predicate {
        Predicate::And(children) => Predicate::And(fold_children(children, location)?),
        Predicate::Or(children) => Predicate::Or(fold_children(children, location)?),
        Predicate::Not(child) => Predicate::not(fold_literal_casts(child, &location.child(0))?),
        leaf => leaf
            .try_map_node_operands(&fold_scalar)
            .map_err(|e| e.at(location.clone()))?,
    };
    Ok(folded)
}

fn fold_children(children: &[Predicate], location: &Location) -> Result<Vec<Predicate>> {
    children
        .iter()
        .enumerate()
        .map(|(i, c)| fold_literal_casts(c, &location.child(i)))
        .collect()
}

fn fold_scalar(expr: &ScalarExpr) -> Result<ScalarExpr> {
    match expr {
        ScalarExpr::Cast { expr: inner, to } => match fold_scalar(inner)? {
            ScalarExpr::Literal(v) => Ok(ScalarExpr::Literal(cast_literal(&v, *to)?)),
            other => Ok(ScalarExpr::cast(other, *to)),
        },
        other => Ok(other.clone()),
    }
}
