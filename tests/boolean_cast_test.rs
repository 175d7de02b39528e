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

//! Boolean CAST Tests
//!
//! CAST to and from BOOLEAN: accepted spellings, compile-time vs runtime
//! failures, and the canonical string round trip

use sqlrewrite::coercion::{boolean_to_string, cast_literal, cast_value, check_cast};
use sqlrewrite::executor::{execute_block, TableData};
use sqlrewrite::expression::{Bindings, Predicate, ScalarExpr};
use sqlrewrite::optimizer::{JoinNode, TableRef};
use sqlrewrite::rewrite::{QueryBlock, QueryRewriter, RewriteConfig};
use sqlrewrite::{
    execute_plan, CatalogSnapshot, DataType, Error, Row, SchemaBuilder, SqlState, TriBool, Value,
};

fn catalog() -> CatalogSnapshot {
    CatalogSnapshot::new(1).with_table(
        SchemaBuilder::new("strings")
            .add("id", DataType::Integer)
            .add_nullable("s", DataType::Varchar)
            .build(),
    )
}

fn strings_block(catalog: &CatalogSnapshot, predicate: Predicate) -> QueryBlock {
    let from = JoinNode::leaf(TableRef::bind(1, "strings", catalog).unwrap());
    QueryBlock::new(from).with_where(predicate)
}

fn cast_bool(expr: ScalarExpr) -> Predicate {
    Predicate::Truth(ScalarExpr::cast(expr, DataType::Boolean))
}

#[test]
fn test_accepted_spellings() {
    let cases = [
        ("true", TriBool::True),
        ("TRUE", TriBool::True),
        ("TrUe", TriBool::True),
        (" true ", TriBool::True),
        ("false", TriBool::False),
        ("  FaLsE", TriBool::False),
        ("unknown", TriBool::Unknown),
        ("UnKnOwN", TriBool::Unknown),
    ];
    for (text, expected) in cases {
        let value = cast_literal(&Value::text(text), DataType::Boolean).unwrap();
        assert_eq!(TriBool::from_value(&value), Some(expected), "{:?}", text);
    }
}

#[test]
fn test_unknown_literal_is_null() {
    let value = cast_literal(&Value::text("unknown"), DataType::Boolean).unwrap();
    assert!(value.is_null());
    assert_eq!(value.data_type(), DataType::Boolean);

    let null = cast_literal(&Value::null(DataType::Varchar), DataType::Boolean).unwrap();
    assert!(null.is_null());
}

#[test]
fn test_rejected_spellings_literal_vs_runtime() {
    for bad in ["1", "0", "2", "null", "true true", "arglebargle", "", "yes"] {
        let compile = cast_literal(&Value::text(bad), DataType::Boolean).unwrap_err();
        assert!(
            matches!(compile, Error::InvalidCastLiteral { .. }),
            "{:?}: {:?}",
            bad,
            compile
        );
        assert_eq!(compile.sql_state(), SqlState::InvalidCharacterFormat);
        assert!(compile.is_compile_time());

        let runtime = cast_value(&Value::text(bad), DataType::Boolean).unwrap_err();
        assert!(matches!(runtime, Error::MalformedStringLiteral { .. }));
        assert_eq!(runtime.sql_state(), SqlState::InvalidCharacterFormat);
        assert!(runtime.is_runtime());
    }
}

#[test]
fn test_illegal_source_and_target_types() {
    let others = [
        DataType::SmallInt,
        DataType::Integer,
        DataType::BigInt,
        DataType::Decimal,
        DataType::Double,
        DataType::Date,
        DataType::Time,
        DataType::Timestamp,
        DataType::Binary,
    ];
    for other in others {
        let to_bool = check_cast(other, DataType::Boolean).unwrap_err();
        assert_eq!(to_bool.sql_state(), SqlState::InvalidCast, "{} -> BOOLEAN", other);
        let from_bool = check_cast(DataType::Boolean, other).unwrap_err();
        assert_eq!(from_bool.sql_state(), SqlState::InvalidCast, "BOOLEAN -> {}", other);
    }
    for text in [DataType::Char, DataType::Varchar, DataType::LongVarchar, DataType::Clob] {
        check_cast(text, DataType::Boolean).unwrap();
        check_cast(DataType::Boolean, text).unwrap();
    }
}

#[test]
fn test_boolean_string_round_trip() {
    for x in [TriBool::True, TriBool::False] {
        let text = boolean_to_string(x);
        let back = cast_value(&text, DataType::Boolean).unwrap();
        assert_eq!(TriBool::from_value(&back), Some(x));
        let again = cast_value(&back, DataType::Varchar).unwrap();
        assert_eq!(again, text);
    }
    assert_eq!(boolean_to_string(TriBool::True), Value::text("true"));
    assert!(boolean_to_string(TriBool::Unknown).is_null());
    assert!(cast_value(&Value::null(DataType::Boolean), DataType::Varchar)
        .unwrap()
        .is_null());
}

#[test]
fn test_literal_cast_fails_the_statement_at_compile_time() {
    let catalog = catalog();
    let block = strings_block(&catalog, cast_bool(ScalarExpr::literal("2")));
    let err = QueryRewriter::new(&catalog, RewriteConfig::default())
        .rewrite(&block)
        .unwrap_err();
    assert!(matches!(err.kind(), Error::InvalidCastLiteral { .. }));
    assert_eq!(err.sql_state(), SqlState::InvalidCharacterFormat);
    assert!(err.location().is_some());
}

#[test]
fn test_column_cast_fails_the_statement_at_runtime() {
    let catalog = catalog();
    let block = strings_block(&catalog, cast_bool(ScalarExpr::column(1, 1)));
    let plan = QueryRewriter::new(&catalog, RewriteConfig::default())
        .rewrite(&block)
        .unwrap();

    let good = TableData::new().with_table(
        "strings",
        vec![
            Row::from_values(vec![Value::integer(1), Value::text(" TRUE ")]),
            Row::from_values(vec![Value::integer(2), Value::text("unknown")]),
            Row::from_values(vec![Value::integer(3), Value::null(DataType::Varchar)]),
        ],
    );
    let rows = execute_plan(&plan, &good, &Bindings::new()).unwrap();
    assert_eq!(rows.len(), 1);

    let bad = TableData::new().with_table(
        "strings",
        vec![
            Row::from_values(vec![Value::integer(1), Value::text("true")]),
            Row::from_values(vec![Value::integer(2), Value::text("2")]),
        ],
    );
    let err = execute_plan(&plan, &bad, &Bindings::new()).unwrap_err();
    assert!(matches!(err, Error::MalformedStringLiteral { .. }));
    let unrewritten = execute_block(&block, &bad, &Bindings::new()).unwrap_err();
    assert_eq!(unrewritten.kind(), err.kind());
}

#[test]
fn test_parameter_cast_fails_at_runtime() {
    let catalog = catalog();
    let block = strings_block(&catalog, cast_bool(ScalarExpr::parameter(0)));
    let plan = QueryRewriter::new(&catalog, RewriteConfig::default())
        .rewrite(&block)
        .unwrap();
    let data = TableData::new().with_table(
        "strings",
        vec![Row::from_values(vec![Value::integer(1), Value::text("x")])],
    );
    let ok = execute_plan(&plan, &data, &Bindings::with_params(vec![Value::text("true")])).unwrap();
    assert_eq!(ok.len(), 1);
    let err = execute_plan(&plan, &data, &Bindings::with_params(vec![Value::text("1")])).unwrap_err();
    assert!(matches!(err, Error::MalformedStringLiteral { .. }));
}
