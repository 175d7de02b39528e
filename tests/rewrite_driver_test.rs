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

//! Rewrite Driver Tests
//!
//! Error reporting, fail-closed behavior, column remapping and the
//! semi-join path end to end

use std::sync::Arc;

use proptest::prelude::*;
use sqlrewrite::catalog::SchemaColumn;
use sqlrewrite::coercion::{
    can_compare, check_assignment, check_comparable, check_union, comparability_class,
    dominant_type,
};
use sqlrewrite::optimizer::{JoinKind, JoinNode, TableRef};
use sqlrewrite::rewrite::{QueryBlock, QueryRewriter, RewriteConfig, RewrittenPlan};
use sqlrewrite::{
    execute_block, execute_plan, Bindings, CatalogSnapshot, Clause, ColumnRef, CompareOp,
    DataType, Error, Predicate, RewriteRule, Row, ScalarExpr, SchemaBuilder, SqlState, TableData,
    Value,
};

const ALL_TYPES: [DataType; 17] = [
    DataType::Null,
    DataType::SmallInt,
    DataType::Integer,
    DataType::BigInt,
    DataType::Decimal,
    DataType::Real,
    DataType::Double,
    DataType::Char,
    DataType::Varchar,
    DataType::LongVarchar,
    DataType::Clob,
    DataType::Binary,
    DataType::VarBinary,
    DataType::Date,
    DataType::Time,
    DataType::Timestamp,
    DataType::Boolean,
];

fn catalog() -> CatalogSnapshot {
    CatalogSnapshot::new(7)
        .with_table(
            SchemaBuilder::new("orders")
                .add_primary_key("id", DataType::Integer)
                .add_indexed("customer", DataType::Integer)
                .add_nullable("note", DataType::Varchar)
                .build(),
        )
        .with_table(
            SchemaBuilder::new("customers")
                .add_primary_key("id", DataType::Integer)
                .add_nullable("region", DataType::Integer)
                .build(),
        )
}

fn orders(catalog: &CatalogSnapshot) -> JoinNode {
    JoinNode::leaf(TableRef::bind(1, "orders", catalog).unwrap())
}

fn customers(catalog: &CatalogSnapshot) -> JoinNode {
    JoinNode::leaf(TableRef::bind(2, "customers", catalog).unwrap())
}

fn data() -> TableData {
    let order = |id: i64, customer: i64, note: Option<&str>| {
        Row::from_values(vec![
            Value::integer(id),
            Value::integer(customer),
            note.map_or(Value::null(DataType::Varchar), Value::text),
        ])
    };
    let customer = |id: i64, region: Option<i64>| {
        Row::from_values(vec![
            Value::integer(id),
            region.map_or(Value::null(DataType::Integer), Value::integer),
        ])
    };
    TableData::new()
        .with_table(
            "orders",
            vec![
                order(1, 10, Some("first")),
                order(2, 10, None),
                order(3, 11, Some("true")),
                order(4, 99, None),
            ],
        )
        .with_table(
            "customers",
            vec![customer(10, Some(1)), customer(11, None), customer(12, Some(2))],
        )
}

fn rewrite(catalog: &CatalogSnapshot, block: &QueryBlock) -> Result<RewrittenPlan, Error> {
    QueryRewriter::new(catalog, RewriteConfig::default()).rewrite(block)
}

#[test]
fn test_sqlstate_table() {
    let cases = [
        (Error::type_mismatch(DataType::Integer, DataType::Varchar), "42818"),
        (Error::union_mismatch(DataType::Date, DataType::Integer), "42X61"),
        (Error::assignment_mismatch(DataType::Integer, DataType::Date), "42821"),
        (Error::invalid_cast(DataType::Integer, DataType::Boolean), "42846"),
        (Error::invalid_cast_literal("2", DataType::Boolean), "22018"),
        (Error::malformed_string("2", DataType::Boolean), "22018"),
        (Error::between_all_parameters(), "42X35"),
        (Error::in_list_all_parameters(), "42X35"),
        (Error::between_null_operand(), "42X01"),
        (Error::in_list_syntax("empty"), "42X01"),
        (Error::CardinalityViolation { rows: 2 }, "21000"),
        (Error::out_of_range(70_000, DataType::SmallInt), "22003"),
        (Error::UnboundParameter(0), "07000"),
        (Error::TableNotFound("t".to_string()), "42X05"),
        (Error::ColumnNotFound("c".to_string()), "42X04"),
        (Error::internal("bug"), "XJ001"),
    ];
    for (err, code) in cases {
        assert_eq!(err.sql_state().code(), code, "{}", err);
        // A location never changes the state
        let located = err.clone().at(sqlrewrite::Location::new(Clause::Where));
        assert_eq!(located.sql_state(), err.sql_state());
        assert_eq!(located.kind(), &err);
    }
}

#[test]
fn test_union_and_assignment_checks() {
    assert_eq!(check_union(DataType::Integer, DataType::Decimal).unwrap(), DataType::Decimal);
    assert_eq!(
        check_union(DataType::Date, DataType::Integer).unwrap_err().sql_state(),
        SqlState::UnionMismatch
    );

    let not_null = SchemaColumn::simple(0, "id", DataType::Integer);
    let nullable = SchemaColumn::nullable(1, "born", DataType::Date);
    check_assignment(&not_null, DataType::Decimal).unwrap();
    check_assignment(&nullable, DataType::Varchar).unwrap();
    check_assignment(&nullable, DataType::Null).unwrap();
    assert_eq!(
        check_assignment(&not_null, DataType::Null).unwrap_err().sql_state(),
        SqlState::AssignmentMismatch
    );
    assert_eq!(
        check_assignment(&nullable, DataType::Integer).unwrap_err().sql_state(),
        SqlState::AssignmentMismatch
    );
}

#[test]
fn test_type_error_in_nested_on_fails_the_statement() {
    let catalog = catalog();
    let from = JoinNode::left_outer(
        3,
        orders(&catalog),
        customers(&catalog),
        Predicate::and(vec![
            Predicate::eq(ScalarExpr::column(1, 1), ScalarExpr::column(2, 0)),
            Predicate::eq(ScalarExpr::column(1, 2), ScalarExpr::column(2, 1)),
        ]),
    );
    // The WHERE clause alone would reduce the join
    let block = QueryBlock::new(from)
        .with_where(Predicate::eq(ScalarExpr::column(2, 1), ScalarExpr::literal(1)));
    let err = rewrite(&catalog, &block).unwrap_err();
    assert_eq!(err.sql_state(), SqlState::ComparisonMismatch);
    let location = err.location().unwrap();
    assert_eq!(location.clause, Clause::On(3));
    assert_eq!(location.path, vec![1]);
}

#[test]
fn test_unknown_table_and_column() {
    let catalog = catalog();
    let err = TableRef::bind(1, "nope", &catalog).unwrap_err();
    assert_eq!(err.sql_state(), SqlState::TableNotFound);

    let table = TableRef::bind(1, "ORDERS", &catalog).unwrap();
    assert_eq!(table.column_named("Customer").unwrap(), ColumnRef::new(1, 1));
    let err = table.column_named("total").unwrap_err();
    assert_eq!(err, Error::ColumnNotFound("orders.total".to_string()));
    assert_eq!(err.sql_state(), SqlState::ColumnNotFound);

    // A table missing from this catalog snapshot
    let other = CatalogSnapshot::new(1)
        .with_table(SchemaBuilder::new("gone").add("id", DataType::Integer).build());
    let stale = QueryBlock::new(JoinNode::leaf(TableRef::bind(1, "gone", &other).unwrap()));
    assert_eq!(
        rewrite(&catalog, &stale).unwrap_err().sql_state(),
        SqlState::TableNotFound
    );

    let block = QueryBlock::new(orders(&catalog))
        .with_where(Predicate::is_null(ScalarExpr::column(1, 9)));
    let err = rewrite(&catalog, &block).unwrap_err();
    assert!(matches!(
        err.kind(),
        Error::InvalidColumnReference {
            result_set: 1,
            column: 9
        }
    ));
}

#[test]
fn test_remap_resolves_original_bindings() {
    let catalog = catalog();
    // orders RIGHT JOIN customers; #3.0 is orders.id, #3.3 is customers.id
    let from = JoinNode::right_outer(
        3,
        orders(&catalog),
        customers(&catalog),
        Predicate::eq(ScalarExpr::column(3, 1), ScalarExpr::column(3, 3)),
    );
    let block = QueryBlock::new(from)
        .with_projection(vec![ColumnRef::new(3, 3), ColumnRef::new(3, 0)]);
    let plan = rewrite(&catalog, &block).unwrap();

    assert!(plan.was_applied(RewriteRule::RightOuterElimination));
    assert_eq!(plan.tree.kind(), Some(JoinKind::LeftOuter));
    assert_eq!(plan.remap.apply_column(ColumnRef::new(3, 0)), ColumnRef::new(1, 0));
    assert_eq!(plan.remap.apply_column(ColumnRef::new(3, 3)), ColumnRef::new(2, 0));
    assert_eq!(plan.projection, vec![ColumnRef::new(2, 0), ColumnRef::new(1, 0)]);

    let rows = execute_plan(&plan, &data(), &Bindings::new()).unwrap();
    let mut baseline = execute_block(&block, &data(), &Bindings::new()).unwrap();
    let mut rows = rows;
    rows.sort_by_key(|r| format!("{:?}", r));
    baseline.sort_by_key(|r| format!("{:?}", r));
    assert_eq!(rows, baseline);
    // customer 12 has no orders
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_disabled_rewrites_leave_the_tree_alone() {
    let catalog = catalog();
    let from = JoinNode::left_outer(
        3,
        orders(&catalog),
        customers(&catalog),
        Predicate::eq(ScalarExpr::column(1, 1), ScalarExpr::column(2, 0)),
    );
    let block = QueryBlock::new(from.clone()).with_where(Predicate::not(Predicate::compare(
        CompareOp::Lte,
        ScalarExpr::column(2, 1),
        ScalarExpr::literal(0),
    )));

    let plain = QueryRewriter::new(&catalog, RewriteConfig::no_rewrites())
        .rewrite(&block)
        .unwrap();
    assert_eq!(plain.tree, from);
    assert!(!plain.was_applied(RewriteRule::NotElimination));
    assert!(matches!(plain.where_clause, Some(Predicate::Not(_))));

    let rewritten = rewrite(&catalog, &block).unwrap();
    assert_eq!(rewritten.tree.kind(), Some(JoinKind::Inner));
    assert!(rewritten.was_applied(RewriteRule::NotElimination));
    assert!(matches!(
        rewritten.where_clause,
        Some(Predicate::Comparison { op: CompareOp::Gt, .. })
    ));

    let a = execute_plan(&plain, &data(), &Bindings::new()).unwrap();
    let b = execute_plan(&rewritten, &data(), &Bindings::new()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

#[test]
fn test_casts_in_on_clause() {
    let catalog = catalog();
    let from = JoinNode::inner(
        3,
        orders(&catalog),
        customers(&catalog),
        Predicate::and(vec![
            Predicate::eq(ScalarExpr::column(1, 1), ScalarExpr::column(2, 0)),
            Predicate::Truth(ScalarExpr::cast(ScalarExpr::column(1, 2), DataType::Boolean)),
        ]),
    );
    let block = QueryBlock::new(from);
    let plan = rewrite(&catalog, &block).unwrap();
    // Order 1 joins customer 10 and its note 'first' is not a boolean
    let err = execute_plan(&plan, &data(), &Bindings::new()).unwrap_err();
    assert!(matches!(err, Error::MalformedStringLiteral { .. }));

    let bad = QueryBlock::new(JoinNode::inner(
        3,
        orders(&catalog),
        customers(&catalog),
        Predicate::Truth(ScalarExpr::cast(ScalarExpr::literal("maybe"), DataType::Boolean)),
    ));
    let err = rewrite(&catalog, &bad).unwrap_err();
    assert_eq!(err.sql_state(), SqlState::InvalidCharacterFormat);
    assert_eq!(err.location().map(|l| l.clause), Some(Clause::On(3)));
}

#[test]
fn test_plans_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RewrittenPlan>();

    let catalog = catalog();
    let block = QueryBlock::new(orders(&catalog)).with_where(Predicate::in_list(
        ScalarExpr::column(1, 1),
        (0..50).map(ScalarExpr::literal).collect(),
    ));
    let plan = Arc::new(rewrite(&catalog, &block).unwrap());
    let data = Arc::new(data());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let plan = Arc::clone(&plan);
            let data = Arc::clone(&data);
            std::thread::spawn(move || execute_plan(&plan, &data, &Bindings::new()).unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}

fn arb_type() -> impl Strategy<Value = DataType> {
    prop::sample::select(ALL_TYPES.to_vec())
}

proptest! {
    #[test]
    fn prop_comparability_is_symmetric(a in arb_type(), b in arb_type()) {
        prop_assert_eq!(check_comparable(a, b).is_ok(), check_comparable(b, a).is_ok());
        let same = comparability_class(a) == comparability_class(b);
        let untyped = a == DataType::Null || b == DataType::Null;
        prop_assert_eq!(can_compare(comparability_class(a), comparability_class(b)), same || untyped);
    }

    #[test]
    fn prop_dominant_type_is_order_independent(types in prop::collection::vec(arb_type(), 1..5)) {
        let forward = dominant_type(&types);
        let mut reversed = types.clone();
        reversed.reverse();
        let backward = dominant_type(&reversed);
        prop_assert_eq!(forward.is_ok(), backward.is_ok());
        if let (Ok(f), Ok(b)) = (forward, backward) {
            prop_assert_eq!(comparability_class(f), comparability_class(b));
        }
    }

    #[test]
    fn prop_semi_join_matches_in_list(
        list in prop::collection::vec(0i64..40, 1..60),
        customers in prop::collection::vec(0i64..40, 0..30),
        negated in any::<bool>(),
    ) {
        let catalog = catalog();
        let candidates: Vec<ScalarExpr> = list.into_iter().map(ScalarExpr::literal).collect();
        let predicate = if negated {
            Predicate::not_in_list(ScalarExpr::column(1, 1), candidates)
        } else {
            Predicate::in_list(ScalarExpr::column(1, 1), candidates)
        };
        let block = QueryBlock::new(orders(&catalog)).with_where(predicate);
        let rows: Vec<Row> = customers
            .iter()
            .enumerate()
            .map(|(i, &c)| Row::from_values(vec![
                Value::integer(i as i64),
                Value::integer(c),
                Value::null(DataType::Varchar),
            ]))
            .collect();
        let data = TableData::new().with_table("orders", rows);

        let expected = execute_block(&block, &data, &Bindings::new()).unwrap();
        for config in [RewriteConfig::default(), RewriteConfig::aggressive()] {
            let plan = QueryRewriter::new(&catalog, config).rewrite(&block).unwrap();
            if negated {
                prop_assert!(plan.semi_joins.is_empty());
            }
            let actual = execute_plan(&plan, &data, &Bindings::new()).unwrap();
            prop_assert_eq!(&actual, &expected);
        }
    }
}
