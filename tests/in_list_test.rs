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

//! IN List Tests
//!
//! Probe strategies against the naive OR expansion, duplicate candidates,
//! literal pruning and the semi-join path

use proptest::prelude::*;
use sqlrewrite::expression::in_list::evaluate_in_list_naive;
use sqlrewrite::optimizer::{JoinNode, TableRef};
use sqlrewrite::rewrite::{QueryBlock, QueryRewriter, RewriteConfig};
use sqlrewrite::{
    execute_block, execute_plan, Bindings, CatalogSnapshot, DataType, InListProbe, Predicate,
    ProbeStrategy, ProbeThresholds, RewriteRule, Row, ScalarExpr, SchemaBuilder, SqlState,
    TableData, TriBool, Value,
};

const STRATEGIES: [ProbeStrategy; 3] = [
    ProbeStrategy::Linear,
    ProbeStrategy::BinarySearch,
    ProbeStrategy::Hash,
];

fn arb_candidate() -> impl Strategy<Value = Value> {
    prop_oneof![
        20 => (-60i64..60).prop_map(Value::integer),
        3 => (-60i64..60).prop_map(|v| Value::decimal(v * 10, 1)),
        2 => (-600i64..600).prop_map(|v| Value::decimal(v, 1)),
        2 => (-240i64..240).prop_map(|v| Value::float(v as f64 / 4.0)),
        1 => Just(Value::null(DataType::Integer)),
    ]
}

fn arb_list() -> impl Strategy<Value = Vec<Value>> {
    prop_oneof![Just(1usize), Just(2), Just(15), Just(16), Just(1000)]
        .prop_flat_map(|n| prop::collection::vec(arb_candidate(), n))
}

fn arb_target() -> impl Strategy<Value = Value> {
    prop_oneof![
        10 => (-70i64..70).prop_map(Value::integer),
        3 => (-280i64..280).prop_map(|v| Value::float(v as f64 / 4.0)),
        1 => Just(Value::null(DataType::Integer)),
    ]
}

fn catalog() -> CatalogSnapshot {
    CatalogSnapshot::new(1).with_table(
        SchemaBuilder::new("t")
            .add_primary_key("id", DataType::Integer)
            .add_indexed("v", DataType::Integer)
            .add_nullable("w", DataType::Integer)
            .build(),
    )
}

/// v holds 0..=30 with 3 appearing twice; w has one NULL
fn fixture() -> TableData {
    let mut rows: Vec<Row> = (0..=30)
        .map(|v| Row::from_values(vec![Value::integer(v), Value::integer(v), Value::integer(v)]))
        .collect();
    rows.push(Row::from_values(vec![
        Value::integer(100),
        Value::integer(3),
        Value::null(DataType::Integer),
    ]));
    rows.push(Row::from_values(vec![
        Value::integer(101),
        Value::integer(50),
        Value::integer(4),
    ]));
    TableData::new().with_table("t", rows)
}

fn block(catalog: &CatalogSnapshot, predicate: Predicate) -> QueryBlock {
    let from = JoinNode::leaf(TableRef::bind(1, "t", catalog).unwrap());
    QueryBlock::new(from).with_where(predicate)
}

fn odd_list_with_duplicates() -> Vec<ScalarExpr> {
    let mut list: Vec<ScalarExpr> = (1..=29).step_by(2).map(ScalarExpr::literal).collect();
    list.push(ScalarExpr::literal(3));
    list.push(ScalarExpr::literal(29));
    list
}

fn ids(rows: &[Row]) -> Vec<i64> {
    let mut ids: Vec<i64> = rows
        .iter()
        .filter_map(|r| r.get(0).and_then(Value::as_int64))
        .collect();
    ids.sort_unstable();
    ids
}

#[test]
fn test_strategy_chosen_by_distinct_size() {
    let thresholds = ProbeThresholds::default();
    let list = |n: i64| (0..n).map(Value::integer).collect::<Vec<_>>();
    assert_eq!(
        InListProbe::build(&list(15), false, thresholds).unwrap().strategy(),
        ProbeStrategy::Linear
    );
    assert_eq!(
        InListProbe::build(&list(16), false, thresholds).unwrap().strategy(),
        ProbeStrategy::BinarySearch
    );
    assert_eq!(
        InListProbe::build(&list(512), false, thresholds).unwrap().strategy(),
        ProbeStrategy::Hash
    );

    // Duplicates do not count toward the size
    let repeated: Vec<Value> = (0..40).map(|i| Value::integer(i % 4)).collect();
    let probe = InListProbe::build(&repeated, false, thresholds).unwrap();
    assert_eq!(probe.len(), 4);
    assert_eq!(probe.strategy(), ProbeStrategy::Linear);
}

#[test]
fn test_null_candidates() {
    let list = [Value::integer(1), Value::null(DataType::Integer)];
    for strategy in STRATEGIES {
        let probe = InListProbe::with_strategy(&list, false, strategy).unwrap();
        assert_eq!(probe.probe(&Value::integer(1)).unwrap(), TriBool::True);
        assert_eq!(probe.probe(&Value::integer(2)).unwrap(), TriBool::Unknown);

        let negated = InListProbe::with_strategy(&list, true, strategy).unwrap();
        assert_eq!(negated.probe(&Value::integer(1)).unwrap(), TriBool::False);
        assert_eq!(negated.probe(&Value::integer(2)).unwrap(), TriBool::Unknown);
    }
}

#[test]
fn test_duplicates_do_not_duplicate_output() {
    let catalog = catalog();
    let data = fixture();
    let block = block(
        &catalog,
        Predicate::in_list(ScalarExpr::column(1, 1), odd_list_with_duplicates()),
    );
    let baseline = execute_block(&block, &data, &Bindings::new()).unwrap();

    let configs = [
        RewriteConfig::default(),
        RewriteConfig::default().with_in_list_thresholds(1, 1_000),
        RewriteConfig::default().with_in_list_thresholds(1, 1),
        RewriteConfig::default().with_semi_join_rewrite(false),
        RewriteConfig::aggressive(),
    ];
    for config in configs {
        let plan = QueryRewriter::new(&catalog, config).rewrite(&block).unwrap();
        let rows = execute_plan(&plan, &data, &Bindings::new()).unwrap();
        let threes = rows
            .iter()
            .filter(|r| r.get(1) == Some(&Value::integer(3)))
            .count();
        assert_eq!(threes, 2, "{:?}", config);
        assert_eq!(ids(&rows), ids(&baseline), "{:?}", config);
        assert_eq!(rows.len(), 16);
    }
}

#[test]
fn test_semi_join_applies_to_indexed_preserved_column() {
    let catalog = catalog();
    let data = fixture();
    let indexed = block(
        &catalog,
        Predicate::in_list(ScalarExpr::column(1, 1), odd_list_with_duplicates()),
    );
    let plan = QueryRewriter::new(&catalog, RewriteConfig::aggressive())
        .rewrite(&indexed)
        .unwrap();
    assert!(plan.was_applied(RewriteRule::InListSemiJoin));
    assert_eq!(plan.semi_joins.len(), 1);
    assert_eq!(plan.semi_joins[0].len(), 15);
    assert_eq!(execute_plan(&plan, &data, &Bindings::new()).unwrap().len(), 16);

    let unindexed = block(
        &catalog,
        Predicate::in_list(ScalarExpr::column(1, 2), odd_list_with_duplicates()),
    );
    let plan = QueryRewriter::new(&catalog, RewriteConfig::aggressive())
        .rewrite(&unindexed)
        .unwrap();
    assert!(!plan.was_applied(RewriteRule::InListSemiJoin));
    assert!(plan.was_skipped(RewriteRule::InListSemiJoin));
    assert!(plan.semi_joins.is_empty());
}

#[test]
fn test_pruning_unrepresentable_literals() {
    let catalog = catalog();
    let data = fixture();
    // w IN (4, 4.23): 4.23 can never equal an INTEGER
    let block = block(
        &catalog,
        Predicate::in_list(
            ScalarExpr::column(1, 2),
            vec![ScalarExpr::literal(4), ScalarExpr::literal(Value::decimal(423, 2))],
        ),
    );
    let plan = QueryRewriter::new(&catalog, RewriteConfig::default())
        .rewrite(&block)
        .unwrap();
    assert!(plan.was_applied(RewriteRule::InListPruning));
    assert_eq!(ids(&execute_plan(&plan, &data, &Bindings::new()).unwrap()), vec![4, 101]);

    // Every candidate pruned: the filter can never pass
    let hopeless = self::block(
        &catalog,
        Predicate::in_list(
            ScalarExpr::column(1, 2),
            vec![ScalarExpr::literal(Value::decimal(45, 1))],
        ),
    );
    let plan = QueryRewriter::new(&catalog, RewriteConfig::default())
        .rewrite(&hopeless)
        .unwrap();
    assert!(execute_plan(&plan, &data, &Bindings::new()).unwrap().is_empty());
}

fn measurements() -> (CatalogSnapshot, TableData) {
    let catalog = CatalogSnapshot::new(1).with_table(
        SchemaBuilder::new("m")
            .add_primary_key("id", DataType::Integer)
            .add("d", DataType::Double)
            .build(),
    );
    let stored = [0.1, 0.2, 0.3, 0.5, 7.0, 0.1 + 0.2];
    let rows = stored
        .iter()
        .enumerate()
        .map(|(i, &d)| Row::from_values(vec![Value::integer(i as i64 + 1), Value::float(d)]))
        .collect();
    (catalog, TableData::new().with_table("m", rows))
}

fn measurement_block(catalog: &CatalogSnapshot, predicate: Predicate) -> QueryBlock {
    QueryBlock::new(JoinNode::leaf(TableRef::bind(1, "m", catalog).unwrap())).with_where(predicate)
}

fn decimals(values: &[(i64, u32)]) -> Vec<ScalarExpr> {
    values
        .iter()
        .map(|&(m, s)| ScalarExpr::literal(Value::decimal(m, s)))
        .collect()
}

#[test]
fn test_double_column_against_decimal_literals() {
    let (catalog, data) = measurements();
    let d = || ScalarExpr::column(1, 1);
    let cases = [
        // 0.1 is kept and matches the stored double 0.1
        (
            Predicate::in_list(
                d(),
                vec![ScalarExpr::literal(Value::decimal(1, 1)), ScalarExpr::literal(5)],
            ),
            vec![1],
        ),
        // 0.1 + 0.2 is not the double nearest 0.3
        (Predicate::in_list(d(), decimals(&[(3, 1), (7, 1)])), vec![3]),
        (
            Predicate::in_list(d(), decimals(&[(1, 1), (20, 2), (5, 1), (70, 1)])),
            vec![1, 2, 4, 5],
        ),
        (Predicate::not_in_list(d(), decimals(&[(1, 1), (2, 1)])), vec![3, 4, 5, 6]),
    ];
    let configs = [
        RewriteConfig::default(),
        RewriteConfig::no_rewrites(),
        RewriteConfig::default().with_in_list_thresholds(1, 1),
        RewriteConfig::aggressive(),
    ];
    for (predicate, expected) in cases {
        let block = measurement_block(&catalog, predicate.clone());
        let baseline = execute_block(&block, &data, &Bindings::new()).unwrap();
        assert_eq!(ids(&baseline), expected, "{}", predicate);
        for config in configs {
            let plan = QueryRewriter::new(&catalog, config).rewrite(&block).unwrap();
            assert!(!plan.was_applied(RewriteRule::InListPruning), "{}", predicate);
            let rows = execute_plan(&plan, &data, &Bindings::new()).unwrap();
            assert_eq!(ids(&rows), expected, "{} {:?}", predicate, config);
        }
    }
}

#[test]
fn test_double_semi_join_matches_decimal_literals() {
    let catalog = CatalogSnapshot::new(1).with_table(
        SchemaBuilder::new("m")
            .add_primary_key("id", DataType::Integer)
            .add_indexed("d", DataType::Double)
            .build(),
    );
    let (_, data) = measurements();
    let block = measurement_block(
        &catalog,
        Predicate::in_list(ScalarExpr::column(1, 1), decimals(&[(1, 1), (2, 1), (5, 1), (70, 1)])),
    );
    let plan = QueryRewriter::new(&catalog, RewriteConfig::aggressive())
        .rewrite(&block)
        .unwrap();
    assert!(plan.was_applied(RewriteRule::InListSemiJoin));
    let rows = execute_plan(&plan, &data, &Bindings::new()).unwrap();
    assert_eq!(ids(&rows), vec![1, 2, 4, 5]);
}

#[test]
fn test_not_in_is_never_pruned() {
    let catalog = catalog();
    let data = fixture();
    let block = block(
        &catalog,
        Predicate::not_in_list(
            ScalarExpr::column(1, 2),
            vec![ScalarExpr::literal(Value::decimal(423, 2))],
        ),
    );
    let plan = QueryRewriter::new(&catalog, RewriteConfig::default())
        .rewrite(&block)
        .unwrap();
    assert!(!plan.was_applied(RewriteRule::InListPruning));
    // Every non-NULL w passes
    assert_eq!(execute_plan(&plan, &data, &Bindings::new()).unwrap().len(), 32);
}

#[test]
fn test_parameter_candidates() {
    let catalog = catalog();
    let data = fixture();
    let block = block(
        &catalog,
        Predicate::in_list(
            ScalarExpr::column(1, 1),
            vec![ScalarExpr::parameter(0), ScalarExpr::parameter(1), ScalarExpr::literal(7)],
        ),
    );
    let plan = QueryRewriter::new(&catalog, RewriteConfig::default())
        .rewrite(&block)
        .unwrap();
    let params = Bindings::with_params(vec![Value::integer(3), Value::integer(3)]);
    let rows = execute_plan(&plan, &data, &params).unwrap();
    assert_eq!(ids(&rows), vec![3, 7, 100]);

    let err = execute_plan(&plan, &data, &Bindings::with_params(vec![Value::integer(3)]))
        .unwrap_err();
    assert_eq!(err.sql_state(), SqlState::UnboundParameter);
}

#[test]
fn test_illegal_lists() {
    let catalog = catalog();
    let v = || ScalarExpr::column(1, 1);
    let cases = [
        (Predicate::in_list(v(), vec![]), SqlState::SyntaxError),
        (
            Predicate::in_list(v(), vec![ScalarExpr::literal(1), ScalarExpr::null()]),
            SqlState::SyntaxError,
        ),
        (
            Predicate::in_list(
                ScalarExpr::parameter(0),
                vec![ScalarExpr::parameter(1), ScalarExpr::parameter(2)],
            ),
            SqlState::AllParameterOperands,
        ),
        (
            Predicate::in_list(v(), vec![ScalarExpr::literal(1), ScalarExpr::literal("a")]),
            SqlState::ComparisonMismatch,
        ),
    ];
    for (predicate, state) in cases {
        let err = QueryRewriter::new(&catalog, RewriteConfig::default())
            .rewrite(&block(&catalog, predicate.clone()))
            .unwrap_err();
        assert_eq!(err.sql_state(), state, "{}", predicate);
    }
}

proptest! {
    #[test]
    fn prop_strategies_agree_with_naive(
        list in arb_list(),
        target in arb_target(),
        negated in any::<bool>(),
    ) {
        let expected = evaluate_in_list_naive(&target, &list, negated).unwrap();
        for strategy in STRATEGIES {
            let probe = InListProbe::with_strategy(&list, negated, strategy).unwrap();
            prop_assert_eq!(probe.probe(&target).unwrap(), expected, "{}", strategy);
        }
        let built = InListProbe::build(&list, negated, ProbeThresholds::default()).unwrap();
        prop_assert_eq!(built.probe(&target).unwrap(), expected);
    }

    #[test]
    fn prop_not_in_is_negated_in(list in arb_list(), target in arb_target()) {
        let positive = InListProbe::build(&list, false, ProbeThresholds::default()).unwrap();
        let negative = InListProbe::build(&list, true, ProbeThresholds::default()).unwrap();
        prop_assert_eq!(negative.probe(&target).unwrap(), !positive.probe(&target).unwrap());
    }
}
