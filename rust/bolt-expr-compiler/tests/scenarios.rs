//! End-to-end scenarios driving `Expression` the way a host would: build an
//! `Expr`/`Condition`, resolve it, check the emitted commands. Each test
//! here is one of the six end-to-end scenarios, asserted against its exact
//! expected command string(s).

use bolt_expr_compiler::{DataSource, Expression, ExpressionConfig, ExprExt, ScoreSource, TargetKind};

fn driver() -> Expression {
    Expression::new(ExpressionConfig::default())
}

#[test]
fn simple_add_literal() {
    // A host's `obj["@s"] += 5` has no Rust operator to special-case, so it
    // lowers through the builder API the same way the original's lack of
    // `__iadd__` does: a `set` wrapping the self-referential `add`.
    let mut expr = driver();
    let mut sink: Vec<String> = Vec::new();
    let obj = ScoreSource::new("@s", "obj");
    expr.resolve(&obj.clone().set(obj.add(5i64)), None, &mut sink).unwrap();
    assert_eq!(sink, vec!["scoreboard players add @s obj 5"]);
}

#[test]
fn score_into_score() {
    let mut expr = driver();
    let mut sink: Vec<String> = Vec::new();
    let x = ScoreSource::new("#x", "obj");
    let y = ScoreSource::new("#y", "other");
    expr.resolve(&x.set(y), None, &mut sink).unwrap();
    assert_eq!(sink, vec!["scoreboard players operation #x obj = #y other"]);
}

#[test]
fn multiply_by_literal_promotes_a_constant_holder() {
    let mut expr = driver();
    let mut sink: Vec<String> = Vec::new();
    let x = ScoreSource::new("#x", "obj");
    expr.resolve(&x.clone().set(x.mul(3i64)), None, &mut sink).unwrap();
    assert_eq!(sink, vec!["scoreboard players operation #x obj *= $3 bolt.expr.const"]);

    let mut init: Vec<String> = Vec::new();
    expr.generate_init(&mut init);
    assert_eq!(init, vec!["scoreboard players set $3 bolt.expr.const 3"]);
}

#[test]
fn divide_into_untyped_data_widens_to_the_floating_default() {
    let mut expr = driver();
    let mut sink: Vec<String> = Vec::new();
    let v = ScoreSource::new("#v", "obj");
    let out = DataSource::new(TargetKind::Storage, "demo").with_path(bolt_expr_core::Accessor::Key("out".to_string()));
    expr.resolve(&out.set(v.div(100i64)), None, &mut sink).unwrap();
    assert_eq!(sink, vec!["execute store result storage demo out double 0.01 run scoreboard players get #v obj"]);
}

#[test]
fn append_score_to_a_list_reserves_then_stores_the_slot() {
    let mut expr = driver();
    let mut sink: Vec<String> = Vec::new();
    let n = ScoreSource::new("#n", "obj");
    let list = DataSource::new(TargetKind::Storage, "demo").with_path(bolt_expr_core::Accessor::Key("list".to_string()));
    expr.resolve(&list.append(n), None, &mut sink).unwrap();
    assert_eq!(
        sink,
        vec![
            "data modify storage demo list append value 0",
            "execute store result storage demo list[-1] int 1 run scoreboard players get #n obj",
        ]
    );
}

#[test]
fn branch_on_score_truthiness_uses_a_matches_range() {
    let mut expr = driver();
    let mut sink: Vec<String> = Vec::new();
    let health = ScoreSource::new("@s", "obj");
    let k = ScoreSource::new("#k", "other");
    let cond = health.gt(0i64);
    expr.resolve_branch(&cond, &k.set(1i64), &mut sink).unwrap();
    assert_eq!(sink, vec!["execute if score @s obj matches 1.. run scoreboard players set #k other 1"]);
}
