//! End-to-end analysis of hand-built program trees

use pretty_assertions::assert_eq;
use unitc::ast::{BinaryOp, Program, TreeBuilder, TypeRef, UnaryOp};
use unitc::common::SemaError;
use unitc::units::{Direction, UnitsDescription};
use unitc::{Analysis, DiagnosticKind, SemanticAnalyzer, UnitCatalog, Value};

fn catalog() -> UnitCatalog {
    let description = UnitsDescription::new()
        .base("meter", "m")
        .base("second", "s")
        .scaled("kilometer", "km", "meter", 1000.0, Direction::ChildToParent)
        .scaled("minute", "min", "second", 60.0, Direction::ChildToParent)
        .compound("speed", "mps", &[("meter", 1), ("second", -1)]);
    UnitCatalog::from_description(&description).unwrap()
}

fn analyze(catalog: &UnitCatalog, program: &Program) -> Analysis {
    SemanticAnalyzer::new(catalog).analyze(program).unwrap()
}

fn measurement(value: &Value) -> (String, f64) {
    let m = value.as_measurement().expect("measurement");
    (m.unit.name.clone(), m.value)
}

#[test]
fn test_add_converts_into_left_unit() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let five_km = b.measure(5.0, "km");
    let x = b.declare(TypeRef::Number, "x", Some(five_km));
    let x_ref = b.var("x");
    let three_m = b.measure(3.0, "m");
    let sum = b.binary(BinaryOp::Add, x_ref, three_m);
    let y = b.declare(TypeRef::Number, "y", Some(sum));
    let y_id = y.id;
    let main = b.entry("main", vec![x, y]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert!(analysis.valid);

    let (unit, value) = measurement(analysis.results.get(y_id).unwrap());
    assert_eq!(unit, "kilometer");
    assert!((value - 5.003).abs() < 1e-12, "{value}");
}

#[test]
fn test_two_entry_points_halt() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let first = b.entry("main", vec![]);
    let second = b.entry("start", vec![]);

    let err = SemanticAnalyzer::new(&c)
        .analyze(&Program::from_parts(vec![], vec![first, second]))
        .unwrap_err();
    assert!(matches!(err, SemaError::DuplicateEntryPoint { .. }));
}

#[test]
fn test_missing_entry_point_halts() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let helper = b.function("helper", &[], None, vec![]);

    let err = SemanticAnalyzer::new(&c)
        .analyze(&Program::from_parts(vec![], vec![helper]))
        .unwrap_err();
    assert!(matches!(err, SemaError::MissingEntryPoint));
}

#[test]
fn test_errors_in_independent_statements_are_all_reported() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let abc = b.text("abc");
    let yes = b.flag(true);
    let mixed = b.binary(BinaryOp::Add, abc, yes);
    let label = b.declare(TypeRef::Text, "label", Some(mixed));
    let label_ref = b.var("label");
    let print_label = b.print(label_ref);
    let ghost = b.var("ghost");
    let print_ghost = b.print(ghost);
    let main = b.entry("main", vec![label, print_label, print_ghost]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert!(!analysis.valid);
    assert_eq!(
        analysis.kinds(),
        vec![
            DiagnosticKind::IncompatibleOperandTypes,
            DiagnosticKind::UndeclaredVariable,
        ]
    );
}

#[test]
fn test_argument_mismatch_reports_second_position_once() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let f = b.function(
        "f",
        &[("n", TypeRef::Number), ("flag", TypeRef::Flag)],
        None,
        vec![],
    );
    let five_m = b.measure(5.0, "m");
    let x = b.text("x");
    let x_id = x.id;
    let call = b.call("f", vec![five_m, x]);
    let call_stmt = b.expr_stmt(call);
    let main = b.entry("main", vec![call_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![f, main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::ArgumentTypeMismatch]);
    assert_eq!(analysis.diagnostics[0].span.start, x_id.0 as usize);
    assert!(analysis.diagnostics[0].message.contains("argument 2"));
}

#[test]
fn test_arity_mismatch() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let f = b.function("f", &[("n", TypeRef::Number)], None, vec![]);
    let call = b.call("f", vec![]);
    let call_stmt = b.expr_stmt(call);
    let main = b.entry("main", vec![call_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main, f]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::ArgumentArityMismatch]);
}

#[test]
fn test_undeclared_function() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let call = b.call("nowhere", vec![]);
    let call_stmt = b.expr_stmt(call);
    let main = b.entry("main", vec![call_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::UndeclaredFunction]);
}

#[test]
fn test_call_converts_arguments_and_checks_body() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // meter half(meter d) { return d / 2; }
    let d = b.var("d");
    let two = b.number(2.0);
    let half_d = b.binary(BinaryOp::Div, d, two);
    let ret = b.ret(Some(half_d));
    let half = b.function(
        "half",
        &[("d", TypeRef::unit("meter"))],
        Some(TypeRef::unit("meter")),
        vec![ret],
    );

    let five_km = b.measure(5.0, "km");
    let call = b.call("half", vec![five_km]);
    let r = b.declare(TypeRef::unit("meter"), "r", Some(call));
    let r_id = r.id;
    let main = b.entry("main", vec![r]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![half, main]));
    assert!(analysis.valid, "{:?}", analysis.diagnostics);
    let (unit, _) = measurement(analysis.results.get(r_id).unwrap());
    assert_eq!(unit, "meter");
}

#[test]
fn test_return_type_mismatch_found_at_call_site() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let text = b.text("nope");
    let ret = b.ret(Some(text));
    let g = b.function("g", &[], Some(TypeRef::unit("meter")), vec![ret]);

    let call = b.call("g", vec![]);
    let call_stmt = b.expr_stmt(call);
    let main = b.entry("main", vec![call_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main, g]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::IncompatibleReturnType]);
}

#[test]
fn test_void_call_used_as_value() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let log = b.function("log", &[], None, vec![]);
    let call = b.call("log", vec![]);
    let z = b.declare(TypeRef::Number, "z", Some(call));
    let main = b.entry("main", vec![z]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![log, main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::IncompatibleOperandTypes]);
}

#[test]
fn test_number_function_infers_unit_from_return() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number pace(number t) { return 3 km / t; }
    let three_km = b.measure(3.0, "km");
    let t = b.var("t");
    let pace_expr = b.binary(BinaryOp::Div, three_km, t);
    let ret = b.ret(Some(pace_expr));
    let pace = b.function("pace", &[("t", TypeRef::Number)], Some(TypeRef::Number), vec![ret]);

    let ten_s = b.measure(10.0, "s");
    let call = b.call("pace", vec![ten_s]);
    let call_id = call.id;
    let v = b.declare(TypeRef::Number, "v", Some(call));
    let main = b.entry("main", vec![v]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![pace, main]));
    assert!(analysis.valid, "{:?}", analysis.diagnostics);
    let (unit, value) = measurement(analysis.results.get(call_id).unwrap());
    assert_eq!(unit, "speed");
    assert_eq!(value, 1.0);
}

#[test]
fn test_recursive_function_terminates() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number down(number n) { if (n > 0) { return down(n - 1); } return n; }
    let n = b.var("n");
    let zero = b.number(0.0);
    let positive = b.binary(BinaryOp::Gt, n, zero);
    let n2 = b.var("n");
    let one = b.number(1.0);
    let minus = b.binary(BinaryOp::Sub, n2, one);
    let recurse = b.call("down", vec![minus]);
    let ret_recurse = b.ret(Some(recurse));
    let then = b.block(vec![ret_recurse]);
    let branch = b.if_chain(vec![(positive, then)], None);
    let n3 = b.var("n");
    let ret_n = b.ret(Some(n3));
    let down = b.function(
        "down",
        &[("n", TypeRef::Number)],
        Some(TypeRef::Number),
        vec![branch, ret_n],
    );

    let three = b.number(3.0);
    let call = b.call("down", vec![three]);
    let print = b.print(call);
    let main = b.entry("main", vec![print]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![down, main]));
    assert!(analysis.valid, "{:?}", analysis.diagnostics);
}

#[test]
fn test_cast_to_number_warns_about_discarded_unit() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let five_m = b.measure(5.0, "m");
    let cast = b.cast("number", five_m);
    let cast_id = cast.id;
    let print = b.print(cast);
    let main = b.entry("main", vec![print]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert!(analysis.valid);
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::DiscardedUnit]);
    assert_eq!(analysis.error_count(), 0);
    assert_eq!(
        measurement(analysis.results.get(cast_id).unwrap()),
        ("number".to_string(), 5.0)
    );
}

#[test]
fn test_cast_between_units() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let two_min = b.measure(2.0, "min");
    let to_s = b.cast("s", two_min);
    let to_s_id = to_s.id;
    let print_s = b.print(to_s);
    let one_m = b.measure(1.0, "m");
    let to_min = b.cast("min", one_m);
    let print_min = b.print(to_min);
    let yes = b.flag(true);
    let flag_cast = b.cast("m", yes);
    let print_flag = b.print(flag_cast);
    let main = b.entry("main", vec![print_s, print_min, print_flag]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(
        analysis.kinds(),
        vec![
            DiagnosticKind::UnitNotConvertible,
            DiagnosticKind::IncompatibleOperandTypes,
        ]
    );
    assert_eq!(
        measurement(analysis.results.get(to_s_id).unwrap()),
        ("second".to_string(), 120.0)
    );
}

#[test]
fn test_incompatible_addition() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let m = b.measure(1.0, "m");
    let s = b.measure(1.0, "s");
    let sum = b.binary(BinaryOp::Add, m, s);
    let print = b.print(sum);
    let main = b.entry("main", vec![print]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::UnitNotConvertible]);
}

#[test]
fn test_block_scopes_are_discarded() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // if (true) { meter inner = "x"; }  meter inner = 1 m;  inner = 2 km;
    let cond = b.flag(true);
    let bad = b.text("x");
    let inner_decl = b.declare(TypeRef::unit("meter"), "inner", Some(bad));
    let then = b.block(vec![inner_decl]);
    let branch = b.if_chain(vec![(cond, then)], None);
    let one_m = b.measure(1.0, "m");
    let outer = b.declare(TypeRef::unit("meter"), "inner", Some(one_m));
    let two_km = b.measure(2.0, "km");
    let assign = b.assign("inner", two_km);
    let assign_id = assign.id;
    let main = b.entry("main", vec![branch, outer, assign]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::IncompatibleOperandTypes]);
    assert_eq!(
        measurement(analysis.results.get(assign_id).unwrap()),
        ("meter".to_string(), 2000.0)
    );
}

#[test]
fn test_functions_do_not_see_caller_locals() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let secret = b.var("local");
    let print = b.print(secret);
    let peek = b.function("peek", &[], None, vec![print]);

    let one = b.number(1.0);
    let local = b.declare(TypeRef::Number, "local", Some(one));
    let call = b.call("peek", vec![]);
    let call_stmt = b.expr_stmt(call);
    let main = b.entry("main", vec![local, call_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![peek, main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::UndeclaredVariable]);
}

#[test]
fn test_globals_visible_in_functions() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let limit_value = b.measure(10.0, "km");
    let limit = b.declare(TypeRef::unit("meter"), "limit", Some(limit_value));
    let limit_id = limit.id;

    let limit_ref = b.var("limit");
    let one_m = b.measure(1.0, "m");
    let cond = b.binary(BinaryOp::Lt, one_m, limit_ref);
    let not = b.unary(UnaryOp::Not, cond);
    let body = b.block(vec![]);
    let loop_stmt = b.while_loop(not, body);
    let main = b.entry("main", vec![loop_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![limit], vec![main]));
    assert!(analysis.valid, "{:?}", analysis.diagnostics);
    assert_eq!(
        measurement(analysis.results.get(limit_id).unwrap()),
        ("meter".to_string(), 10_000.0)
    );
}

#[test]
fn test_non_boolean_condition() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let cond = b.measure(1.0, "m");
    let body = b.block(vec![]);
    let loop_stmt = b.for_loop(None, Some(cond), None, body);
    let main = b.entry("main", vec![loop_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::IncompatibleOperandTypes]);
}

#[test]
fn test_duplicate_function_reported_on_later_declaration() {
    let c = catalog();
    let mut b = TreeBuilder::new();
    let first = b.function("f", &[], None, vec![]);
    let second = b.function("f", &[("x", TypeRef::Number)], None, vec![]);
    let second_span = second.span;
    let main = b.entry("main", vec![]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![first, second, main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::DuplicateDeclaration]);
    assert_eq!(analysis.diagnostics[0].span, second_span);
}

#[test]
fn test_loop_counter_is_not_its_initial_value() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number n = 0; while (n < 3) { n = n + 1; } number r = 6 m / n;
    let zero = b.number(0.0);
    let n = b.declare(TypeRef::Number, "n", Some(zero));
    let n_ref = b.var("n");
    let three = b.number(3.0);
    let cond = b.binary(BinaryOp::Lt, n_ref, three);
    let n_ref = b.var("n");
    let one = b.number(1.0);
    let next = b.binary(BinaryOp::Add, n_ref, one);
    let step = b.assign("n", next);
    let body = b.block(vec![step]);
    let loop_stmt = b.while_loop(cond, body);
    let six_m = b.measure(6.0, "m");
    let n_ref = b.var("n");
    let div = b.binary(BinaryOp::Div, six_m, n_ref);
    let r = b.declare(TypeRef::Number, "r", Some(div));
    let r_id = r.id;
    let main = b.entry("main", vec![n, loop_stmt, r]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert!(analysis.valid, "{:?}", analysis.diagnostics);
    let (unit, _) = measurement(analysis.results.get(r_id).unwrap());
    assert_eq!(unit, "meter");
}

#[test]
fn test_for_loop_variable_is_unknown_in_body() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // for (number i = 0; i < 3; i = i + 1) { print 6 m / i; }
    let zero = b.number(0.0);
    let init = b.declare(TypeRef::Number, "i", Some(zero));
    let i_ref = b.var("i");
    let three = b.number(3.0);
    let cond = b.binary(BinaryOp::Lt, i_ref, three);
    let i_ref = b.var("i");
    let one = b.number(1.0);
    let next = b.binary(BinaryOp::Add, i_ref, one);
    let update = b.assign("i", next);
    let six_m = b.measure(6.0, "m");
    let i_ref = b.var("i");
    let div = b.binary(BinaryOp::Div, six_m, i_ref);
    let print = b.print(div);
    let body = b.block(vec![print]);
    let loop_stmt = b.for_loop(Some(init), Some(cond), Some(update), body);
    let main = b.entry("main", vec![loop_stmt]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert!(analysis.valid, "{:?}", analysis.diagnostics);
}

#[test]
fn test_guarded_division_is_valid() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number d = 0; if (d != 0) { number r = 10 m / d; }
    let zero = b.number(0.0);
    let d = b.declare(TypeRef::Number, "d", Some(zero));
    let d_ref = b.var("d");
    let zero = b.number(0.0);
    let guard = b.binary(BinaryOp::Ne, d_ref, zero);
    let ten_m = b.measure(10.0, "m");
    let d_ref = b.var("d");
    let div = b.binary(BinaryOp::Div, ten_m, d_ref);
    let r = b.declare(TypeRef::Number, "r", Some(div));
    let then = b.block(vec![r]);
    let branch = b.if_chain(vec![(guard, then)], None);
    let main = b.entry("main", vec![d, branch]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert!(analysis.valid, "{:?}", analysis.diagnostics);
}

#[test]
fn test_straight_line_zero_still_divides_by_zero() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number z = 0; number r = 10 m / z;
    let zero = b.number(0.0);
    let z = b.declare(TypeRef::Number, "z", Some(zero));
    let ten_m = b.measure(10.0, "m");
    let z_ref = b.var("z");
    let div = b.binary(BinaryOp::Div, ten_m, z_ref);
    let r = b.declare(TypeRef::Number, "r", Some(div));
    let main = b.entry("main", vec![z, r]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::DivisionByZero]);
}

#[test]
fn test_unit_power_needs_constant_exponent() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number two() { return 2; }
    let two = b.number(2.0);
    let ret = b.ret(Some(two));
    let two_fn = b.function("two", &[], Some(TypeRef::Number), vec![ret]);

    // number a = 3 m ^ two();
    let three_m = b.measure(3.0, "m");
    let call = b.call("two", vec![]);
    let pow = b.binary(BinaryOp::Pow, three_m, call);
    let a = b.declare(TypeRef::Number, "a", Some(pow));
    let main = b.entry("main", vec![a]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![two_fn, main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::IncompatibleOperandTypes]);
    assert!(analysis.diagnostics[0].message.contains("must be a constant"));
}

#[test]
fn test_unit_power_rejects_loop_variable_exponent() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number k = 2; number sq = 3 m ^ k;
    // while (k < 4) { k = k + 1; } number a = 3 m ^ k;
    let two = b.number(2.0);
    let k = b.declare(TypeRef::Number, "k", Some(two));
    let three_m = b.measure(3.0, "m");
    let k_ref = b.var("k");
    let pow = b.binary(BinaryOp::Pow, three_m, k_ref);
    let sq = b.declare(TypeRef::Number, "sq", Some(pow));
    let sq_id = sq.id;
    let k_ref = b.var("k");
    let four = b.number(4.0);
    let cond = b.binary(BinaryOp::Lt, k_ref, four);
    let k_ref = b.var("k");
    let one = b.number(1.0);
    let next = b.binary(BinaryOp::Add, k_ref, one);
    let step = b.assign("k", next);
    let body = b.block(vec![step]);
    let loop_stmt = b.while_loop(cond, body);
    let three_m = b.measure(3.0, "m");
    let k_ref = b.var("k");
    let pow = b.binary(BinaryOp::Pow, three_m, k_ref);
    let a = b.declare(TypeRef::Number, "a", Some(pow));
    let main = b.entry("main", vec![k, sq, loop_stmt, a]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::IncompatibleOperandTypes]);
    let (_, value) = measurement(analysis.results.get(sq_id).unwrap());
    assert!((value - 9.0).abs() < 1e-12, "{value}");
}

#[test]
fn test_body_problem_reported_once_across_argument_shapes() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // f(number k) { print ghost; }
    let ghost = b.var("ghost");
    let print = b.print(ghost);
    let f = b.function("f", &[("k", TypeRef::Number)], None, vec![print]);

    let mut calls = Vec::new();
    for unit in ["m", "s", "km"] {
        let arg = b.measure(1.0, unit);
        let call = b.call("f", vec![arg]);
        calls.push(b.expr_stmt(call));
    }
    let main = b.entry("main", calls);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![f, main]));
    assert_eq!(analysis.kinds(), vec![DiagnosticKind::UndeclaredVariable]);
}

#[test]
fn test_failed_declaration_reports_only_its_initializer() {
    let c = catalog();
    let mut b = TreeBuilder::new();

    // number km = ghost; number x = ghost; print x;
    let ghost = b.var("ghost");
    let reserved = b.declare(TypeRef::Number, "km", Some(ghost));
    let ghost = b.var("ghost");
    let x = b.declare(TypeRef::Number, "x", Some(ghost));
    let x_ref = b.var("x");
    let print = b.print(x_ref);
    let main = b.entry("main", vec![reserved, x, print]);

    let analysis = analyze(&c, &Program::from_parts(vec![], vec![main]));
    assert_eq!(
        analysis.kinds(),
        vec![DiagnosticKind::UndeclaredVariable, DiagnosticKind::UndeclaredVariable]
    );
}
