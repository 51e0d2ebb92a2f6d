//! Interpreter integration tests
//!
//! Full pipeline: source → lex → parse → evaluate

use cinder::interp::Payload;
use cinder::interp::value::values_equal;
use cinder::{Interpreter, SourceFile, Value};

/// Helper to evaluate source code and return the result
fn eval(source: &str) -> Result<Value, String> {
    let mut interpreter = Interpreter::new();
    let file = SourceFile::new("<test>", source);
    interpreter
        .evaluate_program(&file)
        .map_err(|e| e.to_string())
}

/// Helper to check the result is a specific number
fn assert_number(source: &str, expected: f64) {
    match eval(source) {
        Ok(v) => match v.payload() {
            Payload::Number(n) => assert_eq!(*n, expected, "source: {}", source),
            _ => panic!("expected Number({}), got {:?}", expected, v),
        },
        Err(e) => panic!("evaluation failed: {}", e),
    }
}

/// Helper to check the result is a specific string
fn assert_string(source: &str, expected: &str) {
    match eval(source) {
        Ok(v) => match v.payload() {
            Payload::Str(s) => assert_eq!(s, expected, "source: {}", source),
            _ => panic!("expected Str({:?}), got {:?}", expected, v),
        },
        Err(e) => panic!("evaluation failed: {}", e),
    }
}

/// Helper to check the result is a list of the given numbers
fn assert_numbers(source: &str, expected: &[f64]) {
    match eval(source) {
        Ok(v) => {
            let want = Value::list(expected.iter().map(|n| Value::number(*n)).collect());
            assert!(
                values_equal(&v, &want),
                "expected {:?}, got {:?} (source: {})",
                want,
                v,
                source
            );
        }
        Err(e) => panic!("evaluation failed: {}", e),
    }
}

/// Helper to check evaluation fails with a message containing `fragment`
fn assert_error_containing(source: &str, fragment: &str) {
    match eval(source) {
        Ok(v) => panic!("expected an error containing {:?}, got {:?}", fragment, v),
        Err(e) => assert!(
            e.contains(fragment),
            "expected error containing {:?}, got {:?}",
            fragment,
            e
        ),
    }
}

// ==================== Literals and Basic Dispatch ====================

#[test]
fn test_number_literal() {
    assert_number("42", 42.0);
    assert_number("2.5", 2.5);
}

#[test]
fn test_string_literal() {
    assert_string(r#""hello""#, "hello");
}

#[test]
fn test_numeric_methods() {
    assert_number("1.add(2)", 3.0);
    assert_number("10.sub(4)", 6.0);
    assert_number("6.mul(7)", 42.0);
    assert_number("9.div(2)", 4.5);
    assert_number("2.pow(10)", 1024.0);
    assert_number("47.mod(5)", 2.0);
    assert_number("2.5.int()", 2.0);
    assert_number("7.xor(2)", 5.0);
    assert_number("1.shl(4)", 16.0);
    assert_number("16.shr(3)", 2.0);
}

#[test]
fn test_method_chaining() {
    assert_number("2.mul(3).add(4)", 10.0);
}

#[test]
fn test_comparisons_yield_number_booleans() {
    assert_number("3.gt(2)", 1.0);
    assert_number("2.gt(3)", 0.0);
    assert_number("2.lt(3)", 1.0);
    assert_number("1.and(0)", 0.0);
    assert_number("1.or(0)", 1.0);
    assert_number("0.not()", 1.0);
    assert_number("5.not()", 0.0);
}

#[test]
fn test_division_by_zero_is_an_error() {
    assert_error_containing("1.div(0)", "Division by zero");
    assert_error_containing("1.mod(0)", "Division by zero");
}

#[test]
fn test_wrong_method_argument_kind() {
    assert_error_containing(r#"1.add("two")"#, "expects a number");
}

// ==================== Strings and Bytes ====================

#[test]
fn test_string_methods() {
    assert_number(r#""hello".len()"#, 5.0);
    assert_number(r#""3.25".num()"#, 3.25);
    assert_string(r#""a,b,c".split(",").get(1)"#, "b");
    assert_string(r#""ab".concat("cd")"#, "abcd");
    assert_string(r#""ab".repeat(3)"#, "ababab");
    assert_number(r#""abc".chars().len()"#, 3.0);
}

#[test]
fn test_string_num_failure_is_catchable() {
    assert_string(r#"try ("nope".num()) except ("caught")"#, "caught");
}

#[test]
fn test_bytes_round_trip_through_encode_decode() {
    assert_string(r#""hello".encode().decode()"#, "hello");
    assert_number(r#""hi".encode().len()"#, 2.0);
    assert_number(r#""hi".encode().list().get(0)"#, 104.0);
    assert_number(r#""ab".encode().concat("cd".encode()).len()"#, 4.0);
}

// ==================== Truthiness ====================

#[test]
fn test_only_zero_is_falsy() {
    assert_number("if (0) 1 else 2", 2.0);
    assert_number("if (0.5) 1 else 2", 1.0);
    assert_number(r#"if ("") 1 else 2"#, 1.0);
    assert_number("if (list()) 1 else 2", 1.0);
    // The unit value is truthy; only the Number 0 is not
    assert_number("if (None) 1 else 2", 1.0);
}

#[test]
fn test_if_without_else_yields_unit() {
    let v = eval("if (0) 1").expect("evaluation succeeds");
    assert!(matches!(v.payload(), Payload::Unit));
}

// ==================== Lists and Aliasing ====================

#[test]
fn test_list_construction_and_access() {
    assert_number("list(1, 2, 3).len()", 3.0);
    assert_number("list(1, 2, 3).get(1)", 2.0);
    assert_number("list(1, 2, 3).get(0.sub(1))", 3.0);
}

#[test]
fn test_list_index_out_of_range() {
    assert_error_containing("list(1).get(5)", "out of range");
    assert_error_containing("list().pop()", "empty list");
}

#[test]
fn test_float_indices_truncate_toward_zero() {
    assert_number("list(1, 2, 3).get(1.9)", 2.0);
}

#[test]
fn test_list_aliasing_through_rebinding() {
    assert_number(
        "let a = list(1, 2)
         let b = a
         b.append(3)
         a.len()",
        3.0,
    );
    assert_number(
        "let a = list(1, 2)
         let b = a
         b.set(0, 9)
         a.get(0)",
        9.0,
    );
}

#[test]
fn test_list_aliasing_through_function_parameters() {
    assert_number(
        "let a = list(1)
         let push = def (l) l.append(2)
         push(a)
         a.len()",
        2.0,
    );
}

#[test]
fn test_list_transforms() {
    assert_numbers("list(1, 2, 3).map(def (x) x.mul(2))", &[2.0, 4.0, 6.0]);
    assert_numbers("list(1, 2, 3, 4).filter(def (x) x.gt(2))", &[3.0, 4.0]);
    assert_numbers("list(1, 2, 3).reverse()", &[3.0, 2.0, 1.0]);
    assert_numbers("list(1, 2, 3, 4).take(2)", &[1.0, 2.0]);
    assert_numbers("list(1, 2, 3, 4).drop(3)", &[4.0]);
    assert_number("list(10, 20, 30).index(20)", 1.0);
    assert_string(r#"list("a", "b").join("-")"#, "a-b");
}

#[test]
fn test_list_index_of_missing_value() {
    assert_error_containing("list(1).index(2)", "not found");
}

// ==================== Bindings and Mutability ====================

#[test]
fn test_redeclaring_immutable_binding_fails() {
    assert_error_containing("let x = 1; x = 2", "immutable binding `x`");
    assert_error_containing("let x = 1; let x = 2", "immutable binding `x`");
}

#[test]
fn test_mutable_binding_updates_in_place() {
    assert_number("let mut y = 1; y = 2; y", 2.0);
}

#[test]
fn test_mutable_update_from_inner_scope() {
    assert_number("let mut y = 1; do y = 5 end; y", 5.0);
}

#[test]
fn test_builtins_cannot_be_reassigned() {
    assert_error_containing("print = 5", "immutable binding `print`");
}

#[test]
fn test_declaration_evaluates_to_the_value() {
    assert_number("let x = 7", 7.0);
}

#[test]
fn test_unbound_name_is_a_name_error() {
    assert_error_containing("missing_variable", "No such variable");
}

// ==================== Blocks and Scoping ====================

#[test]
fn test_block_value_is_the_last_expression() {
    assert_number("do 1; 2; 3 end", 3.0);
}

#[test]
fn test_empty_block_yields_unit() {
    let v = eval("do end").expect("evaluation succeeds");
    assert!(matches!(v.payload(), Payload::Unit));
}

#[test]
fn test_block_locals_visible_to_siblings() {
    assert_number("do let a = 1; a.add(1) end", 2.0);
}

#[test]
fn test_block_locals_merge_into_enclosing_scope() {
    assert_number("do let z = 9 end; z", 9.0);
}

#[test]
fn test_block_locals_not_visible_before_the_block() {
    assert_error_containing("z; do let z = 9 end", "No such variable");
}

// ==================== While Loops ====================

#[test]
fn test_while_collects_iteration_values() {
    assert_numbers(
        "let mut i = 0; while (i.lt(3)) do i = i.add(1); i end",
        &[1.0, 2.0, 3.0],
    );
}

#[test]
fn test_while_false_on_entry_is_empty_list() {
    assert_numbers("while (0) 1", &[]);
}

#[test]
fn test_break_truncates_the_collected_list() {
    assert_numbers(
        "let mut i = 0
         while (i.lt(5)) do
             i = i.add(1)
             if (i.gt(2)) break
             i
         end",
        &[1.0, 2.0],
    );
}

#[test]
fn test_break_stops_the_loop_not_the_program() {
    assert_number(
        "let mut i = 0
         while (1) do
             i = i.add(1)
             if (i.gt(3)) break
         end
         i",
        4.0,
    );
}

#[test]
fn test_break_outside_a_loop_is_an_error() {
    assert_error_containing("break", "no enclosing loop");
}

// ==================== For Loops ====================

#[test]
fn test_for_iterates_elements_in_order() {
    assert_number(
        "let mut total = 0
         for x in list(1, 2, 3) total = total.add(x)
         total",
        6.0,
    );
}

#[test]
fn test_for_collects_body_values() {
    assert_numbers("for x in list(1, 2, 3) x.mul(10)", &[10.0, 20.0, 30.0]);
}

#[test]
fn test_for_loop_variable_merges_after_the_loop() {
    assert_number("for x in list(1, 2) x; x", 2.0);
}

#[test]
fn test_for_with_break() {
    assert_numbers(
        "for x in list(1, 2, 3, 4) do
             if (x.gt(2)) break
             x
         end",
        &[1.0, 2.0],
    );
}

#[test]
fn test_for_over_enumerate_pairs() {
    assert_number(
        "let mut hits = list()
         for p in list(10, 20).enumerate() hits.append(p)
         hits.get(1).get(0)",
        1.0,
    );
    assert_number(
        "let mut hits = list()
         for p in list(10, 20).enumerate() hits.append(p)
         hits.get(1).get(1)",
        20.0,
    );
}

#[test]
fn test_for_over_non_iterable_fails() {
    assert_error_containing("for x in 5 x", "has no attribute `__iter__`");
}

// ==================== Iterator Protocol ====================

#[test]
fn test_manual_iteration() {
    assert_number("let it = list(7, 8).__iter__(); it!; it!", 8.0);
}

#[test]
fn test_exhausted_iterator_signals_stop() {
    assert_error_containing("let it = list(1).__iter__(); it!; it!", "Iterator exhausted");
}

#[test]
fn test_stop_signal_is_an_ordinary_catchable_error() {
    assert_string(
        r#"let it = list().__iter__(); try (it!) except ("done")"#,
        "done",
    );
}

// ==================== Functions ====================

#[test]
fn test_function_returns_last_body_expression() {
    assert_number("let f = def (a, b) a.add(b); f(40, 2)", 42.0);
}

#[test]
fn test_zero_argument_call_with_bang() {
    assert_number("let f = def () 5; f!", 5.0);
}

#[test]
fn test_arity_errors_are_distinct() {
    assert_error_containing("let f = def (a) a; f(1, 2)", "too many arguments");
    assert_error_containing("let f = def (a) a; f!", "not enough arguments");
}

#[test]
fn test_early_return_wins_over_last_expression() {
    assert_number("let f = def () do return 7; 9 end; f!", 7.0);
}

#[test]
fn test_return_at_top_level_yields_the_value() {
    assert_number("do return 5; 9 end", 5.0);
}

#[test]
fn test_closures_capture_their_defining_scope() {
    assert_number(
        "let make = def (n) def () n.add(1)
         let f = make(41)
         f!",
        42.0,
    );
}

#[test]
fn test_recursion() {
    assert_number(
        "let fact = def (n) if (n.lt(2)) 1 else n.mul(fact(n.sub(1)))
         fact(5)",
        120.0,
    );
}

#[test]
fn test_function_locals_do_not_leak_to_the_caller() {
    assert_error_containing("let f = def () let inside = 1; f!; inside", "No such variable");
}

#[test]
fn test_calling_a_non_callable_fails() {
    assert_error_containing("5(1)", "not callable");
}

// ==================== Try / Except ====================

#[test]
fn test_try_catches_ordinary_errors() {
    assert_string(r#"try (1.div(0)) except ("caught")"#, "caught");
    assert_string(r#"try (missing) except ("caught")"#, "caught");
    assert_string(r#"try (error("boom")) except ("caught")"#, "caught");
}

#[test]
fn test_try_body_value_when_no_error() {
    assert_number(r#"try (1.add(1)) except (0)"#, 2.0);
}

#[test]
fn test_try_does_not_catch_break() {
    // break inside try terminates the loop; the handler never runs
    assert_number(
        r#"let mut i = 0
           while (1) do
               i = i.add(1)
               try (break) except (error("handler ran"))
           end
           i"#,
        1.0,
    );
}

#[test]
fn test_try_does_not_catch_return() {
    assert_number(
        r#"let f = def () do try (return 7) except (error("handler ran")); 9 end
           f!"#,
        7.0,
    );
}

#[test]
fn test_uncaught_user_error_reaches_the_top() {
    assert_error_containing(r#"error("boom")"#, "boom");
}

// ==================== Attribute Protocol ====================

#[test]
fn test_setattr_getattr_round_trip() {
    assert_number(
        r#"let o = object(list())
           o.setattr("x", 5)
           o.x"#,
        5.0,
    );
    assert_number(
        r#"let o = object(list())
           o.setattr("x", 5)
           o.getattr("x")"#,
        5.0,
    );
}

#[test]
fn test_missing_attribute_without_interceptors() {
    assert_error_containing("object(list()).missing", "has no attribute `missing`");
}

#[test]
fn test_fallback_interceptor_runs_after_direct_lookup() {
    assert_number(
        r#"let o = object(list(list("x", 1)))
           o.setattr("__getattr__", def (name) 99)
           o.x"#,
        1.0,
    );
    assert_number(
        r#"let o = object(list(list("x", 1)))
           o.setattr("__getattr__", def (name) 99)
           o.missing"#,
        99.0,
    );
}

#[test]
fn test_catchall_interceptor_wins_over_direct_entries() {
    // all three present at once: the catch-all intercepts even names
    // with a direct entry
    assert_string(
        r#"let o = object(list(list("x", 1)))
           o.setattr("__getattr__", def (name) "fallback")
           o.setattr("__getallattr__", def (name) name.concat("-all"))
           o.x"#,
        "x-all",
    );
}

#[test]
fn test_interceptor_receives_the_attribute_name() {
    assert_string(
        r#"let o = object(list())
           o.setattr("__getattr__", def (name) name)
           o.whatever"#,
        "whatever",
    );
}

#[test]
fn test_user_entries_shadow_builtin_methods() {
    assert_number(
        r#"let l = list(1, 2)
           l.setattr("len", def () 99)
           l.len()"#,
        99.0,
    );
}

#[test]
fn test_object_with_call_attribute_is_callable() {
    assert_number(
        r#"let o = object(list())
           o.setattr("__call__", def (x) x.mul(2))
           o(21)"#,
        42.0,
    );
}

// ==================== Equality ====================

#[test]
fn test_equals_method() {
    assert_number("1.equals(1)", 1.0);
    assert_number("1.equals(2)", 0.0);
    assert_number(r#""a".equals("a")"#, 1.0);
    assert_number(r#"1.equals("1")"#, 0.0);
    assert_number("list(1, 2).equals(list(1, 2))", 1.0);
    assert_number("list(1).equals(list(2))", 0.0);
}

#[test]
fn test_object_equality_is_structural() {
    assert_number(
        r#"object(list(list("a", 1))).equals(object(list(list("a", 1))))"#,
        1.0,
    );
    assert_number(
        r#"object(list(list("a", 1))).equals(object(list(list("a", 2))))"#,
        0.0,
    );
}

// ==================== Modules ====================

#[test]
fn test_module_exposes_declared_exports_only() {
    assert_number(
        "let m = module (a) do let a = 1; let hidden = 2 end
         m.a",
        1.0,
    );
    assert_error_containing(
        "let m = module (a) do let a = 1; let hidden = 2 end
         m.hidden",
        "has no attribute `hidden`",
    );
}

#[test]
fn test_module_attributes_are_frozen() {
    assert_error_containing(
        r#"let m = module (a) let a = 1
           m.setattr("b", 2)"#,
        "immutable",
    );
}

#[test]
fn test_module_functions_close_over_module_locals() {
    assert_number(
        "let m = module (get) do
             let secret = 42
             let get = def () secret
         end
         m.get!",
        42.0,
    );
}

#[test]
fn test_module_locals_do_not_leak() {
    assert_error_containing(
        "let m = module (a) do let a = 1; let hidden = 2 end
         hidden",
        "No such variable",
    );
}

#[test]
fn test_missing_export_is_an_error() {
    assert_error_containing("module (ghost) 1", "No such variable `ghost`");
}

// ==================== Builtins ====================

#[test]
fn test_boolean_singletons_are_numbers() {
    assert_number("True", 1.0);
    assert_number("False", 0.0);
    assert_number("if (True) 1 else 2", 1.0);
    assert_number("if (False) 1 else 2", 2.0);
}

#[test]
fn test_id_builtin() {
    assert_number("id(42)", 42.0);
}

#[test]
fn test_eval_builtin() {
    assert_number(r#"eval("1.add(2)")"#, 3.0);
}

#[test]
fn test_eval_syntax_errors_are_catchable() {
    assert_string(r#"try (eval("do")) except ("caught")"#, "caught");
}

#[test]
fn test_object_builtin_from_pairs() {
    assert_number(r#"object(list(list("x", 5), list("y", 6))).y"#, 6.0);
}

#[test]
fn test_range_and_sum() {
    assert_numbers("range(4)", &[0.0, 1.0, 2.0, 3.0]);
    assert_numbers("range(2, 5)", &[2.0, 3.0, 4.0]);
    assert_numbers("range(5, 0, 0.sub(2))", &[5.0, 3.0, 1.0]);
    assert_number("sum(range(5))", 10.0);
    assert_error_containing("range(1, 2, 0)", "step");
}

#[test]
fn test_apply_method() {
    assert_number("5.apply(def (x) x.mul(2))", 10.0);
}

#[test]
fn test_str_method() {
    assert_string("42.str()", "42");
    assert_string(r#""ab".str()"#, "ab");
    assert_string("list(1, 2).str()", "[1, 2]");
}

#[test]
fn test_spawn_rejects_interpreter_functions() {
    assert_error_containing("spawn(def () 1, list())", "host functions");
}

#[test]
fn test_import_of_unknown_module_is_an_io_error() {
    assert_error_containing(
        r#"import("definitely.not.a.module")"#,
        "cannot resolve module",
    );
}

#[test]
fn test_import_errors_are_catchable() {
    assert_string(
        r#"try (import("definitely.not.a.module")) except ("caught")"#,
        "caught",
    );
}
