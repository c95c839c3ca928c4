use rstest::rstest;

use tetra_interpreter::compiler;
use tetra_interpreter::error::RuntimeError;
use tetra_interpreter::interpreter::Interpreter;
use tetra_interpreter::universe::Universe;
use tetra_interpreter::value::Value;

fn run(source: &str) -> Result<Value, RuntimeError> {
    let unit =
        compiler::compile_source(source, "test.tet").expect("could not compile test program");
    let mut universe = Universe::with_load_path(vec![]);
    let mut interpreter = Interpreter::new();
    interpreter.push_unit_frame(unit, universe.main_object.clone());
    interpreter.run(&mut universe)
}

fn eval(source: &str) -> Value {
    run(source).unwrap_or_else(|error| panic!("program failed: {error}"))
}

#[rstest]
#[case::index_read("{ a: 1 }[\"a\"]", Value::Integer(1))]
#[case::index_missing_is_nil("{ a: 1 }[\"b\"]", Value::Nil)]
#[case::index_on_empty_is_nil("{}[\"a\"]", Value::Nil)]
#[case::index_assign_returns_value("h = { a: 1 }\nh[\"b\"] = 2", Value::Integer(2))]
#[case::index_assign_mutates("h = { a: 1 }\nh[\"b\"] = 2\nh[\"b\"]", Value::Integer(2))]
#[case::length("{ a: 1, b: 2 }.length", Value::Integer(2))]
#[case::empty_predicate("{}.empty?", Value::Boolean(true))]
#[case::non_empty_predicate("{ a: 1 }.empty?", Value::Boolean(false))]
#[case::clear_returns_a_new_empty_hash("{ a: 1 }.clear.empty?", Value::Boolean(true))]
#[case::clear_leaves_receiver_untouched("h = { a: 1 }\nh.clear\nh.length", Value::Integer(1))]
#[case::delete_mutates_the_receiver("h = { a: 1, b: 2 }\nh.delete(\"a\").length", Value::Integer(1))]
#[case::has_key("{ a: 1 }.has_key?(\"a\")", Value::Boolean(true))]
#[case::has_key_absent("{ a: 1 }.has_key?(\"b\")", Value::Boolean(false))]
#[case::has_value_deep("{ a: [1, 2] }.has_value?([1, 2])", Value::Boolean(true))]
#[case::eql_deep("{ a: { b: 1 } }.eql?({ a: { b: 1 } })", Value::Boolean(true))]
#[case::eql_ignores_insertion_order("{ a: 1, b: 2 }.eql?({ b: 2, a: 1 })", Value::Boolean(true))]
#[case::eql_not_equal("{ a: 1 }.eql?({ a: 2 })", Value::Boolean(false))]
#[case::eql_non_hash_is_false("{ a: 1 }.eql?(5)", Value::Boolean(false))]
#[case::sorted_keys("{ c: 1, a: 2, b: 3 }.sorted_keys.to_s", Value::new_string("[\"a\", \"b\", \"c\"]"))]
#[case::merge_later_wins(
    "h = { a: 1 }\nh.merge({ a: 2, b: 3 }, { b: 4 }).to_s",
    Value::new_string("{ a: 2, b: 4 }")
)]
#[case::merge_leaves_receiver_untouched("h = { a: 1 }\nh.merge({ a: 2 })\nh[\"a\"]", Value::Integer(1))]
#[case::each_key_returns_sorted_keys(
    "{ b: 1, a: 2 }.each_key { |k| k }.to_s",
    Value::new_string("[\"a\", \"b\"]")
)]
#[case::each_value_by_sorted_key(
    "{ b: 1, a: 2 }.each_value { |v| v }.to_s",
    Value::new_string("[2, 1]")
)]
#[case::map_values_mutates(
    "h = { a: 1, b: 2 }\nh.map_values { |v| v * 10 }\nh.to_s",
    Value::new_string("{ a: 10, b: 20 }")
)]
#[case::map_values_returns_receiver(
    "h = { a: 1 }\nh.map_values { |v| v + 1 }[\"a\"]",
    Value::Integer(2)
)]
#[case::transform_values_returns_new_hash(
    "h = { a: 1 }\nh.transform_values { |v| v * 3 }.to_s",
    Value::new_string("{ a: 3 }")
)]
#[case::transform_values_leaves_receiver(
    "h = { a: 1 }\nh.transform_values { |v| v * 3 }\nh[\"a\"]",
    Value::Integer(1)
)]
#[case::to_a_sorted("{ b: 2, a: 1 }.to_a(true).to_s", Value::new_string("[[\"a\", 1], [\"b\", 2]]"))]
#[case::to_s_sorted_and_quoted("{ b: \"x\", a: 1 }.to_s", Value::new_string("{ a: 1, b: \"x\" }"))]
#[case::to_s_empty("{}.to_s", Value::new_string("{}"))]
#[case::to_json(
    "{ b: nil, a: [1, true, \"x\"] }.to_json",
    Value::new_string("{\"a\":[1,true,\"x\"],\"b\":null}")
)]
#[case::hash_class_name("{}.class.name", Value::new_string("Hash"))]
fn hash_operations(#[case] source: &str, #[case] expected: Value) {
    assert_eq!(eval(source), expected, "running: {source}");
}

#[test]
fn sorted_keys_agrees_with_keys_sort() {
    let value = eval("h = { z: 1, a: 2, m: 3 }\nh.sorted_keys == h.keys.sort");
    assert_eq!(value, Value::Boolean(true));
}

#[test]
fn length_agrees_with_keys_length() {
    let value = eval("h = { z: 1, a: 2 }\nh.length == h.keys.length");
    assert_eq!(value, Value::Boolean(true));
}

#[test]
fn lookup_agrees_with_has_key_and_has_value() {
    let value = eval(
        "h = { a: 10 }\nh[\"a\"] == 10 && h.has_key?(\"a\") && h.has_value?(10)",
    );
    assert_eq!(value, Value::Boolean(true));
}

#[test]
fn value_yielding_operations_yield_once_per_entry() {
    let value = eval(
        "count = [0]\nh = { a: 1, b: 2, c: 3 }\n\
         h.transform_values { |v| count[0] = count[0] + 1\nv }\n\
         h.map_values { |v| count[0] = count[0] + 1\nv }\n\
         count[0]",
    );
    assert_eq!(value, Value::Integer(6));
}

#[test]
fn sorted_pairs_reconstruct_the_hash() {
    let value = eval("h = { b: 2, a: 1 }\nh.to_a(true).to_h.eql?(h)");
    assert_eq!(value, Value::Boolean(true));
}

#[test]
fn merge_is_left_to_right() {
    let value = eval(
        "h = { k: 1 }\na = { k: 2, x: 1 }\nb = { k: 3 }\nh.merge(a, b)[\"k\"]",
    );
    assert_eq!(value, Value::Integer(3));
}

#[rstest]
#[case::keys_takes_no_arguments("{ a: 1 }.keys(1)", "ArgumentError: Expect 0 arguments. got: 1")]
#[case::has_key_needs_one_argument("{ a: 1 }.has_key?", "ArgumentError: Expect 1 argument. got: 0")]
#[case::delete_needs_a_key("{ a: 1 }.delete", "ArgumentError: Expect 1 argument. got: 0")]
#[case::non_string_key("{ a: 1 }[5]", "TypeError: Expect argument to be String. got: Integer")]
#[case::non_string_key_on_assign(
    "h = {}\nh[true] = 1",
    "TypeError: Expect argument to be String. got: Boolean"
)]
#[case::merge_non_hash("{ a: 1 }.merge(5)", "TypeError: Expect argument to be Hash. got: Integer")]
#[case::merge_needs_an_argument("{ a: 1 }.merge", "ArgumentError: Expect 1 or more arguments. got: 0")]
#[case::to_a_extra_arguments("{ a: 1 }.to_a(true, true)", "ArgumentError: Expect 0..1 argument. got: 2")]
#[case::to_a_non_boolean("{ a: 1 }.to_a(5)", "TypeError: Expect argument to be Boolean. got: Integer")]
#[case::each_key_without_block("{ a: 1 }.each_key", "InternalError: can't yield without a block")]
#[case::map_values_without_block("{ a: 1 }.map_values", "InternalError: can't yield without a block")]
fn hash_errors(#[case] source: &str, #[case] expected: &str) {
    let error = run(source).expect_err("expected the program to fail");
    assert_eq!(error.to_string(), expected, "running: {source}");
}
