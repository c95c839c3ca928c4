use rstest::rstest;

use tetra_interpreter::compiler;
use tetra_interpreter::error::RuntimeError;
use tetra_interpreter::interpreter::Interpreter;
use tetra_interpreter::universe::Universe;
use tetra_interpreter::value::Value;

fn run(source: &str) -> (Interpreter, Universe, Result<Value, RuntimeError>) {
    let unit =
        compiler::compile_source(source, "test.tet").expect("could not compile test program");
    let mut universe = Universe::with_load_path(vec![]);
    let mut interpreter = Interpreter::new();
    interpreter.push_unit_frame(unit, universe.main_object.clone());
    let result = interpreter.run(&mut universe);
    (interpreter, universe, result)
}

/// Evaluate and assert the stack discipline of a successful run: the result
/// sits alone on the value stack and every frame has been popped.
fn eval(source: &str) -> Value {
    let (interpreter, _, result) = run(source);
    let value = result.unwrap_or_else(|error| panic!("program failed: {error}"));
    assert_eq!(interpreter.sp(), 1, "SP after a successful evaluation");
    assert_eq!(interpreter.cfp(), 0, "CFP after a successful evaluation");
    value
}

#[rstest]
// Literals and operators.
#[case::integer_arithmetic("(1 + 2) * 3 - 4 / 2", Value::Integer(7))]
#[case::modulo("17 % 5", Value::Integer(2))]
#[case::comparison("3 < 5", Value::Boolean(true))]
#[case::unary_minus("x = 3\n-x", Value::Integer(-3))]
#[case::string_concat("\"foo\" + \"bar\"", Value::new_string("foobar"))]
#[case::boolean_and("true && false", Value::Boolean(false))]
#[case::and_yields_deciding_operand("nil && 10", Value::Nil)]
#[case::or_yields_deciding_operand("nil || 10", Value::Integer(10))]
#[case::not("!nil", Value::Boolean(true))]
// Control flow.
#[case::if_expression("if 1 == 1\n10\nelse\n20\nend", Value::Integer(10))]
#[case::if_without_else_is_nil("if false\n10\nend", Value::Nil)]
#[case::elsif_chain(
    "x = 3\nif x == 1\n\"a\"\nelsif x == 3\n\"b\"\nelse\n\"c\"\nend",
    Value::new_string("b")
)]
#[case::unless_expression("unless false\n42\nend", Value::Integer(42))]
#[case::while_loop("i = 0\nsum = 0\nwhile i < 5\nsum = sum + i\ni = i + 1\nend\nsum", Value::Integer(10))]
// Locals and instance variables.
#[case::chained_assignment("a = b = 4\na + b", Value::Integer(8))]
#[case::unset_ivar_reads_nil("@missing", Value::Nil)]
// Classes and dispatch.
#[case::inheritance_dispatch(
    "class Foo\ndef set(x)\n@x = x\nend\ndef get\n@x\nend\nend\n\
     class Bar < Foo\nend\nclass Baz < Foo\nend\n\
     b = Bar.new\nz = Baz.new\nf = Foo.new\n\
     b.set(10)\nz.set(1)\nf.set(5)\nb.get + z.get + f.get",
    Value::Integer(16)
)]
#[case::class_method_calls_new(
    "class JobPosition\ndef initialize(n)\n@name = n\nend\ndef name\n@name\nend\n\
     def self.engineer\nnew(\"Engineer\")\nend\nend\n\
     JobPosition.engineer.name",
    Value::new_string("Engineer")
)]
#[case::class_method_inheritance(
    "class A\ndef self.x\n10\nend\nend\nclass B < A\nend\nB.x",
    Value::Integer(10)
)]
#[case::monkey_patched_string(
    "class String\ndef buz\n\"buz\"\nend\nend\n\"123\".buz",
    Value::new_string("buz")
)]
#[case::reopened_class_keeps_state(
    "class Foo\ndef a\n1\nend\nend\nclass Foo\ndef b\n2\nend\nend\nf = Foo.new\nf.a + f.b",
    Value::Integer(3)
)]
#[case::method_redefinition_overwrites(
    "class Foo\ndef a\n1\nend\ndef a\n2\nend\nend\nFoo.new.a",
    Value::Integer(2)
)]
#[case::attr_accessor(
    "class Job\nattr_accessor :name\nend\nj = Job.new\nj.name = \"dev\"\nj.name",
    Value::new_string("dev")
)]
#[case::module_mixin(
    "module Greet\ndef hello\n\"hi\"\nend\nend\nclass Person\ninclude Greet\nend\nPerson.new.hello",
    Value::new_string("hi")
)]
#[case::later_include_wins(
    "module A\ndef who\n\"a\"\nend\nend\nmodule B\ndef who\n\"b\"\nend\nend\n\
     class C\ninclude A\ninclude B\nend\nC.new.who",
    Value::new_string("b")
)]
#[case::operator_method_definition(
    "class Money\ndef initialize(cents)\n@cents = cents\nend\ndef +(other)\n@cents + other.cents\nend\ndef cents\n@cents\nend\nend\nMoney.new(3) + Money.new(4)",
    Value::Integer(7)
)]
#[case::method_missing_fallback(
    "class Ghost\ndef method_missing(name, arg)\nname + \"!\"\nend\nend\nGhost.new.boo(1)",
    Value::new_string("boo!")
)]
// Blocks and yield.
#[case::yield_with_captured_outer_variable(
    "class Foo\ndef self.baz\nyield(100)\nend\nend\nfifty = 50\nFoo.baz { |h| h + fifty }",
    Value::Integer(150)
)]
#[case::block_assigns_outer_local(
    "total = 0\nclass Counter\ndef self.bump\nyield(5)\nend\nend\n\
     Counter.bump { |n| total = total + n }\ntotal",
    Value::Integer(5)
)]
#[case::block_missing_args_read_nil(
    "class Foo\ndef self.baz\nyield\nend\nend\nFoo.baz { |x| x.nil? }",
    Value::Boolean(true)
)]
// Constants and namespacing.
#[case::constant_assignment("class Foo\nBAR = 7\ndef bar\nBAR\nend\nend\nFoo.new.bar", Value::Integer(7))]
#[case::nested_class_lookup(
    "class Outer\nclass Inner\ndef self.x\n1\nend\nend\nend\nOuter::Inner.x",
    Value::Integer(1)
)]
#[case::nested_class_qualified_name(
    "class Outer\nclass Inner\nend\nend\nOuter::Inner.name",
    Value::new_string("Outer::Inner")
)]
#[case::object_scoped_constant("class Foo\nend\nObject::Foo.name", Value::new_string("Foo"))]
// Class graph introspection.
#[case::class_of_integer("123.class.name", Value::new_string("Integer"))]
#[case::class_of_class("Class.class.name", Value::new_string("Class"))]
#[case::superclass_of_class("Class.superclass.name", Value::new_string("Object"))]
#[case::singleton_class_name(
    "class Foo\nend\nFoo.singleton_class.name",
    Value::new_string("#<Class:Foo>")
)]
#[case::singleton_superclass_mirrors_class_hierarchy(
    "class A\nend\nclass B < A\nend\nB.singleton_class.superclass == A.singleton_class",
    Value::Boolean(true)
)]
#[case::singleton_chain_terminates_at_object(
    "class A\nend\nA.singleton_class.superclass == Object.singleton_class",
    Value::Boolean(true)
)]
#[case::is_a_follows_inheritance(
    "class A\nend\nclass B < A\nend\nB.new.is_a?(A)",
    Value::Boolean(true)
)]
#[case::is_a_follows_mixins(
    "module M\nend\nclass C\ninclude M\nend\nC.new.is_a?(M)",
    Value::Boolean(true)
)]
#[case::nil_class("nil.class.name", Value::new_string("Null"))]
#[case::nil_predicate("nil.nil?", Value::Boolean(true))]
#[case::object_nil_predicate("5.nil?", Value::Boolean(false))]
// Instance variables through the reflection API.
#[case::instance_variable_reflection(
    "class Foo\nend\nf = Foo.new\nf.instance_variable_set(\"@x\", 9)\nf.instance_variable_get(\"@x\")",
    Value::Integer(9)
)]
#[case::class_level_instance_variables(
    "class Foo\nend\nFoo.instance_variable_set(\"@count\", 3)\nFoo.instance_variable_get(\"@count\")",
    Value::Integer(3)
)]
// Arrays.
#[case::array_push_and_index("a = [1, 2]\na.push(3)\na[2]", Value::Integer(3))]
#[case::array_negative_index("a = [1, 2, 3]\na[-1]", Value::Integer(3))]
#[case::array_index_assign_extends("a = []\na[2] = 9\na.to_s", Value::new_string("[nil, nil, 9]"))]
#[case::array_pop("a = [1, 2]\na.pop\na.length", Value::Integer(1))]
#[case::array_each(
    "sum = 0\n[1, 2, 3].each { |n| sum = sum + n }\nsum",
    Value::Integer(6)
)]
#[case::array_map("[1, 2, 3].map { |n| n * 2 }.to_s", Value::new_string("[2, 4, 6]"))]
#[case::array_sort("[3, 1, 2].sort.to_s", Value::new_string("[1, 2, 3]"))]
#[case::array_new("Array.new.length", Value::Integer(0))]
// Ranges.
#[case::range_bounds("(3..7).first + (3..7).last", Value::Integer(10))]
#[case::range_to_a("(1..4).to_a.length", Value::Integer(4))]
#[case::range_to_s("(1..5).to_s", Value::new_string("(1..5)"))]
#[case::range_class("(1..5).class.name", Value::new_string("Range"))]
// Rendering.
#[case::hash_sorted_keys_to_s(
    "{ c: 1, b: 2, a: 3 }.sorted_keys.to_s",
    Value::new_string("[\"a\", \"b\", \"c\"]")
)]
#[case::hash_to_a_sorted_to_s(
    "{ a: 1, b: 2, c: 3 }.to_a(true).to_s",
    Value::new_string("[[\"a\", 1], [\"b\", 2], [\"c\", 3]]")
)]
#[case::integer_to_s("42.to_s", Value::new_string("42"))]
#[case::boolean_to_s("true.to_s", Value::new_string("true"))]
fn basic_interpreter_tests(#[case] source: &str, #[case] expected: Value) {
    assert_eq!(eval(source), expected, "running: {source}");
}

#[test]
fn top_level_def_lands_on_object() {
    let value = eval("def twice(x)\nx * 2\nend\nclass Foo\ndef go\ntwice(21)\nend\nend\nFoo.new.go");
    assert_eq!(value, Value::Integer(42));
}

#[test]
fn new_forwards_a_block_to_initialize() {
    let value = eval(
        "class Foo\ndef initialize\n@x = yield(20)\nend\ndef x\n@x\nend\nend\n\
         Foo.new { |n| n + 1 }.x",
    );
    assert_eq!(value, Value::Integer(21));
}

#[test]
fn instances_are_identity_equal_and_integers_value_equal() {
    assert_eq!(
        eval("class Foo\nend\na = Foo.new\nb = Foo.new\na == b"),
        Value::Boolean(false),
    );
    assert_eq!(
        eval("class Foo\nend\na = Foo.new\nb = a\na == b"),
        Value::Boolean(true),
    );
    assert_eq!(eval("1 == 1"), Value::Boolean(true));
    assert_eq!(eval("\"a\" != \"b\""), Value::Boolean(true));
}

#[test]
fn value_class_names_are_stable_across_a_run() {
    let value = eval("a = 5.class.name\nb = 5.class.name\na == b");
    assert_eq!(value, Value::Boolean(true));
}

#[test]
fn singleton_classes_host_class_side_methods() {
    let (_, _universe, result) = run("class A\ndef self.x\n10\nend\nend\nA");
    let class = result.unwrap().as_class().unwrap();
    let singleton = class.borrow().singleton_class();
    assert!(singleton.borrow().methods.contains_key("x"));
    assert!(!class.borrow().methods.contains_key("x"));
}

#[test]
fn require_is_idempotent_by_canonical_path() {
    let dir = std::env::temp_dir().join(format!("tetra-require-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("counted.tet"),
        "Counters = [0]\nCounters[0] = Counters[0] + 1\n",
    )
    .unwrap();

    let source = "require_relative \"counted\"\nrequire_relative \"counted\"\nCounters[0]";
    let unit = compiler::compile_source(source, &dir.join("main.tet").to_string_lossy()).unwrap();
    let mut universe = Universe::with_load_path(vec![dir.clone()]);
    let mut interpreter = Interpreter::new();
    interpreter.push_unit_frame(unit, universe.main_object.clone());
    let result = interpreter.run(&mut universe).unwrap();
    assert_eq!(result, Value::Integer(1));

    std::fs::remove_dir_all(&dir).ok();
}
