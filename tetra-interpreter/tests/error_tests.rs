use rstest::rstest;

use tetra_interpreter::compiler;
use tetra_interpreter::error::{ErrorKind, RuntimeError};
use tetra_interpreter::interpreter::Interpreter;
use tetra_interpreter::universe::Universe;
use tetra_interpreter::value::Value;

fn run(source: &str) -> (Interpreter, Result<Value, RuntimeError>) {
    let unit =
        compiler::compile_source(source, "test.tet").expect("could not compile test program");
    let mut universe = Universe::with_load_path(vec![]);
    let mut interpreter = Interpreter::new();
    interpreter.push_unit_frame(unit, universe.main_object.clone());
    let result = interpreter.run(&mut universe);
    (interpreter, result)
}

fn fail(source: &str) -> RuntimeError {
    let (_, result) = run(source);
    result.expect_err("expected the program to fail")
}

#[rstest]
#[case::undefined_method_on_integer(
    "123.foo",
    "UndefinedMethodError: Undefined Method 'foo' for 123"
)]
#[case::undefined_method_on_boolean(
    "true.foo",
    "UndefinedMethodError: Undefined Method 'foo' for true"
)]
#[case::undefined_method_on_class(
    "class Taipei\nend\nTaipei.foo",
    "UndefinedMethodError: Undefined Method 'foo' for Taipei"
)]
#[case::undefined_bare_identifier(
    "something_undefined",
    "UndefinedMethodError: Undefined Method 'something_undefined' for #<Object>"
)]
#[case::module_inheritance(
    "module F\nend\nclass B < F\nend",
    "InternalError: Module inheritance is not supported: F"
)]
#[case::yield_without_block(
    "class Foo\ndef self.baz\nyield(100)\nend\nend\nFoo.baz",
    "InternalError: can't yield without a block"
)]
#[case::require_unresolvable(
    "require \"definitely_not_here\"",
    "InternalError: Can't require \"definitely_not_here\""
)]
#[case::require_relative_unresolvable(
    "require_relative \"missing_neighbor\"",
    "InternalError: Can't require \"missing_neighbor\""
)]
#[case::new_on_hash("Hash.new", "UnsupportedMethodError: Unsupported Method #new for Hash")]
#[case::new_on_integer(
    "Integer.new",
    "UnsupportedMethodError: Unsupported Method #new for Integer"
)]
#[case::new_on_string("String.new", "UnsupportedMethodError: Unsupported Method #new for String")]
#[case::new_on_null("Null.new", "UnsupportedMethodError: Unsupported Method #new for Null")]
#[case::new_on_boolean(
    "Boolean.new",
    "UnsupportedMethodError: Unsupported Method #new for Boolean"
)]
#[case::new_on_range("Range.new", "UnsupportedMethodError: Unsupported Method #new for Range")]
#[case::new_on_module(
    "module F\nend\nF.new",
    "UnsupportedMethodError: Unsupported Method #new for F"
)]
#[case::is_a_wants_a_class("5.is_a?(5)", "TypeError: Expect argument to be Class. got: Integer")]
#[case::divided_by_zero("1 / 0", "InternalError: Divided by 0")]
#[case::modulo_by_zero("7 % 0", "InternalError: Divided by 0")]
#[case::user_method_arity(
    "class Foo\ndef set(x)\n@x = x\nend\nend\nFoo.new.set(1, 2)",
    "ArgumentError: Expect 1 argument. got: 2"
)]
#[case::initialize_arity(
    "class Foo\ndef initialize(a, b)\n@a = a\nend\nend\nFoo.new(1)",
    "ArgumentError: Expect 2 arguments. got: 1"
)]
#[case::default_initialize_rejects_arguments(
    "class Foo\nend\nFoo.new(1)",
    "ArgumentError: Expect 0 arguments. got: 1"
)]
#[case::uninitialized_constant("Missing", "NameError: uninitialized constant Missing")]
#[case::uninitialized_scoped_constant(
    "class Foo\nend\nFoo::Bar",
    "NameError: uninitialized constant Foo::Bar"
)]
#[case::ivar_reflection_name_check(
    "5.instance_variable_get(\"x\")",
    "NameError: 'x' is not allowed as an instance variable name"
)]
#[case::include_wants_a_module(
    "class A\nend\nclass B\ninclude A\nend",
    "TypeError: Expect argument to be Module. got: A"
)]
fn error_surface_strings(#[case] source: &str, #[case] expected: &str) {
    let error = fail(source);
    assert_eq!(error.to_string(), expected, "running: {source}");
}

#[test]
fn integer_plus_string_reports_the_string() {
    // The receiver is the integer, so the argument report names String.
    let error = fail("1 + \"a\"");
    assert_eq!(
        error.to_string(),
        "TypeError: Expect argument to be Integer. got: String",
    );
}

#[test]
fn module_inheritance_fault_location_and_stack_depths() {
    let (interpreter, result) = run("module F\nend\nclass B < F\nend");
    let error = result.expect_err("module inheritance must fail");
    assert_eq!(error.kind, ErrorKind::InternalError);
    assert_eq!(error.file.as_deref(), Some("test.tet"));
    // The fault is on the `class B < F` line.
    assert_eq!(error.line, Some(3));
    // The main frame is still in place; the stack holds the DefClass operands
    // (self and the superclass) plus the error value.
    assert_eq!(interpreter.cfp(), 1);
    assert_eq!(interpreter.sp(), 3);
    assert!(matches!(
        interpreter.stack.last(),
        Some(Value::Error(_)),
    ));
}

#[test]
fn errors_deep_in_a_call_chain_report_the_faulting_send() {
    let source = "class Foo\ndef outer\ninner\nend\ndef inner\nnil.boom\nend\nend\nFoo.new.outer";
    let error = fail(source);
    assert_eq!(error.kind, ErrorKind::UndefinedMethodError);
    // `nil.boom` sits on line 6; the outer sends must not overwrite it.
    assert_eq!(error.line, Some(6));
}

#[test]
fn error_unwinding_skips_the_rest_of_the_program() {
    let (_, result) = run("nil.boom\nputs(\"unreachable\")");
    assert!(result.is_err());
}

#[test]
fn arity_faults_inside_methods_leave_the_frames_in_place() {
    let (interpreter, result) = run("class Foo\ndef go\n{ a: 1 }.keys(1)\nend\nend\nFoo.new.go");
    assert!(result.is_err());
    // Main frame plus the `go` frame.
    assert_eq!(interpreter.cfp(), 2);
}
