use tetra_core::ast::{AssignTarget, Body, ClassDef, Expression, MethodDef, Statement};
use tetra_parser::parse;

fn parse_ok(input: &str) -> Body {
    parse(input).unwrap_or_else(|error| panic!("could not parse {input:?}: {error}"))
}

fn single_expression(input: &str) -> Expression {
    let body = parse_ok(input);
    assert_eq!(body.statements.len(), 1, "expected one statement in {input:?}");
    match body.statements.into_iter().next().unwrap() {
        Statement::Expression(expression) => expression,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

#[test]
fn binary_operators_desugar_to_sends() {
    let expression = single_expression("1 + 2 * 3");
    let Expression::Call(outer) = expression else {
        panic!("expected a call");
    };
    assert_eq!(outer.name, "+");
    assert_eq!(outer.receiver, Some(Expression::Integer(1)));
    let Expression::Call(inner) = &outer.args[0] else {
        panic!("expected the multiplication to bind tighter");
    };
    assert_eq!(inner.name, "*");
}

#[test]
fn method_definition_with_parameters() {
    let body = parse_ok("def set(x)\n  @x = x\nend");
    let Statement::MethodDef(MethodDef {
        name,
        params,
        is_singleton,
        ..
    }) = &body.statements[0]
    else {
        panic!("expected a method definition");
    };
    assert_eq!(name, "set");
    assert_eq!(params, &["x".to_string()]);
    assert!(!is_singleton);
}

#[test]
fn singleton_method_definition() {
    let body = parse_ok("def self.engineer\n  new(\"Engineer\")\nend");
    let Statement::MethodDef(MethodDef { is_singleton, .. }) = &body.statements[0] else {
        panic!("expected a method definition");
    };
    assert!(is_singleton);
}

#[test]
fn class_definition_with_superclass() {
    let body = parse_ok("class Bar < Foo\nend");
    let Statement::ClassDef(ClassDef {
        name,
        super_class,
        is_module,
        ..
    }) = &body.statements[0]
    else {
        panic!("expected a class definition");
    };
    assert_eq!(name, "Bar");
    assert!(matches!(
        super_class,
        Some(Expression::Constant { name, .. }) if name == "Foo",
    ));
    assert!(!is_module);
}

#[test]
fn module_definition() {
    let body = parse_ok("module Walkable\nend");
    let Statement::ClassDef(ClassDef { is_module, .. }) = &body.statements[0] else {
        panic!("expected a module definition");
    };
    assert!(is_module);
}

#[test]
fn call_with_block_and_captured_parameter() {
    let expression = single_expression("Foo.baz { |h| h + fifty }");
    let Expression::Call(call) = expression else {
        panic!("expected a call");
    };
    assert_eq!(call.name, "baz");
    let block = call.block.expect("expected an attached block");
    assert_eq!(block.params, vec!["h".to_string()]);
    assert_eq!(block.body.statements.len(), 1);
}

#[test]
fn do_end_block() {
    let expression = single_expression("items.each do |item|\n  puts(item)\nend");
    let Expression::Call(call) = expression else {
        panic!("expected a call");
    };
    assert_eq!(call.name, "each");
    assert!(call.block.is_some());
}

#[test]
fn hash_literal_keys_are_strings() {
    let expression = single_expression("{ c: 1, b: 2 }");
    let Expression::Hash(entries) = expression else {
        panic!("expected a hash literal");
    };
    let keys: Vec<&str> = entries.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, vec!["c", "b"]);
}

#[test]
fn index_assignment_desugars_to_index_writer() {
    let expression = single_expression("a[0] = 5");
    let Expression::Assign { target, .. } = expression else {
        panic!("expected an assignment");
    };
    assert!(matches!(target, AssignTarget::Index { .. }));
}

#[test]
fn attribute_assignment_desugars_to_writer_send() {
    let expression = single_expression("job.name = \"Engineer\"");
    let Expression::Call(call) = expression else {
        panic!("expected a call");
    };
    assert_eq!(call.name, "name=");
    assert_eq!(call.args.len(), 1);
}

#[test]
fn parenthesis_free_arguments() {
    let expression = single_expression("attr_reader :name, :age");
    let Expression::Call(call) = expression else {
        panic!("expected a call");
    };
    assert_eq!(call.name, "attr_reader");
    assert_eq!(
        call.args,
        vec![
            Expression::Str("name".to_string()),
            Expression::Str("age".to_string()),
        ],
    );
}

#[test]
fn scoped_constants() {
    let expression = single_expression("Object::Foo");
    assert!(matches!(
        expression,
        Expression::ScopedConstant { name, .. } if name == "Foo",
    ));
}

#[test]
fn range_inside_parentheses() {
    let expression = single_expression("(1..5)");
    assert!(matches!(expression, Expression::Range { .. }));
}

#[test]
fn if_elsif_else_chain() {
    let expression = single_expression("if a\n1\nelsif b\n2\nelse\n3\nend");
    let Expression::If { else_body, .. } = expression else {
        panic!("expected an if expression");
    };
    // The elsif chain folds into a nested if in the else branch.
    let nested = &else_body.expect("expected an else branch").statements[0];
    assert!(matches!(
        nested,
        Statement::Expression(Expression::If { .. }),
    ));
}

#[test]
fn yield_with_arguments() {
    let expression = single_expression("yield(100)");
    let Expression::Yield { args, .. } = expression else {
        panic!("expected a yield");
    };
    assert_eq!(args, vec![Expression::Integer(100)]);
}

#[test]
fn unterminated_class_is_a_syntax_error() {
    assert!(parse("class Foo\ndef bar\nend").is_err());
}

#[test]
fn semicolons_separate_statements() {
    let body = parse_ok("a = 1; b = 2; a + b");
    assert_eq!(body.statements.len(), 3);
}
