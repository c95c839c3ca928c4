use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::debug;

use crate::block::Block;
use crate::class;
use crate::compiler;
use crate::error::{ErrorKind, RuntimeError};
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::{expect_class, expect_string, PrimInfo};
use crate::universe::Universe;
use crate::value::Value;

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("class", self::class),
    ("nil?", self::nil_p),
    ("is_a?", self::is_a),
    ("==", self::eq),
    ("!=", self::neq),
    ("!", self::not),
    ("to_s", self::to_s),
    ("instance_variable_get", self::instance_variable_get),
    ("instance_variable_set", self::instance_variable_set),
    ("puts", self::puts),
    ("print", self::print),
    ("require", self::require),
    ("require_relative", self::require_relative),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn class(
    _: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Class(universe.class_of(&receiver)))
}

fn nil_p(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Boolean(receiver.is_nil()))
}

fn is_a(
    _: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let target = expect_class(&args[0])?;
    let receiver_class = universe.class_of(&receiver);
    Ok(Value::Boolean(class::ancestor_of(&receiver_class, &target)))
}

fn eq(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    Ok(Value::Boolean(receiver == args[0]))
}

fn neq(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    Ok(Value::Boolean(receiver != args[0]))
}

fn not(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Boolean(!receiver.is_truthy()))
}

fn to_s(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::new_string(receiver.to_s()))
}

fn ivar_name(value: &Value) -> Result<Rc<str>, RuntimeError> {
    let name = expect_string(value)?;
    if !name.starts_with('@') {
        return Err(RuntimeError::new(
            ErrorKind::NameError,
            format!("'{name}' is not allowed as an instance variable name"),
        ));
    }
    Ok(name)
}

fn instance_variable_get(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let name = ivar_name(&args[0])?;
    Ok(receiver.lookup_ivar(&name))
}

fn instance_variable_set(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 2);
    let name = ivar_name(&args[0])?;
    receiver.assign_ivar(&name, args[1].clone());
    Ok(args[1].clone())
}

fn puts(
    _: &mut Interpreter,
    _: &mut Universe,
    _: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        println!();
    }
    for arg in args {
        println!("{}", arg.to_s());
    }
    Ok(Value::Nil)
}

fn print(
    _: &mut Interpreter,
    _: &mut Universe,
    _: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    for arg in args {
        print!("{}", arg.to_s());
    }
    Ok(Value::Nil)
}

fn require(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    _: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let name = expect_string(&args[0])?;
    let path = universe
        .resolve_required(&name)
        .ok_or_else(|| RuntimeError::cant_require(&name))?;
    load_unit(interpreter, universe, path, &name)
}

fn require_relative(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    _: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let name = expect_string(&args[0])?;
    let requiring_file = interpreter.current_file();
    let path = universe.resolve_relative(&requiring_file, &name);
    if !path.is_file() {
        return Err(RuntimeError::cant_require(&name));
    }
    load_unit(interpreter, universe, path, &name)
}

/// Execute another source file in the same global environment, once per
/// canonical path.
fn load_unit(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    path: PathBuf,
    name: &str,
) -> Result<Value, RuntimeError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
    if !universe.mark_loaded(canonical) {
        return Ok(Value::Boolean(false));
    }
    debug!("requiring {}", path.display());
    let source = fs::read_to_string(&path).map_err(|_| RuntimeError::cant_require(name))?;
    let unit = compiler::compile_source(&source, &path.to_string_lossy())
        .map_err(|error| RuntimeError::new(ErrorKind::InternalError, error.to_string()))?;
    interpreter.call_unit(universe, unit)?;
    Ok(Value::Boolean(true))
}
