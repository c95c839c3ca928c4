use std::rc::Rc;

use crate::block::Block;
use crate::error::{ErrorKind, RuntimeError};
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::{expect_string, PrimInfo};
use crate::universe::Universe;
use crate::value::Value;

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("+", self::concatenate),
    ("==", self::eq),
    ("!=", self::neq),
    ("length", self::length),
    ("empty?", self::empty),
    ("upcase", self::upcase),
    ("downcase", self::downcase),
    ("to_s", self::to_s),
    ("to_json", self::to_json),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn receiver_string(receiver: &Value) -> Rc<str> {
    match receiver {
        Value::String(value) => value.clone(),
        _ => panic!("String primitive dispatched on a non-string receiver"),
    }
}

fn concatenate(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let left = receiver_string(&receiver);
    let right = expect_string(&args[0])?;
    Ok(Value::new_string(format!("{left}{right}")))
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

fn length(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let value = receiver_string(&receiver);
    Ok(Value::Integer(value.chars().count() as i64))
}

fn empty(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Boolean(receiver_string(&receiver).is_empty()))
}

fn upcase(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::new_string(receiver_string(&receiver).to_uppercase()))
}

fn downcase(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::new_string(receiver_string(&receiver).to_lowercase()))
}

fn to_s(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(receiver)
}

fn to_json(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let rendered = serde_json::to_string(&receiver.to_json())
        .map_err(|error| RuntimeError::new(ErrorKind::InternalError, error.to_string()))?;
    Ok(Value::new_string(rendered))
}
